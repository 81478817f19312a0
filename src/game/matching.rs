use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Shortest normalized input that can count as an answer
pub const MIN_ANSWER_LEN: usize = 3;

/// Folds a typed answer or a name to its comparable form: accents removed,
/// lowercased, ASCII letters and digits only.
pub fn normalize_answer(input: &str) -> String {
    input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(fold_stroke)
        .flat_map(char::to_lowercase)
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// `Đ` and `đ` carry a stroke rather than a combining mark, so NFD leaves
/// them intact.
fn fold_stroke(c: char) -> char {
    match c {
        'Đ' | 'đ' => 'd',
        other => other,
    }
}

/// Accepted forms of a name: the full name, its last word and its last two
/// words, all normalized.
pub fn answer_targets(name: &str) -> Vec<String> {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    let mut candidates = vec![normalize_answer(name)];

    if let Some(last) = tokens.last() {
        candidates.push(normalize_answer(last));
    }
    if tokens.len() >= 2 {
        candidates.push(normalize_answer(&tokens[tokens.len() - 2..].join(" ")));
    }

    let mut targets: Vec<String> = Vec::new();
    for candidate in candidates {
        if !candidate.is_empty() && !targets.contains(&candidate) {
            targets.push(candidate);
        }
    }
    targets
}

/// Live match of typed text against normalized targets. Equal strings match,
/// and so does either one being a suffix of the other.
pub fn matches(input: &str, targets: &[String]) -> bool {
    let typed = normalize_answer(input);
    if typed.chars().count() < MIN_ANSWER_LEN {
        return false;
    }
    targets
        .iter()
        .filter(|target| !target.is_empty())
        .any(|target| {
            typed == *target || target.ends_with(&typed) || typed.ends_with(target.as_str())
        })
}
