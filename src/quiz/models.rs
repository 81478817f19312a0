use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Question as it appears in the catalog file. Fields are loose to accept
/// hand-edited catalogs; `QuizQuestion::from_raw` validates and normalizes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestion {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, alias = "text")]
    pub question: Option<String>,
    #[serde(default)]
    pub choices: Option<Vec<String>>,
    #[serde(default)]
    pub correct_index: Option<i64>,
    #[serde(default)]
    pub difficulty: Option<Value>,
    #[serde(default)]
    pub points: Option<Value>,
    #[serde(default)]
    pub tags: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub text: String,
    pub choices: Vec<String>,
    pub correct_index: usize,
    /// 1.0 (easy) to 5.0 (hard); fractional values are kept
    pub difficulty: f64,
    /// Whole points; fractional catalog values round to the nearest
    pub points: u32,
    pub tags: Vec<String>,
}

fn as_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl QuizQuestion {
    /// Validates a catalog entry. Returns None when it cannot be asked.
    pub fn from_raw(raw: &RawQuestion) -> Option<Self> {
        let text = raw.question.as_deref()?.trim();
        let choices = raw.choices.clone()?;
        if text.is_empty() || choices.len() < 2 {
            return None;
        }
        let correct_index = usize::try_from(raw.correct_index?).ok()?;
        if correct_index >= choices.len() {
            return None;
        }

        let difficulty = as_number(raw.difficulty.as_ref())
            .filter(|d| d.is_finite() && *d != 0.0)
            .unwrap_or(1.0)
            .clamp(1.0, 5.0);
        let points = as_number(raw.points.as_ref())
            .filter(|p| p.is_finite() && *p != 0.0)
            .unwrap_or(1.0)
            .max(1.0)
            .round() as u32;

        let id = match &raw.id {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let tags = match &raw.tags {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|t| t.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };

        Some(Self {
            id,
            text: text.to_string(),
            choices,
            correct_index,
            difficulty,
            points,
            tags,
        })
    }

    /// Identity used to keep a quiz free of repeats: the id, or the text
    /// when the id is blank.
    pub fn dedup_key(&self) -> &str {
        if self.id.is_empty() {
            &self.text
        } else {
            &self.id
        }
    }

    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|tag| self.tags.contains(tag))
    }
}

/// Drops questions that cannot be asked and normalizes the rest
pub fn normalize_questions(raw: &[RawQuestion]) -> Vec<QuizQuestion> {
    raw.iter().filter_map(QuizQuestion::from_raw).collect()
}
