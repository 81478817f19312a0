pub use models::{normalize_questions, QuizQuestion, RawQuestion};
pub use run::{QuestionView, QuizProgress, QuizRun};
pub use selector::{pick_quiz_set, question_weight, QuizConfig};

mod models;
mod run;
mod selector;
