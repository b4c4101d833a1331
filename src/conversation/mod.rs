//! The question/answer flow: ask about a person, adapt each follow-up with
//! the model, then turn the answers into a summary and suggestions.

pub mod completion;
pub mod flow;
pub mod questions;
pub mod refine;
pub mod reply;
pub mod session;
pub mod suggestions;

#[cfg(test)]
pub(crate) mod testing;

pub use completion::CompletionReport;
pub use flow::{AnswerOutcome, ConversationController, FlowState};
pub use questions::QuestionSet;
