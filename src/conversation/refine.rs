use serde::Deserialize;
use tracing::{debug, warn};

use crate::conversation::reply::decode_json_reply;
use crate::error::GenerationError;
use crate::gemini_client::{GenerationRequest, TextGenerator};

/// Everything the model needs to adapt the next base question.
#[derive(Debug, Clone)]
pub struct RefinementContext<'a> {
    pub subject: &'a str,
    /// Next base question with the name already filled in.
    pub base_question: &'a str,
    pub previous_question: &'a str,
    pub previous_answer: &'a str,
    pub guideline: &'a str,
    /// Only supplied from the third question on.
    pub first_exchange: Option<(&'a str, &'a str)>,
}

/// The question to show next.
///
/// `warning` is set when the model could not be used and `text` fell back to
/// the base question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextQuestion {
    pub text: String,
    pub warning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefinedReply {
    #[serde(rename = "refinedQuestion")]
    refined_question: Option<String>,
}

pub fn build_refinement_prompt(ctx: &RefinementContext<'_>) -> String {
    let name = ctx.subject;
    let initial_context = match ctx.first_exchange {
        Some((question, answer)) => format!(
            "\n[Initial Conversation Context]\nFirst question: {question}\nFirst answer: {answer}\n"
        ),
        None => String::new(),
    };

    format!(
        r#"You are an AI conversation designer tasked with making a user's chat with their friend ({name}) more natural and meaningful.

User's friend's name: "{name}"
{initial_context}
[Previous turn in the conversation]
Previous question to {name}: {previous_question}
User's answer regarding {name}: {previous_answer}

[Base intent for the next question]:
{base_question}

[Guideline for refining the question]:
{guideline}

Considering all the information above (especially "Initial Conversation Context" and "Previous turn"), generate ONE new question based on the "Base intent for the next question".
This new question must follow the "Guideline for refining the question" and should naturally continue the conversation from the previous turn.
It must include the friend's name, "{name}".
**The refined question must be in English.**

Please provide the response ONLY in the following JSON format, with no other text:
{{ "refinedQuestion": "The final refined question content (in English)" }}

Example (the actual content will vary greatly based on input, but the response must be in English):
{{ "refinedQuestion": "So, what were some of the specific feelings you had when you and {name} went through that together?" }}"#,
        previous_question = ctx.previous_question,
        previous_answer = ctx.previous_answer,
        base_question = ctx.base_question,
        guideline = ctx.guideline,
    )
}

/// Pulls the refined question out of a model reply.
pub fn parse_refined_question(text: &str) -> Result<String, GenerationError> {
    let reply: RefinedReply = decode_json_reply(text)?;
    reply
        .refined_question
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| GenerationError::Malformed("refinedQuestion missing or empty".to_string()))
}

/// Asks the model once for an adapted next question.
///
/// Never fails: any error degrades to the base question with a warning so the
/// conversation keeps going.
pub async fn request_next_question<G>(generator: &G, ctx: &RefinementContext<'_>) -> NextQuestion
where
    G: TextGenerator + ?Sized,
{
    let request = GenerationRequest::json(build_refinement_prompt(ctx));
    let outcome = match generator.generate(&request).await {
        Ok(text) => parse_refined_question(&text),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(text) => {
            debug!(subject = ctx.subject, "Refined next question: {}", text);
            NextQuestion {
                text,
                warning: None,
            }
        }
        Err(e) => {
            warn!(subject = ctx.subject, "Falling back to base question: {}", e);
            NextQuestion {
                text: ctx.base_question.to_string(),
                warning: Some(format!(
                    "Could not generate the next question ({e}); showing the default question."
                )),
            }
        }
    }
}
