use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::conversation::reply::decode_json_reply;
use crate::conversation::suggestions::{parse_suggestions, SuggestionResult};
use crate::error::{CompletionError, GenerationError};
use crate::gemini_client::{GenerationRequest, TextGenerator};

pub const SUMMARY_UNAVAILABLE: &str = "Could not retrieve conversation summary.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResult {
    pub text: String,
    /// Set when the summary request failed and `text` is the placeholder.
    pub degraded: bool,
}

/// Everything produced once a session is fully answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReport {
    pub subject: String,
    pub summary: SummaryResult,
    pub suggestions: SuggestionResult,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct SummaryReply {
    summary: Option<String>,
}

pub fn build_summary_prompt(subject: &str, exchanges: &[(&str, &str)]) -> String {
    let mut prompt = format!(
        "Below is a short interview in which a user described their relationship with their friend {subject}.\n\
Summarize in two or three sentences what the user shared about {subject}: how they know each other, \
what they remember and where the relationship stands now. Write in English and refer to the friend by name.\n\n\
Please provide the response ONLY in the following JSON format, with no other text:\n\
{{ \"summary\": \"...\" }}\n\n"
    );
    for (i, (question, answer)) in exchanges.iter().enumerate() {
        let _ = writeln!(prompt, "Q{}: {}\nA{}: {}", i + 1, question, i + 1, answer);
    }
    prompt
}

pub fn build_suggestions_prompt(subject: &str, answers: &[&str]) -> String {
    let mut prompt = format!(
        "You are a conversation coach who helps people reconnect naturally with someone they know.\n\
Below are a user's answers about their relationship with {subject}.\n\
Using those answers, suggest 3 to 5 conversation starters the user could send to {subject} without it feeling awkward, \
and 3 to 5 conversation topics that could keep the conversation going.\n\n\
**Output exactly two lists and nothing else.**\n\
- Every list item must be a single line starting with '-' (a hyphen).\n\
- Do not add explanations, numbering or any other text. Wherever a name is needed, use {subject} instead of a placeholder.\n\n\
[Conversation Starters]\n- (starter 1)\n- (starter 2)\n- (starter 3)\n...\n\n\
[Conversation Topics]\n- (topic 1)\n- (topic 2)\n- (topic 3)\n...\n\n\
The user's answers:\n"
    );
    for (i, answer) in answers.iter().enumerate() {
        let _ = writeln!(prompt, "Q{}: {}", i + 1, answer);
    }
    prompt
}

/// Turns a finished question/answer log into a summary and suggestions.
///
/// Refuses without making any request unless exactly `total` answers were
/// collected. The summary is best-effort; only a failed suggestions request
/// fails the whole completion.
pub async fn request_completion<G>(
    generator: &G,
    subject: &str,
    total: usize,
    exchanges: &[(&str, &str)],
) -> Result<CompletionReport, CompletionError>
where
    G: TextGenerator + ?Sized,
{
    if exchanges.len() != total {
        return Err(CompletionError::IncompleteAnswers {
            expected: total,
            actual: exchanges.len(),
        });
    }

    let summary = request_summary(generator, subject, exchanges).await;

    let answers: Vec<&str> = exchanges.iter().map(|(_, answer)| *answer).collect();
    let request = GenerationRequest::text(build_suggestions_prompt(subject, &answers));
    let raw = match generator.generate(&request).await {
        Ok(text) => text,
        Err(GenerationError::EmptyResponse) => {
            warn!(subject, "Suggestions reply had no text");
            String::new()
        }
        Err(e) => return Err(e.into()),
    };

    let suggestions = parse_suggestions(&raw);
    info!(
        subject,
        starters = suggestions.starters.len(),
        topics = suggestions.topics.len(),
        "Generated suggestions"
    );
    if suggestions.needs_raw_fallback() {
        warn!(subject, "Suggestions reply had no recognizable lists; keeping raw text");
    }

    Ok(CompletionReport {
        subject: subject.to_string(),
        summary,
        suggestions,
        generated_at: Utc::now(),
    })
}

async fn request_summary<G>(generator: &G, subject: &str, exchanges: &[(&str, &str)]) -> SummaryResult
where
    G: TextGenerator + ?Sized,
{
    let request = GenerationRequest::json(build_summary_prompt(subject, exchanges));
    let outcome = match generator.generate(&request).await {
        Ok(text) => decode_json_reply::<SummaryReply>(&text).and_then(|reply| {
            reply
                .summary
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| GenerationError::Malformed("summary missing or empty".to_string()))
        }),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(text) => SummaryResult {
            text,
            degraded: false,
        },
        Err(e) => {
            warn!(subject, "Conversation summary unavailable: {}", e);
            SummaryResult {
                text: SUMMARY_UNAVAILABLE.to_string(),
                degraded: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::testing::ScriptedGenerator;
    use crate::gemini_client::ResponseFormat;

    const EXCHANGES: [(&str, &str); 2] = [
        ("When did you first get to know Sam?", "In college."),
        ("How did you and Sam meet?", "Same dorm."),
    ];

    const SUGGESTIONS: &str =
        "[Conversation Starters]\n- Hey Sam!\n- Dorm reunion?\n\n[Conversation Topics]\n- College\n";

    #[tokio::test]
    async fn incomplete_answers_make_no_calls() {
        let generator = ScriptedGenerator::new([]);
        let err = request_completion(&generator, "Sam", 3, &EXCHANGES)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CompletionError::IncompleteAnswers {
                expected: 3,
                actual: 2
            }
        ));
        assert!(generator.calls().is_empty());
    }

    #[tokio::test]
    async fn produces_summary_and_suggestions() {
        let generator = ScriptedGenerator::new([
            Ok(r#"{"summary": "You met Sam in a college dorm."}"#),
            Ok(SUGGESTIONS),
        ]);
        let report = request_completion(&generator, "Sam", 2, &EXCHANGES)
            .await
            .unwrap();

        assert_eq!(report.summary.text, "You met Sam in a college dorm.");
        assert!(!report.summary.degraded);
        assert_eq!(report.suggestions.starters, vec!["Hey Sam!", "Dorm reunion?"]);
        assert_eq!(report.suggestions.topics, vec!["College"]);

        let calls = generator.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].format, ResponseFormat::Json);
        assert!(calls[0].prompt.contains("Q2: How did you and Sam meet?\nA2: Same dorm."));
        assert_eq!(calls[1].format, ResponseFormat::Text);
        assert!(calls[1].prompt.contains("Q1: In college.\nQ2: Same dorm."));
        assert!(calls[1].prompt.contains("[Conversation Starters]"));
    }

    #[tokio::test]
    async fn failed_summary_degrades_without_failing() {
        let generator = ScriptedGenerator::new([Err("down"), Ok(SUGGESTIONS)]);
        let report = request_completion(&generator, "Sam", 2, &EXCHANGES)
            .await
            .unwrap();
        assert!(report.summary.degraded);
        assert_eq!(report.summary.text, SUMMARY_UNAVAILABLE);
        assert_eq!(report.suggestions.starters.len(), 2);
    }

    #[tokio::test]
    async fn failed_suggestions_fail_completion() {
        let generator = ScriptedGenerator::new([Ok(r#"{"summary":"ok"}"#), Err("down")]);
        let err = request_completion(&generator, "Sam", 2, &EXCHANGES)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CompletionError::Request(GenerationError::Status { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn unparseable_suggestions_keep_raw_text() {
        let generator = ScriptedGenerator::new([
            Ok(r#"{"summary":"ok"}"#),
            Ok("Just ask Sam about college."),
        ]);
        let report = request_completion(&generator, "Sam", 2, &EXCHANGES)
            .await
            .unwrap();
        assert!(report.suggestions.needs_raw_fallback());
        assert_eq!(report.suggestions.raw_text, "Just ask Sam about college.");
    }
}
