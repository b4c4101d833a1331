use std::fmt;

use tracing::{info, warn};

use crate::conversation::completion::{request_completion, CompletionReport};
use crate::conversation::questions::QuestionSet;
use crate::conversation::refine::{request_next_question, RefinementContext};
use crate::conversation::session::{ConversationSession, SessionSnapshot};
use crate::error::{CompletionError, FlowError, SessionError};
use crate::gemini_client::TextGenerator;

/// Where the conversation currently stands.
///
/// `AwaitingAnswer(i)` → `RequestingNextQuestion` → `AwaitingAnswer(i + 1)` ... →
/// `AllAnswered` → `RequestingSuggestions` → `Done` or `Failed`. `Failed`
/// can be retried with another completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    AwaitingAnswer(usize),
    RequestingNextQuestion,
    AllAnswered,
    RequestingSuggestions,
    Done(Box<CompletionReport>),
    Failed(String),
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "no conversation is active"),
            Self::AwaitingAnswer(i) => write!(f, "waiting for answer {}", i + 1),
            Self::RequestingNextQuestion => write!(f, "fetching the next question"),
            Self::AllAnswered => write!(f, "all questions are answered"),
            Self::RequestingSuggestions => write!(f, "fetching suggestions"),
            Self::Done(_) => write!(f, "the conversation is finished"),
            Self::Failed(reason) => write!(f, "suggestions failed ({reason})"),
        }
    }
}

/// What happened after an answer was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    NextQuestion {
        text: String,
        /// Non-fatal; the base question is shown instead of a refined one.
        warning: Option<String>,
    },
    AllAnswered,
}

/// Owns one conversation at a time and is the only thing that mutates it.
pub struct ConversationController<G> {
    generator: G,
    questions: QuestionSet,
    session: Option<ConversationSession>,
    state: FlowState,
}

impl<G: TextGenerator> ConversationController<G> {
    pub fn new(generator: G, questions: QuestionSet) -> Self {
        Self {
            generator,
            questions,
            session: None,
            state: FlowState::Idle,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn subject(&self) -> Option<&str> {
        self.session.as_ref().map(ConversationSession::subject)
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.session.as_ref().map(ConversationSession::snapshot)
    }

    /// Starts a conversation about `name` and returns the first question.
    ///
    /// Switching to a different name throws away the previous session and
    /// any results; the same name keeps the session as it is.
    pub fn set_subject(&mut self, name: &str) -> &str {
        let name = name.trim();
        if self.subject() != Some(name) {
            info!(subject = name, "Starting conversation");
            self.session = Some(ConversationSession::start(name, self.questions.clone()));
            self.state = FlowState::AwaitingAnswer(0);
        }
        self.session
            .as_ref()
            .and_then(ConversationSession::pending_question)
            .unwrap_or_default()
    }

    /// Starts over with the current subject.
    pub fn restart(&mut self) -> Result<&str, FlowError> {
        let subject = self.subject().ok_or(FlowError::NoSubject)?.to_string();
        self.session = None;
        Ok(self.set_subject(&subject))
    }

    pub async fn submit_answer(&mut self, answer: &str) -> Result<AnswerOutcome, FlowError> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(FlowError::EmptyAnswer);
        }
        let FlowState::AwaitingAnswer(index) = self.state else {
            return Err(self.invalid("answer"));
        };
        let session = self.session.as_mut().ok_or(FlowError::NoSubject)?;

        let previous_question = session
            .pending_question()
            .ok_or(SessionError::NoPendingQuestion)?
            .to_string();
        session.record_answer(answer)?;

        if session.is_complete() {
            info!(subject = session.subject(), "All questions answered");
            self.state = FlowState::AllAnswered;
            return Ok(AnswerOutcome::AllAnswered);
        }

        let Some(base_question) = session.upcoming_template() else {
            return Err(SessionError::Exhausted(session.total()).into());
        };
        // Only the third question onward sees the first exchange.
        let first_exchange = if index >= 1 {
            session.first_exchange()
        } else {
            None
        };
        let ctx = RefinementContext {
            subject: session.subject(),
            base_question: &base_question,
            previous_question: &previous_question,
            previous_answer: answer,
            guideline: session.questions().refinement(),
            first_exchange,
        };

        self.state = FlowState::RequestingNextQuestion;
        let next = request_next_question(&self.generator, &ctx).await;

        session.push_question(next.text.clone())?;
        self.state = FlowState::AwaitingAnswer(session.current_index());
        Ok(AnswerOutcome::NextQuestion {
            text: next.text,
            warning: next.warning,
        })
    }

    /// Generates the summary and suggestions for a fully answered session.
    ///
    /// May be called again after a failure. Asking before every question is
    /// answered is rejected without contacting the model.
    pub async fn complete(&mut self) -> Result<CompletionReport, FlowError> {
        let session = self.session.as_ref().ok_or(FlowError::NoSubject)?;
        match &self.state {
            FlowState::AllAnswered | FlowState::Failed(_) | FlowState::AwaitingAnswer(_) => {}
            _ => return Err(self.invalid("generate suggestions")),
        }

        let exchanges = session.exchanges();
        let previous = std::mem::replace(&mut self.state, FlowState::RequestingSuggestions);
        let result =
            request_completion(&self.generator, session.subject(), session.total(), &exchanges)
                .await;

        match result {
            Ok(report) => {
                self.state = FlowState::Done(Box::new(report.clone()));
                Ok(report)
            }
            Err(e @ CompletionError::IncompleteAnswers { .. }) => {
                self.state = previous;
                Err(e.into())
            }
            Err(e) => {
                warn!(subject = session.subject(), "Completion failed: {}", e);
                self.state = FlowState::Failed(e.to_string());
                Err(e.into())
            }
        }
    }

    fn invalid(&self, action: &'static str) -> FlowError {
        FlowError::InvalidState {
            action,
            state: self.state.to_string(),
        }
    }
}
