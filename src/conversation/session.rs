use chrono::{DateTime, Utc};

use crate::conversation::questions::QuestionSet;
use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    Question,
    Answer,
}

/// One entry of the question/answer log. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub ordinal: usize,
    pub kind: TurnKind,
    pub text: String,
}

impl Turn {
    /// `q0`, `a0`, `q1`, ... where the number is the question it belongs to.
    pub fn label(&self) -> String {
        let prefix = match self.kind {
            TurnKind::Question => 'q',
            TurnKind::Answer => 'a',
        };
        format!("{}{}", prefix, self.ordinal / 2)
    }
}

/// Read-only copy of a session handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub subject: String,
    pub index: usize,
    pub total: usize,
    pub turns: Vec<Turn>,
    pub started_at: DateTime<Utc>,
}

/// The question/answer log for one subject.
///
/// The log alternates Question, Answer, Question, ... and always starts with
/// a Question. `index` counts the answered questions, so
/// `turns.len() == 2 * index + pending` where `pending` is 1 while a question
/// waits for its answer.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    subject: String,
    questions: QuestionSet,
    index: usize,
    turns: Vec<Turn>,
    started_at: DateTime<Utc>,
}

impl ConversationSession {
    pub fn start(subject: impl Into<String>, questions: QuestionSet) -> Self {
        let subject = subject.into();
        let first = questions.question(0, &subject).unwrap_or_default();
        Self {
            turns: vec![Turn {
                ordinal: 0,
                kind: TurnKind::Question,
                text: first,
            }],
            subject,
            questions,
            index: 0,
            started_at: Utc::now(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.questions.total()
    }

    pub fn is_complete(&self) -> bool {
        self.index >= self.total()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The question currently waiting for an answer.
    pub fn pending_question(&self) -> Option<&str> {
        match self.turns.last() {
            Some(turn) if turn.kind == TurnKind::Question => Some(&turn.text),
            _ => None,
        }
    }

    pub fn record_answer(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        if self.pending_question().is_none() {
            return Err(SessionError::NoPendingQuestion);
        }
        self.append(TurnKind::Answer, text.into());
        self.index += 1;
        Ok(())
    }

    pub fn push_question(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        if self.is_complete() {
            return Err(SessionError::Exhausted(self.total()));
        }
        if self.pending_question().is_some() {
            return Err(SessionError::QuestionPending);
        }
        self.append(TurnKind::Question, text.into());
        Ok(())
    }

    /// Base template, name filled in, for the question that follows the
    /// last recorded answer.
    pub fn upcoming_template(&self) -> Option<String> {
        if self.pending_question().is_some() {
            return None;
        }
        self.questions.question(self.index, &self.subject)
    }

    /// The first question and its answer, once answered.
    pub fn first_exchange(&self) -> Option<(&str, &str)> {
        match (self.turns.first(), self.turns.get(1)) {
            (Some(q), Some(a)) => Some((q.text.as_str(), a.text.as_str())),
            _ => None,
        }
    }

    /// Answered (question, answer) pairs in order.
    pub fn exchanges(&self) -> Vec<(&str, &str)> {
        self.turns
            .chunks_exact(2)
            .map(|pair| (pair[0].text.as_str(), pair[1].text.as_str()))
            .collect()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            subject: self.subject.clone(),
            index: self.index,
            total: self.total(),
            turns: self.turns.clone(),
            started_at: self.started_at,
        }
    }

    fn append(&mut self, kind: TurnKind, text: String) {
        let ordinal = self.turns.len();
        self.turns.push(Turn {
            ordinal,
            kind,
            text,
        });
    }
}
