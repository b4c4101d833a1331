/// Token replaced with the subject's name in every template.
pub const NAME_PLACEHOLDER: &str = "{name}";

const FIRST_QUESTION: &str = "When did you first get to know {name}?";

const BASE_QUESTION_TEMPLATES: [&str; 4] = [
    "How did you and {name} meet?",
    "What is a memory with {name} that still makes you smile?",
    "When did you last talk with {name}, and what was it about?",
    "What would you like to know about how {name} is doing these days?",
];

const REFINEMENT_GUIDELINE: &str = "Make the question warm and specific. \
Refer naturally to what the user just said instead of repeating it, \
keep it to a single sentence and avoid questions that can be answered with yes or no.";

/// Substitutes `name` for every placeholder in `template`.
pub fn fill_template(template: &str, name: &str) -> String {
    template.replace(NAME_PLACEHOLDER, name)
}

/// The fixed, ordered questions asked in one session.
///
/// The first question is always asked verbatim; every later one is a base
/// template that the model may rephrase using `refinement` as its guideline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    first: String,
    templates: Vec<String>,
    refinement: String,
}

impl QuestionSet {
    pub fn new(
        first: impl Into<String>,
        templates: Vec<String>,
        refinement: impl Into<String>,
    ) -> Self {
        Self {
            first: first.into(),
            templates,
            refinement: refinement.into(),
        }
    }

    pub fn total(&self) -> usize {
        1 + self.templates.len()
    }

    pub fn refinement(&self) -> &str {
        &self.refinement
    }

    /// Question `index` (0-based) with the name substituted.
    pub fn question(&self, index: usize, name: &str) -> Option<String> {
        match index {
            0 => Some(fill_template(&self.first, name)),
            n => self.templates.get(n - 1).map(|t| fill_template(t, name)),
        }
    }
}

impl Default for QuestionSet {
    fn default() -> Self {
        Self::new(
            FIRST_QUESTION,
            BASE_QUESTION_TEMPLATES.iter().map(|t| t.to_string()).collect(),
            REFINEMENT_GUIDELINE,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_every_placeholder() {
        assert_eq!(
            fill_template("{name}, {name}!", "Sam"),
            "Sam, Sam!"
        );
    }

    #[test]
    fn default_questions_leave_no_placeholder() {
        let questions = QuestionSet::default();
        assert_eq!(questions.total(), 5);
        for name in ["Sam", "", "Dr. Who", "김민수"] {
            for index in 0..questions.total() {
                let text = questions.question(index, name).unwrap();
                assert!(
                    !text.contains(NAME_PLACEHOLDER),
                    "question {index} for {name:?} kept a placeholder: {text}"
                );
                assert!(text.contains(name));
            }
        }
    }

    #[test]
    fn first_two_questions_match_the_documented_wording() {
        let questions = QuestionSet::default();
        assert_eq!(
            questions.question(0, "Sam").unwrap(),
            "When did you first get to know Sam?"
        );
        assert_eq!(
            questions.question(1, "Sam").unwrap(),
            "How did you and Sam meet?"
        );
        assert!(questions.question(5, "Sam").is_none());
    }
}
