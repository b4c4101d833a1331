use regex::Regex;

/// Conversation starters and topics parsed out of a freeform model reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionResult {
    pub starters: Vec<String>,
    pub topics: Vec<String>,
    /// The reply exactly as received.
    pub raw_text: String,
}

impl SuggestionResult {
    /// Nothing could be parsed but there is text worth showing as-is.
    pub fn needs_raw_fallback(&self) -> bool {
        self.starters.is_empty() && self.topics.is_empty() && !self.raw_text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Starters,
    Topics,
}

// A bracketed header may be followed by more text on the same line
// ("[Conversation Starters] for Sam"); the Markdown forms
// ("## Conversation topics:", "**Conversation Starters**") must fill the line.
const HEADER_PATTERN: &str = r"(?i)^#*\s*(?:\*\*)?\s*(?:\[\s*conversation\s+(starters?|topics?)\s*\]|conversation\s+(starters?|topics?)\s*(?:\*\*)?\s*:?\s*(?:\*\*)?$)";
// `-` and `•` bullets may run together; `*` needs a following space so bold
// text is not taken for a bullet. Nested markers are dropped too.
const BULLET_PATTERN: &str = r"^(?:[-•]+\s*|\*\s+)(?:[-*•]\s+)*(.*)$";

/// Splits a suggestions reply into starters and topics.
///
/// Lines are scanned in order: a header line switches the current section,
/// bullet lines inside a section are collected without their marker, and
/// everything else is ignored.
pub fn parse_suggestions(raw: &str) -> SuggestionResult {
    let mut result = SuggestionResult {
        raw_text: raw.to_string(),
        ..Default::default()
    };

    let (Ok(header_re), Ok(bullet_re)) = (Regex::new(HEADER_PATTERN), Regex::new(BULLET_PATTERN))
    else {
        return result;
    };

    let mut section = None;
    for line in raw.lines() {
        let line = line.trim_start_matches('\u{feff}').trim();

        if let Some(captures) = header_re.captures(line) {
            let kind = captures
                .get(1)
                .or_else(|| captures.get(2))
                .map(|m| m.as_str().to_lowercase());
            section = match kind.as_deref() {
                Some(k) if k.starts_with("starter") => Some(Section::Starters),
                Some(_) => Some(Section::Topics),
                None => section,
            };
            continue;
        }

        let Some(item) = bullet_re
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim())
        else {
            continue;
        };
        if item.is_empty() {
            continue;
        }

        match section {
            Some(Section::Starters) => result.starters.push(item.to_string()),
            Some(Section::Topics) => result.topics.push(item.to_string()),
            None => {}
        }
    }

    result
}
