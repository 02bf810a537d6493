//! Static denylist moderation for tutor questions and student messages.

/// Terms that flag a turn. Matched case-insensitively as substrings.
pub const FLAGGED_TERMS: &[&str] = &["hate", "harmful", "inappropriate", "violence", "explicit"];

/// First denylisted term found in `text`, if any.
#[must_use]
pub fn flagged_term(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    FLAGGED_TERMS.iter().copied().find(|term| lower.contains(term))
}
