//! Identifier validation shared by every command builder.
//! All checks are fatal: the builder returns `InvalidArgument`.

use uuid::Uuid;

use crate::error::{PushError, Result};

/// Numeric identifier accepted either as digits or as a native integer.
#[derive(Debug, Clone, Copy)]
pub enum Id<'a> {
    Str(&'a str),
    Int(i64),
}

impl<'a> From<&'a str> for Id<'a> {
    fn from(s: &'a str) -> Self {
        Id::Str(s)
    }
}

impl<'a> From<&'a String> for Id<'a> {
    fn from(s: &'a String) -> Self {
        Id::Str(s.as_str())
    }
}

impl From<i64> for Id<'_> {
    fn from(v: i64) -> Self {
        Id::Int(v)
    }
}

impl From<u32> for Id<'_> {
    fn from(v: u32) -> Self {
        Id::Int(i64::from(v))
    }
}

/// Non-negative integer id, normalized to its decimal string.
pub fn numeric_id(what: &str, id: Id<'_>) -> Result<String> {
    match id {
        Id::Int(v) if v >= 0 => Ok(v.to_string()),
        Id::Int(v) => Err(PushError::InvalidArgument(format!("\"{v}\" is not a valid {what}"))),
        Id::Str(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => Ok(s.to_string()),
        Id::Str(s) => Err(PushError::InvalidArgument(format!("\"{s}\" is not a valid {what}"))),
    }
}

/// `<digits>_<digits>`.
pub fn media_id(what: &str, id: &str) -> Result<String> {
    let valid = match id.split_once('_') {
        Some((a, b)) => {
            !a.is_empty()
                && !b.is_empty()
                && a.bytes().all(|c| c.is_ascii_digit())
                && b.bytes().all(|c| c.is_ascii_digit())
        }
        None => false,
    };
    if !valid {
        return Err(PushError::InvalidArgument(format!("\"{id}\" is not a valid {what}")));
    }
    Ok(id.to_string())
}

/// Caller-supplied idempotency token must be a UUID; otherwise one is generated.
/// Always emitted in lowercase hyphenated form.
pub fn client_context(ctx: Option<&str>) -> Result<String> {
    match ctx {
        Some(s) => Uuid::parse_str(s)
            .map(|u| u.hyphenated().to_string())
            .map_err(|_| PushError::InvalidArgument(format!("\"{s}\" is not a valid UUID"))),
        None => Ok(Uuid::new_v4().to_string()),
    }
}

/// Trimmed, leading `#` stripped, non-empty, no inner whitespace.
pub fn hashtag(raw: &str) -> Result<String> {
    let tag = raw.trim();
    let tag = tag.strip_prefix('#').unwrap_or(tag);
    if tag.is_empty() {
        return Err(PushError::InvalidArgument("hashtag must not be empty".into()));
    }
    if tag.chars().any(char::is_whitespace) {
        return Err(PushError::InvalidArgument(format!("\"{tag}\" is not a valid hashtag")));
    }
    Ok(tag.to_string())
}
