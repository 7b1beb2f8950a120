//! Shared input checks.

use crate::{Error, Result};

/// Trim `value` and check it holds between 1 and `max` characters.
pub(crate) fn bounded_text(field: &'static str, value: &str, max: usize) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::invalid(field, "must not be empty"));
  }
  if trimmed.chars().count() > max {
    return Err(Error::invalid(field, format!("must be at most {max} characters")));
  }
  Ok(trimmed.to_owned())
}

/// Resolve an optional page size against a default and a hard ceiling.
/// Zero is treated as "not given".
pub(crate) fn page_limit(limit: Option<usize>, default: usize, max: usize) -> usize {
  match limit {
    None | Some(0) => default,
    Some(n) => n.min(max),
  }
}
