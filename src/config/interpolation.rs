//! Placeholder resolution for property values.
//!
//! Values may reference other properties using `${key}` syntax.
//!
//! # Syntax
//!
//! - `${key}` - replaced with the value of `key`
//! - `${key:fallback}` - `fallback` when `key` is undefined
//! - `$${escaped}` - produces literal `${escaped}` in output
//!
//! Resolved values are themselves resolved, so `a=${b}` with `b=${c}`
//! yields the value of `c`. A placeholder that refers back to itself is
//! reported as unresolvable.

use std::collections::HashSet;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::{AutowireError, Result};

/// A segment of a string containing placeholders.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text
    Literal(String),
    /// Placeholder reference: `${key}` or `${key:fallback}`
    Placeholder {
        key: String,
        fallback: Option<String>,
    },
}

/// Parse a string containing `${...}` placeholders.
pub fn parse_placeholders(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut chars = input.chars().peekable();
    let mut current_literal = String::new();

    while let Some(c) = chars.next() {
        if c != '$' {
            current_literal.push(c);
            continue;
        }

        match chars.peek() {
            Some('$') => {
                chars.next();
                if chars.peek() == Some(&'{') {
                    // $${...} -> literal ${...}
                    chars.next();
                    current_literal.push_str("${");
                    for c in chars.by_ref() {
                        current_literal.push(c);
                        if c == '}' {
                            break;
                        }
                    }
                } else {
                    current_literal.push('$');
                }
            }
            Some('{') => {
                chars.next();

                match read_body(&mut chars) {
                    Ok(body) => {
                        if !current_literal.is_empty() {
                            segments.push(Segment::Literal(std::mem::take(&mut current_literal)));
                        }
                        let (key, fallback) = split_fallback(&body);
                        segments.push(Segment::Placeholder { key, fallback });
                    }
                    // Unterminated, keep as written
                    Err(rest) => {
                        current_literal.push_str("${");
                        current_literal.push_str(&rest);
                    }
                }
            }
            _ => current_literal.push(c),
        }
    }

    if !current_literal.is_empty() {
        segments.push(Segment::Literal(current_literal));
    }

    segments
}

/// Read up to the `}` matching an already consumed `${`.
///
/// Returns the consumed text as `Err` when the input ends first.
fn read_body(chars: &mut Peekable<Chars<'_>>) -> std::result::Result<String, String> {
    let mut body = String::new();
    let mut depth = 0usize;
    for c in chars.by_ref() {
        match c {
            '}' if depth == 0 => return Ok(body),
            '}' => depth -= 1,
            '{' => depth += 1,
            _ => {}
        }
        body.push(c);
    }
    Err(body)
}

/// Split `key:fallback` at the first colon outside nested braces.
fn split_fallback(body: &str) -> (String, Option<String>) {
    let mut depth = 0usize;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => {
                return (body[..i].trim().to_string(), Some(body[i + 1..].to_string()));
            }
            _ => {}
        }
    }
    (body.trim().to_string(), None)
}

/// Check if a string contains any placeholder.
pub fn has_placeholders(input: &str) -> bool {
    parse_placeholders(input)
        .iter()
        .any(|seg| matches!(seg, Segment::Placeholder { .. }))
}

/// Resolve all placeholders in `input` using `lookup`.
///
/// # Errors
///
/// Returns `UnresolvablePlaceholder` if a key is undefined and has no
/// fallback, or if resolution loops back to a key being resolved.
///
/// # Example
///
/// ```
/// use autowire::config::resolve_placeholders;
///
/// let lookup = |key: &str| match key {
///     "home" => Some("/opt/app".to_string()),
///     _ => None,
/// };
///
/// let value = resolve_placeholders("${home}/config/,${extra:file:./}", &lookup).unwrap();
/// assert_eq!(value, "/opt/app/config/,file:./");
/// ```
pub fn resolve_placeholders(input: &str, lookup: &dyn Fn(&str) -> Option<String>) -> Result<String> {
    let mut visiting = HashSet::new();
    resolve_recursive(input, lookup, false, &mut visiting)
}

/// Like [`resolve_placeholders`], but an undefined key without a fallback
/// is left in the output as `${key}`.
///
/// # Errors
///
/// Returns `UnresolvablePlaceholder` only for circular references.
pub fn resolve_placeholders_lenient(
    input: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<String> {
    let mut visiting = HashSet::new();
    resolve_recursive(input, lookup, true, &mut visiting)
}

fn resolve_recursive(
    input: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
    lenient: bool,
    visiting: &mut HashSet<String>,
) -> Result<String> {
    let mut result = String::new();

    for segment in parse_placeholders(input) {
        match segment {
            Segment::Literal(text) => result.push_str(&text),
            Segment::Placeholder { key, fallback } => {
                let key = if has_placeholders(&key) {
                    resolve_recursive(&key, lookup, lenient, visiting)?
                } else {
                    key
                };
                if !visiting.insert(key.clone()) {
                    return Err(AutowireError::UnresolvablePlaceholder {
                        placeholder: key,
                        value: input.to_string(),
                    });
                }

                let resolved = match (lookup(&key), fallback) {
                    (Some(value), _) => resolve_recursive(&value, lookup, lenient, visiting)?,
                    (None, Some(fallback)) => resolve_recursive(&fallback, lookup, lenient, visiting)?,
                    (None, None) if lenient => format!("${{{}}}", key),
                    (None, None) => {
                        return Err(AutowireError::UnresolvablePlaceholder {
                            placeholder: key,
                            value: input.to_string(),
                        });
                    }
                };

                visiting.remove(&key);
                result.push_str(&resolved);
            }
        }
    }

    Ok(result)
}
