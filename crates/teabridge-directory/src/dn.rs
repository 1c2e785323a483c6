//! Distinguished names
//!
//! Parsing here is normalizing rather than validating: malformed
//! `attr=value` tokens are dropped silently and stray `,`/`+` separators
//! collapse. Strict checks belong to the caller.

use crate::entry::EntryAttribute;
use std::fmt;
use teabridge_core::{Error, Result};

/// Canonical form of a distinguished name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalName {
    value: String,
    /// Attribute name -> values, in order of first appearance
    attrs: Vec<(String, Vec<String>)>,
}

impl CanonicalName {
    /// Parse a DN string, keeping only well-formed `attr=value` tokens
    pub fn parse(raw: &str) -> Self {
        let mut value = String::with_capacity(raw.len());
        let mut attrs: Vec<(String, Vec<String>)> = Vec::new();
        let mut need_comma = false;

        for segment in raw.split(',') {
            let mut need_plus = false;

            for token in segment.split('+') {
                let Some((name, val)) = split_pair(token) else {
                    continue;
                };

                if need_comma {
                    value.push(',');
                    need_comma = false;
                }
                if need_plus {
                    value.push('+');
                }
                value.push_str(token);
                need_plus = true;

                match attrs.iter_mut().find(|(n, _)| n == name) {
                    Some((_, values)) => values.push(val.to_string()),
                    None => attrs.push((name.to_string(), vec![val.to_string()])),
                }
            }

            if need_plus {
                need_comma = true;
            }
        }

        Self { value, attrs }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Every attribute carried by the name, as directory attributes.
    ///
    /// `dc=domain,dc=com` yields `dc: [domain, com]`.
    pub fn attributes(&self) -> Vec<EntryAttribute> {
        self.attrs
            .iter()
            .map(|(name, values)| EntryAttribute::new(name.clone(), values.clone()))
            .collect()
    }

    /// Case-insensitive equality of the canonical forms
    pub fn eq_ignore_case(&self, other: &CanonicalName) -> bool {
        self.value.to_lowercase() == other.value.to_lowercase()
    }

    /// True when this name equals `parent` or lies somewhere below it
    pub fn is_within(&self, parent: &CanonicalName) -> bool {
        let this = self.value.to_lowercase();
        let parent = parent.value.to_lowercase();
        this == parent || this.ends_with(&format!(",{}", parent))
    }
}

impl fmt::Display for CanonicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl From<&str> for CanonicalName {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// Split `attr=value`; tokens without exactly one `=` are rejected
fn split_pair(token: &str) -> Option<(&str, &str)> {
    let (name, value) = token.split_once('=')?;
    if value.contains('=') {
        return None;
    }
    Some((name, value))
}

/// Strip `,<suffix parts joined by ','>` from the end of `candidate`.
///
/// The match is case-insensitive; the remainder keeps the candidate's case.
pub fn strip_suffix<'a>(candidate: &'a str, suffix_parts: &[&str]) -> Result<&'a str> {
    let suffix = format!(",{}", suffix_parts.join(","));
    let not_under = || {
        Error::InvalidDnSyntax(format!(
            "'{}' is not under '{}'",
            candidate,
            &suffix[1..]
        ))
    };

    let cut = candidate.len().checked_sub(suffix.len()).ok_or_else(not_under)?;
    if !candidate.is_char_boundary(cut)
        || candidate[cut..].to_lowercase() != suffix.to_lowercase()
    {
        return Err(not_under());
    }

    Ok(&candidate[..cut])
}
