//! Search filters
//!
//! The bridge only looks at the object class a filter asks for. Full
//! evaluation is offered for the hosting LDAP server, which applies it to
//! the entries the bridge returns.

use crate::entry::DirectoryEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Equality(String, String),
    Present(String),
    Substring {
        attribute: String,
        initial: Option<String>,
        any: Vec<String>,
        final_: Option<String>,
    },
    /// Filter kinds that are not evaluated; never matches
    Unsupported(String),
}

impl Default for Filter {
    fn default() -> Self {
        Filter::Present("objectClass".to_string())
    }
}

impl Filter {
    /// Object class requested by the filter, if any.
    ///
    /// Walks `And`/`Or` children depth-first and returns the first
    /// `objectClass=<value>` equality. Negated branches are not inspected.
    pub fn object_class(&self) -> Option<&str> {
        match self {
            Filter::Equality(attr, value) if attr.eq_ignore_ascii_case("objectclass") => {
                Some(value.as_str())
            }
            Filter::And(children) | Filter::Or(children) => {
                children.iter().find_map(Filter::object_class)
            }
            _ => None,
        }
    }

    /// Evaluate against an entry. Names and values compare case-insensitively.
    pub fn matches(&self, entry: &DirectoryEntry) -> bool {
        match self {
            Filter::And(children) => children.iter().all(|f| f.matches(entry)),
            Filter::Or(children) => children.iter().any(|f| f.matches(entry)),
            Filter::Not(inner) => !inner.matches(entry),
            Filter::Equality(attr, expected) => {
                let expected = expected.to_lowercase();
                entry
                    .values(attr)
                    .any(|v| v.to_lowercase() == expected)
            }
            Filter::Present(attr) => {
                attr.eq_ignore_ascii_case("objectclass") || entry.values(attr).next().is_some()
            }
            Filter::Substring {
                attribute,
                initial,
                any,
                final_,
            } => entry
                .values(attribute)
                .any(|v| substring_match(v, initial.as_deref(), any, final_.as_deref())),
            Filter::Unsupported(_) => false,
        }
    }
}

fn substring_match(value: &str, initial: Option<&str>, any: &[String], last: Option<&str>) -> bool {
    let value = value.to_lowercase();
    let mut rest = value.as_str();

    if let Some(initial) = initial {
        let initial = initial.to_lowercase();
        match rest.strip_prefix(initial.as_str()) {
            Some(r) => rest = r,
            None => return false,
        }
    }

    let last = last.map(str::to_lowercase);
    if let Some(last) = &last {
        match rest.strip_suffix(last.as_str()) {
            Some(r) => rest = r,
            None => return false,
        }
    }

    for part in any {
        let part = part.to_lowercase();
        match rest.find(part.as_str()) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }

    true
}
