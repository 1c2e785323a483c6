//! Directory entries

use serde::{Deserialize, Serialize};

/// Named attribute with an ordered list of values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryAttribute {
    pub name: String,
    pub values: Vec<String>,
}

impl EntryAttribute {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, vec![value.into()])
    }
}

/// A DN plus its attributes.
///
/// Attribute names may repeat; order is preserved as built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub dn: String,
    pub attributes: Vec<EntryAttribute>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: Vec::new(),
        }
    }

    pub fn push(&mut self, attribute: EntryAttribute) {
        self.attributes.push(attribute);
    }

    /// First attribute with the given name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&EntryAttribute> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// All values of every attribute with the given name (case-insensitive)
    pub fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.attributes
            .iter()
            .filter(move |a| a.name.eq_ignore_ascii_case(name))
            .flat_map(|a| a.values.iter().map(String::as_str))
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}
