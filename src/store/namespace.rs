//! Store namespaces: key-isolation domains within a value store.

use std::fmt;

/// An ordered list of parts that isolates keys of unrelated extensions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace {
    parts: Vec<String>,
}

impl Namespace {
    /// The namespace shared by everyone that does not pick their own
    pub fn global() -> Self {
        Self {
            parts: vec!["GLOBAL".to_string()],
        }
    }

    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// Namespace derived from a type name, typically the owning extension
    pub fn of<T: ?Sized>() -> Self {
        Self::new([std::any::type_name::<T>()])
    }

    /// Create a nested namespace with the given parts appended
    pub fn append<I, S>(&self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut all = self.parts.clone();
        all.extend(parts.into_iter().map(Into::into));
        Self { parts: all }
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Namespace[{}]", self.parts.join(", "))
    }
}
