use std::fmt;

use serde::{Deserialize, Serialize};

/// A triple of dictionary-encoded ids.
///
/// Ordering is lexicographic on (subject, predicate, object), which is the
/// order every subject-keyed iterator yields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdTriple {
    pub subject: u64,
    pub predicate: u64,
    pub object: u64,
}

impl IdTriple {
    pub const fn new(subject: u64, predicate: u64, object: u64) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Returns `true` if any component is the reserved id 0.
    pub fn has_null_component(&self) -> bool {
        self.subject == 0 || self.predicate == 0 || self.object == 0
    }
}

impl fmt::Display for IdTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.predicate, self.object)
    }
}

/// A decoded object: either a node (an IRI-like name that may also appear as
/// a subject) or a literal value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectType {
    Node(String),
    Value(String),
}

impl ObjectType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Node(s) | Self::Value(s) => s,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Self::Node(_))
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(s) => write!(f, "node({s})"),
            Self::Value(s) => write!(f, "value({s})"),
        }
    }
}

/// A triple of raw strings.
///
/// Subject and predicate are always nodes. The object is a node or a value
/// depending on which constructor built the triple; this is never inferred
/// from the shape of the string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StringTriple {
    pub subject: String,
    pub predicate: String,
    pub object: ObjectType,
}

impl StringTriple {
    /// A triple whose object is a node.
    pub fn new_node(subject: &str, predicate: &str, object: &str) -> Self {
        Self {
            subject: subject.to_string(),
            predicate: predicate.to_string(),
            object: ObjectType::Node(object.to_string()),
        }
    }

    /// A triple whose object is a value.
    pub fn new_value(subject: &str, predicate: &str, object: &str) -> Self {
        Self {
            subject: subject.to_string(),
            predicate: predicate.to_string(),
            object: ObjectType::Value(object.to_string()),
        }
    }
}

impl fmt::Display for StringTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}
