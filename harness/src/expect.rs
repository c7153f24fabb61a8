/*!

Field-path expectations against observed JSON documents.

Paths use JSON-Pointer-style `/`-separated segments so that dotted Kubernetes
keys stay unambiguous: `/metadata/annotations/deployment.kubernetes.io~1revision`
addresses the `deployment.kubernetes.io/revision` annotation (`~1` escapes `/`,
`~0` escapes `~`). Numeric segments index into sequences.

!*/

use crate::error::{self, AssertionError};
use serde_json::Value;

/// The outcome of resolving a field path against a document. Lookups never
/// panic on unexpected shapes; a container/scalar disagreement is reported as
/// `TypeMismatch` naming the segment where traversal stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'a> {
    Found(&'a Value),
    Missing,
    TypeMismatch { at: String },
}

/// Resolves `path` against `doc`.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Lookup<'a> {
    let mut current = doc;
    let mut walked = String::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let key = unescape(segment);
        walked.push('/');
        walked.push_str(segment);
        current = match current {
            Value::Object(map) => match map.get(&key) {
                Some(next) => next,
                None => return Lookup::Missing,
            },
            Value::Array(items) => match key.parse::<usize>() {
                Ok(index) => match items.get(index) {
                    Some(next) => next,
                    None => return Lookup::Missing,
                },
                Err(_) => return Lookup::TypeMismatch { at: walked },
            },
            _ => return Lookup::TypeMismatch { at: walked },
        };
    }
    Lookup::Found(current)
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// An ordered list of (field path, expected value) pairs. Evaluation stops at
/// the first divergence.
#[derive(Debug, Clone, Default)]
pub struct ExpectationSet {
    expectations: Vec<(String, Value)>,
}

impl ExpectationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an expectation that the value at `path` equals `value`.
    pub fn field<S, V>(mut self, path: S, value: V) -> Self
    where
        S: Into<String>,
        V: Into<Value>,
    {
        self.expectations.push((path.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.expectations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.expectations.len()
    }
}

/// Walks each expectation against `doc`, failing on the first mismatch with
/// the path, the expected value, and the actual value (or "absent").
pub fn expect(doc: &Value, expectations: &ExpectationSet) -> Result<(), AssertionError> {
    for (path, expected) in &expectations.expectations {
        let actual = match lookup(doc, path) {
            Lookup::Found(actual) if actual == expected => continue,
            Lookup::Found(actual) => actual.to_string(),
            Lookup::Missing => "absent".to_string(),
            Lookup::TypeMismatch { at } => format!("a non-container value at '{}'", at),
        };
        return error::AssertionSnafu {
            path: path.clone(),
            expected: expected.to_string(),
            actual,
        }
        .fail();
    }
    Ok(())
}
