//! Aggregation pipelines over JSON documents.
//!
//! A [`Pipeline`] is an ordered list of stages applied to a stream of
//! documents:
//!
//! - [`Stage::Match`] keeps documents whose field equals a value
//! - [`Stage::Unwind`] flattens an embedded array into one row per element
//! - [`Stage::Group`] groups rows by a key and accumulates sums
//!
//! ```rust
//! use emporium_core::pipeline::{Accumulator, Pipeline};
//! use serde_json::json;
//!
//! let pipeline = Pipeline::new()
//!     .matching("_id", json!("u1"))
//!     .unwind("cart")
//!     .group("_id", [("total", Accumulator::sum("cart.price"))]);
//!
//! let rows = pipeline
//!     .run([json!({"_id": "u1", "cart": [{"price": "2.50"}, {"price": "1.50"}]})])
//!     .unwrap();
//! assert_eq!(rows, vec![json!({"_id": "u1", "total": "4.00"})]);
//! ```
//!
//! The in-process evaluator lives in [`eval`]; storage backends that can push
//! the work down (e.g. to SQL) translate the same stage list themselves.

mod eval;

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Errors raised while building or evaluating a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// A summed field is absent from a row.
    #[error("field `{path}` is missing from an aggregated row")]
    MissingField { path: String },

    /// A summed field holds something other than a decimal.
    #[error("field `{path}` is not numeric: {value}")]
    NotNumeric { path: String, value: String },

    /// A sum left the decimal range.
    #[error("sum of `{path}` overflowed")]
    Overflow { path: String },

    /// The backend cannot express this pipeline shape.
    #[error("unsupported pipeline: {0}")]
    Unsupported(String),
}

/// A dotted path into a document, e.g. `cart.price`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(String);

impl FieldPath {
    /// Create a path from its dotted form.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The dotted form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Individual path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// The remainder of this path below `prefix`, if it is nested under it.
    ///
    /// `cart.price` relative to `cart` is `Some("price")`; `cart` relative to
    /// itself is `Some("")`.
    #[must_use]
    pub fn strip_prefix(&self, prefix: &Self) -> Option<&str> {
        let rest = self.0.strip_prefix(prefix.as_str())?;
        if rest.is_empty() {
            Some(rest)
        } else {
            rest.strip_prefix('.')
        }
    }

    /// JSON pointer form (`/cart/price`) for `serde_json::Value::pointer`.
    #[must_use]
    pub fn pointer(&self) -> String {
        self.segments().fold(String::new(), |mut pointer, segment| {
            pointer.push('/');
            pointer.push_str(&segment.replace('~', "~0").replace('/', "~1"));
            pointer
        })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Group accumulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accumulator {
    /// Decimal sum of the field at the path.
    Sum(FieldPath),
}

impl Accumulator {
    /// Sum the field at `path`.
    #[must_use]
    pub fn sum(path: impl Into<FieldPath>) -> Self {
        Self::Sum(path.into())
    }
}

/// A single pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match { path: FieldPath, value: Value },
    Unwind { path: FieldPath },
    Group {
        key: FieldPath,
        accumulators: Vec<(String, Accumulator)>,
    },
}

/// An ordered list of stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// An empty pipeline (passes documents through unchanged).
    #[must_use]
    pub const fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a match stage.
    #[must_use]
    pub fn matching(mut self, path: impl Into<FieldPath>, value: Value) -> Self {
        self.stages.push(Stage::Match {
            path: path.into(),
            value,
        });
        self
    }

    /// Append an unwind stage.
    #[must_use]
    pub fn unwind(mut self, path: impl Into<FieldPath>) -> Self {
        self.stages.push(Stage::Unwind { path: path.into() });
        self
    }

    /// Append a group stage.
    #[must_use]
    pub fn group<N, I>(mut self, key: impl Into<FieldPath>, accumulators: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Accumulator)>,
    {
        self.stages.push(Stage::Group {
            key: key.into(),
            accumulators: accumulators
                .into_iter()
                .map(|(name, acc)| (name.into(), acc))
                .collect(),
        });
        self
    }

    /// The stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Evaluate the pipeline over `documents`.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::MissingField` or `PipelineError::NotNumeric` if a
    /// summed field is absent or not a decimal. A missing summed field is an
    /// error rather than contributing zero.
    pub fn run<I>(&self, documents: I) -> Result<Vec<Value>, PipelineError>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut rows: Vec<Value> = documents.into_iter().collect();
        for stage in &self.stages {
            rows = eval::apply(stage, rows)?;
        }
        Ok(rows)
    }
}
