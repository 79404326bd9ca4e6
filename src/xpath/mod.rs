//! `XPath` 1.0 evaluation.
//!
//! Compilation and evaluation are delegated to `sxd_xpath`. This module binds
//! the engine to a [`DocumentTree`], installs namespace prefixes before any
//! expression runs, and turns engine failures into [`Error::Evaluation`].
//!
//! # Quick Start
//!
//! ```
//! use pez::html::{load_reader, LoadOptions};
//! use pez::xpath::{EvaluationContext, QueryResult};
//!
//! let tree = load_reader(&b"<p>a</p><p>b</p>"[..], "stdin", &LoadOptions::default()).unwrap();
//! let ctx = EvaluationContext::new(&tree);
//! match ctx.evaluate("//p").unwrap() {
//!     QueryResult::Nodes(nodes) => assert_eq!(nodes.len(), 2),
//!     QueryResult::Scalar(_) => unreachable!(),
//! }
//! ```

use sxd_document::dom::Document;
use sxd_xpath::nodeset::Node;
use sxd_xpath::{Context, Factory, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::namespace::NamespaceTable;
use crate::tree::DocumentTree;

/// The outcome of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult<'d> {
    /// Matched nodes, in document order. The nodes borrow the tree.
    Nodes(Vec<Node<'d>>),
    /// A boolean, number or string result, as its `XPath` string value
    /// (`true`, `2`, `NaN`, ...).
    Scalar(String),
}

impl QueryResult<'_> {
    /// Returns true for an empty node-set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Nodes(nodes) if nodes.is_empty())
    }
}

/// A document bound to an `XPath` context.
///
/// Exactly one is built per query. Namespace prefixes must be registered
/// before [`evaluate`](Self::evaluate) is called for prefixed name tests to
/// resolve.
pub struct EvaluationContext<'d> {
    document: Document<'d>,
    context: Context<'d>,
}

impl<'d> EvaluationContext<'d> {
    /// Creates a context over `tree` with no namespace prefixes bound.
    #[must_use]
    pub fn new(tree: &'d DocumentTree) -> Self {
        Self {
            document: tree.document(),
            context: Context::new(),
        }
    }

    /// Binds every prefix in `namespaces`.
    pub fn register_namespaces(&mut self, namespaces: &NamespaceTable) {
        namespaces.register(&mut self.context);
    }

    /// Builder form of [`register_namespaces`](Self::register_namespaces).
    #[must_use]
    pub fn with_namespaces(mut self, namespaces: &NamespaceTable) -> Self {
        self.register_namespaces(namespaces);
        self
    }

    /// Compiles `expression` and evaluates it against the document root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Evaluation`] if the expression is empty, does not
    /// parse, or fails at run time (unknown function, unbound prefix or
    /// variable).
    pub fn evaluate(&self, expression: &str) -> Result<QueryResult<'d>> {
        let xpath = Factory::new()
            .build(expression)
            .map_err(|e| Error::evaluation(expression, e.to_string()))?
            .ok_or_else(|| Error::evaluation(expression, "empty expression"))?;

        let value = xpath
            .evaluate(&self.context, self.document.root())
            .map_err(|e| Error::evaluation(expression, e.to_string()))?;

        let result = match value {
            Value::Nodeset(nodes) => QueryResult::Nodes(nodes.document_order()),
            scalar => QueryResult::Scalar(scalar.string()),
        };
        match &result {
            QueryResult::Nodes(nodes) => debug!(expression, matched = nodes.len(), "evaluated"),
            QueryResult::Scalar(value) => debug!(expression, value = %value, "evaluated to scalar"),
        }
        Ok(result)
    }
}

/// Evaluates `expression` against `tree` with the given prefixes bound.
///
/// # Errors
///
/// See [`EvaluationContext::evaluate`].
pub fn evaluate<'d>(
    tree: &'d DocumentTree,
    namespaces: &NamespaceTable,
    expression: &str,
) -> Result<QueryResult<'d>> {
    EvaluationContext::new(tree)
        .with_namespaces(namespaces)
        .evaluate(expression)
}
