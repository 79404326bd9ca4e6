//! # pez
//!
//! Evaluate an `XPath` 1.0 expression against an HTML document and print the
//! matching nodes. The document can come from standard input, a local file,
//! or an HTTP(S) URL. It is parsed leniently, the way browsers parse HTML.
//!
//! A run is a fixed pipeline:
//!
//! 1. [`source`] resolves the target and acquires its bytes,
//! 2. [`html`] decodes them ([`encoding`]) and parses them into a
//!    [`DocumentTree`],
//! 3. [`namespace`] binds the caller's prefixes,
//! 4. [`xpath`] evaluates the expression,
//! 5. [`output`] prints the result.
//!
//! ## Quick Start
//!
//! ```
//! use pez::{Pipeline, Query};
//!
//! let query = Query::new("//b");
//! let mut out = Vec::new();
//! Pipeline::default()
//!     .run(&query, &b"<a><b>hello</b><b>world</b></a>"[..], &mut out)
//!     .unwrap();
//! assert_eq!(out, b"<b>hello</b>\n<b>world</b>\n");
//! ```

pub mod encoding;
pub mod error;
pub mod html;
pub mod namespace;
pub mod output;
pub mod source;
pub mod tree;
pub mod util;
pub mod xpath;

use std::io::{Read, Write};

use tracing::info;

pub use error::{Error, Result};
pub use html::LoadOptions;
pub use namespace::{NamespaceError, NamespaceTable};
pub use output::PrintOptions;
pub use source::{Fetch, FetchOptions, HttpFetcher, Target};
pub use tree::DocumentTree;
pub use xpath::{EvaluationContext, QueryResult};

/// One invocation: an expression, optional namespace declarations, and an
/// optional source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// The `XPath` 1.0 expression.
    pub expression: String,
    /// A `prefix=uri ...` list, as given to `-N`.
    pub namespaces: Option<String>,
    /// A path or URL. `None` and `-` mean standard input.
    pub source: Option<String>,
}

impl Query {
    /// Creates a query over standard input with no namespaces.
    #[must_use]
    pub fn new(expression: &str) -> Self {
        Self {
            expression: expression.to_string(),
            namespaces: None,
            source: None,
        }
    }

    /// Sets the namespace declaration list.
    #[must_use]
    pub fn namespaces(mut self, list: &str) -> Self {
        self.namespaces = Some(list.to_string());
        self
    }

    /// Sets the source path or URL.
    #[must_use]
    pub fn source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }
}

/// The query pipeline, configured once and run per query.
#[derive(Debug, Clone)]
pub struct Pipeline<F = HttpFetcher> {
    fetcher: F,
    load: LoadOptions,
    print: PrintOptions,
}

impl Pipeline {
    /// Creates a pipeline that downloads URLs over HTTP with `options`.
    #[must_use]
    pub fn new(options: FetchOptions) -> Self {
        Self::with_fetcher(HttpFetcher::new(options))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(FetchOptions::default())
    }
}

impl<F: Fetch> Pipeline<F> {
    /// Creates a pipeline that downloads URLs through `fetcher`.
    pub fn with_fetcher(fetcher: F) -> Self {
        Self {
            fetcher,
            load: LoadOptions::default(),
            print: PrintOptions::default(),
        }
    }

    /// Replaces the HTML loader options.
    #[must_use]
    pub fn load_options(mut self, options: LoadOptions) -> Self {
        self.load = options;
        self
    }

    /// Replaces the printer options.
    #[must_use]
    pub fn print_options(mut self, options: PrintOptions) -> Self {
        self.print = options;
        self
    }

    /// Runs `query`, writing its result to `out`.
    ///
    /// `stdin` is read only when the query's source resolves to standard
    /// input. Nothing is written to `out` unless every stage before printing
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure: [`Error::SourceUnavailable`],
    /// [`Error::Parse`], [`Error::Namespace`], [`Error::Evaluation`] or
    /// [`Error::Output`].
    pub fn run<R, W>(&self, query: &Query, stdin: R, out: &mut W) -> Result<()>
    where
        R: Read,
        W: Write + ?Sized,
    {
        let target = Target::resolve(query.source.as_deref());
        let input = source::acquire(&target, stdin, &self.fetcher)?;
        let tree = html::load(input, &self.load)?;
        info!(nodes = tree.node_count(), "document loaded");

        let mut context = EvaluationContext::new(&tree);
        if let Some(list) = &query.namespaces {
            let table = NamespaceTable::parse(list)?;
            context.register_namespaces(&table);
        }

        let result = context.evaluate(&query.expression)?;
        output::print_result(&result, out, &self.print)?;
        out.flush()?;
        Ok(())
    }
}
