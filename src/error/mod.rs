//! Error types for the query pipeline.
//!
//! Every stage of a run reports failure through [`Error`]. Each variant names
//! the offending input (URL, source label, namespace list, or expression) so
//! that a single line on standard error is enough to diagnose the problem.
//! All errors are terminal: the pipeline never retries and never prints a
//! partial result.

use std::io;

use thiserror::Error;

use crate::namespace::NamespaceError;
use crate::source::FetchError;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type returned by every pipeline stage.
#[derive(Debug, Error)]
pub enum Error {
    /// The target was neither a readable path nor a reachable URL.
    #[error("failed to fetch URL \"{url}\"")]
    SourceUnavailable {
        /// The target string, as given on the command line.
        url: String,
        /// The transport failure reported by the HTTP client.
        #[source]
        source: FetchError,
    },

    /// The input bytes did not yield a document tree.
    #[error("unable to parse input \"{label}\"")]
    Parse {
        /// The target string, or `stdin`.
        label: String,
        /// The I/O failure that interrupted reading, if any.
        #[source]
        source: Option<io::Error>,
    },

    /// The `-N` namespace list was malformed or could not be registered.
    #[error(transparent)]
    Namespace(#[from] NamespaceError),

    /// The expression failed to compile or to run.
    #[error("unable to evaluate XPath expression \"{expression}\": {reason}")]
    Evaluation {
        /// The expression as given.
        expression: String,
        /// What the engine reported.
        reason: String,
    },

    /// Writing the results failed.
    #[error("failed to write results")]
    Output(#[from] io::Error),
}

impl Error {
    pub(crate) fn parse(label: &str) -> Self {
        Self::Parse {
            label: label.to_owned(),
            source: None,
        }
    }

    pub(crate) fn parse_io(label: &str, source: io::Error) -> Self {
        Self::Parse {
            label: label.to_owned(),
            source: Some(source),
        }
    }

    pub(crate) fn evaluation(expression: &str, reason: impl Into<String>) -> Self {
        Self::Evaluation {
            expression: expression.to_owned(),
            reason: reason.into(),
        }
    }
}
