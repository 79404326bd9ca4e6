//! Input acquisition.
//!
//! A run reads its document from exactly one place: standard input, a file on
//! disk, or a URL. [`Target::resolve`] decides which, in a fixed order:
//!
//! 1. no source argument (or the literal `-`) means standard input;
//! 2. a string naming an existing filesystem entry is a path;
//! 3. anything else is treated as a URL.
//!
//! Standard input and paths are handed to the HTML loader unread, and the
//! loader reads them itself. URL bodies are downloaded into an owned
//! [`DocumentBuffer`] through the [`Fetch`] trait.

use std::borrow::Cow;
use std::fmt;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// The user agent sent with every HTTP request.
pub const USER_AGENT: &str = "pez/1.0";

/// The label used in diagnostics when reading from standard input.
pub const STDIN_LABEL: &str = "stdin";

/// Where the document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Read the whole of standard input.
    Stdin,
    /// Read a file on disk.
    Path(PathBuf),
    /// Download over HTTP(S).
    Url(String),
}

impl Target {
    /// Resolves the optional source argument into a target.
    ///
    /// # Examples
    ///
    /// ```
    /// use pez::source::Target;
    ///
    /// assert_eq!(Target::resolve(None), Target::Stdin);
    /// assert_eq!(Target::resolve(Some("-")), Target::Stdin);
    /// assert_eq!(
    ///     Target::resolve(Some("https://example.org/")),
    ///     Target::Url("https://example.org/".to_string())
    /// );
    /// ```
    #[must_use]
    pub fn resolve(source: Option<&str>) -> Self {
        match source {
            None | Some("-") => Self::Stdin,
            Some(s) if Path::new(s).exists() => Self::Path(PathBuf::from(s)),
            Some(s) => Self::Url(s.to_owned()),
        }
    }

    /// The name used for this target in error messages.
    #[must_use]
    pub fn label(&self) -> Cow<'_, str> {
        match self {
            Self::Stdin => Cow::Borrowed(STDIN_LABEL),
            Self::Path(path) => path.to_string_lossy(),
            Self::Url(url) => Cow::Borrowed(url),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Stdin => "stdin",
            Self::Path(_) => "path",
            Self::Url(_) => "url",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

// ---------------------------------------------------------------------------
// Document buffer
// ---------------------------------------------------------------------------

/// An owned, growable byte buffer holding a downloaded document.
///
/// The buffer implements [`Write`], so an HTTP client can append the body
/// chunk by chunk as it arrives. It only ever grows. The `Content-Type`
/// the server sent, if any, travels with the bytes so the loader can honour
/// its charset.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DocumentBuffer {
    bytes: Vec<u8>,
    content_type: Option<String>,
}

impl DocumentBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes accumulated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The accumulated bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The media type the bytes were served with.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Records the media type the bytes were served with.
    pub fn set_content_type(&mut self, value: impl Into<String>) {
        self.content_type = Some(value.into());
    }
}

impl From<Vec<u8>> for DocumentBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: None,
        }
    }
}

impl Write for DocumentBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Transport failure while downloading a URL.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not build the request, connect, or read the body.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    /// An I/O failure outside the HTTP client.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A blocking HTTP GET that streams the response body into a sink.
///
/// Only transport-level success matters: an HTTP error status still delivers
/// a body, and that body is a document like any other.
pub trait Fetch {
    /// Downloads `url`, appending the body to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the transfer fails at any point. The sink may
    /// then hold a partial body, which callers must discard.
    fn fetch(&self, url: &str, sink: &mut DocumentBuffer) -> Result<(), FetchError>;
}

/// Options for [`HttpFetcher`].
///
/// ```
/// use std::time::Duration;
/// use pez::source::FetchOptions;
///
/// let opts = FetchOptions::default().timeout(Some(Duration::from_secs(10)));
/// assert_eq!(opts.user_agent, "pez/1.0");
/// ```
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Total time allowed for a request. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            timeout: None,
        }
    }
}

impl FetchOptions {
    /// Sets the `User-Agent` header.
    #[must_use]
    pub fn user_agent(mut self, agent: &str) -> Self {
        self.user_agent = agent.to_string();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// [`Fetch`] implementation backed by `reqwest`'s blocking client.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    options: FetchOptions,
}

impl HttpFetcher {
    /// Creates a fetcher with the given options.
    #[must_use]
    pub fn new(options: FetchOptions) -> Self {
        Self { options }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str, sink: &mut DocumentBuffer) -> Result<(), FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(self.options.user_agent.as_str())
            .timeout(self.options.timeout)
            .build()?;

        let mut response = client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "server answered with a non-success status");
        }
        if let Some(value) = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
        {
            sink.set_content_type(value);
        }

        let received = response.copy_to(sink)?;
        debug!(%url, %status, received, "download complete");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Acquisition
// ---------------------------------------------------------------------------

/// Document input ready for the HTML loader.
#[derive(Debug)]
pub enum Input<R> {
    /// An open stream, parsed until end-of-stream.
    Stream(R),
    /// A file the loader opens and reads itself.
    Path(PathBuf),
    /// A downloaded body, with the label used in diagnostics.
    Buffer {
        /// The document bytes.
        buffer: DocumentBuffer,
        /// The URL the bytes came from.
        label: String,
    },
}

/// Resolves a target into loader input, downloading URLs through `fetcher`.
///
/// # Errors
///
/// Returns [`Error::SourceUnavailable`] if a URL cannot be fetched. The
/// partial download is dropped before returning.
pub fn acquire<R, F>(target: &Target, stdin: R, fetcher: &F) -> Result<Input<R>>
where
    R: Read,
    F: Fetch + ?Sized,
{
    info!(kind = target.kind(), source = %target, "acquiring input");
    match target {
        Target::Stdin => Ok(Input::Stream(stdin)),
        Target::Path(path) => Ok(Input::Path(path.clone())),
        Target::Url(url) => {
            let mut buffer = DocumentBuffer::new();
            match fetcher.fetch(url, &mut buffer) {
                Ok(()) => {
                    debug!(%url, bytes = buffer.len(), "fetched document");
                    Ok(Input::Buffer {
                        buffer,
                        label: url.clone(),
                    })
                }
                Err(source) => {
                    debug!(%url, discarded = buffer.len(), "fetch failed");
                    Err(Error::SourceUnavailable {
                        url: url.clone(),
                        source,
                    })
                }
            }
        }
    }
}
