//! Character encoding detection for HTML input.
//!
//! Documents are decoded to UTF-8 before they reach the parser. The
//! encoding is chosen in this order:
//!
//! 1. a byte order mark at the start of the input,
//! 2. the charset of the HTTP `Content-Type` header, for downloaded bodies,
//! 3. a `<meta charset>` or `<meta http-equiv="Content-Type">` declaration
//!    in the first 1024 bytes,
//! 4. UTF-8.
//!
//! Byte sequences that are invalid in the chosen encoding decode to U+FFFD,
//! as browsers do.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252, X_USER_DEFINED};
use tracing::debug;

/// How far into the document `<meta>` declarations are looked for.
const PRESCAN_LIMIT: usize = 1024;

/// Where the chosen encoding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// A byte order mark.
    Bom,
    /// The transport layer, e.g. an HTTP `Content-Type` header.
    Transport,
    /// A `<meta>` declaration in the document.
    Meta,
    /// Nothing declared; UTF-8 assumed.
    Default,
}

/// Returns the encoding indicated by a byte order mark and the BOM length.
///
/// # Examples
///
/// ```
/// use pez::encoding::detect_bom;
///
/// assert_eq!(detect_bom(b"\xEF\xBB\xBF<p>").map(|(e, n)| (e.name(), n)), Some(("UTF-8", 3)));
/// assert!(detect_bom(b"<p>").is_none());
/// ```
#[must_use]
pub fn detect_bom(bytes: &[u8]) -> Option<(&'static Encoding, usize)> {
    Encoding::for_bom(bytes)
}

/// Returns the encoding named by the `charset` parameter of a
/// `Content-Type` value.
#[must_use]
pub fn from_content_type(value: &str) -> Option<&'static Encoding> {
    extract_charset(value.as_bytes()).and_then(for_declared_label)
}

/// Looks for a `<meta>` declaration near the start of the document.
///
/// Both `<meta charset="...">` and the `content` attribute of
/// `<meta http-equiv="Content-Type" content="text/html; charset=...">` are
/// honoured. Only the first [`PRESCAN_LIMIT`] bytes are examined.
#[must_use]
pub fn prescan_meta(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(PRESCAN_LIMIT)];
    let mut rest = head;
    while let Some(start) = find_ignore_case(rest, b"<meta") {
        let tag = &rest[start + b"<meta".len()..];
        let end = tag.iter().position(|&b| b == b'>').unwrap_or(tag.len());
        if let Some(encoding) = extract_charset(&tag[..end]).and_then(for_declared_label) {
            return Some(encoding);
        }
        rest = &tag[end..];
    }
    None
}

/// Chooses the encoding for `bytes`, returning it with the number of BOM
/// bytes to skip.
#[must_use]
pub fn sniff(
    bytes: &[u8],
    transport: Option<&'static Encoding>,
) -> (&'static Encoding, usize, Origin) {
    if let Some((encoding, skip)) = detect_bom(bytes) {
        return (encoding, skip, Origin::Bom);
    }
    if let Some(encoding) = transport {
        return (encoding, 0, Origin::Transport);
    }
    if let Some(encoding) = prescan_meta(bytes) {
        return (encoding, 0, Origin::Meta);
    }
    (UTF_8, 0, Origin::Default)
}

/// Decodes `bytes` to UTF-8 text.
///
/// Valid UTF-8 input without a BOM is borrowed, not copied.
///
/// # Examples
///
/// ```
/// use pez::encoding::decode;
///
/// let page = b"<meta charset=\"iso-8859-1\"><p>caf\xE9</p>";
/// assert!(decode(page, None).ends_with("<p>caf\u{e9}</p>"));
/// ```
#[must_use]
pub fn decode<'a>(bytes: &'a [u8], transport: Option<&'static Encoding>) -> Cow<'a, str> {
    let (encoding, skip, origin) = sniff(bytes, transport);
    debug!(encoding = encoding.name(), ?origin, "decoding input");
    let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[skip..]);
    if had_errors {
        debug!(encoding = encoding.name(), "malformed byte sequences replaced");
    }
    text
}

/// Resolves a label found in a document or header.
///
/// A document that claims to be UTF-16 could not have been read as ASCII,
/// so the claim is wrong and UTF-8 is used. `x-user-defined` means
/// windows-1252.
fn for_declared_label(label: &[u8]) -> Option<&'static Encoding> {
    let encoding = Encoding::for_label(label)?;
    if encoding == UTF_16BE || encoding == UTF_16LE {
        Some(UTF_8)
    } else if encoding == X_USER_DEFINED {
        Some(WINDOWS_1252)
    } else {
        Some(encoding)
    }
}

/// Extracts the value following `charset=` in an attribute list or header.
///
/// The value may be quoted; unquoted values stop at whitespace, `;`, a
/// quote, or `/`.
fn extract_charset(input: &[u8]) -> Option<&[u8]> {
    let mut position = 0;
    loop {
        let found = find_ignore_case(&input[position..], b"charset")?;
        position += found + b"charset".len();
        position += count_whitespace(&input[position..]);
        if input.get(position) == Some(&b'=') {
            break;
        }
    }
    position += 1;
    position += count_whitespace(&input[position..]);

    let value = &input[position..];
    match *value.first()? {
        quote @ (b'"' | b'\'') => {
            let inner = &value[1..];
            let len = inner.iter().position(|&b| b == quote)?;
            Some(&inner[..len])
        }
        _ => {
            let len = value
                .iter()
                .position(|&b| b.is_ascii_whitespace() || matches!(b, b';' | b'"' | b'\'' | b'/'))
                .unwrap_or(value.len());
            (len > 0).then(|| &value[..len])
        }
    }
}

fn count_whitespace(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_whitespace()).count()
}

fn find_ignore_case(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}
