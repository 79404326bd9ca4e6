//! Result printing.
//!
//! Renders an evaluation result to a byte sink, one line per item:
//!
//! - a text node prints its raw character content, unescaped;
//! - an element prints as markup with its whole subtree;
//! - a scalar prints its `XPath` string value.
//!
//! Other node kinds (the root, attributes, comments, processing
//! instructions, namespaces) print nothing. An empty node-set prints
//! nothing at all.

mod markup;

use std::io::{self, Write};

use sxd_xpath::nodeset::Node;
use tracing::{debug, trace};

use crate::xpath::QueryResult;

/// Options controlling how matched elements are rendered.
///
/// ```
/// use pez::output::PrintOptions;
///
/// let opts = PrintOptions::default().indent_str("\t");
/// assert!(opts.indent);
/// ```
#[derive(Debug, Clone)]
pub struct PrintOptions {
    /// Put children of element-only content on their own indented lines.
    /// Defaults to `true`.
    pub indent: bool,
    /// The string written once per nesting level. Defaults to two spaces.
    pub indent_str: String,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            indent: true,
            indent_str: "  ".to_string(),
        }
    }
}

impl PrintOptions {
    /// Enables or disables indented output.
    #[must_use]
    pub fn indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    /// Sets the per-level indentation string.
    #[must_use]
    pub fn indent_str(mut self, s: &str) -> Self {
        self.indent_str = s.to_string();
        self
    }
}

/// Prints an evaluation result.
///
/// # Errors
///
/// Returns any error raised by `out`.
pub fn print_result<W: Write + ?Sized>(
    result: &QueryResult<'_>,
    out: &mut W,
    options: &PrintOptions,
) -> io::Result<()> {
    match result {
        QueryResult::Nodes(nodes) => print_nodes(nodes, out, options),
        QueryResult::Scalar(value) => writeln!(out, "{value}"),
    }
}

/// Prints each node on its own line, in the order given.
///
/// # Errors
///
/// Returns any error raised by `out`.
///
/// # Examples
///
/// ```
/// use pez::html::{load_reader, LoadOptions};
/// use pez::output::{print_result, PrintOptions};
/// use pez::xpath::EvaluationContext;
///
/// let tree = load_reader(&b"<a><b>hello</b></a>"[..], "stdin", &LoadOptions::default()).unwrap();
/// let result = EvaluationContext::new(&tree).evaluate("//b/text()").unwrap();
/// let mut out = Vec::new();
/// print_result(&result, &mut out, &PrintOptions::default()).unwrap();
/// assert_eq!(out, b"hello\n");
/// ```
pub fn print_nodes<W: Write + ?Sized>(
    nodes: &[Node<'_>],
    out: &mut W,
    options: &PrintOptions,
) -> io::Result<()> {
    let mut scratch = String::new();
    let mut printed = 0usize;
    for node in nodes {
        match node {
            Node::Text(text) => {
                out.write_all(text.text().as_bytes())?;
            }
            Node::Element(element) => {
                scratch.clear();
                markup::serialize_element(&mut scratch, *element, options);
                out.write_all(scratch.as_bytes())?;
            }
            other => {
                trace!(kind = node_kind(other), "skipping node");
                continue;
            }
        }
        out.write_all(b"\n")?;
        printed += 1;
    }
    debug!(matched = nodes.len(), printed, "printed nodes");
    Ok(())
}

fn node_kind(node: &Node<'_>) -> &'static str {
    match node {
        Node::Root(_) => "root",
        Node::Element(_) => "element",
        Node::Attribute(_) => "attribute",
        Node::Text(_) => "text",
        Node::Comment(_) => "comment",
        Node::Namespace(_) => "namespace",
        Node::ProcessingInstruction(_) => "processing-instruction",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::html::{load_reader, LoadOptions};
    use crate::xpath::EvaluationContext;
    use pretty_assertions::assert_eq;

    fn query(input: &str, expression: &str) -> String {
        let tree = load_reader(input.as_bytes(), "test", &LoadOptions::default()).unwrap();
        let result = EvaluationContext::new(&tree).evaluate(expression).unwrap();
        let mut out = Vec::new();
        print_result(&result, &mut out, &PrintOptions::default()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_elements_one_per_line() {
        assert_eq!(
            query("<a><b>hello</b><b>world</b></a>", "//b"),
            "<b>hello</b>\n<b>world</b>\n"
        );
    }

    #[test]
    fn test_text_is_raw() {
        assert_eq!(query("<p>a &amp; b &lt; c</p>", "//p/text()"), "a & b < c\n");
    }

    #[test]
    fn test_element_text_is_escaped() {
        assert_eq!(query("<p>a &amp; b</p>", "//p"), "<p>a &amp; b</p>\n");
    }

    #[test]
    fn test_childless_element() {
        assert_eq!(query("<p>x<br></p>", "//br"), "<br/>\n");
    }

    #[test]
    fn test_indented_subtree() {
        assert_eq!(
            query("<ul><li>1</li><li>2</li></ul>", "//ul"),
            "<ul>\n  <li>1</li>\n  <li>2</li>\n</ul>\n"
        );
    }

    #[test]
    fn test_skipped_kinds() {
        assert_eq!(query(r#"<a href="x">y</a><!-- c -->"#, "//a/@href"), "");
        assert_eq!(query("<p><!-- c --></p>", "//comment()"), "");
        assert_eq!(query("<p>x</p>", "/"), "");
    }

    #[test]
    fn test_empty_result() {
        assert_eq!(query("<p>x</p>", "//table"), "");
    }

    #[test]
    fn test_scalars() {
        assert_eq!(query("<b>1</b><b>2</b>", "count(//b)"), "2\n");
        assert_eq!(query("<b>1</b>", "boolean(//i)"), "false\n");
        assert_eq!(query("<b>1</b>", "string(//b)"), "1\n");
    }

    #[test]
    fn test_scratch_buffer_does_not_leak_between_nodes() {
        assert_eq!(
            query("<i>long content here</i><i>x</i>", "//i"),
            "<i>long content here</i>\n<i>x</i>\n"
        );
    }

    #[test]
    fn test_write_failure_propagates() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let result = QueryResult::Scalar("1".to_string());
        let err = print_result(&result, &mut Broken, &PrintOptions::default()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
