//! Markup serializer for element subtrees.
//!
//! Writes an element and everything below it as well-formed XML-style
//! markup. With indentation on, children of element-only content go on
//! their own lines; mixed content is written inline so no whitespace is
//! added to text.

use std::fmt::Write as _;

use sxd_document::dom::{ChildOfElement, Element};

use super::PrintOptions;

/// Indentation stops growing past this many columns, as in libxml2's
/// tree dumper, so deeply nested output stays linear in size.
const MAX_INDENT_WIDTH: usize = 60;

/// Pending serializer work. Children are pushed in reverse so they pop in
/// document order, and an element's `Close` sits below its children.
enum Step<'d> {
    Open {
        element: Element<'d>,
        depth: usize,
        own_line: bool,
    },
    Close {
        element: Element<'d>,
        depth: usize,
        own_line: bool,
        element_only: bool,
    },
    Leaf {
        child: ChildOfElement<'d>,
        depth: usize,
        own_line: bool,
    },
}

/// Appends `element` and its subtree to `out`.
///
/// The walk keeps its own stack, so nesting depth is bounded only by
/// memory.
pub(crate) fn serialize_element(out: &mut String, element: Element<'_>, options: &PrintOptions) {
    let mut stack = vec![Step::Open {
        element,
        depth: 0,
        own_line: false,
    }];
    while let Some(step) = stack.pop() {
        match step {
            Step::Open {
                element,
                depth,
                own_line,
            } => open_element(out, &mut stack, element, options, depth, own_line),
            Step::Close {
                element,
                depth,
                own_line,
                element_only,
            } => {
                if element_only {
                    push_indent(out, options, depth);
                }
                out.push_str("</");
                push_name(out, element_prefix(element), element.name().local_part());
                out.push('>');
                if options.indent && own_line {
                    out.push('\n');
                }
            }
            Step::Leaf {
                child,
                depth,
                own_line,
            } => write_leaf(out, child, options, depth, own_line),
        }
    }
}

/// True if the element has element children and no text other than
/// whitespace between them.
fn is_element_only(element: Element<'_>) -> bool {
    let mut has_element_child = false;
    for child in element.children() {
        match child {
            ChildOfElement::Element(_) => has_element_child = true,
            ChildOfElement::Text(text) if !text.text().trim().is_empty() => return false,
            _ => {}
        }
    }
    has_element_child
}

fn push_indent(out: &mut String, options: &PrintOptions, depth: usize) {
    let width = options.indent_str.len().max(1);
    for _ in 0..depth.min(MAX_INDENT_WIDTH / width) {
        out.push_str(&options.indent_str);
    }
}

fn push_name(out: &mut String, prefix: Option<&str>, local: &str) {
    if let Some(prefix) = prefix {
        out.push_str(prefix);
        out.push(':');
    }
    out.push_str(local);
}

/// A namespaced name is only printable with the prefix it was written with.
fn element_prefix<'d>(element: Element<'d>) -> Option<&'d str> {
    element
        .name()
        .namespace_uri()
        .and_then(|_| element.preferred_prefix())
}

/// Writes the start tag, or the whole element if it is childless, and
/// schedules the children and the end tag.
fn open_element<'d>(
    out: &mut String,
    stack: &mut Vec<Step<'d>>,
    element: Element<'d>,
    options: &PrintOptions,
    depth: usize,
    own_line: bool,
) {
    let indent = options.indent && own_line;
    if indent {
        push_indent(out, options, depth);
    }

    out.push('<');
    push_name(out, element_prefix(element), element.name().local_part());

    for attribute in element.attributes() {
        let attr_name = attribute.name();
        let attr_prefix = attr_name
            .namespace_uri()
            .and_then(|_| attribute.preferred_prefix());
        out.push(' ');
        push_name(out, attr_prefix, attr_name.local_part());
        out.push_str("=\"");
        write_escaped_attr(out, attribute.value());
        out.push('"');
    }

    let children = element.children();
    if children.is_empty() {
        out.push_str("/>");
        if indent {
            out.push('\n');
        }
        return;
    }

    out.push('>');
    let element_only = options.indent && is_element_only(element);
    if element_only {
        out.push('\n');
    }
    stack.push(Step::Close {
        element,
        depth,
        own_line,
        element_only,
    });
    for child in children.into_iter().rev() {
        stack.push(match child {
            ChildOfElement::Element(child) => Step::Open {
                element: child,
                depth: depth + 1,
                own_line: element_only,
            },
            child => Step::Leaf {
                child,
                depth: depth + 1,
                own_line: element_only,
            },
        });
    }
}

/// Writes a text, comment or processing-instruction child.
fn write_leaf(
    out: &mut String,
    child: ChildOfElement<'_>,
    options: &PrintOptions,
    depth: usize,
    own_line: bool,
) {
    match child {
        ChildOfElement::Element(_) => {}
        ChildOfElement::Text(text) => {
            // Whitespace between elements is replaced by the indentation.
            if !(own_line && text.text().trim().is_empty()) {
                write_escaped_text(out, text.text());
            }
        }
        ChildOfElement::Comment(comment) => {
            if own_line {
                push_indent(out, options, depth);
            }
            out.push_str("<!--");
            out.push_str(comment.text());
            out.push_str("-->");
            if own_line {
                out.push('\n');
            }
        }
        ChildOfElement::ProcessingInstruction(pi) => {
            if own_line {
                push_indent(out, options, depth);
            }
            out.push_str("<?");
            out.push_str(pi.target());
            if let Some(value) = pi.value() {
                out.push(' ');
                out.push_str(value);
            }
            out.push_str("?>");
            if own_line {
                out.push('\n');
            }
        }
    }
}

fn write_hex_char_ref(out: &mut String, ch: char) {
    let _ = write!(out, "&#x{:X};", u32::from(ch));
}

/// Escapes character data: `&`, `<`, `>` by name, `\r` as `&#13;`, other
/// C0 controls except tab and newline as hex references.
pub(crate) fn write_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            '\t' | '\n' => out.push(ch),
            c if u32::from(c) < 0x20 => write_hex_char_ref(out, c),
            _ => out.push(ch),
        }
    }
}

/// Escapes an attribute value for a double-quoted attribute.
pub(crate) fn write_escaped_attr(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            c if u32::from(c) < 0x20 => write_hex_char_ref(out, c),
            _ => out.push(ch),
        }
    }
}
