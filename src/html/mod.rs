//! Error-tolerant HTML loading.
//!
//! This module decodes document bytes to UTF-8 (see [`crate::encoding`])
//! and feeds them through `html5ever`, which repairs malformed markup the
//! way browsers do (missing end tags, misnested elements, unquoted
//! attributes, implied `html`/`head`/`body`). It then copies the result
//! into a [`DocumentTree`] the XPath engine can query.
//!
//! Three entry points cover the three ways input arrives:
//!
//! - [`load_reader`] parses an open stream until end-of-stream,
//! - [`load_path`] opens and parses a file,
//! - [`load_buffer`] parses downloaded bytes, labelled for diagnostics.
//!
//! Tree building follows the conventions of classic HTML tooling rather than
//! the DOM: element names carry no namespace (so `//b` and `//svg` match),
//! `<template>` contents are ordinary children, and the doctype is dropped.
//! A `prefix:name` element or attribute is placed in a namespace only when an
//! `xmlns:prefix` attribute on it or an ancestor declares one.
//!
//! Parsing never touches the network: `html5ever` performs no I/O and
//! nothing here resolves URLs found in the document.
//!
//! # Examples
//!
//! ```
//! use pez::html::{load_reader, LoadOptions};
//!
//! let tree = load_reader(&b"<p>Hello <b>world</b>"[..], "stdin", &LoadOptions::default()).unwrap();
//! let root = tree.root_element().unwrap();
//! assert_eq!(root.name().local_part(), "html");
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::rc::Rc;

use encoding_rs::Encoding;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use sxd_document::dom::{self, Document};
use sxd_document::{Package, QName};
use tracing::{debug, warn};

use crate::encoding;
use crate::error::{Error, Result};
use crate::source::{DocumentBuffer, Input, STDIN_LABEL};
use crate::tree::DocumentTree;
use crate::util::qname::split_qname;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// Elements whose whitespace-only text is content, not formatting.
const PRESERVE_SPACE: &[&str] = &["pre", "textarea", "script", "style"];

/// Options controlling how a document is loaded.
///
/// ```
/// use pez::html::LoadOptions;
///
/// let opts = LoadOptions::default().no_blanks(false).quiet(false);
/// assert!(!opts.no_blanks);
/// ```
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Drop whitespace-only text nodes between tags. Defaults to `true`.
    pub no_blanks: bool,
    /// Report parser diagnostics at `debug` level instead of `warn`.
    /// Defaults to `true`.
    pub quiet: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            no_blanks: true,
            quiet: true,
        }
    }
}

impl LoadOptions {
    /// Enables or disables stripping of blank text nodes.
    #[must_use]
    pub fn no_blanks(mut self, yes: bool) -> Self {
        self.no_blanks = yes;
        self
    }

    /// Enables or disables suppression of parser diagnostics.
    #[must_use]
    pub fn quiet(mut self, yes: bool) -> Self {
        self.quiet = yes;
        self
    }
}

/// Loads acquired input, dispatching on how it arrived.
///
/// # Errors
///
/// See [`load_reader`].
pub fn load<R: Read>(input: Input<R>, options: &LoadOptions) -> Result<DocumentTree> {
    match input {
        Input::Stream(reader) => load_reader(reader, STDIN_LABEL, options),
        Input::Path(path) => load_path(&path, options),
        Input::Buffer { buffer, label } => load_buffer(&buffer, &label, options),
    }
}

/// Parses an open stream until end-of-stream.
///
/// The whole stream is read first so its encoding can be detected from a
/// byte order mark or a `<meta>` declaration (see [`crate::encoding`]).
///
/// # Errors
///
/// Returns [`Error::Parse`] naming `label` if reading fails, or if the input
/// is empty, whitespace-only, or binary (contains a NUL byte).
pub fn load_reader<R: Read>(
    mut reader: R,
    label: &str,
    options: &LoadOptions,
) -> Result<DocumentTree> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| Error::parse_io(label, e))?;
    load_bytes(&bytes, None, label, options)
}

/// Opens and parses a file.
///
/// # Errors
///
/// Returns [`Error::Parse`] naming the path if it cannot be opened or read,
/// or if its content does not yield a document (see [`load_reader`]).
pub fn load_path(path: &Path, options: &LoadOptions) -> Result<DocumentTree> {
    let label = path.to_string_lossy();
    let file = File::open(path).map_err(|e| Error::parse_io(&label, e))?;
    load_reader(file, &label, options)
}

/// Parses downloaded bytes; `label` names their origin in diagnostics.
///
/// A charset in the buffer's `Content-Type` takes precedence over any
/// `<meta>` declaration, but not over a byte order mark.
///
/// # Errors
///
/// See [`load_reader`].
pub fn load_buffer(
    buffer: &DocumentBuffer,
    label: &str,
    options: &LoadOptions,
) -> Result<DocumentTree> {
    let transport = buffer.content_type().and_then(encoding::from_content_type);
    load_bytes(buffer.as_bytes(), transport, label, options)
}

fn load_bytes(
    bytes: &[u8],
    transport: Option<&'static Encoding>,
    label: &str,
    options: &LoadOptions,
) -> Result<DocumentTree> {
    let text = encoding::decode(bytes, transport);
    if is_blank(&text) || text.contains('\0') {
        debug!(source = label, bytes = bytes.len(), "no document content");
        return Err(Error::parse(label));
    }

    let dom = html_parser().one(&*text);
    debug!(
        source = label,
        bytes = bytes.len(),
        diagnostics = dom.errors.len(),
        "parsed HTML"
    );

    for message in &dom.errors {
        if options.quiet {
            debug!(source = label, "{message}");
        } else {
            warn!(source = label, "{message}");
        }
    }

    Ok(DocumentTree::from_package(build_tree(&dom, options)))
}

fn html_parser() -> html5ever::Parser<RcDom> {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            // Parse <noscript> content as markup, as non-scripting tools do.
            scripting_enabled: false,
            drop_doctype: true,
            ..TreeBuilderOpts::default()
        },
        ..ParseOpts::default()
    };
    parse_document(RcDom::default(), opts)
}

// ---------------------------------------------------------------------------
// Tree building
// ---------------------------------------------------------------------------

/// In-scope `xmlns:prefix` declarations.
type Scope = HashMap<String, String>;

#[derive(Clone, Copy)]
enum Parent<'d> {
    Root(dom::Root<'d>),
    Element(dom::Element<'d>),
}

struct Pending<'d> {
    handle: Handle,
    parent: Parent<'d>,
    scope: Rc<Scope>,
    preserve_space: bool,
}

/// Copies the html5ever DOM into sxd storage.
///
/// Works from an explicit stack so deeply nested input cannot overflow the
/// call stack.
fn build_tree(dom: &RcDom, options: &LoadOptions) -> Package {
    let package = Package::new();
    {
        let doc = package.as_document();
        let mut stack: Vec<Pending<'_>> = Vec::new();
        push_children(
            &mut stack,
            &dom.document,
            Parent::Root(doc.root()),
            &Rc::new(Scope::new()),
            false,
        );

        while let Some(pending) = stack.pop() {
            match &pending.handle.data {
                NodeData::Element {
                    name,
                    attrs,
                    template_contents,
                    ..
                } => {
                    let attrs = attrs.borrow();
                    let scope = extend_scope(&pending.scope, &attrs);
                    let element = create_element(&doc, &name.local, &scope);
                    append(pending.parent, element);
                    for attr in attrs.iter() {
                        set_attribute(element, attr, &scope);
                    }

                    let preserve_space =
                        pending.preserve_space || PRESERVE_SPACE.contains(&&*name.local);
                    let parent = Parent::Element(element);
                    push_children(&mut stack, &pending.handle, parent, &scope, preserve_space);
                    if let Some(contents) = template_contents.borrow().as_ref() {
                        push_children(&mut stack, contents, parent, &scope, preserve_space);
                    }
                }
                NodeData::Text { contents } => {
                    let text = contents.borrow();
                    if options.no_blanks && !pending.preserve_space && is_blank(&text) {
                        continue;
                    }
                    if let Parent::Element(parent) = pending.parent {
                        parent.append_child(doc.create_text(&text));
                    }
                }
                NodeData::Comment { contents } => {
                    append(pending.parent, doc.create_comment(contents));
                }
                NodeData::ProcessingInstruction { target, contents } => {
                    let value: &str = contents;
                    let pi = doc.create_processing_instruction(target, Some(value));
                    append(pending.parent, pi);
                }
                NodeData::Doctype { .. } | NodeData::Document => {}
            }
        }
    }
    package
}

fn push_children<'d>(
    stack: &mut Vec<Pending<'d>>,
    handle: &Handle,
    parent: Parent<'d>,
    scope: &Rc<Scope>,
    preserve_space: bool,
) {
    for child in handle.children.borrow().iter().rev() {
        stack.push(Pending {
            handle: Rc::clone(child),
            parent,
            scope: Rc::clone(scope),
            preserve_space,
        });
    }
}

fn append<'d, C>(parent: Parent<'d>, child: C)
where
    C: Into<dom::ChildOfRoot<'d>> + Into<dom::ChildOfElement<'d>>,
{
    match parent {
        Parent::Root(root) => root.append_child(child),
        Parent::Element(element) => element.append_child(child),
    }
}

fn is_blank(text: &str) -> bool {
    text.bytes().all(|b| b.is_ascii_whitespace())
}

/// Returns the prefix an attribute declares, if it is `xmlns:prefix`.
fn declared_prefix(attr: &html5ever::Attribute) -> Option<&str> {
    // Inside SVG and MathML the parser has already split the name.
    if &*attr.name.ns == XMLNS_NAMESPACE {
        return (&*attr.name.local != "xmlns").then_some(&*attr.name.local);
    }
    match split_qname(&attr.name.local) {
        (Some("xmlns"), prefix) => Some(prefix),
        _ => None,
    }
}

fn extend_scope(scope: &Rc<Scope>, attrs: &[html5ever::Attribute]) -> Rc<Scope> {
    let declarations: Vec<(&str, &str)> = attrs
        .iter()
        .filter_map(|attr| declared_prefix(attr).map(|prefix| (prefix, &*attr.value)))
        .collect();
    if declarations.is_empty() {
        return Rc::clone(scope);
    }
    let mut extended = Scope::clone(scope);
    for (prefix, uri) in declarations {
        extended.insert(prefix.to_owned(), uri.to_owned());
    }
    Rc::new(extended)
}

fn lookup<'s>(scope: &'s Scope, prefix: &str) -> Option<&'s str> {
    if prefix == "xml" {
        return Some(XML_NAMESPACE);
    }
    scope.get(prefix).map(String::as_str)
}

fn create_element<'d>(doc: &Document<'d>, raw: &str, scope: &Scope) -> dom::Element<'d> {
    if let (Some(prefix), local) = split_qname(raw) {
        if let Some(uri) = lookup(scope, prefix) {
            let element = doc.create_element(QName::with_namespace_uri(Some(uri), local));
            element.set_preferred_prefix(Some(prefix));
            return element;
        }
    }
    doc.create_element(raw)
}

fn set_attribute(element: dom::Element<'_>, attr: &html5ever::Attribute, scope: &Scope) {
    let value: &str = &attr.value;
    let local: &str = &attr.name.local;

    // Foreign content (SVG, MathML) arrives with xlink/xml attributes already
    // namespaced by the tree builder.
    let ns: &str = &attr.name.ns;
    if !ns.is_empty() && ns != XMLNS_NAMESPACE {
        let attribute =
            element.set_attribute_value(QName::with_namespace_uri(Some(ns), local), value);
        if let Some(prefix) = &attr.name.prefix {
            attribute.set_preferred_prefix(Some(&**prefix));
        }
        return;
    }
    if declared_prefix(attr).is_some() {
        let name = if ns == XMLNS_NAMESPACE {
            format!("xmlns:{local}")
        } else {
            local.to_owned()
        };
        element.set_attribute_value(name.as_str(), value);
        return;
    }

    if let (Some(prefix), name) = split_qname(local) {
        if let Some(uri) = lookup(scope, prefix) {
            let attribute =
                element.set_attribute_value(QName::with_namespace_uri(Some(uri), name), value);
            attribute.set_preferred_prefix(Some(prefix));
            return;
        }
    }
    element.set_attribute_value(local, value);
}
