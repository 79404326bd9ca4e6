//! The in-memory document tree.
//!
//! [`DocumentTree`] owns an `sxd_document::Package`, the node storage the
//! XPath engine evaluates against. Nodes are handed out as lightweight
//! handles that borrow the tree, so query results can never outlive it.
//! Dropping the tree frees every node at once.

use std::fmt;

use sxd_document::dom::{ChildOfElement, ChildOfRoot, Document, Element};
use sxd_document::Package;

/// A parsed document.
pub struct DocumentTree {
    package: Package,
}

impl DocumentTree {
    pub(crate) fn from_package(package: Package) -> Self {
        Self { package }
    }

    /// Returns a handle to the document for navigation and evaluation.
    #[must_use]
    pub fn document(&self) -> Document<'_> {
        self.package.as_document()
    }

    /// Returns the document element (`<html>` for parsed HTML), if any.
    #[must_use]
    pub fn root_element(&self) -> Option<Element<'_>> {
        self.document()
            .root()
            .children()
            .into_iter()
            .find_map(|child| match child {
                ChildOfRoot::Element(element) => Some(element),
                _ => None,
            })
    }

    /// Counts the nodes below the document root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<Element<'_>> = Vec::new();
        for child in self.document().root().children() {
            count += 1;
            if let ChildOfRoot::Element(element) = child {
                stack.push(element);
            }
        }
        while let Some(element) = stack.pop() {
            count += element.attributes().len();
            for child in element.children() {
                count += 1;
                if let ChildOfElement::Element(child) = child {
                    stack.push(child);
                }
            }
        }
        count
    }
}

/// Concatenates the text descendants of `element`, in document order.
#[must_use]
pub fn text_content(element: Element<'_>) -> String {
    let mut out = String::new();
    let mut stack = vec![ChildOfElement::Element(element)];
    while let Some(node) = stack.pop() {
        match node {
            ChildOfElement::Element(e) => stack.extend(e.children().into_iter().rev()),
            ChildOfElement::Text(t) => out.push_str(t.text()),
            ChildOfElement::Comment(_) | ChildOfElement::ProcessingInstruction(_) => {}
        }
    }
    out
}

impl fmt::Debug for DocumentTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = self.root_element();
        f.debug_struct("DocumentTree")
            .field("root", &root.map(|e| e.name().local_part().to_owned()))
            .field("nodes", &self.node_count())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> DocumentTree {
        let package = Package::new();
        {
            let doc = package.as_document();
            let html = doc.create_element("html");
            let body = doc.create_element("body");
            let p = doc.create_element("p");
            p.set_attribute_value("class", "lead");
            p.append_child(doc.create_text("Hello "));
            let b = doc.create_element("b");
            b.append_child(doc.create_text("world"));
            p.append_child(b);
            body.append_child(p);
            html.append_child(body);
            doc.root().append_child(doc.create_comment("generated"));
            doc.root().append_child(html);
        }
        DocumentTree::from_package(package)
    }

    #[test]
    fn test_root_element_skips_comments() {
        let tree = sample();
        let root = tree.root_element().map(|e| e.name().local_part().to_owned());
        assert_eq!(root.as_deref(), Some("html"));
    }

    #[test]
    fn test_text_content_in_document_order() {
        let tree = sample();
        let root = tree.root_element().unwrap();
        assert_eq!(text_content(root), "Hello world");
    }

    #[test]
    fn test_node_count_includes_attributes() {
        // comment, html, body, p, @class, "Hello ", b, "world"
        assert_eq!(sample().node_count(), 8);
    }
}
