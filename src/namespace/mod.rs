//! Namespace declarations for queries.
//!
//! XPath name tests such as `atom:entry` only match when the prefix is bound
//! in the evaluation context. The `-N` option supplies those bindings as a
//! single string of space-separated `prefix=uri` pairs:
//!
//! ```text
//! atom=http://www.w3.org/2005/Atom og=http://ogp.me/ns#
//! ```
//!
//! There is no quoting or escaping, so neither part may contain a space. An
//! empty URI (`p=`) is accepted and binds the empty string. A later pair
//! with the same prefix replaces the earlier one. Parsing is all-or-nothing:
//! one malformed pair rejects the whole list.

use sxd_xpath::Context;
use thiserror::Error;
use tracing::debug;

use crate::util::qname::is_ncname;

/// A malformed or unregistrable namespace list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamespaceError {
    /// A pair had no `=` separator.
    #[error("failed to register namespaces list \"{list}\": invalid namespaces list format")]
    InvalidFormat {
        /// The whole list, as given.
        list: String,
    },
    /// A prefix is not a valid namespace prefix.
    #[error("unable to register NS with prefix=\"{prefix}\" and href=\"{href}\"")]
    Register {
        /// The rejected prefix.
        prefix: String,
        /// The URI it was to be bound to.
        href: String,
    },
}

/// Prefix → URI bindings, in order of first declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceTable {
    bindings: Vec<(String, String)>,
}

impl NamespaceTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `prefix1=uri1 prefix2=uri2 ...` list.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceError::InvalidFormat`] if any space-separated pair
    /// lacks `=`, or [`NamespaceError::Register`] if a prefix is not a valid
    /// `NCName`. No partial table is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use pez::namespace::NamespaceTable;
    ///
    /// let table = NamespaceTable::parse("  a=urn:a  b=urn:b ").unwrap();
    /// assert_eq!(table.get("b"), Some("urn:b"));
    /// assert!(NamespaceTable::parse("foo bar=baz").is_err());
    /// ```
    pub fn parse(list: &str) -> Result<Self, NamespaceError> {
        let mut table = Self::new();
        for pair in list.split(' ').filter(|pair| !pair.is_empty()) {
            let (prefix, href) = pair
                .split_once('=')
                .ok_or_else(|| NamespaceError::InvalidFormat {
                    list: list.to_owned(),
                })?;
            table.insert(prefix, href)?;
        }
        Ok(table)
    }

    /// Binds `prefix` to `href`, returning the URI it replaced, if any.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceError::Register`] if `prefix` is not a valid
    /// `NCName`.
    pub fn insert(&mut self, prefix: &str, href: &str) -> Result<Option<String>, NamespaceError> {
        if !is_ncname(prefix) {
            return Err(NamespaceError::Register {
                prefix: prefix.to_owned(),
                href: href.to_owned(),
            });
        }
        if let Some((_, existing)) = self.bindings.iter_mut().find(|(p, _)| p == prefix) {
            debug!(prefix, old = %existing, new = href, "namespace prefix redeclared");
            return Ok(Some(std::mem::replace(existing, href.to_owned())));
        }
        self.bindings.push((prefix.to_owned(), href.to_owned()));
        Ok(None)
    }

    /// Returns the URI bound to `prefix`.
    #[must_use]
    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, href)| href.as_str())
    }

    /// Number of bound prefixes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if no prefix is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterates over `(prefix, uri)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(prefix, href)| (prefix.as_str(), href.as_str()))
    }

    /// Installs every binding into an XPath evaluation context.
    pub fn register(&self, context: &mut Context<'_>) {
        for (prefix, href) in self.iter() {
            debug!(prefix, href, "registering namespace");
            context.set_namespace(prefix, href);
        }
    }
}
