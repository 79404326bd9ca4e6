//! Qualified-name helpers.
//!
//! HTML parsers do not split `prefix:local` names the way XML parsers do, so
//! the loader and the namespace registrar use these helpers to recognise
//! prefixes and to validate prefixes given on the command line.
//!
//! See <https://www.w3.org/TR/xml-names/#NT-QName>

/// Splits a qualified name into its prefix and local name parts.
///
/// Returns `(Some(prefix), local)` only when both sides of the first colon
/// are non-empty; any other name is returned whole as `(None, name)`.
#[must_use]
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => (Some(prefix), local),
        _ => (None, qname),
    }
}

/// Returns true if `name` is a non-colonized name usable as a namespace
/// prefix.
#[must_use]
pub fn is_ncname(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    is_name_start_char(first) && chars.all(is_name_char)
}

fn is_name_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || (!c.is_ascii() && c.is_alphabetic())
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || c.is_ascii_digit()
        || matches!(c, '-' | '.' | '\u{B7}')
        || (!c.is_ascii() && c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_qname_with_prefix() {
        assert_eq!(split_qname("xml:lang"), (Some("xml"), "lang"));
    }

    #[test]
    fn test_split_qname_without_prefix() {
        assert_eq!(split_qname("div"), (None, "div"));
    }

    #[test]
    fn test_split_qname_colon_at_start_is_not_a_prefix() {
        assert_eq!(split_qname(":local"), (None, ":local"));
    }

    #[test]
    fn test_split_qname_colon_at_end_is_not_a_prefix() {
        assert_eq!(split_qname("prefix:"), (None, "prefix:"));
    }

    #[test]
    fn test_split_qname_multiple_colons() {
        assert_eq!(split_qname("a:b:c"), (Some("a"), "b:c"));
    }

    #[test]
    fn test_ncname() {
        assert!(is_ncname("atom"));
        assert!(is_ncname("_x-1.2"));
        assert!(is_ncname("préfixe"));
        assert!(!is_ncname(""));
        assert!(!is_ncname("1abc"));
        assert!(!is_ncname("a:b"));
        assert!(!is_ncname("-a"));
    }
}
