//! RFC 4514 distinguished name parsing
//!
//! `tls_client_auth_subject_dn` metadata must be a well-formed string
//! representation of a distinguished name, and certificate binding compares
//! the registered DN against the presented certificate's subject. Parsing
//! covers the RFC 4514 grammar: comma-separated RDNs, `+`-joined
//! multi-valued RDNs, descriptor or dotted-OID attribute types, backslash
//! escapes (special characters and hex pairs), and `#hexstring` values.

use thiserror::Error;

/// A single `type=value` pair inside an RDN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeTypeAndValue {
    /// Attribute type: a descriptor (`CN`) or a dotted OID (`2.5.4.3`),
    /// normalized to uppercase descriptors.
    pub attribute_type: String,
    /// Unescaped attribute value.
    pub value: String,
}

/// DN parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DnError {
    /// The input is empty or whitespace.
    #[error("distinguished name is empty")]
    Empty,
    /// An RDN is missing the `=` separator.
    #[error("attribute at position {0} has no '=' separator")]
    MissingSeparator(usize),
    /// An attribute type is not a valid descriptor or OID.
    #[error("invalid attribute type '{0}'")]
    InvalidType(String),
    /// A character that must be escaped appears unescaped.
    #[error("unescaped special character '{0}' in attribute value")]
    UnescapedSpecial(char),
    /// A backslash escape is incomplete or not a valid pair.
    #[error("invalid escape sequence")]
    InvalidEscape,
    /// A `#hexstring` value has odd length or non-hex digits.
    #[error("invalid hexstring value")]
    InvalidHexString,
}

/// Parse a string DN into RDNs (outer vec), each a set of attribute
/// type-and-value pairs (inner vec, `+`-joined in the input).
pub fn parse(input: &str) -> Result<Vec<Vec<AttributeTypeAndValue>>, DnError> {
    if input.trim().is_empty() {
        return Err(DnError::Empty);
    }

    let mut rdns = Vec::new();
    for rdn in split_unescaped(input, ',') {
        let mut attributes = Vec::new();
        for (position, attribute) in split_unescaped(&rdn, '+').into_iter().enumerate() {
            attributes.push(parse_attribute(&attribute, position)?);
        }
        rdns.push(attributes);
    }
    Ok(rdns)
}

/// Parse and re-serialize a DN into a canonical form: uppercase descriptor
/// types, single `=` with no surrounding whitespace, minimal escaping.
///
/// Two DN strings bind the same name iff their normalized forms are equal.
pub fn normalize(input: &str) -> Result<String, DnError> {
    let rdns = parse(input)?;
    let serialized = rdns
        .iter()
        .map(|rdn| {
            rdn.iter()
                .map(|attribute| {
                    format!(
                        "{}={}",
                        attribute.attribute_type,
                        escape_value(&attribute.value)
                    )
                })
                .collect::<Vec<_>>()
                .join("+")
        })
        .collect::<Vec<_>>()
        .join(",");
    Ok(serialized)
}

/// Split on `separator` occurrences that are not preceded by a backslash.
fn split_unescaped(input: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for ch in input.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
        } else if ch == '\\' {
            current.push(ch);
            escaped = true;
        } else if ch == separator {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    parts.push(current);
    parts
}

fn parse_attribute(input: &str, position: usize) -> Result<AttributeTypeAndValue, DnError> {
    let (raw_type, raw_value) = input
        .split_once('=')
        .ok_or(DnError::MissingSeparator(position))?;

    let attribute_type = parse_type(raw_type.trim())?;
    let value = parse_value(raw_value.trim())?;
    Ok(AttributeTypeAndValue {
        attribute_type,
        value,
    })
}

fn parse_type(raw: &str) -> Result<String, DnError> {
    if raw.is_empty() {
        return Err(DnError::InvalidType(raw.to_string()));
    }

    let is_descriptor = raw.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    let is_oid = raw.chars().all(|c| c.is_ascii_digit() || c == '.')
        && !raw.starts_with('.')
        && !raw.ends_with('.')
        && !raw.contains("..");

    if is_descriptor {
        Ok(raw.to_ascii_uppercase())
    } else if is_oid {
        Ok(raw.to_string())
    } else {
        Err(DnError::InvalidType(raw.to_string()))
    }
}

fn parse_value(raw: &str) -> Result<String, DnError> {
    // '#' introduces a BER hexstring value; keep it verbatim after checking
    // the digits.
    if let Some(hex) = raw.strip_prefix('#') {
        if hex.is_empty() || hex.len() % 2 != 0 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DnError::InvalidHexString);
        }
        return Ok(raw.to_string());
    }

    let mut value = String::new();
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                let next = chars.next().ok_or(DnError::InvalidEscape)?;
                if matches!(next, '"' | '+' | ',' | ';' | '<' | '>' | ' ' | '#' | '=' | '\\') {
                    value.push(next);
                } else if next.is_ascii_hexdigit() {
                    let second = chars.next().ok_or(DnError::InvalidEscape)?;
                    if !second.is_ascii_hexdigit() {
                        return Err(DnError::InvalidEscape);
                    }
                    let byte = u8::from_str_radix(&format!("{next}{second}"), 16)
                        .map_err(|_| DnError::InvalidEscape)?;
                    value.push(byte as char);
                } else {
                    return Err(DnError::InvalidEscape);
                }
            }
            '"' | '+' | ',' | ';' | '<' | '>' => {
                return Err(DnError::UnescapedSpecial(ch));
            }
            _ => value.push(ch),
        }
    }
    Ok(value)
}

fn escape_value(value: &str) -> String {
    let length = value.chars().count();
    let mut escaped = String::with_capacity(value.len());
    for (index, ch) in value.chars().enumerate() {
        let special = matches!(ch, '"' | '+' | ',' | ';' | '<' | '>' | '\\')
            || (index == 0 && matches!(ch, ' ' | '#'))
            || (index + 1 == length && ch == ' ');
        if special {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_dn() {
        let rdns = parse("CN=client.example.com,O=Example Org,C=DE").unwrap();
        assert_eq!(rdns.len(), 3);
        assert_eq!(rdns[0][0].attribute_type, "CN");
        assert_eq!(rdns[0][0].value, "client.example.com");
        assert_eq!(rdns[1][0].value, "Example Org");
    }

    #[test]
    fn parses_multi_valued_rdn() {
        let rdns = parse("OU=Sales+CN=J. Smith,DC=example,DC=net").unwrap();
        assert_eq!(rdns[0].len(), 2);
        assert_eq!(rdns[0][0].attribute_type, "OU");
        assert_eq!(rdns[0][1].attribute_type, "CN");
        assert_eq!(rdns[0][1].value, "J. Smith");
    }

    #[test]
    fn parses_escaped_characters() {
        let rdns = parse(r"CN=Acme\, Inc.,O=Example").unwrap();
        assert_eq!(rdns[0][0].value, "Acme, Inc.");

        let rdns = parse(r"CN=Before\0dAfter").unwrap();
        assert_eq!(rdns[0][0].value, "Before\rAfter");
    }

    #[test]
    fn parses_oid_type_and_hexstring_value() {
        let rdns = parse("1.3.6.1.4.1.1466.0=#04024869,O=Test").unwrap();
        assert_eq!(rdns[0][0].attribute_type, "1.3.6.1.4.1.1466.0");
        assert_eq!(rdns[0][0].value, "#04024869");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("not a valid DN format!@#").is_err());
        assert_eq!(parse(""), Err(DnError::Empty));
        assert_eq!(parse("   "), Err(DnError::Empty));
        assert!(parse("CN=a,=b").is_err());
        assert!(parse("=value").is_err());
        assert!(parse(r"CN=trailing\").is_err());
        assert!(parse("CN=#123").is_err());
    }

    #[test]
    fn rejects_unescaped_specials_in_value() {
        assert_eq!(
            parse("CN=a<b"),
            Err(DnError::UnescapedSpecial('<'))
        );
    }

    #[test]
    fn normalization_uppercases_types_and_trims_whitespace() {
        let left = normalize("cn = client.example.com, o = Example Org").unwrap();
        let right = normalize("CN=client.example.com,O=Example Org").unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn normalization_preserves_escaping() {
        let normalized = normalize(r"CN=Acme\, Inc.").unwrap();
        assert_eq!(normalized, r"CN=Acme\, Inc.");
    }
}
