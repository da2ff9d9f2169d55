//! XML decoding utilities shared by the description and DIDL-Lite parsers.
//!
//! UPnP documents are namespace-heavy and media servers are careless about
//! prefixes. The serde-based parsers strip prefixes before deserializing so
//! the model structs can use bare element names, and DIDL-Lite payloads that
//! arrive escaped a second time are unescaped before parsing.

use crate::error::{ParseError, ParseResult};
use serde::de::DeserializeOwned;
use std::borrow::Cow;

/// Parse XML string into a deserializable type with namespace stripping.
///
/// # Arguments
///
/// * `xml` - The XML string to parse
///
/// # Returns
///
/// The parsed value of type `T`, or an error if parsing fails.
pub fn parse<T: DeserializeOwned>(xml: &str) -> ParseResult<T> {
    let stripped = strip_namespaces(xml);
    quick_xml::de::from_str(&stripped)
        .map_err(|e| ParseError::XmlDeserializationFailed(e.to_string()))
}

/// Undo an extra level of HTML/XML entity escaping.
///
/// DIDL-Lite is carried as text inside the SOAP `Result` element. Some
/// servers escape it twice, so after the SOAP layer is decoded the text still
/// reads `&lt;DIDL-Lite ...`. Text without `&lt;` is returned untouched.
pub fn unescape_markup(text: &str) -> Cow<'_, str> {
    if text.contains("&lt;") {
        html_escape::decode_html_entities(text)
    } else {
        Cow::Borrowed(text)
    }
}

/// Strip namespace prefixes from XML content to simplify parsing.
///
/// Element and attribute prefixes are removed and `xmlns` declarations are
/// dropped. Comments, CDATA sections, processing instructions and the
/// document type declaration are copied verbatim.
///
/// # Example
///
/// Input: `<s:Envelope><dc:title>Song</dc:title></s:Envelope>`
/// Output: `<Envelope><title>Song</title></Envelope>`
pub fn strip_namespaces(xml: &str) -> String {
    let mut result = String::with_capacity(xml.len());
    let mut rest = xml;

    while let Some(start) = rest.find('<') {
        result.push_str(&rest[..start]);
        rest = &rest[start..];

        if let Some(len) = verbatim_len(rest) {
            result.push_str(&rest[..len]);
            rest = &rest[len..];
            continue;
        }

        let end = tag_end(rest);
        strip_tag(&rest[..end], &mut result);
        rest = &rest[end..];
    }

    result.push_str(rest);
    result
}

/// Length of a markup construct that must be copied unchanged, if `s` starts with one
fn verbatim_len(s: &str) -> Option<usize> {
    let terminator = if s.starts_with("<!--") {
        "-->"
    } else if s.starts_with("<![CDATA[") {
        "]]>"
    } else if s.starts_with("<?") {
        "?>"
    } else if s.starts_with("<!") {
        ">"
    } else {
        return None;
    };

    Some(
        s.find(terminator)
            .map(|pos| pos + terminator.len())
            .unwrap_or(s.len()),
    )
}

/// Byte length of the tag at the start of `s`, honouring quoted attribute values
fn tag_end(s: &str) -> usize {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => return i + 1,
            _ => {}
        }
    }
    s.len()
}

/// Rewrite a single start or end tag without prefixes or `xmlns` attributes
fn strip_tag(tag: &str, out: &mut String) {
    let inner = tag.trim_start_matches('<');
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };

    out.push('<');
    if closing {
        out.push('/');
    }

    let name_len = inner
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(inner.len());
    out.push_str(local_name(&inner[..name_len]));

    let mut chars = inner[name_len..].chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || c == '/' || c == '>' {
            out.push(c);
            chars.next();
            continue;
        }

        let mut attr_name = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c.is_whitespace() || c == '>' || c == '/' {
                break;
            }
            attr_name.push(c);
            chars.next();
        }

        let mut value = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                value.push(c);
                chars.next();
            } else {
                break;
            }
        }
        if chars.peek() == Some(&'=') {
            value.push('=');
            chars.next();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    value.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            if let Some(&q) = chars.peek() {
                if q == '"' || q == '\'' {
                    value.push(q);
                    chars.next();
                    for c in chars.by_ref() {
                        value.push(c);
                        if c == q {
                            break;
                        }
                    }
                }
            }
        }

        if attr_name == "xmlns" || attr_name.starts_with("xmlns:") {
            // drop the declaration together with the whitespace in front of it
            while out.ends_with(char::is_whitespace) {
                out.pop();
            }
            continue;
        }

        out.push_str(local_name(&attr_name));
        out.push_str(value.trim_end());
    }
}

fn local_name(name: &str) -> &str {
    match name.find(':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}
