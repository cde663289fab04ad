//! Minimal HTML scanning helpers
//!
//! FOSSology pages are generated by a handful of PHP templates, so a few
//! regular expressions are enough to pull out the elements we need. Nested
//! elements of the same name are not supported.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref START_TAG: Regex = Regex::new(r"(?s)<([A-Za-z][A-Za-z0-9]*)\b([^>]*)>").unwrap();
    static ref ATTRIBUTE: Regex = Regex::new(
        r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#
    )
    .unwrap();
    static ref ANY_TAG: Regex = Regex::new(r"(?s)<[^>]*>").unwrap();
    static ref ENTITY: Regex = Regex::new(r"&(#[0-9]+|#[xX][0-9A-Fa-f]+|[A-Za-z]+);").unwrap();
}

/// One element found in a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lower-cased tag name
    pub name: String,
    /// Attributes in source order, values entity-decoded
    pub attrs: Vec<(String, String)>,
    /// Raw markup between the start tag and its end
    pub inner_html: String,
}

impl Element {
    /// Value of the named attribute (case-insensitive)
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Visible text with tags removed and entities decoded
    pub fn text(&self) -> String {
        strip_tags(&self.inner_html)
    }
}

fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    ATTRIBUTE
        .captures_iter(raw)
        .map(|cap| {
            let value = cap
                .get(2)
                .or_else(|| cap.get(3))
                .or_else(|| cap.get(4))
                .map(|m| m.as_str())
                .unwrap_or("");
            (cap[1].to_ascii_lowercase(), decode_entities(value))
        })
        .collect()
}

/// All elements named `tag`, with their content
///
/// Content runs to the next `</tag` or the next `<tag` start, whichever
/// comes first, so unclosed `<option>` lists still split correctly.
pub fn elements(html: &str, tag: &str) -> Vec<Element> {
    let lower = html.to_ascii_lowercase();
    let tag = tag.to_ascii_lowercase();
    let close = format!("</{}", tag);

    let starts: Vec<_> = START_TAG
        .captures_iter(html)
        .filter(|cap| cap[1].eq_ignore_ascii_case(&tag))
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            Some((whole.start(), whole.end(), parse_attributes(&cap[2])))
        })
        .collect();

    let mut found = Vec::with_capacity(starts.len());
    for (index, (_, content_start, attrs)) in starts.iter().enumerate() {
        let mut end = lower[*content_start..]
            .find(&close)
            .map(|offset| content_start + offset)
            .unwrap_or(html.len());
        if let Some((next_start, _, _)) = starts.get(index + 1) {
            end = end.min(*next_start);
        }
        found.push(Element {
            name: tag.clone(),
            attrs: attrs.clone(),
            inner_html: html[*content_start..end].to_string(),
        });
    }
    found
}

/// Elements named `tag` whose attribute `attr` equals `value`
pub fn elements_with_attr(html: &str, tag: &str, attr: &str, value: &str) -> Vec<Element> {
    elements(html, tag)
        .into_iter()
        .filter(|e| e.attr(attr) == Some(value))
        .collect()
}

/// The first element of any kind carrying `id="<id>"`
pub fn element_by_id(html: &str, id: &str) -> Option<Element> {
    let name = START_TAG.captures_iter(html).find_map(|cap| {
        parse_attributes(&cap[2])
            .iter()
            .any(|(k, v)| k == "id" && v == id)
            .then(|| cap[1].to_string())
    })?;
    elements(html, &name)
        .into_iter()
        .find(|e| e.attr("id") == Some(id))
}

/// Remove all tags, decode entities and trim
pub fn strip_tags(html: &str) -> String {
    decode_entities(&ANY_TAG.replace_all(html, "")).trim().to_string()
}

/// Decode the named and numeric character references FOSSology emits
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITY
        .replace_all(text, |cap: &regex::Captures| {
            let entity = &cap[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                    u32::from_str_radix(&entity[2..], 16)
                        .ok()
                        .and_then(char::from_u32)
                }
                _ if entity.starts_with('#') => {
                    entity[1..].parse::<u32>().ok().and_then(char::from_u32)
                }
                _ => None,
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| cap[0].to_string())
        })
        .into_owned()
}
