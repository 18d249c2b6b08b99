// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Evohaus Bridge.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Minimal, forgiving HTML helpers for the portal's server-rendered pages

use once_cell::sync::Lazy;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr\s*>").expect("valid row regex"));
static CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<td\b[^>]*>(.*?)</td\s*>").expect("valid cell regex"));
static ANCHOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<a\b[^>]*>").expect("valid anchor regex"));
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)(?:^|\s)([^\s"'<>/=]+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
        .expect("valid attribute regex")
});
static ELEMENT_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<(/?)([a-zA-Z][a-zA-Z0-9-]*)\b[^>]*?(/?)>").expect("valid element regex")
});

/// Elements that never have a closing tag
const VOID_ELEMENTS: [&str; 11] = [
    "area", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr",
];

/// Plain text of an HTML fragment: tags removed, entities decoded, whitespace collapsed
pub fn text_content(fragment: &str) -> String {
    let without_tags = TAG.replace_all(fragment, " ");
    let decoded = html_escape::decode_html_entities(&without_tags);
    WHITESPACE.replace_all(decoded.trim(), " ").into_owned()
}

/// Inner HTML of every `<tr>` in document order
pub fn table_rows(html: &str) -> impl Iterator<Item = &str> {
    ROW.captures_iter(html)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// Text of every `<td>` in a row; header cells (`<th>`) are not included
pub fn row_cells(row_html: &str) -> Vec<String> {
    CELL.captures_iter(row_html)
        .filter_map(|caps| caps.get(1).map(|m| text_content(m.as_str())))
        .collect()
}

/// Value of a named attribute inside a single opening tag
pub fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let caps = ATTRIBUTE
        .captures_iter(tag)
        .find(|caps| caps.get(1).is_some_and(|n| n.as_str().eq_ignore_ascii_case(name)))?;
    caps.get(2)
        .or_else(|| caps.get(3))
        .or_else(|| caps.get(4))
        .map(|m| m.as_str())
}

/// Markup from `start` up to the closing tag of the element enclosing `start`
///
/// `start` must point at an opening tag. Without a closing tag the rest of
/// the document is returned.
pub fn rest_of_parent(html: &str, start: usize) -> &str {
    let tail = html.get(start..).unwrap_or_default();
    let mut depth = 0_usize;
    for caps in ELEMENT_TAG.captures_iter(tail) {
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let self_closing = caps.get(3).is_some_and(|m| !m.as_str().is_empty());
        let name = caps.get(2).map_or("", |m| m.as_str()).to_ascii_lowercase();

        if closing {
            if depth == 0 {
                let end = caps.get(0).map_or(tail.len(), |m| m.start());
                return tail.get(..end).unwrap_or(tail);
            }
            depth -= 1;
        } else if !self_closing && !VOID_ELEMENTS.contains(&name.as_str()) {
            depth += 1;
        }
    }
    tail
}

/// Opening `<a ...>` tags in document order
pub fn anchor_tags(html: &str) -> impl Iterator<Item = &str> {
    ANCHOR.find_iter(html).map(|m| m.as_str())
}

/// Whether a tag's `class` attribute lists the given class
pub fn has_class(tag: &str, class: &str) -> bool {
    attribute(tag, "class").is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_content() {
        assert_eq!(text_content("  <b>Verbrauch</b>\n  Strom&nbsp;kWh "), "Verbrauch Strom kWh");
        assert_eq!(text_content("m&sup3;"), "m³");
        assert_eq!(text_content("K&uuml;che"), "Küche");
    }

    #[test]
    fn test_rows_and_cells() {
        let html = r#"
            <table>
              <tr><th>Einheit</th><th>Bezeichnung</th></tr>
              <tr class="odd"><td>kWh</td><td><span>Verbrauch Strom kWh</span></td></tr>
            </table>"#;
        let rows: Vec<_> = table_rows(html).collect();
        assert_eq!(rows.len(), 2);
        assert!(row_cells(rows[0]).is_empty());
        assert_eq!(row_cells(rows[1]), vec!["kWh", "Verbrauch Strom kWh"]);
    }

    #[test]
    fn test_attribute_quoting_styles() {
        assert_eq!(attribute(r#"<a class="pdm" id="4711">"#, "id"), Some("4711"));
        assert_eq!(attribute("<a class='pdm x' id='4711'>", "class"), Some("pdm x"));
        assert_eq!(attribute("<a id=4711 class=pdm>", "id"), Some("4711"));
        assert_eq!(attribute("<a class=pdm>", "id"), None);
        assert_eq!(attribute(r#"<label FOR="residence">"#, "for"), Some("residence"));
        assert_eq!(attribute(r#"<a data-id="x" id="7">"#, "id"), Some("7"));
        assert_eq!(attribute(r#"<a title="id=3" id="7">"#, "id"), Some("7"));
    }

    #[test]
    fn test_rest_of_parent() {
        let html = "<div><p><label>A</label><br><img src=x/><span>B</span></p><i>C</i></div><b>D</b>";
        let start = html.find("<label").unwrap();
        assert_eq!(
            rest_of_parent(html, start),
            "<label>A</label><br><img src=x/><span>B</span>"
        );

        let start = html.find("<p>").unwrap();
        assert_eq!(
            rest_of_parent(html, start),
            "<p><label>A</label><br><img src=x/><span>B</span></p><i>C</i>"
        );

        assert_eq!(rest_of_parent("<a>x</a>", 0), "<a>x</a>");
    }

    #[test]
    fn test_has_class() {
        assert!(has_class(r#"<a class="link pdm" id="1">"#, "pdm"));
        assert!(!has_class(r#"<a class="pdmx" id="1">"#, "pdm"));
        assert!(!has_class(r#"<a id="1">"#, "pdm"));
    }
}
