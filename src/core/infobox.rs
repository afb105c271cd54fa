//! Identifier extraction from Chembox and Drugbox infobox tables.
//!
//! The two templates render similar looking tables with different layouts.
//! Chembox puts labels and values in sibling `td` cells; Drugbox labels rows
//! with a `th` and leaves the SMILES and InChI rows without one. A table is
//! classified once by its class list and handed to the matching function.

use crate::domain::model::{Infobox, TemplateKind};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

pub static CASRN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]{2,7}-[0-9]{2}-[0-9]").expect("static regex"));
pub static INCHIKEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z]{14}-[A-Z]{10}-[A-Z]{1}").expect("static regex"));
pub static DTXSID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"DTXSID[0-9]+").expect("static regex"));

static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.infobox").expect("static selector"));
static CAPTION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("caption").expect("static selector"));
static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("static selector"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("static selector"));
static HEADER_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th").expect("static selector"));
static ITEM_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("li").expect("static selector"));

const CAS_LABEL: &str = "CAS Number";
const DASHBOARD_LABEL: &str = "CompTox Dashboard (EPA)";
const INCHI_PREFIX: &str = "InChI";
const SMILES_PREFIX: &str = "SMILES";

const BLOCK_ELEMENTS: &[&str] = &[
    "br", "caption", "dd", "div", "dl", "dt", "hr", "li", "ol", "p", "table", "td", "th", "tr",
    "ul",
];

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    let block = BLOCK_ELEMENTS.contains(&child.value().name());
                    if block {
                        out.push(' ');
                    }
                    collect_text(child, out);
                    if block {
                        out.push(' ');
                    }
                }
            }
            _ => {}
        }
    }
}

/// Visible text with whitespace collapsed; block elements separate words.
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of each `li` under `element`, or its whole text when it has no list.
fn list_or_text(element: ElementRef<'_>) -> Vec<String> {
    let items: Vec<String> = element.select(&ITEM_SELECTOR).map(element_text).collect();
    if items.is_empty() {
        vec![element_text(element)]
    } else {
        items
    }
}

/// Every match of `pattern`, list-aware.
fn extract_pattern(element: ElementRef<'_>, pattern: &Regex) -> Vec<String> {
    list_or_text(element)
        .iter()
        .flat_map(|text| {
            pattern
                .find_iter(text)
                .map(|m| m.as_str().to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// `"Isomeric: C1=CC=CC=C1"` becomes `"C1=CC=CC=C1"`; unlabeled values pass through.
pub fn trim_to_colon(value: &str) -> &str {
    if value.contains(": ") {
        match value.find(':') {
            Some(colon) => value[colon + 1..].trim(),
            None => value,
        }
    } else {
        value
    }
}

fn smiles_values(element: ElementRef<'_>) -> Vec<String> {
    list_or_text(element)
        .iter()
        .map(|value| trim_to_colon(value).to_string())
        .collect()
}

fn caption_text(table: ElementRef<'_>) -> Option<String> {
    table.select(&CAPTION_SELECTOR).next().map(element_text)
}

fn next_sibling_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

/// Chembox when the table carries both `infobox` and `ib-chembox`.
pub fn classify(table: ElementRef<'_>) -> TemplateKind {
    let mut is_infobox = false;
    let mut is_chembox = false;
    for class in table.value().classes() {
        match class {
            "infobox" => is_infobox = true,
            "ib-chembox" => is_chembox = true,
            _ => {}
        }
    }

    if is_infobox && is_chembox {
        TemplateKind::Chembox
    } else {
        TemplateKind::Drugbox
    }
}

pub fn extract_chembox(table: ElementRef<'_>) -> Infobox {
    let mut infobox = Infobox {
        title: caption_text(table),
        ..Default::default()
    };
    if infobox.title.is_none() {
        tracing::warn!("Chembox table has no caption");
    }

    for row in table.select(&ROW_SELECTOR) {
        for cell in row.select(&CELL_SELECTOR) {
            let label = element_text(cell);

            if label == CAS_LABEL {
                if let Some(value) = next_sibling_element(cell) {
                    infobox.casrns.extend(extract_pattern(value, &CASRN_PATTERN));
                }
            } else if label == DASHBOARD_LABEL {
                if let Some(value) = next_sibling_element(cell) {
                    infobox.dtxsids.extend(extract_pattern(value, &DTXSID_PATTERN));
                }
            } else if label.starts_with(INCHI_PREFIX) {
                infobox.inchikeys.extend(extract_pattern(cell, &INCHIKEY_PATTERN));
            } else if label.starts_with(SMILES_PREFIX) {
                infobox.smiles.extend(smiles_values(cell));
            }
        }
    }

    infobox
}

pub fn extract_drugbox(table: ElementRef<'_>) -> Infobox {
    let mut infobox = Infobox {
        title: caption_text(table),
        ..Default::default()
    };

    for row in table.select(&ROW_SELECTOR) {
        let value = row.select(&CELL_SELECTOR).next();

        match row.select(&HEADER_SELECTOR).next() {
            Some(header) => {
                let label = element_text(header);
                let Some(value) = value else { continue };

                if label == CAS_LABEL {
                    infobox.casrns.extend(extract_pattern(value, &CASRN_PATTERN));
                } else if label == DASHBOARD_LABEL {
                    infobox.dtxsids.extend(extract_pattern(value, &DTXSID_PATTERN));
                }
            }
            // Unlabeled rows hold SMILES and InChI blocks; section headings
            // and image rows have nothing to offer.
            None => {
                let Some(cell) = value else { continue };
                let label = element_text(cell);

                if label.starts_with(SMILES_PREFIX) {
                    infobox.smiles.extend(smiles_values(cell));
                } else if label.starts_with(INCHI_PREFIX) {
                    infobox.inchikeys.extend(extract_pattern(cell, &INCHIKEY_PATTERN));
                }
            }
        }
    }

    infobox
}

pub fn extract_table(table: ElementRef<'_>) -> Infobox {
    match classify(table) {
        TemplateKind::Chembox => extract_chembox(table),
        TemplateKind::Drugbox => extract_drugbox(table),
    }
}

/// Parse one stored fragment. `None` if it holds no `table.infobox`.
pub fn extract(fragment_html: &str) -> Option<Infobox> {
    let fragment = Html::parse_fragment(fragment_html);
    let table = fragment.select(&TABLE_SELECTOR).next()?;
    Some(extract_table(table))
}
