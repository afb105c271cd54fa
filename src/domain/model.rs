use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The two infobox templates whose pages are harvested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Chembox,
    Drugbox,
}

impl TemplateKind {
    pub fn wiki_title(&self) -> &'static str {
        match self {
            TemplateKind::Chembox => "Template:Chembox",
            TemplateKind::Drugbox => "Template:Infobox drug",
        }
    }

    pub fn default_raw_file(&self) -> &'static str {
        match self {
            TemplateKind::Chembox => "chembox_raw_html.json",
            TemplateKind::Drugbox => "drugbox_raw_html.json",
        }
    }

    pub fn default_parsed_file(&self) -> &'static str {
        match self {
            TemplateKind::Chembox => "chembox_parsed_data.json",
            TemplateKind::Drugbox => "drugbox_parsed_data.json",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateKind::Chembox => write!(f, "chembox"),
            TemplateKind::Drugbox => write!(f, "drugbox"),
        }
    }
}

impl std::str::FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chembox" => Ok(TemplateKind::Chembox),
            "drugbox" => Ok(TemplateKind::Drugbox),
            other => Err(format!("unknown template '{}', expected chembox or drugbox", other)),
        }
    }
}

/// A template to harvest and the snapshot names its stages are stored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateTarget {
    pub kind: TemplateKind,
    pub title: String,
    pub raw_file: String,
    pub parsed_file: String,
}

impl TemplateTarget {
    pub fn with_defaults(kind: TemplateKind) -> Self {
        Self {
            kind,
            title: kind.wiki_title().to_string(),
            raw_file: kind.default_raw_file().to_string(),
            parsed_file: kind.default_parsed_file().to_string(),
        }
    }
}

/// Raw stage: the infobox tables of one page, kept as outer HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub title: String,
    pub page_id: u64,
    pub infobox_html: Vec<String>,
}

/// Identifiers mined from a single infobox table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Infobox {
    #[serde(rename = "infoboxTitle")]
    pub title: Option<String>,
    #[serde(default)]
    pub dtxsids: BTreeSet<String>,
    #[serde(default)]
    pub casrns: BTreeSet<String>,
    #[serde(default)]
    pub inchikeys: BTreeSet<String>,
    #[serde(default)]
    pub smiles: BTreeSet<String>,
}

impl Infobox {
    /// Nothing at all was recovered, not even a caption.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && !self.has_identifiers()
    }

    pub fn has_identifiers(&self) -> bool {
        !self.casrns.is_empty()
            || !self.inchikeys.is_empty()
            || !self.smiles.is_empty()
            || !self.dtxsids.is_empty()
    }
}

/// Parsed stage: every non-empty infobox of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPageRecord {
    pub title: String,
    pub page_id: u64,
    pub infoboxes: Vec<Infobox>,
}

/// How a content request names its page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRef {
    Id(u64),
    Title(String),
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageRef::Id(id) => write!(f, "page id {}", id),
            PageRef::Title(title) => write!(f, "page '{}'", title),
        }
    }
}

/// One entry of an embedded-in listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingPage {
    pub page_id: u64,
    pub namespace: i64,
    pub title: String,
}

/// One page of an embedded-in listing plus the cursor for the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedInBatch {
    pub pages: Vec<EmbeddingPage>,
    pub continuation: Option<String>,
}

/// Rendered page content as returned by the parse query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub title: String,
    pub page_id: u64,
    pub html: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infobox_emptiness() {
        let mut infobox = Infobox::default();
        assert!(infobox.is_empty());
        assert!(!infobox.has_identifiers());

        infobox.title = Some("Formaldehyde".to_string());
        assert!(!infobox.is_empty());
        assert!(!infobox.has_identifiers());

        let untitled = Infobox {
            smiles: BTreeSet::from(["C=O".to_string()]),
            ..Default::default()
        };
        assert!(!untitled.is_empty());
        assert!(untitled.has_identifiers());
    }

    #[test]
    fn test_parsed_page_wire_names() {
        let page = ParsedPageRecord {
            title: "Water".to_string(),
            page_id: 33306,
            infoboxes: vec![Infobox {
                title: None,
                casrns: BTreeSet::from(["7732-18-5".to_string()]),
                ..Default::default()
            }],
        };

        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["pageId"], 33306);
        assert!(value["infoboxes"][0]["infoboxTitle"].is_null());
        assert_eq!(value["infoboxes"][0]["casrns"][0], "7732-18-5");
        assert!(value["infoboxes"][0]["dtxsids"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_page_record_wire_names() {
        let json = r#"{"title":"Water","pageId":33306,"infoboxHtml":["<table class=\"infobox\"></table>"]}"#;
        let page: PageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(page.page_id, 33306);
        assert_eq!(page.infobox_html.len(), 1);
    }

    #[test]
    fn test_template_kind_from_str() {
        assert_eq!("Chembox".parse::<TemplateKind>().unwrap(), TemplateKind::Chembox);
        assert_eq!("drugbox".parse::<TemplateKind>().unwrap(), TemplateKind::Drugbox);
        assert!("taxobox".parse::<TemplateKind>().is_err());
    }
}
