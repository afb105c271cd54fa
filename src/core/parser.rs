use crate::core::infobox;
use crate::domain::model::{PageRecord, ParsedPageRecord};

/// Extract every infobox of a page, dropping the ones that yielded nothing.
pub fn parse_page(page: &PageRecord) -> ParsedPageRecord {
    let mut infoboxes = Vec::with_capacity(page.infobox_html.len());

    for fragment in &page.infobox_html {
        match infobox::extract(fragment) {
            Some(parsed) if !parsed.is_empty() => infoboxes.push(parsed),
            Some(_) => {}
            None => tracing::warn!(
                "Stored fragment of {} ({}) holds no infobox table",
                page.title,
                page.page_id
            ),
        }
    }

    ParsedPageRecord {
        title: page.title.clone(),
        page_id: page.page_id,
        infoboxes,
    }
}

/// One parsed record per page, in input order.
pub fn parse_pages(pages: &[PageRecord]) -> Vec<ParsedPageRecord> {
    let parsed: Vec<ParsedPageRecord> = pages.iter().map(parse_page).collect();

    let with_identifiers = parsed
        .iter()
        .filter(|page| page.infoboxes.iter().any(|i| i.has_identifiers()))
        .count();
    tracing::info!(
        "Parsed {} pages, {} with at least one identifier",
        parsed.len(),
        with_identifiers
    );

    parsed
}
