use crate::domain::model::{PageRecord, PageRef};
use crate::domain::ports::WikiSource;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static INFOBOX_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.infobox").expect("static selector"));

/// Outer HTML of every `table.infobox` in a rendered page, in document order.
pub fn extract_infobox_fragments(page_html: &str) -> Vec<String> {
    let document = Html::parse_document(page_html);
    document
        .select(&INFOBOX_SELECTOR)
        .map(|table| table.html())
        .collect()
}

/// Render one page and keep only its infobox tables.
///
/// `None` when the request fails or the API reports an error; the page is
/// then simply absent from this run.
pub async fn fetch_page_html<W: WikiSource + ?Sized>(
    source: &W,
    page: &PageRef,
) -> Option<PageRecord> {
    let rendered = source.render_page(page).await?;
    let infobox_html = extract_infobox_fragments(&rendered.html);

    tracing::debug!(
        "{} ({}) has {} infobox tables",
        rendered.title,
        rendered.page_id,
        infobox_html.len()
    );

    Some(PageRecord {
        title: rendered.title,
        page_id: rendered.page_id,
        infobox_html,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::embedded_in::tests::ScriptedSource;

    const PAGE: &str = r#"<div class="mw-parser-output">
<table class="infobox ib-chembox"><caption>Formaldehyde</caption><tbody><tr><td>CAS Number</td><td>50-00-0</td></tr></tbody></table>
<p>Formaldehyde is an organic compound.</p>
<table class="wikitable"><tr><td>not an infobox</td></tr></table>
<table class="infobox"><caption>Second</caption></table>
</div>"#;

    #[test]
    fn test_extracts_only_infobox_tables_in_order() {
        let fragments = extract_infobox_fragments(PAGE);

        assert_eq!(fragments.len(), 2);
        assert!(fragments[0].starts_with("<table class=\"infobox ib-chembox\">"));
        assert!(fragments[0].contains("50-00-0"));
        assert!(fragments[1].contains("Second"));
        assert!(!fragments.iter().any(|f| f.contains("not an infobox")));
    }

    #[test]
    fn test_page_without_infobox_has_no_fragments() {
        assert!(extract_infobox_fragments("<p>Just prose</p>").is_empty());
    }

    #[tokio::test]
    async fn test_fetch_builds_page_record() {
        let source = ScriptedSource::new(vec![]).with_page(17, "Formaldehyde", PAGE);

        let record = fetch_page_html(&source, &PageRef::Id(17)).await.unwrap();

        assert_eq!(record.title, "Formaldehyde");
        assert_eq!(record.page_id, 17);
        assert_eq!(record.infobox_html.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_none() {
        let source = ScriptedSource::new(vec![]);
        assert!(fetch_page_html(&source, &PageRef::Id(99)).await.is_none());
    }
}
