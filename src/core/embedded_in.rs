use crate::domain::model::EmbeddingPage;
use crate::domain::ports::WikiSource;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    Start,
    Continue(String),
    Done,
}

/// Cursor-driven walk over the pages of an embedded-in listing.
///
/// Each call to [`EmbeddedInPages::next_batch`] issues one request, threading
/// the continuation token of the previous response. The walk ends when a
/// response carries no token or a request fails; a failure is not retried.
pub struct EmbeddedInPages<'a, W: WikiSource + ?Sized> {
    source: &'a W,
    template_title: &'a str,
    cursor: Cursor,
    requests: usize,
}

impl<'a, W: WikiSource + ?Sized> EmbeddedInPages<'a, W> {
    pub fn new(source: &'a W, template_title: &'a str) -> Self {
        Self {
            source,
            template_title,
            cursor: Cursor::Start,
            requests: 0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.cursor == Cursor::Done
    }

    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Rewind to the first page.
    pub fn restart(&mut self) {
        self.cursor = Cursor::Start;
        self.requests = 0;
    }

    pub async fn next_batch(&mut self) -> Option<Vec<EmbeddingPage>> {
        let token = match &self.cursor {
            Cursor::Done => return None,
            Cursor::Start => None,
            Cursor::Continue(token) => Some(token.as_str()),
        };

        self.requests += 1;
        let batch = self.source.embedded_in(self.template_title, token).await;

        match batch {
            Some(batch) => {
                self.cursor = match batch.continuation {
                    Some(next) => Cursor::Continue(next),
                    None => Cursor::Done,
                };
                Some(batch.pages)
            }
            None => {
                if self.requests > 1 {
                    tracing::warn!(
                        "Listing for {} stopped after {} requests; results may be incomplete",
                        self.template_title,
                        self.requests
                    );
                }
                self.cursor = Cursor::Done;
                None
            }
        }
    }
}

/// Ids of every article embedding `template_title`.
pub async fn find_page_ids<W: WikiSource + ?Sized>(
    source: &W,
    template_title: &str,
) -> BTreeSet<u64> {
    let mut pages = EmbeddedInPages::new(source, template_title);
    let mut page_ids = BTreeSet::new();

    while let Some(batch) = pages.next_batch().await {
        page_ids.extend(batch.into_iter().map(|page| page.page_id));
    }

    tracing::debug!(
        "Listing for {} took {} requests",
        template_title,
        pages.requests()
    );
    page_ids
}
