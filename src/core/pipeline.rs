use crate::core::acquisition::PageAcquisition;
use crate::core::content::fetch_page_html;
use crate::core::parser::{parse_page, parse_pages};
use crate::core::snapshot::{CommitOutcome, SnapshotStore, Stage};
use crate::domain::model::{PageRecord, PageRef, ParsedPageRecord, TemplateTarget};
use crate::domain::ports::{Pipeline, Storage, WikiSource};
use crate::utils::error::{InfoboxError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Fetch only pages missing from the raw snapshot.
    Update,
    /// Fetch every page again and replace both snapshots.
    Redownload,
    /// Re-parse the stored raw snapshot without touching the network.
    Reparse,
}

/// Raw and parsed stages of one template, run against a snapshot store.
pub struct InfoboxPipeline<'a, S: Storage, W: WikiSource> {
    target: TemplateTarget,
    store: &'a SnapshotStore<S>,
    source: &'a W,
    mode: RunMode,
}

impl<'a, S: Storage, W: WikiSource> InfoboxPipeline<'a, S, W> {
    pub fn new(
        target: TemplateTarget,
        store: &'a SnapshotStore<S>,
        source: &'a W,
        mode: RunMode,
    ) -> Self {
        Self {
            target,
            store,
            source,
            mode,
        }
    }

    pub fn target(&self) -> &TemplateTarget {
        &self.target
    }

    fn log_commit(&self, outcome: &CommitOutcome, count: usize) {
        match outcome {
            CommitOutcome::Unchanged { path } => {
                tracing::info!("{} is current ({} pages)", path, count)
            }
            CommitOutcome::Written { path, .. } => {
                tracing::info!("Saved {} pages to {}", count, path)
            }
        }
    }
}

#[async_trait::async_trait]
impl<'a, S: Storage, W: WikiSource> Pipeline for InfoboxPipeline<'a, S, W> {
    async fn extract(&self) -> Result<Vec<PageRecord>> {
        let acquisition = PageAcquisition::new(self.source);
        let raw_file = self.target.raw_file.as_str();

        match self.mode {
            RunMode::Update => {
                let acquired = acquisition
                    .update_from_store(&self.target.title, self.store, raw_file)
                    .await?;
                if acquired.snapshot_existed {
                    tracing::info!(
                        "{}: {} new pages downloaded",
                        self.target.kind,
                        acquired.added()
                    );
                } else {
                    tracing::info!(
                        "{}: first download, {} pages",
                        self.target.kind,
                        acquired.pages.len()
                    );
                }

                let outcome = self
                    .store
                    .commit(
                        Stage::Raw,
                        raw_file,
                        &acquired.pages,
                        acquired.existing_count,
                        false,
                    )
                    .await?;
                self.log_commit(&outcome, acquired.pages.len());
                Ok(acquired.pages)
            }
            RunMode::Redownload => {
                tracing::info!("{}: redownloading all pages", self.target.kind);
                let pages = acquisition.download_all(&self.target.title).await;

                let outcome = self
                    .store
                    .commit(Stage::Raw, raw_file, &pages, 0, true)
                    .await?;
                self.log_commit(&outcome, pages.len());
                Ok(pages)
            }
            RunMode::Reparse => match self.store.load_raw(raw_file).await? {
                Some(pages) => {
                    tracing::info!("Loaded {} pages from {}", pages.len(), raw_file);
                    Ok(pages)
                }
                // Parsed data is left alone when there is nothing to parse from.
                None => Err(InfoboxError::SnapshotError {
                    path: self.store.path(Stage::Raw, raw_file),
                    message: "no raw snapshot to re-parse; run `update` first".to_string(),
                }),
            },
        }
    }

    async fn transform(&self, pages: Vec<PageRecord>) -> Result<Vec<ParsedPageRecord>> {
        Ok(parse_pages(&pages))
    }

    async fn load(&self, parsed: Vec<ParsedPageRecord>) -> Result<String> {
        let parsed_file = self.target.parsed_file.as_str();
        let existing_count = self
            .store
            .load_parsed(parsed_file)
            .await?
            .map(|pages| pages.len())
            .unwrap_or(0);
        tracing::info!(
            "Found {} parsed pages in existing {}",
            existing_count,
            parsed_file
        );

        let force = self.mode != RunMode::Update;
        let outcome = self
            .store
            .commit(Stage::Parsed, parsed_file, &parsed, existing_count, force)
            .await?;
        self.log_commit(&outcome, parsed.len());

        Ok(match outcome {
            CommitOutcome::Unchanged { path } | CommitOutcome::Written { path, .. } => path,
        })
    }
}

/// Fetch a single page by name and parse its infoboxes, without storing anything.
pub async fn inspect_page<W: WikiSource + ?Sized>(
    source: &W,
    page_title: &str,
) -> Option<ParsedPageRecord> {
    let page = fetch_page_html(source, &PageRef::Title(page_title.to_string())).await?;
    Some(parse_page(&page))
}
