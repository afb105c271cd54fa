use crate::core::content::fetch_page_html;
use crate::core::embedded_in::find_page_ids;
use crate::core::snapshot::SnapshotStore;
use crate::domain::model::{PageRecord, PageRef};
use crate::domain::ports::{Storage, WikiSource};
use crate::utils::error::Result;
use std::collections::BTreeSet;

/// Remote ids that are not yet in the stored snapshot.
pub fn new_page_ids(remote: &BTreeSet<u64>, existing: &[PageRecord]) -> BTreeSet<u64> {
    let known: BTreeSet<u64> = existing.iter().map(|page| page.page_id).collect();
    remote.difference(&known).copied().collect()
}

/// Result of acquiring a template's pages against a stored raw snapshot.
#[derive(Debug, Clone)]
pub struct Acquired {
    /// Whether a raw snapshot was found on disk.
    pub snapshot_existed: bool,
    pub existing_count: usize,
    pub pages: Vec<PageRecord>,
}

impl Acquired {
    pub fn added(&self) -> usize {
        self.pages.len().saturating_sub(self.existing_count)
    }
}

pub struct PageAcquisition<'a, W: WikiSource + ?Sized> {
    source: &'a W,
}

impl<'a, W: WikiSource + ?Sized> PageAcquisition<'a, W> {
    pub fn new(source: &'a W) -> Self {
        Self { source }
    }

    /// Every page embedding the template, fetched fresh.
    pub async fn download_all(&self, template_title: &str) -> Vec<PageRecord> {
        let page_ids = find_page_ids(self.source, template_title).await;
        tracing::info!("Found {} pages embedding {}", page_ids.len(), template_title);

        self.fetch_pages(&page_ids).await
    }

    /// Existing records followed by records for pages not seen before.
    /// Existing records are never dropped or modified.
    pub async fn update_from_snapshot(
        &self,
        template_title: &str,
        existing: Vec<PageRecord>,
    ) -> Vec<PageRecord> {
        let remote_ids = find_page_ids(self.source, template_title).await;
        let new_ids = new_page_ids(&remote_ids, &existing);
        tracing::info!(
            "Found {} pages embedding {}, {} not yet downloaded",
            remote_ids.len(),
            template_title,
            new_ids.len()
        );

        let mut pages = existing;
        if !new_ids.is_empty() {
            pages.extend(self.fetch_pages(&new_ids).await);
        }
        pages
    }

    /// Incremental update against the raw snapshot `file_name`, falling back
    /// to a full download when the snapshot does not exist yet.
    pub async fn update_from_store<S: Storage>(
        &self,
        template_title: &str,
        store: &SnapshotStore<S>,
        file_name: &str,
    ) -> Result<Acquired> {
        match store.load_raw(file_name).await? {
            Some(existing) => {
                tracing::info!("Found {} pages in existing {}", existing.len(), file_name);
                let existing_count = existing.len();
                let pages = self.update_from_snapshot(template_title, existing).await;
                Ok(Acquired {
                    snapshot_existed: true,
                    existing_count,
                    pages,
                })
            }
            None => {
                tracing::info!("No existing {}, downloading everything", file_name);
                let pages = self.download_all(template_title).await;
                Ok(Acquired {
                    snapshot_existed: false,
                    existing_count: 0,
                    pages,
                })
            }
        }
    }

    async fn fetch_pages(&self, page_ids: &BTreeSet<u64>) -> Vec<PageRecord> {
        let mut pages = Vec::with_capacity(page_ids.len());
        let mut failed = 0usize;

        for (index, &page_id) in page_ids.iter().enumerate() {
            match fetch_page_html(self.source, &PageRef::Id(page_id)).await {
                Some(page) => pages.push(page),
                None => {
                    failed += 1;
                    tracing::warn!("Skipping page {}: fetch failed", page_id);
                }
            }

            if (index + 1) % 500 == 0 {
                tracing::info!("Fetched {}/{} pages", index + 1, page_ids.len());
            }
        }

        tracing::info!("Fetched {} pages ({} failed)", pages.len(), failed);
        pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::embedded_in::tests::ScriptedSource;
    use crate::core::snapshot::tests::MemoryStorage;

    const INFOBOX: &str =
        r#"<table class="infobox"><caption>Thing</caption><tr><th>CAS Number</th><td>50-00-0</td></tr></table>"#;

    fn page(page_id: u64) -> PageRecord {
        PageRecord {
            title: format!("Page {}", page_id),
            page_id,
            infobox_html: vec![],
        }
    }

    fn source_with_pages(batches: Vec<Vec<u64>>) -> ScriptedSource {
        let ids: Vec<u64> = batches.iter().flatten().copied().collect();
        let mut source = ScriptedSource::new(batches);
        for id in ids {
            source = source.with_page(id, &format!("Page {}", id), INFOBOX);
        }
        source
    }

    #[test]
    fn test_new_page_ids_is_set_difference() {
        let remote = BTreeSet::from([1, 2, 3, 4]);
        let existing = vec![page(2), page(4), page(9)];

        assert_eq!(new_page_ids(&remote, &existing), BTreeSet::from([1, 3]));
        assert!(new_page_ids(&BTreeSet::new(), &existing).is_empty());
        assert_eq!(new_page_ids(&remote, &[]), remote);
    }

    #[tokio::test]
    async fn test_download_all_fetches_every_page() {
        let source = source_with_pages(vec![vec![3, 1], vec![2]]);
        let acquisition = PageAcquisition::new(&source);

        let pages = acquisition.download_all("Template:Chembox").await;

        let ids: Vec<u64> = pages.iter().map(|p| p.page_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(pages.iter().all(|p| p.infobox_html.len() == 1));
    }

    #[tokio::test]
    async fn test_update_fetches_only_new_pages_and_appends() {
        let source = source_with_pages(vec![vec![1, 2, 3]]);
        let acquisition = PageAcquisition::new(&source);
        let existing = vec![page(2)];

        let pages = acquisition
            .update_from_snapshot("Template:Chembox", existing.clone())
            .await;

        assert_eq!(pages[0], existing[0]);
        let ids: Vec<u64> = pages.iter().map(|p| p.page_id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(source.rendered.lock().unwrap().clone(), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_update_keeps_pages_no_longer_listed() {
        let source = source_with_pages(vec![vec![5]]);
        let acquisition = PageAcquisition::new(&source);

        let pages = acquisition
            .update_from_snapshot("Template:Chembox", vec![page(1), page(2)])
            .await;

        let ids: Vec<u64> = pages.iter().map(|p| p.page_id).collect();
        assert_eq!(ids, vec![1, 2, 5]);
    }

    #[tokio::test]
    async fn test_update_twice_is_idempotent() {
        let source = source_with_pages(vec![vec![1, 2], vec![3]]);
        let acquisition = PageAcquisition::new(&source);

        let first = acquisition.update_from_snapshot("Template:Chembox", vec![]).await;
        let second = acquisition
            .update_from_snapshot("Template:Chembox", first.clone())
            .await;

        assert_eq!(first, second);
        assert_eq!(source.rendered.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_skipped() {
        let mut source = source_with_pages(vec![vec![1, 2]]);
        source.pages.remove(&2);
        let acquisition = PageAcquisition::new(&source);

        let pages = acquisition.download_all("Template:Chembox").await;

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_id, 1);
    }

    #[tokio::test]
    async fn test_update_from_missing_store_downloads_everything() {
        let source = source_with_pages(vec![vec![1, 2]]);
        let acquisition = PageAcquisition::new(&source);
        let store = SnapshotStore::new(MemoryStorage::default(), "raw", "parsed", "archived");

        let acquired = acquisition
            .update_from_store("Template:Chembox", &store, "chembox_raw_html.json")
            .await
            .unwrap();

        assert!(!acquired.snapshot_existed);
        assert_eq!(acquired.existing_count, 0);
        assert_eq!(acquired.added(), 2);
    }

    #[tokio::test]
    async fn test_update_from_existing_store_counts_additions() {
        let source = source_with_pages(vec![vec![1, 2, 3]]);
        let acquisition = PageAcquisition::new(&source);
        let store = SnapshotStore::new(MemoryStorage::default(), "raw", "parsed", "archived");
        store
            .save_raw("chembox_raw_html.json", &[page(1)])
            .await
            .unwrap();

        let acquired = acquisition
            .update_from_store("Template:Chembox", &store, "chembox_raw_html.json")
            .await
            .unwrap();

        assert!(acquired.snapshot_existed);
        assert_eq!(acquired.existing_count, 1);
        assert_eq!(acquired.added(), 2);
        assert_eq!(acquired.pages[0], page(1));
    }
}
