use crate::domain::model::{
    EmbeddedInBatch, PageRecord, PageRef, ParsedPageRecord, RenderedPage, TemplateTarget,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn user_agent(&self) -> &str;
    /// `None` means requests may block indefinitely.
    fn request_timeout(&self) -> Option<Duration>;
    fn data_dir(&self) -> &str;
    fn raw_folder(&self) -> &str;
    fn parsed_folder(&self) -> &str;
    fn archive_folder(&self) -> &str;
    fn templates(&self) -> &[TemplateTarget];
}

/// The remote wiki. Failures are reported as `None`: callers treat a failed
/// listing page as the end of the listing and a failed page as absent.
#[async_trait]
pub trait WikiSource: Send + Sync {
    async fn embedded_in(&self, template_title: &str, cursor: Option<&str>)
        -> Option<EmbeddedInBatch>;

    async fn render_page(&self, page: &PageRef) -> Option<RenderedPage>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<PageRecord>>;
    async fn transform(&self, pages: Vec<PageRecord>) -> Result<Vec<ParsedPageRecord>>;
    async fn load(&self, parsed: Vec<ParsedPageRecord>) -> Result<String>;
}
