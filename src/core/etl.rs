use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Extract, parse and store; returns the parsed snapshot path.
    pub async fn run(&self) -> Result<String> {
        tracing::debug!("Extracting pages...");
        let pages = self.pipeline.extract().await?;
        tracing::info!("Extracted {} pages", pages.len());

        tracing::debug!("Parsing infoboxes...");
        let parsed = self.pipeline.transform(pages).await?;
        let infobox_count: usize = parsed.iter().map(|page| page.infoboxes.len()).sum();
        tracing::info!(
            "Parsed {} infoboxes from {} pages",
            infobox_count,
            parsed.len()
        );

        tracing::debug!("Saving parsed pages...");
        let output_path = self.pipeline.load(parsed).await?;
        tracing::info!("Parsed pages available at {}", output_path);

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PageRecord, ParsedPageRecord};
    use crate::utils::error::InfoboxError;
    use std::sync::Mutex;

    struct MockPipeline {
        calls: Mutex<Vec<&'static str>>,
        fail_load: bool,
    }

    impl MockPipeline {
        fn new(fail_load: bool) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_load,
            }
        }
    }

    #[async_trait::async_trait]
    impl Pipeline for MockPipeline {
        async fn extract(&self) -> Result<Vec<PageRecord>> {
            self.calls.lock().unwrap().push("extract");
            Ok(vec![PageRecord {
                title: "Water".to_string(),
                page_id: 1,
                infobox_html: vec![],
            }])
        }

        async fn transform(&self, pages: Vec<PageRecord>) -> Result<Vec<ParsedPageRecord>> {
            self.calls.lock().unwrap().push("transform");
            Ok(pages
                .into_iter()
                .map(|p| ParsedPageRecord {
                    title: p.title,
                    page_id: p.page_id,
                    infoboxes: vec![],
                })
                .collect())
        }

        async fn load(&self, parsed: Vec<ParsedPageRecord>) -> Result<String> {
            self.calls.lock().unwrap().push("load");
            if self.fail_load {
                return Err(InfoboxError::IoError(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only",
                )));
            }
            Ok(format!("parsed/{}.json", parsed.len()))
        }
    }

    #[tokio::test]
    async fn test_run_executes_stages_in_order() {
        let engine = EtlEngine::new(MockPipeline::new(false));

        let path = engine.run().await.unwrap();

        assert_eq!(path, "parsed/1.json");
        assert_eq!(
            engine.pipeline().calls.lock().unwrap().clone(),
            vec!["extract", "transform", "load"]
        );
    }

    #[tokio::test]
    async fn test_load_failure_is_propagated() {
        let engine = EtlEngine::new(MockPipeline::new(true));

        let err = engine.run().await.unwrap_err();

        assert!(matches!(err, InfoboxError::IoError(_)));
    }
}
