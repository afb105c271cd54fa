//! MediaWiki action API client: the `embeddedin` listing and the `parse`
//! content query.
//!
//! API docs:
//! <https://www.mediawiki.org/wiki/API:Embeddedin> and
//! <https://www.mediawiki.org/wiki/API:Parsing_wikitext>

use crate::domain::model::{EmbeddedInBatch, EmbeddingPage, PageRef, RenderedPage};
use crate::domain::ports::{ConfigProvider, WikiSource};
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Largest page size the API permits for anonymous clients.
pub const EMBEDDED_IN_LIMIT: u32 = 500;
/// Article namespace only; excludes user, talk and template pages.
pub const EMBEDDED_IN_NAMESPACE: i64 = 0;

#[derive(Debug, Deserialize)]
struct EmbeddedInResponse {
    #[serde(rename = "continue")]
    continuation: Option<ContinueBlock>,
    query: Option<QueryBlock>,
    error: Option<ApiErrorBlock>,
}

#[derive(Debug, Deserialize)]
struct ContinueBlock {
    eicontinue: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryBlock {
    #[serde(default)]
    embeddedin: Vec<EmbeddedInEntry>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedInEntry {
    pageid: u64,
    #[serde(default)]
    ns: i64,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    parse: Option<ParseBlock>,
    error: Option<ApiErrorBlock>,
}

#[derive(Debug, Deserialize)]
struct ParseBlock {
    title: String,
    pageid: u64,
    text: Option<TextBlock>,
}

#[derive(Debug, Deserialize)]
struct TextBlock {
    #[serde(rename = "*")]
    html: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBlock {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

pub struct MediaWikiClient {
    client: Client,
    endpoint: String,
}

impl MediaWikiClient {
    pub fn new<C: ConfigProvider>(config: &C) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent());
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: config.api_endpoint().to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_json<T: DeserializeOwned>(&self, params: &[(&str, String)]) -> Option<T> {
        tracing::debug!("GET {} {:?}", self.endpoint, params);

        let response = match self.client.get(&self.endpoint).query(params).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Request to {} failed: {}", self.endpoint, e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("API responded with status {}", status);
            return None;
        }

        match response.json::<T>().await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!("Could not decode API response: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl WikiSource for MediaWikiClient {
    async fn embedded_in(
        &self,
        template_title: &str,
        cursor: Option<&str>,
    ) -> Option<EmbeddedInBatch> {
        let mut params = vec![
            ("action", "query".to_string()),
            ("list", "embeddedin".to_string()),
            ("eititle", template_title.to_string()),
            ("eilimit", EMBEDDED_IN_LIMIT.to_string()),
            ("einamespace", EMBEDDED_IN_NAMESPACE.to_string()),
            ("format", "json".to_string()),
        ];
        if let Some(token) = cursor {
            params.push(("eicontinue", token.to_string()));
        }

        let response: EmbeddedInResponse = self.get_json(&params).await?;
        if let Some(error) = response.error {
            tracing::warn!(
                "Embedded-in query for {} failed: {} ({})",
                template_title,
                error.info,
                error.code
            );
            return None;
        }

        let pages = response
            .query
            .map(|query| query.embeddedin)
            .unwrap_or_default()
            .into_iter()
            .map(|entry| EmbeddingPage {
                page_id: entry.pageid,
                namespace: entry.ns,
                title: entry.title,
            })
            .collect();

        Some(EmbeddedInBatch {
            pages,
            continuation: response.continuation.and_then(|c| c.eicontinue),
        })
    }

    async fn render_page(&self, page: &PageRef) -> Option<RenderedPage> {
        let selector = match page {
            PageRef::Id(id) => ("pageid", id.to_string()),
            PageRef::Title(title) => ("page", title.clone()),
        };
        let params = vec![
            ("action", "parse".to_string()),
            selector,
            ("prop", "text".to_string()),
            ("format", "json".to_string()),
        ];

        let response: ParseResponse = self.get_json(&params).await?;
        if let Some(error) = response.error {
            tracing::warn!("Parse query for {} failed: {} ({})", page, error.info, error.code);
            return None;
        }

        let parse = response.parse?;
        let Some(text) = parse.text else {
            tracing::warn!("Parse query for {} returned no text", page);
            return None;
        };

        Some(RenderedPage {
            title: parse.title,
            page_id: parse.pageid,
            html: text.html,
        })
    }
}
