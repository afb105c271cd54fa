pub mod acquisition;
pub mod content;
pub mod embedded_in;
pub mod etl;
pub mod infobox;
pub mod parser;
pub mod pipeline;
pub mod snapshot;

pub use crate::domain::model::{Infobox, PageRecord, ParsedPageRecord, TemplateKind};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage, WikiSource};
pub use crate::utils::error::Result;
