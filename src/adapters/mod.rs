// Adapters layer: concrete implementations of the domain ports.

pub mod mediawiki;
pub mod storage;

pub use mediawiki::MediaWikiClient;
pub use storage::LocalStorage;
