//! Source account retrieval.

mod fetcher;

pub use fetcher::{AccountFetcher, BrokerageApi, SourceAccount};

#[cfg(test)]
pub use fetcher::MockBrokerageApi;
