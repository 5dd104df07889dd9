use async_trait::async_trait;
use polars::prelude::DataFrame;

/// A place business listings come from.
#[async_trait]
pub trait BusinessSource {
    /// One row per listing, deduplicated by listing identifier.
    async fn businesses(&self) -> anyhow::Result<DataFrame>;
}
