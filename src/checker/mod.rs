mod ossindex;

pub use ossindex::OssIndexClient;

use crate::assembler::AuditConfig;
use crate::model::Coordinate;
use anyhow::Result;
use async_trait::async_trait;

/// Request/response boundary to a vulnerability database.
#[async_trait]
pub trait VulnerabilityLookup: Send + Sync {
    fn name(&self) -> &'static str;

    /// Looks up every purl and returns one coordinate per purl, in the
    /// order they were submitted.
    async fn lookup(&self, purls: &[String], config: &AuditConfig) -> Result<Vec<Coordinate>>;
}
