pub mod assembler;
pub mod audit;
pub mod cache;
pub mod checker;
pub mod cli;
pub mod config;
pub mod entry;
pub mod error;
pub mod exclusion;
pub mod manifest;
pub mod model;
pub mod output;
pub mod router;

pub use assembler::{assemble, AuditConfig, InputSource};
pub use audit::{Auditor, Outcome};
pub use cache::Cache;
pub use checker::{OssIndexClient, VulnerabilityLookup};
pub use config::Config;
pub use entry::Entry;
pub use error::AuditError;
pub use exclusion::ExclusionSet;
pub use model::{Coordinate, DependencyRecord, Vulnerability};
