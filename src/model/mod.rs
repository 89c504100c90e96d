//! Core data types for dependencies, coordinates, and vulnerabilities.
//!
//! This module contains the fundamental types used throughout depaudit:
//!
//! - [`DependencyRecord`] - A single entry extracted from a manifest
//! - [`Ecosystem`] - The package ecosystem a record belongs to
//! - [`Coordinate`] - The per-package outcome of a vulnerability lookup
//! - [`Vulnerability`] - A vulnerability reported against a coordinate
//! - [`Severity`] - Severity bucket derived from a CVSS score
//!
//! # Example
//!
//! ```
//! use depaudit::model::{Coordinate, DependencyRecord};
//!
//! let record = DependencyRecord::go("github.com/gorilla/websocket", "v1.4.0");
//! let coordinate = Coordinate::new(record.purl());
//!
//! assert!(!coordinate.is_vulnerable());
//! ```

mod coordinate;
mod dependency;

pub use coordinate::*;
pub use dependency::*;
