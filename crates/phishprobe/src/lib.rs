//! phishprobe: extract a fixed-schema feature record describing a URL.
//!
//! The pipeline fans a URL out to independent sources (URL structure,
//! domain/DNS/WHOIS, TLS, static HTML, rendered DOM) plus a pure statistical
//! engine, merges their partial results into one [`schema::FeatureRecord`],
//! substitutes defaults for anything a failed source could not produce, and
//! hands the record to a classifier or to reporting consumers.

pub mod acquisition;
pub mod classifier;
pub mod config;
pub mod derivation;
pub mod error;
pub mod pipeline;
pub mod pool;
pub mod renderer;
pub mod report;
pub mod schema;
pub mod sources;
pub mod urlparts;

pub use config::ProbeConfig;
pub use error::ProbeError;
pub use pipeline::{Pipeline, ScanContext, ScanReport};
pub use schema::{Feature, FeatureRecord, FeatureValue};
