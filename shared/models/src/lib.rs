//! # Specsheet Core Domain Models
//!
//! Core domain models for the datasheet comparison system. All models
//! serialize with serde; numeric rules (confidence ranges) are enforced
//! with the validator crate.
//!
//! ## Key models
//!
//! - **DatasheetRecord**: one ingested supplier PDF with its reconciled payload
//! - **PartVariant**: one part number belonging to a datasheet
//! - **Parameter**: a named, unit-qualified value with confidence and source
//! - **ParameterKind**: the closed field vocabulary with per-kind parsers
//! - **FieldObservation**: per-method, per-field outcome (found or absent)
//! - **QueryRecord**: append-only audit trail of answered questions

pub mod datasheet;
pub mod extraction;
pub mod parameter;
pub mod query;

#[cfg(test)]
mod property_tests;

pub use datasheet::{DatasheetRecord, PartVariant, ProcessingStatus};
pub use extraction::{
    DatasheetExtraction, ExtractionMetadata, ExtractionStats, FieldObservation, FieldOutcome,
    VariantExtraction,
};
pub use parameter::{
    ExtractionSource, Parameter, ParameterCategory, ParameterKind, ParameterValue,
};
pub use query::QueryRecord;
