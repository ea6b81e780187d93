//! # DHD Builder
//!
//! Turns the structured output of a scanned directional drilling report into a
//! filled downhole diagram (DHD) workbook:
//!
//! 1. [`report`] reads the extracted JSON (the OCR/LLM extraction itself is external).
//! 2. [`filler`] writes well and component fields into the workbook template.
//! 3. [`mapper`] turns the component table into a top-to-bottom stack order.
//! 4. [`catalog`] and [`stack`] compose one picture of the assembled tool string.
//! 5. [`embed`] anchors that picture on the filled sheet.
//!
//! [`pipeline::convert_report`] runs all of it with an explicit [`pipeline::PipelineConfig`].

pub mod catalog;
pub mod embed;
pub mod error;
pub mod filler;
pub mod mapper;
pub mod pipeline;
pub mod report;
pub mod slug;
pub mod stack;
pub mod xlsx;

pub use catalog::{ImageCatalog, ImageSource};
pub use error::{Error, Result};
pub use pipeline::{ConversionOutput, PipelineConfig, convert_report, convert_report_file};
pub use report::{ComponentRecord, FieldValue, UnitPolicy, WellReport};
pub use stack::{Alignment, StackEntry, StackOptions, compose_stack, save_stack};
