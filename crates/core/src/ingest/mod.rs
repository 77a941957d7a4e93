//! Document ingestion module - source parsers and the normalized filing model.
//!
//! Every parser converts one raw document into zero or one
//! [`NormalizedFiling`]. Failure to parse is signalled by `None` (with a
//! warning logged), never by an error bubbling out of the batch: callers
//! treat the absence of a result as "skip this document".

pub mod custody_xml;
pub mod ingest_errors;
pub mod ingest_model;
pub mod regulator_csv;
pub mod statement_text;

pub use custody_xml::*;
pub use ingest_errors::*;
pub use ingest_model::*;
pub use regulator_csv::*;
pub use statement_text::*;


#[cfg(test)]
mod regulator_csv_tests;
