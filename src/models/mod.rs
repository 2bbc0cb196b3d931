//! Core data models for corpus queries and their results.

mod citation;
mod query;
mod result;

pub use citation::SourceCitation;
pub use query::{ParamValue, Query, QueryError, Subcorpus, PAGE_PARAM};
pub use result::ResultEntry;
