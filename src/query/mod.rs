//! Query model and interpolation
//!
//! A [`Query`] is decoded from the caller's JSON, then passed through an
//! [`Interpolator`] that resolves time-range macros before execution.

mod interpolate;
mod types;

pub use interpolate::{interpolate_str, Interpolator, MacroInterpolator};
pub use types::{ColumnDef, KeyValue, Query, QuerySource, QueryType, UrlOptions};
