//! Chart generation for DataLens.
//!
//! Raw points are checked against the chart type's schema, projected into
//! a header-first row table, paired with merged styling options and
//! persisted under `charts/<id>`.

pub mod options;
pub mod schema;
pub mod transformer;

pub use options::{DEFAULT_TITLE, default_options, merge_options};
pub use schema::{ChartType, FieldKind, FieldSpec};
pub use transformer::{ChartDescriptor, ChartTransformer};
