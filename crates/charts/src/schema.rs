//! Chart types and their per-point schemas.
//!
//! | Type    | Fields               | Header             |
//! |---------|----------------------|--------------------|
//! | line    | x (num/str), y, label? | X, Y, Label      |
//! | bar     | category, value      | Category, Value    |
//! | pie     | label, value         | Label, Value       |
//! | scatter | x, y, label?         | X, Y, Label        |

use datalens_core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Bar,
    Pie,
    Scatter,
}

/// What a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    Text,
    NumberOrText,
}

impl FieldKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldKind::Number => value.is_number(),
            FieldKind::Text => value.is_string(),
            FieldKind::NumberOrText => value.is_number() || value.is_string(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            FieldKind::Number => "must be a number",
            FieldKind::Text => "must be a string",
            FieldKind::NumberOrText => "must be a number or a string",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn required(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: true,
    }
}

const OPTIONAL_LABEL: FieldSpec = FieldSpec {
    name: "label",
    kind: FieldKind::Text,
    required: false,
};

const LINE_FIELDS: &[FieldSpec] = &[
    required("x", FieldKind::NumberOrText),
    required("y", FieldKind::Number),
    OPTIONAL_LABEL,
];
const BAR_FIELDS: &[FieldSpec] = &[
    required("category", FieldKind::Text),
    required("value", FieldKind::Number),
];
const PIE_FIELDS: &[FieldSpec] = &[
    required("label", FieldKind::Text),
    required("value", FieldKind::Number),
];
const SCATTER_FIELDS: &[FieldSpec] = &[
    required("x", FieldKind::Number),
    required("y", FieldKind::Number),
    OPTIONAL_LABEL,
];

impl ChartType {
    pub const ALL: [ChartType; 4] = [
        ChartType::Line,
        ChartType::Bar,
        ChartType::Pie,
        ChartType::Scatter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Pie => "pie",
            ChartType::Scatter => "scatter",
        }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            ChartType::Line => LINE_FIELDS,
            ChartType::Bar => BAR_FIELDS,
            ChartType::Pie => PIE_FIELDS,
            ChartType::Scatter => SCATTER_FIELDS,
        }
    }

    /// The header row, one column per field.
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            ChartType::Line | ChartType::Scatter => &["X", "Y", "Label"],
            ChartType::Bar => &["Category", "Value"],
            ChartType::Pie => &["Label", "Value"],
        }
    }

    /// Validate one raw point and project it into a row.
    ///
    /// Missing or null optional fields become `""`.
    pub fn project(&self, index: usize, point: &Value) -> Result<Vec<Value>> {
        let Some(object) = point.as_object() else {
            return Err(Error::InvalidDataPoint {
                index,
                field: "point".into(),
                reason: "must be an object".into(),
            });
        };

        self.fields()
            .iter()
            .map(|spec| match object.get(spec.name) {
                Some(Value::Null) | None if !spec.required => Ok(Value::String(String::new())),
                Some(Value::Null) | None => Err(Error::InvalidDataPoint {
                    index,
                    field: spec.name.into(),
                    reason: "is required".into(),
                }),
                Some(value) if spec.kind.accepts(value) => Ok(value.clone()),
                Some(_) => Err(Error::InvalidDataPoint {
                    index,
                    field: spec.name.into(),
                    reason: spec.kind.describe().into(),
                }),
            })
            .collect()
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ChartType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "unsupported chart type '{s}' (expected line, bar, pie or scatter)"
                ))
            })
    }
}
