//! Default chart styling and option merging.

use datalens_core::error::{Error, Result};
use serde_json::{Map, Value, json};

use crate::schema::ChartType;

pub const DEFAULT_TITLE: &str = "Data Visualization";

/// Styling shared by every chart type.
fn common_defaults() -> Value {
    json!({
        "legend": { "position": "bottom" },
        "chartArea": { "width": "80%", "height": "70%" },
        "fontSize": 12,
        "colors": ["#4285F4", "#DB4437", "#F4B400", "#0F9D58"],
    })
}

fn type_defaults(chart_type: ChartType) -> Value {
    match chart_type {
        ChartType::Line => json!({
            "curveType": "function",
            "pointSize": 5,
            "lineWidth": 2,
        }),
        ChartType::Bar => json!({
            "bars": "vertical",
            "bar": { "groupWidth": "75%" },
        }),
        ChartType::Pie => json!({
            "pieHole": 0.4,
            "is3D": true,
        }),
        ChartType::Scatter => json!({
            "pointSize": 8,
            "trendlines": { "0": { "type": "linear" } },
        }),
    }
}

/// The full default option set for `chart_type`, without a title.
pub fn default_options(chart_type: ChartType) -> Value {
    let mut options = common_defaults();
    deep_merge(&mut options, &type_defaults(chart_type));
    options
}

/// Overlay `overlay` onto `base`. Objects merge key by key; any other
/// overlay value replaces what is in `base`.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Defaults for `chart_type` with the caller's options laid over them.
///
/// `title` is always set: the caller's string title, or [`DEFAULT_TITLE`].
pub fn merge_options(chart_type: ChartType, caller: Option<&Value>) -> Result<Value> {
    let caller = match caller {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map),
        Some(other) => {
            return Err(Error::InvalidInput(format!(
                "chart options must be an object, got {}",
                json_kind(other)
            )));
        }
    };

    let mut options = default_options(chart_type);
    if let Some(map) = caller {
        deep_merge(&mut options, &Value::Object(map.clone()));
    }

    let title = caller
        .and_then(|m| m.get("title"))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE)
        .to_string();

    if let Value::Object(map) = &mut options {
        map.insert("title".into(), Value::String(title));
    }
    Ok(options)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Convenience for building caller options in code.
pub fn titled(title: &str) -> Value {
    let mut map = Map::new();
    map.insert("title".into(), Value::String(title.into()));
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_include_common_and_type_specific() {
        let pie = default_options(ChartType::Pie);
        assert_eq!(pie["legend"]["position"], "bottom");
        assert_eq!(pie["pieHole"], 0.4);
        assert_eq!(pie["is3D"], true);
        assert!(pie.get("title").is_none());

        let scatter = default_options(ChartType::Scatter);
        assert_eq!(scatter["trendlines"]["0"]["type"], "linear");
        assert_eq!(scatter["pointSize"], 8);
    }

    #[test]
    fn caller_wins_on_collisions() {
        let caller = json!({"fontSize": 16, "title": "Sales"});
        let merged = merge_options(ChartType::Bar, Some(&caller)).unwrap();

        assert_eq!(merged["fontSize"], 16);
        assert_eq!(merged["title"], "Sales");
        assert_eq!(merged["bars"], "vertical");
        assert_eq!(merged["chartArea"]["width"], "80%");
    }

    #[test]
    fn caller_legend_and_title_override_defaults() {
        let caller = json!({"legend": {"position": "top"}, "title": "Q"});

        for chart_type in ChartType::ALL {
            let merged = merge_options(chart_type, Some(&caller)).unwrap();
            assert_eq!(merged["title"], "Q");
            assert_eq!(merged["legend"]["position"], "top");
        }
    }

    #[test]
    fn nested_objects_merge_per_leaf() {
        let caller = json!({"chartArea": {"height": "90%"}, "bar": {"groupWidth": "50%"}});
        let merged = merge_options(ChartType::Bar, Some(&caller)).unwrap();

        assert_eq!(merged["chartArea"]["width"], "80%");
        assert_eq!(merged["chartArea"]["height"], "90%");
        assert_eq!(merged["bar"]["groupWidth"], "50%");
    }

    #[test]
    fn arrays_are_replaced_not_merged() {
        let caller = json!({"colors": ["#000000"]});
        let merged = merge_options(ChartType::Line, Some(&caller)).unwrap();
        assert_eq!(merged["colors"], json!(["#000000"]));
    }

    #[test]
    fn title_defaults_when_missing_or_not_text() {
        let merged = merge_options(ChartType::Line, None).unwrap();
        assert_eq!(merged["title"], DEFAULT_TITLE);

        let merged = merge_options(ChartType::Line, Some(&json!({"title": 42}))).unwrap();
        assert_eq!(merged["title"], DEFAULT_TITLE);

        let merged = merge_options(ChartType::Line, Some(&Value::Null)).unwrap();
        assert_eq!(merged["title"], DEFAULT_TITLE);
    }

    #[test]
    fn non_object_options_rejected() {
        let err = merge_options(ChartType::Pie, Some(&json!([1, 2]))).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref m) if m.contains("an array")));
    }

    #[test]
    fn titled_helper() {
        assert_eq!(titled("Revenue")["title"], "Revenue");
    }
}
