//! `datalens chart`: Build a chart from a JSON file or a stored dataset.

use std::path::{Path, PathBuf};

use clap::Args;
use datalens_charts::{ChartTransformer, ChartType};
use serde_json::Value;

use super::{CommandResult, load_config, open_store};

#[derive(Args, Debug)]
pub struct ChartArgs {
    /// Chart type: line, bar, pie or scatter
    #[arg(short = 't', long = "type")]
    pub chart_type: String,

    /// JSON file holding an array of data points
    #[arg(short, long, conflicts_with = "dataset", required_unless_present = "dataset")]
    pub input: Option<PathBuf>,

    /// Id of a stored dataset to chart
    #[arg(short, long)]
    pub dataset: Option<String>,

    /// Chart title (file input only; dataset charts are titled after the dataset)
    #[arg(long, conflicts_with = "dataset")]
    pub title: Option<String>,

    /// Extra chart options as a JSON object (file input only)
    #[arg(long, conflicts_with = "dataset")]
    pub options: Option<String>,
}

pub async fn run(config_path: Option<&Path>, args: ChartArgs) -> CommandResult {
    let chart_type: ChartType = args.chart_type.parse()?;
    let config = load_config(config_path)?;
    let transformer = ChartTransformer::new(open_store(&config));

    let chart = match (&args.input, &args.dataset) {
        (Some(path), _) => {
            let raw_data = read_json(path)?;
            let options = caller_options(args.options.as_deref(), args.title.as_deref())?;
            transformer
                .generate(&raw_data, chart_type, options.as_ref())
                .await?
        }
        (None, Some(dataset)) => {
            transformer
                .generate_from_dataset(dataset, chart_type)
                .await?
        }
        (None, None) => return Err("either --input or --dataset is required".into()),
    };

    println!("{}", serde_json::to_string_pretty(&chart)?);
    Ok(())
}

fn read_json(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let value = serde_json::from_str(&content)
        .map_err(|e| format!("{} is not valid JSON: {e}", path.display()))?;
    Ok(value)
}

/// Combine `--options` and `--title`; the flag title wins.
fn caller_options(
    options: Option<&str>,
    title: Option<&str>,
) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let mut value = match options {
        Some(raw) => Some(
            serde_json::from_str::<Value>(raw).map_err(|e| format!("--options is not valid JSON: {e}"))?,
        ),
        None => None,
    };

    if let Some(title) = title {
        let object = value.get_or_insert_with(|| Value::Object(Default::default()));
        match object.as_object_mut() {
            Some(map) => {
                map.insert("title".into(), Value::String(title.into()));
            }
            None => return Err("--options must be a JSON object".into()),
        }
    }

    Ok(value)
}
