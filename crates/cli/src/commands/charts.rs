//! `datalens charts`: Inspect stored charts.

use std::path::Path;

use datalens_charts::ChartTransformer;

use super::{CommandResult, load_config, open_store};

pub async fn list(config_path: Option<&Path>) -> CommandResult {
    let config = load_config(config_path)?;
    let transformer = ChartTransformer::new(open_store(&config));

    let ids = transformer.list().await?;
    if ids.is_empty() {
        println!("No charts stored under {}", config.storage.root.display());
        return Ok(());
    }

    for id in ids {
        match transformer.load(&id).await {
            Ok(chart) => println!(
                "{id}  {:<8} {:>4} rows  {}",
                chart.chart_type().as_str(),
                chart.data_rows().len(),
                chart.title().unwrap_or("")
            ),
            Err(e) => println!("{id}  (unreadable: {e})"),
        }
    }
    Ok(())
}

pub async fn show(config_path: Option<&Path>, id: &str) -> CommandResult {
    let config = load_config(config_path)?;
    let transformer = ChartTransformer::new(open_store(&config));

    let chart = transformer.load(id).await?;
    println!("{}", serde_json::to_string_pretty(&chart)?);
    Ok(())
}
