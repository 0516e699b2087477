//! Packing list parser CLI - parses converted packing list JSON files and
//! prints the parse result for each.

use std::path::Path;

use anyhow::{Context, Result};
use packing_list_parser::config::Settings;
use packing_list_parser::{parse_packing_list, ModelRegistry, Workbook};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "packing_list_parser=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        anyhow::bail!("Usage: packing-list-parser <workbook.json>...");
    }

    let settings = Settings::from_env()?;
    let registry = settings
        .build_registry()
        .context("Failed to load packing list models")?;

    for path in &paths {
        let output = parse_file(Path::new(path), &registry)?;
        println!("{}", output);
    }

    Ok(())
}

/// Parse one workbook file and render the result as pretty JSON.
fn parse_file(path: &Path, registry: &ModelRegistry) -> Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read workbook: {:?}", path))?;
    let workbook = Workbook::from_json_str(&content)
        .with_context(|| format!("Failed to parse workbook: {:?}", path))?;

    info!("Parsing {:?} ({} sheets)", path, workbook.sheets().len());
    let result = parse_packing_list(&workbook, registry);
    info!(
        "{:?}: model {} with {} item(s)",
        path,
        result.parser_model,
        result.items.len()
    );

    Ok(serde_json::to_string_pretty(&result)?)
}
