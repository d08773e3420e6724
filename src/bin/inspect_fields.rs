//! Utility to inspect the provider table headers and print how each one
//! resolves to a logical field.

use provider_locator::config::Config;
use provider_locator::directory::{DirectorySource, FIELD_SAMPLE_SIZE};
use provider_locator::field_resolver::LogicalField;

/// Main entry point for the field inspection utility.
///
/// Reads a sample of the directory table and lists every header seen, then
/// the logical fields no header resolved to.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let sample = std::env::args()
        .nth(1)
        .map(|raw| raw.parse::<usize>())
        .transpose()
        .map_err(|_| anyhow::anyhow!("sample size must be a positive integer"))?
        .unwrap_or(FIELD_SAMPLE_SIZE)
        .max(1);

    let directory = DirectorySource::from_config(&config)?;
    let report = directory.inspect_fields(sample).await?;

    println!("Table '{}' ({} row(s) sampled):", report.table, report.sample);
    for field in &report.fields_seen {
        match &field.resolves_to {
            Some(logical) => println!("- {} ({}x) -> {}", field.name, field.count, logical),
            None => println!("- {} ({}x) -> unused", field.name, field.count),
        }
    }

    let missing: Vec<&str> = LogicalField::ALL
        .iter()
        .map(|f| f.as_str())
        .filter(|name| {
            !report
                .fields_seen
                .iter()
                .any(|seen| seen.resolves_to.as_deref() == Some(*name))
        })
        .collect();

    println!();
    if missing.is_empty() {
        println!("Every logical field resolved.");
    } else {
        println!("Unresolved logical fields:");
        for name in missing {
            println!("- {}", name);
        }
    }

    Ok(())
}
