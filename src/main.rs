use anyhow::Result;
use rezept_scan::config::ExtractionConfig;
use rezept_scan::extraction::extract_recipe;
use rezept_scan::recognition::TesseractEngine;
use std::env;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Validate the extraction configuration at startup
fn validate_extraction_configuration(config: &ExtractionConfig) -> Result<()> {
    config.validate().map_err(|e| {
        anyhow::anyhow!(
            "Extraction configuration validation failed: {}. Please check your RECIPE_OCR_* environment variables.",
            e
        )
    })?;

    info!("Extraction configuration validated successfully");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = env::args().skip(1);
    let image_path = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: rezept-scan <image-path> [language]"))?;
    let language_override = args.next();

    let mut config = ExtractionConfig::from_env();
    if let Some(language) = language_override {
        config.language = language;
    }

    validate_extraction_configuration(&config)?;

    info!(
        image_path = %image_path,
        language = %config.language,
        "Starting recipe extraction"
    );

    let payload = tokio::fs::read(&image_path)
        .await
        .map_err(|e| anyhow::anyhow!("could not read image file '{}': {}", image_path, e))?;

    let engine = Arc::new(TesseractEngine::from_config(&config));
    let outcome = extract_recipe(&payload, engine, &config).await;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if !outcome.success {
        std::process::exit(1);
    }

    Ok(())
}
