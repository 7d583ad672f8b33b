use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crpt_gateway::config::Config;
use crpt_gateway::document::Document;
use crpt_gateway::http::RegistryClient;
use crpt_gateway::limiter::QuotaGate;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load Config
    let config = Config::load().context("loading configuration")?;

    // Initialize logging
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting registry gateway...");
    info!(
        "Rate limit: {} request(s) per {}. Endpoint: {}",
        config.request_limit, config.time_unit, config.api_url
    );

    let gate = Arc::new(QuotaGate::new(config.request_limit, config.period_unit()?)?);
    let client = RegistryClient::new(&config, gate.clone())?;

    let document = Document {
        participant_inn: "participantInnValue".into(),
        doc_id: Uuid::new_v4().to_string(),
        doc_status: "docStatusValue".into(),
        doc_type: "docTypeValue".into(),
        import_request: true,
        owner_inn: "ownerInnValue".into(),
        producer_inn: "producerInnValue".into(),
        production_date: NaiveDate::from_ymd_opt(2020, 1, 23).context("invalid production date")?,
        production_type: "productionTypeValue".into(),
    };

    match client.create_document(&document, &config.signature).await {
        Ok(response) => info!("Response status code: {}", response.status),
        Err(e) => error!("Document submission failed: {}", e),
    }

    info!("Shutting down...");
    gate.shutdown().await;

    Ok(())
}
