//! Customer Classification Service - Main Entry Point
//!
//! Receives customer records over NATS request/reply, classifies them, records
//! each prediction in the history file and replies with the result.

use anyhow::Result;
use customer_classifier::{
    config::AppConfig,
    consumer::RequestConsumer,
    metrics::{MetricsReporter, ServiceMetrics},
    producer::ReplyPublisher,
    service::PredictionService,
};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(
        format!("customer_classifier={}", config.logging.level).parse()?,
    );

    match config.logging.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };

    init_logging(&config)?;
    info!("Starting Customer Classification Service");
    info!(
        classifier = ?config.model.kind,
        history = %config.history.path.display(),
        "Configuration loaded successfully"
    );

    let metrics = Arc::new(ServiceMetrics::new());

    // Load the classifier once; shared read-only for the process lifetime
    let service = Arc::new(PredictionService::from_config(&config, metrics.clone())?);
    info!(
        classifier = %service.engine().classifier_name(),
        "Prediction service initialized"
    );

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = RequestConsumer::new(
        client.clone(),
        &config.nats.request_subject,
        config.nats.queue_group.clone(),
    );
    let publisher = ReplyPublisher::new(client.clone());

    let num_workers = config.pipeline.workers.max(1);
    info!(
        "Starting request loop with {} parallel workers on subject {}",
        num_workers,
        consumer.subject()
    );

    // Semaphore to limit concurrent processing
    let semaphore = Arc::new(Semaphore::new(num_workers));

    let reporter = MetricsReporter::new(metrics.clone(), config.pipeline.metrics_interval_secs);
    tokio::spawn(reporter.start());

    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        let permit = semaphore.clone().acquire_owned().await?;

        let service = service.clone();
        let publisher = publisher.clone();

        tokio::spawn(async move {
            let payload = message.payload;

            // Classifier call and history rewrite are blocking
            let reply = match tokio::task::spawn_blocking(move || service.handle_payload(&payload)).await {
                Ok(reply) => reply,
                Err(e) => {
                    error!(error = %e, "Request worker panicked");
                    drop(permit);
                    return;
                }
            };

            match message.reply {
                Some(reply_to) => {
                    if let Err(e) = publisher.publish(reply_to, &reply).await {
                        error!(error = %e, "Failed to publish reply");
                    }
                }
                None => warn!("Request had no reply subject, result not returned"),
            }

            drop(permit);
        });
    }

    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}
