//! Test Prediction Client
//!
//! Sends sample customer records to the classification service over NATS
//! request/reply and logs each reply.

use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Customer record matching the service's expected format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CustomerRecord {
    age: u32,
    gender: String,
    country: String,
    avg_order_value: f64,
    total_orders: u32,
    last_purchase: NaiveDate,
    preferred_category: String,
    email_open_rate: f64,
    loyalty_score: i32,
    churn_risk: f64,
}

/// The three reference customers: fraud, loyal, normal
fn reference_samples() -> Vec<(&'static str, CustomerRecord)> {
    let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
    vec![
        (
            "fraud",
            CustomerRecord {
                age: 45,
                gender: "Male".to_string(),
                country: "Nigeria".to_string(),
                avg_order_value: 320.0,
                total_orders: 3,
                last_purchase: date(2024, 5, 1),
                preferred_category: "Electronics".to_string(),
                email_open_rate: 0.1,
                loyalty_score: 12,
                churn_risk: 0.8,
            },
        ),
        (
            "loyal",
            CustomerRecord {
                age: 34,
                gender: "Female".to_string(),
                country: "USA".to_string(),
                avg_order_value: 120.0,
                total_orders: 25,
                last_purchase: date(2025, 7, 1),
                preferred_category: "Apparel".to_string(),
                email_open_rate: 0.95,
                loyalty_score: 92,
                churn_risk: 0.02,
            },
        ),
        (
            "normal",
            CustomerRecord {
                age: 28,
                gender: "Other".to_string(),
                country: "Canada".to_string(),
                avg_order_value: 75.0,
                total_orders: 10,
                last_purchase: date(2025, 6, 10),
                preferred_category: "Books".to_string(),
                email_open_rate: 0.5,
                loyalty_score: 48,
                churn_risk: 0.3,
            },
        ),
    ]
}

/// Customer generator for testing
struct CustomerGenerator {
    rng: rand::rngs::ThreadRng,
}

impl CustomerGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    fn generate(&mut self) -> CustomerRecord {
        let today = Local::now().date_naive();

        CustomerRecord {
            age: self.rng.gen_range(18..80),
            gender: self.random_choice(&["Female", "Male", "Other"]).to_string(),
            country: self
                .random_choice(&["USA", "Canada", "UK", "Germany", "India", "Nigeria"])
                .to_string(),
            avg_order_value: (self.rng.gen_range(5.0..1500.0_f64) * 100.0).round() / 100.0,
            total_orders: self.rng.gen_range(1..60),
            last_purchase: today - ChronoDuration::days(self.rng.gen_range(0..720)),
            preferred_category: self
                .random_choice(&["Apparel", "Books", "Electronics", "Home", "Sports"])
                .to_string(),
            email_open_rate: self.rng.gen_range(0.0..1.0),
            loyalty_score: self.rng.gen_range(0..=100),
            churn_risk: self.rng.gen_range(0.0..1.0),
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_client=info".parse()?),
        )
        .init();

    info!("Starting Test Prediction Client");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("customers.predict");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(10);
    let delay_ms: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let mut requests: Vec<(String, CustomerRecord)> = reference_samples()
        .into_iter()
        .map(|(name, record)| (name.to_string(), record))
        .collect();
    let mut generator = CustomerGenerator::new();
    for i in 0..count {
        requests.push((format!("random_{}", i + 1), generator.generate()));
    }

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(&requests);
        }
    };

    info!("Sending {} requests...", requests.len());

    for (name, record) in &requests {
        let payload = serde_json::to_vec(record)?;

        match client.request(subject.to_string(), payload.into()).await {
            Ok(message) => {
                let reply: serde_json::Value = serde_json::from_slice(&message.payload)?;
                info!(sample = %name, reply = %reply, "Received reply");
            }
            Err(e) => warn!(sample = %name, error = %e, "Request failed"),
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!("Completed! Sent {} requests", requests.len());

    Ok(())
}

fn run_dry_mode(requests: &[(String, CustomerRecord)]) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    for (name, record) in requests {
        let json = serde_json::to_string_pretty(record)?;
        info!("Sample {}:\n{}", name, json);
    }

    Ok(())
}
