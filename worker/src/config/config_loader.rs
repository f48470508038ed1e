use super::config_model::{BillingSweep, Database, DotEnvyConfig, WorkerServer};
use anyhow::{Context, Result};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let worker_server = WorkerServer {
        port: std::env::var("SERVER_PORT_WORKER")
            .context("SERVER_PORT_WORKER is invalid")?
            .parse()
            .context("SERVER_PORT_WORKER is not a port number")?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .context("SERVER_BODY_LIMIT is invalid")?
            .parse()
            .context("SERVER_BODY_LIMIT is not a number of megabytes")?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .context("SERVER_TIMEOUT is invalid")?
            .parse()
            .context("SERVER_TIMEOUT is not a number of seconds")?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").context("DATABASE_URL is invalid")?,
    };

    let billing_sweep = BillingSweep {
        enabled: std::env::var("BILLING_SWEEP_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .context("BILLING_SWEEP_ENABLED is invalid")?,
        interval_secs: std::env::var("BILLING_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse::<u64>()
            .context("BILLING_SWEEP_INTERVAL_SECS is invalid")?
            .max(1),
        internal_token: std::env::var("INTERNAL_BILLING_TOKEN").ok().and_then(|v| {
            let trimmed = v.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        }),
    };

    Ok(DotEnvyConfig {
        worker_server,
        database,
        billing_sweep,
    })
}
