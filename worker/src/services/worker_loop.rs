use crate::{config::config_model::BillingSweep, usecases::expire_billing::ExpireBillingUseCase};
use anyhow::Result;
use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tracing::{error, info};

pub async fn run_worker_loop(usecase: Arc<ExpireBillingUseCase>, config: BillingSweep) -> Result<()> {
    if !config.enabled {
        info!("Billing sweep loop is disabled");
        return std::future::pending::<Result<()>>().await;
    }

    let interval = Duration::from_secs(config.interval_secs);
    info!(interval_secs = config.interval_secs, "Billing sweep loop started");

    loop {
        if let Err(e) = usecase.run(Utc::now()).await {
            error!("Error while expiring lapsed billing records: {}", e);
        }

        tokio::time::sleep(interval).await;
    }
}
