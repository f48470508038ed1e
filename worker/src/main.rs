use anyhow::Result;
use crates::domain::repositories::{
    pix_payments::PixPaymentRepository, subscriptions::SubscriptionRepository,
};
use crates::infra::db::{
    postgres::postgres_connection,
    repositories::{pix_payments::PixPaymentPostgres, subscriptions::SubscriptionPostgres},
};
use std::sync::Arc;
use tracing::{error, info};
use worker::{
    axum_http, config, services::worker_loop, usecases::expire_billing::ExpireBillingUseCase,
};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = run().await {
        error!("Worker exited with error: {:#}", error);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("worker")?;

    let dotenvy_env = Arc::new(config::config_loader::load()?);
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");

    let db_pool_arc = Arc::new(postgres_pool);

    let payment_repository: Arc<dyn PixPaymentRepository + Send + Sync> =
        Arc::new(PixPaymentPostgres::new(Arc::clone(&db_pool_arc)));
    let subscription_repository: Arc<dyn SubscriptionRepository + Send + Sync> =
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool_arc)));

    let expire_billing_usecase = Arc::new(ExpireBillingUseCase::new(
        payment_repository,
        subscription_repository,
    ));

    let sweep_loop = tokio::spawn(worker_loop::run_worker_loop(
        Arc::clone(&expire_billing_usecase),
        dotenvy_env.billing_sweep.clone(),
    ));

    let server_config = Arc::clone(&dotenvy_env);
    let internal_server = tokio::spawn(async move {
        axum_http::http_serve::start(server_config, expire_billing_usecase).await
    });

    tokio::select! {
        result = sweep_loop => result??,
        result = internal_server => result??,
    };
    Ok(())
}
