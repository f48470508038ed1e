use anyhow::{Context, Result};

use super::config_model::{Auth, BackendServer, Database, DotEnvyConfig, Pix};

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{key} is invalid"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: required("SERVER_PORT_BACKEND")?
            .parse()
            .context("SERVER_PORT_BACKEND is not a port number")?,
        body_limit: required("SERVER_BODY_LIMIT")?
            .parse()
            .context("SERVER_BODY_LIMIT is not a number of megabytes")?,
        timeout: required("SERVER_TIMEOUT")?
            .parse()
            .context("SERVER_TIMEOUT is not a number of seconds")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
    };

    let auth = Auth {
        jwt_secret: required("JWT_SECRET")?,
    };

    let pix = Pix {
        pix_key: required("PIX_KEY")?,
        merchant_name: optional("PIX_MERCHANT_NAME", "PIX BILLING"),
        merchant_city: optional("PIX_MERCHANT_CITY", "SAO PAULO"),
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        auth,
        pix,
    })
}
