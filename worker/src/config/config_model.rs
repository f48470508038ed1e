#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub worker_server: WorkerServer,
    pub database: Database,
    pub billing_sweep: BillingSweep,
}

#[derive(Debug, Clone)]
pub struct WorkerServer {
    pub port: u16,
    pub timeout: u64,
    pub body_limit: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct BillingSweep {
    pub enabled: bool,
    pub interval_secs: u64,
    /// The internal trigger route answers 503 while this is unset.
    pub internal_token: Option<String>,
}
