use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,

    // Store calls must never block indefinitely
    pub db_acquire_timeout_secs: u64,

    // Escalation sweep
    pub escalation_sla_hours: i64,
    pub escalation_max_attempts: i32,
    pub escalation_sweep_interval_secs: u64,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),

            db_acquire_timeout_secs: env::var("DB_ACQUIRE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap(),

            escalation_sla_hours: env::var("ESCALATION_SLA_HOURS")
                .unwrap_or_else(|_| "48".to_string()) // default 2 days
                .parse()
                .unwrap(),
            escalation_max_attempts: env::var("ESCALATION_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .unwrap(),
            escalation_sweep_interval_secs: env::var("ESCALATION_SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "3600".to_string()) // default hourly
                .parse()
                .unwrap(),

            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),
        }
    }
}
