use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use std::time::Duration;

pub async fn init_db(database_url: &str, acquire_timeout_secs: u64) -> MySqlPool {
    MySqlPoolOptions::new()
        // Bounded wait: a saturated pool surfaces as a retryable error
        // instead of hanging the request.
        .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
        .connect(database_url)
        .await
        .expect("Failed to connect to database")
}
