use crate::error::ApiError;
use crate::service::escalation::{self, EscalationConfig, SweepStats};
use actix_web::{HttpResponse, Responder, web};
use sqlx::MySqlPool;

/// Entry point for an external scheduler. One sweep pass; idempotent, so
/// overlapping invocations are harmless.
#[utoipa::path(
    post,
    path = "/api/v1/jobs/escalation-sweep",
    responses(
        (status = 200, description = "Sweep completed", body = SweepStats),
        (status = 503, description = "Sweep scan failed, retryable")
    ),
    tag = "Jobs"
)]
pub async fn trigger_escalation_sweep(
    pool: web::Data<MySqlPool>,
    cfg: web::Data<EscalationConfig>,
) -> Result<impl Responder, ApiError> {
    let stats = escalation::run_sweep(pool.get_ref(), cfg.get_ref()).await?;
    Ok(HttpResponse::Ok().json(stats))
}
