use crate::context::ActorContext;
use crate::error::ApiError;
use crate::model::audit_log::AuditAction;
use crate::model::leave_request::LeaveStatus;
use crate::service::{approval, audit, notify};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::MySqlPool;
use std::future::Future;
use utoipa::ToSchema;

#[derive(Debug, Clone)]
pub struct EscalationConfig {
    /// How long a request may stay pending before it is escalated.
    pub sla_hours: i64,
    /// Upper bound on escalation attempts per request.
    pub max_attempts: i32,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SweepStats {
    pub scanned: usize,
    pub escalated: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EscalationCandidate {
    pub id: u64,
    pub employee_id: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationOutcome {
    Escalated,
    /// The request stopped being eligible between the scan and the lock
    /// (decided meanwhile, or a concurrent sweep got there first).
    Skipped,
}

/// One pass of the escalation sweep. Idempotent: escalated requests carry
/// `escalated_at` and are excluded from later scans, and eligibility is
/// re-checked under a row lock, so a concurrent sweep cannot double-escalate.
///
/// External schedulers call this through a single entry point; the sweep
/// never owns a timer.
pub async fn run_sweep(pool: &MySqlPool, cfg: &EscalationConfig) -> Result<SweepStats, sqlx::Error> {
    let cutoff = Utc::now() - Duration::hours(cfg.sla_hours);
    tracing::info!(%cutoff, "Starting escalation sweep");

    let candidates: Vec<EscalationCandidate> = sqlx::query_as(
        r#"
        SELECT id, employee_id, created_at
        FROM leave_requests
        WHERE status = 'pending'
          AND created_at < ?
          AND escalated_at IS NULL
          AND escalation_attempts < ?
        "#,
    )
    .bind(cutoff)
    .bind(cfg.max_attempts)
    .fetch_all(pool)
    .await?;

    let stats = sweep_candidates(candidates, |candidate| async move {
        match escalate_one(pool, &candidate).await {
            Err(err) => {
                record_attempt(pool, candidate.id).await;
                Err(err)
            }
            ok => ok,
        }
    })
    .await;

    tracing::info!(
        scanned = stats.scanned,
        escalated = stats.escalated,
        skipped = stats.skipped,
        failed = stats.failed,
        "Completed escalation sweep"
    );
    Ok(stats)
}

/// Drives the per-candidate escalation action. Each attempt is independent:
/// a failure is logged and counted, never propagated, so one broken request
/// cannot abort the rest of the sweep.
pub async fn sweep_candidates<F, Fut>(
    candidates: Vec<EscalationCandidate>,
    mut escalate: F,
) -> SweepStats
where
    F: FnMut(EscalationCandidate) -> Fut,
    Fut: Future<Output = Result<EscalationOutcome, ApiError>>,
{
    let mut stats = SweepStats {
        scanned: candidates.len(),
        ..SweepStats::default()
    };

    for candidate in candidates {
        let leave_id = candidate.id;
        match escalate(candidate).await {
            Ok(EscalationOutcome::Escalated) => stats.escalated += 1,
            Ok(EscalationOutcome::Skipped) => stats.skipped += 1,
            Err(err) => {
                tracing::error!(error = %err, leave_id, "Error escalating leave request");
                stats.failed += 1;
            }
        }
    }

    stats
}

/// Flags one request as escalated, with the audit row in the same
/// transaction. Touches only the escalation columns; `status` is never
/// altered here.
async fn escalate_one(
    pool: &MySqlPool,
    candidate: &EscalationCandidate,
) -> Result<EscalationOutcome, ApiError> {
    let ctx = ActorContext::system();
    let mut tx = pool.begin().await?;

    let mut request: crate::model::leave_request::LeaveRequest = match sqlx::query_as(
        r#"
        SELECT id, employee_id, leave_type_id, branch_id, start_date, end_date,
               days, status, reason, escalated_at, escalation_attempts, created_at
        FROM leave_requests
        WHERE id = ?
        FOR UPDATE
        "#,
    )
    .bind(candidate.id)
    .fetch_optional(&mut *tx)
    .await?
    {
        Some(row) => row,
        None => return Ok(EscalationOutcome::Skipped),
    };

    if request.status != LeaveStatus::Pending || request.escalated_at.is_some() {
        return Ok(EscalationOutcome::Skipped);
    }

    let before = audit::snapshot(&request);
    let escalated_at = Utc::now();

    sqlx::query("UPDATE leave_requests SET escalated_at = ? WHERE id = ?")
        .bind(escalated_at)
        .bind(candidate.id)
        .execute(&mut *tx)
        .await?;

    request.escalated_at = Some(escalated_at);
    let after = audit::snapshot(&request);
    audit::record(
        &mut tx,
        &ctx,
        approval::LEAVE_REQUEST_ENTITY,
        candidate.id,
        AuditAction::Updated,
        Some(&before),
        Some(&after),
    )
    .await?;

    tx.commit().await?;

    notify::leave_escalated(candidate.id, candidate.employee_id);
    Ok(EscalationOutcome::Escalated)
}

/// Best-effort bookkeeping after a failed attempt; once the bounded count
/// is reached the scan stops picking the request up.
async fn record_attempt(pool: &MySqlPool, leave_id: u64) {
    let result =
        sqlx::query("UPDATE leave_requests SET escalation_attempts = escalation_attempts + 1 WHERE id = ?")
            .bind(leave_id)
            .execute(pool)
            .await;

    if let Err(err) = result {
        tracing::error!(error = %err, leave_id, "Failed to record escalation attempt");
    }
}

#[cfg(test)]
mod tests {
    use super::{EscalationCandidate, EscalationOutcome, SweepStats, sweep_candidates};
    use crate::error::ApiError;
    use chrono::Utc;

    fn candidate(id: u64) -> EscalationCandidate {
        EscalationCandidate {
            id,
            employee_id: 1000 + id,
            created_at: Utc::now(),
        }
    }

    #[actix_web::test]
    async fn one_failure_does_not_abort_the_rest() {
        let candidates = vec![candidate(1), candidate(2), candidate(3), candidate(4)];

        let stats = sweep_candidates(candidates, |c| async move {
            if c.id == 2 {
                Err(ApiError::Store(sqlx::Error::PoolTimedOut))
            } else {
                Ok(EscalationOutcome::Escalated)
            }
        })
        .await;

        assert_eq!(
            stats,
            SweepStats {
                scanned: 4,
                escalated: 3,
                skipped: 0,
                failed: 1,
            }
        );
    }

    #[actix_web::test]
    async fn ineligible_candidates_are_skipped_not_failed() {
        let candidates = vec![candidate(1), candidate(2)];

        let stats = sweep_candidates(candidates, |c| async move {
            if c.id == 1 {
                Ok(EscalationOutcome::Skipped)
            } else {
                Ok(EscalationOutcome::Escalated)
            }
        })
        .await;

        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.escalated, 1);
        assert_eq!(stats.failed, 0);
    }

    #[actix_web::test]
    async fn empty_scan_is_a_no_op() {
        let stats = sweep_candidates(Vec::new(), |_| async move {
            Ok(EscalationOutcome::Escalated)
        })
        .await;
        assert_eq!(stats, SweepStats::default());
    }
}
