use crate::context::ActorContext;
use crate::error::ApiError;
use crate::model::audit_log::AuditAction;
use crate::model::employee::Employee;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::leave_type::LeaveType;
use crate::service::{approval, audit, notify};
use chrono::NaiveDate;
use sqlx::{MySql, MySqlPool};

#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn target_status(self) -> LeaveStatus {
        match self {
            Decision::Approve => LeaveStatus::Approved,
            Decision::Reject => LeaveStatus::Rejected,
        }
    }
}

/// Inclusive day count of a leave span. Fixed at creation, never recomputed.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Two date ranges overlap iff each starts no later than the other ends.
pub fn overlaps(a_start: NaiveDate, a_end: NaiveDate, b_start: NaiveDate, b_end: NaiveDate) -> bool {
    a_start <= b_end && b_start <= a_end
}

/// Remaining entitlement given the type ceiling and the days already
/// consumed by approved requests. Never negative.
pub fn remaining_balance(max_days: i32, used_days: i64) -> i64 {
    (i64::from(max_days) - used_days).max(0)
}

/// Guards the state machine: only `Pending` admits a decision. Terminal
/// states are absorbing, so re-deciding an already-decided request is a
/// conflict, never a silent no-op.
fn ensure_pending(status: LeaveStatus) -> Result<(), ApiError> {
    if status == LeaveStatus::Pending {
        Ok(())
    } else {
        Err(ApiError::Conflict(format!(
            "Leave request is not pending (status: {status})"
        )))
    }
}

/// Creates a leave request in `Pending`, with all checks and the audit row
/// inside one transaction.
///
/// The employee's pending rows are locked (`FOR UPDATE`) before the overlap
/// and balance checks, so two concurrent creates for the same employee
/// serialize and cannot both pass validation against the same snapshot.
pub async fn create(
    pool: &MySqlPool,
    ctx: &ActorContext,
    new: NewLeaveRequest,
) -> Result<LeaveRequest, ApiError> {
    if new.start_date > new.end_date {
        return Err(ApiError::Validation(
            "start_date cannot be after end_date".into(),
        ));
    }

    let mut tx = pool.begin().await?;

    let employee: Employee = sqlx::query_as(
        r#"
        SELECT id, employee_code, first_name, last_name, email,
               branch_id, department_id, status, hire_date
        FROM employees
        WHERE id = ?
        "#,
    )
    .bind(new.employee_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::Validation("Employee not found".into()))?;

    let leave_type: LeaveType = sqlx::query_as(
        r#"
        SELECT id, name, code, max_days, carry_forward, is_active
        FROM leave_types
        WHERE id = ?
        "#,
    )
    .bind(new.leave_type_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::Validation("Leave type not found".into()))?;

    // Lock this employee's pending rows for the rest of the transaction.
    let pending: Vec<(NaiveDate, NaiveDate)> = sqlx::query_as(
        r#"
        SELECT start_date, end_date
        FROM leave_requests
        WHERE employee_id = ? AND status = 'pending'
        FOR UPDATE
        "#,
    )
    .bind(new.employee_id)
    .fetch_all(&mut *tx)
    .await?;

    if pending
        .iter()
        .any(|(start, end)| overlaps(new.start_date, new.end_date, *start, *end))
    {
        return Err(ApiError::Conflict(
            "Overlapping pending leave request exists".into(),
        ));
    }

    let days = inclusive_days(new.start_date, new.end_date);
    let used = used_days(&mut *tx, new.employee_id, new.leave_type_id).await?;
    let balance = remaining_balance(leave_type.max_days, used);
    if days > balance {
        return Err(ApiError::Conflict(format!(
            "Insufficient leave balance. Available: {balance}, Requested: {days}"
        )));
    }

    // Step resolution is informational at this stage (no workflow instance
    // is persisted), but an empty chain means nobody could ever approve the
    // request, which is a configuration fault.
    let steps = approval::resolve_steps(
        &mut tx,
        approval::LEAVE_REQUEST_ENTITY,
        Some(employee.branch_id),
        employee.department_id,
    )
    .await?;
    if steps.is_empty() {
        return Err(ApiError::Validation(
            "No approval rule is configured for leave requests in this scope".into(),
        ));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (employee_id, leave_type_id, branch_id, start_date, end_date, days, status, reason)
        VALUES (?, ?, ?, ?, ?, ?, 'pending', ?)
        "#,
    )
    .bind(new.employee_id)
    .bind(new.leave_type_id)
    .bind(employee.branch_id)
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(days)
    .bind(&new.reason)
    .execute(&mut *tx)
    .await?;

    let id = result.last_insert_id();
    let created = fetch_for_update(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Leave request not found after insert".into()))?;

    let after = audit::snapshot(&created);
    audit::record(
        &mut tx,
        ctx,
        approval::LEAVE_REQUEST_ENTITY,
        id,
        AuditAction::Created,
        None,
        Some(&after),
    )
    .await?;

    tx.commit().await?;

    notify::leave_submitted(&created, &steps);
    Ok(created)
}

/// Applies an approve/reject decision to a pending request.
///
/// The row is locked and its status re-checked inside the transaction, so a
/// second concurrent decision observes the terminal state and fails instead
/// of silently re-applying.
pub async fn decide(
    pool: &MySqlPool,
    ctx: &ActorContext,
    id: u64,
    decision: Decision,
) -> Result<LeaveRequest, ApiError> {
    let mut tx = pool.begin().await?;

    let mut request = fetch_for_update(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Leave request not found".into()))?;

    ensure_pending(request.status)?;

    let before = audit::snapshot(&request);
    let target = decision.target_status();

    sqlx::query("UPDATE leave_requests SET status = ? WHERE id = ?")
        .bind(target)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    request.status = target;
    let after = audit::snapshot(&request);
    audit::record(
        &mut tx,
        ctx,
        approval::LEAVE_REQUEST_ENTITY,
        id,
        AuditAction::Updated,
        Some(&before),
        Some(&after),
    )
    .await?;

    tx.commit().await?;

    // Approved days are consumed implicitly: balance is always derived from
    // approved history, so no counter needs decrementing here.
    notify::leave_decided(&request);
    Ok(request)
}

/// Remaining balance for one employee and leave type, computed fresh from
/// approved history on every call.
pub async fn leave_balance(
    pool: &MySqlPool,
    employee_id: u64,
    leave_type_id: u64,
) -> Result<i64, ApiError> {
    let max_days: i32 = sqlx::query_scalar("SELECT max_days FROM leave_types WHERE id = ?")
        .bind(leave_type_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Leave type not found".into()))?;

    let used = used_days(pool, employee_id, leave_type_id).await?;
    Ok(remaining_balance(max_days, used))
}

async fn used_days<'e, E>(
    executor: E,
    employee_id: u64,
    leave_type_id: u64,
) -> Result<i64, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = MySql>,
{
    sqlx::query_scalar(
        r#"
        SELECT CAST(COALESCE(SUM(days), 0) AS SIGNED)
        FROM leave_requests
        WHERE employee_id = ? AND leave_type_id = ? AND status = 'approved'
        "#,
    )
    .bind(employee_id)
    .bind(leave_type_id)
    .fetch_one(executor)
    .await
}

async fn fetch_for_update(
    tx: &mut sqlx::Transaction<'_, MySql>,
    id: u64,
) -> Result<Option<LeaveRequest>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT id, employee_id, leave_type_id, branch_id, start_date, end_date,
               days, status, reason, escalated_at, escalation_attempts, created_at
        FROM leave_requests
        WHERE id = ?
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
}

#[cfg(test)]
mod tests {
    use super::{ensure_pending, inclusive_days, overlaps, remaining_balance};
    use crate::error::ApiError;
    use crate::model::leave_request::{LeaveRequest, LeaveStatus};
    use crate::service::audit;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn request(status: LeaveStatus) -> LeaveRequest {
        LeaveRequest {
            id: 42,
            employee_id: 1000,
            leave_type_id: 1,
            branch_id: 10,
            start_date: d("2024-01-01"),
            end_date: d("2024-01-03"),
            days: 3,
            status,
            reason: None,
            escalated_at: None,
            escalation_attempts: 0,
            created_at: None,
        }
    }

    #[test]
    fn days_are_inclusive() {
        assert_eq!(inclusive_days(d("2024-01-01"), d("2024-01-03")), 3);
        assert_eq!(inclusive_days(d("2024-01-01"), d("2024-01-01")), 1);
    }

    #[test]
    fn ranges_overlap_iff_each_starts_before_the_other_ends() {
        // Identical, nested, and partially shifted ranges all collide.
        assert!(overlaps(d("2024-01-01"), d("2024-01-05"), d("2024-01-01"), d("2024-01-05")));
        assert!(overlaps(d("2024-01-02"), d("2024-01-03"), d("2024-01-01"), d("2024-01-05")));
        assert!(overlaps(d("2024-01-04"), d("2024-01-08"), d("2024-01-01"), d("2024-01-05")));

        // Sharing a single boundary day still counts (bounds are inclusive).
        assert!(overlaps(d("2024-01-05"), d("2024-01-07"), d("2024-01-01"), d("2024-01-05")));

        // Adjacent but disjoint ranges do not.
        assert!(!overlaps(d("2024-01-06"), d("2024-01-07"), d("2024-01-01"), d("2024-01-05")));
        assert!(!overlaps(d("2024-01-01"), d("2024-01-02"), d("2024-01-03"), d("2024-01-05")));
    }

    #[test]
    fn balance_subtracts_approved_days() {
        assert_eq!(remaining_balance(21, 5), 16);
        assert_eq!(remaining_balance(21, 21), 0);
    }

    #[test]
    fn balance_never_goes_negative() {
        assert_eq!(remaining_balance(21, 30), 0);
        assert_eq!(remaining_balance(0, 0), 0);
    }

    #[test]
    fn only_pending_requests_admit_a_decision() {
        assert!(ensure_pending(LeaveStatus::Pending).is_ok());
    }

    #[test]
    fn deciding_an_approved_request_is_a_state_conflict() {
        let err = ensure_pending(LeaveStatus::Approved).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert!(err.to_string().contains("approved"));
        // Conflicts are final without changed input, not worth retrying.
        assert!(!err.retryable());
    }

    #[test]
    fn deciding_a_rejected_request_is_a_state_conflict() {
        let err = ensure_pending(LeaveStatus::Rejected).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert!(err.to_string().contains("rejected"));
    }

    #[test]
    fn decision_snapshot_pair_captures_the_transition() {
        // Mirrors what `decide` records: the before snapshot while the row
        // is still pending, the after snapshot once the status flips.
        let mut request = request(LeaveStatus::Pending);
        let before = audit::snapshot(&request);
        request.status = LeaveStatus::Approved;
        let after = audit::snapshot(&request);

        assert_eq!(before["status"], "pending");
        assert_eq!(after["status"], "approved");
        assert_eq!(before["id"], after["id"]);
        // Untouched fields carry over unchanged.
        assert_eq!(before["days"], 3);
        assert_eq!(after["days"], 3);
    }

    #[test]
    fn exhausted_balance_rejects_one_more_day() {
        // maxDays=21, 5 approved, then a 16-day request consumes the rest.
        let after_first = remaining_balance(21, 5);
        assert_eq!(after_first, 16);
        let after_second = remaining_balance(21, 5 + 16);
        assert_eq!(after_second, 0);
        let one_more_day = 1i64;
        assert!(one_more_day > after_second);
    }
}
