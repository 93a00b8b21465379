use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Lifecycle states of a leave request. `Pending` is the only state that
/// admits a transition; `Approved` and `Rejected` are terminal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sqlx::Type,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = 10)]
    pub branch_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Inclusive day count, fixed at creation time.
    #[schema(example = 3)]
    pub days: i64,
    pub status: LeaveStatus,
    #[schema(example = "family event", nullable = true)]
    pub reason: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub escalated_at: Option<DateTime<Utc>>,
    pub escalation_attempts: i32,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = Option<String>)]
    pub created_at: Option<DateTime<Utc>>,
}
