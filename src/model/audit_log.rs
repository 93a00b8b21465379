use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

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
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
}

/// Append-only record of one committed mutation. `before_json` / `after_json`
/// hold field-map snapshots with null-valued fields omitted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AuditLog {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "LeaveRequest")]
    pub entity_type: String,
    #[schema(example = 42)]
    pub entity_id: u64,
    pub action: AuditAction,
    #[schema(example = "hr.manager")]
    pub actor_id: String,
    #[schema(example = 10, nullable = true)]
    pub branch_id: Option<u64>,
    #[schema(nullable = true)]
    pub before_json: Option<String>,
    #[schema(nullable = true)]
    pub after_json: Option<String>,
    #[schema(nullable = true)]
    pub trace_id: Option<String>,
    #[schema(nullable = true)]
    pub source_addr: Option<String>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = Option<String>)]
    pub created_at: Option<DateTime<Utc>>,
}
