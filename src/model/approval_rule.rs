use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// An approval rule scoped to (entity type, branch, department). Null branch
/// and department means a global rule. Rules are deactivated, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ApprovalRule {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Dhaka branch leave approvals")]
    pub name: String,
    #[schema(example = "LeaveRequest")]
    pub entity_type: String,
    #[schema(example = 10, nullable = true)]
    pub branch_id: Option<u64>,
    #[schema(example = 3, nullable = true)]
    pub department_id: Option<u64>,
    /// Higher wins among rules matching the same scope.
    #[schema(example = 100)]
    pub priority: i32,
    pub is_active: bool,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
pub enum StepType {
    #[default]
    Sequential,
    Parallel,
}

/// One step of a rule's approval chain. Exactly one of `role_id` / `user_id`
/// designates the approver; this is enforced when the rule is created.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ApprovalStep {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1)]
    pub approval_rule_id: u64,
    #[schema(example = 1)]
    pub step_order: i32,
    pub step_type: StepType,
    #[schema(example = 2, nullable = true)]
    pub role_id: Option<u64>,
    #[schema(nullable = true)]
    pub user_id: Option<u64>,
    pub is_required: bool,
}
