use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveType {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Annual Leave")]
    pub name: String,
    #[schema(example = "ANNUAL")]
    pub code: String,
    /// Entitlement ceiling per leave cycle.
    #[schema(example = 21)]
    pub max_days: i32,
    pub carry_forward: bool,
    pub is_active: bool,
}
