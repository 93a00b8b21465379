use crate::api::approval_rule::{CreateRule, CreateStep, RuleFilter, RuleWithSteps};
use crate::api::audit_log::{AuditFilter, AuditListResponse};
use crate::api::leave_request::{BalanceQuery, CreateLeave, LeaveFilter, LeaveListResponse};
use crate::model::approval_rule::{ApprovalRule, ApprovalStep, StepType};
use crate::model::audit_log::{AuditAction, AuditLog};
use crate::model::employee::Employee;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::leave_type::LeaveType;
use crate::service::escalation::SweepStats;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Flow API",
        version = "1.0.0",
        description = r#"
## Leave approval and audit service

Approval-rule resolution and the leave-request lifecycle, with a
transactional audit trail.

### 🔹 Key Features
- **Leave Management**
  - Apply for leave, approve/reject requests, check remaining balance
- **Approval Rules**
  - Scoped rules (branch × department → branch → department → global) with ordered step chains
- **Audit Trail**
  - Every committed mutation captured with before/after snapshots, same transaction
- **Escalation**
  - Idempotent sweep flagging requests stuck past the approval SLA

Actor identity arrives from the upstream gateway via `x-actor-id`,
`x-branch-id` and `x-request-id` headers.
"#
    ),
    paths(
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::leave_balance,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::leave_list,
        crate::api::approval_rule::create_rule,
        crate::api::approval_rule::deactivate_rule,
        crate::api::approval_rule::list_rules,
        crate::api::audit_log::audit_list,
        crate::api::jobs::trigger_escalation_sweep,
    ),
    components(schemas(
        LeaveRequest,
        LeaveStatus,
        LeaveType,
        Employee,
        ApprovalRule,
        ApprovalStep,
        StepType,
        AuditLog,
        AuditAction,
        CreateLeave,
        LeaveFilter,
        BalanceQuery,
        LeaveListResponse,
        CreateRule,
        CreateStep,
        RuleFilter,
        RuleWithSteps,
        AuditFilter,
        AuditListResponse,
        SweepStats,
    )),
    tags(
        (name = "Leave", description = "Leave request lifecycle"),
        (name = "Approval rules", description = "Scoped approval rule administration"),
        (name = "Audit", description = "Append-only audit trail"),
        (name = "Jobs", description = "Scheduler entry points")
    )
)]
pub struct ApiDoc;
