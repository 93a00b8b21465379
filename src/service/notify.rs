use crate::model::approval_rule::ApprovalStep;
use crate::model::leave_request::LeaveRequest;

// Notification delivery is owned by an external relay that tails these
// structured events. Emission is best-effort and must never fail or roll
// back the state transition it follows.

pub fn leave_submitted(request: &LeaveRequest, steps: &[ApprovalStep]) {
    tracing::info!(
        event = "leave_submitted",
        leave_id = request.id,
        employee_id = request.employee_id,
        approval_steps = steps.len(),
        "Leave request submitted"
    );
}

pub fn leave_decided(request: &LeaveRequest) {
    tracing::info!(
        event = "leave_decided",
        leave_id = request.id,
        employee_id = request.employee_id,
        status = %request.status,
        "Leave request decided"
    );
}

pub fn leave_escalated(leave_id: u64, employee_id: u64) {
    tracing::warn!(
        event = "leave_escalated",
        leave_id,
        employee_id,
        "Leave request breached the approval SLA"
    );
}
