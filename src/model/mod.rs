pub mod approval_rule;
pub mod audit_log;
pub mod employee;
pub mod leave_request;
pub mod leave_type;
