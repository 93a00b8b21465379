pub mod approval_rule;
pub mod audit_log;
pub mod jobs;
pub mod leave_request;
