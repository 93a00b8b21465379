pub mod approval;
pub mod audit;
pub mod escalation;
pub mod leave;
pub mod notify;
