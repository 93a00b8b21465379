use crate::context::ActorContext;
use crate::error::ApiError;
use crate::model::approval_rule::{ApprovalRule, ApprovalStep, StepType};
use crate::model::audit_log::AuditAction;
use crate::service::audit;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::collections::HashSet;
use utoipa::{IntoParams, ToSchema};

const AUDIT_ENTITY: &str = "ApprovalRule";

#[derive(Deserialize, ToSchema)]
pub struct CreateRule {
    #[schema(example = "Dhaka branch leave approvals")]
    pub name: String,
    #[schema(example = "LeaveRequest")]
    pub entity_type: String,
    #[schema(example = 10, nullable = true)]
    pub branch_id: Option<u64>,
    #[schema(example = 3, nullable = true)]
    pub department_id: Option<u64>,
    #[schema(example = 100)]
    pub priority: i32,
    pub steps: Vec<CreateStep>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateStep {
    #[schema(example = 1)]
    pub step_order: i32,
    #[serde(default)]
    pub step_type: StepType,
    #[schema(example = 2, nullable = true)]
    pub role_id: Option<u64>,
    #[schema(nullable = true)]
    pub user_id: Option<u64>,
    #[serde(default = "default_required")]
    pub is_required: bool,
}

fn default_required() -> bool {
    true
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct RuleFilter {
    #[schema(example = "LeaveRequest")]
    /// Filter by governed entity type
    pub entity_type: Option<String>,
    /// Include deactivated rules in the listing
    pub include_inactive: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct RuleWithSteps {
    pub rule: ApprovalRule,
    pub steps: Vec<ApprovalStep>,
}

/// Step-list validation applied before a rule is persisted. Steps are
/// immutable once the rule exists, so everything is checked up front:
/// at least one step, unique ordering, and exactly one approver
/// designation (role or user) per step.
fn validate_steps(steps: &[CreateStep]) -> Result<(), String> {
    if steps.is_empty() {
        return Err("At least one approval step is required".into());
    }

    let mut seen = HashSet::new();
    for step in steps {
        if !seen.insert(step.step_order) {
            return Err(format!("Duplicate step_order {}", step.step_order));
        }
        match (step.role_id, step.user_id) {
            (Some(_), Some(_)) => {
                return Err(format!(
                    "Step {} designates both a role and a user; pick one",
                    step.step_order
                ));
            }
            (None, None) => {
                return Err(format!(
                    "Step {} designates neither a role nor a user",
                    step.step_order
                ));
            }
            _ => {}
        }
    }

    Ok(())
}

/* =========================
Create approval rule
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/approval-rules",
    request_body(
        content = CreateRule,
        description = "Approval rule with its ordered step chain",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Rule created", body = RuleWithSteps),
        (status = 400, description = "Invalid step chain"),
        (status = 503, description = "Transient storage failure, retryable")
    ),
    tag = "Approval rules"
)]
pub async fn create_rule(
    ctx: ActorContext,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateRule>,
) -> Result<impl Responder, ApiError> {
    let payload = payload.into_inner();
    validate_steps(&payload.steps).map_err(ApiError::Validation)?;

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO approval_rules (name, entity_type, branch_id, department_id, priority, is_active)
        VALUES (?, ?, ?, ?, ?, 1)
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.entity_type)
    .bind(payload.branch_id)
    .bind(payload.department_id)
    .bind(payload.priority)
    .execute(&mut *tx)
    .await?;

    let rule_id = result.last_insert_id();

    for step in &payload.steps {
        sqlx::query(
            r#"
            INSERT INTO approval_steps
                (approval_rule_id, step_order, step_type, role_id, user_id, is_required)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(rule_id)
        .bind(step.step_order)
        .bind(step.step_type)
        .bind(step.role_id)
        .bind(step.user_id)
        .bind(step.is_required)
        .execute(&mut *tx)
        .await?;
    }

    let rule: ApprovalRule = sqlx::query_as(
        r#"
        SELECT id, name, entity_type, branch_id, department_id, priority, is_active, created_at
        FROM approval_rules
        WHERE id = ?
        "#,
    )
    .bind(rule_id)
    .fetch_one(&mut *tx)
    .await?;

    let steps = fetch_steps(&mut *tx, rule_id).await?;
    let created = RuleWithSteps { rule, steps };

    let after = audit::snapshot(&created);
    audit::record(
        &mut tx,
        &ctx,
        AUDIT_ENTITY,
        rule_id,
        AuditAction::Created,
        None,
        Some(&after),
    )
    .await?;

    tx.commit().await?;

    Ok(HttpResponse::Created().json(created))
}

/* =========================
Deactivate approval rule
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/approval-rules/{rule_id}/deactivate",
    params(
        ("rule_id" = u64, Path, description = "ID of the approval rule to deactivate")
    ),
    responses(
        (status = 200, description = "Rule deactivated", body = ApprovalRule),
        (status = 404, description = "Rule not found"),
        (status = 409, description = "Rule is already inactive"),
        (status = 503, description = "Transient storage failure, retryable")
    ),
    tag = "Approval rules"
)]
pub async fn deactivate_rule(
    ctx: ActorContext,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let rule_id = path.into_inner();
    let mut tx = pool.begin().await?;

    // Rules are never deleted; deactivation is the only retirement path.
    let mut rule: ApprovalRule = sqlx::query_as(
        r#"
        SELECT id, name, entity_type, branch_id, department_id, priority, is_active, created_at
        FROM approval_rules
        WHERE id = ?
        FOR UPDATE
        "#,
    )
    .bind(rule_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::NotFound("Approval rule not found".into()))?;

    if !rule.is_active {
        return Err(ApiError::Conflict("Approval rule is already inactive".into()));
    }

    let before = audit::snapshot(&rule);

    sqlx::query("UPDATE approval_rules SET is_active = 0 WHERE id = ?")
        .bind(rule_id)
        .execute(&mut *tx)
        .await?;

    rule.is_active = false;
    let after = audit::snapshot(&rule);
    audit::record(
        &mut tx,
        &ctx,
        AUDIT_ENTITY,
        rule_id,
        AuditAction::Updated,
        Some(&before),
        Some(&after),
    )
    .await?;

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(rule))
}

/// for listing approval rules with their step chains
#[utoipa::path(
    get,
    path = "/api/v1/approval-rules",
    params(RuleFilter),
    responses(
        (status = 200, description = "Approval rules", body = [RuleWithSteps]),
        (status = 503, description = "Transient storage failure, retryable")
    ),
    tag = "Approval rules"
)]
pub async fn list_rules(
    pool: web::Data<MySqlPool>,
    query: web::Query<RuleFilter>,
) -> Result<impl Responder, ApiError> {
    let mut where_sql = String::from(" WHERE 1=1");
    if query.entity_type.is_some() {
        where_sql.push_str(" AND entity_type = ?");
    }
    if !query.include_inactive.unwrap_or(false) {
        where_sql.push_str(" AND is_active = 1");
    }

    let sql = format!(
        r#"
        SELECT id, name, entity_type, branch_id, department_id, priority, is_active, created_at
        FROM approval_rules
        {}
        ORDER BY priority DESC, id ASC
        "#,
        where_sql
    );

    let mut rules_q = sqlx::query_as::<_, ApprovalRule>(&sql);
    if let Some(entity_type) = query.entity_type.as_deref() {
        rules_q = rules_q.bind(entity_type);
    }

    let rules = rules_q.fetch_all(pool.get_ref()).await?;

    let mut response = Vec::with_capacity(rules.len());
    for rule in rules {
        let steps = fetch_steps(pool.get_ref(), rule.id).await?;
        response.push(RuleWithSteps { rule, steps });
    }

    Ok(HttpResponse::Ok().json(response))
}

async fn fetch_steps<'e, E>(executor: E, rule_id: u64) -> Result<Vec<ApprovalStep>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::MySql>,
{
    sqlx::query_as(
        r#"
        SELECT id, approval_rule_id, step_order, step_type, role_id, user_id, is_required
        FROM approval_steps
        WHERE approval_rule_id = ?
        ORDER BY step_order ASC
        "#,
    )
    .bind(rule_id)
    .fetch_all(executor)
    .await
}

#[cfg(test)]
mod tests {
    use super::{CreateStep, validate_steps};
    use crate::model::approval_rule::StepType;

    fn step(step_order: i32, role_id: Option<u64>, user_id: Option<u64>) -> CreateStep {
        CreateStep {
            step_order,
            step_type: StepType::Sequential,
            role_id,
            user_id,
            is_required: true,
        }
    }

    #[test]
    fn empty_chain_is_rejected() {
        assert!(validate_steps(&[]).is_err());
    }

    #[test]
    fn valid_chain_passes() {
        let steps = [step(1, Some(2), None), step(2, None, Some(99))];
        assert!(validate_steps(&steps).is_ok());
    }

    #[test]
    fn duplicate_step_order_is_rejected() {
        let steps = [step(1, Some(2), None), step(1, Some(3), None)];
        assert!(validate_steps(&steps).unwrap_err().contains("step_order"));
    }

    #[test]
    fn each_step_needs_exactly_one_approver_designation() {
        let both = [step(1, Some(2), Some(99))];
        assert!(validate_steps(&both).is_err());

        let neither = [step(1, None, None)];
        assert!(validate_steps(&neither).is_err());
    }
}
