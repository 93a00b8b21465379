use crate::model::approval_rule::{ApprovalRule, ApprovalStep};
use sqlx::{MySql, Transaction};

/// Entity tag used by approval rules governing leave requests.
pub const LEAVE_REQUEST_ENTITY: &str = "LeaveRequest";

/// Resolves the approval chain for one entity in one scope.
///
/// Fetches all active rules for the entity type whose scope is compatible
/// with the given branch/department, picks the single most specific one and
/// returns its steps in order. An empty result means no rule matched.
///
/// Resolution is re-run for every request; rule sets change without
/// versioning the requests that reference them, so nothing here is cached.
pub async fn resolve_steps(
    tx: &mut Transaction<'_, MySql>,
    entity_type: &str,
    branch_id: Option<u64>,
    department_id: Option<u64>,
) -> Result<Vec<ApprovalStep>, sqlx::Error> {
    // A rule matches when each scope column is either unset (broader rule)
    // or equal to the caller's scope. `col = NULL` is never true in SQL, so
    // a caller without a branch only sees branch-agnostic rules.
    let rules: Vec<ApprovalRule> = sqlx::query_as(
        r#"
        SELECT id, name, entity_type, branch_id, department_id, priority, is_active, created_at
        FROM approval_rules
        WHERE entity_type = ?
          AND is_active = 1
          AND (branch_id IS NULL OR branch_id = ?)
          AND (department_id IS NULL OR department_id = ?)
        "#,
    )
    .bind(entity_type)
    .bind(branch_id)
    .bind(department_id)
    .fetch_all(&mut **tx)
    .await?;

    let Some(rule) = select_rule(&rules) else {
        return Ok(Vec::new());
    };

    sqlx::query_as(
        r#"
        SELECT id, approval_rule_id, step_order, step_type, role_id, user_id, is_required
        FROM approval_steps
        WHERE approval_rule_id = ?
        ORDER BY step_order ASC
        "#,
    )
    .bind(rule.id)
    .fetch_all(&mut **tx)
    .await
}

/// Picks the single winning rule from the compatible candidates:
/// priority descending, then branch-specific over branch-agnostic, then
/// department-specific over department-agnostic, with the rule id as the
/// final tie-break so repeated calls are deterministic.
pub fn select_rule(rules: &[ApprovalRule]) -> Option<&ApprovalRule> {
    let mut candidates: Vec<&ApprovalRule> = rules.iter().collect();
    candidates.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(b.branch_id.is_some().cmp(&a.branch_id.is_some()))
            .then(b.department_id.is_some().cmp(&a.department_id.is_some()))
            .then(a.id.cmp(&b.id))
    });
    candidates.first().copied()
}

#[cfg(test)]
mod tests {
    use super::select_rule;
    use crate::model::approval_rule::ApprovalRule;

    fn rule(
        id: u64,
        priority: i32,
        branch_id: Option<u64>,
        department_id: Option<u64>,
    ) -> ApprovalRule {
        ApprovalRule {
            id,
            name: format!("rule-{id}"),
            entity_type: "LeaveRequest".into(),
            branch_id,
            department_id,
            priority,
            is_active: true,
            created_at: None,
        }
    }

    #[test]
    fn empty_candidate_set_selects_nothing() {
        assert!(select_rule(&[]).is_none());
    }

    #[test]
    fn highest_priority_wins() {
        let rules = [rule(1, 10, None, None), rule(2, 100, None, None)];
        assert_eq!(select_rule(&rules).unwrap().id, 2);
    }

    #[test]
    fn branch_specific_beats_global_on_equal_priority() {
        let rules = [
            rule(1, 50, None, None),
            rule(2, 50, Some(10), None),
            rule(3, 50, None, Some(3)),
        ];
        assert_eq!(select_rule(&rules).unwrap().id, 2);
    }

    #[test]
    fn department_specific_breaks_branch_tie() {
        let rules = [rule(1, 50, Some(10), None), rule(2, 50, Some(10), Some(3))];
        assert_eq!(select_rule(&rules).unwrap().id, 2);
    }

    #[test]
    fn priority_outranks_specificity() {
        let rules = [rule(1, 90, None, None), rule(2, 50, Some(10), Some(3))];
        assert_eq!(select_rule(&rules).unwrap().id, 1);
    }

    #[test]
    fn full_tie_resolves_by_lowest_id() {
        let rules = [
            rule(7, 50, Some(10), Some(3)),
            rule(3, 50, Some(10), Some(3)),
            rule(5, 50, Some(10), Some(3)),
        ];
        assert_eq!(select_rule(&rules).unwrap().id, 3);
        // Repeated calls with the same input stay deterministic.
        assert_eq!(select_rule(&rules).unwrap().id, 3);
    }
}
