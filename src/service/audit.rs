use crate::context::ActorContext;
use crate::model::audit_log::AuditAction;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{MySql, Transaction};

/// Serializes an entity into an audit snapshot: a field-name-to-value map
/// with null-valued fields omitted entirely, at every nesting level.
pub fn snapshot<T: Serialize>(entity: &T) -> Value {
    match serde_json::to_value(entity) {
        Ok(value) => strip_nulls(value),
        Err(_) => Value::Object(Map::new()),
    }
}

fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

/// Appends one audit row describing a single entity mutation.
///
/// Must be called on the same transaction as the mutation it describes:
/// the row commits or rolls back together with the change, so a mutation
/// is never observable without its audit record (or vice versa).
pub async fn record(
    tx: &mut Transaction<'_, MySql>,
    ctx: &ActorContext,
    entity_type: &str,
    entity_id: u64,
    action: AuditAction,
    before: Option<&Value>,
    after: Option<&Value>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs
            (entity_type, entity_id, action, actor_id, branch_id,
             before_json, after_json, trace_id, source_addr)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entity_type)
    .bind(entity_id)
    .bind(action)
    .bind(&ctx.actor_id)
    .bind(ctx.branch_id)
    .bind(before.map(Value::to_string))
    .bind(after.map(Value::to_string))
    .bind(&ctx.trace_id)
    .bind(&ctx.source_addr)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::snapshot;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Sample {
        id: u64,
        status: String,
        reason: Option<String>,
        escalated_at: Option<String>,
    }

    #[test]
    fn snapshot_omits_null_fields() {
        let value = snapshot(&Sample {
            id: 7,
            status: "pending".into(),
            reason: None,
            escalated_at: None,
        });

        let obj = value.as_object().unwrap();
        assert_eq!(obj["id"], 7);
        assert_eq!(obj["status"], "pending");
        assert!(!obj.contains_key("reason"));
        assert!(!obj.contains_key("escalated_at"));
    }

    #[test]
    fn snapshot_strips_nulls_in_nested_values() {
        #[derive(Serialize)]
        struct Wrapper {
            inner: Sample,
            items: Vec<Sample>,
        }

        let sample = || Sample {
            id: 7,
            status: "pending".into(),
            reason: None,
            escalated_at: None,
        };
        let value = snapshot(&Wrapper {
            inner: sample(),
            items: vec![sample()],
        });

        let inner = value["inner"].as_object().unwrap();
        assert!(!inner.contains_key("reason"));
        let item = value["items"][0].as_object().unwrap();
        assert!(!item.contains_key("escalated_at"));
    }

    #[test]
    fn snapshot_keeps_present_optionals() {
        let value = snapshot(&Sample {
            id: 7,
            status: "pending".into(),
            reason: Some("family event".into()),
            escalated_at: None,
        });

        assert_eq!(value.as_object().unwrap()["reason"], "family event");
    }
}
