use crate::error::ApiError;
use crate::model::audit_log::AuditLog;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AuditFilter {
    #[schema(example = "LeaveRequest")]
    /// Filter by entity type
    pub entity_type: Option<String>,
    #[schema(example = 42)]
    /// Filter by entity ID
    pub entity_id: Option<u64>,
    #[schema(example = "hr.manager")]
    /// Filter by actor
    pub actor_id: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct AuditListResponse {
    pub data: Vec<AuditLog>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

/// Read-only listing of the audit trail. Rows are append-only; there are no
/// mutation endpoints for this table.
#[utoipa::path(
    get,
    path = "/api/v1/audit-logs",
    params(AuditFilter),
    responses(
        (status = 200, description = "Paginated audit trail", body = AuditListResponse),
        (status = 503, description = "Transient storage failure, retryable")
    ),
    tag = "Audit"
)]
pub async fn audit_list(
    pool: web::Data<MySqlPool>,
    query: web::Query<AuditFilter>,
) -> Result<impl Responder, ApiError> {
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(entity_type) = query.entity_type.as_deref() {
        where_sql.push_str(" AND entity_type = ?");
        args.push(FilterValue::Str(entity_type));
    }

    if let Some(entity_id) = query.entity_id {
        where_sql.push_str(" AND entity_id = ?");
        args.push(FilterValue::U64(entity_id));
    }

    if let Some(actor_id) = query.actor_id.as_deref() {
        where_sql.push_str(" AND actor_id = ?");
        args.push(FilterValue::Str(actor_id));
    }

    let count_sql = format!("SELECT COUNT(*) FROM audit_logs{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await?;

    let data_sql = format!(
        r#"
        SELECT id, entity_type, entity_id, action, actor_id, branch_id,
               before_json, after_json, trace_id, source_addr, created_at
        FROM audit_logs
        {}
        ORDER BY id DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, AuditLog>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let logs = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    let response = AuditListResponse {
        data: logs,
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}
