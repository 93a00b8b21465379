use crate::context::ActorContext;
use crate::error::ApiError;
use crate::model::leave_request::LeaveRequest;
use crate::service::leave::{self, Decision, NewLeaveRequest};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "family event", nullable = true)]
    pub reason: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 1000)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>, // items per page
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BalanceQuery {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 1)]
    pub leave_type_id: u64,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
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

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Validation failed (unknown employee or leave type, bad date range, no approval rule configured)"),
        (status = 409, description = "Overlapping pending request or insufficient balance"),
        (status = 503, description = "Transient storage failure, retryable")
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    ctx: ActorContext,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> Result<impl Responder, ApiError> {
    let payload = payload.into_inner();
    let created = leave::create(
        pool.get_ref(),
        &ctx,
        NewLeaveRequest {
            employee_id: payload.employee_id,
            leave_type_id: payload.leave_type_id,
            start_date: payload.start_date,
            end_date: payload.end_date,
            reason: payload.reason,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(created))
}

/* =========================
Approve leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved", body = LeaveRequest),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request is not pending"),
        (status = 503, description = "Transient storage failure, retryable")
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    ctx: ActorContext,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let request = leave::decide(pool.get_ref(), &ctx, path.into_inner(), Decision::Approve).await?;
    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Reject leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRequest),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request is not pending"),
        (status = 503, description = "Transient storage failure, retryable")
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    ctx: ActorContext,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let request = leave::decide(pool.get_ref(), &ctx, path.into_inner(), Decision::Reject).await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Remaining balance for one employee and leave type
#[utoipa::path(
    get,
    path = "/api/v1/leave/balance",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Remaining balance", body = Object, example = json!({
            "employee_id": 1000,
            "leave_type_id": 1,
            "balance": 16
        })),
        (status = 404, description = "Leave type not found")
    ),
    tag = "Leave"
)]
pub async fn leave_balance(
    pool: web::Data<MySqlPool>,
    query: web::Query<BalanceQuery>,
) -> Result<impl Responder, ApiError> {
    let balance =
        leave::leave_balance(pool.get_ref(), query.employee_id, query.leave_type_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "employee_id": query.employee_id,
        "leave_type_id": query.leave_type_id,
        "balance": balance,
    })))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 404, description = "Leave request not found")
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let leave_id = path.into_inner();

    let leave: Option<LeaveRequest> = sqlx::query_as(
        r#"
        SELECT id, employee_id, leave_type_id, branch_id, start_date, end_date,
               days, status, reason, escalated_at, escalation_attempts, created_at
        FROM leave_requests
        WHERE id = ?
        "#,
    )
    .bind(leave_id)
    .fetch_optional(pool.get_ref())
    .await?;

    match leave {
        Some(data) => Ok(HttpResponse::Ok().json(data)),
        None => Err(ApiError::NotFound("Leave request not found".into())),
    }
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 503, description = "Transient storage failure, retryable")
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> Result<impl Responder, ApiError> {
    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(emp_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT id, employee_id, leave_type_id, branch_id, start_date, end_date,
               days, status, reason, escalated_at, escalation_attempts, created_at
        FROM leave_requests
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    // -------------------------
    // Response
    // -------------------------
    let response = LeaveListResponse {
        data: leaves,
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}
