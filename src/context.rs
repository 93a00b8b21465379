use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use std::future::{Ready, ready};
use uuid::Uuid;

pub const SYSTEM_ACTOR: &str = "System";

/// Identity and origin of the operation being executed, passed explicitly
/// into every audited write. HTTP requests carry it via gateway headers;
/// background jobs use [`ActorContext::system`].
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub actor_id: String,
    pub branch_id: Option<u64>,
    pub trace_id: Option<String>,
    pub source_addr: Option<String>,
}

impl ActorContext {
    /// Context for background execution where no request exists.
    pub fn system() -> Self {
        Self {
            actor_id: SYSTEM_ACTOR.to_string(),
            branch_id: None,
            trace_id: Some(Uuid::new_v4().to_string()),
            source_addr: None,
        }
    }

    fn from_http(req: &HttpRequest) -> Self {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };

        Self {
            actor_id: header("x-actor-id").unwrap_or_else(|| "anonymous".to_string()),
            branch_id: header("x-branch-id").and_then(|v| v.parse().ok()),
            // Propagate the gateway's request id when present so audit rows
            // correlate with upstream logs.
            trace_id: header("x-request-id").or_else(|| Some(Uuid::new_v4().to_string())),
            source_addr: req
                .connection_info()
                .realip_remote_addr()
                .map(str::to_owned),
        }
    }
}

impl FromRequest for ActorContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Self::from_http(req)))
    }
}

#[cfg(test)]
mod tests {
    use super::{ActorContext, SYSTEM_ACTOR};
    use actix_web::test::TestRequest;

    #[test]
    fn system_context_has_no_request_origin() {
        let ctx = ActorContext::system();
        assert_eq!(ctx.actor_id, SYSTEM_ACTOR);
        assert!(ctx.branch_id.is_none());
        assert!(ctx.source_addr.is_none());
        assert!(ctx.trace_id.is_some());
    }

    #[actix_web::test]
    async fn request_context_reads_gateway_headers() {
        let req = TestRequest::default()
            .insert_header(("x-actor-id", "hr.manager"))
            .insert_header(("x-branch-id", "10"))
            .insert_header(("x-request-id", "trace-123"))
            .to_http_request();

        let ctx = ActorContext::from_http(&req);
        assert_eq!(ctx.actor_id, "hr.manager");
        assert_eq!(ctx.branch_id, Some(10));
        assert_eq!(ctx.trace_id.as_deref(), Some("trace-123"));
    }

    #[actix_web::test]
    async fn missing_headers_fall_back_to_anonymous() {
        let req = TestRequest::default().to_http_request();
        let ctx = ActorContext::from_http(&req);
        assert_eq!(ctx.actor_id, "anonymous");
        assert!(ctx.branch_id.is_none());
        assert!(ctx.trace_id.is_some());
    }
}
