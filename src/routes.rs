use crate::{
    api::{approval_rule, audit_log, jobs, leave_request},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let api_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(api_limiter) // rate limiting
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // /leave/balance
                    .service(
                        web::resource("/balance")
                            .route(web::get().to(leave_request::leave_balance)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/approval-rules")
                    // /approval-rules
                    .service(
                        web::resource("")
                            .route(web::get().to(approval_rule::list_rules))
                            .route(web::post().to(approval_rule::create_rule)),
                    )
                    // /approval-rules/{id}/deactivate
                    .service(
                        web::resource("/{id}/deactivate")
                            .route(web::put().to(approval_rule::deactivate_rule)),
                    ),
            )
            .service(
                web::scope("/audit-logs")
                    // /audit-logs (append-only; read endpoints only)
                    .service(web::resource("").route(web::get().to(audit_log::audit_list))),
            )
            .service(
                web::scope("/jobs")
                    // /jobs/escalation-sweep (invoked by the external scheduler)
                    .service(
                        web::resource("/escalation-sweep")
                            .route(web::post().to(jobs::trigger_escalation_sweep)),
                    ),
            ),
    );
}
