//! Transport layers that sit inside the HSTS middleware.
//!
//! Responsibility:
//! - X-Request-Id generation + propagation
//! - Access log (TraceLayer)
//! - Request body limit (413) and request timeout (408)
//!
//! Every failure in this stack leaves as a response, never as a service
//! error. The HSTS middleware wraps this stack and only ever sees responses.

use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::http::{StatusCode, header::HeaderName};
use tower::timeout::{TimeoutLayer, error::Elapsed};
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub const BODY_LIMIT_DEFAULT: usize = 1024 * 1024;
pub const TIMEOUT_DEFAULT: Duration = Duration::from_secs(30);

/// Limits enforced before a request reaches a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpLimits {
    pub body_limit_bytes: usize,
    pub request_timeout: Duration,
}

impl Default for HttpLimits {
    fn default() -> Self {
        Self {
            body_limit_bytes: BODY_LIMIT_DEFAULT,
            request_timeout: TIMEOUT_DEFAULT,
        }
    }
}

pub fn apply(router: Router, limits: HttpLimits) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let layers = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(error_status))
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(request_id))
        .layer(RequestBodyLimitLayer::new(limits.body_limit_bytes))
        .layer(TimeoutLayer::new(limits.request_timeout))
        .layer(TraceLayer::new_for_http());

    router.layer(layers)
}

async fn error_status(err: BoxError) -> StatusCode {
    if err.is::<Elapsed>() {
        tracing::debug!("request timed out");
        StatusCode::REQUEST_TIMEOUT
    } else {
        tracing::error!(error = %err, "unhandled middleware error");
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, header::CONTENT_LENGTH},
        routing::{get, post},
    };
    use tower::ServiceExt;

    use super::*;

    fn router(limits: HttpLimits) -> Router {
        let router = Router::new()
            .route("/", get(|| async { "ok" }))
            .route("/echo", post(|body: String| async move { body }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            );
        apply(router, limits)
    }

    #[tokio::test]
    async fn generates_request_id() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let res = router(HttpLimits::default()).oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn keeps_caller_request_id() {
        let req = Request::builder()
            .uri("/")
            .header(REQUEST_ID_HEADER, "abc-123")
            .body(Body::empty())
            .unwrap();
        let res = router(HttpLimits::default()).oneshot(req).await.unwrap();

        assert_eq!(res.headers().get(REQUEST_ID_HEADER).unwrap(), "abc-123");
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_with_413() {
        let limits = HttpLimits {
            body_limit_bytes: 4,
            ..HttpLimits::default()
        };
        let req = Request::builder()
            .method("POST")
            .uri("/echo")
            .header(CONTENT_LENGTH, "10")
            .body(Body::from("0123456789"))
            .unwrap();

        let res = router(limits).oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn slow_handler_times_out_with_408() {
        let limits = HttpLimits {
            request_timeout: Duration::from_millis(20),
            ..HttpLimits::default()
        };
        let req = Request::builder().uri("/slow").body(Body::empty()).unwrap();

        let res = router(limits).oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
