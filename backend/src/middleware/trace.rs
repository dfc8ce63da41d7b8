//! Request correlation middleware.
//!
//! Every request runs inside a [`TraceId`] scope. A well-formed inbound
//! `trace-id` header is reused so callers can correlate across services;
//! otherwise a fresh identifier is generated. The identifier is echoed in the
//! response header and attached to a `tracing` span around the handler.

use std::task::{Context, Poll};
use std::time::Instant;

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{Instrument, error, info, info_span};

use crate::domain::{TRACE_ID_HEADER, TraceId};

/// Middleware factory; wrap the app with `.wrap(Trace)`.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use portal::Trace;
///
/// let app = App::new().wrap(Trace);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddleware { service }))
    }
}

/// Service produced by [`Trace`].
pub struct TraceMiddleware<S> {
    service: S,
}

fn inbound_trace_id(req: &ServiceRequest) -> Option<TraceId> {
    req.headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.trim().parse().ok())
}

impl<S, B> Service<ServiceRequest> for TraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = inbound_trace_id(&req).unwrap_or_else(TraceId::generate);
        let span = info_span!(
            "request",
            %trace_id,
            method = %req.method(),
            path = %req.path(),
        );
        let started = Instant::now();
        let fut = span.in_scope(|| self.service.call(req));
        Box::pin(
            TraceId::scope(trace_id, async move {
                let mut res = fut.await?;
                info!(
                    status = res.status().as_u16(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "request completed"
                );
                match HeaderValue::from_str(&trace_id.to_string()) {
                    Ok(value) => {
                        res.response_mut()
                            .headers_mut()
                            .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
                    }
                    Err(error) => error!(%error, "failed to encode trace identifier header"),
                }
                Ok(res)
            })
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;

    async fn echo_trace_id() -> HttpResponse {
        match TraceId::current() {
            Some(id) => HttpResponse::Ok().body(id.to_string()),
            None => HttpResponse::InternalServerError().finish(),
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn handlers_see_the_echoed_trace_id() {
        let app =
            test::init_service(App::new().wrap(Trace).route("/", web::get().to(echo_trace_id)))
                .await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        let header = res
            .headers()
            .get(TRACE_ID_HEADER)
            .expect("trace id header")
            .to_str()
            .expect("ascii header")
            .to_owned();
        let body = test::read_body(res).await;
        assert_eq!(header.as_bytes(), body.as_ref());
    }

    #[rstest]
    #[case::well_formed("6f1c2d3e-4a5b-4c6d-8e7f-901234567890", true)]
    #[case::garbage("not-a-uuid", false)]
    #[actix_web::test]
    async fn inbound_trace_ids_are_reused_when_valid(#[case] inbound: &str, #[case] reused: bool) {
        let app =
            test::init_service(App::new().wrap(Trace).route("/", web::get().to(echo_trace_id)))
                .await;
        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((TRACE_ID_HEADER, inbound))
            .to_request();
        let res = test::call_service(&app, req).await;
        let header = res
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        assert_eq!(header.as_deref() == Some(inbound), reused);
    }

    #[rstest]
    #[actix_web::test]
    async fn errors_raised_in_scope_carry_the_trace_id() {
        let app = test::init_service(App::new().wrap(Trace).route(
            "/",
            web::get().to(|| async {
                Err::<HttpResponse, _>(crate::domain::Error::not_found("missing"))
            }),
        ))
        .await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        let header = res
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .expect("trace id header");
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["traceId"].as_str(), Some(header.as_str()));
    }
}
