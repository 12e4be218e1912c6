//! Request-Id tagging.
//!
//! Responsibility:
//! - Keep a client supplied `X-Request-ID` when it is present and non-empty.
//! - Otherwise generate a UUID v4.
//! - Store the id in request extensions (`RequestId`) and echo it on the response.
//!
//! Never fails and never short-circuits.

use axum::{
    Router,
    extract::Request,
    http::{Extensions, HeaderName},
    middleware::{self, Next},
    response::Response,
};
use tower::ServiceBuilder;
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn apply<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let header = HeaderName::from_static(REQUEST_ID_HEADER);

    let layers = ServiceBuilder::new()
        // An empty header counts as absent, so the next layer generates one.
        .layer(middleware::from_fn(drop_empty_request_id))
        .layer(SetRequestIdLayer::new(header.clone(), MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(header));

    router.layer(layers)
}

/// The id attached to the request, if the tagger ran.
pub fn request_id(extensions: &Extensions) -> Option<&str> {
    extensions
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
}

async fn drop_empty_request_id(mut req: Request, next: Next) -> Response {
    if req
        .headers()
        .get(REQUEST_ID_HEADER)
        .is_some_and(|value| value.is_empty())
    {
        req.headers_mut().remove(REQUEST_ID_HEADER);
    }
    next.run(req).await
}
