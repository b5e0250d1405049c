use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use gatewarden_access::{PipelineOutcome, RequestHead};

use crate::app::AppState;
use crate::errors::rejection_to_response;

/// Run the request pipeline for every routed request.
///
/// On success the populated `SecurityContext` rides the request extensions
/// so handlers can read the verified identity; on rejection the handler is
/// never invoked.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let head = request_head(&req);

    match state.pipeline.execute(&head) {
        PipelineOutcome::Authorized(context) => {
            req.extensions_mut().insert(context);
            next.run(req).await
        }
        PipelineOutcome::Rejected(rejection) => rejection_to_response(&rejection),
    }
}

fn request_head(req: &Request<Body>) -> RequestHead {
    let head = RequestHead::new(req.method().as_str(), req.uri().path());

    // A non-UTF-8 header value cannot carry a token; treat it as absent.
    match req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        Some(value) => head.with_authorization(value),
        None => head,
    }
}
