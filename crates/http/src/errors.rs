use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use gatewarden_access::{Rejection, RejectionClass};

/// Map a pipeline rejection to its outward signal.
///
/// Deliberately coarse: clients learn "log in again" vs "you lack
/// permission", never whether a token was expired, tampered with or absent.
/// The internal kind is already attributed in the engine's logs.
pub fn rejection_to_response(rejection: &Rejection) -> axum::response::Response {
    match rejection.class {
        RejectionClass::Unauthenticated => json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "authentication required",
        ),
        RejectionClass::Forbidden => json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "insufficient permissions",
        ),
        RejectionClass::Internal => {
            tracing::error!(kind = %rejection.kind, "auth pipeline defect");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal error",
            )
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
