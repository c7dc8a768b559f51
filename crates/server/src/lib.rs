//! Supplier Voice Server
//!
//! HTTP surface for the inquiry-call service: call creation, provider
//! webhooks, call readout, and supplier search.

pub mod http;
pub mod sink;
pub mod state;

pub use http::create_router;
pub use sink::RedirectSink;
pub use state::AppState;

use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Unknown call: {0}")]
    UnknownCall(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Telephony error: {0}")]
    Telephony(#[from] supplier_voice_telephony::TelephonyError),

    #[error("Search error: {0}")]
    Search(#[from] supplier_voice_search::SearchError),

    #[error("Engine error: {0}")]
    Engine(#[from] supplier_voice_engines::EngineError),
}

impl From<ServerError> for axum::http::StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::UnknownCall(_) => axum::http::StatusCode::NOT_FOUND,
            ServerError::InvalidRequest(_) => axum::http::StatusCode::BAD_REQUEST,
            ServerError::Telephony(supplier_voice_telephony::TelephonyError::Rejected {
                ..
            }) => axum::http::StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Telephony(_) => axum::http::StatusCode::BAD_GATEWAY,
            ServerError::Search(supplier_voice_search::SearchError::NotConfigured) => {
                axum::http::StatusCode::SERVICE_UNAVAILABLE
            }
            ServerError::Search(_) => axum::http::StatusCode::BAD_GATEWAY,
            ServerError::Engine(_) => axum::http::StatusCode::BAD_GATEWAY,
        }
    }
}

impl axum::response::IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let message = self.to_string();
        let status = axum::http::StatusCode::from(self);
        (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            StatusCode::from(ServerError::UnknownCall("CA1".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            StatusCode::from(ServerError::InvalidRequest("bad phone".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            StatusCode::from(ServerError::Search(
                supplier_voice_search::SearchError::NotConfigured
            )),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_error_response_carries_status() {
        let response = ServerError::InvalidRequest("phone_number".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ServerError::UnknownCall("CA-gone".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
