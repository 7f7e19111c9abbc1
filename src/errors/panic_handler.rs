use std::any::Any;

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};

use super::http_error::ErrorResponseData;

fn handle_panic(production: bool, err: Box<dyn Any + Send + 'static>) -> Response {
    let body = if production {
        ErrorResponseData::new(
            "internal_server_error",
            "Server error",
            serde_json::Value::Null,
        )
    } else {
        let details = if let Some(s) = err.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = err.downcast_ref::<&str>() {
            s.to_string()
        } else {
            "Unknown panic message".to_string()
        };

        ErrorResponseData::new("panic", details, serde_json::Value::Null)
    };

    let body = serde_json::to_string(&body).unwrap_or_default();

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    response
}

/// Converts panics inside handlers into JSON 500 responses. When `production` is true the
/// panic message is replaced with a generic error.
pub fn panic_handler(
    production: bool,
) -> CatchPanicLayer<impl ResponseForPanic<ResponseBody = Body> + Clone> {
    CatchPanicLayer::custom(move |err| handle_panic(production, err))
}

#[cfg(test)]
mod test {
    use axum::{body::Body, http::Request, routing, Router};
    use tower::ServiceExt;

    use super::*;

    async fn panics() -> &'static str {
        panic!("the handler panicked")
    }

    async fn send(production: bool) -> (StatusCode, serde_json::Value) {
        let app = Router::new()
            .route("/panic", routing::get(panics))
            .layer(panic_handler(production));

        let response = app
            .oneshot(Request::get("/panic").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn panic_becomes_json_error() {
        let (status, body) = send(false).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["kind"], "panic");
        assert_eq!(body["error"]["message"], "the handler panicked");
    }

    #[tokio::test]
    async fn production_hides_panic_message() {
        let (status, body) = send(true).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["kind"], "internal_server_error");
        assert_eq!(body["error"]["message"], "Server error");
    }
}
