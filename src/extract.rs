//! JSON body extractor that keeps deserialization failures inside the error
//! taxonomy: a malformed or type-invalid body becomes a 400 with the usual
//! `{"error": ...}` shape instead of axum's plain-text 422.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};

    use crate::auth::dto::LoginRequest;
    use crate::projects::dto::ProjectInput;

    fn json_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn uncoercible_field_maps_to_validation() {
        let req = json_request(r#"{"budget": "lots"}"#);
        let err = Json::<ProjectInput>::from_request(req, &())
            .await
            .expect_err("body should be rejected");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("budget"));
    }

    #[tokio::test]
    async fn missing_required_field_maps_to_validation() {
        let req = json_request(r#"{"username": "alice"}"#);
        let err = Json::<LoginRequest>::from_request(req, &())
            .await
            .expect_err("body should be rejected");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn syntactically_broken_body_maps_to_validation() {
        let req = json_request("{not json");
        let err = Json::<LoginRequest>::from_request(req, &())
            .await
            .expect_err("body should be rejected");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn valid_body_passes_through() {
        let req = json_request(r#"{"username": "alice", "password": "secret"}"#);
        let Json(login) = Json::<LoginRequest>::from_request(req, &())
            .await
            .expect("valid body");
        assert_eq!(login.username, "alice");
        assert_eq!(login.password, "secret");
    }
}
