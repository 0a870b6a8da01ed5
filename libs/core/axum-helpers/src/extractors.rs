//! JSON extractor with automatic validation using the validator crate.

use axum::{
    extract::{FromRequest, Json, Request},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::errors::AppError;

/// JSON extractor that runs `Validate` on the deserialized body.
///
/// Deserialization failures and validation failures both render as the
/// standard [`crate::ErrorResponse`] with status 400, so handlers only ever
/// see payloads that satisfy their declared bounds.
///
/// # Example
/// ```ignore
/// async fn create_product(
///     ValidatedJson(input): ValidatedJson<CreateProduct>,
/// ) -> CatalogResult<Json<Product>> { ... }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::JsonExtractorRejection(e).into_response())?;

        data.validate()
            .map_err(|e| AppError::ValidationError(e).into_response())?;

        Ok(ValidatedJson(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request as HttpRequest, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Validate)]
    struct Payload {
        #[validate(length(min = 3, max = 10))]
        name: String,
    }

    fn app() -> Router {
        async fn handler(ValidatedJson(p): ValidatedJson<Payload>) -> String {
            p.name
        }
        Router::new().route("/", post(handler))
    }

    async fn post_json(body: &str) -> StatusCode {
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_valid_body_passes() {
        assert_eq!(post_json(r#"{"name": "abcd"}"#).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_out_of_bounds_field_rejected() {
        assert_eq!(
            post_json(r#"{"name": "ab"}"#).await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_malformed_json_rejected() {
        let status = post_json("{not json").await;
        assert!(status.is_client_error());
    }
}
