use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::errors::AppError;

/// JSON body extractor whose failures are `AppError::BadRequest` naming the
/// offending field, instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|err| AppError::bad_request(err.body_text()))?;

        let deserializer = &mut serde_json::Deserializer::from_slice(&bytes);
        let value = serde_path_to_error::deserialize(deserializer).map_err(|err| {
            let path = err.path().to_string();
            if path == "." {
                AppError::bad_request(format!("invalid JSON body: {}", err.inner()))
            } else {
                AppError::bad_request(format!("invalid field `{}`: {}", path, err.inner()))
            }
        })?;

        Ok(AppJson(value))
    }
}
