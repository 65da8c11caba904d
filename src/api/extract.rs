use axum::Json;
use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

/// JSON body that has been deserialized and passed its `Validate` rules.
/// Malformed bodies and rule violations both reject with
/// [`AppError::Validation`].
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;

        value
            .validate()
            .map_err(|errors| AppError::Validation(errors.to_string()))?;

        Ok(Self(value))
    }
}

/// `axum::extract::Path` answering malformed segments with the JSON error body.
#[derive(Debug)]
pub struct Path<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for Path<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Path(value) =
            axum::extract::Path::<T>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        Ok(Self(value))
    }
}

/// `axum::extract::Query` answering malformed query strings with the JSON
/// error body.
#[derive(Debug)]
pub struct Query<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for Query<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Query(value) =
            axum::extract::Query::<T>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        Ok(Self(value))
    }
}
