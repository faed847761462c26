use crate::web::error::HttpError;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest},
    http::Request,
};
use serde::Deserialize;
use validator::Validate;

/// A json body that has passed validation of its raw form.
pub struct Json<J>(pub J);

#[async_trait]
impl<S, B, J> FromRequest<S, B> for Json<J>
where
    B: Send + 'static,
    S: Send + Sync,
    J: FromValidate + 'static,
    axum::Json<<J as FromValidate>::Validatable>: FromRequest<S, B, Rejection = JsonRejection>,
{
    type Rejection = HttpError;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(raw) = axum::Json::<J::Validatable>::from_request(req, state)
            .await
            .map_err(|rejection| HttpError::Unprocessable(rejection.body_text()))?;

        raw.validate()
            .map_err(|errors| HttpError::Validation(Some(errors)))?;

        Ok(Self(J::from(raw)))
    }
}

/// Conversion from a validated raw body, so required fields can be unwrapped safely.
pub trait FromValidate {
    type Validatable: Validate + for<'de> Deserialize<'de>;

    fn from(value: Self::Validatable) -> Self;
}
