//! Request extractors that fail with the JSON error envelope.

use agrisense_core::AppError;
use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::Deserialize;
use serde::de::{DeserializeOwned, Deserializer};
use tracing::debug;

/// `Json<T>` that rejects malformed bodies with a 400 `AppError`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(error = %rejection, "Rejected request body");
                Err(AppError::InvalidArgument(rejection.body_text()))
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PhoneField {
    Text(String),
    Number(u64),
}

/// Accepts a phone number sent as a JSON string or an unsigned integer.
///
/// Use with `#[serde(default, deserialize_with = "phone_field")]`.
pub fn phone_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<PhoneField>::deserialize(deserializer)?.map(|field| match field {
            PhoneField::Text(text) => text,
            PhoneField::Number(number) => number.to_string(),
        }),
    )
}
