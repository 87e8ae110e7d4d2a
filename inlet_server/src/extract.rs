use crate::error::ApiError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use inlet_core::CustomerId;
use std::future;
use std::str::FromStr;

/// Caller identity: the `x-customer-id` header. Requests without it are
/// unauthenticated.
#[derive(Debug, Clone)]
pub struct CustomerIdHeader(pub CustomerId);

impl<S> FromRequestParts<S> for CustomerIdHeader
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    #[tracing::instrument(level = "debug", name = "extract.customer_id", skip_all)]
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let res = (|| {
            let raw = parts
                .headers
                .get("x-customer-id")
                .ok_or(ApiError::MissingCustomerId)?
                .to_str()
                .map_err(|e| ApiError::InvalidCustomerId(e.to_string()))?;
            let customer_id =
                CustomerId::from_str(raw).map_err(|e| ApiError::InvalidCustomerId(e.to_string()))?;
            Ok(Self(customer_id))
        })();
        future::ready(res)
    }
}
