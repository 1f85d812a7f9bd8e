//! Extractors that reject with [`AppError`] instead of axum's plain-text
//! rejections.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Query string deserialized into `T` and checked with its `validator` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> AppResult<Self> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct TestQuery {
        #[validate(range(min = 1, max = 10, message = "Limit must be between 1 and 10"))]
        limit: u32,
        #[serde(default)]
        verbose: bool,
    }

    async fn extract(uri: &str) -> AppResult<TestQuery> {
        let (mut parts, ()) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        ValidatedQuery::<TestQuery>::from_request_parts(&mut parts, &())
            .await
            .map(|ValidatedQuery(query)| query)
    }

    #[tokio::test]
    async fn test_valid_query() {
        let query = extract("/items?limit=5&verbose=true").await.unwrap();

        assert_eq!(query.limit, 5);
        assert!(query.verbose);
    }

    #[tokio::test]
    async fn test_out_of_range_value() {
        let err = extract("/items?limit=50").await.unwrap_err();

        match err {
            AppError::ValidationErrors { errors } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "limit");
                assert!(errors[0].message.contains("between 1 and 10"));
            }
            other => panic!("Expected ValidationErrors, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_value_is_bad_request() {
        let err = extract("/items?limit=lots").await.unwrap_err();

        assert!(matches!(err, AppError::BadRequest { .. }));
    }
}
