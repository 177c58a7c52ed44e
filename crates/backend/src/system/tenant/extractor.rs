use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};

/// Header carrying the caller's tenant (repair shop) id
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Tenant of the current request.
/// Usage in handlers: `async fn handler(TenantContext(tenant_id): TenantContext)`
///
/// Requests without a tenant are rejected with 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| TenantContext(value.to_string()))
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
