//! Request-scoped authorization context.
//!
//! A dedicated middleware resolves the bearer token once per request and
//! stashes an [`AuthContext`] in the request extensions; business logic only
//! ever sees that value and never reads ambient session state. Token issuance
//! and password verification live behind the [`SessionStore`] seam.

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::entities::user::UserRole;
use crate::errors::ServiceError;
use crate::AppState;

/// Authenticated caller data carried through a single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: i64,
    pub role: UserRole,
    pub branch_id: Option<i64>,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }

    pub fn require_admin(&self) -> Result<(), ServiceError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "administrator access required".to_string(),
            ))
        }
    }

    /// Back-office screens are staff-only; customer accounts are rejected.
    pub fn require_staff(&self) -> Result<(), ServiceError> {
        match self.role {
            UserRole::Customer => Err(ServiceError::Forbidden(
                "back-office access required".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Branch the caller's list views are confined to; admins see all
    /// branches.
    pub fn branch_scope(&self) -> Option<i64> {
        match self.role {
            UserRole::Admin => None,
            _ => self.branch_id,
        }
    }
}

/// Client metadata recorded alongside audit entries.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Opaque session lookup. The shipped implementation is in-memory; a
/// production deployment plugs in whatever session backend it already has.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn resolve(&self, token: &str) -> Option<AuthContext>;
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, AuthContext>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, token: impl Into<String>, context: AuthContext) {
        self.sessions.insert(token.into(), context);
    }

    pub fn revoke(&self, token: &str) {
        self.sessions.remove(token);
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn resolve(&self, token: &str) -> Option<AuthContext> {
        self.sessions.get(token).map(|entry| entry.clone())
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolves the caller once per request and injects the [`AuthContext`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| ServiceError::Unauthorized("missing bearer token".to_string()))?
        .to_string();
    let context = state
        .sessions
        .resolve(&token)
        .await
        .ok_or_else(|| ServiceError::Unauthorized("invalid or expired session".to_string()))?;

    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| ServiceError::Unauthorized("missing auth context".to_string()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip_address = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(',').next().unwrap_or(value).trim().to_string());
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Ok(Self {
            ip_address,
            user_agent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seller() -> AuthContext {
        AuthContext {
            user_id: 7,
            role: UserRole::Seller,
            branch_id: Some(2),
        }
    }

    #[test]
    fn admin_sees_all_branches() {
        let admin = AuthContext {
            user_id: 1,
            role: UserRole::Admin,
            branch_id: None,
        };
        assert!(admin.is_admin());
        assert_eq!(admin.branch_scope(), None);
        assert!(admin.require_admin().is_ok());
    }

    #[test]
    fn seller_is_confined_to_their_branch() {
        let ctx = seller();
        assert_eq!(ctx.branch_scope(), Some(2));
        assert!(ctx.require_admin().is_err());
        assert!(ctx.require_staff().is_ok());
    }

    #[test]
    fn customers_are_rejected_from_back_office() {
        let ctx = AuthContext {
            user_id: 3,
            role: UserRole::Customer,
            branch_id: None,
        };
        assert!(ctx.require_staff().is_err());
    }

    #[tokio::test]
    async fn in_memory_store_resolves_inserted_tokens() {
        let store = InMemorySessionStore::new();
        store.insert("tok-1", seller());
        assert!(store.resolve("tok-1").await.is_some());
        assert!(store.resolve("tok-2").await.is_none());
        store.revoke("tok-1");
        assert!(store.resolve("tok-1").await.is_none());
    }
}
