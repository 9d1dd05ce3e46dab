//! Bearer-token authentication seam.
//!
//! Identity itself lives outside this system; the server only consumes
//! opaque bearer credentials. [`TokenValidator`] resolves a token to the
//! acting user, and handlers gate actions on the closed capability set
//! from the report taxonomy rather than comparing role names. A failed
//! validation is distinct from a missing record: 401, never 404.

use std::collections::HashMap;

use actix_web::HttpRequest;
use waterlog_map_report_models::{Capability, UserRole};

/// An authenticated actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    /// External user id.
    pub user_id: i64,
    /// Granted role.
    pub role: UserRole,
}

/// Authentication and authorization failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization: Bearer` header on a protected call.
    #[error("missing bearer token")]
    MissingToken,

    /// The supplied credential did not resolve; the caller must
    /// re-authenticate.
    #[error("invalid or expired token")]
    InvalidToken,

    /// The credential resolved but lacks the required capability.
    #[error("insufficient permissions")]
    Forbidden,
}

/// Resolves bearer tokens to authenticated users.
pub trait TokenValidator: Send + Sync {
    /// Validates a bearer token.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidToken`] when the token does not resolve.
    fn validate(&self, token: &str) -> Result<AuthUser, AuthError>;
}

/// Token table handed to the server at startup.
///
/// Stands in for the external identity provider: ops mint tokens out of
/// band (or the server mints dev tokens when none are configured) and
/// the table never changes while the server runs.
#[derive(Debug, Default)]
pub struct StaticTokenValidator {
    tokens: HashMap<String, AuthUser>,
}

impl StaticTokenValidator {
    /// Builds a validator from (token, user) pairs.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (String, AuthUser)>) -> Self {
        Self {
            tokens: entries.into_iter().collect(),
        }
    }

    /// Parses `token:user_id:ROLE` triples, skipping malformed entries
    /// with a warning.
    #[must_use]
    pub fn from_entries(raw_entries: &[String]) -> Self {
        let mut tokens = HashMap::new();

        for raw in raw_entries {
            let parts: Vec<&str> = raw.split(':').collect();
            let parsed = match parts.as_slice() {
                [token, user_id, role] => user_id
                    .parse::<i64>()
                    .ok()
                    .zip(role.parse::<UserRole>().ok())
                    .map(|(user_id, role)| ((*token).to_string(), AuthUser { user_id, role })),
                _ => None,
            };

            match parsed {
                Some((token, user)) => {
                    tokens.insert(token, user);
                }
                None => log::warn!("Skipping malformed auth token entry: {raw}"),
            }
        }

        Self { tokens }
    }

    /// Number of registered tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` when no tokens are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl TokenValidator for StaticTokenValidator {
    fn validate(&self, token: &str) -> Result<AuthUser, AuthError> {
        self.tokens
            .get(token)
            .copied()
            .ok_or(AuthError::InvalidToken)
    }
}

/// Extracts the bearer token from the `Authorization` header.
///
/// # Errors
///
/// [`AuthError::MissingToken`] when the header is absent or not a
/// bearer credential.
pub fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

/// Authenticates the request and checks the required capability.
///
/// # Errors
///
/// [`AuthError::MissingToken`] / [`AuthError::InvalidToken`] for
/// credential failures, [`AuthError::Forbidden`] when the resolved role
/// lacks the capability.
pub fn require(
    validator: &dyn TokenValidator,
    req: &HttpRequest,
    capability: Capability,
) -> Result<AuthUser, AuthError> {
    let user = validator.validate(bearer_token(req)?)?;
    if user.role.allows(capability) {
        Ok(user)
    } else {
        Err(AuthError::Forbidden)
    }
}
