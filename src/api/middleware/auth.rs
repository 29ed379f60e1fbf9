use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Application state shared by all routers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: crate::config::Config,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> PgPool {
        state.pool.clone()
    }
}

/// Claims carried by the bearer tokens the identity service signs at login.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    #[serde(default)]
    pub admin: bool,
    /// Expiry, seconds since the epoch
    pub exp: usize,
}

/// Authentication error responses
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    AdminRequired,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "Authentication required. Please log in.",
            )
                .into_response(),
            AuthError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "Invalid or expired token.").into_response()
            }
            AuthError::AdminRequired => {
                (StatusCode::FORBIDDEN, "Admin privileges required.").into_response()
            }
        }
    }
}

/// The authenticated caller, established from the `Authorization: Bearer`
/// header. Handlers and services only ever see the user id, never the raw
/// credential.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub is_admin: bool,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MissingToken)?;

        let key = DecodingKey::from_secret(state.config.jwt_secret.expose_secret().as_bytes());
        let data = decode::<Claims>(token, &key, &Validation::default())
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(AuthenticatedUser {
            user_id: data.claims.sub,
            is_admin: data.claims.admin,
        })
    }
}

/// Extractor gating the admin endpoints on the token's admin claim.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user_id: Uuid,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(AuthError::AdminRequired);
        }

        Ok(AdminUser {
            user_id: user.user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token_for(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn claims_round_trip() {
        let user_id = Uuid::new_v4();
        let claims = Claims {
            sub: user_id,
            admin: true,
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };

        let token = token_for(&claims, "secret");
        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::default(),
        )
        .unwrap();

        assert_eq!(decoded.claims.sub, user_id);
        assert!(decoded.claims.admin);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            admin: false,
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };

        let token = token_for(&claims, "secret");
        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"other-secret"),
            &Validation::default(),
        );

        assert!(result.is_err());
    }

    #[test]
    fn admin_claim_defaults_to_false() {
        let token = token_for(
            &Claims {
                sub: Uuid::new_v4(),
                admin: false,
                exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            },
            "secret",
        );
        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::default(),
        )
        .unwrap();

        assert!(!decoded.claims.admin);
    }
}
