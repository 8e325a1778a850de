use crate::error::AppError;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const ACCESS_TOKEN_TTL_HOURS: i64 = 24;
const REFRESH_TOKEN_TTL_DAYS: i64 = 30;

/// Discriminates access tokens from refresh tokens so one can never stand in
/// for the other.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token, the user's unique identifier.
    pub sub: i32,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Whether this is an access or a refresh token.
    pub kind: TokenKind,
}

fn secret() -> Result<String, AppError> {
    std::env::var("JWT_SECRET")
        .map_err(|_| AppError::InternalServerError("JWT_SECRET not set".into()))
}

fn generate(user_id: i32, kind: TokenKind, ttl: chrono::Duration) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let expiration = now
        .checked_add_signed(ttl)
        .expect("valid timestamp")
        .timestamp() as usize;

    let claims = Claims {
        sub: user_id,
        exp: expiration,
        iat: now.timestamp() as usize,
        kind,
    };

    let secret = secret()?;
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
}

/// Generates a short-lived access token for a given user ID.
///
/// The token expires in 24 hours. It requires the `JWT_SECRET` environment
/// variable to be set for signing.
pub fn generate_access_token(user_id: i32) -> Result<String, AppError> {
    generate(
        user_id,
        TokenKind::Access,
        chrono::Duration::hours(ACCESS_TOKEN_TTL_HOURS),
    )
}

/// Generates a long-lived refresh token (30 days) for a given user ID.
pub fn generate_refresh_token(user_id: i32) -> Result<String, AppError> {
    generate(
        user_id,
        TokenKind::Refresh,
        chrono::Duration::days(REFRESH_TOKEN_TTL_DAYS),
    )
}

fn decode_claims(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

/// Verifies an access token and decodes its claims.
///
/// Returns `AppError::Unauthorized` if the token is malformed, its signature
/// is invalid, it has expired, or it is a refresh token presented as an
/// access token.
pub fn verify_access_token(token: &str) -> Result<Claims, AppError> {
    let secret = secret()?;
    let claims = decode_claims(token, &secret)
        .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;
    if claims.kind != TokenKind::Access {
        return Err(AppError::Unauthorized("Invalid token: wrong kind".into()));
    }
    Ok(claims)
}

/// Verifies a refresh token and decodes its claims.
///
/// Expiry and malformation are reported with distinct messages so clients can
/// tell "log in again" apart from "your request is broken".
pub fn verify_refresh_token(token: &str) -> Result<Claims, AppError> {
    let secret = secret()?;
    let claims = decode_claims(token, &secret).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::Unauthorized("Refresh token expired".into()),
        _ => AppError::Unauthorized("Invalid refresh token".into()),
    })?;
    if claims.kind != TokenKind::Refresh {
        return Err(AppError::Unauthorized("Invalid refresh token".into()));
    }
    Ok(claims)
}
