use crate::{
    auth::{
        generate_access_token, generate_refresh_token, hash_password, verify_password,
        verify_refresh_token, AuthResponse, LoginRequest, RefreshRequest, RefreshResponse,
        RegisterRequest,
    },
    error::AppError,
};
use actix_web::{post, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Register a new user
///
/// Creates a new user account and returns access and refresh tokens.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    register_data.validate()?;

    // Check if username or email is already taken
    let existing_user =
        sqlx::query_as::<_, (i32,)>("SELECT id FROM users WHERE email = $1 OR username = $2")
            .bind(&register_data.email)
            .bind(&register_data.username)
            .fetch_optional(&**pool)
            .await?;

    if existing_user.is_some() {
        return Err(AppError::BadRequest(
            "Username or email already registered".into(),
        ));
    }

    // Hash password
    let password_hash = hash_password(&register_data.password)?;

    // Insert new user. The unique constraints are the backstop for races
    // between the existence check and this insert.
    let (user_id,) = sqlx::query_as::<_, (i32,)>(
        "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(&register_data.username)
    .bind(&register_data.email)
    .bind(&password_hash)
    .fetch_one(&**pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::BadRequest("Username or email already registered".into())
        }
        _ => AppError::from(e),
    })?;

    log::info!("Registered new user {}", user_id);

    let token = generate_access_token(user_id)?;
    let refresh_token = generate_refresh_token(user_id)?;

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        refresh_token,
        user_id,
    }))
}

/// Login user
///
/// Authenticates a user and returns access and refresh tokens. Unknown email
/// and wrong password are deliberately indistinguishable.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    login_data.validate()?;

    // Get user from database
    let user =
        sqlx::query_as::<_, (i32, String)>("SELECT id, password_hash FROM users WHERE email = $1")
            .bind(&login_data.email)
            .fetch_optional(&**pool)
            .await?;

    match user {
        Some((user_id, password_hash)) => {
            if verify_password(&login_data.password, &password_hash)? {
                let token = generate_access_token(user_id)?;
                let refresh_token = generate_refresh_token(user_id)?;
                Ok(HttpResponse::Ok().json(AuthResponse {
                    token,
                    refresh_token,
                    user_id,
                }))
            } else {
                Err(AppError::Unauthorized("Invalid credentials".into()))
            }
        }
        None => Err(AppError::Unauthorized("Invalid credentials".into())),
    }
}

/// Refresh access token
///
/// Exchanges a valid refresh token for a new access token. Expired and
/// malformed refresh tokens fail with distinct messages.
#[post("/refresh")]
pub async fn refresh(
    pool: web::Data<PgPool>,
    refresh_data: web::Json<RefreshRequest>,
) -> Result<impl Responder, AppError> {
    refresh_data.validate()?;

    let claims = verify_refresh_token(&refresh_data.refresh_token)?;

    // The account may have been deleted since the refresh token was issued
    let user = sqlx::query_as::<_, (i32,)>("SELECT id FROM users WHERE id = $1")
        .bind(claims.sub)
        .fetch_optional(&**pool)
        .await?;

    if user.is_none() {
        return Err(AppError::Unauthorized("Invalid refresh token".into()));
    }

    let token = generate_access_token(claims.sub)?;

    Ok(HttpResponse::Ok().json(RefreshResponse {
        token,
        user_id: claims.sub,
    }))
}
