use crate::{
    auth::AuthenticatedUserId,
    config::UploadConfig,
    error::AppError,
    models::{User, UserUpdate},
};
use actix_multipart::Multipart;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use futures::TryStreamExt;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const USER_COLUMNS: &str = "id, username, email, profile_picture, created_at";

const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Returns the authenticated user's profile.
#[get("/me")]
pub async fn get_profile(
    pool: web::Data<PgPool>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let profile = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = $1",
        USER_COLUMNS
    ))
    .bind(user.0)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(profile))
}

/// Updates the authenticated user's profile with a partial field merge.
///
/// Only `username` and `email` can be changed here; both are optional and
/// absent fields keep their current values. Taking a username or email that
/// belongs to another account fails with 400.
#[put("/me")]
pub async fn update_profile(
    pool: web::Data<PgPool>,
    update_data: web::Json<UserUpdate>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    update_data.validate()?;

    let current = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = $1",
        USER_COLUMNS
    ))
    .bind(user.0)
    .fetch_one(&**pool)
    .await?;

    let username = update_data.username.clone().unwrap_or(current.username);
    let email = update_data.email.clone().unwrap_or(current.email);

    // Reject values already taken by a different account
    let taken = sqlx::query_as::<_, (i32,)>(
        "SELECT id FROM users WHERE (username = $1 OR email = $2) AND id <> $3",
    )
    .bind(&username)
    .bind(&email)
    .bind(user.0)
    .fetch_optional(&**pool)
    .await?;

    if taken.is_some() {
        return Err(AppError::BadRequest(
            "Username or email already registered".into(),
        ));
    }

    let updated = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET username = $1, email = $2 WHERE id = $3 RETURNING {}",
        USER_COLUMNS
    ))
    .bind(&username)
    .bind(&email)
    .bind(user.0)
    .fetch_one(&**pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::BadRequest("Username or email already registered".into())
        }
        _ => AppError::from(e),
    })?;

    Ok(HttpResponse::Ok().json(updated))
}

/// Deletes the authenticated user's account.
///
/// Owned tasks and events are removed by the `ON DELETE CASCADE` foreign
/// keys on their tables.
#[delete("/me")]
pub async fn delete_account(
    pool: web::Data<PgPool>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user.0)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }

    log::info!("Deleted user {}", user.0);

    Ok(HttpResponse::NoContent().finish())
}

/// Uploads a profile picture for the authenticated user.
///
/// Expects a multipart form with a `picture` file field. The file is stored
/// under the configured upload directory with a server-generated name, and
/// the resulting path is recorded on the user row. Any previously stored
/// picture file is removed best-effort.
///
/// ## Responses:
/// - `200 OK`: Returns the updated `User` object as JSON.
/// - `400 Bad Request`: Missing `picture` field, disallowed file type, or a
///   file larger than the configured cap.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
#[post("/me/picture")]
pub async fn upload_profile_picture(
    pool: web::Data<PgPool>,
    upload_config: web::Data<UploadConfig>,
    mut payload: Multipart,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let mut stored_path: Option<String> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {}", e)))?
    {
        if field.name() != "picture" {
            continue;
        }

        let filename = field
            .content_disposition()
            .get_filename()
            .map(str::to_owned)
            .ok_or_else(|| AppError::BadRequest("Missing file name".into()))?;

        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .ok_or_else(|| AppError::BadRequest("File has no extension".into()))?;

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AppError::BadRequest(format!(
                "File type not allowed, expected one of: {}",
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }

        let mut data = web::BytesMut::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {}", e)))?
        {
            if data.len() + chunk.len() > upload_config.max_upload_bytes {
                return Err(AppError::BadRequest(format!(
                    "File exceeds the {} byte limit",
                    upload_config.max_upload_bytes
                )));
            }
            data.extend_from_slice(&chunk);
        }

        if data.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".into()));
        }

        // Server-controlled file name; the client-supplied one is only used
        // for its extension.
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let path = format!("{}/{}", upload_config.upload_dir, file_name);

        tokio::fs::create_dir_all(&upload_config.upload_dir).await?;
        tokio::fs::write(&path, &data).await?;

        stored_path = Some(path);
        break;
    }

    let stored_path = match stored_path {
        Some(path) => path,
        None => return Err(AppError::BadRequest("Missing 'picture' field".into())),
    };

    let previous = sqlx::query_as::<_, (Option<String>,)>(
        "SELECT profile_picture FROM users WHERE id = $1",
    )
    .bind(user.0)
    .fetch_one(&**pool)
    .await?;

    let updated = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET profile_picture = $1 WHERE id = $2 RETURNING {}",
        USER_COLUMNS
    ))
    .bind(&stored_path)
    .bind(user.0)
    .fetch_one(&**pool)
    .await?;

    // Replaced pictures are orphaned files otherwise
    if let (Some(old),) = previous {
        if old != stored_path {
            let _ = tokio::fs::remove_file(&old).await;
        }
    }

    log::info!("Stored profile picture for user {} at {}", user.0, stored_path);

    Ok(HttpResponse::Ok().json(updated))
}
