use std::collections::HashMap;

use sqlx::{Pool, Postgres};

use crate::{
    constants::ErrorMessage,
    cryptography::{hash_password, verify_password},
    error::{ApiError, FieldErrors, QueryError},
    form::NewUser,
    pagination::{PageContext, PageRequest},
    schema::{User, UserProfile, UserProfileRow, Uuid},
};

const PROFILE_COLUMNS: &str = "
    u.email, u.id, u.username, u.first_name, u.last_name,
    EXISTS (SELECT 1 FROM follows f WHERE f.follower_id = $1 AND f.following_id = u.id) AS is_subscribed
";

pub async fn get_user_by_email(
    email: &str,
    pool: &Pool<Postgres>,
) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_user_by_id(user_id: Uuid, pool: &Pool<Postgres>) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn user_exists(user_id: Uuid, pool: &Pool<Postgres>) -> Result<bool, ApiError> {
    let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row.is_some())
}

/// Profile of `user_id` as seen by `viewer`.
pub async fn get_user_profile(
    user_id: Uuid,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<Option<UserProfile>, ApiError> {
    let row: Option<UserProfile> = sqlx::query_as(&format!(
        "SELECT {PROFILE_COLUMNS} FROM users u WHERE u.id = $2"
    ))
    .bind(viewer)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_user_profiles(
    user_ids: &[Uuid],
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<HashMap<Uuid, UserProfile>, ApiError> {
    let rows: Vec<UserProfile> = sqlx::query_as(&format!(
        "SELECT {PROFILE_COLUMNS} FROM users u WHERE u.id = ANY($2)"
    ))
    .bind(viewer)
    .bind(user_ids)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows.into_iter().map(|row| (row.id, row)).collect())
}

pub async fn fetch_users(
    viewer: Option<Uuid>,
    request: PageRequest,
    pool: &Pool<Postgres>,
) -> Result<PageContext<UserProfile>, ApiError> {
    let rows: Vec<UserProfileRow> = sqlx::query_as(&format!(
        "SELECT {PROFILE_COLUMNS}, COUNT(*) OVER() AS count FROM users u ORDER BY u.username LIMIT $2 OFFSET $3"
    ))
    .bind(viewer)
    .bind(request.page_size)
    .bind(request.offset())
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let rows = rows.into_iter().map(UserProfile::from).collect();
    PageContext::from_rows(rows, total_count, request)
}

/// Users followed by `follower`, with `is_subscribed` relative to them.
pub async fn fetch_followed_users(
    follower: Uuid,
    request: PageRequest,
    pool: &Pool<Postgres>,
) -> Result<PageContext<UserProfile>, ApiError> {
    let rows: Vec<UserProfileRow> = sqlx::query_as(&format!(
        "
        SELECT {PROFILE_COLUMNS}, COUNT(*) OVER() AS count
        FROM users u
        INNER JOIN follows fo ON fo.following_id = u.id
        WHERE fo.follower_id = $1
        ORDER BY u.username
        LIMIT $2 OFFSET $3
    "
    ))
    .bind(follower)
    .bind(request.page_size)
    .bind(request.offset())
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let rows = rows.into_iter().map(UserProfile::from).collect();
    PageContext::from_rows(rows, total_count, request)
}

/// Creates a user; the password is hashed here.
pub async fn register_user(user: NewUser, pool: &Pool<Postgres>) -> Result<User, ApiError> {
    let taken: Vec<(String, String)> =
        sqlx::query_as("SELECT LOWER(email), username FROM users WHERE LOWER(email) = $1 OR username = $2")
            .bind(&user.email)
            .bind(&user.username)
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?;

    let mut errors = FieldErrors::new();
    for (email, username) in &taken {
        if *email == user.email {
            errors.add_text("email", "A user with that email already exists.");
        }
        if *username == user.username {
            errors.add_text("username", "A user with that username already exists.");
        }
    }
    errors.finish(())?;

    let password = hash_password(&user.password)
        .map_err(|e| ApiError::Internal(format!("Could not hash password: {e}")))?;

    let row: User = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
    ",
    )
    .bind(&user.email)
    .bind(&user.username)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(password)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        let e = QueryError::from(e);
        let mut errors = FieldErrors::new();
        match e.constraint() {
            Some("users_email_key") => {
                errors.add_text("email", "A user with that email already exists.")
            }
            Some("users_username_key") => {
                errors.add_text("username", "A user with that username already exists.")
            }
            _ => return ApiError::from(e),
        }
        ApiError::Validation(errors)
    })?;

    log::info!("> Registered user {} ({})", row.id, row.username);
    Ok(row)
}

pub async fn set_password(
    user_id: Uuid,
    current_password: &str,
    new_password: &str,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let user = get_user_by_id(user_id, pool)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let authenticated = verify_password(current_password, &user.password)
        .map_err(|e| ApiError::Internal(format!("Stored password hash is unusable: {e}")))?;
    if !authenticated {
        return Err(ApiError::invalid(
            "current_password",
            ErrorMessage::WrongPassword,
        ));
    }

    let password = hash_password(new_password)
        .map_err(|e| ApiError::Internal(format!("Could not hash password: {e}")))?;

    sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(password)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}
