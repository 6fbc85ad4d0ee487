use sqlx::{Pool, Postgres};

use crate::{
    actions::users::get_user_by_email,
    constants::ErrorMessage,
    cryptography::{generate_access_token, token_digest, verify_password},
    error::{ApiError, QueryError},
    schema::{User, Uuid},
    session::SessionData,
};

pub async fn find_session(
    digest: &str,
    pool: &Pool<Postgres>,
) -> Result<Option<SessionData>, ApiError> {
    let row: Option<User> = sqlx::query_as(
        "
        SELECT u.*
        FROM auth_tokens t
        INNER JOIN users u ON u.id = t.user_id
        WHERE t.digest = $1
    ",
    )
    .bind(digest)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(row.map(SessionData::from))
}

/// Issues a fresh token for the user behind `email`, replacing any previous one.
pub async fn login_user(
    email: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<String, ApiError> {
    let user = get_user_by_email(email, pool)
        .await?
        .ok_or_else(ApiError::not_found)?;

    let authenticated = verify_password(password, &user.password)
        .map_err(|e| ApiError::Internal(format!("Stored password hash is unusable: {e}")))?;
    if !authenticated {
        return Err(ApiError::invalid("password", ErrorMessage::WrongPassword));
    }

    let token = generate_access_token();
    sqlx::query(
        "
        INSERT INTO auth_tokens (user_id, digest)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET digest = EXCLUDED.digest, created = NOW()
    ",
    )
    .bind(user.id)
    .bind(token_digest(&token))
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    log::info!("> Issued token for user {}", user.id);
    Ok(token)
}

pub async fn logout_user(user_id: Uuid, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found());
    }

    Ok(())
}
