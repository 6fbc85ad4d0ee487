use sqlx::{Pool, Postgres};
use warp::{reject::Rejection, Filter};

use super::{
    permissions::ActionType,
    session::{authenticate, SessionData},
};
use crate::{actions::tokens::find_session, cryptography::token_digest, error::ApiError};

const TOKEN_KEYWORD: &str = "Token";

/// Extracts the token from an `Authorization: Token <token>` header. Other schemes are
/// not ours and count as no credentials at all.
fn parse_authorization(header: &str) -> Option<Result<&str, ApiError>> {
    let mut parts = header.split_whitespace();
    match parts.next() {
        Some(keyword) if keyword.eq_ignore_ascii_case(TOKEN_KEYWORD) => {}
        _ => return None,
    }
    match (parts.next(), parts.next()) {
        (Some(token), None) => Some(Ok(token)),
        _ => Some(Err(ApiError::Unauthorized)),
    }
}

pub fn with_possible_session(
    pool: Pool<Postgres>,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let pool = pool.clone();
        async move {
            let token = match header.as_deref().and_then(parse_authorization) {
                None => return Ok(None),
                Some(Ok(token)) => token,
                Some(Err(e)) => return Err(Rejection::from(e)),
            };

            match find_session(&token_digest(token), &pool).await {
                Ok(Some(session)) => Ok(Some(session)),
                Ok(None) => Err(Rejection::from(ApiError::Unauthorized)),
                Err(e) => Err(Rejection::from(e)),
            }
        }
    })
}

/// The single guard every route goes through: resolves the caller and checks the
/// route's declared action against it.
pub fn with_action(
    pool: Pool<Postgres>,
    action: ActionType,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    with_possible_session(pool).and_then(move |session: Option<SessionData>| async move {
        authenticate(session.as_ref(), action).map_err(Rejection::from)?;
        Ok::<_, Rejection>(session)
    })
}

/// Like [`with_action`], for routes that only make sense with a logged-in caller.
pub fn with_session(
    pool: Pool<Postgres>,
    action: ActionType,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    with_action(pool, action).and_then(|session: Option<SessionData>| async move {
        session.ok_or_else(|| Rejection::from(ApiError::Unauthorized))
    })
}
