use warp::{reject::Rejection, reply::Response};

use crate::{
    actions::tokens,
    api::{
        dto::{created, no_content, TokenResponse},
        state::AppState,
    },
    form::LoginForm,
    session::SessionData,
};

pub async fn login(form: LoginForm, state: AppState) -> Result<Response, Rejection> {
    let (email, password) = form.validate()?;
    let auth_token = tokens::login_user(&email, &password, &state.pool).await?;
    Ok(created(&TokenResponse { auth_token }))
}

pub async fn logout(session: SessionData, state: AppState) -> Result<Response, Rejection> {
    tokens::logout_user(session.user_id, &state.pool).await?;
    log::trace!("> {} logged out", session.username);
    Ok(no_content())
}
