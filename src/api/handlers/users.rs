use warp::{reject::Rejection, reply::Response};

use crate::{
    actions::{follows, users},
    api::{
        dto::{created, no_content, ok, RegisteredUser},
        query::QueryParams,
        state::AppState,
    },
    constants::USER_COUNT_PER_PAGE,
    error::ApiError,
    form::{RegisterForm, SetPasswordForm},
    schema::Uuid,
    session::SessionData,
};

pub async fn list_users(
    session: Option<SessionData>,
    query: QueryParams,
    state: AppState,
) -> Result<Response, Rejection> {
    let viewer = session.map(|s| s.user_id);
    let request = query.page_request(USER_COUNT_PER_PAGE)?;
    let page = users::fetch_users(viewer, request, &state.pool).await?;
    Ok(ok(&page.with_links("/api/users", query.raw())))
}

pub async fn register(form: RegisterForm, state: AppState) -> Result<Response, Rejection> {
    let user = form.validate()?;
    let user = users::register_user(user, &state.pool).await?;
    Ok(created(&RegisteredUser::from(user)))
}

pub async fn get_user(
    id: Uuid,
    session: Option<SessionData>,
    state: AppState,
) -> Result<Response, Rejection> {
    let viewer = session.map(|s| s.user_id);
    let profile = users::get_user_profile(id, viewer, &state.pool)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(ok(&profile))
}

pub async fn me(session: SessionData, state: AppState) -> Result<Response, Rejection> {
    let profile = users::get_user_profile(session.user_id, Some(session.user_id), &state.pool)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    Ok(ok(&profile))
}

pub async fn set_password(
    session: SessionData,
    form: SetPasswordForm,
    state: AppState,
) -> Result<Response, Rejection> {
    let (current, new) = form.validate()?;
    users::set_password(session.user_id, &current, &new, &state.pool).await?;
    Ok(no_content())
}

pub async fn subscriptions(
    session: SessionData,
    query: QueryParams,
    state: AppState,
) -> Result<Response, Rejection> {
    let request = query.page_request(USER_COUNT_PER_PAGE)?;
    let page =
        follows::fetch_subscriptions(session.user_id, query.recipes_limit(), request, &state.pool)
            .await?;
    Ok(ok(&page.with_links("/api/users/subscriptions", query.raw())))
}

pub async fn subscribe(
    id: Uuid,
    session: SessionData,
    query: QueryParams,
    state: AppState,
) -> Result<Response, Rejection> {
    let subscription =
        follows::subscribe(session.user_id, id, query.recipes_limit(), &state.pool).await?;
    Ok(created(&subscription))
}

pub async fn unsubscribe(
    id: Uuid,
    session: SessionData,
    state: AppState,
) -> Result<Response, Rejection> {
    follows::unsubscribe(session.user_id, id, &state.pool).await?;
    Ok(no_content())
}
