use warp::{reject::Rejection, reply::Response};

use crate::{
    actions::{ingredients, tags},
    api::{dto::ok, query::QueryParams, state::AppState},
    error::ApiError,
    schema::Uuid,
};

pub async fn list_tags(state: AppState) -> Result<Response, Rejection> {
    let tags = tags::list_tags(&state.cache, &state.pool).await?;
    Ok(ok(&tags))
}

pub async fn get_tag(id: Uuid, state: AppState) -> Result<Response, Rejection> {
    let tag = tags::get_tag(id, &state.cache, &state.pool)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(ok(&tag))
}

pub async fn list_ingredients(query: QueryParams, state: AppState) -> Result<Response, Rejection> {
    let ingredients =
        ingredients::search_ingredients(query.get("name"), &state.cache, &state.pool).await?;
    Ok(ok(&ingredients))
}

pub async fn get_ingredient(id: Uuid, state: AppState) -> Result<Response, Rejection> {
    let ingredient = ingredients::get_ingredient(id, &state.pool)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(ok(&ingredient))
}
