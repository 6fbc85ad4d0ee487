use warp::{hyper::body::Bytes, reject::Rejection, reply::Response};

use crate::{
    actions::{collections, collections::Collection, recipes},
    api::{
        dto::{attachment, created, no_content, ok},
        query::QueryParams,
        state::AppState,
    },
    constants::{RECIPE_COUNT_PER_PAGE, SHOPPING_LIST_FILENAME},
    error::ApiError,
    form::RecipeForm,
    schema::Uuid,
    session::SessionData,
    shopping_list::{render_shopping_list, sum_cart},
};

pub async fn list_recipes(
    session: Option<SessionData>,
    query: QueryParams,
    state: AppState,
) -> Result<Response, Rejection> {
    let viewer = session.map(|s| s.user_id);
    let request = query.page_request(RECIPE_COUNT_PER_PAGE)?;

    let mut page =
        recipes::fetch_recipes(&query.recipe_filter(), viewer, request, &state.pool).await?;
    let rows = std::mem::take(&mut page.results);
    let details = recipes::compose_recipes(rows, viewer, &state.pool).await?;

    Ok(ok(&page
        .with_results(details)
        .with_links("/api/recipes", query.raw())))
}

pub async fn get_recipe(
    id: Uuid,
    session: Option<SessionData>,
    state: AppState,
) -> Result<Response, Rejection> {
    let viewer = session.map(|s| s.user_id);
    let recipe = recipes::get_recipe_detail(id, viewer, &state.pool).await?;
    Ok(ok(&recipe))
}

pub async fn create_recipe(
    session: SessionData,
    form: RecipeForm,
    state: AppState,
) -> Result<Response, Rejection> {
    let draft = form.validate_create()?;
    let id = recipes::create_recipe(session.user_id, draft, &state.pool).await?;
    let recipe = recipes::get_recipe_detail(id, Some(session.user_id), &state.pool).await?;
    Ok(created(&recipe))
}

/// Ownership is checked before the body is parsed, so a non-author gets 403 whatever they send.
pub async fn update_recipe(
    id: Uuid,
    session: SessionData,
    body: Bytes,
    state: AppState,
) -> Result<Response, Rejection> {
    let recipe = recipes::get_recipe_mut(id, &session, &state.pool).await?;
    let form: RecipeForm = serde_json::from_slice(&body)
        .map_err(|e| ApiError::MalformedBody(e.to_string()))?;
    let changes = form.validate_update()?;
    recipes::update_recipe(&recipe, changes, &state.pool).await?;

    let recipe = recipes::get_recipe_detail(id, Some(session.user_id), &state.pool).await?;
    Ok(ok(&recipe))
}

pub async fn delete_recipe(
    id: Uuid,
    session: SessionData,
    state: AppState,
) -> Result<Response, Rejection> {
    let recipe = recipes::get_recipe_mut(id, &session, &state.pool).await?;
    recipes::delete_recipe(&recipe, &state.pool).await?;
    Ok(no_content())
}

pub async fn add_to_collection(
    collection: Collection,
    id: Uuid,
    session: SessionData,
    state: AppState,
) -> Result<Response, Rejection> {
    let recipe =
        collections::add_to_collection(collection, session.user_id, id, &state.pool).await?;
    Ok(created(&recipe))
}

pub async fn remove_from_collection(
    collection: Collection,
    id: Uuid,
    session: SessionData,
    state: AppState,
) -> Result<Response, Rejection> {
    collections::remove_from_collection(collection, session.user_id, id, &state.pool).await?;
    Ok(no_content())
}

pub async fn download_shopping_cart(
    session: SessionData,
    state: AppState,
) -> Result<Response, Rejection> {
    let rows = collections::fetch_cart_ingredients(session.user_id, &state.pool).await?;
    let items = sum_cart(rows);
    let bytes = render_shopping_list(&items)?;

    log::trace!("> Rendered shopping list of {} items for {}", items.len(), session.username);
    Ok(attachment(bytes, "application/pdf", SHOPPING_LIST_FILENAME))
}
