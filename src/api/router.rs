use std::convert::Infallible;

use warp::{
    http::StatusCode,
    hyper::body::Bytes,
    reject::Rejection,
    reply::{self, Reply, Response},
    Filter,
};

use super::{
    handlers::{auth, catalog, recipes, users},
    query::{with_query, QueryParams},
    state::{with_state, AppState},
};
use crate::{
    actions::collections::Collection,
    error::ApiError,
    form::{LoginForm, RegisterForm},
    middleware::{with_action, with_session},
    permissions::ActionType,
    schema::Uuid,
    session::SessionData,
};

const MAX_BODY_BYTES: u64 = 16 * 1024 * 1024;

fn json_body<T: serde::de::DeserializeOwned + Send>(
) -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// Unparsed body, for handlers that must authorize before looking at the payload.
fn raw_body() -> impl Filter<Extract = (Bytes,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::bytes())
}

fn catalog_routes(state: AppState) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let pool = state.pool.clone();

    let list_tags = warp::path!("tags")
        .and(warp::get())
        .and(with_action(pool.clone(), ActionType::Read))
        .and(with_state(state.clone()))
        .and_then(|_: Option<SessionData>, state: AppState| catalog::list_tags(state));

    let get_tag = warp::path!("tags" / Uuid)
        .and(warp::get())
        .and(with_action(pool.clone(), ActionType::Read))
        .and(with_state(state.clone()))
        .and_then(|id: Uuid, _: Option<SessionData>, state: AppState| {
            catalog::get_tag(id, state)
        });

    let list_ingredients = warp::path!("ingredients")
        .and(warp::get())
        .and(with_action(pool.clone(), ActionType::Read))
        .and(with_query())
        .and(with_state(state.clone()))
        .and_then(|_: Option<SessionData>, query: QueryParams, state: AppState| {
            catalog::list_ingredients(query, state)
        });

    let get_ingredient = warp::path!("ingredients" / Uuid)
        .and(warp::get())
        .and(with_action(pool, ActionType::Read))
        .and(with_state(state))
        .and_then(|id: Uuid, _: Option<SessionData>, state: AppState| {
            catalog::get_ingredient(id, state)
        });

    list_tags
        .or(get_tag)
        .unify()
        .or(list_ingredients)
        .unify()
        .or(get_ingredient)
        .unify()
}

fn collection_routes(
    name: &'static str,
    collection: Collection,
    action: ActionType,
    state: AppState,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let pool = state.pool.clone();

    let add = warp::path("recipes")
        .and(warp::path::param::<Uuid>())
        .and(warp::path(name))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_session(pool.clone(), action))
        .and(with_state(state.clone()))
        .and_then(move |id: Uuid, session: SessionData, state: AppState| {
            recipes::add_to_collection(collection, id, session, state)
        });

    let remove = warp::path("recipes")
        .and(warp::path::param::<Uuid>())
        .and(warp::path(name))
        .and(warp::path::end())
        .and(warp::delete())
        .and(with_session(pool, action))
        .and(with_state(state))
        .and_then(move |id: Uuid, session: SessionData, state: AppState| {
            recipes::remove_from_collection(collection, id, session, state)
        });

    add.or(remove).unify()
}

fn recipe_routes(state: AppState) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let pool = state.pool.clone();

    let download = warp::path!("recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(with_session(pool.clone(), ActionType::ManageOwnShoppingCart))
        .and(with_state(state.clone()))
        .and_then(recipes::download_shopping_cart);

    let list = warp::path!("recipes")
        .and(warp::get())
        .and(with_action(pool.clone(), ActionType::Read))
        .and(with_query())
        .and(with_state(state.clone()))
        .and_then(recipes::list_recipes);

    let create = warp::path!("recipes")
        .and(warp::post())
        .and(with_session(pool.clone(), ActionType::CreateRecipes))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(recipes::create_recipe);

    let detail = warp::path!("recipes" / Uuid)
        .and(warp::get())
        .and(with_action(pool.clone(), ActionType::Read))
        .and(with_state(state.clone()))
        .and_then(recipes::get_recipe);

    let update = warp::path!("recipes" / Uuid)
        .and(warp::patch())
        .and(with_session(pool.clone(), ActionType::ManageOwnRecipes))
        .and(raw_body())
        .and(with_state(state.clone()))
        .and_then(recipes::update_recipe);

    let delete = warp::path!("recipes" / Uuid)
        .and(warp::delete())
        .and(with_session(pool, ActionType::ManageOwnRecipes))
        .and(with_state(state.clone()))
        .and_then(recipes::delete_recipe);

    let favorites = collection_routes(
        "favorite",
        Collection::Favorites,
        ActionType::ManageOwnFavorites,
        state.clone(),
    );
    let cart = collection_routes(
        "shopping_cart",
        Collection::ShoppingCart,
        ActionType::ManageOwnShoppingCart,
        state,
    );

    download
        .or(list)
        .unify()
        .or(create)
        .unify()
        .or(detail)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .or(favorites)
        .unify()
        .or(cart)
        .unify()
}

fn user_routes(state: AppState) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let pool = state.pool.clone();

    let me = warp::path!("users" / "me")
        .and(warp::get())
        .and(with_session(pool.clone(), ActionType::ManageOwnAccount))
        .and(with_state(state.clone()))
        .and_then(users::me);

    let set_password = warp::path!("users" / "set_password")
        .and(warp::post())
        .and(with_session(pool.clone(), ActionType::ManageOwnAccount))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(users::set_password);

    let subscriptions = warp::path!("users" / "subscriptions")
        .and(warp::get())
        .and(with_session(pool.clone(), ActionType::ManageSubscriptions))
        .and(with_query())
        .and(with_state(state.clone()))
        .and_then(users::subscriptions);

    let list = warp::path!("users")
        .and(warp::get())
        .and(with_action(pool.clone(), ActionType::Read))
        .and(with_query())
        .and(with_state(state.clone()))
        .and_then(users::list_users);

    let register = warp::path!("users")
        .and(warp::post())
        .and(with_action(pool.clone(), ActionType::Register))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(|_: Option<SessionData>, form: RegisterForm, state: AppState| {
            users::register(form, state)
        });

    let detail = warp::path!("users" / Uuid)
        .and(warp::get())
        .and(with_action(pool.clone(), ActionType::Read))
        .and(with_state(state.clone()))
        .and_then(users::get_user);

    let subscribe = warp::path!("users" / Uuid / "subscribe")
        .and(warp::post())
        .and(with_session(pool.clone(), ActionType::ManageSubscriptions))
        .and(with_query())
        .and(with_state(state.clone()))
        .and_then(users::subscribe);

    let unsubscribe = warp::path!("users" / Uuid / "subscribe")
        .and(warp::delete())
        .and(with_session(pool, ActionType::ManageSubscriptions))
        .and(with_state(state))
        .and_then(users::unsubscribe);

    me.or(set_password)
        .unify()
        .or(subscriptions)
        .unify()
        .or(list)
        .unify()
        .or(register)
        .unify()
        .or(detail)
        .unify()
        .or(subscribe)
        .unify()
        .or(unsubscribe)
        .unify()
}

fn auth_routes(state: AppState) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let pool = state.pool.clone();

    let login = warp::path!("auth" / "token" / "login")
        .and(warp::post())
        .and(with_action(pool.clone(), ActionType::Register))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(|_: Option<SessionData>, form: LoginForm, state: AppState| {
            auth::login(form, state)
        });

    let logout = warp::path!("auth" / "token" / "logout")
        .and(warp::post())
        .and(with_session(pool, ActionType::ManageOwnAccount))
        .and(with_state(state))
        .and_then(auth::logout);

    login.or(logout).unify()
}

/// Every route of the service under `/api`, with rejections rendered as JSON.
pub fn routes(state: AppState) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let api = catalog_routes(state.clone())
        .or(recipe_routes(state.clone()))
        .unify()
        .or(user_routes(state.clone()))
        .unify()
        .or(auth_routes(state))
        .unify();

    warp::path("api")
        .and(api)
        .recover(handle_rejection)
        .unify()
        .with(warp::log("foodgram::api"))
}

fn detail(message: &str, status: StatusCode) -> Response {
    reply::with_status(reply::json(&serde_json::json!({ "detail": message })), status)
        .into_response()
}

pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    if let Some(e) = err.find::<ApiError>() {
        return Ok(e.clone().into_response());
    }

    let response = if err.is_not_found() {
        detail("Not found.", StatusCode::NOT_FOUND)
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        detail(&format!("JSON parse error - {e}"), StatusCode::BAD_REQUEST)
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        detail("Invalid query string.", StatusCode::BAD_REQUEST)
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        detail("Request body is too large.", StatusCode::PAYLOAD_TOO_LARGE)
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        detail("Unsupported media type.", StatusCode::UNSUPPORTED_MEDIA_TYPE)
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        detail("Content-Length is required.", StatusCode::LENGTH_REQUIRED)
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        detail("Method not allowed.", StatusCode::METHOD_NOT_ALLOWED)
    } else {
        log::error!("> Unhandled rejection: {err:?}");
        detail("Internal server error.", StatusCode::INTERNAL_SERVER_ERROR)
    };

    Ok(response)
}
