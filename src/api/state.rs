use std::convert::Infallible;

use sqlx::{Pool, Postgres};
use warp::Filter;

use crate::cache::Cache;

/// Shared handles every handler gets a clone of.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool<Postgres>,
    pub cache: Cache,
}

impl AppState {
    pub fn new(pool: Pool<Postgres>, cache: Cache) -> Self {
        Self { pool, cache }
    }
}

pub fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}
