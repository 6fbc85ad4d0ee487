mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod pagination;
    pub mod schema;
}
mod authentication {
    pub mod cryptography;
    pub mod middleware;
    pub mod permissions;
    pub mod session;
}
mod constants;

pub mod cache {
    mod cache;

    pub use cache::*;
}

pub mod shopping_list {
    mod aggregate;
    mod document;

    pub use aggregate::{sum_cart, ShoppingItem};
    pub use document::render_shopping_list;
}

pub mod api {
    mod dto;
    mod handlers {
        pub mod auth;
        pub mod catalog;
        pub mod recipes;
        pub mod users;
    }
    mod query;
    mod router;
    mod state;

    pub use dto::{RegisteredUser, TokenResponse};
    pub use query::QueryParams;
    pub use router::{handle_rejection, routes};
    pub use state::AppState;
}

pub mod config;
pub mod logging;

pub use authentication::*;
pub use constants::*;
pub use database::*;
