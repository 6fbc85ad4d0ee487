use serde::{Deserialize, Serialize};
use warp::{
    http::StatusCode,
    reply::{self, Reply, Response},
};

use crate::schema::{User, Uuid};

/// Registration response: the profile without `is_subscribed`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisteredUser {
    pub email: String,
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for RegisteredUser {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenResponse {
    pub auth_token: String,
}

pub fn ok<T: Serialize>(value: &T) -> Response {
    reply::json(value).into_response()
}

pub fn created<T: Serialize>(value: &T) -> Response {
    reply::with_status(reply::json(value), StatusCode::CREATED).into_response()
}

pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// A downloadable file response.
pub fn attachment(bytes: Vec<u8>, content_type: &str, filename: &str) -> Response {
    let disposition = format!("attachment; filename=\"{filename}\"");
    let reply = reply::with_header(bytes, "content-type", content_type);
    reply::with_header(reply, "content-disposition", disposition).into_response()
}
