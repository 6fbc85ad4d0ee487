use serde::Serialize;

use crate::{
    error::ApiError,
    permissions::{ActionType, UserRole},
    schema::{User, Uuid},
};

/// The authenticated caller behind a request.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SessionData {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<User> for SessionData {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// Checks `action` for a possibly anonymous caller. Anonymous callers lacking the
/// right are unauthorized, authenticated ones are forbidden.
pub fn authenticate(session: Option<&SessionData>, action: ActionType) -> Result<(), ApiError> {
    let role = match session {
        Some(_) => UserRole::User,
        None => UserRole::Anonymous,
    };
    if action.authenticate(role) {
        return Ok(());
    }

    match session {
        Some(_) => Err(ApiError::Forbidden),
        None => Err(ApiError::Unauthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionData {
        SessionData {
            user_id: 1,
            username: String::from("ann"),
            email: String::from("ann@example.com"),
        }
    }

    #[test]
    fn anonymous_reads_are_allowed() {
        assert!(authenticate(None, ActionType::Read).is_ok());
        assert!(authenticate(None, ActionType::Register).is_ok());
    }

    #[test]
    fn anonymous_writes_are_unauthorized() {
        for action in [
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnShoppingCart,
            ActionType::ManageSubscriptions,
            ActionType::ManageOwnAccount,
        ] {
            assert!(matches!(
                authenticate(None, action),
                Err(ApiError::Unauthorized)
            ));
        }
    }

    #[test]
    fn users_may_write() {
        let session = session();
        assert!(authenticate(Some(&session), ActionType::CreateRecipes).is_ok());
        assert!(authenticate(Some(&session), ActionType::ManageOwnRecipes).is_ok());
        assert!(authenticate(Some(&session), ActionType::Read).is_ok());
    }
}
