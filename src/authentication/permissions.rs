#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Anonymous,
    User,
}

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (UserRole::Anonymous, &[ActionType::Read, ActionType::Register]),
    (
        UserRole::User,
        &[
            ActionType::Read,
            ActionType::Register,
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnShoppingCart,
            ActionType::ManageSubscriptions,
            ActionType::ManageOwnAccount,
        ],
    ),
];

/// The capability a route requires, declared next to the route.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    Read,
    Register,

    CreateRecipes,
    ManageOwnRecipes,

    ManageOwnFavorites,
    ManageOwnShoppingCart,
    ManageSubscriptions,
    ManageOwnAccount,
}

impl ActionType {
    pub fn authenticate(self, role: UserRole) -> bool {
        ACTION_TABLE
            .iter()
            .find_map(|(r, actions)| {
                if *r != role {
                    return None;
                }

                Some(actions.contains(&self))
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_role_is_read_only() {
        assert!(ActionType::Read.authenticate(UserRole::Anonymous));
        assert!(!ActionType::CreateRecipes.authenticate(UserRole::Anonymous));
        assert!(!ActionType::ManageOwnAccount.authenticate(UserRole::Anonymous));
    }

    #[test]
    fn user_role_has_every_action() {
        for action in [
            ActionType::Read,
            ActionType::Register,
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnShoppingCart,
            ActionType::ManageSubscriptions,
            ActionType::ManageOwnAccount,
        ] {
            assert!(action.authenticate(UserRole::User), "{action:?}");
        }
    }
}
