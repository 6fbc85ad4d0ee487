pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const USER_COUNT_PER_PAGE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 100;

pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 32000;
pub const MIN_INGREDIENT_AMOUNT: i32 = 1;
pub const MAX_INGREDIENT_AMOUNT: i32 = 32000;

/// Recipes shown per followed author when `recipes_limit` is absent or invalid.
pub const DEFAULT_RECIPES_LIMIT: i64 = 1;

pub const MAX_NAME_LENGTH: usize = 150;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_PASSWORD_LENGTH: usize = 150;

pub const SHOPPING_LIST_TITLE: &str = "Ingredients";
pub const SHOPPING_LIST_FILENAME: &str = "shopping_cart.pdf";

pub const ERROR_MESSAGES: &[(ErrorMessage, &str)] = &[
    (ErrorMessage::NothingToDelete, "Nothing to delete."),
    (ErrorMessage::RecipeInFavorites, "Recipe is in favorites already."),
    (
        ErrorMessage::RecipeInShoppingCart,
        "Recipe is in shopping cart already.",
    ),
    (ErrorMessage::AlreadySubscribed, "Already subscribed on author."),
    (ErrorMessage::CannotFollowYourself, "You cannot follow yourself."),
    (ErrorMessage::IngredientRequired, "At least one ingredient is required."),
    (
        ErrorMessage::DuplicateIngredient,
        "Ingredients must not repeat.",
    ),
    (ErrorMessage::WrongIngredientAmount, "Wrong ingredients amount."),
    (ErrorMessage::WrongCookingTime, "Wrong cooking time."),
    (ErrorMessage::TagRequired, "At least one tag is required."),
    (ErrorMessage::UnknownIngredient, "Ingredient does not exist."),
    (ErrorMessage::UnknownTag, "Tag does not exist."),
    (ErrorMessage::FieldRequired, "This field is required."),
    (ErrorMessage::FieldTooLong, "Ensure this field is not too long."),
    (ErrorMessage::WrongPassword, "Wrong password."),
    (
        ErrorMessage::RecipeExists,
        "You already have a recipe with this name.",
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMessage {
    NothingToDelete,
    RecipeInFavorites,
    RecipeInShoppingCart,
    AlreadySubscribed,
    CannotFollowYourself,
    IngredientRequired,
    DuplicateIngredient,
    WrongIngredientAmount,
    WrongCookingTime,
    TagRequired,
    UnknownIngredient,
    UnknownTag,
    FieldRequired,
    FieldTooLong,
    WrongPassword,
    RecipeExists,
}

impl ErrorMessage {
    pub fn as_str(self) -> &'static str {
        ERROR_MESSAGES
            .iter()
            .find_map(|(message, text)| (*message == self).then_some(*text))
            .unwrap_or("Invalid value.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_message_has_text() {
        let all = [
            ErrorMessage::NothingToDelete,
            ErrorMessage::RecipeInFavorites,
            ErrorMessage::RecipeInShoppingCart,
            ErrorMessage::AlreadySubscribed,
            ErrorMessage::CannotFollowYourself,
            ErrorMessage::IngredientRequired,
            ErrorMessage::DuplicateIngredient,
            ErrorMessage::WrongIngredientAmount,
            ErrorMessage::WrongCookingTime,
            ErrorMessage::TagRequired,
            ErrorMessage::UnknownIngredient,
            ErrorMessage::UnknownTag,
            ErrorMessage::FieldRequired,
            ErrorMessage::FieldTooLong,
            ErrorMessage::WrongPassword,
            ErrorMessage::RecipeExists,
        ];
        for message in all {
            assert_ne!(message.as_str(), "Invalid value.", "{message:?}");
        }
    }

    #[test]
    fn cooking_time_bounds_are_ordered() {
        assert!(MIN_COOKING_TIME <= MAX_COOKING_TIME);
        assert!(MIN_INGREDIENT_AMOUNT <= MAX_INGREDIENT_AMOUNT);
    }
}
