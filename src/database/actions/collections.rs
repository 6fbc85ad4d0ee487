use sqlx::{Pool, Postgres};

use crate::{
    actions::recipes::get_recipe,
    constants::ErrorMessage,
    error::{ApiError, QueryError},
    schema::{CartIngredient, ShortRecipe, Uuid},
};

/// Per-user recipe collections sharing the same add/remove semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Favorites,
    ShoppingCart,
}

impl Collection {
    fn table(&self) -> &'static str {
        match self {
            Collection::Favorites => "favorites",
            Collection::ShoppingCart => "shopping_cart",
        }
    }

    fn already_added(&self) -> ErrorMessage {
        match self {
            Collection::Favorites => ErrorMessage::RecipeInFavorites,
            Collection::ShoppingCart => ErrorMessage::RecipeInShoppingCart,
        }
    }
}

pub async fn add_to_collection(
    collection: Collection,
    user_id: Uuid,
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<ShortRecipe, ApiError> {
    let recipe = get_recipe(recipe_id, pool)
        .await?
        .ok_or_else(ApiError::not_found)?;

    // The unique constraint decides concurrent adds; zero rows means someone got there first.
    let result = sqlx::query(&format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        collection.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::conflict(collection.already_added()));
    }

    Ok(ShortRecipe {
        id: recipe.id,
        name: recipe.name,
        image: recipe.image,
        cooking_time: recipe.cooking_time,
    })
}

pub async fn remove_from_collection(
    collection: Collection,
    user_id: Uuid,
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    if get_recipe(recipe_id, pool).await?.is_none() {
        return Err(ApiError::not_found());
    }

    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
        collection.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NothingToDelete);
    }
    Ok(())
}

/// Every (recipe, ingredient) occurrence across the user's cart, not yet summed.
pub async fn fetch_cart_ingredients(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<CartIngredient>, ApiError> {
    let rows: Vec<CartIngredient> = sqlx::query_as(
        "
        SELECT i.id AS ingredient_id, i.name AS name, i.measurement_unit AS measurement_unit, ir.quantity AS quantity
        FROM shopping_cart c
        INNER JOIN ingredient_recipe ir ON ir.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ir.ingredient_id
        WHERE c.user_id = $1
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collections_have_their_own_conflict_message() {
        assert_eq!(Collection::Favorites.table(), "favorites");
        assert_eq!(
            Collection::ShoppingCart.already_added(),
            ErrorMessage::RecipeInShoppingCart
        );
    }
}
