use std::collections::HashSet;

use sqlx::{Pool, Postgres, Transaction};

use crate::{
    cache::{Cache, CacheKeyType, CachedIngredients},
    constants::ErrorMessage,
    error::{ApiError, QueryError},
    schema::{Ingredient, RecipePart, Uuid},
};

/// Escapes LIKE wildcards so the search term matches literally.
fn like_prefix(name: &str) -> String {
    let mut pattern = String::with_capacity(name.len() + 1);
    for c in name.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Case-insensitive prefix search; an empty or absent name lists everything.
pub async fn search_ingredients(
    name: Option<&str>,
    cache: &Cache,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, ApiError> {
    let name = name.map(str::trim).unwrap_or("").to_owned();
    let key = CacheKeyType::IngredientSearch.new(&name);

    let cached = cache
        .get_or(key, || async {
            let ingredients: Vec<Ingredient> = sqlx::query_as(
                "
                SELECT * FROM ingredients
                WHERE LOWER(name) LIKE LOWER($1)
                ORDER BY name, measurement_unit
            ",
            )
            .bind(like_prefix(&name))
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?;
            Ok(CachedIngredients { ingredients })
        })
        .await?;

    Ok(cached.ingredients)
}

pub async fn get_ingredient(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Ingredient>, ApiError> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

/// Ingredients of every recipe in `recipe_ids` with their per-recipe amounts.
pub async fn list_recipe_parts(
    recipe_ids: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipePart>, ApiError> {
    let rows: Vec<RecipePart> = sqlx::query_as("
        SELECT ir.recipe_id AS recipe_id, i.id AS id, i.name AS name, i.measurement_unit AS measurement_unit, ir.quantity AS amount
        FROM ingredient_recipe ir
        INNER JOIN ingredients i ON i.id = ir.ingredient_id
        WHERE ir.recipe_id = ANY($1)
        ORDER BY i.name
    ")
    .bind(recipe_ids)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}

/// Replaces the ingredient set of a recipe inside `tr`. Unknown ingredient ids fail the
/// whole write.
pub async fn set_recipe_parts(
    recipe_id: Uuid,
    parts: &[(Uuid, i32)],
    tr: &mut Transaction<'_, Postgres>,
) -> Result<(), ApiError> {
    let ids: Vec<Uuid> = parts.iter().map(|(id, _)| *id).collect();
    let found: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = ANY($1)")
        .bind(&ids)
        .fetch_all(&mut **tr)
        .await
        .map_err(QueryError::from)?;
    let found: HashSet<Uuid> = found.into_iter().map(|row| row.0).collect();
    if ids.iter().any(|id| !found.contains(id)) {
        return Err(ApiError::invalid(
            "ingredients",
            ErrorMessage::UnknownIngredient,
        ));
    }

    sqlx::query("DELETE FROM ingredient_recipe WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tr)
        .await
        .map_err(QueryError::from)?;

    for (ingredient_id, quantity) in parts {
        sqlx::query(
            "INSERT INTO ingredient_recipe (ingredient_id, recipe_id, quantity) VALUES ($1, $2, $3)",
        )
        .bind(ingredient_id)
        .bind(recipe_id)
        .bind(quantity)
        .execute(&mut **tr)
        .await
        .map_err(QueryError::from)?;
    }

    Ok(())
}
