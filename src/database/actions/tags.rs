use std::collections::HashSet;

use sqlx::{Pool, Postgres, Transaction};

use crate::{
    cache::{Cache, CacheKeyType, CachedTags},
    constants::ErrorMessage,
    error::{ApiError, QueryError},
    schema::{LinkedRecipeTag, Tag, Uuid},
};

pub async fn list_tags(cache: &Cache, pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    let cached = cache
        .get_or(CacheKeyType::Tags.new("all"), || async {
            let tags: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY name")
                .fetch_all(pool)
                .await
                .map_err(QueryError::from)?;
            Ok(CachedTags { tags })
        })
        .await?;

    Ok(cached.tags)
}

pub async fn get_tag(id: Uuid, cache: &Cache, pool: &Pool<Postgres>) -> Result<Option<Tag>, ApiError> {
    let cached = cache
        .get_or(CacheKeyType::Tags.new(id), || async {
            let tags: Vec<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
                .bind(id)
                .fetch_all(pool)
                .await
                .map_err(QueryError::from)?;
            Ok(CachedTags { tags })
        })
        .await?;

    Ok(cached.tags.into_iter().next())
}

/// Tags of every recipe in `recipe_ids`, ordered by tag name.
pub async fn list_recipe_tags(
    recipe_ids: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<Vec<LinkedRecipeTag>, ApiError> {
    let list: Vec<LinkedRecipeTag> = sqlx::query_as(
        "
        SELECT tr.recipe_id AS recipe_id, t.id AS id, t.name AS name, t.color AS color, t.slug AS slug
        FROM tag_recipe tr
        INNER JOIN tags t ON t.id = tr.tag_id
        WHERE tr.recipe_id = ANY($1)
        ORDER BY t.name
    ",
    )
    .bind(recipe_ids)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(list)
}

/// Replaces the tag set of a recipe inside `tr`. Unknown tag ids fail the whole write.
pub async fn set_recipe_tags(
    recipe_id: Uuid,
    tag_ids: &[Uuid],
    tr: &mut Transaction<'_, Postgres>,
) -> Result<(), ApiError> {
    let found: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ANY($1)")
        .bind(tag_ids)
        .fetch_all(&mut **tr)
        .await
        .map_err(QueryError::from)?;
    let found: HashSet<Uuid> = found.into_iter().map(|row| row.0).collect();
    if tag_ids.iter().any(|id| !found.contains(id)) {
        return Err(ApiError::invalid("tags", ErrorMessage::UnknownTag));
    }

    sqlx::query("DELETE FROM tag_recipe WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tr)
        .await
        .map_err(QueryError::from)?;

    for tag_id in tag_ids {
        sqlx::query("INSERT INTO tag_recipe (tag_id, recipe_id) VALUES ($1, $2)")
            .bind(tag_id)
            .bind(recipe_id)
            .execute(&mut **tr)
            .await
            .map_err(QueryError::from)?;
    }

    Ok(())
}
