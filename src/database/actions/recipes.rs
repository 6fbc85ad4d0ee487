use std::collections::HashMap;

use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    actions::{
        ingredients::{list_recipe_parts, set_recipe_parts},
        tags::{list_recipe_tags, set_recipe_tags},
        users::get_user_profiles,
    },
    constants::ErrorMessage,
    error::{ApiError, QueryError},
    form::{RecipeChanges, RecipeDraft},
    pagination::{PageContext, PageRequest},
    schema::{Recipe, RecipeDetail, RecipePart, RecipeRow, Tag, Uuid},
    session::SessionData,
};

/// Filters accepted by the recipe list. `None` flags mean "don't care".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tags: Vec<String>,
    pub author: Option<Uuid>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

impl RecipeFilter {
    /// Asking an anonymous caller for their own pairings can only match nothing.
    fn matches_nothing(&self, viewer: Option<Uuid>) -> bool {
        viewer.is_none() && (self.is_favorited == Some(true) || self.is_in_shopping_cart == Some(true))
    }
}

fn recipe_select<'a>(viewer: Option<Uuid>) -> QueryBuilder<'a, Postgres> {
    let mut query = QueryBuilder::new(
        "SELECT r.id, r.author_id, r.name, r.image, r.description, r.cooking_time, \
         EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ",
    );
    query.push_bind(viewer);
    query.push(
        ") AS is_favorited, \
         EXISTS (SELECT 1 FROM shopping_cart c WHERE c.recipe_id = r.id AND c.user_id = ",
    );
    query.push_bind(viewer);
    query.push(") AS is_in_shopping_cart, COUNT(*) OVER() AS count FROM recipes r WHERE TRUE");
    query
}

fn push_pairing_filter(
    query: &mut QueryBuilder<'_, Postgres>,
    table: &str,
    wanted: Option<bool>,
    viewer: Option<Uuid>,
) {
    let (Some(wanted), Some(viewer)) = (wanted, viewer) else {
        return;
    };
    let negation = if wanted { "" } else { "NOT " };
    query.push(format!(
        " AND {negation}EXISTS (SELECT 1 FROM {table} p WHERE p.recipe_id = r.id AND p.user_id = "
    ));
    query.push_bind(viewer);
    query.push(")");
}

/// Newest first, filtered relative to `viewer`.
pub async fn fetch_recipes(
    filter: &RecipeFilter,
    viewer: Option<Uuid>,
    request: PageRequest,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, ApiError> {
    if filter.matches_nothing(viewer) {
        return PageContext::from_rows(vec![], 0, request);
    }

    let mut query = recipe_select(viewer);
    if !filter.tags.is_empty() {
        query.push(
            " AND EXISTS (SELECT 1 FROM tag_recipe tr INNER JOIN tags t ON t.id = tr.tag_id \
             WHERE tr.recipe_id = r.id AND t.slug = ANY(",
        );
        query.push_bind(filter.tags.clone());
        query.push("))");
    }
    if let Some(author) = filter.author {
        query.push(" AND r.author_id = ");
        query.push_bind(author);
    }
    push_pairing_filter(&mut query, "favorites", filter.is_favorited, viewer);
    push_pairing_filter(&mut query, "shopping_cart", filter.is_in_shopping_cart, viewer);

    query.push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ");
    query.push_bind(request.page_size);
    query.push(" OFFSET ");
    query.push_bind(request.offset());

    let rows: Vec<RecipeRow> = query
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    PageContext::from_rows(rows, total_count, request)
}

pub async fn get_recipe_row(
    id: Uuid,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<Option<RecipeRow>, ApiError> {
    let mut query = recipe_select(viewer);
    query.push(" AND r.id = ");
    query.push_bind(id);

    let row: Option<RecipeRow> = query
        .build_query_as()
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, ApiError> {
    let recipe: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(recipe)
}

/// Loads a recipe for mutation by `session`. Only the author may change it.
pub async fn get_recipe_mut(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    let recipe = get_recipe(id, pool).await?.ok_or_else(ApiError::not_found)?;
    if recipe.author_id != session.user_id {
        return Err(ApiError::Forbidden);
    }
    Ok(recipe)
}

fn recipe_write_error(e: sqlx::Error) -> ApiError {
    let e = QueryError::from(e);
    match e.constraint() {
        Some("unique_recipe_per_author") => ApiError::conflict(ErrorMessage::RecipeExists),
        _ => ApiError::from(e),
    }
}

/// Inserts a recipe with its ingredients and tags. Either all of it lands or none.
pub async fn create_recipe(
    author_id: Uuid,
    draft: RecipeDraft,
    pool: &Pool<Postgres>,
) -> Result<Uuid, ApiError> {
    let mut tr = pool.begin().await.map_err(QueryError::from)?;

    let (id,): (Uuid,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, description, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(author_id)
    .bind(&draft.name)
    .bind(&draft.image)
    .bind(&draft.description)
    .bind(draft.cooking_time)
    .fetch_one(&mut *tr)
    .await
    .map_err(recipe_write_error)?;

    set_recipe_parts(id, &draft.ingredients, &mut tr).await?;
    set_recipe_tags(id, &draft.tags, &mut tr).await?;

    tr.commit().await.map_err(QueryError::from)?;
    log::info!("> User {author_id} created recipe {id}");
    Ok(id)
}

/// Applies `changes` to `recipe`. Both association sets are rebuilt from scratch.
pub async fn update_recipe(
    recipe: &Recipe,
    changes: RecipeChanges,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let mut tr = pool.begin().await.map_err(QueryError::from)?;

    sqlx::query(
        "
        UPDATE recipes SET
            name = COALESCE($1, name),
            image = COALESCE($2, image),
            description = COALESCE($3, description),
            cooking_time = COALESCE($4, cooking_time)
        WHERE id = $5
    ",
    )
    .bind(changes.name)
    .bind(changes.image)
    .bind(changes.description)
    .bind(changes.cooking_time)
    .bind(recipe.id)
    .execute(&mut *tr)
    .await
    .map_err(recipe_write_error)?;

    set_recipe_parts(recipe.id, &changes.ingredients, &mut tr).await?;
    set_recipe_tags(recipe.id, &changes.tags, &mut tr).await?;

    tr.commit().await.map_err(QueryError::from)?;
    Ok(())
}

/// ATTENTION: does not check ownership by itself, go through [`get_recipe_mut`].
pub async fn delete_recipe(recipe: &Recipe, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe.id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    log::info!("> Deleted recipe {}", recipe.id);
    Ok(())
}

/// Resolves authors, tags and ingredients for `rows` in three batched queries.
pub async fn compose_recipes(
    rows: Vec<RecipeRow>,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeDetail>, ApiError> {
    if rows.is_empty() {
        return Ok(vec![]);
    }

    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let mut author_ids: Vec<Uuid> = rows.iter().map(|row| row.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors = get_user_profiles(&author_ids, viewer, pool).await?;

    let mut tags: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for tag in list_recipe_tags(&ids, pool).await? {
        tags.entry(tag.recipe_id).or_default().push(tag.into());
    }

    let mut parts: HashMap<Uuid, Vec<RecipePart>> = HashMap::new();
    for part in list_recipe_parts(&ids, pool).await? {
        parts.entry(part.recipe_id).or_default().push(part);
    }

    rows.into_iter()
        .map(|row| -> Result<RecipeDetail, ApiError> {
            let author = authors.get(&row.author_id).cloned().ok_or_else(|| {
                ApiError::Internal(format!("Author {} of recipe {} is missing", row.author_id, row.id))
            })?;
            Ok(RecipeDetail {
                id: row.id,
                tags: tags.remove(&row.id).unwrap_or_default(),
                author,
                ingredients: parts.remove(&row.id).unwrap_or_default(),
                is_favorited: row.is_favorited,
                is_in_shopping_cart: row.is_in_shopping_cart,
                name: row.name,
                image: row.image,
                text: row.description,
                cooking_time: row.cooking_time,
            })
        })
        .collect()
}

pub async fn get_recipe_detail(
    id: Uuid,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<RecipeDetail, ApiError> {
    let row = get_recipe_row(id, viewer, pool)
        .await?
        .ok_or_else(ApiError::not_found)?;

    compose_recipes(vec![row], viewer, pool)
        .await?
        .pop()
        .ok_or_else(ApiError::not_found)
}
