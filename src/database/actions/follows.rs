use std::collections::HashMap;

use sqlx::{Pool, Postgres};

use crate::{
    actions::users::{fetch_followed_users, get_user_profile, user_exists},
    constants::ErrorMessage,
    error::{ApiError, QueryError},
    pagination::{PageContext, PageRequest},
    schema::{AuthoredRecipe, ShortRecipe, Subscription, UserProfile, Uuid},
};

async fn is_following(
    follower: Uuid,
    following: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM follows WHERE follower_id = $1 AND following_id = $2")
            .bind(follower)
            .bind(following)
            .fetch_optional(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(row.is_some())
}

/// An existing follow is reported before following oneself. The `no_self_follow` CHECK means
/// both cannot hold for rows in the table, so the order matters only for the messages.
fn check_follow(
    follower: Uuid,
    following: Uuid,
    already_following: bool,
) -> Result<(), ApiError> {
    if already_following {
        return Err(ApiError::conflict(ErrorMessage::AlreadySubscribed));
    }
    if follower == following {
        return Err(ApiError::bad_request(ErrorMessage::CannotFollowYourself));
    }
    Ok(())
}

/// Makes `follower` follow `following`. A missing target is checked first, then an
/// existing follow, then following oneself.
pub async fn subscribe(
    follower: Uuid,
    following: Uuid,
    recipes_limit: i64,
    pool: &Pool<Postgres>,
) -> Result<Subscription, ApiError> {
    if !user_exists(following, pool).await? {
        return Err(ApiError::not_found());
    }
    check_follow(
        follower,
        following,
        is_following(follower, following, pool).await?,
    )?;

    let result = sqlx::query(
        "INSERT INTO follows (follower_id, following_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(follower)
    .bind(following)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::conflict(ErrorMessage::AlreadySubscribed));
    }

    let profile = get_user_profile(following, Some(follower), pool)
        .await?
        .ok_or_else(ApiError::not_found)?;

    compose_subscriptions(vec![profile], recipes_limit, pool)
        .await?
        .pop()
        .ok_or_else(ApiError::not_found)
}

pub async fn unsubscribe(
    follower: Uuid,
    following: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    if !user_exists(following, pool).await? {
        return Err(ApiError::not_found());
    }

    let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
        .bind(follower)
        .bind(following)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NothingToDelete);
    }
    Ok(())
}

pub async fn fetch_subscriptions(
    follower: Uuid,
    recipes_limit: i64,
    request: PageRequest,
    pool: &Pool<Postgres>,
) -> Result<PageContext<Subscription>, ApiError> {
    let mut page = fetch_followed_users(follower, request, pool).await?;
    let profiles = std::mem::take(&mut page.results);
    let subscriptions = compose_subscriptions(profiles, recipes_limit, pool).await?;

    Ok(page.with_results(subscriptions))
}

/// Attaches each author's newest `recipes_limit` recipes and their recipe total.
pub async fn compose_subscriptions(
    profiles: Vec<UserProfile>,
    recipes_limit: i64,
    pool: &Pool<Postgres>,
) -> Result<Vec<Subscription>, ApiError> {
    if profiles.is_empty() {
        return Ok(vec![]);
    }
    let author_ids: Vec<Uuid> = profiles.iter().map(|profile| profile.id).collect();

    let counts: Vec<(Uuid, i64)> = sqlx::query_as(
        "SELECT author_id, COUNT(*) FROM recipes WHERE author_id = ANY($1) GROUP BY author_id",
    )
    .bind(&author_ids)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;
    let counts: HashMap<Uuid, i64> = counts.into_iter().collect();

    let previews: Vec<AuthoredRecipe> = sqlx::query_as(
        "
        SELECT author_id, id, name, image, cooking_time FROM (
            SELECT r.author_id, r.id, r.name, r.image, r.cooking_time,
                ROW_NUMBER() OVER (PARTITION BY r.author_id ORDER BY r.pub_date DESC, r.id DESC) AS position
            FROM recipes r
            WHERE r.author_id = ANY($1)
        ) ranked
        WHERE position <= $2
        ORDER BY author_id, position
    ",
    )
    .bind(&author_ids)
    .bind(recipes_limit)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let mut recipes: HashMap<Uuid, Vec<ShortRecipe>> = HashMap::new();
    for preview in previews {
        recipes
            .entry(preview.author_id)
            .or_default()
            .push(preview.into());
    }

    Ok(profiles
        .into_iter()
        .map(|profile| Subscription {
            recipes: recipes.remove(&profile.id).unwrap_or_default(),
            recipes_count: counts.get(&profile.id).copied().unwrap_or(0),
            user: profile,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn existing_follow_is_reported_before_self_follow() {
        let error = check_follow(7, 7, true).unwrap_err();
        assert_eq!(error.body(), json!({ "errors": "Already subscribed on author." }));

        let error = check_follow(7, 7, false).unwrap_err();
        assert_eq!(error.body(), json!({ "errors": "You cannot follow yourself." }));
    }

    #[test]
    fn fresh_follow_of_someone_else_passes() {
        assert!(check_follow(7, 8, false).is_ok());
        assert!(check_follow(7, 8, true).is_err());
    }
}
