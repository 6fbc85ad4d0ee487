use warp::{reject::Rejection, Filter};

use crate::{
    actions::recipes::RecipeFilter,
    constants::DEFAULT_RECIPES_LIMIT,
    error::ApiError,
    pagination::PageRequest,
    schema::Uuid,
};

/// Decoded query string, keeping repeated keys and the raw form for page links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
    raw: String,
}

impl QueryParams {
    pub fn new(pairs: Vec<(String, String)>, raw: String) -> Self {
        Self { pairs, raw }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// First value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn page_request(&self, default_size: i64) -> Result<PageRequest, ApiError> {
        PageRequest::parse(self.get("page"), self.get("limit"), default_size)
    }

    /// Unparsable filter values are ignored rather than rejected.
    pub fn recipe_filter(&self) -> RecipeFilter {
        RecipeFilter {
            tags: self
                .get_all("tags")
                .into_iter()
                .filter(|slug| !slug.is_empty())
                .map(str::to_owned)
                .collect(),
            author: self.get("author").and_then(|v| v.trim().parse::<Uuid>().ok()),
            is_favorited: self.get("is_favorited").and_then(parse_flag),
            is_in_shopping_cart: self.get("is_in_shopping_cart").and_then(parse_flag),
        }
    }

    /// Recipes shown per followed author. Absent or invalid means the default; zero is allowed.
    pub fn recipes_limit(&self) -> i64 {
        self.get("recipes_limit")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|limit| *limit >= 0)
            .unwrap_or(DEFAULT_RECIPES_LIMIT)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

pub fn with_query() -> impl Filter<Extract = (QueryParams,), Error = Rejection> + Clone {
    let raw = warp::query::raw()
        .or(warp::any().map(String::new))
        .unify();

    warp::query::<Vec<(String, String)>>()
        .and(raw)
        .map(QueryParams::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        QueryParams::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            String::new(),
        )
    }

    #[test]
    fn repeated_tags_are_kept() {
        let filter = params(&[("tags", "breakfast"), ("tags", "lunch"), ("author", "3")]).recipe_filter();
        assert_eq!(filter.tags, vec!["breakfast", "lunch"]);
        assert_eq!(filter.author, Some(3));
        assert_eq!(filter.is_favorited, None);
    }

    #[test]
    fn flags_accept_numbers_and_words() {
        let filter = params(&[("is_favorited", "1"), ("is_in_shopping_cart", "false")]).recipe_filter();
        assert_eq!(filter.is_favorited, Some(true));
        assert_eq!(filter.is_in_shopping_cart, Some(false));

        let garbage = params(&[("is_favorited", "maybe"), ("author", "me")]).recipe_filter();
        assert_eq!(garbage, RecipeFilter::default());
    }

    #[test]
    fn recipes_limit_defaults_to_one() {
        assert_eq!(params(&[]).recipes_limit(), 1);
        assert_eq!(params(&[("recipes_limit", "abc")]).recipes_limit(), 1);
        assert_eq!(params(&[("recipes_limit", "-2")]).recipes_limit(), 1);
        assert_eq!(params(&[("recipes_limit", "0")]).recipes_limit(), 0);
        assert_eq!(params(&[("recipes_limit", "5")]).recipes_limit(), 5);
    }

    #[tokio::test]
    async fn filter_collects_pairs_and_raw_query() {
        let query = warp::test::request()
            .path("/?tags=a&tags=b&page=2")
            .filter(&with_query())
            .await
            .unwrap();
        assert_eq!(query.get_all("tags"), vec!["a", "b"]);
        assert_eq!(query.raw(), "tags=a&tags=b&page=2");

        let empty = warp::test::request()
            .path("/")
            .filter(&with_query())
            .await
            .unwrap();
        assert_eq!(empty, QueryParams::default());
    }
}
