use std::collections::HashSet;

use serde::Deserialize;

use crate::{
    constants::{
        ErrorMessage, MAX_COOKING_TIME, MAX_EMAIL_LENGTH, MAX_INGREDIENT_AMOUNT, MAX_NAME_LENGTH,
        MAX_PASSWORD_LENGTH, MIN_COOKING_TIME, MIN_INGREDIENT_AMOUNT,
    },
    error::{ApiError, FieldErrors},
    schema::Uuid,
};

// Every field is optional at the serde level so that a missing field is reported
// under its own name instead of failing the whole body.

#[derive(Deserialize, Debug, Clone, Default)]
pub struct IngredientAmount {
    pub id: Option<Uuid>,
    pub amount: Option<i64>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct RecipeForm {
    pub ingredients: Option<Vec<IngredientAmount>>,
    pub tags: Option<Vec<Uuid>>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
}

/// A fully validated recipe payload for creation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub name: String,
    pub image: String,
    pub description: String,
    pub cooking_time: i32,
    pub ingredients: Vec<(Uuid, i32)>,
    pub tags: Vec<Uuid>,
}

/// A validated update: absent scalars keep their stored values, the association
/// sets are always replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub cooking_time: Option<i32>,
    pub ingredients: Vec<(Uuid, i32)>,
    pub tags: Vec<Uuid>,
}

impl RecipeForm {
    pub fn validate_create(self) -> Result<RecipeDraft, ApiError> {
        let mut errors = FieldErrors::new();

        let name = required_text(&mut errors, "name", self.name, MAX_NAME_LENGTH);
        let image = required_text(&mut errors, "image", self.image, usize::MAX);
        let description = required_text(&mut errors, "text", self.text, usize::MAX);
        let cooking_time = match self.cooking_time {
            Some(value) => cooking_time(&mut errors, value),
            None => {
                errors.add("cooking_time", ErrorMessage::FieldRequired);
                None
            }
        };
        let ingredients = ingredients(&mut errors, self.ingredients);
        let tags = tags(&mut errors, self.tags);

        match (name, image, description, cooking_time) {
            (Some(name), Some(image), Some(description), Some(cooking_time))
                if errors.is_empty() =>
            {
                Ok(RecipeDraft {
                    name,
                    image,
                    description,
                    cooking_time,
                    ingredients,
                    tags,
                })
            }
            _ => Err(ApiError::Validation(errors)),
        }
    }

    pub fn validate_update(self) -> Result<RecipeChanges, ApiError> {
        let mut errors = FieldErrors::new();

        let name = self
            .name
            .and_then(|name| required_text(&mut errors, "name", Some(name), MAX_NAME_LENGTH));
        let image = self
            .image
            .and_then(|image| required_text(&mut errors, "image", Some(image), usize::MAX));
        let description = self
            .text
            .and_then(|text| required_text(&mut errors, "text", Some(text), usize::MAX));
        let cooking_time = self
            .cooking_time
            .and_then(|value| cooking_time(&mut errors, value));
        let ingredients = ingredients(&mut errors, self.ingredients);
        let tags = tags(&mut errors, self.tags);

        errors.finish(RecipeChanges {
            name,
            image,
            description,
            cooking_time,
            ingredients,
            tags,
        })
    }
}

fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max_length: usize,
) -> Option<String> {
    match value.map(|value| value.trim().to_owned()) {
        Some(value) if value.is_empty() => {
            errors.add(field, ErrorMessage::FieldRequired);
            None
        }
        Some(value) if value.chars().count() > max_length => {
            errors.add(field, ErrorMessage::FieldTooLong);
            None
        }
        Some(value) => Some(value),
        None => {
            errors.add(field, ErrorMessage::FieldRequired);
            None
        }
    }
}

fn cooking_time(errors: &mut FieldErrors, value: i64) -> Option<i32> {
    if value < MIN_COOKING_TIME as i64 || value > MAX_COOKING_TIME as i64 {
        errors.add("cooking_time", ErrorMessage::WrongCookingTime);
        return None;
    }
    Some(value as i32)
}

fn ingredients(
    errors: &mut FieldErrors,
    value: Option<Vec<IngredientAmount>>,
) -> Vec<(Uuid, i32)> {
    let value = match value {
        Some(value) => value,
        None => {
            errors.add("ingredients", ErrorMessage::FieldRequired);
            return vec![];
        }
    };
    if value.is_empty() {
        errors.add("ingredients", ErrorMessage::IngredientRequired);
        return vec![];
    }

    let mut seen = HashSet::new();
    let mut parts = Vec::with_capacity(value.len());
    for part in value {
        let (id, amount) = match (part.id, part.amount) {
            (Some(id), Some(amount)) => (id, amount),
            _ => {
                errors.add("ingredients", ErrorMessage::FieldRequired);
                continue;
            }
        };
        if !seen.insert(id) {
            errors.add("ingredients", ErrorMessage::DuplicateIngredient);
            continue;
        }
        if amount < MIN_INGREDIENT_AMOUNT as i64 || amount > MAX_INGREDIENT_AMOUNT as i64 {
            errors.add("ingredients", ErrorMessage::WrongIngredientAmount);
            continue;
        }
        parts.push((id, amount as i32));
    }
    parts
}

/// Repeated tag ids collapse into one association.
fn tags(errors: &mut FieldErrors, value: Option<Vec<Uuid>>) -> Vec<Uuid> {
    match value {
        Some(value) if !value.is_empty() => {
            let mut seen = HashSet::new();
            value.into_iter().filter(|id| seen.insert(*id)).collect()
        }
        Some(_) => {
            errors.add("tags", ErrorMessage::TagRequired);
            vec![]
        }
        None => {
            errors.add("tags", ErrorMessage::FieldRequired);
            vec![]
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct RegisterForm {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(self) -> Result<NewUser, ApiError> {
        let mut errors = FieldErrors::new();

        let email = required_text(&mut errors, "email", self.email, MAX_EMAIL_LENGTH);
        if let Some(email) = &email {
            if !is_email(email) {
                errors.add_text("email", "Enter a valid email address.");
            }
        }
        let username = required_text(&mut errors, "username", self.username, MAX_NAME_LENGTH);
        if let Some(username) = &username {
            if !is_username(username) {
                errors.add_text(
                    "username",
                    "Enter a valid username. Letters, digits and @/./+/-/_ only.",
                );
            }
        }
        let first_name = required_text(&mut errors, "first_name", self.first_name, MAX_NAME_LENGTH);
        let last_name = required_text(&mut errors, "last_name", self.last_name, MAX_NAME_LENGTH);
        let password = raw_password(&mut errors, "password", self.password);

        match (email, username, first_name, last_name, password) {
            (Some(email), Some(username), Some(first_name), Some(last_name), Some(password))
                if errors.is_empty() =>
            {
                Ok(NewUser {
                    email: email.to_lowercase(),
                    username,
                    first_name,
                    last_name,
                    password,
                })
            }
            _ => Err(ApiError::Validation(errors)),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct SetPasswordForm {
    pub new_password: Option<String>,
    pub current_password: Option<String>,
}

impl SetPasswordForm {
    /// Returns `(current_password, new_password)`.
    pub fn validate(self) -> Result<(String, String), ApiError> {
        let mut errors = FieldErrors::new();
        let current = raw_password(&mut errors, "current_password", self.current_password);
        let new = raw_password(&mut errors, "new_password", self.new_password);

        match (current, new) {
            (Some(current), Some(new)) if errors.is_empty() => Ok((current, new)),
            _ => Err(ApiError::Validation(errors)),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginForm {
    /// Returns `(email, password)`.
    pub fn validate(self) -> Result<(String, String), ApiError> {
        let mut errors = FieldErrors::new();
        let email = required_text(&mut errors, "email", self.email, MAX_EMAIL_LENGTH);
        let password = raw_password(&mut errors, "password", self.password);

        match (email, password) {
            (Some(email), Some(password)) if errors.is_empty() => {
                Ok((email.to_lowercase(), password))
            }
            _ => Err(ApiError::Validation(errors)),
        }
    }
}

/// Passwords are not trimmed.
fn raw_password(errors: &mut FieldErrors, field: &str, value: Option<String>) -> Option<String> {
    match value {
        Some(value) if value.is_empty() => {
            errors.add(field, ErrorMessage::FieldRequired);
            None
        }
        Some(value) if value.chars().count() > MAX_PASSWORD_LENGTH => {
            errors.add(field, ErrorMessage::FieldTooLong);
            None
        }
        Some(value) => Some(value),
        None => {
            errors.add(field, ErrorMessage::FieldRequired);
            None
        }
    }
}

fn is_email(value: &str) -> bool {
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !value.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}

fn is_username(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(cooking_time: i64, ingredients: &[(Uuid, i64)]) -> RecipeForm {
        RecipeForm {
            ingredients: Some(
                ingredients
                    .iter()
                    .map(|(id, amount)| IngredientAmount {
                        id: Some(*id),
                        amount: Some(*amount),
                    })
                    .collect(),
            ),
            tags: Some(vec![1, 2]),
            image: Some(String::from("data:image/png;base64,AAAA")),
            name: Some(String::from("Pancakes")),
            text: Some(String::from("Mix and fry.")),
            cooking_time: Some(cooking_time),
        }
    }

    fn field_errors(error: ApiError) -> FieldErrors {
        match error {
            ApiError::Validation(errors) => errors,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_payload_round_trips_into_a_draft() {
        let draft = form(30, &[(1, 200), (2, 50)]).validate_create().unwrap();
        assert_eq!(draft.name, "Pancakes");
        assert_eq!(draft.description, "Mix and fry.");
        assert_eq!(draft.cooking_time, 30);
        assert_eq!(draft.ingredients, vec![(1, 200), (2, 50)]);
        assert_eq!(draft.tags, vec![1, 2]);
    }

    #[test]
    fn cooking_time_bounds_are_inclusive() {
        assert!(form(MIN_COOKING_TIME as i64, &[(1, 1)]).validate_create().is_ok());
        assert!(form(MAX_COOKING_TIME as i64, &[(1, 1)]).validate_create().is_ok());

        for value in [MIN_COOKING_TIME as i64 - 1, MAX_COOKING_TIME as i64 + 1] {
            let errors = field_errors(form(value, &[(1, 1)]).validate_create().unwrap_err());
            assert_eq!(errors.messages("cooking_time"), ["Wrong cooking time."]);
        }
    }

    #[test]
    fn ingredient_amount_bounds_are_inclusive() {
        let low = MIN_INGREDIENT_AMOUNT as i64;
        let high = MAX_INGREDIENT_AMOUNT as i64;
        assert!(form(10, &[(1, low), (2, high)]).validate_create().is_ok());

        for amount in [low - 1, high + 1] {
            let errors = field_errors(form(10, &[(1, amount)]).validate_create().unwrap_err());
            assert_eq!(errors.messages("ingredients"), ["Wrong ingredients amount."]);
        }
    }

    #[test]
    fn duplicate_ingredient_is_rejected() {
        let errors = field_errors(
            form(10, &[(1, 100), (1, 200)])
                .validate_create()
                .unwrap_err(),
        );
        assert_eq!(errors.messages("ingredients"), ["Ingredients must not repeat."]);
    }

    #[test]
    fn empty_ingredient_list_is_rejected() {
        let errors = field_errors(form(10, &[]).validate_create().unwrap_err());
        assert!(errors.contains("ingredients"));
    }

    #[test]
    fn empty_tag_list_is_rejected_and_repeats_collapse() {
        let mut payload = form(10, &[(1, 1)]);
        payload.tags = Some(vec![]);
        assert!(field_errors(payload.validate_create().unwrap_err()).contains("tags"));

        let mut payload = form(10, &[(1, 1)]);
        payload.tags = Some(vec![3, 3, 1]);
        assert_eq!(payload.validate_create().unwrap().tags, vec![3, 1]);
    }

    #[test]
    fn missing_fields_are_reported_by_name() {
        let errors = field_errors(RecipeForm::default().validate_create().unwrap_err());
        for field in ["name", "image", "text", "cooking_time", "ingredients", "tags"] {
            assert!(errors.contains(field), "{field} should be reported");
        }
    }

    #[test]
    fn update_keeps_absent_scalars_but_requires_sets() {
        let changes = RecipeForm {
            ingredients: Some(vec![IngredientAmount {
                id: Some(4),
                amount: Some(5),
            }]),
            tags: Some(vec![2]),
            ..RecipeForm::default()
        }
        .validate_update()
        .unwrap();
        assert_eq!(changes.name, None);
        assert_eq!(changes.cooking_time, None);
        assert_eq!(changes.ingredients, vec![(4, 5)]);

        let errors = field_errors(RecipeForm::default().validate_update().unwrap_err());
        assert!(errors.contains("ingredients"));
        assert!(errors.contains("tags"));
        assert!(!errors.contains("name"));
    }

    #[test]
    fn update_validates_present_scalars() {
        let mut payload = form(0, &[(1, 1)]);
        payload.name = Some(String::from("   "));
        let errors = field_errors(payload.validate_update().unwrap_err());
        assert!(errors.contains("cooking_time"));
        assert!(errors.contains("name"));
    }

    #[test]
    fn registration_requires_every_field() {
        let errors = field_errors(RegisterForm::default().validate().unwrap_err());
        for field in ["email", "username", "first_name", "last_name", "password"] {
            assert!(errors.contains(field), "{field} should be reported");
        }
    }

    #[test]
    fn registration_checks_email_and_username_shape() {
        let form = RegisterForm {
            email: Some(String::from("not-an-email")),
            username: Some(String::from("bad name")),
            first_name: Some(String::from("Ann")),
            last_name: Some(String::from("Lee")),
            password: Some(String::from("secret")),
        };
        let errors = field_errors(form.validate().unwrap_err());
        assert!(errors.contains("email"));
        assert!(errors.contains("username"));

        let user = RegisterForm {
            email: Some(String::from("Ann@Example.com")),
            username: Some(String::from("ann.lee")),
            first_name: Some(String::from("Ann")),
            last_name: Some(String::from("Lee")),
            password: Some(String::from(" spaced ")),
        }
        .validate()
        .unwrap();
        assert_eq!(user.email, "ann@example.com");
        assert_eq!(user.password, " spaced ");
    }

    #[test]
    fn set_password_needs_both_passwords() {
        let errors = field_errors(
            SetPasswordForm {
                new_password: Some(String::from("next")),
                current_password: None,
            }
            .validate()
            .unwrap_err(),
        );
        assert!(errors.contains("current_password"));
        assert!(!errors.contains("new_password"));
    }
}
