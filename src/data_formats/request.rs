use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::RequestError;

// ----------------- User Request -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SetPasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') || email.len() > 254 {
            return Err(RequestError::validation("Enter a valid email address"));
        }
        if self.username.is_empty() || self.username.chars().count() > 150 {
            return Err(RequestError::validation(
                "Username must be between 1 and 150 characters",
            ));
        }
        // Letters, digits and @ . + - _ only.
        if !self
            .username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            return Err(RequestError::validation(
                "Username may contain only letters, digits and @/./+/-/_",
            ));
        }
        if self.first_name.chars().count() > 150 || self.last_name.chars().count() > 150 {
            return Err(RequestError::validation(
                "First and last name must be at most 150 characters",
            ));
        }
        validate_password(&self.password)
    }
}

impl SetPasswordRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        validate_password(&self.new_password)
    }
}

fn validate_password(password: &str) -> Result<(), RequestError> {
    if password.is_empty() {
        return Err(RequestError::validation("Password must not be empty"));
    }
    Ok(())
}

// ----------------- Recipe Request -----------------
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmount {
    pub id: i64,
    pub amount: i64,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CreateRecipeRequest {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i64,
    pub tags: Vec<i64>,
    pub ingredients: Vec<IngredientAmount>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct UpdateRecipeRequest {
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<IngredientAmount>>,
}

impl CreateRecipeRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        validate_name(&self.name)?;
        validate_text(&self.text)?;
        validate_cooking_time(self.cooking_time)?;
        validate_tags(&self.tags)?;
        validate_ingredients(&self.ingredients)
    }
}

impl UpdateRecipeRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(text) = &self.text {
            validate_text(text)?;
        }
        if let Some(cooking_time) = self.cooking_time {
            validate_cooking_time(cooking_time)?;
        }
        if let Some(tags) = &self.tags {
            validate_tags(tags)?;
        }
        if let Some(ingredients) = &self.ingredients {
            validate_ingredients(ingredients)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), RequestError> {
    if name.trim().is_empty() || name.chars().count() > 256 {
        return Err(RequestError::validation(
            "Recipe name must be between 1 and 256 characters",
        ));
    }
    Ok(())
}

fn validate_text(text: &str) -> Result<(), RequestError> {
    if text.trim().is_empty() {
        return Err(RequestError::validation("Recipe text must not be empty"));
    }
    Ok(())
}

fn validate_cooking_time(cooking_time: i64) -> Result<(), RequestError> {
    if cooking_time < 1 {
        return Err(RequestError::validation(
            "Cooking time can't be less than 1 min",
        ));
    }
    Ok(())
}

fn validate_tags(tags: &[i64]) -> Result<(), RequestError> {
    if tags.is_empty() {
        return Err(RequestError::validation("At least one tag is required"));
    }
    let unique: HashSet<_> = tags.iter().collect();
    if unique.len() != tags.len() {
        return Err(RequestError::validation("Tags must not repeat"));
    }
    Ok(())
}

fn validate_ingredients(ingredients: &[IngredientAmount]) -> Result<(), RequestError> {
    if ingredients.is_empty() {
        return Err(RequestError::validation(
            "At least one ingredient is required",
        ));
    }
    let mut seen = HashSet::new();
    for ingredient in ingredients {
        if ingredient.amount < 1 {
            return Err(RequestError::validation(
                "Ingredient amount must be at least 1",
            ));
        }
        if !seen.insert(ingredient.id) {
            return Err(RequestError::validation("Ingredients must not repeat"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe() -> CreateRecipeRequest {
        CreateRecipeRequest {
            name: "Pancakes".into(),
            image: None,
            text: "Mix and fry".into(),
            cooking_time: 20,
            tags: vec![1, 2],
            ingredients: vec![
                IngredientAmount { id: 7, amount: 2 },
                IngredientAmount { id: 9, amount: 1 },
            ],
        }
    }

    #[test]
    fn valid_recipe_passes() {
        assert!(recipe().validate().is_ok());
    }

    #[test]
    fn zero_cooking_time_is_rejected() {
        let mut request = recipe();
        request.cooking_time = 0;
        assert!(matches!(
            request.validate(),
            Err(RequestError::Validation(_))
        ));
    }

    #[test]
    fn zero_amount_is_rejected() {
        let mut request = recipe();
        request.ingredients[1].amount = 0;
        assert!(request.validate().is_err());
    }

    #[test]
    fn repeated_ingredient_is_rejected() {
        let mut request = recipe();
        request.ingredients[1].id = 7;
        assert!(request.validate().is_err());
    }

    #[test]
    fn empty_update_is_valid() {
        assert!(UpdateRecipeRequest::default().validate().is_ok());
    }

    #[test]
    fn update_with_empty_tag_list_is_rejected() {
        let request = UpdateRecipeRequest {
            tags: Some(vec![]),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn username_with_spaces_is_rejected() {
        let request = RegisterRequest {
            email: "cook@example.com".into(),
            username: "the cook".into(),
            first_name: String::new(),
            last_name: String::new(),
            password: "secret-password".into(),
        };
        assert!(request.validate().is_err());
    }
}
