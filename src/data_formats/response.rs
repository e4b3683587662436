use serde::{Deserialize, Serialize};

use crate::models::{
    Ingredient, Profile, Recipe, RecipeIngredient, RecipeShort, RecipeWithRelations, Tag, User,
};

#[derive(Deserialize, Serialize, Debug)]
pub struct TokenResponse {
    pub auth_token: String,
}

/// Returned by registration: the new account, without relation flags.
#[derive(Deserialize, Serialize, Debug)]
pub struct RegisteredUserResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct UserResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub recipes: Vec<RecipeShortResponse>,
    pub recipes_count: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct IngredientResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct IngredientInRecipeResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RecipeShortResponse {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i64,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct RecipeResponse {
    pub id: i64,
    pub tags: Vec<TagResponse>,
    pub author: UserResponse,
    pub ingredients: Vec<IngredientInRecipeResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i64,
}

impl From<User> for RegisteredUserResponse {
    fn from(
        User {
            email,
            id,
            username,
            first_name,
            last_name,
            ..
        }: User,
    ) -> Self {
        RegisteredUserResponse {
            email,
            id,
            username,
            first_name,
            last_name,
        }
    }
}

impl From<Profile> for UserResponse {
    fn from(
        Profile {
            id,
            email,
            username,
            first_name,
            last_name,
            is_subscribed,
        }: Profile,
    ) -> Self {
        UserResponse {
            email,
            id,
            username,
            first_name,
            last_name,
            is_subscribed,
        }
    }
}

impl From<Tag> for TagResponse {
    fn from(Tag { id, name, color, slug }: Tag) -> Self {
        TagResponse {
            id,
            name,
            color,
            slug,
        }
    }
}

impl From<Ingredient> for IngredientResponse {
    fn from(
        Ingredient {
            id,
            name,
            measurement_unit,
        }: Ingredient,
    ) -> Self {
        IngredientResponse {
            id,
            name,
            measurement_unit,
        }
    }
}

impl From<RecipeIngredient> for IngredientInRecipeResponse {
    fn from(
        RecipeIngredient {
            id,
            name,
            measurement_unit,
            amount,
        }: RecipeIngredient,
    ) -> Self {
        IngredientInRecipeResponse {
            id,
            name,
            measurement_unit,
            amount,
        }
    }
}

impl From<RecipeShort> for RecipeShortResponse {
    fn from(
        RecipeShort {
            id,
            name,
            image,
            cooking_time,
        }: RecipeShort,
    ) -> Self {
        RecipeShortResponse {
            id,
            name,
            image,
            cooking_time,
        }
    }
}

impl SubscriptionResponse {
    pub fn new(author: Profile, recipes: Vec<RecipeShort>, recipes_count: i64) -> Self {
        SubscriptionResponse {
            user: author.into(),
            recipes: recipes.into_iter().map(Into::into).collect(),
            recipes_count,
        }
    }
}

impl From<RecipeWithRelations> for RecipeResponse {
    fn from(
        RecipeWithRelations {
            recipe,
            tags,
            ingredients,
        }: RecipeWithRelations,
    ) -> Self {
        let Recipe {
            id,
            name,
            image,
            text,
            cooking_time,
            author_id,
            author_email,
            author_username,
            author_first_name,
            author_last_name,
            author_is_subscribed,
            is_favorited,
            is_in_shopping_cart,
        } = recipe;
        RecipeResponse {
            id,
            tags: tags.into_iter().map(Into::into).collect(),
            author: UserResponse {
                email: author_email,
                id: author_id,
                username: author_username,
                first_name: author_first_name,
                last_name: author_last_name,
                is_subscribed: author_is_subscribed,
            },
            ingredients: ingredients.into_iter().map(Into::into).collect(),
            is_favorited,
            is_in_shopping_cart,
            name,
            image,
            text,
            cooking_time,
        }
    }
}
