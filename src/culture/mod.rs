//! Culture Module
//!
//! Christmas dishes, carols and recipes obtained from a chat model.
//!
//! # Components
//! - `types`: domain types and `SearchMode`
//! - `prompts`: prompt text
//! - `parse`: reply decoding and validation
//! - `query`: model calls with retry

pub mod parse;
pub mod prompts;
pub mod query;
mod types;

pub use query::{query_cultural_data_with_retry, query_recipe_with_retry};
pub use types::{
    ChristmasCarol, CountryCulturalData, Dish, DishCategory, DishesResponse, Recipe, RecipeStep,
    SearchMode,
};
