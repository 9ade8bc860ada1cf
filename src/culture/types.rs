//! Domain types: dishes, carols, recipes and search modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

// == Search Mode ==
/// Trade-off between latency and detail, mapped to a model name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Fast,
    Detailed,
}

impl SearchMode {
    /// Model used for this mode.
    pub fn model(&self) -> &'static str {
        match self {
            SearchMode::Fast => "gpt-3.5-turbo",
            SearchMode::Detailed => "o4-mini",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Fast => "fast",
            SearchMode::Detailed => "detailed",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fast" => Ok(SearchMode::Fast),
            "detailed" => Ok(SearchMode::Detailed),
            _ => Err(AppError::Validation(
                "Invalid mode. Must be 'fast' or 'detailed'".to_string(),
            )),
        }
    }
}

// == Dish ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DishCategory {
    Entry,
    Main,
    Dessert,
}

/// A famous Christmas dish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    pub name: String,
    /// One to three sentences
    pub description: String,
    pub ingredients: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<DishCategory>,
}

/// One dish per category; `None` where the country has none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DishesResponse {
    pub entry: Option<Dish>,
    pub main: Option<Dish>,
    pub dessert: Option<Dish>,
}

impl DishesResponse {
    /// True when no category has a dish.
    pub fn is_empty(&self) -> bool {
        self.entry.is_none() && self.main.is_none() && self.dessert.is_none()
    }

    /// Present dishes with their category.
    pub fn iter(&self) -> impl Iterator<Item = (DishCategory, &Dish)> {
        [
            (DishCategory::Entry, self.entry.as_ref()),
            (DishCategory::Main, self.main.as_ref()),
            (DishCategory::Dessert, self.dessert.as_ref()),
        ]
        .into_iter()
        .filter_map(|(category, dish)| dish.map(|d| (category, d)))
    }
}

// == Carol ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChristmasCarol {
    pub name: String,
    /// `None` for traditional or unknown authorship
    pub author: Option<String>,
    pub country: String,
}

/// Dishes, carol and carol link for one country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryCulturalData {
    pub dishes: DishesResponse,
    pub carol: Option<ChristmasCarol>,
    #[serde(default)]
    pub spotify_url: Option<String>,
}

// == Recipe ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeStep {
    pub step_number: u32,
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub steps: Vec<RecipeStep>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_mode_models() {
        assert_eq!(SearchMode::Fast.model(), "gpt-3.5-turbo");
        assert_eq!(SearchMode::Detailed.model(), "o4-mini");
        assert_eq!(SearchMode::default(), SearchMode::Fast);
    }

    #[test]
    fn test_search_mode_from_str() {
        assert_eq!("detailed".parse::<SearchMode>().unwrap(), SearchMode::Detailed);
        assert!(matches!(
            "turbo".parse::<SearchMode>(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_dish_serializes_type_field() {
        let dish = Dish {
            name: "Bûche de Noël".to_string(),
            description: "A yule log cake.".to_string(),
            ingredients: vec!["chocolate".to_string()],
            country: Some("France".to_string()),
            category: Some(DishCategory::Dessert),
        };
        let json = serde_json::to_value(&dish).unwrap();
        assert_eq!(json["type"], "dessert");
        assert_eq!(json["country"], "France");
    }

    #[test]
    fn test_dishes_iter_skips_missing() {
        let dish = Dish {
            name: "n".to_string(),
            description: "d".to_string(),
            ingredients: vec!["i".to_string()],
            country: None,
            category: None,
        };
        let dishes = DishesResponse {
            entry: None,
            main: Some(dish),
            dessert: None,
        };
        let categories: Vec<_> = dishes.iter().map(|(c, _)| c).collect();
        assert_eq!(categories, vec![DishCategory::Main]);
        assert!(!dishes.is_empty());
        assert!(DishesResponse::default().is_empty());
    }

    #[test]
    fn test_cultural_data_camel_case() {
        let data = CountryCulturalData {
            dishes: DishesResponse::default(),
            carol: None,
            spotify_url: Some("https://open.spotify.com/track/x".to_string()),
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["spotifyUrl"], "https://open.spotify.com/track/x");
        assert!(json["carol"].is_null());
    }
}
