//! Decoding and validation of model replies.

use serde::Deserialize;
use serde_json::Value;

use crate::culture::types::{ChristmasCarol, CountryCulturalData, Dish, DishesResponse, Recipe, RecipeStep};
use crate::error::{AppError, Result};

// == Combined Reply ==
#[derive(Debug, Default, Deserialize)]
struct RawDish {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    ingredients: Vec<String>,
}

impl From<RawDish> for Dish {
    fn from(raw: RawDish) -> Self {
        Dish {
            name: raw.name,
            description: raw.description,
            ingredients: raw.ingredients,
            country: None,
            category: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawDishes {
    #[serde(default)]
    entry: Option<RawDish>,
    #[serde(default)]
    main: Option<RawDish>,
    #[serde(default)]
    dessert: Option<RawDish>,
}

impl From<RawDishes> for DishesResponse {
    fn from(raw: RawDishes) -> Self {
        DishesResponse {
            entry: raw.entry.map(Dish::from),
            main: raw.main.map(Dish::from),
            dessert: raw.dessert.map(Dish::from),
        }
    }
}

fn parse_error(reason: impl std::fmt::Display) -> AppError {
    AppError::InvalidResponse(format!("Failed to parse combined response: {}", reason))
}

/// Decodes a dishes-and-carol reply.
///
/// Dishes are read from a `dishes` object, or from top-level
/// `entry`/`main`/`dessert` keys when the model flattens them. Shape checks
/// on the dishes themselves are left to [`validate_combined`].
pub fn parse_combined_response(reply: &str, country: &str) -> Result<CountryCulturalData> {
    let root: Value = serde_json::from_str(reply).map_err(parse_error)?;
    let object = root
        .as_object()
        .ok_or_else(|| parse_error("Invalid response format: expected object"))?;

    let raw_dishes = match object.get("dishes") {
        Some(dishes @ Value::Object(_)) => RawDishes::deserialize(dishes).map_err(parse_error)?,
        _ if ["entry", "main", "dessert"].iter().any(|k| object.contains_key(*k)) => {
            RawDishes::deserialize(&root).map_err(parse_error)?
        }
        _ => return Err(parse_error("Invalid response format: missing dishes data")),
    };

    Ok(CountryCulturalData {
        dishes: raw_dishes.into(),
        carol: object.get("carol").and_then(|c| parse_carol(c, country)),
        spotify_url: None,
    })
}

// == Carol ==
/// Reads a carol, or `None` when the value is not an object with a name.
///
/// A blank or non-string author is treated as unknown.
pub fn parse_carol(value: &Value, country: &str) -> Option<ChristmasCarol> {
    let carol = value.as_object()?;
    let name = carol
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())?;
    let author = carol
        .get("author")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string);

    Some(ChristmasCarol {
        name: name.to_string(),
        author,
        country: country.to_string(),
    })
}

// == Validation ==
fn is_complete(dish: &Dish) -> bool {
    !dish.name.trim().is_empty()
        && !dish.description.trim().is_empty()
        && !dish.ingredients.is_empty()
        && dish.ingredients.iter().all(|i| !i.trim().is_empty())
}

/// Every present dish is complete, and at least one dish or the carol exists.
pub fn validate_combined(data: &CountryCulturalData) -> bool {
    let has_dishes = !data.dishes.is_empty();
    if has_dishes && !data.dishes.iter().all(|(_, dish)| is_complete(dish)) {
        return false;
    }
    let carol_ok = data
        .carol
        .as_ref()
        .map(|c| !c.name.trim().is_empty())
        .unwrap_or(false);
    has_dishes || carol_ok
}

// == Recipe Reply ==
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStep {
    #[serde(default)]
    step_number: Value,
    #[serde(default)]
    instruction: Value,
    #[serde(default)]
    details: Value,
}

#[derive(Debug, Deserialize)]
struct RawRecipe {
    #[serde(default)]
    steps: Value,
}

fn recipe_format(reason: String) -> AppError {
    AppError::InvalidResponse(format!("Invalid recipe format: {}", reason))
}

/// Any whole JSON number from 1 up, whether written `2` or `2.0`.
fn step_number(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok().filter(|n| *n >= 1);
    }
    let n = value.as_f64()?;
    if n >= 1.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) {
        Some(n as u32)
    } else {
        None
    }
}

/// Details pass through as text; non-string values keep their JSON form.
fn details_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s).filter(|d| !d.trim().is_empty()),
        other => Some(other.to_string()),
    }
}

/// Decodes and checks a recipe reply. Every failure is `InvalidResponse`.
pub fn parse_recipe(reply: &str) -> Result<Recipe> {
    let raw: RawRecipe = serde_json::from_str(reply)
        .map_err(|_| AppError::InvalidResponse("Invalid JSON response from model".to_string()))?;
    let raw_steps = match raw.steps {
        Value::Array(steps) => steps,
        _ => return Err(recipe_format("missing steps array".to_string())),
    };
    if raw_steps.is_empty() {
        return Err(recipe_format("steps array is empty".to_string()));
    }

    raw_steps
        .into_iter()
        .enumerate()
        .map(|(i, step)| {
            let position = i + 1;
            let step: RawStep = serde_json::from_value(step)
                .map_err(|_| recipe_format(format!("step {} is not an object", position)))?;
            let step_number = step_number(&step.step_number)
                .ok_or_else(|| recipe_format(format!("step {} has invalid stepNumber", position)))?;
            let instruction = step
                .instruction
                .as_str()
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
                .ok_or_else(|| recipe_format(format!("step {} has invalid instruction", position)))?;
            Ok(RecipeStep {
                step_number,
                instruction,
                details: details_text(step.details),
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(|steps| Recipe { steps })
}
