//! Model queries with validation-driven retry.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clients::ChatModel;
use crate::culture::parse::{parse_combined_response, parse_recipe, validate_combined};
use crate::culture::prompts::{build_combined_prompt, build_recipe_prompt, build_refined_combined_prompt};
use crate::culture::types::{CountryCulturalData, DishCategory, DishesResponse, Recipe, SearchMode};
use crate::error::{AppError, Result};

const RECIPE_MAX_ATTEMPTS: u32 = 3;

// == Cultural Query ==
async fn ask_cultural(
    model: &dyn ChatModel,
    mode: SearchMode,
    prompt: &str,
    country: &str,
) -> Result<CountryCulturalData> {
    let reply = model.complete_json(mode.model(), prompt).await?;
    let data = parse_combined_response(&reply, country)?;
    if !validate_combined(&data) {
        return Err(AppError::InvalidResponse(
            "Invalid data: response does not meet validation requirements".to_string(),
        ));
    }
    Ok(data)
}

fn stamp_dishes(dishes: &mut DishesResponse, country: &str) {
    for (category, slot) in [
        (DishCategory::Entry, &mut dishes.entry),
        (DishCategory::Main, &mut dishes.main),
        (DishCategory::Dessert, &mut dishes.dessert),
    ] {
        if let Some(dish) = slot {
            dish.country = Some(country.to_string());
            dish.category = Some(category);
        }
    }
}

/// Asks the model for a country's dishes and carol.
///
/// A reply that fails to parse or validate gets exactly one retry with the
/// refined prompt. Upstream errors are returned as they are, with no retry.
pub async fn query_cultural_data_with_retry(
    model: &dyn ChatModel,
    country: &str,
    mode: SearchMode,
) -> Result<CountryCulturalData> {
    debug!(country, %mode, "querying cultural data");
    let first = ask_cultural(model, mode, &build_combined_prompt(country), country).await;

    let mut data = match first {
        Ok(data) => data,
        Err(AppError::InvalidResponse(reason)) => {
            warn!(country, %reason, "unusable reply, retrying with refined prompt");
            ask_cultural(model, mode, &build_refined_combined_prompt(country), country)
                .await
                .map_err(|err| match err {
                    AppError::InvalidResponse(reason) => AppError::InvalidResponse(format!(
                        "Failed to retrieve valid data after retry: {}",
                        reason
                    )),
                    other => other,
                })?
        }
        Err(err) => return Err(err),
    };

    stamp_dishes(&mut data.dishes, country);
    info!(
        country,
        dishes = data.dishes.iter().count(),
        carol = data.carol.is_some(),
        "cultural data ready"
    );
    Ok(data)
}

// == Recipe Query ==
/// Asks the model for a recipe.
///
/// Format problems are final. Retryable upstream errors get up to three
/// attempts, waiting `attempt * base_delay` between them.
pub async fn query_recipe_with_retry(
    model: &dyn ChatModel,
    dish: &str,
    country: &str,
    mode: SearchMode,
    base_delay: Duration,
) -> Result<Recipe> {
    let prompt = build_recipe_prompt(dish, country);
    let mut attempt = 1u32;

    loop {
        let outcome = match model.complete_json(mode.model(), &prompt).await {
            Ok(reply) => parse_recipe(&reply),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(recipe) => return Ok(recipe),
            Err(err) if !err.is_retryable() || attempt >= RECIPE_MAX_ATTEMPTS => {
                warn!(dish, country, attempt, error = %err, "recipe query failed");
                return Err(err);
            }
            Err(err) => {
                let delay = base_delay.saturating_mul(attempt);
                warn!(
                    dish,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "recipe query failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedModel, VALID_CULTURAL_JSON};
    use tokio_test::{assert_err, assert_ok};

    const INCOMPLETE: &str = r#"{"dishes": {"main": {"name": "Roast"}}, "carol": null}"#;
    const RECIPE: &str = r#"{"steps": [{"stepNumber": 1, "instruction": "Bake"}]}"#;

    fn throttled() -> AppError {
        AppError::Upstream {
            status: 429,
            message: "Service is temporarily unavailable. Please try again in a moment.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_valid_reply_needs_one_call_and_is_stamped() {
        let model = ScriptedModel::replying(&[VALID_CULTURAL_JSON]);

        let data = assert_ok!(query_cultural_data_with_retry(&model, "France", SearchMode::Fast).await);

        assert_eq!(model.calls(), 1);
        for (category, dish) in data.dishes.iter() {
            assert_eq!(dish.country.as_deref(), Some("France"));
            assert_eq!(dish.category, Some(category));
        }
    }

    #[tokio::test]
    async fn test_invalid_then_valid_uses_refined_prompt() {
        let model = ScriptedModel::replying(&[INCOMPLETE, VALID_CULTURAL_JSON]);

        let data = query_cultural_data_with_retry(&model, "France", SearchMode::Detailed)
            .await
            .unwrap();

        assert!(data.dishes.main.is_some());
        let prompts = model.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(!prompts[0].contains("IMPORTANT"));
        assert!(prompts[1].contains("IMPORTANT: You must respond with valid JSON only"));
    }

    #[tokio::test]
    async fn test_two_invalid_replies_fail_after_exactly_two_calls() {
        let model = ScriptedModel::replying(&["not json", INCOMPLETE, VALID_CULTURAL_JSON]);

        let err = assert_err!(query_cultural_data_with_retry(&model, "France", SearchMode::Fast).await);

        assert_eq!(model.calls(), 2);
        match err {
            AppError::InvalidResponse(msg) => {
                assert!(msg.starts_with("Failed to retrieve valid data after retry"), "{}", msg)
            }
            other => panic!("expected InvalidResponse, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upstream_error_is_not_retried() {
        let model = ScriptedModel::new(vec![
            Err(AppError::Authentication("Service configuration error. Please contact support.".to_string())),
            Ok(VALID_CULTURAL_JSON.to_string()),
        ]);

        let err = assert_err!(query_cultural_data_with_retry(&model, "France", SearchMode::Fast).await);

        assert!(matches!(err, AppError::Authentication(_)));
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_recipe_retries_retryable_errors() {
        let model = ScriptedModel::new(vec![Err(throttled()), Err(throttled()), Ok(RECIPE.to_string())]);

        let recipe = query_recipe_with_retry(&model, "Stollen", "Germany", SearchMode::Fast, Duration::from_millis(1))
            .await
            .unwrap();

        assert_eq!(recipe.steps[0].instruction, "Bake");
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn test_recipe_gives_up_after_three_attempts() {
        let model = ScriptedModel::new(vec![
            Err(throttled()),
            Err(throttled()),
            Err(throttled()),
            Ok(RECIPE.to_string()),
        ]);

        let err = query_recipe_with_retry(&model, "Stollen", "Germany", SearchMode::Fast, Duration::from_millis(1))
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn test_recipe_format_error_is_final() {
        let model = ScriptedModel::replying(&[r#"{"steps": []}"#, RECIPE]);

        let err = query_recipe_with_retry(&model, "Stollen", "Germany", SearchMode::Fast, Duration::from_millis(1))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidResponse(_)));
        assert_eq!(model.calls(), 1);
    }
}
