//! Prompt text sent to the chat model.

// == Cultural Prompts ==
pub fn build_combined_prompt(country: &str) -> String {
    format!(
        r#"For the country "{country}", provide:
1. the most famous traditional dishes eaten during the Christmas holidays in JSON format
2. A famous Christmas carol from this country

For dishes, return exactly one dish for each category (entry/appetizer, main course, dessert) if available.
For each dish, include:
- name: string (dish name)
- description: string (brief 1-3 sentence description)
- ingredients: string[] (list of main ingredients)

For the Christmas carol, include:
- name: string (carol name)
- author: string | null (author/composer name if available, null if unknown/traditional)

Format the response as a JSON object with this structure:
{{
  "dishes": {{
    "entry": {{ "name": "...", "description": "...", "ingredients": [...] }} | null,
    "main": {{ "name": "...", "description": "...", "ingredients": [...] }} | null,
    "dessert": {{ "name": "...", "description": "...", "ingredients": [...] }} | null
  }},
  "carol": {{
    "name": "...",
    "author": "..." | null
  }} | null
}}

If a dish category has no famous dishes, set it to null. If no famous Christmas carol exists, set carol to null."#
    )
}

/// Stricter variant used after a reply failed to parse or validate.
pub fn build_refined_combined_prompt(country: &str) -> String {
    format!(
        "{}

IMPORTANT: You must respond with valid JSON only. Ensure:
- All required fields for dishes are present (name, description, ingredients)
- Ingredients is an array of strings (not a single string or object)
- Carol object has name field (required) and author field (null if unknown)
- JSON is properly formatted and parseable
- Dish categories without dishes are set to null
- Carol is set to null if no famous Christmas carol exists
- At least one dish category must be non-null OR carol must be non-null",
        build_combined_prompt(country)
    )
}

// == Recipe Prompt ==
pub fn build_recipe_prompt(dish: &str, country: &str) -> String {
    format!(
        r#"Provide a step-by-step recipe for "{dish}" from {country}.

Format the recipe as a JSON object with this structure:
{{
  "steps": [
    {{
      "stepNumber": 1,
      "instruction": "Step instruction text",
      "details": "Optional additional details, tips, or timing information"
    }}
  ]
}}

Each step should be clear and actionable. Include preparation time, cooking time, and serving size if relevant.
The recipe should be authentic to {country} cuisine and Christmas traditions.
The steps array must contain at least one step, and steps must be numbered sequentially starting from 1."#
    )
}
