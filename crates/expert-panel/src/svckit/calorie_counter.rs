//! Calorie Counter Tool
//!
//! Estimates the calories of a recipe from its ingredients (in grams) using
//! the nutrition table, with a per-serving figure.

use std::fmt::Write as _;

use agent_core::{
    tool::{number_arg, ParameterSchema},
    Arguments, Result as CoreResult, Tool, ToolSpec,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::PanelError;
use crate::nutrition::{kcal_per_100g, DEFAULT_KCAL_PER_100G};

/// One recipe line as sent by the model
#[derive(Clone, Debug, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub grams: f64,
}

/// Calories attributed to one ingredient
#[derive(Clone, Debug)]
pub struct IngredientCalories {
    pub name: String,
    pub grams: f64,
    pub kcal: f64,
    /// Not in the table; the default density was used
    pub estimated: bool,
}

/// Result of a recipe estimate
#[derive(Clone, Debug)]
pub struct CalorieReport {
    pub lines: Vec<IngredientCalories>,
    pub total_kcal: f64,
    pub servings: f64,
}

impl CalorieReport {
    pub fn compute(ingredients: &[Ingredient], servings: f64) -> Self {
        let lines: Vec<IngredientCalories> = ingredients
            .iter()
            .map(|ingredient| {
                let name = ingredient.name.trim().to_lowercase();
                let (density, estimated) = match kcal_per_100g(&name) {
                    Some(density) => (density, false),
                    None => {
                        tracing::debug!(ingredient = %name, "Ingredient not in nutrition table, estimating");
                        (DEFAULT_KCAL_PER_100G, true)
                    }
                };
                IngredientCalories {
                    kcal: ingredient.grams * density / 100.0,
                    name,
                    grams: ingredient.grams,
                    estimated,
                }
            })
            .collect();

        let total_kcal = lines.iter().map(|line| line.kcal).sum();
        Self {
            lines,
            total_kcal,
            servings,
        }
    }

    /// Total divided by servings; the total when servings is not positive
    pub fn per_serving(&self) -> f64 {
        if self.servings > 0.0 {
            self.total_kcal / self.servings
        } else {
            self.total_kcal
        }
    }

    pub fn render(&self) -> String {
        let rule = "=".repeat(40);
        let mut out = format!("NUTRITION ANALYSIS\n{}\nBreakdown per ingredient:\n", rule);

        for line in &self.lines {
            if line.estimated {
                let _ = writeln!(out, "  - {}: {}g -> ~{:.0} kcal (estimated)", line.name, line.grams, line.kcal);
            } else {
                let _ = writeln!(out, "  - {}: {}g -> {:.0} kcal", line.name, line.grams, line.kcal);
            }
        }

        let _ = write!(
            out,
            "\n{}\nTotal calories: {:.0} kcal\nServings: {}\nCalories per serving: {:.0} kcal\n",
            rule,
            self.total_kcal,
            self.servings,
            self.per_serving()
        );
        out
    }
}

fn parse_ingredients(value: Option<&Value>) -> Result<Vec<Ingredient>, PanelError> {
    let value = value.ok_or_else(|| PanelError::InvalidIngredient("'ingredients' is required".into()))?;
    let ingredients: Vec<Ingredient> =
        serde_json::from_value(value.clone()).map_err(|e| PanelError::InvalidIngredient(e.to_string()))?;

    for ingredient in &ingredients {
        if ingredient.name.trim().is_empty() {
            return Err(PanelError::InvalidIngredient("ingredient name is empty".into()));
        }
        if !ingredient.grams.is_finite() || ingredient.grams < 0.0 {
            return Err(PanelError::InvalidIngredient(format!(
                "'{}' has an invalid weight of {}g",
                ingredient.name, ingredient.grams
            )));
        }
    }
    Ok(ingredients)
}

/// Tool estimating recipe calories
pub struct CalorieCounterTool;

impl Tool for CalorieCounterTool {
    fn schema(&self) -> ToolSpec {
        ToolSpec::new(
            "calculate_calories",
            "Estimate the calories of a recipe or list of ingredients. ALWAYS use it after presenting a recipe.",
            &[
                ParameterSchema::new("ingredients", "array", "Ingredients with their quantities in grams")
                    .required()
                    .with_items(json!({
                        "type": "object",
                        "properties": {
                            "name": {"type": "string", "description": "Ingredient name"},
                            "grams": {"type": "number", "description": "Quantity in grams"}
                        },
                        "required": ["name", "grams"]
                    })),
                ParameterSchema::new("servings", "number", "Number of servings the recipe is divided into").required(),
            ],
        )
    }

    fn execute(&self, arguments: &Arguments) -> CoreResult<String> {
        let ingredients = parse_ingredients(arguments.get("ingredients"))?;
        let servings = number_arg(arguments, "servings")?;
        let report = CalorieReport::compute(&ingredients, servings);
        if !report.total_kcal.is_finite() {
            return Err(PanelError::NotFinite("the calorie total".into()).into());
        }
        Ok(report.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> Arguments {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_known_ingredients() {
        let out = CalorieCounterTool
            .execute(&args(json!({
                "ingredients": [
                    {"name": "Chicken Breast", "grams": 200},
                    {"name": "rice", "grams": 100}
                ],
                "servings": 2
            })))
            .unwrap();

        assert!(out.contains("  - chicken breast: 200g -> 330 kcal\n"));
        assert!(out.contains("  - rice: 100g -> 130 kcal\n"));
        assert!(out.contains("Total calories: 460 kcal"));
        assert!(out.contains("Servings: 2\n"));
        assert!(out.contains("Calories per serving: 230 kcal"));
    }

    #[test]
    fn test_unknown_ingredient_is_estimated_and_counted() {
        let report = CalorieReport::compute(
            &[
                Ingredient { name: "dragon fruit".into(), grams: 50.0 },
                Ingredient { name: "butter".into(), grams: 10.0 },
            ],
            1.0,
        );

        assert!(report.lines[0].estimated);
        assert!((report.lines[0].kcal - 50.0).abs() < 1e-9);
        assert!((report.total_kcal - 121.7).abs() < 1e-9);
        assert!(report.render().contains("dragon fruit: 50g -> ~50 kcal (estimated)"));
    }

    #[test]
    fn test_non_positive_servings() {
        let ingredients = [Ingredient { name: "oats".into(), grams: 100.0 }];
        assert!((CalorieReport::compute(&ingredients, 0.0).per_serving() - 389.0).abs() < 1e-9);
        assert!((CalorieReport::compute(&ingredients, -3.0).per_serving() - 389.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_arguments() {
        let missing_grams = args(json!({"ingredients": [{"name": "rice"}], "servings": 1}));
        assert!(CalorieCounterTool.execute(&missing_grams).is_err());

        let negative = args(json!({"ingredients": [{"name": "rice", "grams": -5}], "servings": 1}));
        assert!(CalorieCounterTool.execute(&negative).is_err());

        let not_a_list = args(json!({"ingredients": "rice", "servings": 1}));
        assert!(CalorieCounterTool.execute(&not_a_list).is_err());
    }

    #[test]
    fn test_non_finite_servings_rejected() {
        let infinite = args(json!({"ingredients": [{"name": "rice", "grams": 100}], "servings": "inf"}));
        assert!(CalorieCounterTool.execute(&infinite).is_err());

        let registry = crate::standard_tools().unwrap();
        let out = registry.invoke("calculate_calories", &infinite);
        assert!(out.starts_with("Error:"));

        let huge = args(json!({"ingredients": [{"name": "oil", "grams": 1e308}], "servings": 1}));
        assert!(CalorieCounterTool.execute(&huge).is_err());
    }

    #[test]
    fn test_schema_describes_items() {
        let spec = CalorieCounterTool.schema();
        let items = &spec.parameters["properties"]["ingredients"]["items"];
        assert_eq!(items["required"], json!(["name", "grams"]));
    }
}
