//! Service Kit - Agent Tools
//!
//! Local tools that implement `agent_core::Tool` for the orchestrator and
//! the experts.

mod calculator;
mod calorie_counter;
mod clock;

pub use calculator::{CalculatorTool, Operation};
pub use calorie_counter::{CalorieCounterTool, CalorieReport, Ingredient, IngredientCalories};
pub use clock::ClockTool;
