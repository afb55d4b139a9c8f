//! Expert Agents
//!
//! System prompts and constructors for the four specialists and the
//! orchestrator that routes to them.

use std::sync::Arc;

use agent_core::{Agent, AgentBuilder, GenerationOptions, LlmClient, ToolRegistry};

/// Math and logic specialist
pub const MATH_EXPERT: &str = "matematicas";
/// Writing and grammar specialist
pub const WRITING_EXPERT: &str = "escritura";
/// Programming specialist
pub const CODE_EXPERT: &str = "codigo";
/// Recipes and nutrition specialist, the only one with a tool
pub const COOKING_EXPERT: &str = "cocina";

pub const MATH_PROMPT: &str = r#"You are a mathematics expert. Your job is to:
- Solve mathematical problems step by step
- Explain concepts clearly
- Show the reasoning behind every step

Answer concisely but completely."#;

pub const WRITING_PROMPT: &str = r#"You are a writing and editing expert. Your job is to:
- Help draft clear and effective texts
- Correct and improve grammar
- Suggest better ways to express ideas

Answer concisely but completely."#;

pub const CODE_PROMPT: &str = r#"You are a programming expert. Your job is to:
- Write clean, well-documented code
- Explain programming concepts
- Help debug problems

Answer concisely. Use code examples when they help."#;

pub const COOKING_PROMPT: &str = r#"You are a friendly expert chef. Your job is to help create personalized recipes.

## Conversation Flow - follow these steps IN ORDER

1. When the user asks for a recipe, FIRST ask how many people it is for.
2. Once you know the servings, ask what kind of cuisine they prefer
   (Italian, Mexican, Asian, home-style, ...).
3. With that information, present the full recipe:
   - Name of the dish
   - Ingredients with quantities in GRAMS (needed for the calorie count)
   - Numbered preparation steps
   - Estimated preparation time
   Then say you will calculate the calories and call `calculate_calories`
   with the ingredients and servings.
4. After showing the calories, ask whether anyone has food allergies or
   dietary restrictions (gluten, lactose, nuts, shellfish, vegetarian, vegan, ...).
5. If there are restrictions, substitute the problematic ingredients, present
   the adapted recipe and recalculate with `calculate_calories`.
   If there are none, wish them a good meal.

## Rules

- Be warm and enthusiastic
- Always give quantities in grams
- Do not skip steps; if the user gives everything at once, adapt the flow
- For calories, ALWAYS use `calculate_calories`"#;

pub const ORCHESTRATOR_PROMPT: &str = r#"You are an intelligent assistant that orchestrates tasks.

Your job is to:
1. Understand what the user needs
2. Decide whether you can answer directly or need a tool
3. For simple calculations, use `calculator`
4. For questions about the date or time, use `current_time`
5. To count the calories of a recipe, use `calculate_calories`
6. For complex tasks that need expertise, use `consult_expert`:
   - matematicas: math problems and logic
   - escritura: writing and grammar
   - codigo: programming and debugging
   - cocina: recipes, nutrition and cooking advice

IMPORTANT:
- Use the available tools when appropriate
- Do not make information up; use the tools to obtain it
- For recipes and food, ALWAYS delegate to the cocina expert and pass the
  user's answers along unchanged while that conversation is in progress
- Be concise"#;

/// Settings shared by every agent in the panel
#[derive(Clone, Debug)]
pub struct PanelOptions {
    pub generation: GenerationOptions,
    pub max_iterations: usize,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            generation: GenerationOptions::default(),
            max_iterations: agent_core::reasoning::DEFAULT_MAX_ITERATIONS,
        }
    }
}

fn specialist(
    client: &Arc<dyn LlmClient>,
    name: &str,
    prompt: &str,
    tools: ToolRegistry,
    options: &PanelOptions,
) -> agent_core::Result<Agent> {
    AgentBuilder::new()
        .client(Arc::clone(client))
        .name(name)
        .system_prompt(prompt)
        .tools(tools)
        .generation(options.generation.clone())
        .max_iterations(options.max_iterations)
        .build()
}

/// The four experts, each with its own conversation
///
/// `tools` is the shared registry; the cooking expert receives only the
/// calorie counter from it.
pub fn standard_experts(
    client: &Arc<dyn LlmClient>,
    tools: &ToolRegistry,
    options: &PanelOptions,
) -> agent_core::Result<Vec<Agent>> {
    Ok(vec![
        specialist(client, MATH_EXPERT, MATH_PROMPT, ToolRegistry::new(), options)?,
        specialist(client, WRITING_EXPERT, WRITING_PROMPT, ToolRegistry::new(), options)?,
        specialist(client, CODE_EXPERT, CODE_PROMPT, ToolRegistry::new(), options)?,
        specialist(
            client,
            COOKING_EXPERT,
            COOKING_PROMPT,
            tools.subset(&["calculate_calories"]),
            options,
        )?,
    ])
}
