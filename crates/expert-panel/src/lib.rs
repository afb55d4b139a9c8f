//! # expert-panel
//!
//! The concrete assistant: local tools, four expert agents and an
//! orchestrator that answers directly, calls a tool, or delegates.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Orchestrator                           │
//! │   calculator · current_time · calculate_calories            │
//! │   consult_expert(expert_type, query)                        │
//! └─────────────────────────────────────────────────────────────┘
//!        │               │               │               │
//!        ▼               ▼               ▼               ▼
//!  ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────────┐
//!  │matematicas│  │ escritura │  │  codigo   │  │    cocina     │
//!  │  (plain)  │  │  (plain)  │  │  (plain)  │  │ + calories    │
//!  └───────────┘  └───────────┘  └───────────┘  └───────────────┘
//! ```

pub mod error;
pub mod experts;
pub mod nutrition;
pub mod svckit;

use std::sync::Arc;

use agent_core::{LlmClient, Orchestrator, ToolRegistry};

pub use error::{PanelError, Result};
pub use experts::PanelOptions;

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{CalculatorTool, CalorieCounterTool, ClockTool};
}

/// Registry with every local tool, in declaration order
pub fn standard_tools() -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(svckit::CalculatorTool)?;
    registry.register(svckit::ClockTool)?;
    registry.register(svckit::CalorieCounterTool)?;
    Ok(registry)
}

/// Orchestrator with the standard tools and the four experts
pub fn standard_orchestrator(client: Arc<dyn LlmClient>, options: &PanelOptions) -> Result<Orchestrator> {
    let tools = Arc::new(standard_tools()?);
    let experts = experts::standard_experts(&client, &tools, options)?;

    let mut builder = Orchestrator::builder()
        .client(client)
        .shared_tools(tools)
        .system_prompt(experts::ORCHESTRATOR_PROMPT)
        .generation(options.generation.clone())
        .max_iterations(options.max_iterations);
    for expert in experts {
        builder = builder.expert(expert);
    }

    let orchestrator = builder.build()?;
    tracing::debug!(experts = ?orchestrator.expert_names(), "Expert panel ready");
    Ok(orchestrator)
}
