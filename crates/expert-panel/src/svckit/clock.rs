//! Clock Tool

use agent_core::{Arguments, Result as CoreResult, Tool, ToolSpec};
use chrono::{Local, NaiveDateTime};

/// Tool reporting the local date and time
pub struct ClockTool;

impl ClockTool {
    fn describe(now: NaiveDateTime) -> String {
        format!("Current date and time: {}", now.format("%Y-%m-%d %H:%M:%S"))
    }
}

impl Tool for ClockTool {
    fn schema(&self) -> ToolSpec {
        ToolSpec::new(
            "current_time",
            "Get the current local date and time. Use it for any question about today's date or the time.",
            &[],
        )
    }

    fn execute(&self, _arguments: &Arguments) -> CoreResult<String> {
        Ok(Self::describe(Local::now().naive_local()))
    }
}
