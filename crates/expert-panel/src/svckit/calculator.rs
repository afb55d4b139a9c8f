//! Calculator Tool
//!
//! Four-operation arithmetic on two numbers.

use std::fmt;
use std::str::FromStr;

use agent_core::{
    tool::{number_arg, string_arg, ParameterSchema},
    Arguments, Result as CoreResult, Tool, ToolSpec, ERROR_MARKER,
};

use crate::error::PanelError;

/// Supported arithmetic operations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    pub const NAMES: [&'static str; 4] = ["add", "subtract", "multiply", "divide"];

    pub fn apply(self, a: f64, b: f64) -> Result<f64, PanelError> {
        let result = match self {
            Operation::Add => a + b,
            Operation::Subtract => a - b,
            Operation::Multiply => a * b,
            Operation::Divide if b == 0.0 => return Err(PanelError::DivisionByZero),
            Operation::Divide => a / b,
        };

        if result.is_finite() {
            Ok(result)
        } else {
            Err(PanelError::NotFinite(format!("{} {} {}", a, self, b)))
        }
    }
}

impl FromStr for Operation {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(Operation::Add),
            "subtract" => Ok(Operation::Subtract),
            "multiply" => Ok(Operation::Multiply),
            "divide" => Ok(Operation::Divide),
            other => Err(PanelError::UnknownOperation(other.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
        };
        f.write_str(name)
    }
}

/// Tool for basic arithmetic
pub struct CalculatorTool;

impl Tool for CalculatorTool {
    fn schema(&self) -> ToolSpec {
        ToolSpec::new(
            "calculator",
            "Perform a basic arithmetic operation. Use it whenever the user asks to calculate something.",
            &[
                ParameterSchema::new("operation", "string", "The operation to perform")
                    .required()
                    .with_enum(Operation::NAMES),
                ParameterSchema::new("a", "number", "First number").required(),
                ParameterSchema::new("b", "number", "Second number").required(),
            ],
        )
    }

    fn execute(&self, arguments: &Arguments) -> CoreResult<String> {
        let a = number_arg(arguments, "a")?;
        let b = number_arg(arguments, "b")?;
        let outcome = string_arg(arguments, "operation")?
            .parse::<Operation>()
            .and_then(|op| op.apply(a, b).map(|result| (op, result)));

        // Domain failures are results the model should read, not dispatch errors
        Ok(match outcome {
            Ok((op, result)) => format!("{} {} {} = {}", a, op, b, result),
            Err(e) => format!("{} {}", ERROR_MARKER, e),
        })
    }
}
