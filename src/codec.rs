// Text encoding of the todo list

use crate::todo::Todo;
use eyre::{Context, Result, eyre};
use serde_json::Value;
use tracing::{debug, warn};

/// Serialize the list as a JSON array, preserving order
pub fn encode(todos: &[Todo]) -> Result<String> {
    serde_json::to_string(todos).context("Failed to serialize todo list")
}

/// A parsed list plus the number of elements that could not be read
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub todos: Vec<Todo>,
    pub skipped: usize,
}

/// Parse a stored list.
///
/// The value must be a JSON array. Elements that are not valid todos are left
/// out of `todos` and counted in `skipped`; the caller decides whether that
/// is acceptable.
pub fn decode(text: &str) -> Result<Decoded> {
    let value: Value = serde_json::from_str(text).context("Stored todo list is not valid JSON")?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(eyre!(
                "Stored todo list must be a JSON array, found {}",
                json_kind(&other)
            ));
        }
    };

    let total = items.len();
    let mut todos = Vec::with_capacity(total);

    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<Todo>(item) {
            Ok(todo) => todos.push(todo),
            Err(e) => {
                warn!(index, error = ?e, "Failed to parse todo");
            }
        }
    }

    let skipped = total - todos.len();
    debug!(total, skipped, "Decoded todo list");
    Ok(Decoded { todos, skipped })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
