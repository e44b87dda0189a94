//! Command implementations for the userdb CLI

pub mod users;

use anyhow::Result;
use serde_json::Value;

/// Output mode shared by all commands
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    pub json: bool,
}

impl Output {
    /// Print `value` as JSON, or `text` otherwise.
    pub fn emit(&self, value: Value, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }
}
