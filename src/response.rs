//! Mutable response object threaded through engine operations.
//!
//! Validation failures append warnings here instead of aborting the whole
//! request batch; the request-handling boundary turns accumulated warnings
//! into a client-facing error payload.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Accumulated output of one client-triggered operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventOutput {
    /// Human-readable warnings collected while processing the request.
    pub warnings: Vec<String>,
    /// Recipe ids unlocked during this operation, echoed to the client.
    pub recipe_unlocked: HashMap<String, bool>,
}

impl EventOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a warning to the response payload.
    pub fn push_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Flag a recipe as unlocked in the client-facing payload.
    pub fn mark_recipe_unlocked(&mut self, recipe_id: impl Into<String>) {
        self.recipe_unlocked.insert(recipe_id.into(), true);
    }
}
