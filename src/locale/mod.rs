//! Localised message lookup for user-facing error and status text.
//!
//! Messages are keyed by symbolic string with `{0}`/`{1}` positional
//! placeholders. A JSON file can override the built-in defaults so operators
//! can re-word or translate without recompiling. The engines themselves log
//! and warn in plain English; this table is for the text shown to players at
//! the request-handling boundary.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::errors::CoreError;

/// Message template table.
#[derive(Debug, Clone)]
pub struct Messages {
    templates: HashMap<String, String>,
}

impl Messages {
    /// Built-in default messages.
    pub fn default_messages() -> Self {
        let mut templates = HashMap::new();
        for (key, text) in [
            ("hideout-missing_recipe", "Unknown crafting recipe: {0}"),
            (
                "hideout-no_output_to_collect",
                "There is nothing to collect from this facility",
            ),
            ("trade-offer_no_longer_exists", "Offer {0} no longer exists"),
            (
                "trade-purchase_limit_exceeded",
                "You cannot buy {0} more of this item this restock (limit {1})",
            ),
            (
                "trade-insufficient_stock",
                "The trader only has {0} of this item left",
            ),
            ("trade-item_not_found", "Item {0} is not in your inventory"),
            ("trade-insufficient_funds", "You cannot afford this purchase"),
            ("profile-not_found", "Profile {0} does not exist"),
        ] {
            templates.insert(key.to_string(), text.to_string());
        }
        Self { templates }
    }

    /// Load overrides from a JSON object file, falling back to defaults for
    /// keys the file does not define.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let overrides: HashMap<String, String> =
            serde_json::from_str(&contents).map_err(|e| {
                CoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("Failed to parse {}: {}", path.as_ref().display(), e),
                ))
            })?;

        let mut messages = Self::default_messages();
        messages.templates.extend(overrides);
        Ok(messages)
    }

    /// Resolve a message by key, substituting positional arguments. An
    /// unknown key returns the key itself so a missing translation is visible
    /// rather than silent.
    pub fn get(&self, key: &str, args: &[&str]) -> String {
        let Some(template) = self.templates.get(key) else {
            log::warn!("Missing message template for key {key}");
            return key.to_string();
        };

        let mut text = template.clone();
        for (index, arg) in args.iter().enumerate() {
            text = text.replace(&format!("{{{index}}}"), arg);
        }
        text
    }

    /// Player-facing text for a core error.
    pub fn for_error(&self, error: &CoreError) -> String {
        match error {
            CoreError::RecipeNotFound(id) => self.get("hideout-missing_recipe", &[id]),
            CoreError::OfferNotFound(id) => self.get("trade-offer_no_longer_exists", &[id]),
            CoreError::PurchaseLimitExceeded { requested, limit, .. } => self.get(
                "trade-purchase_limit_exceeded",
                &[&requested.to_string(), &limit.to_string()],
            ),
            CoreError::InsufficientStock { stock, .. } => {
                self.get("trade-insufficient_stock", &[&stock.to_string()])
            }
            CoreError::ItemNotFound(id) => self.get("trade-item_not_found", &[id]),
            CoreError::InsufficientFunds { .. } => self.get("trade-insufficient_funds", &[]),
            CoreError::ProfileNotFound(id) => self.get("profile-not_found", &[id]),
            other => other.to_string(),
        }
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self::default_messages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_args_substituted() {
        let messages = Messages::default_messages();
        let text = messages.get("trade-purchase_limit_exceeded", &["3", "10"]);
        assert_eq!(
            text,
            "You cannot buy 3 more of this item this restock (limit 10)"
        );
    }

    #[test]
    fn unknown_key_returns_key() {
        let messages = Messages::default_messages();
        assert_eq!(messages.get("no-such-key", &[]), "no-such-key");
    }

    #[test]
    fn file_overrides_merge_over_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("messages.json");
        std::fs::write(
            &path,
            r#"{"trade-insufficient_funds": "Not enough roubles, friend"}"#,
        )
        .expect("write overrides");

        let messages = Messages::load(&path).expect("load");
        assert_eq!(
            messages.get("trade-insufficient_funds", &[]),
            "Not enough roubles, friend"
        );
        // Untouched keys keep their defaults
        assert_eq!(
            messages.get("profile-not_found", &["p9"]),
            "Profile p9 does not exist"
        );
    }

    #[test]
    fn error_mapping_produces_player_text() {
        let messages = Messages::default_messages();
        let error = CoreError::InsufficientStock {
            trader: "t1".to_string(),
            requested: 5,
            stock: 2,
        };
        assert_eq!(
            messages.for_error(&error),
            "The trader only has 2 of this item left"
        );
    }
}
