//! Configuration for the settlement engine

use serde::{Deserialize, Serialize};

/// Settlement engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Simplifier configuration
    pub simplifier: SimplifierConfig,

    /// Output configuration
    pub output: OutputConfig,
}

/// Which unresolved edge the consolidation loop picks next
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeSelection {
    /// First unresolved edge of a left-to-right scan
    First,
    /// Last unresolved edge of a left-to-right scan
    #[default]
    Last,
}

impl std::str::FromStr for EdgeSelection {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(EdgeSelection::First),
            "last" => Ok(EdgeSelection::Last),
            other => Err(crate::Error::Config(format!(
                "Unknown edge selection '{}', expected 'first' or 'last'",
                other
            ))),
        }
    }
}

/// Debt simplifier configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifierConfig {
    /// Edge selection policy for the consolidation loop
    pub selection: EdgeSelection,

    /// Cancel circular debts (A owes B owes C owes A)
    pub cancel_circulations: bool,

    /// Replace multi-hop chains by direct debtor-to-creditor transfers
    pub collapse_chains: bool,

    /// Check flow invariants after every max-flow pass
    pub verify_invariants: bool,
}

impl Default for SimplifierConfig {
    fn default() -> Self {
        Self {
            selection: EdgeSelection::Last,
            cancel_circulations: true,
            collapse_chains: true,
            verify_invariants: true,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty print JSON plans
    pub pretty_print: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty_print: true }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(selection) = std::env::var("SETTLE_EDGE_SELECTION") {
            config.simplifier.selection = selection.parse()?;
        }

        if let Ok(flag) = std::env::var("SETTLE_CANCEL_CIRCULATIONS") {
            config.simplifier.cancel_circulations = parse_flag("SETTLE_CANCEL_CIRCULATIONS", &flag)?;
        }

        if let Ok(flag) = std::env::var("SETTLE_COLLAPSE_CHAINS") {
            config.simplifier.collapse_chains = parse_flag("SETTLE_COLLAPSE_CHAINS", &flag)?;
        }

        if let Ok(flag) = std::env::var("SETTLE_VERIFY_INVARIANTS") {
            config.simplifier.verify_invariants = parse_flag("SETTLE_VERIFY_INVARIANTS", &flag)?;
        }

        if let Ok(flag) = std::env::var("SETTLE_PRETTY_PRINT") {
            config.output.pretty_print = parse_flag("SETTLE_PRETTY_PRINT", &flag)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject combinations that cannot produce a minimal plan
    pub fn validate(&self) -> crate::Result<()> {
        if self.simplifier.collapse_chains && !self.simplifier.cancel_circulations {
            return Err(crate::Error::Config(
                "collapse_chains requires cancel_circulations".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_flag(name: &str, value: &str) -> crate::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(crate::Error::Config(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.simplifier.selection, EdgeSelection::Last);
        assert!(config.simplifier.collapse_chains);
        assert!(config.output.pretty_print);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[simplifier]\nselection = \"first\"\n\n[output]\npretty_print = false").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.simplifier.selection, EdgeSelection::First);
        assert!(config.simplifier.cancel_circulations);
        assert!(!config.output.pretty_print);
    }

    #[test]
    fn test_from_file_rejects_unknown_selection() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[simplifier]\nselection = \"random\"").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_validate_rejects_collapse_without_cancel() {
        let mut config = Config::default();
        config.simplifier.cancel_circulations = false;
        assert!(config.validate().is_err());

        config.simplifier.collapse_chains = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_env() {
        // the only test touching SETTLE_* variables
        std::env::set_var("SETTLE_EDGE_SELECTION", "first");
        std::env::set_var("SETTLE_PRETTY_PRINT", "off");
        let config = Config::from_env().unwrap();
        assert_eq!(config.simplifier.selection, EdgeSelection::First);
        assert!(!config.output.pretty_print);
        assert!(config.simplifier.collapse_chains);

        std::env::set_var("SETTLE_VERIFY_INVARIANTS", "sometimes");
        let err = Config::from_env().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("SETTLE_VERIFY_INVARIANTS"));

        std::env::set_var("SETTLE_VERIFY_INVARIANTS", "true");
        std::env::set_var("SETTLE_CANCEL_CIRCULATIONS", "false");
        assert!(Config::from_env().is_err());

        for name in [
            "SETTLE_EDGE_SELECTION",
            "SETTLE_PRETTY_PRINT",
            "SETTLE_VERIFY_INVARIANTS",
            "SETTLE_CANCEL_CIRCULATIONS",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn test_parse_selection_and_flags() {
        assert_eq!("FIRST".parse::<EdgeSelection>().unwrap(), EdgeSelection::First);
        assert!("middle".parse::<EdgeSelection>().is_err());
        assert!(parse_flag("X", "on").unwrap());
        assert!(!parse_flag("X", "0").unwrap());
        assert!(parse_flag("X", "maybe").is_err());
    }
}
