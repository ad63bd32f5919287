use serde::Deserialize;

use crate::selector::{self, SelectorParseError};

pub const DEFAULT_FALLBACK_SELECTOR: &str = "html:not(.supports-touch)";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("fallbackSelector must not be empty when fallback is enabled")]
  EmptyFallbackSelector,
  #[error("rootSelectors[{index}] must not be empty")]
  EmptyRootSelector { index: usize },
  #[error("fallbackSelector `{selector}` is not a valid selector list")]
  InvalidFallbackSelector {
    selector: String,
    #[source]
    source: SelectorParseError,
  },
  #[error("invalid plugin options: {0}")]
  Json(#[from] serde_json::Error),
}

/// Plugin options, using the camelCase keys of the JSON form:
///
/// ```json
/// { "fallback": true, "fallbackSelector": ".no-hover", "rootSelectors": [".t-dark"] }
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct HoverMediaFeatureConfig {
  /// Emit a rule for devices without real hover support, gated by
  /// `fallback_selector`.
  pub fallback: bool,
  pub fallback_selector: String,
  /// Selectors that the fallback selector attaches to directly instead of
  /// being placed as an ancestor.
  pub root_selectors: Vec<String>,
}

impl Default for HoverMediaFeatureConfig {
  fn default() -> Self {
    Self {
      fallback: false,
      fallback_selector: DEFAULT_FALLBACK_SELECTOR.to_string(),
      root_selectors: Vec::new(),
    }
  }
}

impl HoverMediaFeatureConfig {
  pub fn from_json(json: &str) -> Result<Self, ConfigError> {
    Ok(serde_json::from_str(json)?)
  }

  pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
    Ok(serde_json::from_value(value)?)
  }

  /// Strip surrounding whitespace from every selector option. The fallback
  /// selector is matched and prefixed as written, so padding would change
  /// which rules it guards.
  pub fn trimmed(mut self) -> Self {
    self.fallback_selector = self.fallback_selector.trim().to_string();
    for root in &mut self.root_selectors {
      *root = root.trim().to_string();
    }
    self
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    let fallback_selector = self.fallback_selector.trim();
    if self.fallback && fallback_selector.is_empty() {
      return Err(ConfigError::EmptyFallbackSelector);
    }
    if !fallback_selector.is_empty() {
      selector::parse(fallback_selector).map_err(|source| {
        ConfigError::InvalidFallbackSelector {
          selector: self.fallback_selector.clone(),
          source,
        }
      })?;
    }
    if let Some(index) = self
      .root_selectors
      .iter()
      .position(|root| root.trim().is_empty())
    {
      return Err(ConfigError::EmptyRootSelector { index });
    }
    Ok(())
  }
}
