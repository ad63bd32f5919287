//! PostCSS-style plugin that moves `:hover` rules into
//! `@media (hover: hover)` so touch devices do not get stuck hover styles.
//!
//! ```
//! use hover_media_feature::HoverMediaFeature;
//! use postcss_lite::Processor;
//!
//! let result = Processor::new()
//!   .with_plugin(HoverMediaFeature::default())
//!   .process(".a:hover, .b {}")
//!   .unwrap();
//!
//! assert_eq!(result.css(), ".b {}@media (hover: hover) {.a:hover {}\n}");
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod plugin;
pub mod selector;

pub use classify::{classify, Classification};
pub use config::{ConfigError, HoverMediaFeatureConfig, DEFAULT_FALLBACK_SELECTOR};
pub use error::TransformError;
pub use plugin::{is_already_nested, HoverMediaFeature, RuleOutcome, SkipReason, PLUGIN_NAME};
pub use selector::{is_hover_selector, SelectorList, SelectorParseError};
