use postcss_lite::{AtRule, Node, NodeAccess, Plugin, Rule, VisitContext};

use crate::classify::classify;
use crate::config::{ConfigError, HoverMediaFeatureConfig};
use crate::error::TransformError;
use crate::selector;

pub const PLUGIN_NAME: &str = "postcss-hover-media-feature";

const HOVER_MEDIA_PARAMS: &str = "(hover: hover)";
const HOVER_FEATURE: &str = "hover: hover";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
  /// Nothing in the selector list references `:hover`.
  NoHover,
  /// An ancestor at-rule already tests `hover: hover`.
  AlreadyNested,
  /// The selector already carries the fallback selector.
  FallbackRule,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleOutcome {
  Skipped(SkipReason),
  /// Hover branches moved out; the rule was swapped for one holding the rest.
  Replaced,
  /// Every branch referenced `:hover`, so the rule itself is gone.
  Removed,
}

/// Whether any ancestor of `rule` is an at-rule whose params mention
/// `hover: hover`.
pub fn is_already_nested(rule: &Rule) -> bool {
  let mut current = rule.parent();
  while let Some(node) = current {
    if let Some(at_rule) = AtRule::cast(node.clone()) {
      if at_rule.params().contains(HOVER_FEATURE) {
        return true;
      }
    }
    current = Node::parent_ref(&node);
  }
  false
}

/// Rewrites rules that use `:hover` so the hover styles only apply inside
/// `@media (hover: hover)`.
#[derive(Clone, Debug, Default)]
pub struct HoverMediaFeature {
  config: HoverMediaFeatureConfig,
}

impl HoverMediaFeature {
  pub fn new(config: HoverMediaFeatureConfig) -> Result<Self, ConfigError> {
    let config = config.trimmed();
    config.validate()?;
    Ok(Self { config })
  }

  pub fn from_json(json: &str) -> Result<Self, ConfigError> {
    Self::new(HoverMediaFeatureConfig::from_json(json)?)
  }

  pub fn config(&self) -> &HoverMediaFeatureConfig {
    &self.config
  }

  /// Prefix `hover_selector` with the fallback selector. Selectors starting
  /// with a root selector are joined into the same compound, everything else
  /// becomes a descendant of the fallback selector.
  pub fn fallback_selector_for(&self, hover_selector: &str) -> String {
    let fallback = &self.config.fallback_selector;
    let is_root = self
      .config
      .root_selectors
      .iter()
      .any(|root| hover_selector.starts_with(root.as_str()));
    if is_root {
      format!("{fallback}{hover_selector}")
    } else {
      format!("{fallback} {hover_selector}")
    }
  }

  fn skip_reason(&self, rule: &Rule, selector: &str) -> Option<SkipReason> {
    if !selector.contains(":hover") {
      return Some(SkipReason::NoHover);
    }
    if is_already_nested(rule) {
      return Some(SkipReason::AlreadyNested);
    }
    let fallback = &self.config.fallback_selector;
    if !fallback.is_empty() && selector.contains(fallback.as_str()) {
      return Some(SkipReason::FallbackRule);
    }
    None
  }

  /// Apply the rewrite to a single rule that is attached to a tree.
  pub fn transform_rule(&self, rule: &Rule) -> Result<RuleOutcome, TransformError> {
    self.rewrite(rule, || AtRule::with_params("media", HOVER_MEDIA_PARAMS))
  }

  #[tracing::instrument(
    level = "debug",
    skip_all,
    fields(plugin = PLUGIN_NAME, selector = %rule.selector())
  )]
  fn rewrite<F>(&self, rule: &Rule, create_media: F) -> Result<RuleOutcome, TransformError>
  where
    F: FnOnce() -> AtRule,
  {
    let selector = rule.selector();
    if let Some(reason) = self.skip_reason(rule, &selector) {
      tracing::debug!(?reason, "skipping rule");
      return Ok(RuleOutcome::Skipped(reason));
    }

    let list = selector::parse(&selector).map_err(|error| TransformError::parse(rule, error))?;
    let classification = classify(&list);
    if !classification.has_hover() {
      tracing::debug!(reason = ?SkipReason::NoHover, "skipping rule");
      return Ok(RuleOutcome::Skipped(SkipReason::NoHover));
    }

    let media = create_media();
    media.set_source(rule.source());
    media.append(
      rule
        .clone_with_selectors(&classification.hover_selectors)
        .node()
        .clone(),
    );
    rule.after([media.node().clone()]);

    if self.config.fallback {
      let fallback_selectors = classification
        .hover_selectors
        .iter()
        .map(|hover| self.fallback_selector_for(hover));
      let fallback = rule.clone_with_selectors(fallback_selectors);
      tracing::debug!(selector = %fallback.selector(), "inserting fallback rule");
      rule.before([fallback.node().clone()]);
    }

    if classification.non_hover_selectors.is_empty() {
      tracing::debug!("removing rule, all selectors moved");
      rule.remove();
      return Ok(RuleOutcome::Removed);
    }

    let replacement = rule.clone_with_selectors(&classification.non_hover_selectors);
    tracing::debug!(selector = %replacement.selector(), "replacing rule");
    rule.replace_with([replacement.node().clone()]);
    Ok(RuleOutcome::Replaced)
  }
}

impl Plugin for HoverMediaFeature {
  fn name(&self) -> &str {
    PLUGIN_NAME
  }

  fn visit_rule(&self, rule: &Rule, ctx: &mut VisitContext<'_>) -> anyhow::Result<()> {
    self.rewrite(rule, || ctx.at_rule("media", HOVER_MEDIA_PARAMS))?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use postcss_lite::parse;
  use pretty_assertions::assert_eq;

  use super::*;

  fn first_rule(css: &str) -> (postcss_lite::Root, Rule) {
    let root = parse(css).unwrap();
    let rule = Rule::cast(root.nodes()[0].clone()).unwrap();
    (root, rule)
  }

  fn nested_rule(root: &postcss_lite::Root) -> Rule {
    let mut found = None;
    root.walk_rules(|rule, _| {
      if rule.selector().contains(":hover") {
        found = Some(rule);
        return false;
      }
      true
    });
    found.unwrap()
  }

  #[test]
  fn reports_each_outcome() {
    let plugin = HoverMediaFeature::default();

    let (root, rule) = first_rule(".a:hover, .b {}");
    assert_eq!(plugin.transform_rule(&rule).unwrap(), RuleOutcome::Replaced);
    assert_eq!(root.to_css(), ".b {}@media (hover: hover) {.a:hover {}\n}");

    let (root, rule) = first_rule(".a:hover {}");
    assert_eq!(plugin.transform_rule(&rule).unwrap(), RuleOutcome::Removed);
    assert_eq!(root.to_css(), "@media (hover: hover) {.a:hover {}\n}");

    let (_, rule) = first_rule(".a {}");
    assert_eq!(
      plugin.transform_rule(&rule).unwrap(),
      RuleOutcome::Skipped(SkipReason::NoHover)
    );
  }

  #[test]
  fn escaped_hover_is_skipped_like_the_fast_path() {
    let plugin = HoverMediaFeature::default();
    let (root, rule) = first_rule(".x\\:hover {}");

    assert_eq!(
      plugin.transform_rule(&rule).unwrap(),
      RuleOutcome::Skipped(SkipReason::NoHover)
    );
    assert_eq!(root.to_css(), ".x\\:hover {}");
  }

  #[test]
  fn detects_hover_media_anywhere_up_the_chain() {
    let root =
      parse("@supports (display: grid) { @media (hover: hover) { .p { .a:hover {} } } }").unwrap();
    let rule = nested_rule(&root);

    assert!(is_already_nested(&rule));
    assert_eq!(
      HoverMediaFeature::default().transform_rule(&rule).unwrap(),
      RuleOutcome::Skipped(SkipReason::AlreadyNested)
    );

    let root = parse("@media (min-width: 10px) { .a:hover {} }").unwrap();
    assert!(!is_already_nested(&nested_rule(&root)));
  }

  #[test]
  fn skips_generated_fallback_rules() {
    let plugin = HoverMediaFeature::default();
    let (_, rule) = first_rule("html:not(.supports-touch) .a:hover {}");

    assert_eq!(
      plugin.transform_rule(&rule).unwrap(),
      RuleOutcome::Skipped(SkipReason::FallbackRule)
    );
  }

  #[test]
  fn empty_fallback_selector_disables_the_guard() {
    let plugin = HoverMediaFeature::new(HoverMediaFeatureConfig {
      fallback_selector: String::new(),
      ..Default::default()
    })
    .unwrap();
    let (_, rule) = first_rule(".a:hover {}");

    assert_eq!(plugin.transform_rule(&rule).unwrap(), RuleOutcome::Removed);
  }

  #[test]
  fn blank_fallback_selector_does_not_guard_every_rule() {
    let plugin = HoverMediaFeature::from_json(r#"{ "fallbackSelector": " " }"#).unwrap();
    let (root, rule) = first_rule(".a .b:hover {}");

    assert_eq!(plugin.config().fallback_selector, "");
    assert_eq!(plugin.transform_rule(&rule).unwrap(), RuleOutcome::Removed);
    assert_eq!(root.to_css(), "@media (hover: hover) {.a .b:hover {}\n}");
  }

  #[test]
  fn padded_fallback_selector_is_trimmed() {
    let plugin = HoverMediaFeature::new(HoverMediaFeatureConfig {
      fallback: true,
      fallback_selector: "  .no-hover ".into(),
      ..Default::default()
    })
    .unwrap();

    assert_eq!(plugin.fallback_selector_for(".a:hover"), ".no-hover .a:hover");
  }

  #[test]
  fn fallback_join_depends_on_root_selectors() {
    let plugin = HoverMediaFeature::new(HoverMediaFeatureConfig {
      fallback: true,
      root_selectors: vec![".t-dark".into()],
      ..Default::default()
    })
    .unwrap();

    assert_eq!(
      plugin.fallback_selector_for(".t-dark .a:hover"),
      "html:not(.supports-touch).t-dark .a:hover"
    );
    assert_eq!(
      plugin.fallback_selector_for(".a:hover"),
      "html:not(.supports-touch) .a:hover"
    );
  }

  #[test]
  fn parse_errors_leave_the_rule_alone() {
    let plugin = HoverMediaFeature::default();
    let (root, rule) = first_rule("a:hover > {}");

    let error = plugin.transform_rule(&rule).unwrap_err();

    let TransformError::Parse {
      selector,
      line,
      column,
      source,
      ..
    } = error;
    assert_eq!(selector, "a:hover >");
    assert_eq!((line, column), (Some(1), Some(1)));
    assert_eq!(source.selector, "a:hover >");
    assert_eq!(root.to_css(), "a:hover > {}");
  }
}
