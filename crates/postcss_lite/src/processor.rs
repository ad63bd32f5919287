use std::sync::Arc;

use crate::ast::nodes::{AtRule, Root, Rule};
use crate::ast::NodeRef;
use crate::css_syntax_error::CssSyntaxError;
use crate::parse::parse_with_file;
use crate::result::{ProcessResult, Warning};

#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
  #[error(transparent)]
  Syntax(#[from] CssSyntaxError),
  #[error("{plugin}: {source}")]
  Plugin {
    plugin: String,
    #[source]
    source: anyhow::Error,
  },
}

/// Handed to plugin visitors alongside the node being visited.
pub struct VisitContext<'a> {
  plugin: &'a str,
  warnings: &'a mut Vec<Warning>,
}

impl<'a> VisitContext<'a> {
  pub fn new(plugin: &'a str, warnings: &'a mut Vec<Warning>) -> Self {
    Self { plugin, warnings }
  }

  pub fn plugin(&self) -> &str {
    self.plugin
  }

  /// Create a detached at-rule for the plugin to insert.
  pub fn at_rule(&self, name: &str, params: &str) -> AtRule {
    AtRule::with_params(name, params)
  }

  pub fn warn(&mut self, node: &NodeRef, text: impl Into<String>) {
    self.warnings.push(Warning::new(
      text,
      Some(self.plugin.to_string()),
      Some(node),
    ));
  }
}

pub trait Plugin: Send + Sync {
  fn name(&self) -> &str;

  fn visit_rule(&self, _rule: &Rule, _ctx: &mut VisitContext<'_>) -> anyhow::Result<()> {
    Ok(())
  }

  fn visit_at_rule(&self, _at_rule: &AtRule, _ctx: &mut VisitContext<'_>) -> anyhow::Result<()> {
    Ok(())
  }
}

/// Runs plugins over a stylesheet. Each plugin gets one depth-first walk of
/// the tree. A visitor error is recorded as a warning against the node and
/// the walk moves on, unless the processor is strict.
#[derive(Clone, Default)]
pub struct Processor {
  plugins: Vec<Arc<dyn Plugin>>,
  strict: bool,
}

impl Processor {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_plugin<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Arc::new(plugin));
    self
  }

  /// Abort on the first visitor error instead of recording a warning.
  pub fn strict(mut self, strict: bool) -> Self {
    self.strict = strict;
    self
  }

  pub fn process(&self, css: &str) -> Result<ProcessResult, ProcessorError> {
    self.process_with_file(css, None)
  }

  pub fn process_with_file(
    &self,
    css: &str,
    file: Option<String>,
  ) -> Result<ProcessResult, ProcessorError> {
    let root = parse_with_file(css, file)?;
    self.process_root(root)
  }

  pub fn process_root(&self, root: Root) -> Result<ProcessResult, ProcessorError> {
    let mut result = ProcessResult::new(root);
    for plugin in &self.plugins {
      tracing::debug!(plugin = plugin.name(), "running plugin");
      self.run_plugin(plugin.as_ref(), &result.root, &mut result.warnings)?;
    }
    Ok(result)
  }

  fn run_plugin(
    &self,
    plugin: &dyn Plugin,
    root: &Root,
    warnings: &mut Vec<Warning>,
  ) -> Result<(), ProcessorError> {
    let name = plugin.name();
    let mut failure = None;

    root.walk(|node, _| {
      let mut ctx = VisitContext::new(name, warnings);
      let visited = if let Some(rule) = Rule::cast(node.clone()) {
        plugin.visit_rule(&rule, &mut ctx)
      } else if let Some(at_rule) = AtRule::cast(node.clone()) {
        plugin.visit_at_rule(&at_rule, &mut ctx)
      } else {
        Ok(())
      };

      match visited {
        Ok(()) => true,
        Err(error) if self.strict => {
          failure = Some(error);
          false
        }
        Err(error) => {
          tracing::warn!(plugin = name, error = %error, "plugin failed on node, continuing");
          warnings.push(Warning::new(
            error.to_string(),
            Some(name.to_string()),
            Some(&node),
          ));
          true
        }
      }
    });

    match failure {
      Some(source) => Err(ProcessorError::Plugin {
        plugin: name.to_string(),
        source,
      }),
      None => Ok(()),
    }
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::ast::NodeAccess;

  struct Wrap;

  impl Plugin for Wrap {
    fn name(&self) -> &str {
      "wrap"
    }

    fn visit_rule(&self, rule: &Rule, ctx: &mut VisitContext<'_>) -> anyhow::Result<()> {
      if !rule.selector().ends_with(":hover") {
        return Ok(());
      }
      let parent_is_media = rule
        .parent()
        .and_then(AtRule::cast)
        .is_some_and(|parent| parent.name() == "media");
      if parent_is_media {
        return Ok(());
      }
      let media = ctx.at_rule("media", "(hover: hover)");
      media.append(rule.clone_node());
      rule.after([media.node().clone()]);
      rule.remove();
      Ok(())
    }
  }

  struct Reject;

  impl Plugin for Reject {
    fn name(&self) -> &str {
      "reject"
    }

    fn visit_rule(&self, rule: &Rule, _ctx: &mut VisitContext<'_>) -> anyhow::Result<()> {
      if rule.selector() == "bad" {
        anyhow::bail!("cannot handle {}", rule.selector());
      }
      rule.set_selector(format!("{}-seen", rule.selector()));
      Ok(())
    }
  }

  #[test]
  fn runs_plugins_over_parsed_css() {
    let result = Processor::new()
      .with_plugin(Wrap)
      .process("a:hover {}\nb {}")
      .unwrap();

    assert_eq!(result.css(), "@media (hover: hover) {a:hover {}\n}\nb {}");
    assert!(result.warnings().is_empty());
  }

  #[test]
  fn visitor_errors_become_warnings() {
    let result = Processor::new()
      .with_plugin(Reject)
      .process("a {}\nbad {}\nc {}")
      .unwrap();

    assert_eq!(result.css(), "a-seen {}\nbad {}\nc-seen {}");
    assert_eq!(result.warnings().len(), 1);
    let warning = &result.warnings()[0];
    assert_eq!(warning.plugin.as_deref(), Some("reject"));
    assert_eq!(warning.text, "cannot handle bad");
    assert_eq!((warning.line, warning.column), (Some(2), Some(1)));
  }

  #[test]
  fn strict_processor_aborts() {
    let error = Processor::new()
      .with_plugin(Reject)
      .strict(true)
      .process("bad {}")
      .unwrap_err();

    assert!(matches!(error, ProcessorError::Plugin { ref plugin, .. } if plugin == "reject"));
    assert_eq!(error.to_string(), "reject: cannot handle bad");
  }

  #[test]
  fn syntax_errors_surface_before_plugins_run() {
    let error = Processor::new().with_plugin(Reject).process("a {").unwrap_err();

    assert!(matches!(error, ProcessorError::Syntax(_)));
  }
}
