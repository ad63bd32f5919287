use std::fmt;

use crate::ast::nodes::Root;
use crate::ast::{NodeAccess, NodeRef};

/// Diagnostic left behind by a plugin that could not handle a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Warning {
  pub text: String,
  pub plugin: Option<String>,
  pub file: Option<String>,
  pub line: Option<u32>,
  pub column: Option<u32>,
}

impl Warning {
  pub fn new(text: impl Into<String>, plugin: Option<String>, node: Option<&NodeRef>) -> Self {
    let (file, start) = match node {
      Some(node) => {
        let borrowed = node.borrow();
        (
          borrowed.source.file().map(str::to_string),
          borrowed.source.start.clone(),
        )
      }
      None => (None, None),
    };

    Self {
      text: text.into(),
      plugin,
      file,
      line: start.as_ref().map(|position| position.line),
      column: start.as_ref().map(|position| position.column),
    }
  }
}

impl fmt::Display for Warning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let (Some(line), Some(column)) = (self.line, self.column) {
      let file = self.file.as_deref().unwrap_or("<css input>");
      write!(f, "{file}:{line}:{column}: ")?;
    }
    if let Some(plugin) = &self.plugin {
      write!(f, "{plugin}: ")?;
    }
    f.write_str(&self.text)
  }
}

/// Output of [`crate::Processor::process`].
#[derive(Debug)]
pub struct ProcessResult {
  pub root: Root,
  pub warnings: Vec<Warning>,
}

impl ProcessResult {
  pub fn new(root: Root) -> Self {
    Self {
      root,
      warnings: Vec::new(),
    }
  }

  pub fn css(&self) -> String {
    self.root.to_css()
  }

  pub fn warnings(&self) -> &[Warning] {
    &self.warnings
  }
}

impl fmt::Display for ProcessResult {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.css())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse::parse_with_file;

  #[test]
  fn warning_points_at_node_source() {
    let root = parse_with_file("a {}\n.b:hover {}", Some("app.css".into())).unwrap();
    let node = root.nodes()[1].clone();

    let warning = Warning::new("bad selector", Some("demo".into()), Some(&node));

    assert_eq!((warning.line, warning.column), (Some(2), Some(1)));
    assert_eq!(warning.to_string(), "app.css:2:1: demo: bad selector");
  }

  #[test]
  fn warning_without_node_has_no_location() {
    let warning = Warning::new("oops", None, None);

    assert_eq!(warning.line, None);
    assert_eq!(warning.to_string(), "oops");
  }
}
