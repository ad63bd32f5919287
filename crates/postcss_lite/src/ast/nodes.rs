use std::fmt;

use super::{Node, NodeAccess, NodeData, NodeRef};
use crate::list;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
  Root,
  Rule,
  AtRule,
  Declaration,
  Comment,
}

#[derive(Clone, Debug, Default)]
pub struct RuleData {
  pub selector: String,
}

#[derive(Clone, Debug, Default)]
pub struct AtRuleData {
  pub name: String,
  pub params: String,
  /// `@media x {}` has a (possibly empty) block, `@import x;` does not.
  pub has_block: bool,
}

#[derive(Clone, Debug, Default)]
pub struct DeclarationData {
  pub prop: String,
  pub value: String,
  pub important: bool,
}

#[derive(Clone, Debug, Default)]
pub struct CommentData {
  pub text: String,
}

macro_rules! node_wrapper {
  ($name:ident, $kind:path) => {
    #[derive(Clone, Debug)]
    pub struct $name {
      node: NodeRef,
    }

    impl $name {
      pub(crate) fn from_node(node: NodeRef) -> Self {
        Self { node }
      }

      /// Wrap `node` if it has the matching kind.
      pub fn cast(node: NodeRef) -> Option<Self> {
        let matches = node.borrow().kind() == $kind;
        matches.then(|| Self::from_node(node))
      }
    }

    impl NodeAccess for $name {
      fn node(&self) -> &NodeRef {
        &self.node
      }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
      }
    }
  };
}

macro_rules! container_methods {
  ($name:ident) => {
    impl $name {
      pub fn append(&self, child: NodeRef) {
        Node::append(&self.node, child);
      }

      pub fn nodes(&self) -> Vec<NodeRef> {
        self.node.borrow().nodes.clone()
      }

      pub fn first(&self) -> Option<NodeRef> {
        self.node.borrow().nodes.first().cloned()
      }

      pub fn is_empty(&self) -> bool {
        self.node.borrow().nodes.is_empty()
      }

      pub fn each<F>(&self, mut callback: F) -> bool
      where
        F: FnMut(NodeRef, usize) -> bool,
      {
        Node::each(&self.node, &mut callback)
      }

      pub fn walk<F>(&self, mut callback: F) -> bool
      where
        F: FnMut(NodeRef, usize) -> bool,
      {
        Node::walk(&self.node, &mut callback)
      }

      /// Walk descendant rules only.
      pub fn walk_rules<F>(&self, mut callback: F) -> bool
      where
        F: FnMut(Rule, usize) -> bool,
      {
        Node::walk(&self.node, &mut |child, index| match Rule::cast(child) {
          Some(rule) => callback(rule, index),
          None => true,
        })
      }
    }
  };
}

node_wrapper!(Root, NodeKind::Root);
node_wrapper!(Rule, NodeKind::Rule);
node_wrapper!(AtRule, NodeKind::AtRule);
node_wrapper!(Declaration, NodeKind::Declaration);
node_wrapper!(Comment, NodeKind::Comment);

container_methods!(Root);
container_methods!(Rule);
container_methods!(AtRule);

impl Root {
  pub fn new() -> Self {
    Root::from_node(Node::new(NodeData::Root))
  }
}

impl Default for Root {
  fn default() -> Self {
    Root::new()
  }
}

impl Rule {
  pub fn new(selector: impl Into<String>) -> Self {
    Rule::from_node(Node::new(NodeData::Rule(RuleData {
      selector: selector.into(),
    })))
  }

  pub fn selector(&self) -> String {
    match &self.node.borrow().data {
      NodeData::Rule(data) => data.selector.clone(),
      _ => String::new(),
    }
  }

  pub fn set_selector(&self, selector: impl Into<String>) {
    if let NodeData::Rule(data) = &mut self.node.borrow_mut().data {
      data.selector = selector.into();
    }
  }

  /// The selector split into its comma-separated branches.
  pub fn selectors(&self) -> Vec<String> {
    list::comma(&self.selector())
  }

  /// Join `selectors` with the separator already used by this rule: the first
  /// comma and its trailing whitespace, or `,` plus the `between` raw.
  pub fn set_selectors<I, S>(&self, selectors: I)
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let separator = self.selector_separator();
    let joined = selectors
      .into_iter()
      .map(|selector| selector.as_ref().to_string())
      .collect::<Vec<_>>()
      .join(&separator);
    self.set_selector(joined);
  }

  fn selector_separator(&self) -> String {
    let selector = self.selector();
    if let Some(index) = selector.find(',') {
      let spaces = selector[index + 1..]
        .chars()
        .take_while(|ch| ch.is_whitespace())
        .collect::<String>();
      return format!(",{spaces}");
    }
    let between = self.raw("between").unwrap_or_else(|| " ".to_string());
    format!(",{between}")
  }

  /// Deep copy of this rule (declarations, raws and source included) carrying
  /// `selectors` instead of the current selector list.
  pub fn clone_with_selectors<I, S>(&self, selectors: I) -> Rule
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let copy = Rule::from_node(self.clone_node());
    copy.set_selectors(selectors);
    copy
  }
}

impl AtRule {
  pub fn new(name: impl Into<String>) -> Self {
    AtRule::from_node(Node::new(NodeData::AtRule(AtRuleData {
      name: name.into(),
      ..AtRuleData::default()
    })))
  }

  pub fn with_params(name: impl Into<String>, params: impl Into<String>) -> Self {
    let at_rule = AtRule::new(name);
    at_rule.set_params(params);
    at_rule
  }

  pub fn name(&self) -> String {
    match &self.node.borrow().data {
      NodeData::AtRule(data) => data.name.clone(),
      _ => String::new(),
    }
  }

  pub fn params(&self) -> String {
    match &self.node.borrow().data {
      NodeData::AtRule(data) => data.params.clone(),
      _ => String::new(),
    }
  }

  pub fn set_params(&self, params: impl Into<String>) {
    if let NodeData::AtRule(data) = &mut self.node.borrow_mut().data {
      data.params = params.into();
    }
  }
}

impl Declaration {
  pub fn new(prop: impl Into<String>, value: impl Into<String>) -> Self {
    Declaration::from_node(Node::new(NodeData::Declaration(DeclarationData {
      prop: prop.into(),
      value: value.into(),
      important: false,
    })))
  }

  pub fn prop(&self) -> String {
    match &self.node.borrow().data {
      NodeData::Declaration(data) => data.prop.clone(),
      _ => String::new(),
    }
  }

  pub fn value(&self) -> String {
    match &self.node.borrow().data {
      NodeData::Declaration(data) => data.value.clone(),
      _ => String::new(),
    }
  }

  pub fn important(&self) -> bool {
    match &self.node.borrow().data {
      NodeData::Declaration(data) => data.important,
      _ => false,
    }
  }
}

impl Comment {
  pub fn new(text: impl Into<String>) -> Self {
    Comment::from_node(Node::new(NodeData::Comment(CommentData { text: text.into() })))
  }

  pub fn text(&self) -> String {
    match &self.node.borrow().data {
      NodeData::Comment(data) => data.text.clone(),
      _ => String::new(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cast_checks_node_kind() {
    let rule = Rule::new("a");

    assert!(Rule::cast(rule.node().clone()).is_some());
    assert!(AtRule::cast(rule.node().clone()).is_none());
  }

  #[test]
  fn selectors_split_on_top_level_commas() {
    let rule = Rule::new(":is(a, b):hover,\n.c");

    assert_eq!(rule.selectors(), vec![":is(a, b):hover", ".c"]);
  }

  #[test]
  fn set_selectors_reuses_existing_separator() {
    let rule = Rule::new("a,\n  b");
    rule.set_selectors(["x", "y"]);
    assert_eq!(rule.selector(), "x,\n  y");

    let rule = Rule::new("a");
    rule.set_selectors(["x", "y"]);
    assert_eq!(rule.selector(), "x, y");
  }

  #[test]
  fn clone_with_selectors_keeps_declarations() {
    let rule = Rule::new("a:hover, b");
    rule.append(Declaration::new("color", "red").node().clone());

    let copy = rule.clone_with_selectors(["b"]);

    assert_eq!(copy.selector(), "b");
    assert_eq!(rule.selector(), "a:hover, b");
    let decl = Declaration::cast(copy.first().unwrap()).unwrap();
    assert_eq!(decl.prop(), "color");
    assert_eq!(decl.value(), "red");
  }

  #[test]
  fn appending_to_at_rule_opens_a_block() {
    let media = AtRule::with_params("media", "(hover: hover)");
    media.append(Rule::new("a").node().clone());

    assert_eq!(media.name(), "media");
    assert_eq!(media.params(), "(hover: hover)");
    assert!(matches!(
      &media.node().borrow().data,
      NodeData::AtRule(AtRuleData { has_block: true, .. })
    ));
  }
}
