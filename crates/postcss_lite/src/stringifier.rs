use crate::ast::nodes::NodeKind;
use crate::ast::{find_root, NodeData, NodeRef};

const DEFAULT_INDENT: &str = "    ";

/// Print `node` back to CSS. Parsed nodes reproduce their source through
/// their raws; created nodes fall back to PostCSS-like defaults.
pub fn stringify(node: &NodeRef) -> String {
  let root = find_root(node);
  let mut stringifier = Stringifier {
    out: String::new(),
    default_after: detect_before_close(&root).unwrap_or_else(|| "\n".to_string()),
  };
  stringifier.node(node, false);
  stringifier.out
}

/// Whitespace before the closing brace of the first container in the tree
/// that has children and a recorded `after` raw.
fn detect_before_close(node: &NodeRef) -> Option<String> {
  let children = node.borrow().nodes.clone();
  for child in children {
    let found = {
      let borrowed = child.borrow();
      let is_block = matches!(borrowed.data, NodeData::Rule(_) | NodeData::AtRule(_));
      match borrowed.raws.get("after") {
        Some(after) if is_block && !borrowed.nodes.is_empty() => Some(whitespace_only(after)),
        _ => None,
      }
    };
    if let Some(found) = found.or_else(|| detect_before_close(&child)) {
      return Some(found);
    }
  }
  None
}

fn whitespace_only(value: &str) -> String {
  value.chars().filter(|ch| ch.is_whitespace()).collect()
}

fn raw(node: &NodeRef, key: &str) -> Option<String> {
  node.borrow().raws.get(key).map(str::to_string)
}

fn depth(node: &NodeRef) -> usize {
  let mut depth = 0;
  let mut current = node.borrow().parent();
  while let Some(parent) = current {
    depth += 1;
    current = parent.borrow().parent();
  }
  depth
}

struct Stringifier {
  out: String,
  default_after: String,
}

impl Stringifier {
  fn node(&mut self, node: &NodeRef, semicolon: bool) {
    let kind = node.borrow().kind();
    match kind {
      NodeKind::Root => self.root(node),
      NodeKind::Rule => self.rule(node),
      NodeKind::AtRule => self.at_rule(node, semicolon),
      NodeKind::Declaration => self.decl(node, semicolon),
      NodeKind::Comment => self.comment(node),
    }
  }

  fn root(&mut self, node: &NodeRef) {
    self.body(node);
    if let Some(after) = raw(node, "after") {
      self.out.push_str(&after);
    }
  }

  fn rule(&mut self, node: &NodeRef) {
    let selector = match &node.borrow().data {
      NodeData::Rule(data) => data.selector.clone(),
      _ => return,
    };
    self.out.push_str(&selector);
    let between = raw(node, "between").unwrap_or_else(|| " ".to_string());
    self.block(node, &between);
  }

  fn at_rule(&mut self, node: &NodeRef, semicolon: bool) {
    let (name, params, has_block) = match &node.borrow().data {
      NodeData::AtRule(data) => (data.name.clone(), data.params.clone(), data.has_block),
      _ => return,
    };

    self.out.push('@');
    self.out.push_str(&name);
    if !params.is_empty() {
      let after_name = raw(node, "afterName").unwrap_or_else(|| " ".to_string());
      self.out.push_str(&after_name);
      self.out.push_str(&params);
    }

    if has_block {
      let between = raw(node, "between").unwrap_or_else(|| " ".to_string());
      self.block(node, &between);
    } else {
      self
        .out
        .push_str(&raw(node, "between").unwrap_or_default());
      if semicolon {
        self.out.push(';');
      }
    }
  }

  fn decl(&mut self, node: &NodeRef, semicolon: bool) {
    let (prop, value, important) = match &node.borrow().data {
      NodeData::Declaration(data) => (data.prop.clone(), data.value.clone(), data.important),
      _ => return,
    };

    self.out.push_str(&prop);
    self
      .out
      .push_str(&raw(node, "between").unwrap_or_else(|| ": ".to_string()));
    self.out.push_str(&value);
    if important {
      self
        .out
        .push_str(&raw(node, "important").unwrap_or_else(|| " !important".to_string()));
    }
    if semicolon {
      self.out.push(';');
    }
  }

  fn comment(&mut self, node: &NodeRef) {
    let text = match &node.borrow().data {
      NodeData::Comment(data) => data.text.clone(),
      _ => return,
    };
    let left = raw(node, "left").unwrap_or_else(|| " ".to_string());
    let right = raw(node, "right").unwrap_or_else(|| " ".to_string());
    self.out.push_str("/*");
    self.out.push_str(&left);
    self.out.push_str(&text);
    self.out.push_str(&right);
    self.out.push_str("*/");
  }

  fn block(&mut self, node: &NodeRef, between: &str) {
    self.out.push_str(between);
    self.out.push('{');
    self.body(node);

    let has_children = !node.borrow().nodes.is_empty();
    let after = match raw(node, "after") {
      Some(after) => after,
      None if has_children => self.default_after.clone(),
      None => String::new(),
    };
    self.out.push_str(&after);
    self.out.push('}');
  }

  fn body(&mut self, node: &NodeRef) {
    let (children, is_root, trailing_semicolon) = {
      let borrowed = node.borrow();
      (
        borrowed.nodes.clone(),
        matches!(borrowed.data, NodeData::Root),
        borrowed.raws.flag("semicolon"),
      )
    };
    let last = children
      .iter()
      .rposition(|child| child.borrow().kind() != NodeKind::Comment);
    let indent = DEFAULT_INDENT.repeat(depth(node));

    for (index, child) in children.iter().enumerate() {
      let before = raw(child, "before").unwrap_or_else(|| match (is_root, index) {
        (true, 0) => String::new(),
        (true, _) => "\n".to_string(),
        (false, _) => format!("\n{indent}"),
      });
      self.out.push_str(&before);
      self.node(child, Some(index) != last || trailing_semicolon);
    }
  }
}
