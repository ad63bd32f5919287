use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::input::{InputRef, Position};
use crate::stringifier;

pub mod nodes;

/// Shared pointer to a node in the stylesheet tree.
pub type NodeRef = Rc<RefCell<Node>>;

/// Parent pointers are weak so that a tree never keeps itself alive.
pub type WeakNodeRef = Weak<RefCell<Node>>;

/// Per-container bookkeeping for in-flight `each`/`walk` loops. Every loop
/// owns an id whose index is shifted whenever children are inserted or
/// removed in front of it, so callbacks may edit siblings freely.
#[derive(Clone, Debug, Default)]
pub struct IterationState {
  last_each: u32,
  indexes: BTreeMap<u32, isize>,
  substitutes: BTreeMap<u32, NodeRef>,
}

impl IterationState {
  pub fn begin(&mut self) -> u32 {
    self.last_each = self.last_each.wrapping_add(1);
    self.indexes.insert(self.last_each, 0);
    self.last_each
  }

  pub fn current(&self, id: u32) -> usize {
    self
      .indexes
      .get(&id)
      .map(|value| (*value).max(0) as usize)
      .unwrap_or(0)
  }

  pub fn current_raw(&self, id: u32) -> isize {
    self.indexes.get(&id).copied().unwrap_or(0)
  }

  pub fn advance(&mut self, id: u32, next: isize) {
    if let Some(entry) = self.indexes.get_mut(&id) {
      *entry = next;
    }
  }

  pub fn finish(&mut self, id: u32) {
    self.indexes.remove(&id);
    self.substitutes.remove(&id);
  }

  pub fn adjust_insert(&mut self, index: usize, added: usize) {
    let index = index as isize;
    for value in self.indexes.values_mut() {
      if *value >= index {
        *value += added as isize;
      }
    }
  }

  pub fn adjust_remove(&mut self, index: usize) {
    let index = index as isize;
    for value in self.indexes.values_mut() {
      if *value >= index {
        *value -= 1;
      }
    }
  }

  /// Remember that the child a loop is currently positioned on was swapped
  /// for `node`, so the walk descends into the replacement instead.
  pub fn substitute(&mut self, index: usize, node: &NodeRef) {
    let index = index as isize;
    for (id, value) in &self.indexes {
      if *value == index {
        self.substitutes.insert(*id, node.clone());
      }
    }
  }

  pub fn take_substitute(&mut self, id: u32) -> Option<NodeRef> {
    self.substitutes.remove(&id)
  }
}

/// Source location of a node.
#[derive(Clone, Debug, Default)]
pub struct Source {
  pub input: Option<InputRef>,
  pub start: Option<Position>,
  pub end: Option<Position>,
}

impl Source {
  pub fn file(&self) -> Option<&str> {
    self.input.as_ref().and_then(|input| input.file.as_deref())
  }
}

/// Whitespace and punctuation kept around node values so that parsed input
/// prints back unchanged. Keys follow PostCSS naming (`before`, `between`,
/// `after`, `afterName`, `semicolon`, `important`, `left`, `right`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawData {
  values: BTreeMap<String, String>,
}

impl RawData {
  pub fn get(&self, key: &str) -> Option<&str> {
    self.values.get(key).map(String::as_str)
  }

  pub fn set(&mut self, key: &str, value: impl Into<String>) {
    self.values.insert(key.to_string(), value.into());
  }

  pub fn set_flag(&mut self, key: &str, value: bool) {
    if value {
      self.set(key, "true");
    } else {
      self.remove(key);
    }
  }

  pub fn flag(&self, key: &str) -> bool {
    self.get(key) == Some("true")
  }

  pub fn remove(&mut self, key: &str) {
    self.values.remove(key);
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

/// Strongly-typed payload stored inside each [`Node`].
#[derive(Clone, Debug)]
pub enum NodeData {
  Root,
  Rule(nodes::RuleData),
  AtRule(nodes::AtRuleData),
  Declaration(nodes::DeclarationData),
  Comment(nodes::CommentData),
}

impl NodeData {
  pub fn is_container(&self) -> bool {
    matches!(self, NodeData::Root | NodeData::Rule(_) | NodeData::AtRule(_))
  }
}

#[derive(Clone, Debug)]
pub struct Node {
  pub data: NodeData,
  pub parent: Option<WeakNodeRef>,
  pub source: Source,
  pub raws: RawData,
  pub nodes: Vec<NodeRef>,
  iteration: IterationState,
}

impl Node {
  pub fn new(data: NodeData) -> NodeRef {
    Rc::new(RefCell::new(Self {
      data,
      parent: None,
      source: Source::default(),
      raws: RawData::default(),
      nodes: Vec::new(),
      iteration: IterationState::default(),
    }))
  }

  pub fn kind(&self) -> nodes::NodeKind {
    match &self.data {
      NodeData::Root => nodes::NodeKind::Root,
      NodeData::Rule(_) => nodes::NodeKind::Rule,
      NodeData::AtRule(_) => nodes::NodeKind::AtRule,
      NodeData::Declaration(_) => nodes::NodeKind::Declaration,
      NodeData::Comment(_) => nodes::NodeKind::Comment,
    }
  }

  pub fn type_name(&self) -> &'static str {
    match &self.data {
      NodeData::Root => "root",
      NodeData::Rule(_) => "rule",
      NodeData::AtRule(_) => "atrule",
      NodeData::Declaration(_) => "decl",
      NodeData::Comment(_) => "comment",
    }
  }

  pub fn parent(&self) -> Option<NodeRef> {
    self.parent.as_ref().and_then(Weak::upgrade)
  }

  pub fn parent_ref(node: &NodeRef) -> Option<NodeRef> {
    node.borrow().parent()
  }

  pub fn index(node: &NodeRef) -> Option<usize> {
    Node::parent_and_index(node).map(|(_, index)| index)
  }

  pub fn index_of(parent: &NodeRef, child: &NodeRef) -> Option<usize> {
    parent
      .borrow()
      .nodes
      .iter()
      .position(|node| Rc::ptr_eq(node, child))
  }

  fn parent_and_index(node: &NodeRef) -> Option<(NodeRef, usize)> {
    let parent = node.borrow().parent()?;
    let index = Node::index_of(&parent, node)?;
    Some((parent, index))
  }

  fn is_child_of(node: &NodeRef, parent: &NodeRef) -> bool {
    node
      .borrow()
      .parent()
      .is_some_and(|current| Rc::ptr_eq(&current, parent))
  }

  fn detach(node: &NodeRef) {
    if let Some((parent, index)) = Node::parent_and_index(node) {
      Node::remove(&parent, index);
    }
  }

  /// Give a node without its own `before` raw the whitespace of the sibling
  /// it is being placed next to.
  fn inherit_before(node: &NodeRef, sample: &NodeRef) {
    if node.borrow().raws.get("before").is_some() {
      return;
    }
    let before = sample.borrow().raws.get("before").map(|value| {
      value
        .chars()
        .filter(|ch| ch.is_whitespace())
        .collect::<String>()
    });
    if let Some(before) = before {
      node.borrow_mut().raws.set("before", before);
    }
  }

  fn prepare_incoming<I>(nodes: I, sample: &NodeRef) -> Vec<NodeRef>
  where
    I: IntoIterator<Item = NodeRef>,
  {
    nodes
      .into_iter()
      .inspect(|node| {
        Node::detach(node);
        Node::inherit_before(node, sample);
      })
      .collect()
  }

  pub fn append(parent: &NodeRef, child: NodeRef) {
    Node::detach(&child);
    child.borrow_mut().parent = Some(Rc::downgrade(parent));
    let mut parent_mut = parent.borrow_mut();
    if let NodeData::AtRule(data) = &mut parent_mut.data {
      data.has_block = true;
    }
    parent_mut.nodes.push(child);
  }

  pub fn insert(parent: &NodeRef, index: usize, child: NodeRef) {
    child.borrow_mut().parent = Some(Rc::downgrade(parent));
    let mut parent_mut = parent.borrow_mut();
    parent_mut.iteration.adjust_insert(index, 1);
    parent_mut.nodes.insert(index, child);
  }

  pub fn remove(parent: &NodeRef, index: usize) -> NodeRef {
    let child = {
      let mut parent_mut = parent.borrow_mut();
      let child = parent_mut.nodes.remove(index);
      parent_mut.iteration.adjust_remove(index);
      child
    };
    child.borrow_mut().parent = None;
    child
  }

  pub fn insert_before<I>(node: &NodeRef, new_nodes: I)
  where
    I: IntoIterator<Item = NodeRef>,
  {
    let nodes = Node::prepare_incoming(new_nodes, node);
    let Some((parent, index)) = Node::parent_and_index(node) else {
      return;
    };
    for (offset, child) in nodes.into_iter().enumerate() {
      Node::insert(&parent, index + offset, child);
    }
  }

  pub fn insert_after<I>(node: &NodeRef, new_nodes: I)
  where
    I: IntoIterator<Item = NodeRef>,
  {
    let nodes = Node::prepare_incoming(new_nodes, node);
    let Some((parent, index)) = Node::parent_and_index(node) else {
      return;
    };
    for (offset, child) in nodes.into_iter().enumerate() {
      Node::insert(&parent, index + 1 + offset, child);
    }
  }

  /// Swap `node` for the given nodes in place. The first replacement takes
  /// over the slot without shifting running iterations, so a loop that is
  /// positioned on `node` does not visit the replacement again.
  pub fn replace_with<I>(node: &NodeRef, new_nodes: I)
  where
    I: IntoIterator<Item = NodeRef>,
  {
    let mut nodes = Node::prepare_incoming(new_nodes, node).into_iter();
    let Some((parent, index)) = Node::parent_and_index(node) else {
      return;
    };

    let Some(first) = nodes.next() else {
      Node::remove(&parent, index);
      return;
    };

    first.borrow_mut().parent = Some(Rc::downgrade(&parent));
    {
      let mut parent_mut = parent.borrow_mut();
      parent_mut.iteration.substitute(index, &first);
      parent_mut.nodes[index] = first;
    }
    node.borrow_mut().parent = None;

    for (offset, child) in nodes.enumerate() {
      Node::insert(&parent, index + 1 + offset, child);
    }
  }

  pub fn remove_self(node: &NodeRef) {
    Node::detach(node);
  }

  /// Deep copy of `node` and its children. The copy is detached.
  pub fn clone_node(node: &NodeRef) -> NodeRef {
    let (data, source, raws, children) = {
      let inner = node.borrow();
      (
        inner.data.clone(),
        inner.source.clone(),
        inner.raws.clone(),
        inner.nodes.clone(),
      )
    };

    let result = Node::new(data);
    {
      let mut result_mut = result.borrow_mut();
      result_mut.source = source;
      result_mut.raws = raws;
    }
    for child in &children {
      let copy = Node::clone_node(child);
      copy.borrow_mut().parent = Some(Rc::downgrade(&result));
      result.borrow_mut().nodes.push(copy);
    }
    result
  }

  /// Visit direct children. Returning `false` from the callback stops the
  /// loop, in which case `false` is returned.
  pub fn each<F>(node: &NodeRef, callback: &mut F) -> bool
  where
    F: FnMut(NodeRef, usize) -> bool,
  {
    Node::iterate(node, callback, false)
  }

  /// Visit every descendant depth-first, parents before children.
  pub fn walk<F>(node: &NodeRef, callback: &mut F) -> bool
  where
    F: FnMut(NodeRef, usize) -> bool,
  {
    Node::iterate(node, callback, true)
  }

  fn iterate<F>(node: &NodeRef, callback: &mut F, deep: bool) -> bool
  where
    F: FnMut(NodeRef, usize) -> bool,
  {
    let id = node.borrow_mut().iteration.begin();
    let mut completed = true;

    loop {
      let (index, child) = {
        let borrowed = node.borrow();
        let index = borrowed.iteration.current(id);
        (index, borrowed.nodes.get(index).cloned())
      };

      let Some(child) = child else {
        break;
      };

      if !callback(child.clone(), index) {
        completed = false;
        break;
      }

      if deep {
        let substitute = node.borrow_mut().iteration.take_substitute(id);
        let target = if Node::is_child_of(&child, node) {
          Some(child)
        } else {
          substitute
        };

        if let Some(target) = target {
          let is_container = target.borrow().data.is_container();
          if is_container && !Node::walk(&target, callback) {
            completed = false;
            break;
          }
        }
      }

      let mut borrowed = node.borrow_mut();
      let next = borrowed.iteration.current_raw(id) + 1;
      borrowed.iteration.advance(id, next);
    }

    node.borrow_mut().iteration.finish(id);
    completed
  }

  pub fn to_css(node: &NodeRef) -> String {
    stringifier::stringify(node)
  }
}

impl fmt::Display for Node {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.data {
      NodeData::Root => write!(f, "[Root]"),
      NodeData::Rule(data) => write!(f, "[Rule selector={}]", data.selector),
      NodeData::AtRule(data) => write!(f, "[AtRule name={} params={}]", data.name, data.params),
      NodeData::Declaration(data) => write!(f, "[Declaration {}: {}]", data.prop, data.value),
      NodeData::Comment(data) => write!(f, "[Comment text={}]", data.text),
    }
  }
}

/// Shared read/write access for the typed node wrappers.
pub trait NodeAccess {
  fn node(&self) -> &NodeRef;

  fn kind(&self) -> nodes::NodeKind {
    self.node().borrow().kind()
  }

  fn parent(&self) -> Option<NodeRef> {
    Node::parent_ref(self.node())
  }

  fn root(&self) -> NodeRef {
    find_root(self.node())
  }

  fn index(&self) -> Option<usize> {
    Node::index(self.node())
  }

  fn before<I>(&self, nodes: I)
  where
    I: IntoIterator<Item = NodeRef>,
  {
    Node::insert_before(self.node(), nodes);
  }

  fn after<I>(&self, nodes: I)
  where
    I: IntoIterator<Item = NodeRef>,
  {
    Node::insert_after(self.node(), nodes);
  }

  fn replace_with<I>(&self, nodes: I)
  where
    I: IntoIterator<Item = NodeRef>,
  {
    Node::replace_with(self.node(), nodes);
  }

  fn remove(&self) {
    Node::remove_self(self.node());
  }

  fn clone_node(&self) -> NodeRef {
    Node::clone_node(self.node())
  }

  fn source(&self) -> Source {
    self.node().borrow().source.clone()
  }

  fn set_source(&self, source: Source) {
    self.node().borrow_mut().source = source;
  }

  fn raw(&self, key: &str) -> Option<String> {
    self.node().borrow().raws.get(key).map(str::to_string)
  }

  fn to_css(&self) -> String {
    Node::to_css(self.node())
  }
}

pub fn find_root(node: &NodeRef) -> NodeRef {
  let mut current = node.clone();
  loop {
    let parent = current.borrow().parent();
    match parent {
      Some(next) => current = next,
      None => return current,
    }
  }
}
