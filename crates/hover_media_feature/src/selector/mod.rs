//! Selector-list model: a small recursive tree for CSS selectors, lowered
//! from swc's selector AST, enough to find `:hover` anywhere in a selector
//! and print it back out.

use std::fmt;

pub mod parse;
pub mod stringify;
pub mod walk;

pub use walk::{is_hover_selector, walk};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
  /// `a b`
  Descendant,
  /// `a > b`
  Child,
  /// `a + b`
  NextSibling,
  /// `a ~ b`
  SubsequentSibling,
  /// `a || b`
  Column,
}

/// Simple selectors that never contain other selectors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Matcher {
  /// Element name, including any namespace prefix (`svg|a`).
  Tag(String),
  /// `*`, including any namespace prefix.
  Universal(String),
  Class(String),
  Id(String),
  /// Text between the brackets, without padding: `role="button"`.
  Attribute(String),
  /// `&`
  Nesting,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PseudoArgument {
  /// `:is(...)`, `:not(...)`, `:has(...)`, and any other pseudo whose
  /// argument parses as a selector list.
  Selectors(SelectorList),
  /// `:nth-child(2n+1 of .x)`
  Nth {
    formula: String,
    of: Option<SelectorList>,
  },
  /// Keywords and text that is not a selector, like `:lang(en)`.
  Raw(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Component {
  Combinator(Combinator),
  Compound(Vec<Matcher>),
  SimplePseudo {
    name: String,
    element: bool,
  },
  FunctionalPseudo {
    name: String,
    element: bool,
    argument: PseudoArgument,
  },
}

/// One comma-separated branch of a selector list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
  pub components: Vec<Component>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectorList {
  pub selectors: Vec<Selector>,
}

impl SelectorList {
  pub fn iter(&self) -> impl Iterator<Item = &Selector> {
    self.selectors.iter()
  }

  pub fn len(&self) -> usize {
    self.selectors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.selectors.is_empty()
  }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message} at offset {offset} in selector `{selector}`")]
pub struct SelectorParseError {
  pub message: String,
  pub offset: usize,
  pub selector: String,
}

impl SelectorParseError {
  pub fn new(message: impl Into<String>, offset: usize, selector: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      offset,
      selector: selector.into(),
    }
  }
}

pub fn parse(input: &str) -> Result<SelectorList, SelectorParseError> {
  parse::parse(input)
}

impl fmt::Display for Selector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&stringify::stringify_selector(self))
  }
}

impl fmt::Display for SelectorList {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&stringify::stringify_list(self))
  }
}
