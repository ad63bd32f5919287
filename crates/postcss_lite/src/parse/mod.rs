mod scanner;

use std::rc::Rc;

use scanner::Scanner;

use crate::ast::nodes::{AtRuleData, CommentData, DeclarationData, Root, RuleData};
use crate::ast::{Node, NodeAccess, NodeData, NodeRef, Source};
use crate::css_syntax_error::CssSyntaxError;
use crate::input::{Input, Position};

/// Parse stylesheet text into a tree.
pub fn parse(css: &str) -> Result<Root, CssSyntaxError> {
  parse_with_file(css, None)
}

/// Parse stylesheet text, recording `file` as the source of every node.
pub fn parse_with_file(css: &str, file: Option<String>) -> Result<Root, CssSyntaxError> {
  let input = Rc::new(Input::new(css, file));
  let root = Root::new();
  root.set_source(Source {
    input: Some(input.clone()),
    start: Some(Position::new(1, 1, 0)),
    end: None,
  });

  let mut parser = Parser {
    scanner: Scanner::new(input),
    spaces: String::new(),
  };
  parser.children(root.node(), true)?;
  Ok(root)
}

fn is_name_byte(byte: u8) -> bool {
  byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' || byte >= 0x80
}

fn split_trailing_whitespace(text: &str) -> (&str, &str) {
  let trimmed = text.trim_end();
  (trimmed, &text[trimmed.len()..])
}

struct Parser {
  scanner: Scanner,
  spaces: String,
}

impl Parser {
  fn source_at(&self, offset: usize) -> Source {
    Source {
      input: Some(self.scanner.input().clone()),
      start: Some(self.scanner.input().from_offset(offset)),
      end: None,
    }
  }

  fn init(&mut self, container: &NodeRef, node: &NodeRef, offset: usize) {
    {
      let mut node_mut = node.borrow_mut();
      node_mut.source = self.source_at(offset);
      node_mut.raws.set("before", std::mem::take(&mut self.spaces));
    }
    container.borrow_mut().raws.set_flag("semicolon", false);
    Node::append(container, node.clone());
  }

  fn close(&self, node: &NodeRef, offset: usize) {
    node.borrow_mut().source.end = Some(self.scanner.input().from_offset(offset));
  }

  fn children(&mut self, container: &NodeRef, is_root: bool) -> Result<(), CssSyntaxError> {
    loop {
      let whitespace = self.scanner.take_whitespace();
      self.spaces.push_str(&whitespace);

      match self.scanner.peek() {
        None => {
          if !is_root {
            let start = container
              .borrow()
              .source
              .start
              .as_ref()
              .map_or(0, |position| position.offset);
            return Err(self.scanner.error("Unclosed block", start));
          }
          container
            .borrow_mut()
            .raws
            .set("after", std::mem::take(&mut self.spaces));
          return Ok(());
        }
        Some(b'}') => {
          if is_root {
            return Err(self.scanner.error("Unexpected }", self.scanner.pos));
          }
          container
            .borrow_mut()
            .raws
            .set("after", std::mem::take(&mut self.spaces));
          self.close(container, self.scanner.pos);
          self.scanner.pos += 1;
          return Ok(());
        }
        Some(b';') => {
          self.scanner.pos += 1;
          container.borrow_mut().raws.set_flag("semicolon", true);
        }
        Some(b'/') if self.scanner.peek_at(1) == Some(b'*') => self.comment(container)?,
        Some(b'@') => self.at_rule(container)?,
        Some(_) => self.rule_or_declaration(container)?,
      }
    }
  }

  fn comment(&mut self, container: &NodeRef) -> Result<(), CssSyntaxError> {
    let start = self.scanner.pos;
    let end = self.scanner.comment_end(start)?;
    let content = self.scanner.slice(start + 2, end).to_string();

    let text = content.trim();
    let (left, right) = if text.is_empty() {
      (content.as_str(), "")
    } else {
      let left_len = content.len() - content.trim_start().len();
      let right_start = content.trim_end().len();
      (&content[..left_len], &content[right_start..])
    };

    let node = Node::new(NodeData::Comment(CommentData {
      text: text.to_string(),
    }));
    {
      let mut node_mut = node.borrow_mut();
      node_mut.raws.set("left", left);
      node_mut.raws.set("right", right);
    }
    self.init(container, &node, start);
    self.scanner.pos = end + 2;
    self.close(&node, end + 1);
    Ok(())
  }

  fn at_rule(&mut self, container: &NodeRef) -> Result<(), CssSyntaxError> {
    let start = self.scanner.pos;
    self.scanner.pos += 1;
    let name = self.scanner.take_while(is_name_byte);
    if name.is_empty() {
      return Err(self.scanner.error("At-rule without name", start));
    }
    let after_name = self.scanner.take_whitespace();

    let stop = self.scanner.find_stop(&[b'{', b';', b'}'])?;
    let prelude = self.scanner.slice(self.scanner.pos, stop).to_string();
    let (params, between) = split_trailing_whitespace(&prelude);
    let terminator = self.scanner.css().as_bytes().get(stop).copied();

    let node = Node::new(NodeData::AtRule(AtRuleData {
      name,
      params: params.to_string(),
      has_block: terminator == Some(b'{'),
    }));
    {
      let mut node_mut = node.borrow_mut();
      node_mut.raws.set("afterName", after_name);
      node_mut.raws.set("between", between);
    }
    self.init(container, &node, start);
    self.scanner.pos = stop;

    match terminator {
      Some(b'{') => {
        self.scanner.pos += 1;
        self.children(&node, false)
      }
      Some(b';') => {
        self.scanner.pos += 1;
        self.close(&node, stop);
        container.borrow_mut().raws.set_flag("semicolon", true);
        Ok(())
      }
      _ => {
        self.close(&node, stop.saturating_sub(1));
        Ok(())
      }
    }
  }

  fn rule_or_declaration(&mut self, container: &NodeRef) -> Result<(), CssSyntaxError> {
    let start = self.scanner.pos;
    let stop = self.scanner.find_stop(&[b'{', b';', b'}'])?;
    let text = self.scanner.slice(start, stop).to_string();
    let terminator = self.scanner.css().as_bytes().get(stop).copied();

    if terminator == Some(b'{') {
      let (selector, between) = split_trailing_whitespace(&text);
      let node = Node::new(NodeData::Rule(RuleData {
        selector: selector.to_string(),
      }));
      node.borrow_mut().raws.set("between", between);
      self.init(container, &node, start);
      self.scanner.pos = stop + 1;
      return self.children(&node, false);
    }

    self.declaration(container, start, &text)?;
    self.scanner.pos = stop;
    if terminator == Some(b';') {
      self.scanner.pos += 1;
      container.borrow_mut().raws.set_flag("semicolon", true);
    }
    Ok(())
  }

  fn declaration(
    &mut self,
    container: &NodeRef,
    start: usize,
    text: &str,
  ) -> Result<(), CssSyntaxError> {
    let colon = self
      .colon_offset(text)
      .ok_or_else(|| self.scanner.error("Unknown word", start))?;

    let prop = text[..colon].trim_end();
    if prop.is_empty() {
      return Err(self.scanner.error("Unknown word", start));
    }

    let rest = &text[colon + 1..];
    let value_start = rest.len() - rest.trim_start().len();
    let between = format!("{}:{}", &text[prop.len()..colon], &rest[..value_start]);
    let (mut value, _) = split_trailing_whitespace(&rest[value_start..]);

    let mut important = None;
    if let Some(bang) = value.rfind('!') {
      if value[bang + 1..].trim().eq_ignore_ascii_case("important") {
        let (kept, spaces) = split_trailing_whitespace(&value[..bang]);
        important = Some(format!("{spaces}{}", &value[bang..]));
        value = kept;
      }
    }

    let node = Node::new(NodeData::Declaration(DeclarationData {
      prop: prop.to_string(),
      value: value.to_string(),
      important: important.is_some(),
    }));
    {
      let mut node_mut = node.borrow_mut();
      node_mut.raws.set("between", between);
      if let Some(important) = important {
        node_mut.raws.set("important", important);
      }
    }
    self.init(container, &node, start);
    self.close(&node, start + text.trim_end().len().saturating_sub(1));
    Ok(())
  }

  /// First top-level `:` in a declaration.
  fn colon_offset(&self, text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote = None;
    let mut escape = false;
    for (index, ch) in text.char_indices() {
      if escape {
        escape = false;
        continue;
      }
      match (quote, ch) {
        (_, '\\') => escape = true,
        (Some(open), _) if ch == open => quote = None,
        (Some(_), _) => {}
        (None, '"' | '\'') => quote = Some(ch),
        (None, '(' | '[') => depth += 1,
        (None, ')' | ']') => depth = depth.saturating_sub(1),
        (None, ':') if depth == 0 => return Some(index),
        _ => {}
      }
    }
    None
  }
}
