use crate::css_syntax_error::CssSyntaxError;
use crate::input::InputRef;

/// Byte cursor over stylesheet text. Only ASCII bytes are ever compared, so
/// every offset it stops at is a char boundary.
pub struct Scanner {
  input: InputRef,
  pub pos: usize,
}

impl Scanner {
  pub fn new(input: InputRef) -> Self {
    Self { input, pos: 0 }
  }

  pub fn input(&self) -> &InputRef {
    &self.input
  }

  pub fn css(&self) -> &str {
    self.input.css()
  }

  pub fn peek(&self) -> Option<u8> {
    self.css().as_bytes().get(self.pos).copied()
  }

  pub fn peek_at(&self, offset: usize) -> Option<u8> {
    self.css().as_bytes().get(self.pos + offset).copied()
  }

  pub fn slice(&self, start: usize, end: usize) -> &str {
    &self.css()[start..end]
  }

  pub fn error(&self, reason: &str, offset: usize) -> CssSyntaxError {
    self.input.error(reason, offset)
  }

  pub fn take_whitespace(&mut self) -> String {
    let start = self.pos;
    while self.peek().is_some_and(|byte| byte.is_ascii_whitespace()) {
      self.pos += 1;
    }
    self.slice(start, self.pos).to_string()
  }

  pub fn take_while<P>(&mut self, predicate: P) -> String
  where
    P: Fn(u8) -> bool,
  {
    let start = self.pos;
    while self.peek().is_some_and(&predicate) {
      self.pos += 1;
    }
    self.slice(start, self.pos).to_string()
  }

  /// Offset of the closing `*/` of a comment starting at `start`.
  pub fn comment_end(&self, start: usize) -> Result<usize, CssSyntaxError> {
    self.css()[start + 2..]
      .find("*/")
      .map(|index| start + 2 + index)
      .ok_or_else(|| self.error("Unclosed comment", start))
  }

  /// Offset just past the closing quote of a string starting at `start`.
  fn string_end(&self, start: usize) -> Result<usize, CssSyntaxError> {
    let bytes = self.css().as_bytes();
    let quote = bytes[start];
    let mut index = start + 1;
    while index < bytes.len() {
      match bytes[index] {
        b'\\' => index += 2,
        byte if byte == quote => return Ok(index + 1),
        _ => index += 1,
      }
    }
    Err(self.error("Unclosed string", start))
  }

  /// Find the first byte in `stops` outside strings, comments, escapes and
  /// bracketed groups, starting at the cursor. Returns the text length when
  /// none is found.
  pub fn find_stop(&self, stops: &[u8]) -> Result<usize, CssSyntaxError> {
    let bytes = self.css().as_bytes();
    let mut depth = 0usize;
    let mut index = self.pos;

    while index < bytes.len() {
      let byte = bytes[index];
      match byte {
        b'\\' => {
          index += 2;
          continue;
        }
        b'"' | b'\'' => {
          index = self.string_end(index)?;
          continue;
        }
        b'/' if bytes.get(index + 1) == Some(&b'*') => {
          index = self.comment_end(index)? + 2;
          continue;
        }
        b'(' | b'[' => depth += 1,
        b')' | b']' => depth = depth.saturating_sub(1),
        _ if depth == 0 && stops.contains(&byte) => return Ok(index),
        _ => {}
      }
      index += 1;
    }

    Ok(bytes.len().max(self.pos))
  }
}
