use std::rc::Rc;

use crate::css_syntax_error::CssSyntaxError;

pub type InputRef = Rc<Input>;

/// 1-based line/column location plus the byte offset it was computed from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Position {
  pub line: u32,
  pub column: u32,
  pub offset: usize,
}

impl Position {
  pub fn new(line: u32, column: u32, offset: usize) -> Self {
    Self {
      line,
      column,
      offset,
    }
  }
}

/// Source text of a stylesheet together with the file it came from.
#[derive(Clone, Debug)]
pub struct Input {
  css: String,
  pub file: Option<String>,
  line_starts: Vec<usize>,
}

impl Input {
  pub fn new(css: impl Into<String>, file: Option<String>) -> Self {
    let mut css = css.into();
    if css.starts_with('\u{FEFF}') {
      css.remove(0);
    }

    let mut line_starts = vec![0];
    line_starts.extend(
      css
        .bytes()
        .enumerate()
        .filter(|(_, byte)| *byte == b'\n')
        .map(|(index, _)| index + 1),
    );

    Self {
      css,
      file,
      line_starts,
    }
  }

  pub fn css(&self) -> &str {
    &self.css
  }

  /// Display name used in diagnostics.
  pub fn name(&self) -> &str {
    self.file.as_deref().unwrap_or("<css input>")
  }

  pub fn from_offset(&self, offset: usize) -> Position {
    let offset = offset.min(self.css.len());
    let line_index = match self.line_starts.binary_search(&offset) {
      Ok(index) => index,
      Err(index) => index - 1,
    };
    let line_start = self.line_starts[line_index];
    let column = self.css[line_start..offset].chars().count() + 1;

    Position {
      line: line_index as u32 + 1,
      column: column as u32,
      offset,
    }
  }

  pub fn error(&self, reason: impl Into<String>, offset: usize) -> CssSyntaxError {
    let position = self.from_offset(offset);
    CssSyntaxError::new(reason, self.file.clone(), position.line, position.column)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn computes_line_and_column_from_offset() {
    let input = Input::new("a {}\n.b {\n  c: d;\n}", None);

    assert_eq!(input.from_offset(0), Position::new(1, 1, 0));
    assert_eq!(input.from_offset(5), Position::new(2, 1, 5));
    assert_eq!(input.from_offset(12), Position::new(3, 3, 12));
  }

  #[test]
  fn strips_byte_order_mark() {
    let input = Input::new("\u{FEFF}a {}", Some("app.css".into()));

    assert_eq!(input.css(), "a {}");
    assert_eq!(input.name(), "app.css");
  }
}
