/// Raised when stylesheet text cannot be turned into a tree.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{}:{line}:{column}: {reason}", .file.as_deref().unwrap_or("<css input>"))]
pub struct CssSyntaxError {
  pub reason: String,
  pub file: Option<String>,
  pub line: u32,
  pub column: u32,
}

impl CssSyntaxError {
  pub fn new(reason: impl Into<String>, file: Option<String>, line: u32, column: u32) -> Self {
    Self {
      reason: reason.into(),
      file,
      line,
      column,
    }
  }
}
