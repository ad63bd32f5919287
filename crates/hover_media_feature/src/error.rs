use postcss_lite::{NodeAccess, Rule};

use crate::selector::SelectorParseError;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
  /// The rule's selector could not be parsed. The rule is left as it was.
  #[error("cannot parse selector `{selector}`: {source}")]
  Parse {
    selector: String,
    file: Option<String>,
    line: Option<u32>,
    column: Option<u32>,
    #[source]
    source: SelectorParseError,
  },
}

impl TransformError {
  pub fn parse(rule: &Rule, source: SelectorParseError) -> Self {
    let location = rule.source();
    let start = location.start.as_ref();
    TransformError::Parse {
      selector: rule.selector(),
      file: location.file().map(str::to_string),
      line: start.map(|position| position.line),
      column: start.map(|position| position.column),
      source,
    }
  }
}
