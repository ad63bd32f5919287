use crate::selector::{is_hover_selector, SelectorList};

/// Top-level selectors split by whether they reference `:hover`, each side in
/// source order and rendered back to text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classification {
  pub hover_selectors: Vec<String>,
  pub non_hover_selectors: Vec<String>,
}

impl Classification {
  pub fn has_hover(&self) -> bool {
    !self.hover_selectors.is_empty()
  }
}

pub fn classify(list: &SelectorList) -> Classification {
  let mut classification = Classification::default();
  for selector in list.iter() {
    let rendered = selector.to_string();
    if is_hover_selector(selector) {
      classification.hover_selectors.push(rendered);
    } else {
      classification.non_hover_selectors.push(rendered);
    }
  }
  tracing::trace!(
    hover = ?classification.hover_selectors,
    non_hover = ?classification.non_hover_selectors,
    "classified selectors"
  );
  classification
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::selector::parse;

  fn split(input: &str) -> (Vec<String>, Vec<String>) {
    let classification = classify(&parse(input).unwrap());
    (
      classification.hover_selectors,
      classification.non_hover_selectors,
    )
  }

  #[test]
  fn keeps_source_order_in_both_partitions() {
    assert_eq!(
      split(".a:hover, .b, .c:not(:hover), .d, :is(.e:hover) .f"),
      (
        vec![
          ".a:hover".to_string(),
          ".c:not(:hover)".to_string(),
          ":is(.e:hover) .f".to_string()
        ],
        vec![".b".to_string(), ".d".to_string()]
      )
    );
  }

  #[test]
  fn moves_whole_branches() {
    let (hover, rest) = split(".js .link:hover .thing");

    assert_eq!(hover, vec![".js .link:hover .thing"]);
    assert!(rest.is_empty());
  }

  #[test]
  fn escaped_hover_is_not_hover() {
    let classification = classify(&parse(".x\\:hover").unwrap());

    assert!(!classification.has_hover());
    assert_eq!(classification.non_hover_selectors, vec![".x\\:hover"]);
  }
}
