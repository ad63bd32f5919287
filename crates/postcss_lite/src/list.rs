//! Splitting of comma-separated lists that keeps quoted strings, escapes
//! and parenthesised groups intact.

/// Split on top-level commas. A trailing comma yields a final empty item.
pub fn comma(string: &str) -> Vec<String> {
  split(string, &[','], true)
}

/// Shared splitting routine. When `last` is set the final item is kept even
/// if it is empty.
pub fn split(string: &str, separators: &[char], last: bool) -> Vec<String> {
  let mut items = Vec::new();
  let mut current = String::new();

  let mut depth = 0u32;
  let mut quote: Option<char> = None;
  let mut escape = false;

  for ch in string.chars() {
    let mut is_separator = false;

    if escape {
      escape = false;
    } else if ch == '\\' {
      escape = true;
    } else if let Some(open) = quote {
      if ch == open {
        quote = None;
      }
    } else if ch == '"' || ch == '\'' {
      quote = Some(ch);
    } else if ch == '(' || ch == '[' {
      depth = depth.saturating_add(1);
    } else if ch == ')' || ch == ']' {
      depth = depth.saturating_sub(1);
    } else if depth == 0 && separators.contains(&ch) {
      is_separator = true;
    }

    if is_separator {
      if !current.is_empty() {
        items.push(current.trim().to_string());
      }
      current.clear();
    } else {
      current.push(ch);
    }
  }

  if last || !current.is_empty() {
    items.push(current.trim().to_string());
  }

  items
}

#[cfg(test)]
mod tests {
  use super::{comma, split};

  #[test]
  fn comma_splits_and_trims() {
    assert_eq!(comma("a:hover,  .b"), vec!["a:hover", ".b"]);
  }

  #[test]
  fn comma_keeps_trailing_empty_item() {
    assert_eq!(comma("a, b,"), vec!["a", "b", ""]);
  }

  #[test]
  fn comma_respects_functions_and_attributes() {
    assert_eq!(
      comma(":is(a, b):hover, [data-x=\"1,2\"], [a,b]"),
      vec![":is(a, b):hover", "[data-x=\"1,2\"]", "[a,b]"]
    );
  }

  #[test]
  fn comma_keeps_escaped_commas() {
    assert_eq!(comma(".a\\,b, c"), vec![".a\\,b", "c"]);
  }

  #[test]
  fn split_uses_custom_separators() {
    assert_eq!(split("a|b|c", &['|'], false), vec!["a", "b", "c"]);
  }
}
