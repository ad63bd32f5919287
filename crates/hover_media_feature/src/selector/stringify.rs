use super::{Combinator, Component, Matcher, PseudoArgument, Selector, SelectorList};

/// Nested lists are joined without spaces, `:is(a,b)`.
pub fn stringify_list(list: &SelectorList) -> String {
  list
    .iter()
    .map(stringify_selector)
    .collect::<Vec<_>>()
    .join(",")
}

pub fn stringify_selector(selector: &Selector) -> String {
  let mut out = String::new();
  for component in &selector.components {
    stringify_component(component, &mut out);
  }
  out
}

fn combinator(combinator: Combinator) -> &'static str {
  match combinator {
    Combinator::Descendant => " ",
    Combinator::Child => " > ",
    Combinator::NextSibling => " + ",
    Combinator::SubsequentSibling => " ~ ",
    Combinator::Column => " || ",
  }
}

fn stringify_component(component: &Component, out: &mut String) {
  match component {
    Component::Combinator(kind) => {
      // A leading relative combinator (`:has(> a)`) has nothing to its left.
      if out.is_empty() {
        out.push_str(combinator(*kind).trim_start());
      } else {
        out.push_str(combinator(*kind));
      }
    }
    Component::Compound(matchers) => {
      for matcher in matchers {
        stringify_matcher(matcher, out);
      }
    }
    Component::SimplePseudo { name, element } => {
      out.push_str(if *element { "::" } else { ":" });
      out.push_str(name);
    }
    Component::FunctionalPseudo {
      name,
      element,
      argument,
    } => {
      out.push_str(if *element { "::" } else { ":" });
      out.push_str(name);
      out.push('(');
      match argument {
        PseudoArgument::Selectors(list) => out.push_str(&stringify_list(list)),
        PseudoArgument::Nth { formula, of } => {
          out.push_str(formula);
          if let Some(of) = of {
            out.push_str(" of ");
            out.push_str(&stringify_list(of));
          }
        }
        PseudoArgument::Raw(raw) => out.push_str(raw),
      }
      out.push(')');
    }
  }
}

fn stringify_matcher(matcher: &Matcher, out: &mut String) {
  match matcher {
    Matcher::Tag(name) | Matcher::Universal(name) => out.push_str(name),
    Matcher::Class(name) => {
      out.push('.');
      out.push_str(name);
    }
    Matcher::Id(name) => {
      out.push('#');
      out.push_str(name);
    }
    Matcher::Attribute(inner) => {
      out.push('[');
      out.push_str(inner);
      out.push(']');
    }
    Matcher::Nesting => out.push('&'),
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use crate::selector::parse;

  fn canonical(input: &str) -> Vec<String> {
    parse(input)
      .unwrap()
      .iter()
      .map(ToString::to_string)
      .collect()
  }

  #[test]
  fn renders_top_level_selectors_individually() {
    assert_eq!(
      canonical(".this-is-a-class:hover,   .banana"),
      vec![".this-is-a-class:hover", ".banana"]
    );
  }

  #[test]
  fn normalises_whitespace() {
    assert_eq!(
      canonical(":is(button, [role=\"button\"]):hover"),
      vec![":is(button,[role=\"button\"]):hover"]
    );
    assert_eq!(canonical("a>b  +c~  d"), vec!["a > b + c ~ d"]);
    assert_eq!(
      canonical(".s-some-scope p\n  a:hover p"),
      vec![".s-some-scope p a:hover p"]
    );
  }

  #[test]
  fn keeps_arguments_and_escapes() {
    assert_eq!(
      canonical("li:nth-child( 2n+1  of .x ):lang(en)::part(label) .y\\:hover"),
      vec!["li:nth-child(2n+1 of .x):lang(en)::part(label) .y\\:hover"]
    );
    assert_eq!(canonical("a:has(>img)"), vec!["a:has(> img)"]);
  }

  #[test]
  fn normalises_attributes_and_unknown_pseudo_arguments() {
    assert_eq!(canonical("[ a = \"b\" ]"), vec!["[a=\"b\"]"]);
    assert_eq!(
      canonical(":deep( .a:hover  >b )"),
      vec![":deep(.a:hover > b)"]
    );
  }
}
