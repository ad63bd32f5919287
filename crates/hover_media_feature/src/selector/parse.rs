use std::sync::Arc;

use swc_core::common::{BytePos, FileName, SourceMap, Spanned, input::StringInput};
use swc_core::css::ast::{
  self, AttributeSelector, AttributeSelectorMatcherValue, AttributeSelectorValue, CombinatorValue,
  ComplexSelectorChildren, ForgivingComplexSelector, ForgivingRelativeSelector, Ident, Namespace,
  NamespacePrefix, PseudoClassSelectorChildren, PseudoElementSelectorChildren,
  QualifiedRulePrelude, Stylesheet, SubclassSelector, TypeSelector,
};
use swc_core::css::parser::{error::Error, parse_string_input, parser::ParserConfig};

use super::{
  Combinator, Component, Matcher, PseudoArgument, Selector, SelectorList, SelectorParseError,
};

/// Functional pseudos whose argument is a keyword, string or formula and is
/// kept as text.
const RAW_ARGUMENT_PSEUDOS: &[&str] = &[
  "active-view-transition-type",
  "dir",
  "highlight",
  "lang",
  "nth-col",
  "nth-last-col",
  "nth-last-of-type",
  "nth-of-type",
  "part",
  "state",
  "view-transition-group",
  "view-transition-image-pair",
  "view-transition-new",
  "view-transition-old",
];

/// Parse a selector list with swc's CSS parser and lower it into the
/// selector model. Arguments of functional pseudos the parser does not know
/// are parsed again as selector lists so nothing inside them is missed.
pub fn parse(input: &str) -> Result<SelectorList, SelectorParseError> {
  if input.trim().is_empty() {
    return Err(SelectorParseError::new("Expected a selector", 0, input));
  }

  let css = format!("{input}{{}}");
  let cm: Arc<SourceMap> = Default::default();
  let fm = cm.new_source_file(FileName::Custom("selector.css".into()).into(), css);
  let lowering = Lowering {
    input,
    base: fm.start_pos.0,
  };

  let mut errors = vec![];
  let stylesheet = parse_string_input::<Stylesheet>(
    StringInput::from(&*fm),
    None,
    ParserConfig::default(),
    &mut errors,
  )
  .map_err(|error| lowering.parser_error(error))?;
  if let Some(error) = errors.into_iter().next() {
    return Err(lowering.parser_error(error));
  }

  let mut rules = stylesheet.rules.into_iter();
  let (Some(ast::Rule::QualifiedRule(rule)), None) = (rules.next(), rules.next()) else {
    return Err(lowering.error("Expected a selector", 0));
  };
  match &rule.prelude {
    QualifiedRulePrelude::SelectorList(list) => lowering.selector_list(list),
    QualifiedRulePrelude::RelativeSelectorList(_) => {
      Err(lowering.error("Selector cannot start with a combinator", 0))
    }
    QualifiedRulePrelude::ListOfComponentValues(values) => {
      Err(lowering.error("Expected a selector", lowering.offset(values.span.lo)))
    }
  }
}

fn combinator(combinator: &ast::Combinator) -> Combinator {
  match combinator.value {
    CombinatorValue::Descendant => Combinator::Descendant,
    CombinatorValue::Child => Combinator::Child,
    CombinatorValue::NextSibling => Combinator::NextSibling,
    CombinatorValue::LaterSibling => Combinator::SubsequentSibling,
    CombinatorValue::Column => Combinator::Column,
  }
}

fn ident(ident: &Ident) -> String {
  ident
    .raw
    .as_ref()
    .map(|raw| raw.to_string())
    .unwrap_or_else(|| ident.value.to_string())
}

fn pseudo_name(name: &Ident) -> String {
  ident(name).trim_start_matches(':').to_string()
}

fn namespace_prefix(prefix: Option<&NamespacePrefix>) -> String {
  let Some(prefix) = prefix else {
    return String::new();
  };

  let mut out = String::new();
  match &prefix.namespace {
    Some(Namespace::Named(named)) => out.push_str(&ident(&named.name)),
    Some(Namespace::Any(_)) => out.push('*'),
    None => {}
  }
  out.push('|');
  out
}

fn type_matcher(selector: &TypeSelector) -> Matcher {
  match selector {
    TypeSelector::TagName(tag) => Matcher::Tag(format!(
      "{}{}",
      namespace_prefix(tag.name.prefix.as_ref()),
      ident(&tag.name.value)
    )),
    TypeSelector::Universal(universal) => Matcher::Universal(format!(
      "{}*",
      namespace_prefix(universal.prefix.as_ref())
    )),
  }
}

/// `name`, operator, value and modifier with no padding: `lang|="en" i`.
fn attribute(selector: &AttributeSelector) -> String {
  let mut out = namespace_prefix(selector.name.prefix.as_ref());
  out.push_str(&ident(&selector.name.value));
  if let Some(matcher) = &selector.matcher {
    out.push_str(match matcher.value {
      AttributeSelectorMatcherValue::Equals => "=",
      AttributeSelectorMatcherValue::Tilde => "~=",
      AttributeSelectorMatcherValue::Bar => "|=",
      AttributeSelectorMatcherValue::Caret => "^=",
      AttributeSelectorMatcherValue::Dollar => "$=",
      AttributeSelectorMatcherValue::Asterisk => "*=",
    });
  }
  match &selector.value {
    Some(AttributeSelectorValue::Str(value)) => match &value.raw {
      Some(raw) => out.push_str(raw),
      None => out.push_str(&format!("\"{}\"", value.value)),
    },
    Some(AttributeSelectorValue::Ident(value)) => out.push_str(&ident(value)),
    None => {}
  }
  if let Some(modifier) = &selector.modifier {
    out.push(' ');
    out.push_str(&ident(&modifier.value));
  }
  out
}

fn flush(matchers: &mut Vec<Matcher>, components: &mut Vec<Component>) {
  if !matchers.is_empty() {
    components.push(Component::Compound(std::mem::take(matchers)));
  }
}

/// Lowers swc nodes parsed from `input`; spans are relative to `base`.
struct Lowering<'a> {
  input: &'a str,
  base: u32,
}

impl Lowering<'_> {
  fn error(&self, message: impl Into<String>, offset: usize) -> SelectorParseError {
    SelectorParseError::new(message, offset, self.input)
  }

  fn parser_error(&self, error: Error) -> SelectorParseError {
    let message = error.message().into_owned();
    let (span, _) = *error.into_inner();
    self.error(message, self.offset(span.lo))
  }

  fn offset(&self, position: BytePos) -> usize {
    (position.0.saturating_sub(self.base) as usize).min(self.input.len())
  }

  fn text(&self, lo: BytePos, hi: BytePos) -> &str {
    self
      .input
      .get(self.offset(lo)..self.offset(hi))
      .unwrap_or_default()
      .trim()
  }

  /// Parse text the swc parser kept as plain component values.
  fn reparse(&self, lo: BytePos, hi: BytePos) -> Result<SelectorList, SelectorParseError> {
    let start = self.offset(lo);
    let rest = self.input.get(start..).unwrap_or_default();
    let leading = rest.len() - rest.trim_start().len();
    parse(self.text(lo, hi))
      .map_err(|error| self.error(error.message, start + leading + error.offset))
  }

  fn selector_list(&self, list: &ast::SelectorList) -> Result<SelectorList, SelectorParseError> {
    let selectors = list
      .children
      .iter()
      .map(|selector| self.complex(selector))
      .collect::<Result<Vec<_>, _>>()?;
    Ok(SelectorList { selectors })
  }

  fn complex(&self, selector: &ast::ComplexSelector) -> Result<Selector, SelectorParseError> {
    let mut components = Vec::new();
    self.complex_into(selector, &mut components)?;
    Ok(Selector { components })
  }

  fn relative(&self, selector: &ast::RelativeSelector) -> Result<Selector, SelectorParseError> {
    let mut components = Vec::new();
    if let Some(leading) = &selector.combinator {
      components.push(Component::Combinator(combinator(leading)));
    }
    self.complex_into(&selector.selector, &mut components)?;
    Ok(Selector { components })
  }

  fn compound_selector(
    &self,
    compound: &ast::CompoundSelector,
  ) -> Result<Selector, SelectorParseError> {
    let mut components = Vec::new();
    self.compound(compound, &mut components)?;
    Ok(Selector { components })
  }

  fn complex_into(
    &self,
    selector: &ast::ComplexSelector,
    components: &mut Vec<Component>,
  ) -> Result<(), SelectorParseError> {
    for child in &selector.children {
      match child {
        ComplexSelectorChildren::CompoundSelector(compound) => self.compound(compound, components)?,
        ComplexSelectorChildren::Combinator(value) => {
          components.push(Component::Combinator(combinator(value)))
        }
      }
    }
    Ok(())
  }

  /// Matchers are grouped into compounds, split wherever a pseudo appears.
  fn compound(
    &self,
    compound: &ast::CompoundSelector,
    components: &mut Vec<Component>,
  ) -> Result<(), SelectorParseError> {
    let mut matchers = Vec::new();
    if compound.nesting_selector.is_some() {
      matchers.push(Matcher::Nesting);
    }
    if let Some(selector) = &compound.type_selector {
      matchers.push(type_matcher(selector));
    }

    for subclass in &compound.subclass_selectors {
      match subclass {
        SubclassSelector::Class(class) => matchers.push(Matcher::Class(ident(&class.text))),
        SubclassSelector::Id(id) => matchers.push(Matcher::Id(ident(&id.text))),
        SubclassSelector::Attribute(selector) => {
          matchers.push(Matcher::Attribute(attribute(selector)))
        }
        SubclassSelector::PseudoClass(pseudo) => {
          flush(&mut matchers, components);
          components.push(self.pseudo_class(pseudo)?);
        }
        SubclassSelector::PseudoElement(pseudo) => {
          flush(&mut matchers, components);
          components.push(self.pseudo_element(pseudo)?);
        }
      }
    }

    flush(&mut matchers, components);
    Ok(())
  }

  fn pseudo_class(
    &self,
    pseudo: &ast::PseudoClassSelector,
  ) -> Result<Component, SelectorParseError> {
    let name = pseudo_name(&pseudo.name);
    let Some(children) = &pseudo.children else {
      return Ok(Component::SimplePseudo {
        name,
        element: false,
      });
    };

    let mut formula = None;
    let mut selectors = Vec::new();
    let mut has_selectors = false;
    for child in children {
      match child {
        PseudoClassSelectorChildren::SelectorList(list) => {
          selectors.extend(self.selector_list(list)?.selectors);
          has_selectors = true;
        }
        PseudoClassSelectorChildren::RelativeSelectorList(list) => {
          for selector in &list.children {
            selectors.push(self.relative(selector)?);
          }
          has_selectors = true;
        }
        PseudoClassSelectorChildren::ForgivingSelectorList(list) => {
          for selector in &list.children {
            match selector {
              ForgivingComplexSelector::ComplexSelector(selector) => {
                selectors.push(self.complex(selector)?)
              }
              ForgivingComplexSelector::ListOfComponentValues(values) => {
                selectors.extend(self.reparse(values.span.lo, values.span.hi)?.selectors)
              }
            }
          }
          has_selectors = true;
        }
        PseudoClassSelectorChildren::ForgivingRelativeSelectorList(list) => {
          for selector in &list.children {
            match selector {
              ForgivingRelativeSelector::RelativeSelector(selector) => {
                selectors.push(self.relative(selector)?)
              }
              ForgivingRelativeSelector::ListOfComponentValues(values) => {
                selectors.extend(self.reparse(values.span.lo, values.span.hi)?.selectors)
              }
            }
          }
          has_selectors = true;
        }
        PseudoClassSelectorChildren::CompoundSelectorList(list) => {
          for compound in &list.children {
            selectors.push(self.compound_selector(compound)?);
          }
          has_selectors = true;
        }
        PseudoClassSelectorChildren::ComplexSelector(selector) => {
          selectors.push(self.complex(selector)?);
          has_selectors = true;
        }
        PseudoClassSelectorChildren::CompoundSelector(compound) => {
          selectors.push(self.compound_selector(compound)?);
          has_selectors = true;
        }
        PseudoClassSelectorChildren::AnPlusB(_) => {
          let span = child.span();
          formula = Some(self.text(span.lo, span.hi).to_string());
        }
        PseudoClassSelectorChildren::Ident(_)
        | PseudoClassSelectorChildren::Str(_)
        | PseudoClassSelectorChildren::Delimiter(_)
        | PseudoClassSelectorChildren::PreservedToken(_) => {}
      }
    }

    let argument = match formula {
      Some(formula) => PseudoArgument::Nth {
        formula,
        of: has_selectors.then_some(SelectorList { selectors }),
      },
      None if has_selectors => PseudoArgument::Selectors(SelectorList { selectors }),
      None => self.unparsed_argument(&name, children.iter().map(Spanned::span)),
    };
    Ok(Component::FunctionalPseudo {
      name,
      element: false,
      argument,
    })
  }

  fn pseudo_element(
    &self,
    pseudo: &ast::PseudoElementSelector,
  ) -> Result<Component, SelectorParseError> {
    let name = pseudo_name(&pseudo.name);
    let Some(children) = &pseudo.children else {
      return Ok(Component::SimplePseudo {
        name,
        element: true,
      });
    };

    let mut selectors = Vec::new();
    for child in children {
      if let PseudoElementSelectorChildren::CompoundSelector(compound) = child {
        selectors.push(self.compound_selector(compound)?);
      }
    }

    let argument = if selectors.is_empty() {
      self.unparsed_argument(&name, children.iter().map(Spanned::span))
    } else {
      PseudoArgument::Selectors(SelectorList { selectors })
    };
    Ok(Component::FunctionalPseudo {
      name,
      element: true,
      argument,
    })
  }

  /// Arguments swc kept as tokens: selector lists unless the pseudo takes a
  /// keyword or the text does not parse.
  fn unparsed_argument<I>(&self, name: &str, spans: I) -> PseudoArgument
  where
    I: Iterator<Item = swc_core::common::Span>,
  {
    let mut spans = spans.peekable();
    let Some(first) = spans.peek().copied() else {
      return PseudoArgument::Raw(String::new());
    };
    let last = spans.last().unwrap_or(first);
    let text = self.text(first.lo, last.hi);

    if text.is_empty() || RAW_ARGUMENT_PSEUDOS.contains(&name.to_ascii_lowercase().as_str()) {
      return PseudoArgument::Raw(text.to_string());
    }
    match parse(text) {
      Ok(list) => PseudoArgument::Selectors(list),
      Err(error) => {
        tracing::trace!(pseudo = name, %error, "keeping pseudo argument as text");
        PseudoArgument::Raw(text.to_string())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  fn compound(matchers: Vec<Matcher>) -> Component {
    Component::Compound(matchers)
  }

  fn hover() -> Component {
    Component::SimplePseudo {
      name: "hover".into(),
      element: false,
    }
  }

  fn selectors(component: &Component) -> &SelectorList {
    let Component::FunctionalPseudo {
      argument: PseudoArgument::Selectors(list),
      ..
    } = component
    else {
      panic!("expected a selector list argument, got {component:?}");
    };
    list
  }

  #[test]
  fn parses_compounds_combinators_and_pseudos() {
    let list = parse(".a > b.c:hover::before").unwrap();

    assert_eq!(
      list.selectors[0].components,
      vec![
        compound(vec![Matcher::Class("a".into())]),
        Component::Combinator(Combinator::Child),
        compound(vec![Matcher::Tag("b".into()), Matcher::Class("c".into())]),
        hover(),
        Component::SimplePseudo {
          name: "before".into(),
          element: true,
        },
      ]
    );
  }

  #[test]
  fn whitespace_between_compounds_is_a_descendant_combinator() {
    let list = parse("  .js   .link  ,  a  ").unwrap();

    assert_eq!(list.len(), 2);
    assert_eq!(
      list.selectors[0].components,
      vec![
        compound(vec![Matcher::Class("js".into())]),
        Component::Combinator(Combinator::Descendant),
        compound(vec![Matcher::Class("link".into())]),
      ]
    );
    assert_eq!(
      list.selectors[1].components,
      vec![compound(vec![Matcher::Tag("a".into())])]
    );
  }

  #[test]
  fn parses_nested_selector_lists() {
    let list = parse(":is(button, [role=\"button\"]):hover").unwrap();

    assert_eq!(
      list.selectors[0].components,
      vec![
        Component::FunctionalPseudo {
          name: "is".into(),
          element: false,
          argument: PseudoArgument::Selectors(SelectorList {
            selectors: vec![
              Selector {
                components: vec![compound(vec![Matcher::Tag("button".into())])],
              },
              Selector {
                components: vec![compound(vec![Matcher::Attribute(
                  "role=\"button\"".into()
                )])],
              },
            ],
          }),
        },
        hover(),
      ]
    );
  }

  #[test]
  fn parses_arguments_of_unknown_pseudos_as_selectors() {
    let list = parse(":deep(.a:hover)").unwrap();
    assert_eq!(
      selectors(&list.selectors[0].components[0]).selectors[0].components,
      vec![compound(vec![Matcher::Class("a".into())]), hover()]
    );

    let list = parse(".a::v-deep(.b:hover)").unwrap();
    let Component::FunctionalPseudo { name, element, .. } = &list.selectors[0].components[1] else {
      panic!("expected functional pseudo-element");
    };
    assert_eq!((name.as_str(), *element), ("v-deep", true));
    assert_eq!(
      selectors(&list.selectors[0].components[1]).selectors[0].components[1],
      hover()
    );
  }

  #[test]
  fn keeps_keyword_arguments_as_text() {
    let list = parse(":lang(en), ::part(label), :deep(!)").unwrap();
    let components: Vec<_> = list
      .iter()
      .map(|selector| selector.components[0].clone())
      .collect();

    assert_eq!(
      components[0],
      Component::FunctionalPseudo {
        name: "lang".into(),
        element: false,
        argument: PseudoArgument::Raw("en".into()),
      }
    );
    assert_eq!(
      components[1],
      Component::FunctionalPseudo {
        name: "part".into(),
        element: true,
        argument: PseudoArgument::Raw("label".into()),
      }
    );
    assert_eq!(
      components[2],
      Component::FunctionalPseudo {
        name: "deep".into(),
        element: false,
        argument: PseudoArgument::Raw("!".into()),
      }
    );
  }

  #[test]
  fn parses_nth_formulas_with_of_lists() {
    let list = parse("li:nth-child(2n + 1 of .x:hover)").unwrap();
    let components = &list.selectors[0].components;

    let Component::FunctionalPseudo { argument, .. } = &components[1] else {
      panic!("expected functional pseudo");
    };
    let PseudoArgument::Nth { formula, of } = argument else {
      panic!("expected nth argument");
    };
    assert_eq!(formula, "2n + 1");
    assert_eq!(of.as_ref().map(SelectorList::len), Some(1));
  }

  #[test]
  fn keeps_escapes_inside_names() {
    let list = parse(".x\\:hover").unwrap();

    assert_eq!(
      list.selectors[0].components,
      vec![compound(vec![Matcher::Class("x\\:hover".into())])]
    );
  }

  #[test]
  fn allows_relative_selectors_in_has() {
    let list = parse("a:has(> img)").unwrap();
    let inner = selectors(&list.selectors[0].components[1]);

    assert_eq!(
      inner.selectors[0].components[0],
      Component::Combinator(Combinator::Child)
    );
  }

  #[test]
  fn parses_namespaces_and_nesting() {
    let list = parse("svg|a, *|*, &.b").unwrap();

    assert_eq!(
      list.selectors[0].components,
      vec![compound(vec![Matcher::Tag("svg|a".into())])]
    );
    assert_eq!(
      list.selectors[1].components,
      vec![compound(vec![Matcher::Universal("*|*".into())])]
    );
    assert_eq!(
      list.selectors[2].components,
      vec![compound(vec![Matcher::Nesting, Matcher::Class("b".into())])]
    );
  }

  #[test]
  fn normalises_attribute_whitespace() {
    let list = parse("[ data-state = \"open\" ], [ lang |= en i ]").unwrap();

    assert_eq!(
      list.selectors[0].components,
      vec![compound(vec![Matcher::Attribute("data-state=\"open\"".into())])]
    );
    assert_eq!(
      list.selectors[1].components,
      vec![compound(vec![Matcher::Attribute("lang|=en i".into())])]
    );
  }

  #[test]
  fn rejects_malformed_selectors() {
    let inputs = [
      "", "   ", "a,,b", "a,", "a >", "a > > b", "> a", ":is(a", "a)", "[a", "a:", "a { }", ".",
    ];

    for input in inputs {
      let error = parse(input).unwrap_err();
      assert_eq!(error.selector, input);
      assert!(error.offset <= input.len(), "{input}: {error}");
    }

    assert_eq!(
      parse("").unwrap_err(),
      SelectorParseError::new("Expected a selector", 0, "")
    );
  }
}
