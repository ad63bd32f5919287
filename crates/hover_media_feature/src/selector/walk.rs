use super::{Component, PseudoArgument, Selector};

/// Visit every component of `selector` depth-first, descending into the
/// selector lists held by functional pseudos. Returning `false` from the
/// callback stops the walk, in which case `false` is returned.
pub fn walk(selector: &Selector, callback: &mut dyn FnMut(&Component) -> bool) -> bool {
  for component in &selector.components {
    if !callback(component) {
      return false;
    }

    let Component::FunctionalPseudo { argument, .. } = component else {
      continue;
    };
    let nested = match argument {
      PseudoArgument::Selectors(list) => Some(list),
      PseudoArgument::Nth { of, .. } => of.as_ref(),
      PseudoArgument::Raw(_) => None,
    };
    for inner in nested.into_iter().flat_map(|list| list.iter()) {
      if !walk(inner, callback) {
        return false;
      }
    }
  }
  true
}

/// `:hover` itself. Pseudo-elements and functional forms do not count.
pub fn is_hover_pseudo(component: &Component) -> bool {
  matches!(
    component,
    Component::SimplePseudo { name, element: false } if name == "hover"
  )
}

/// Whether `:hover` appears anywhere in the selector, however deeply nested.
pub fn is_hover_selector(selector: &Selector) -> bool {
  !walk(selector, &mut |component| !is_hover_pseudo(component))
}
