use crate::element::Element;
use std::sync::Arc;

/// Glob-style hierarchical lookup over an element tree (§4.9 "Opaq"):
/// `token[/token]*`, where a bare token matches a child by name (or by id
/// when `by_id` is set), `*` matches any single segment, and `**` matches
/// any number of segments including zero. No ordering guarantee beyond
/// depth-first discovery.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathQueryOptions {
    pub by_id: bool,
}

pub fn query_roots(roots: &[Arc<Element>], path: &str) -> Vec<Arc<Element>> {
    query_roots_with(roots, path, PathQueryOptions::default())
}

pub fn query_roots_with(
    roots: &[Arc<Element>],
    path: &str,
    options: PathQueryOptions,
) -> Vec<Arc<Element>> {
    let tokens: Vec<&str> = path.split('/').filter(|t| !t.is_empty()).collect();
    let mut out = Vec::new();
    for root in roots {
        walk(root, &tokens, &options, &mut out);
    }
    out
}

pub fn query_element(element: &Arc<Element>, path: &str) -> Vec<Arc<Element>> {
    query_element_with(element, path, PathQueryOptions::default())
}

pub fn query_element_with(
    element: &Arc<Element>,
    path: &str,
    options: PathQueryOptions,
) -> Vec<Arc<Element>> {
    let tokens: Vec<&str> = path.split('/').filter(|t| !t.is_empty()).collect();
    let mut out = Vec::new();
    for child in element.children() {
        walk(&child, &tokens, &options, &mut out);
    }
    out
}

fn matches_token(token: &str, element: &Arc<Element>, options: &PathQueryOptions) -> bool {
    if token == "*" {
        return true;
    }
    if options.by_id {
        token.parse::<u64>().map(|id| id == element.id.0).unwrap_or(false)
    } else {
        token == element.name()
    }
}

/// Depth-first walk consuming one token per level, except `**` which may
/// consume zero or more levels before the remainder resumes matching.
fn walk(element: &Arc<Element>, tokens: &[&str], options: &PathQueryOptions, out: &mut Vec<Arc<Element>>) {
    match tokens.first() {
        None => {}
        Some(&"**") => {
            // `**` at the end of the path matches this element and every
            // descendant.
            if tokens.len() == 1 {
                out.push(element.clone());
                for child in element.children() {
                    walk(&child, tokens, options, out);
                }
                return;
            }
            // Try consuming zero segments (rest of path matches from here)...
            walk(element, &tokens[1..], options, out);
            // ...or consume this element as one of the `**` segments and
            // keep trying deeper.
            for child in element.children() {
                walk(&child, tokens, options, out);
            }
        }
        Some(token) => {
            if !matches_token(token, element, options) {
                return;
            }
            if tokens.len() == 1 {
                out.push(element.clone());
                return;
            }
            for child in element.children() {
                walk(&child, &tokens[1..], options, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prototype::{Prototype, ShapeKind};

    fn leaf(name: &str) -> Prototype {
        Prototype::new(name, ShapeKind::Rectangle)
    }

    #[test]
    fn single_segment_matches_by_name() {
        let mut root = leaf("root");
        root.add_child(leaf("panel")).unwrap();
        let element = Element::instantiate(&root);
        let found = query_element(&element, "panel");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "panel");
    }

    #[test]
    fn star_matches_any_single_segment() {
        let mut root = leaf("root");
        root.add_child(leaf("a")).unwrap();
        root.add_child(leaf("b")).unwrap();
        let element = Element::instantiate(&root);
        let mut found: Vec<String> = query_element(&element, "*").iter().map(|e| e.name()).collect();
        found.sort();
        assert_eq!(found, vec!["a", "b"]);
    }

    #[test]
    fn double_star_matches_any_depth() {
        let mut root = leaf("root");
        let mut mid = leaf("mid");
        mid.add_child(leaf("deep")).unwrap();
        root.add_child(mid).unwrap();
        let element = Element::instantiate(&root);
        let found = query_element(&element, "**/deep");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "deep");
    }

    #[test]
    fn by_id_option_matches_numeric_id() {
        let mut root = leaf("root");
        let child = leaf("panel");
        let child_id = child.id;
        root.add_child(child).unwrap();
        let element = Element::instantiate(&root);
        let found = query_element_with(&element, &child_id.0.to_string(), PathQueryOptions { by_id: true });
        assert_eq!(found.len(), 1);
    }
}
