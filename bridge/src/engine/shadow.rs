//! Shadow scope chain for array-mapping blocks (spec §4.4): each element of a mapped array gets
//! its own "current element" binding, layered over whatever shadow was active when the mapping
//! wire itself was evaluated. A plain bridge/tool/define body with no active mapping runs under
//! `Shadow::Root`. When mapping blocks nest, the chain holds one `Element` per level, each
//! tagged with its own iterator alias, so a ref several levels down can still reach an outer
//! block's element by walking upward past its own level (spec §4.4 "shadow scope chain").

use std::sync::Arc;

use serde_json::Value;

#[derive(Debug)]
pub enum Shadow {
    Root,
    Element { alias: String, value: Value, index: usize, parent: Arc<Shadow> },
}

impl Default for Shadow {
    fn default() -> Self {
        Shadow::Root
    }
}

impl Shadow {
    pub fn push(self: &Arc<Self>, alias: impl Into<String>, value: Value, index: usize) -> Arc<Shadow> {
        Arc::new(Shadow::Element { alias: alias.into(), value, index, parent: self.clone() })
    }

    /// Finds the element bound to `alias`, walking upward through ancestors when the innermost
    /// level doesn't match. The innermost binding of a name wins, same as a nested loop variable
    /// shadowing an outer one of the same name.
    pub fn resolve(&self, alias: &str) -> Option<&Value> {
        match self {
            Shadow::Root => None,
            Shadow::Element { alias: bound, value, parent, .. } => {
                if bound == alias {
                    Some(value)
                } else {
                    parent.resolve(alias)
                }
            }
        }
    }

    /// Every level's index from outermost to innermost, used to build memo keys that stay
    /// distinct across nested mapping levels instead of only the innermost one.
    pub fn index_path(&self) -> Vec<usize> {
        match self {
            Shadow::Root => Vec::new(),
            Shadow::Element { index, parent, .. } => {
                let mut path = parent.index_path();
                path.push(*index);
                path
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn root_resolves_nothing() {
        let root = Arc::new(Shadow::Root);
        assert_eq!(root.resolve("x"), None);
        assert_eq!(root.index_path(), Vec::<usize>::new());
    }

    #[test]
    fn pushed_element_is_visible_by_its_alias() {
        let root = Arc::new(Shadow::Root);
        let child = root.push("x", json!({"city": "Berlin"}), 2);
        assert_eq!(child.resolve("x"), Some(&json!({"city": "Berlin"})));
        assert_eq!(child.index_path(), vec![2]);
    }

    #[test]
    fn nested_element_resolves_outer_alias_by_walking_up() {
        let root = Arc::new(Shadow::Root);
        let outer = root.push("x", json!({"b": [1, 2, 3]}), 0);
        let inner = outer.push("y", json!(7), 1);
        assert_eq!(inner.resolve("y"), Some(&json!(7)));
        assert_eq!(inner.resolve("x"), Some(&json!({"b": [1, 2, 3]})));
        assert_eq!(inner.resolve("z"), None);
        assert_eq!(inner.index_path(), vec![0, 1]);
    }
}
