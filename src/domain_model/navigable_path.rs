use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Immutable, hierarchical dotted path identifying a position in a query or
/// result graph relative to a root (e.g. `e.department.employees`).
///
/// Paths are the universal key correlating SQL AST nodes, result/fetch
/// builders, and runtime initializers. They are never mutated after
/// construction; `append` returns a new path sharing the parent chain.
#[derive(Debug, Clone)]
pub struct NavigablePath {
    inner: Arc<PathNode>,
}

#[derive(Debug)]
struct PathNode {
    parent: Option<NavigablePath>,
    local_name: String,
    full_path: String,
}

impl NavigablePath {
    /// Create a root path from an identification variable or entity name.
    pub fn root(name: impl Into<String>) -> Self {
        let name = name.into();
        NavigablePath {
            inner: Arc::new(PathNode {
                parent: None,
                full_path: name.clone(),
                local_name: name,
            }),
        }
    }

    /// Create a child path for one navigation step.
    pub fn append(&self, name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        NavigablePath {
            inner: Arc::new(PathNode {
                parent: Some(self.clone()),
                local_name: name.to_string(),
                full_path: format!("{}.{}", self.inner.full_path, name),
            }),
        }
    }

    pub fn parent(&self) -> Option<&NavigablePath> {
        self.inner.parent.as_ref()
    }

    pub fn local_name(&self) -> &str {
        &self.inner.local_name
    }

    pub fn full_path(&self) -> &str {
        &self.inner.full_path
    }

    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    /// Number of navigation steps from the root (a root path has depth 0).
    pub fn depth(&self) -> usize {
        match &self.inner.parent {
            Some(p) => p.depth() + 1,
            None => 0,
        }
    }
}

// The full string form encodes the parent chain, so two paths are equal iff
// their string forms and parent chains match.
impl PartialEq for NavigablePath {
    fn eq(&self, other: &Self) -> bool {
        self.inner.full_path == other.inner.full_path
    }
}

impl Eq for NavigablePath {}

impl Hash for NavigablePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.full_path.hash(state);
    }
}

impl fmt::Display for NavigablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.full_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_append_builds_dotted_form() {
        let path = NavigablePath::root("e").append("department").append("name");
        assert_eq!(path.full_path(), "e.department.name");
        assert_eq!(path.local_name(), "name");
        assert_eq!(path.depth(), 2);
        assert_eq!(path.parent().unwrap().full_path(), "e.department");
    }

    #[test]
    fn test_equality_follows_string_form() {
        let a = NavigablePath::root("e").append("department");
        let b = NavigablePath::root("e").append("department");
        let c = NavigablePath::root("e").append("address");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut map = HashMap::new();
        map.insert(a, 1);
        assert_eq!(map.get(&b), Some(&1));
    }

    #[test]
    fn test_root_path() {
        let root = NavigablePath::root("e");
        assert!(root.is_root());
        assert_eq!(root.depth(), 0);
        assert!(root.parent().is_none());
    }
}
