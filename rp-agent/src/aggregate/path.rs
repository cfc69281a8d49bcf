// Copyright (c) The test2rp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured identity paths for test entities.

use std::fmt;

/// Identity of one reportable entity: the owning package followed by the
/// `/`-separated components of the test name.
///
/// The segments stay structured rather than being joined into a single
/// delimited string, so a separator character appearing inside a test name
/// can never make two distinct entities collide. The [`Display`](fmt::Display)
/// form joins segments with `|` for remote item names and diagnostics only.
///
/// Invariant: a path always has at least one segment, the package.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct EntityPath {
    segments: Vec<String>,
}

impl EntityPath {
    /// Derives the path for an event's package and (possibly empty) test name.
    pub fn new(package: &str, test: &str) -> Self {
        let mut segments = vec![package.to_owned()];
        if !test.is_empty() {
            segments.extend(test.split('/').map(str::to_owned));
        }
        Self { segments }
    }

    /// The number of hierarchy levels, counting the package.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// True for package-level paths.
    pub fn is_module(&self) -> bool {
        self.segments.len() == 1
    }

    /// The path one level up, or `None` for a module path.
    pub fn parent(&self) -> Option<EntityPath> {
        (self.segments.len() > 1).then(|| EntityPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// All prefixes of this path, shallowest first.
    ///
    /// The last element is always the path itself, and the list has exactly
    /// [`depth`](Self::depth) entries. Each prefix extends the previous one
    /// by a single segment, so walking the result opens parents before
    /// children.
    pub fn breadcrumbs(&self) -> Vec<EntityPath> {
        (1..=self.segments.len())
            .map(|depth| EntityPath {
                segments: self.segments[..depth].to_vec(),
            })
            .collect()
    }

    /// The path segments, package first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn module_path_has_no_parent() {
        let path = EntityPath::new("pkg/a", "");
        assert_eq!(path.depth(), 1);
        assert!(path.is_module());
        assert_eq!(path.parent(), None);
        assert_eq!(path.breadcrumbs(), vec![path.clone()]);
    }

    #[test]
    fn nested_path_breadcrumbs_extend_one_segment_at_a_time() {
        let path = EntityPath::new("pkg/a", "TestFoo/sub/subsub");
        let crumbs = path.breadcrumbs();

        assert_eq!(crumbs.len(), path.depth());
        assert_eq!(crumbs.last(), Some(&path));
        for pair in crumbs.windows(2) {
            assert_eq!(pair[1].parent().as_ref(), Some(&pair[0]));
        }
        assert_eq!(crumbs[0], EntityPath::new("pkg/a", ""));
        assert_eq!(crumbs[1], EntityPath::new("pkg/a", "TestFoo"));
    }

    #[test]
    fn display_joins_with_pipe() {
        let path = EntityPath::new("pkg/a", "TestFoo/sub");
        assert_eq!(path.to_string(), "pkg/a|TestFoo|sub");
    }

    #[test]
    fn separator_in_test_name_does_not_collide() {
        // "Test|x" as a single segment vs "Test" and "x" as two.
        let single = EntityPath::new("pkg", "Test|x");
        let nested = EntityPath::new("pkg", "Test/x");
        assert_ne!(single, nested);
        assert_eq!(single.depth(), 2);
        assert_eq!(nested.depth(), 3);
    }
}
