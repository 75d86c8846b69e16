//! Glob exclusions applied while walking a directory.

use glob::{MatchOptions, Pattern};

use crate::tree::TreeError;

/// A compiled set of glob patterns matched against single file names.
///
/// Patterns never see the path above an entry: `build` excludes every file
/// or directory named `build` at any depth, and `*.o` excludes object files
/// anywhere in the tree.
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    patterns: Vec<Pattern>,
}

impl Exclusions {
    /// Compile `patterns`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::BadPattern`] for the first pattern that is not a
    /// valid glob.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, TreeError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p.as_ref()).map_err(|source| TreeError::BadPattern {
                    pattern: p.as_ref().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// An empty set that excludes nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether `name` matches any pattern.
    pub fn is_excluded(&self, name: &str) -> bool {
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        self.patterns
            .iter()
            .any(|p| p.matches_with(name, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_and_wildcard() {
        let ex = Exclusions::new(&["build", "*.o", ".git*"]).unwrap();
        assert!(ex.is_excluded("build"));
        assert!(ex.is_excluded("main.o"));
        assert!(ex.is_excluded(".gitignore"));
        assert!(!ex.is_excluded("builds"));
        assert!(!ex.is_excluded("main.rs"));
    }

    #[test]
    fn empty_excludes_nothing() {
        let ex = Exclusions::none();
        assert!(!ex.is_excluded("anything"));
        assert!(!ex.is_excluded(""));
        assert!(!ex.is_excluded(".git"));
    }

    #[test]
    fn bad_pattern_is_reported() {
        let err = Exclusions::new(&["[unclosed"]).unwrap_err();
        assert!(matches!(err, TreeError::BadPattern { .. }));
    }
}
