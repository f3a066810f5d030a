//! Call-site locations reported by the parser collaborator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A position in a source file.
///
/// `line` is 1-based and `col` is 0-based, the convention source maps use for
/// original positions.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Location {
    /// Line number, starting at 1.
    pub line: u32,
    /// Column offset, starting at 0.
    pub col: u32,
}

impl Location {
    /// Creates a location from a 1-based line and a 0-based column.
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col + 1)
    }
}

/// A location inside a specific importing file.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct CallSite {
    /// Path of the file containing the macro call.
    pub file: PathBuf,
    /// Position of the call inside `file`.
    pub location: Location,
}

impl CallSite {
    /// Creates a new call site.
    pub fn new(file: impl Into<PathBuf>, location: Location) -> Self {
        Self {
            file: file.into(),
            location,
        }
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_one_based_column() {
        assert_eq!(Location::new(3, 0).to_string(), "3:1");
        assert_eq!(Location::new(10, 4).to_string(), "10:5");
    }

    #[test]
    fn call_site_display() {
        let site = CallSite::new("src/main.js", Location::new(18, 14));
        assert_eq!(site.to_string(), "src/main.js:18:15");
    }

    #[test]
    fn ordering_is_line_then_column() {
        assert!(Location::new(1, 9) < Location::new(2, 0));
        assert!(Location::new(2, 1) < Location::new(2, 3));
    }
}
