use crate::Timestamp;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// A dependency edge from one file to another, by filename.
///
/// An `overrides` edge supersedes whatever edge to the same file was
/// inherited from an earlier merge, instead of being combined with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub filename: String,
    pub timestamp: Timestamp,
    pub overrides: bool,
}
impl Dependency {
    pub fn new(filename: impl Into<String>, timestamp: Timestamp, overrides: bool) -> Self {
        Self {
            filename: filename.into(),
            timestamp,
            overrides,
        }
    }

    /// Fold a later edge to the same file into this one.
    pub(crate) fn absorb(&mut self, later: Dependency) {
        debug_assert_eq!(self.filename, later.filename);
        if later.overrides {
            *self = later;
        } else {
            // An additive edge never un-sets an override and never moves the
            // required timestamp backwards.
            self.timestamp = self.timestamp.max(later.timestamp);
        }
    }
}

impl Display for Dependency {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}@{}", self.filename, self.timestamp)?;
        if self.overrides {
            write!(f, " (overrides)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn dep(timestamp: u64, overrides: bool) -> Dependency {
        Dependency::new("a.jar", Timestamp::new(timestamp), overrides)
    }

    #[rstest]
    #[case(dep(10, false), dep(5, true), dep(5, true))]
    #[case(dep(10, true), dep(20, false), dep(20, true))]
    #[case(dep(10, false), dep(5, false), dep(10, false))]
    fn test_absorb(#[case] earlier: Dependency, #[case] later: Dependency, #[case] expected: Dependency) {
        let mut earlier = earlier;
        earlier.absorb(later);
        assert_eq!(earlier, expected);
    }
}
