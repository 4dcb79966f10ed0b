//! Dotted-integer bundle versions.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A bundle version such as `1.12.3`.
///
/// Versions are compared with [`Version::compare`], which only looks at the
/// components both versions have. `1.2` and `1.2.5` therefore compare equal,
/// and a candidate must differ within the shared prefix to count as newer.
/// `Version` deliberately does not implement `Ord`: that relation is not a
/// total order consistent with `Eq`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    components: Vec<u64>,
}

impl Version {
    /// Parse a dotted sequence of non-negative integers.
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.trim();
        if text.is_empty() {
            return Err("empty version".to_string());
        }

        let components = text
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(format!("invalid version component {part:?} in {text:?}"));
                }
                part.parse::<u64>()
                    .map_err(|e| format!("invalid version component {part:?}: {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { components })
    }

    /// Version components, most significant first.
    #[must_use]
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// Compare component-wise over the shared prefix.
    ///
    /// The first differing component decides; trailing components of the
    /// longer version are ignored.
    #[must_use]
    pub fn compare(&self, other: &Version) -> Ordering {
        self.components
            .iter()
            .zip(&other.components)
            .map(|(a, b)| a.cmp(b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Whether this version is strictly newer than `other`.
    #[must_use]
    pub fn is_newer_than(&self, other: &Version) -> bool {
        self.compare(other) == Ordering::Greater
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.components {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{component}")?;
            first = false;
        }
        Ok(())
    }
}
