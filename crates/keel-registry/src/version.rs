//! Version bounds, ranges and specs as written in registry files.
//!
//! A [`VersionBound`] has zero to three numeric components. A bound with fewer than
//! three components matches every version sharing that prefix, so the range `1-1.1`
//! covers `1.0.0` up to and including every `1.1.x`. A [`VersionSpec`] is a union of
//! ranges and is what compat entries resolve to.

use std::{cmp::Ordering, fmt, str::FromStr};

use thiserror::Error;

pub use semver::Version;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid version range `{0}`")]
pub struct RangeParseError(pub String);

/// A partially specified version used as one end of a [`VersionRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionBound {
    parts: [u64; 3],
    len: u8,
}

impl VersionBound {
    /// The unbounded bound, written `*`.
    pub const ANY: VersionBound = VersionBound {
        parts: [0; 3],
        len: 0,
    };

    pub fn new(parts: &[u64]) -> Option<Self> {
        if parts.len() > 3 {
            return None;
        }
        let mut bound = Self::ANY;
        bound.parts[..parts.len()].copy_from_slice(parts);
        bound.len = parts.len() as u8;
        Some(bound)
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn parts(&self) -> &[u64] {
        &self.parts[..self.len()]
    }

    /// Compares `version` against this bound, looking only at the bound's components.
    fn cmp_prefix(&self, version: &Version) -> Ordering {
        let triple = [version.major, version.minor, version.patch];
        triple[..self.len()].cmp(self.parts())
    }

    /// `true` if `version` is not below this bound when used as a lower end.
    fn admits_from_below(&self, version: &Version) -> bool {
        match self.cmp_prefix(version) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => self.len() < 3 || version.pre.is_empty(),
        }
    }

    /// `true` if `version` is not above this bound when used as an upper end.
    fn admits_from_above(&self, version: &Version) -> bool {
        self.cmp_prefix(version) != Ordering::Greater
    }
}

impl FromStr for VersionBound {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || RangeParseError(s.to_string());
        if s.is_empty() {
            return Err(err());
        }

        let mut parts = Vec::with_capacity(3);
        let mut wildcard = false;
        for piece in s.split('.') {
            if piece == "*" {
                wildcard = true;
                continue;
            }
            if wildcard || piece.is_empty() || !piece.bytes().all(|b| b.is_ascii_digit()) {
                return Err(err());
            }
            parts.push(piece.parse::<u64>().map_err(|_| err())?);
        }

        VersionBound::new(&parts).ok_or_else(err)
    }
}

impl fmt::Display for VersionBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("*");
        }
        let parts: Vec<String> = self.parts().iter().map(u64::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

/// A closed interval of versions between two bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionRange {
    lower: VersionBound,
    upper: VersionBound,
}

impl VersionRange {
    /// Range containing every version.
    pub const ANY: VersionRange = VersionRange {
        lower: VersionBound::ANY,
        upper: VersionBound::ANY,
    };

    /// Builds a range, rejecting a lower bound that lies above the upper bound.
    pub fn new(lower: VersionBound, upper: VersionBound) -> Option<Self> {
        let lowest = lower.parts;
        let mut highest = [u64::MAX; 3];
        highest[..upper.len()].copy_from_slice(upper.parts());
        (lowest <= highest).then_some(Self { lower, upper })
    }

    pub fn lower(&self) -> &VersionBound {
        &self.lower
    }

    pub fn upper(&self) -> &VersionBound {
        &self.upper
    }

    pub fn contains(&self, version: &Version) -> bool {
        self.lower.admits_from_below(version) && self.upper.admits_from_above(version)
    }
}

impl FromStr for VersionRange {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (lower, upper) = match trimmed.split_once('-') {
            Some((lo, hi)) => (lo.parse()?, hi.parse()?),
            None => {
                let bound: VersionBound = trimmed.parse()?;
                (bound, bound)
            }
        };
        VersionRange::new(lower, upper).ok_or_else(|| RangeParseError(trimmed.to_string()))
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lower == self.upper {
            write!(f, "{}", self.lower)
        } else {
            write!(f, "{}-{}", self.lower, self.upper)
        }
    }
}

/// A union of [`VersionRange`]s.
///
/// Ranges are kept sorted and free of duplicates, so two specs built from the same
/// ranges in any order compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VersionSpec {
    ranges: Vec<VersionRange>,
}

impl VersionSpec {
    /// Spec matching every version.
    pub fn any() -> Self {
        Self {
            ranges: vec![VersionRange::ANY],
        }
    }

    pub fn from_ranges(ranges: impl IntoIterator<Item = VersionRange>) -> Self {
        let mut spec = Self {
            ranges: ranges.into_iter().collect(),
        };
        spec.normalize();
        spec
    }

    /// Parses a list of range strings into their union.
    pub fn parse_list<S: AsRef<str>>(items: &[S]) -> Result<Self, RangeParseError> {
        items
            .iter()
            .map(|item| item.as_ref().parse::<VersionRange>())
            .collect::<Result<Vec<_>, _>>()
            .map(Self::from_ranges)
    }

    pub fn ranges(&self) -> &[VersionRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn is_any(&self) -> bool {
        self.ranges.contains(&VersionRange::ANY)
    }

    pub fn contains(&self, version: &Version) -> bool {
        self.ranges.iter().any(|range| range.contains(version))
    }

    /// Extends this spec with every range of `other`.
    pub fn union(&mut self, other: &VersionSpec) {
        self.ranges.extend_from_slice(&other.ranges);
        self.normalize();
    }

    fn normalize(&mut self) {
        self.ranges.sort();
        self.ranges.dedup();
    }
}

impl From<VersionRange> for VersionSpec {
    fn from(range: VersionRange) -> Self {
        Self {
            ranges: vec![range],
        }
    }
}

impl FromStr for VersionSpec {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<VersionRange>().map(Self::from)
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [single] = self.ranges.as_slice() {
            return write!(f, "{single}");
        }
        let ranges: Vec<String> = self.ranges.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", ranges.join(", "))
    }
}
