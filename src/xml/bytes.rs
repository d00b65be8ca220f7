//! # Byte quantities with unit suffixes.
//!
//! RAM quota in configurations and state reports is written either as a plain
//! byte count or with a `K`, `M` or `G` suffix (`20M`, `4K`). [`NumberOfBytes`]
//! parses both forms and prints the largest suffix that divides the value
//! exactly, so a value read from a configuration is written back unchanged.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// Byte count, parsed from and printed as `<n>[K|M|G]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NumberOfBytes(u64);

impl NumberOfBytes {
    /// One mebibyte.
    pub const MIB: NumberOfBytes = NumberOfBytes(MIB);

    /// Wraps a raw byte count.
    #[inline]
    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Returns the raw byte count.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns `true` for zero bytes.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Whole mebibytes, rounded down.
    #[inline]
    pub const fn as_mib(self) -> u64 {
        self.0 / MIB
    }
}

impl From<u64> for NumberOfBytes {
    fn from(bytes: u64) -> Self {
        Self(bytes)
    }
}

impl Add for NumberOfBytes {
    type Output = NumberOfBytes;

    fn add(self, rhs: Self) -> Self::Output {
        NumberOfBytes(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for NumberOfBytes {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sum for NumberOfBytes {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(NumberOfBytes::default(), |acc, n| acc + n)
    }
}

impl FromStr for NumberOfBytes {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (digits, unit) = match s.as_bytes().last() {
            Some(b'K') => (&s[..s.len() - 1], KIB),
            Some(b'M') => (&s[..s.len() - 1], MIB),
            Some(b'G') => (&s[..s.len() - 1], GIB),
            _ => (s, 1),
        };
        let n: u64 = digits.parse()?;
        Ok(NumberOfBytes(n.saturating_mul(unit)))
    }
}

impl fmt::Display for NumberOfBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        if v == 0 {
            write!(f, "0")
        } else if v % GIB == 0 {
            write!(f, "{}G", v / GIB)
        } else if v % MIB == 0 {
            write!(f, "{}M", v / MIB)
        } else if v % KIB == 0 {
            write!(f, "{}K", v / KIB)
        } else {
            write!(f, "{v}")
        }
    }
}
