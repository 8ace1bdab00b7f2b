//! The two embarkation points the ferry alternates between.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two fixed sides of the crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Side 0.
    West,
    /// Side 1.
    East,
}

impl Side {
    /// Both sides, in index order.
    pub const ALL: [Self; 2] = [Self::West, Self::East];

    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::West => Self::East,
            Self::East => Self::West,
        }
    }

    /// Numeric index (`0` for west, `1` for east).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::West => 0,
            Self::East => 1,
        }
    }

    /// Side reached after `crossings` transits starting from `self`.
    #[must_use]
    pub const fn after_crossings(self, crossings: u64) -> Self {
        if crossings % 2 == 0 {
            self
        } else {
            self.opposite()
        }
    }
}

impl From<bool> for Side {
    fn from(east: bool) -> Self {
        if east {
            Self::East
        } else {
            Self::West
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_is_involution() {
        for side in Side::ALL {
            assert_ne!(side, side.opposite());
            assert_eq!(side, side.opposite().opposite());
        }
    }

    #[test]
    fn test_after_crossings_parity() {
        assert_eq!(Side::West.after_crossings(0), Side::West);
        assert_eq!(Side::West.after_crossings(1), Side::East);
        assert_eq!(Side::East.after_crossings(7), Side::West);
        assert_eq!(Side::East.after_crossings(10), Side::East);
    }

    #[test]
    fn test_display_uses_index() {
        assert_eq!(Side::West.to_string(), "0");
        assert_eq!(Side::East.to_string(), "1");
    }
}
