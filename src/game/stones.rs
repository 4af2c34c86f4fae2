//! Stone Types and Counts
//!
//! The six token colors and a fixed-size count map keyed by color.

use serde::{Serialize, Deserialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Token color. Gold is the wildcard and is never taken by a take action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum StoneType {
    /// Diamond
    White = 0,
    /// Sapphire
    Blue = 1,
    /// Emerald
    Green = 2,
    /// Ruby
    Red = 3,
    /// Onyx
    Black = 4,
    /// Wildcard
    Gold = 5,
}

impl StoneType {
    /// All six colors in canonical order.
    pub const ALL: [StoneType; 6] = [
        StoneType::White,
        StoneType::Blue,
        StoneType::Green,
        StoneType::Red,
        StoneType::Black,
        StoneType::Gold,
    ];

    /// The five gem colors (everything but gold).
    pub const GEMS: [StoneType; 5] = [
        StoneType::White,
        StoneType::Blue,
        StoneType::Green,
        StoneType::Red,
        StoneType::Black,
    ];

    /// Index into a [`StoneMap`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Is this the wildcard color?
    #[inline]
    pub const fn is_gold(self) -> bool {
        matches!(self, StoneType::Gold)
    }

    /// Number of stones of this color in a fresh pool.
    pub const fn initial_supply(self) -> u8 {
        match self {
            StoneType::Gold => 5,
            _ => 7,
        }
    }
}

impl fmt::Display for StoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoneType::White => "white",
            StoneType::Blue => "blue",
            StoneType::Green => "green",
            StoneType::Red => "red",
            StoneType::Black => "black",
            StoneType::Gold => "gold",
        };
        f.write_str(name)
    }
}

/// Count of stones per color. Missing colors are zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoneMap([u8; 6]);

impl StoneMap {
    /// Map with every color at zero.
    pub const EMPTY: StoneMap = StoneMap([0; 6]);

    /// Build from raw counts in canonical order.
    pub const fn from_counts(counts: [u8; 6]) -> Self {
        Self(counts)
    }

    /// Build from the five gem counts (white, blue, green, red, black).
    pub const fn from_gems(gems: [u8; 5]) -> Self {
        Self([gems[0], gems[1], gems[2], gems[3], gems[4], 0])
    }

    /// A fresh pool: 7 of each gem and 5 gold.
    pub fn initial_pool() -> Self {
        let mut pool = Self::EMPTY;
        for stone in StoneType::ALL {
            pool[stone] = stone.initial_supply();
        }
        pool
    }

    /// Build from `(color, count)` pairs. Repeated colors accumulate.
    pub fn of(entries: &[(StoneType, u8)]) -> Self {
        let mut map = Self::EMPTY;
        for &(stone, count) in entries {
            map[stone] += count;
        }
        map
    }

    /// Count for one color.
    #[inline]
    pub fn get(&self, stone: StoneType) -> u8 {
        self.0[stone.index()]
    }

    /// Sum over all colors.
    pub fn total(&self) -> u32 {
        self.0.iter().map(|&c| c as u32).sum()
    }

    /// True when every count is zero.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&c| c == 0)
    }

    /// Iterate `(color, count)` over all six colors, zeros included.
    pub fn iter(&self) -> impl Iterator<Item = (StoneType, u8)> + '_ {
        StoneType::ALL.iter().map(move |&s| (s, self.get(s)))
    }

    /// Iterate only colors with a non-zero count.
    pub fn nonzero(&self) -> impl Iterator<Item = (StoneType, u8)> + '_ {
        self.iter().filter(|&(_, c)| c > 0)
    }

    /// Number of colors with a non-zero count.
    pub fn distinct(&self) -> usize {
        self.nonzero().count()
    }

    /// Element-wise sum, saturating at `u8::MAX`.
    pub fn plus(&self, other: &StoneMap) -> StoneMap {
        let mut out = *self;
        for stone in StoneType::ALL {
            out[stone] = out[stone].saturating_add(other[stone]);
        }
        out
    }

    /// Element-wise difference, or `None` if any color would go negative.
    pub fn checked_minus(&self, other: &StoneMap) -> Option<StoneMap> {
        let mut out = *self;
        for stone in StoneType::ALL {
            out[stone] = out[stone].checked_sub(other[stone])?;
        }
        Some(out)
    }

    /// True when every count is at least the matching count in `other`.
    pub fn covers(&self, other: &StoneMap) -> bool {
        StoneType::ALL.iter().all(|&s| self[s] >= other[s])
    }
}

impl Index<StoneType> for StoneMap {
    type Output = u8;

    fn index(&self, stone: StoneType) -> &u8 {
        &self.0[stone.index()]
    }
}

impl IndexMut<StoneType> for StoneMap {
    fn index_mut(&mut self, stone: StoneType) -> &mut u8 {
        &mut self.0[stone.index()]
    }
}

impl fmt::Display for StoneMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        let mut first = true;
        for (stone, count) in self.nonzero() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", stone, count)?;
            first = false;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_pool_totals_forty() {
        let pool = StoneMap::initial_pool();
        assert_eq!(pool.total(), 40);
        assert_eq!(pool[StoneType::Gold], 5);
        assert_eq!(pool[StoneType::Red], 7);
    }

    #[test]
    fn test_of_accumulates_repeats() {
        let map = StoneMap::of(&[(StoneType::Red, 1), (StoneType::Red, 1), (StoneType::Blue, 1)]);
        assert_eq!(map[StoneType::Red], 2);
        assert_eq!(map.distinct(), 2);
        assert_eq!(map.total(), 3);
    }

    #[test]
    fn test_checked_minus_refuses_negative() {
        let held = StoneMap::of(&[(StoneType::Green, 2)]);
        assert!(held.checked_minus(&StoneMap::of(&[(StoneType::Green, 3)])).is_none());
        assert_eq!(
            held.checked_minus(&StoneMap::of(&[(StoneType::Green, 2)])),
            Some(StoneMap::EMPTY)
        );
    }

    #[test]
    fn test_display_skips_zero_counts() {
        let map = StoneMap::of(&[(StoneType::White, 1), (StoneType::Gold, 2)]);
        assert_eq!(map.to_string(), "{white: 1, gold: 2}");
    }
}
