//! A set of directions packed into one byte.

use std::fmt;

use crate::engine::Move;

/// Which of the four directions are present, one flag bit each
/// (left, right, up, down from the lowest bit).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MoveSet(u8);

impl MoveSet {
    pub const NONE: MoveSet = MoveSet(0);
    pub const ALL: MoveSet = MoveSet(0b1111);

    /// Build a set from raw flag bits; bits above the fourth are dropped.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self { MoveSet(bits & 0b1111) }

    #[inline]
    pub const fn bits(self) -> u8 { self.0 }

    #[inline]
    pub fn contains(self, dir: Move) -> bool { self.0 & dir.flag() != 0 }

    #[inline]
    pub fn insert(&mut self, dir: Move) { self.0 |= dir.flag(); }

    #[inline]
    pub fn remove(&mut self, dir: Move) { self.0 &= !dir.flag(); }

    #[inline]
    pub fn is_empty(self) -> bool { self.0 == 0 }

    #[inline]
    pub fn len(self) -> usize { self.0.count_ones() as usize }

    /// Remove and return the direction with the lowest flag bit.
    ///
    /// ```
    /// use expectimax_2048::engine::Move;
    /// use expectimax_2048::moveset::MoveSet;
    /// let mut set: MoveSet = [Move::Down, Move::Right].into_iter().collect();
    /// assert_eq!(set.pop(), Some(Move::Right));
    /// assert_eq!(set.pop(), Some(Move::Down));
    /// assert_eq!(set.pop(), None);
    /// ```
    pub fn pop(&mut self) -> Option<Move> {
        if self.0 == 0 {
            return None;
        }
        let idx = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Some(Move::ALL[idx])
    }

    /// Highest-priority direction (left, right, up, down) without removing it.
    ///
    /// Falls back to `Down` when the set is empty. Callers that can see an
    /// empty set should check [`MoveSet::is_empty`] first.
    pub fn first(self) -> Move {
        Move::ALL[..3]
            .iter()
            .copied()
            .find(|&dir| self.contains(dir))
            .unwrap_or(Move::Down)
    }

    /// Iterate in pop order without consuming the set.
    pub fn iter(self) -> impl Iterator<Item = Move> {
        Move::ALL.into_iter().filter(move |&dir| self.contains(dir))
    }
}

impl Iterator for MoveSet {
    type Item = Move;

    fn next(&mut self) -> Option<Move> { self.pop() }

    fn size_hint(&self) -> (usize, Option<usize>) { (self.len(), Some(self.len())) }
}

impl FromIterator<Move> for MoveSet {
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self {
        iter.into_iter().fold(MoveSet::NONE, |mut set, dir| {
            set.insert(dir);
            set
        })
    }
}

impl fmt::Debug for MoveSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
