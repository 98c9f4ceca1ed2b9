//! Coefficient store.
//!
//! Each filter stage owns a [`CoefficientBank`]. Register writes go to a
//! shadow copy, which is what register reads return. The stage copies the
//! shadow into the active copy with [`CoefficientBank::commit`] when it
//! accepts an input sample, which never happens while a convolution is in
//! flight. The datapath only ever sees the active copy.

/// Coefficient bank of a filter stage with `N` taps.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct CoefficientBank<const N: usize> {
    shadow: [i32; N],
    active: [i32; N],
    dirty: bool,
}

impl<const N: usize> CoefficientBank<N> {
    /// Creates a bank with the given coefficients already active.
    pub fn new(coefficients: [i32; N]) -> CoefficientBank<N> {
        CoefficientBank {
            shadow: coefficients,
            active: coefficients,
            dirty: false,
        }
    }

    /// Number of coefficient slots.
    pub const fn len(&self) -> usize {
        N
    }

    /// Returns `true` if the bank has no slots.
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Writes a raw register word into a slot of the shadow copy.
    ///
    /// The word is stored as-is and interpreted as a signed Q1.15 coefficient
    /// by the datapath. Returns `false` if the slot does not exist.
    pub fn write(&mut self, slot: usize, word: u32) -> bool {
        match self.shadow.get_mut(slot) {
            Some(c) => {
                *c = word as i32;
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Reads the raw register word of a slot of the shadow copy.
    pub fn read(&self, slot: usize) -> Option<u32> {
        self.shadow.get(slot).map(|&c| c as u32)
    }

    /// Returns `true` if there are writes that have not been committed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Makes the shadow copy active.
    ///
    /// Returns `true` if the active coefficients changed.
    pub fn commit(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.dirty = false;
        if self.active == self.shadow {
            return false;
        }
        self.active = self.shadow;
        true
    }

    /// Coefficients used by the datapath.
    pub fn active(&self) -> &[i32; N] {
        &self.active
    }

    /// Coefficients as seen through the register interface.
    pub fn shadow(&self) -> &[i32; N] {
        &self.shadow
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn writes_are_buffered() {
        let mut bank = CoefficientBank::new([1, 2, 3]);
        assert!(!bank.is_dirty());
        assert!(bank.write(1, 0x8765_4321));
        assert_eq!(bank.read(1), Some(0x8765_4321));
        assert_eq!(bank.active(), &[1, 2, 3]);
        assert!(bank.is_dirty());
        assert!(bank.commit());
        assert_eq!(bank.active(), &[1, 0x8765_4321u32 as i32, 3]);
        assert!(!bank.commit());
    }

    #[test]
    fn out_of_range_slot() {
        let mut bank = CoefficientBank::new([0; 4]);
        assert!(!bank.write(4, 1));
        assert_eq!(bank.read(4), None);
        assert!(!bank.is_dirty());
        assert_eq!(bank.len(), 4);
    }

    #[test]
    fn rewriting_same_value() {
        let mut bank = CoefficientBank::new([7; 2]);
        bank.write(0, 7);
        assert!(bank.is_dirty());
        assert!(!bank.commit());
        assert!(!bank.is_dirty());
    }
}
