use std::fmt;

/// Index of a class or module in the symbol table.
///
/// Class reference types carry this id instead of the class name so that
/// [`WType`](crate::WType) stays `Copy`. Names are recovered through the
/// symbol table when a type has to be printed.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ClassId(u32);

impl ClassId {
    /// Create a class id from a raw index.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        ClassId(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}
