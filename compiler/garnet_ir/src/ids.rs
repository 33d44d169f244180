//! Arena index newtypes.

/// Define `u32` index newtypes with `new`/`raw`/`index` and a compact `Debug`.
macro_rules! define_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => { $(
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// Get the index as `usize` (for indexing into `Vec`s).
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            /// Index of the next element pushed onto `len`-long storage.
            #[inline]
            pub fn from_len(len: usize) -> Self {
                Self(u32::try_from(len).unwrap_or(u32::MAX))
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    )* };
}

define_id!(
    /// Index of a node in an [`IrTree`](crate::IrTree).
    NodeId,
    /// Index of a method in the symbol table.
    MethodId,
    /// Index of a global variable in the symbol table.
    GlobalId,
);

#[cfg(target_pointer_width = "64")]
mod size_asserts {
    crate::static_assert_size!(super::NodeId, 4);
    crate::static_assert_size!(Option<super::NodeId>, 8);
}
