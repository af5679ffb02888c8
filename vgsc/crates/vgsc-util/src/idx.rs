//! Typed indices.
//!
//! Variable slots and procedure slots are both addressed by small integers.
//! Wrapping each index space in its own newtype keeps them from being mixed
//! up; the [`define_idx!`] macro stamps out the boilerplate.

/// Trait for types usable as typed indices.
pub trait Idx: Copy + Eq {
    /// Converts from `usize`. Panics if the value does not fit.
    fn from_usize(idx: usize) -> Self;

    /// Converts to `usize` for slice indexing.
    fn index(self) -> usize;
}

/// Defines a `u32`-backed index newtype implementing [`Idx`].
///
/// # Example
///
/// ```
/// use vgsc_util::{define_idx, Idx};
///
/// define_idx!(ProcId);
///
/// let id = ProcId::from_usize(3);
/// assert_eq!(id.index(), 3);
/// ```
#[macro_export]
macro_rules! define_idx {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl $crate::Idx for $name {
            #[inline]
            fn from_usize(idx: usize) -> Self {
                assert!(idx <= u32::MAX as usize);
                $name(idx as u32)
            }

            #[inline]
            fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}
