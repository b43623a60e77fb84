//! Integer widths for stored jump pointers.

use std::fmt::Debug;

/// Unsigned integer type used to store jump pointers.
///
/// The width bounds the longest jump and thus the largest block that can be
/// skipped in one step. Narrow types save memory at the cost of compression:
/// a run of low weights longer than [`JumpPointer::MAX`] is split into
/// several jumps.
pub trait JumpPointer: Copy + Debug + Send + Sync + 'static {
    /// Largest representable jump.
    const MAX: usize;

    /// Converts a jump width. `value` must not exceed [`JumpPointer::MAX`].
    fn from_usize(value: usize) -> Self;

    /// Widens to `usize`.
    fn to_usize(self) -> usize;
}

macro_rules! impl_jump_pointer {
    ($($t:ty),*) => {
        $(
            impl JumpPointer for $t {
                const MAX: usize = <$t>::MAX as usize;

                #[inline]
                fn from_usize(value: usize) -> Self {
                    debug_assert!(value <= <Self as JumpPointer>::MAX);
                    value as $t
                }

                #[inline]
                fn to_usize(self) -> usize {
                    self as usize
                }
            }
        )*
    };
}

impl_jump_pointer!(u8, u16, u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maxima() {
        assert_eq!(<u8 as JumpPointer>::MAX, 255);
        assert_eq!(<u16 as JumpPointer>::MAX, 65_535);
        assert_eq!(<u32 as JumpPointer>::MAX, u32::MAX as usize);
    }

    #[test]
    fn conversions() {
        assert_eq!(u16::from_usize(1234).to_usize(), 1234);
        assert_eq!(u8::from_usize(255).to_usize(), 255);
    }
}
