//! Opaque vector placeholders.

use core::{ffi::c_void, fmt, ptr};

use super::{Sealed, VectorRepr, VEC128_SYMBOL, VEC256_SYMBOL};

macro_rules! placeholder {
    ($name:ident, $bits:literal, $symbol:expr) => {
        #[doc = concat!("An opaque stand-in for a ", stringify!($bits), "-bit SIMD vector.")]
        ///
        /// It has the layout of `void *` and exposes nothing that
        /// could be read as vector data. It is neither `Send` nor
        /// `Sync`.
        #[derive(Copy, Clone, Eq, PartialEq)]
        #[repr(transparent)]
        pub struct $name(*mut c_void);

        impl $name {
            /// Returns a null placeholder.
            #[inline]
            pub const fn null() -> Self {
                Self(ptr::null_mut())
            }

            /// Reports whether the placeholder is null.
            #[inline]
            pub fn is_null(self) -> bool {
                self.0.is_null()
            }
        }

        impl Default for $name {
            #[inline]
            fn default() -> Self {
                Self::null()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name)).finish_non_exhaustive()
            }
        }

        impl Sealed for $name {}
        impl VectorRepr for $name {
            const BITS: u32 = $bits;
            const OPAQUE: bool = true;
            const C_NAME: &'static str = $symbol;
        }
    };
}

placeholder!(Vec128, 128, VEC128_SYMBOL);
placeholder!(Vec256, 256, VEC256_SYMBOL);
