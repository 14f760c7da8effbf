//! Native x86 vectors.

#![cfg(all(
    feature = "intrinsics",
    any(target_arch = "x86", target_arch = "x86_64"),
    target_feature = "sse2",
))]

use core::{fmt, mem, ptr};

use cfg_if::cfg_if;

use super::{Sealed, VectorRepr};

cfg_if! {
    if #[cfg(target_arch = "x86")] {
        use core::arch::x86::{__m128i, __m256i};
    } else {
        use core::arch::x86_64::{__m128i, __m256i};
    }
}

macro_rules! native {
    ($name:ident, $inner:ty, $bytes:literal, $c_name:literal) => {
        #[doc = concat!("A native `", $c_name, "` vector.")]
        #[derive(Copy, Clone)]
        #[repr(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Loads a vector from little-endian bytes.
            #[inline]
            pub fn from_le_bytes(data: &[u8; $bytes]) -> Self {
                // SAFETY: `data` is exactly as large as the vector
                // and every bit pattern is a valid integer vector.
                Self(unsafe { ptr::read_unaligned(data.as_ptr().cast::<$inner>()) })
            }

            /// Stores the vector as little-endian bytes.
            #[inline]
            pub fn to_le_bytes(self) -> [u8; $bytes] {
                let mut out = [0u8; $bytes];
                // SAFETY: `out` is exactly as large as the vector.
                unsafe { ptr::write_unaligned(out.as_mut_ptr().cast::<$inner>(), self.0) }
                out
            }
        }

        impl Default for $name {
            #[inline]
            fn default() -> Self {
                // SAFETY: all zeros is a valid integer vector.
                Self(unsafe { mem::zeroed() })
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.to_le_bytes() == other.to_le_bytes()
            }
        }

        impl Eq for $name {}

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name))
                    .field(&self.to_le_bytes())
                    .finish()
            }
        }

        impl Sealed for $name {}
        impl VectorRepr for $name {
            const BITS: u32 = $bytes * 8;
            const OPAQUE: bool = false;
            const C_NAME: &'static str = $c_name;
        }
    };
}

native!(Native128, __m128i, 16, "__m128i");
native!(Native256, __m256i, 32, "__m256i");
