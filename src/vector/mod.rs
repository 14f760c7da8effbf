//! SIMD vector representations.
//!
//! HACL signatures mention `Lib_IntVector_Intrinsics_vec128` and
//! `Lib_IntVector_Intrinsics_vec256`. Without intrinsics those
//! are opaque placeholders ([`Vec128`], [`Vec256`]) so that no
//! binding assumes a concrete SIMD layout. With the `intrinsics`
//! feature they resolve to the target's native vector types
//! where one exists.
//!
//! [`Lane128`] and [`Lane256`] name whichever type the crate was
//! compiled with. Native types also require the target feature
//! that provides them (`sse2`, `neon`); a 32-bit x86 target
//! without SSE2 keeps the placeholders even with `intrinsics`.

mod aarch64;
mod opaque;
mod x86;

pub use opaque::{Vec128, Vec256};

cfg_if::cfg_if! {
    if #[cfg(all(
        feature = "intrinsics",
        any(target_arch = "x86", target_arch = "x86_64"),
        target_feature = "sse2",
    ))] {
        pub use x86::{Native128, Native256};

        /// The 128-bit vector type selected at compile time.
        pub type Lane128 = Native128;
        /// The 256-bit vector type selected at compile time.
        pub type Lane256 = Native256;
    } else if #[cfg(all(
        feature = "intrinsics",
        target_arch = "aarch64",
        target_feature = "neon",
    ))] {
        pub use aarch64::Native128;

        /// The 128-bit vector type selected at compile time.
        pub type Lane128 = Native128;
        /// The 256-bit vector type selected at compile time.
        ///
        /// AArch64 has no 256-bit vectors.
        pub type Lane256 = Vec256;
    } else {
        /// The 128-bit vector type selected at compile time.
        pub type Lane128 = Vec128;
        /// The 256-bit vector type selected at compile time.
        pub type Lane256 = Vec256;
    }
}

/// How a vector type is represented.
///
/// This trait is sealed.
pub trait VectorRepr: Sealed + Copy {
    /// The width of the vector in bits.
    const BITS: u32;
    /// Whether the type is an opaque placeholder that carries
    /// no SIMD layout.
    const OPAQUE: bool;
    /// The name HACL's C sources use for the type.
    ///
    /// For a placeholder this is the `Lib_IntVector_Intrinsics_*`
    /// macro it stands in for; for a native vector it is the
    /// intrinsic type itself, e.g. `__m128i`.
    const C_NAME: &'static str;
}

mod private {
    #[doc(hidden)]
    pub trait Sealed {}
}
pub(crate) use private::Sealed;

/// The HACL symbol for the 128-bit vector type.
pub const VEC128_SYMBOL: &str = "Lib_IntVector_Intrinsics_vec128";

/// The HACL symbol for the 256-bit vector type.
pub const VEC256_SYMBOL: &str = "Lib_IntVector_Intrinsics_vec256";

/// The symbol a header defines when 128-bit vectors are native.
pub const VEC128_NATIVE_SYMBOL: &str = "HACL_CAN_COMPILE_VEC128";

/// The symbol a header defines when 256-bit vectors are native.
pub const VEC256_NATIVE_SYMBOL: &str = "HACL_CAN_COMPILE_VEC256";

/// The C definition an opaque placeholder is given in a header.
pub const PLACEHOLDER_DEFINITION: &str = "void *";

#[cfg(test)]
mod tests {
    use core::{ffi::c_void, mem::size_of};

    use super::{Lane128, Lane256, Vec128, Vec256, VectorRepr};

    #[test]
    fn test_placeholders_are_opaque() {
        assert!(Vec128::OPAQUE);
        assert!(Vec256::OPAQUE);
        assert_eq!(Vec128::BITS, 128);
        assert_eq!(Vec256::BITS, 256);
        // A placeholder is pointer-sized, never vector-sized.
        assert_eq!(size_of::<Vec128>(), size_of::<*mut c_void>());
        assert_eq!(size_of::<Vec256>(), size_of::<*mut c_void>());
        assert_ne!(size_of::<Vec128>(), 16);
        assert_ne!(size_of::<Vec256>(), 32);
    }

    #[test]
    fn test_lanes() {
        assert_eq!(Lane128::BITS, 128);
        assert_eq!(Lane256::BITS, 256);
        if Lane128::OPAQUE {
            assert_eq!(size_of::<Lane128>(), size_of::<*mut c_void>());
        } else {
            assert_eq!(size_of::<Lane128>(), 16);
        }
        if Lane256::OPAQUE {
            assert_eq!(size_of::<Lane256>(), size_of::<*mut c_void>());
        } else {
            assert_eq!(size_of::<Lane256>(), 32);
        }
        if cfg!(not(feature = "intrinsics")) {
            assert!(Lane128::OPAQUE);
            assert!(Lane256::OPAQUE);
        }
    }
}
