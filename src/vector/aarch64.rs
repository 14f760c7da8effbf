//! Native AArch64 vectors.

#![cfg(all(feature = "intrinsics", target_arch = "aarch64", target_feature = "neon"))]

use core::{
    arch::aarch64::{uint32x4_t, vdupq_n_u32, vld1q_u8, vreinterpretq_u32_u8, vreinterpretq_u8_u32, vst1q_u8},
    fmt,
};

use super::{Sealed, VectorRepr};

/// A native `uint32x4_t` vector.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct Native128(uint32x4_t);

impl Native128 {
    /// Loads a vector from little-endian bytes.
    #[inline]
    pub fn from_le_bytes(data: &[u8; 16]) -> Self {
        // SAFETY: This intrinsic requires the `neon` target
        // feature, which we have.
        Self(unsafe { vreinterpretq_u32_u8(vld1q_u8(data.as_ptr())) })
    }

    /// Stores the vector as little-endian bytes.
    #[inline]
    pub fn to_le_bytes(self) -> [u8; 16] {
        let mut out = [0u8; 16];
        // SAFETY: This intrinsic requires the `neon` target
        // feature, which we have.
        unsafe { vst1q_u8(out.as_mut_ptr(), vreinterpretq_u8_u32(self.0)) }
        out
    }
}

impl Default for Native128 {
    #[inline]
    fn default() -> Self {
        // SAFETY: This intrinsic requires the `neon` target
        // feature, which we have.
        Self(unsafe { vdupq_n_u32(0) })
    }
}

impl PartialEq for Native128 {
    fn eq(&self, other: &Self) -> bool {
        self.to_le_bytes() == other.to_le_bytes()
    }
}

impl Eq for Native128 {}

impl fmt::Debug for Native128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Native128").field(&self.to_le_bytes()).finish()
    }
}

impl Sealed for Native128 {}
impl VectorRepr for Native128 {
    const BITS: u32 = 128;
    const OPAQUE: bool = false;
    const C_NAME: &'static str = "uint32x4_t";
}
