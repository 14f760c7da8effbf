//! Wiping secrets from memory.
//!
//! HACL clears secrets with `explicit_bzero` where the platform
//! guarantees one. `LINUX_NO_EXPLICIT_BZERO` says it does not, in
//! which case memory is cleared with a loop the compiler cannot
//! elide ([`wipe`]).

use core::{
    ptr,
    sync::atomic::{compiler_fence, Ordering},
};

use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

use crate::profile::Profile;

/// How memory holding secrets is cleared.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Zeroing {
    /// A loop of volatile writes.
    ManualLoop,
    /// A hardened zeroing primitive.
    Hardened,
}

impl Zeroing {
    /// The strategy of [`Profile::compiled`].
    pub const COMPILED: Self = Profile::compiled().zeroing();

    /// Overwrites `buf` with zeros.
    #[inline]
    pub fn wipe(self, buf: &mut [u8]) {
        match self {
            Self::ManualLoop => wipe(buf),
            Self::Hardened => buf.zeroize(),
        }
    }
}

/// Overwrites `buf` with zeros using volatile writes.
///
/// The writes are bracketed by compiler fences so they are
/// neither elided nor reordered past surrounding accesses.
#[inline(never)]
pub fn wipe(buf: &mut [u8]) {
    compiler_fence(Ordering::SeqCst);
    for b in buf.iter_mut() {
        // SAFETY: `b` is a valid, aligned, exclusive reference.
        unsafe { ptr::write_volatile(b, 0) }
    }
    compiler_fence(Ordering::SeqCst);
}

/// Overwrites `buf` with zeros using the compiled strategy.
#[inline]
pub fn secure_zero(buf: &mut [u8]) {
    Zeroing::COMPILED.wipe(buf);
}

/// Reports, in constant time, whether every byte of `buf` is
/// zero.
pub fn is_zeroed(buf: &[u8]) -> Choice {
    buf.iter().fold(Choice::from(1), |acc, b| acc & b.ct_eq(&0))
}
