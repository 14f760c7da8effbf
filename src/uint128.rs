//! 128-bit arithmetic.
//!
//! Without `HACL_CAN_COMPILE_UINT128` HACL carries 128-bit values
//! as pairs of 64-bit words and multiplies through 32-bit limbs.
//! [`Uint128`] is that representation. [`mul_wide`] uses the
//! native `u128` only when the `uint128` feature is enabled.
//!
//! Carries, borrows and comparisons are branch-free.

#![allow(clippy::arithmetic_side_effects)]

use core::ops::{Add, BitAnd, BitOr, BitXor, Not, Shl, Shr, Sub};

use subtle::{Choice, ConstantTimeEq};

use crate::profile::{Profile, WideArith};

/// An unsigned 128-bit integer stored as two 64-bit words.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Uint128 {
    lo: u64,
    hi: u64,
}

impl Uint128 {
    /// Zero.
    pub const ZERO: Self = Self::pack(0, 0);

    /// The largest value.
    pub const MAX: Self = Self::pack(u64::MAX, u64::MAX);

    /// Creates an integer from its low and high words.
    #[inline]
    pub const fn pack(lo: u64, hi: u64) -> Self {
        Self { lo, hi }
    }

    /// Returns the low and high words.
    #[inline]
    pub const fn unpack(self) -> (u64, u64) {
        (self.lo, self.hi)
    }

    /// Zero-extends `x`.
    #[inline]
    pub const fn from_u64(x: u64) -> Self {
        Self::pack(x, 0)
    }

    /// Converts from `u128`.
    #[inline]
    pub const fn from_u128(x: u128) -> Self {
        Self::pack(x as u64, (x >> 64) as u64)
    }

    /// Converts to `u128`.
    #[inline]
    pub const fn to_u128(self) -> u128 {
        ((self.hi as u128) << 64) | (self.lo as u128)
    }

    /// Returns the low word, truncating.
    #[inline]
    pub const fn low(self) -> u64 {
        self.lo
    }

    /// Returns the high word.
    #[inline]
    pub const fn high(self) -> u64 {
        self.hi
    }

    /// Wrapping addition.
    #[must_use = "this returns the result of the operation \
                      without modifying the original"]
    pub const fn wrapping_add(self, rhs: Self) -> Self {
        let lo = self.lo.wrapping_add(rhs.lo);
        let carry = ((self.lo & rhs.lo) | ((self.lo | rhs.lo) & !lo)) >> 63;
        let hi = self.hi.wrapping_add(rhs.hi).wrapping_add(carry);
        Self::pack(lo, hi)
    }

    /// Wrapping subtraction.
    #[must_use = "this returns the result of the operation \
                      without modifying the original"]
    pub const fn wrapping_sub(self, rhs: Self) -> Self {
        let lo = self.lo.wrapping_sub(rhs.lo);
        let borrow = ((!self.lo & rhs.lo) | (!(self.lo ^ rhs.lo) & lo)) >> 63;
        let hi = self.hi.wrapping_sub(rhs.hi).wrapping_sub(borrow);
        Self::pack(lo, hi)
    }

    /// Shifts left by `s` bits, producing zero if `s >= 128`.
    #[must_use = "this returns the result of the operation \
                      without modifying the original"]
    pub const fn shift_left(self, s: u32) -> Self {
        match s {
            0 => self,
            1..=63 => Self::pack(self.lo << s, (self.hi << s) | (self.lo >> (64 - s))),
            64..=127 => Self::pack(0, self.lo << (s - 64)),
            _ => Self::ZERO,
        }
    }

    /// Shifts right by `s` bits, producing zero if `s >= 128`.
    #[must_use = "this returns the result of the operation \
                      without modifying the original"]
    pub const fn shift_right(self, s: u32) -> Self {
        match s {
            0 => self,
            1..=63 => Self::pack((self.lo >> s) | (self.hi << (64 - s)), self.hi >> s),
            64..=127 => Self::pack(self.hi >> (s - 64), 0),
            _ => Self::ZERO,
        }
    }

    /// Returns all ones if `self >= rhs`, zero otherwise.
    pub const fn gte_mask(self, rhs: Self) -> Self {
        // The borrow out of `self - rhs` is set iff `self < rhs`.
        let lo = self.lo.wrapping_sub(rhs.lo);
        let b0 = ((!self.lo & rhs.lo) | (!(self.lo ^ rhs.lo) & lo)) >> 63;
        let hi = self.hi.wrapping_sub(rhs.hi).wrapping_sub(b0);
        let b1 = ((!self.hi & rhs.hi) | (!(self.hi ^ rhs.hi) & hi)) >> 63;
        let mask = b1.wrapping_sub(1);
        Self::pack(mask, mask)
    }

    /// Returns all ones if `self == rhs`, zero otherwise.
    pub const fn eq_mask(self, rhs: Self) -> Self {
        let x = (self.lo ^ rhs.lo) | (self.hi ^ rhs.hi);
        // `x | -x` has its top bit set iff `x != 0`.
        let ne = (x | x.wrapping_neg()) >> 63;
        let mask = ne.wrapping_sub(1);
        Self::pack(mask, mask)
    }
}

/// Returns the full 128-bit product of `x` and `y`.
///
/// Uses [`mul_wide_native`] with the `uint128` feature and
/// [`mul_wide_portable`] otherwise.
#[inline]
pub fn mul_wide(x: u64, y: u64) -> Uint128 {
    if cfg!(feature = "uint128") {
        mul_wide_native(x, y)
    } else {
        mul_wide_portable(x, y)
    }
}

/// Multiplies through the native `u128`.
#[inline]
pub const fn mul_wide_native(x: u64, y: u64) -> Uint128 {
    Uint128::from_u128((x as u128) * (y as u128))
}

/// Multiplies through 32-bit limbs.
pub const fn mul_wide_portable(x: u64, y: u64) -> Uint128 {
    const MASK: u64 = 0xffff_ffff;

    let (x0, x1) = (x & MASK, x >> 32);
    let (y0, y1) = (y & MASK, y >> 32);

    let ll = x0 * y0;
    let hl = x1 * y0;
    let lh = x0 * y1;
    let hh = x1 * y1;

    // At most (2³²-1) + (2³²-1) + (2³²-1)², which fits.
    let mid = (ll >> 32) + (hl & MASK) + lh;

    let lo = (mid << 32) | (ll & MASK);
    let hi = hh + (hl >> 32) + (mid >> 32);
    Uint128::pack(lo, hi)
}

impl WideArith {
    /// The arithmetic of [`Profile::compiled`].
    pub const COMPILED: Self = Profile::compiled().wide_arith();

    /// Returns the full 128-bit product of `x` and `y` using this
    /// strategy.
    #[inline]
    pub const fn mul_wide(self, x: u64, y: u64) -> Uint128 {
        match self {
            Self::Native => mul_wide_native(x, y),
            Self::Portable => mul_wide_portable(x, y),
        }
    }
}

impl From<u64> for Uint128 {
    #[inline]
    fn from(x: u64) -> Self {
        Self::from_u64(x)
    }
}

impl From<u128> for Uint128 {
    #[inline]
    fn from(x: u128) -> Self {
        Self::from_u128(x)
    }
}

impl From<Uint128> for u128 {
    #[inline]
    fn from(x: Uint128) -> Self {
        x.to_u128()
    }
}

impl Add for Uint128 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        self.wrapping_add(rhs)
    }
}

impl Sub for Uint128 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        self.wrapping_sub(rhs)
    }
}

impl BitAnd for Uint128 {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self::pack(self.lo & rhs.lo, self.hi & rhs.hi)
    }
}

impl BitOr for Uint128 {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self::pack(self.lo | rhs.lo, self.hi | rhs.hi)
    }
}

impl BitXor for Uint128 {
    type Output = Self;

    #[inline]
    fn bitxor(self, rhs: Self) -> Self::Output {
        Self::pack(self.lo ^ rhs.lo, self.hi ^ rhs.hi)
    }
}

impl Not for Uint128 {
    type Output = Self;

    #[inline]
    fn not(self) -> Self::Output {
        Self::pack(!self.lo, !self.hi)
    }
}

impl Shl<u32> for Uint128 {
    type Output = Self;

    #[inline]
    fn shl(self, rhs: u32) -> Self::Output {
        self.shift_left(rhs)
    }
}

impl Shr<u32> for Uint128 {
    type Output = Self;

    #[inline]
    fn shr(self, rhs: u32) -> Self::Output {
        self.shift_right(rhs)
    }
}

impl ConstantTimeEq for Uint128 {
    #[inline]
    fn ct_eq(&self, other: &Self) -> Choice {
        self.lo.ct_eq(&other.lo) & self.hi.ct_eq(&other.hi)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use subtle::ConstantTimeEq;

    use super::{mul_wide, mul_wide_native, mul_wide_portable, Uint128};
    use crate::profile::{Profile, WideArith};

    #[test]
    fn test_mul_wide_agrees() {
        let edges = [0, 1, 2, u32::MAX as u64, 1 << 32, u64::MAX - 1, u64::MAX];
        for x in edges {
            for y in edges {
                let want = (x as u128) * (y as u128);
                assert_eq!(mul_wide_portable(x, y).to_u128(), want, "{x} * {y}");
                assert_eq!(mul_wide_native(x, y).to_u128(), want, "{x} * {y}");
            }
        }

        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..10_000 {
            let (x, y): (u64, u64) = (rng.gen(), rng.gen());
            assert_eq!(mul_wide_portable(x, y), mul_wide_native(x, y), "{x} * {y}");
            assert_eq!(mul_wide(x, y).to_u128(), (x as u128) * (y as u128));
        }
    }

    #[test]
    fn test_compiled_arith() {
        assert_eq!(WideArith::COMPILED, Profile::compiled().wide_arith());
        if !cfg!(feature = "uint128") {
            assert_eq!(WideArith::COMPILED, WideArith::Portable);
        }
        assert_eq!(
            WideArith::Portable.mul_wide(u64::MAX, u64::MAX),
            WideArith::Native.mul_wide(u64::MAX, u64::MAX)
        );
    }

    #[test]
    fn test_add_sub() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..10_000 {
            let (a, b): (u128, u128) = (rng.gen(), rng.gen());
            let (x, y) = (Uint128::from(a), Uint128::from(b));
            assert_eq!(u128::from(x + y), a.wrapping_add(b));
            assert_eq!(u128::from(x - y), a.wrapping_sub(b));
        }
        assert_eq!(Uint128::MAX + Uint128::from_u64(1), Uint128::ZERO);
        assert_eq!(Uint128::ZERO - Uint128::from_u64(1), Uint128::MAX);
        // Carry out of the low word.
        assert_eq!(
            Uint128::from_u64(u64::MAX) + Uint128::from_u64(1),
            Uint128::pack(0, 1)
        );
    }

    #[test]
    fn test_shifts() {
        let x = 0x0123_4567_89ab_cdef_fedc_ba98_7654_3210u128;
        for s in 0..128 {
            assert_eq!(u128::from(Uint128::from(x) << s), x << s, "{s}");
            assert_eq!(u128::from(Uint128::from(x) >> s), x >> s, "{s}");
        }
        assert_eq!(Uint128::from(x) << 128, Uint128::ZERO);
        assert_eq!(Uint128::from(x) >> 200, Uint128::ZERO);
    }

    #[test]
    fn test_masks() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..10_000 {
            let (a, b): (u128, u128) = (rng.gen(), rng.gen());
            // Make equal values likely enough to be covered.
            let b = if b & 7 == 0 { a } else { b };
            let (x, y) = (Uint128::from(a), Uint128::from(b));
            let want = |c: bool| if c { Uint128::MAX } else { Uint128::ZERO };
            assert_eq!(x.gte_mask(y), want(a >= b), "{a} >= {b}");
            assert_eq!(x.eq_mask(y), want(a == b), "{a} == {b}");
            assert_eq!(bool::from(x.ct_eq(&y)), a == b);
        }
    }

    #[test]
    fn test_bitwise() {
        let (a, b) = ((0xf0f0u128 << 70) | 0xff, (0x0ff0u128 << 70) | 0x0f);
        let (x, y) = (Uint128::from(a), Uint128::from(b));
        assert_eq!(u128::from(x & y), a & b);
        assert_eq!(u128::from(x | y), a | b);
        assert_eq!(u128::from(x ^ y), a ^ b);
        assert_eq!(u128::from(!x), !a);
        assert_eq!(x.unpack(), (x.low(), x.high()));
    }
}
