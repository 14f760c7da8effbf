//! Compilation strategies a HACL build may use.

use core::{fmt, iter::FusedIterator};

/// A compilation strategy a HACL build may be allowed to use.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum Capability {
    /// CPU-specific intrinsic instructions.
    Intrinsics = 1 << 0,
    /// Verified assembly generated by Vale.
    Vale = 1 << 1,
    /// Inline assembly.
    InlineAsm = 1 << 2,
    /// A native 128-bit integer type.
    Uint128 = 1 << 3,
}

impl Capability {
    /// Every capability, in header order.
    pub const ALL: [Self; 4] = [Self::Intrinsics, Self::Vale, Self::InlineAsm, Self::Uint128];

    /// Returns the C symbol, e.g. `HACL_CAN_COMPILE_INLINE_ASM`.
    pub const fn c_name(self) -> &'static str {
        match self {
            Self::Intrinsics => "HACL_CAN_COMPILE_INTRINSICS",
            Self::Vale => "HACL_CAN_COMPILE_VALE",
            Self::InlineAsm => "HACL_CAN_COMPILE_INLINE_ASM",
            Self::Uint128 => "HACL_CAN_COMPILE_UINT128",
        }
    }

    /// Returns the `cfg` name, e.g. `hacl_can_compile_inline_asm`.
    pub const fn cfg_name(self) -> &'static str {
        match self {
            Self::Intrinsics => "hacl_can_compile_intrinsics",
            Self::Vale => "hacl_can_compile_vale",
            Self::InlineAsm => "hacl_can_compile_inline_asm",
            Self::Uint128 => "hacl_can_compile_uint128",
        }
    }

    /// Looks up a capability by its C symbol.
    pub fn from_c_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cap| cap.c_name() == name)
    }

    /// Reports whether this is a fast path that trades
    /// portability for speed.
    ///
    /// Native 128-bit integers are an assumption about the
    /// compiler, not a code path.
    pub const fn is_fast_path(self) -> bool {
        !matches!(self, Self::Uint128)
    }

    const fn bit(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.c_name())
    }
}

/// A set of [`Capability`]s.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Capabilities(u8);

impl Capabilities {
    /// No capabilities.
    pub const NONE: Self = Self(0);

    /// Only inline assembly.
    pub const CONSERVATIVE: Self = Self::NONE.with(Capability::InlineAsm);

    /// Reports whether `cap` is in the set.
    pub const fn contains(self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    /// Returns the set with `cap` added.
    #[must_use = "this returns the result of the operation \
                      without modifying the original"]
    pub const fn with(self, cap: Capability) -> Self {
        Self(self.0 | cap.bit())
    }

    /// Returns the set with `cap` removed.
    #[must_use = "this returns the result of the operation \
                      without modifying the original"]
    pub const fn without(self, cap: Capability) -> Self {
        Self(self.0 & !cap.bit())
    }

    /// Returns the set with `cap` added if `enabled`, removed
    /// otherwise.
    #[must_use = "this returns the result of the operation \
                      without modifying the original"]
    pub const fn set(self, cap: Capability, enabled: bool) -> Self {
        if enabled {
            self.with(cap)
        } else {
            self.without(cap)
        }
    }

    /// Returns the number of capabilities in the set.
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Reports whether the set is empty.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the fast-path capabilities in the set.
    pub fn fast_paths(self) -> impl Iterator<Item = Capability> {
        self.iter().filter(|cap| cap.is_fast_path())
    }

    /// Iterates over the capabilities in header order.
    pub fn iter(self) -> Iter {
        Iter { set: self, idx: 0 }
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, Self::with)
    }
}

impl IntoIterator for Capabilities {
    type Item = Capability;
    type IntoIter = Iter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over [`Capabilities`].
#[derive(Clone, Debug)]
pub struct Iter {
    set: Capabilities,
    idx: usize,
}

impl Iterator for Iter {
    type Item = Capability;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&cap) = Capability::ALL.get(self.idx) {
            self.idx = self.idx.saturating_add(1);
            if self.set.contains(cap) {
                return Some(cap);
            }
        }
        None
    }
}

impl FusedIterator for Iter {}

#[cfg(feature = "serde")]
impl serde::Serialize for Capabilities {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Capabilities {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Visitor;

        impl<'de> serde::de::Visitor<'de> for Visitor {
            type Value = Capabilities;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a list of capabilities")
            }

            fn visit_seq<A: serde::de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> Result<Self::Value, A::Error> {
                let mut set = Capabilities::NONE;
                while let Some(cap) = seq.next_element()? {
                    set = set.with(cap);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_seq(Visitor)
    }
}
