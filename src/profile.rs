use core::{error, fmt};

use tracing::{debug, instrument};

use crate::{
    arch::TargetArchitecture,
    capability::{Capabilities, Capability},
    header::Header,
    vector::{Lane128, Lane256, VectorRepr},
    zero::Zeroing,
};

/// How a SIMD vector type is represented.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum VectorKind {
    /// An opaque `void *` placeholder.
    Opaque,
    /// The architecture's native vector type.
    Native,
}

impl VectorKind {
    /// Returns the kind of `V`.
    pub const fn of<V: VectorRepr>() -> Self {
        if V::OPAQUE {
            Self::Opaque
        } else {
            Self::Native
        }
    }

    const fn expected(arch: TargetArchitecture, intrinsics: bool, bits: u32) -> Self {
        if intrinsics && arch.has_native_vector(bits) {
            Self::Native
        } else {
            Self::Opaque
        }
    }
}

/// The code path downstream code selects for a profile.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CodePath {
    /// Plain portable code.
    Portable,
    /// Inline assembly.
    InlineAssembly,
    /// SIMD intrinsics.
    Vectorized,
    /// Verified assembly generated by Vale.
    VerifiedAssembly,
}

/// How 128-bit arithmetic is carried out.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum WideArith {
    /// Pairs of 64-bit words.
    Portable,
    /// The native `u128`.
    Native,
}

/// The switches a HACL build branches on.
///
/// Each field corresponds to one symbol of the `config.h` the
/// binding generator reads; see [`Profile::header`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Profile {
    arch: TargetArchitecture,
    capabilities: Capabilities,
    vec128: VectorKind,
    vec256: VectorKind,
    no_explicit_bzero: bool,
}

impl Profile {
    /// The most conservative profile.
    ///
    /// It assumes x86-64, allows only inline assembly, uses
    /// opaque vector placeholders, and assumes no hardened
    /// zeroing primitive.
    pub const fn conservative() -> Self {
        Self {
            arch: TargetArchitecture::X64,
            capabilities: Capabilities::CONSERVATIVE,
            vec128: VectorKind::Opaque,
            vec256: VectorKind::Opaque,
            no_explicit_bzero: true,
        }
    }

    /// The reasonable default for `arch` when nothing is known
    /// about the CPU beyond its architecture.
    ///
    /// x86-64 allows Vale, inline assembly and intrinsics; x86
    /// allows intrinsics only; every other architecture allows
    /// nothing. Vectors stay opaque and no hardened zeroing
    /// primitive is assumed. Without native vectors ARM is
    /// identified as ARM7, so [`TargetArchitecture::Arm8`] yields
    /// an [`TargetArchitecture::Arm7`] profile.
    pub const fn baseline(arch: TargetArchitecture) -> Self {
        let (arch, capabilities) = match arch {
            TargetArchitecture::X64 => (
                arch,
                Capabilities::NONE
                    .with(Capability::Intrinsics)
                    .with(Capability::Vale)
                    .with(Capability::InlineAsm),
            ),
            TargetArchitecture::X86 => (arch, Capabilities::NONE.with(Capability::Intrinsics)),
            TargetArchitecture::Arm8 => (TargetArchitecture::Arm7, Capabilities::NONE),
            _ => (arch, Capabilities::NONE),
        };
        Self {
            capabilities,
            ..Self::failsafe(arch)
        }
    }

    /// The minimal profile for `arch`: every capability off,
    /// opaque vectors, and no hardened zeroing primitive.
    pub const fn failsafe(arch: TargetArchitecture) -> Self {
        Self {
            arch,
            capabilities: Capabilities::NONE,
            vec128: VectorKind::Opaque,
            vec256: VectorKind::Opaque,
            no_explicit_bzero: true,
        }
    }

    /// The profile selected by this crate's cargo features for
    /// the compilation target.
    pub const fn compiled() -> Self {
        let capabilities = Capabilities::NONE
            .set(Capability::Intrinsics, cfg!(feature = "intrinsics"))
            .set(Capability::Vale, cfg!(feature = "vale"))
            .set(Capability::InlineAsm, cfg!(feature = "inline-asm"))
            .set(Capability::Uint128, cfg!(feature = "uint128"));
        Self {
            arch: TargetArchitecture::host(),
            capabilities,
            vec128: VectorKind::of::<Lane128>(),
            vec256: VectorKind::of::<Lane256>(),
            no_explicit_bzero: !cfg!(feature = "explicit-bzero"),
        }
    }

    /// The compiled profile, narrowed to what the running CPU
    /// supports.
    ///
    /// With the `force-portable` feature this always returns
    /// [`Profile::failsafe`] for the compilation target.
    #[instrument(level = "debug", ret)]
    pub fn detect() -> Self {
        if cfg!(feature = "force-portable") {
            debug!("portable profile forced");
            return Self::failsafe(TargetArchitecture::host());
        }
        let profile = Self::compiled();
        if profile.can_compile(Capability::Intrinsics) && !cpu::have_vector_extensions() {
            debug!(arch = %profile.arch, "vector extensions missing, disabling intrinsics");
            return profile.without_intrinsics();
        }
        profile
    }

    /// Returns a [`Builder`] that starts from the conservative
    /// profile.
    pub const fn builder() -> Builder {
        Builder::new()
    }

    /// Returns the target architecture.
    pub const fn arch(&self) -> TargetArchitecture {
        self.arch
    }

    /// Returns the enabled capabilities.
    pub const fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Reports whether `cap` is enabled.
    pub const fn can_compile(&self, cap: Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// Returns the representation of 128-bit vectors.
    pub const fn vec128(&self) -> VectorKind {
        self.vec128
    }

    /// Returns the representation of 256-bit vectors.
    pub const fn vec256(&self) -> VectorKind {
        self.vec256
    }

    /// Returns the representation of `bits`-wide vectors, or
    /// `None` if `bits` is neither 128 nor 256.
    pub const fn vector(&self, bits: u32) -> Option<VectorKind> {
        match bits {
            128 => Some(self.vec128),
            256 => Some(self.vec256),
            _ => None,
        }
    }

    /// Reports whether the target lacks a hardened zeroing
    /// primitive (`LINUX_NO_EXPLICIT_BZERO`).
    pub const fn no_explicit_bzero(&self) -> bool {
        self.no_explicit_bzero
    }

    /// Returns the zeroing strategy downstream code must use.
    pub const fn zeroing(&self) -> Zeroing {
        if self.no_explicit_bzero {
            Zeroing::ManualLoop
        } else {
            Zeroing::Hardened
        }
    }

    /// Returns how 128-bit arithmetic is carried out.
    pub const fn wide_arith(&self) -> WideArith {
        if self.can_compile(Capability::Uint128) {
            WideArith::Native
        } else {
            WideArith::Portable
        }
    }

    /// Returns the code path downstream code selects, fastest
    /// first.
    pub const fn code_path(&self) -> CodePath {
        if self.can_compile(Capability::Vale) {
            CodePath::VerifiedAssembly
        } else if self.can_compile(Capability::Intrinsics) {
            CodePath::Vectorized
        } else if self.can_compile(Capability::InlineAsm) {
            CodePath::InlineAssembly
        } else {
            CodePath::Portable
        }
    }

    /// Returns the `config.h` for this profile.
    pub const fn header(&self) -> Header {
        Header::new(*self)
    }

    /// Checks that the profile is internally consistent.
    ///
    /// The architecture must be recognized, and a vector may be
    /// native only when intrinsics are enabled and the
    /// architecture has a native type of that width. Opaque
    /// vectors are always allowed.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.arch == TargetArchitecture::Unknown {
            return Err(ProfileError::UnknownArchitecture);
        }
        let intrinsics = self.can_compile(Capability::Intrinsics);
        for (bits, got) in [(128, self.vec128), (256, self.vec256)] {
            let expected = VectorKind::expected(self.arch, intrinsics, bits);
            if got == VectorKind::Native && expected == VectorKind::Opaque {
                return Err(ProfileError::VectorMismatch { bits, expected });
            }
        }
        Ok(())
    }

    /// Checks that the profile is valid and as conservative as
    /// [`Profile::conservative`].
    ///
    /// Exactly one fast path, inline assembly, may be enabled;
    /// native 128-bit integers must not be assumed; both vectors
    /// must be opaque; and no hardened zeroing primitive may be
    /// assumed. The architecture itself is not constrained.
    pub fn check_conservative(&self) -> Result<(), ProfileError> {
        self.validate()?;
        for cap in [Capability::Intrinsics, Capability::Vale, Capability::Uint128] {
            if self.can_compile(cap) {
                return Err(ProfileError::CapabilityEnabled(cap));
            }
        }
        if !self.can_compile(Capability::InlineAsm) {
            return Err(ProfileError::CapabilityDisabled(Capability::InlineAsm));
        }
        let n = self.capabilities.fast_paths().count();
        if n != 1 {
            return Err(ProfileError::FastPathCount(n));
        }
        for (bits, kind) in [(128, self.vec128), (256, self.vec256)] {
            if kind != VectorKind::Opaque {
                return Err(ProfileError::NativeVector { bits });
            }
        }
        if !self.no_explicit_bzero {
            return Err(ProfileError::ExplicitBzeroAssumed);
        }
        Ok(())
    }

    /// Reports whether [`Profile::check_conservative`] passes.
    pub fn is_conservative(&self) -> bool {
        self.check_conservative().is_ok()
    }

    const fn without_intrinsics(self) -> Self {
        Self {
            capabilities: self.capabilities.without(Capability::Intrinsics),
            vec128: VectorKind::Opaque,
            vec256: VectorKind::Opaque,
            ..self
        }
    }
}

impl Default for Profile {
    /// Returns [`Profile::conservative`].
    fn default() -> Self {
        Self::conservative()
    }
}

/// Builds a [`Profile`].
///
/// Unless set explicitly, vector representations follow from the
/// architecture and the `Intrinsics` capability.
#[derive(Copy, Clone, Debug)]
pub struct Builder {
    arch: TargetArchitecture,
    capabilities: Capabilities,
    vec128: Option<VectorKind>,
    vec256: Option<VectorKind>,
    no_explicit_bzero: bool,
}

impl Builder {
    /// Creates a builder that starts from the conservative
    /// profile.
    pub const fn new() -> Self {
        let p = Profile::conservative();
        Self {
            arch: p.arch,
            capabilities: p.capabilities,
            vec128: None,
            vec256: None,
            no_explicit_bzero: p.no_explicit_bzero,
        }
    }

    /// Sets the target architecture.
    #[must_use]
    pub const fn arch(mut self, arch: TargetArchitecture) -> Self {
        self.arch = arch;
        self
    }

    /// Enables or disables `cap`.
    #[must_use]
    pub const fn capability(mut self, cap: Capability, enabled: bool) -> Self {
        self.capabilities = self.capabilities.set(cap, enabled);
        self
    }

    /// Replaces every capability.
    #[must_use]
    pub const fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Overrides the representation of 128-bit vectors.
    #[must_use]
    pub const fn vec128(mut self, kind: VectorKind) -> Self {
        self.vec128 = Some(kind);
        self
    }

    /// Overrides the representation of 256-bit vectors.
    #[must_use]
    pub const fn vec256(mut self, kind: VectorKind) -> Self {
        self.vec256 = Some(kind);
        self
    }

    /// Sets `LINUX_NO_EXPLICIT_BZERO`.
    #[must_use]
    pub const fn no_explicit_bzero(mut self, yes: bool) -> Self {
        self.no_explicit_bzero = yes;
        self
    }

    /// Builds the profile without validating it.
    pub const fn build_unchecked(self) -> Profile {
        let intrinsics = self.capabilities.contains(Capability::Intrinsics);
        let vec128 = match self.vec128 {
            Some(kind) => kind,
            None => VectorKind::expected(self.arch, intrinsics, 128),
        };
        let vec256 = match self.vec256 {
            Some(kind) => kind,
            None => VectorKind::expected(self.arch, intrinsics, 256),
        };
        Profile {
            arch: self.arch,
            capabilities: self.capabilities,
            vec128,
            vec256,
            no_explicit_bzero: self.no_explicit_bzero,
        }
    }

    /// Builds and validates the profile.
    pub fn build(self) -> Result<Profile, ProfileError> {
        let profile = self.build_unchecked();
        profile.validate()?;
        Ok(profile)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`Profile`] failed a consistency check.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProfileError {
    /// `TARGET_ARCHITECTURE` is `TARGET_ARCHITECTURE_ID_UNKNOWN`.
    UnknownArchitecture,
    /// A vector is native although the architecture or the
    /// `Intrinsics` capability does not provide it.
    VectorMismatch {
        /// The vector width.
        bits: u32,
        /// The representation the profile should use.
        expected: VectorKind,
    },
    /// A capability that must be disabled is enabled.
    CapabilityEnabled(Capability),
    /// A capability that must be enabled is disabled.
    CapabilityDisabled(Capability),
    /// The wrong number of fast paths is enabled.
    FastPathCount(usize),
    /// A vector uses its native type.
    NativeVector {
        /// The vector width.
        bits: u32,
    },
    /// A hardened zeroing primitive is assumed.
    ExplicitBzeroAssumed,
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownArchitecture => write!(f, "target architecture is unknown"),
            Self::VectorMismatch { bits, expected } => {
                write!(f, "{bits}-bit vectors should be {expected:?}")
            }
            Self::CapabilityEnabled(cap) => write!(f, "`{cap}` must not be defined"),
            Self::CapabilityDisabled(cap) => write!(f, "`{cap}` must be defined"),
            Self::FastPathCount(n) => write!(f, "expected exactly one fast path, got {n}"),
            Self::NativeVector { bits } => write!(f, "{bits}-bit vectors must be opaque"),
            Self::ExplicitBzeroAssumed => {
                write!(f, "`LINUX_NO_EXPLICIT_BZERO` must be defined")
            }
        }
    }
}

impl error::Error for ProfileError {}

mod cpu {
    cfg_if::cfg_if! {
        if #[cfg(any(target_arch = "x86", target_arch = "x86_64"))] {
            cpufeatures::new!(have_avx2, "avx2");

            pub(super) fn have_vector_extensions() -> bool {
                have_avx2::get()
            }
        } else {
            // NEON is a compile-time baseline on AArch64, and no
            // other architecture has native vectors.
            pub(super) fn have_vector_extensions() -> bool {
                true
            }
        }
    }
}
