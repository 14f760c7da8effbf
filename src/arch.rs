use core::{error, fmt, str::FromStr};

/// The CPU architecture a HACL build assumes.
///
/// Each variant corresponds to one `TARGET_ARCHITECTURE_ID_*`
/// identifier.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TargetArchitecture {
    /// `TARGET_ARCHITECTURE_ID_UNKNOWN`.
    #[default]
    Unknown,
    /// `TARGET_ARCHITECTURE_ID_X86`.
    X86,
    /// `TARGET_ARCHITECTURE_ID_X64`.
    X64,
    /// `TARGET_ARCHITECTURE_ID_ARM7`.
    Arm7,
    /// `TARGET_ARCHITECTURE_ID_ARM8`.
    Arm8,
    /// `TARGET_ARCHITECTURE_ID_SYSTEMZ`.
    SystemZ,
    /// `TARGET_ARCHITECTURE_ID_POWERPC64`.
    PowerPc64,
}

impl TargetArchitecture {
    /// Every recognized architecture.
    pub const ALL: [Self; 7] = [
        Self::Unknown,
        Self::X86,
        Self::X64,
        Self::Arm7,
        Self::Arm8,
        Self::SystemZ,
        Self::PowerPc64,
    ];

    /// The architecture of the compilation target.
    pub const fn host() -> Self {
        if cfg!(target_arch = "x86_64") {
            Self::X64
        } else if cfg!(target_arch = "x86") {
            Self::X86
        } else if cfg!(target_arch = "aarch64") {
            Self::Arm8
        } else if cfg!(target_arch = "arm") {
            Self::Arm7
        } else if cfg!(target_arch = "s390x") {
            Self::SystemZ
        } else if cfg!(target_arch = "powerpc64") {
            Self::PowerPc64
        } else {
            Self::Unknown
        }
    }

    /// Maps a Rust `target_arch` name, as found in
    /// `CARGO_CFG_TARGET_ARCH`, to an architecture.
    pub fn from_target_arch(name: &str) -> Self {
        match name {
            "x86_64" => Self::X64,
            "x86" => Self::X86,
            "aarch64" => Self::Arm8,
            "arm" => Self::Arm7,
            "s390x" => Self::SystemZ,
            "powerpc64" => Self::PowerPc64,
            _ => Self::Unknown,
        }
    }

    /// Looks up an architecture by its C identifier only.
    pub fn from_c_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|arch| arch.c_name() == name)
    }

    /// Returns the C identifier, e.g. `TARGET_ARCHITECTURE_ID_X64`.
    pub const fn c_name(self) -> &'static str {
        match self {
            Self::Unknown => "TARGET_ARCHITECTURE_ID_UNKNOWN",
            Self::X86 => "TARGET_ARCHITECTURE_ID_X86",
            Self::X64 => "TARGET_ARCHITECTURE_ID_X64",
            Self::Arm7 => "TARGET_ARCHITECTURE_ID_ARM7",
            Self::Arm8 => "TARGET_ARCHITECTURE_ID_ARM8",
            Self::SystemZ => "TARGET_ARCHITECTURE_ID_SYSTEMZ",
            Self::PowerPc64 => "TARGET_ARCHITECTURE_ID_POWERPC64",
        }
    }

    /// Returns the short lowercase name used in `cfg` values,
    /// e.g. `x64`.
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::X86 => "x86",
            Self::X64 => "x64",
            Self::Arm7 => "arm7",
            Self::Arm8 => "arm8",
            Self::SystemZ => "systemz",
            Self::PowerPc64 => "powerpc64",
        }
    }

    /// Reports whether the architecture has a native SIMD type
    /// of `bits` width.
    pub const fn has_native_vector(self, bits: u32) -> bool {
        match (self, bits) {
            (Self::X86 | Self::X64, 128 | 256) => true,
            (Self::Arm8, 128) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TargetArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.c_name())
    }
}

impl FromStr for TargetArchitecture {
    type Err = UnknownArchitecture;

    /// Parses either the C identifier or the short name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|arch| arch.c_name() == s || arch.short_name() == s)
            .ok_or(UnknownArchitecture)
    }
}

/// The architecture identifier is not recognized.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct UnknownArchitecture;

impl fmt::Display for UnknownArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown target architecture")
    }
}

impl error::Error for UnknownArchitecture {}
