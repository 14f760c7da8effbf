//! Helpers for build scripts of crates that bind HACL.
//!
//! A `-sys` crate's `build.rs` typically writes the header for
//! bindgen, passes the same definitions to the C compiler, and
//! exposes the switches to Rust code as `cfg`s:
//!
//! ```no_run
//! use hacl_config::{build, Profile};
//!
//! let profile = build::configure().unwrap_or_else(|_| Profile::conservative());
//! let header = build::write_header(&profile, build::out_dir()?)?;
//! let clang_args = build::clang_args(&profile);
//! build::emit(&profile);
//! # let _ = (header, clang_args);
//! # Ok::<(), std::io::Error>(())
//! ```

use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, instrument};

use crate::{
    arch::TargetArchitecture,
    capability::Capability,
    profile::{Profile, ProfileError},
};

/// The file name [`write_header`] uses.
pub const HEADER_NAME: &str = "config.h";

/// The `cfg` set when `LINUX_NO_EXPLICIT_BZERO` is defined.
pub const NO_EXPLICIT_BZERO_CFG: &str = "hacl_no_explicit_bzero";

/// The `cfg` carrying the target architecture.
pub const TARGET_ARCH_CFG: &str = "hacl_target_arch";

/// Setting this variable, to any value, selects
/// [`Profile::failsafe`] in [`configure`].
pub const FAILSAFE_ENV: &str = "EVERCRYPT_FAILSAFE";

/// The variable cargo sets to the target's `target_arch`.
pub const TARGET_ARCH_ENV: &str = "CARGO_CFG_TARGET_ARCH";

/// Chooses the profile for the target a build script is building
/// for.
///
/// This is [`Profile::baseline`] for the target architecture, or
/// [`Profile::failsafe`] if [`FAILSAFE_ENV`] is set. Outside a
/// build script the compilation target of this crate is used.
///
/// # Errors
///
/// Returns an error if the profile is not valid, e.g. because the
/// target architecture is not recognized.
pub fn configure() -> Result<Profile, ProfileError> {
    let target = env::var(TARGET_ARCH_ENV).ok();
    configure_for(target.as_deref(), env::var_os(FAILSAFE_ENV).is_some())
}

#[instrument(level = "debug", ret)]
fn configure_for(target_arch: Option<&str>, failsafe: bool) -> Result<Profile, ProfileError> {
    let arch = target_arch.map_or_else(TargetArchitecture::host, TargetArchitecture::from_target_arch);
    let profile = if failsafe {
        debug!("{FAILSAFE_ENV} is set");
        Profile::failsafe(arch)
    } else {
        Profile::baseline(arch)
    };
    profile.validate()?;
    Ok(profile)
}

/// Returns `OUT_DIR`.
pub fn out_dir() -> io::Result<PathBuf> {
    env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "`OUT_DIR` is not set"))
}

/// Writes the profile's `config.h` into `dir` and returns its
/// path.
#[instrument(level = "debug", skip(profile, dir), fields(arch = %profile.arch()))]
pub fn write_header(profile: &Profile, dir: impl AsRef<Path>) -> io::Result<PathBuf> {
    let path = dir.as_ref().join(HEADER_NAME);
    fs::write(&path, profile.header().to_string())?;
    debug!(path = %path.display(), "wrote header");
    Ok(path)
}

/// Returns the `-D` arguments for bindgen or a C compiler.
pub fn clang_args(profile: &Profile) -> Vec<String> {
    profile
        .header()
        .defines()
        .map(|define| format!("-D{define}"))
        .collect()
}

/// Returns the `cargo::` directives that declare and set the
/// profile's `cfg`s.
pub fn cfg_directives(profile: &Profile) -> Vec<String> {
    let mut out = Vec::new();

    for cap in Capability::ALL {
        out.push(format!("cargo::rustc-check-cfg=cfg({})", cap.cfg_name()));
    }
    out.push(format!("cargo::rustc-check-cfg=cfg({NO_EXPLICIT_BZERO_CFG})"));
    let values = TargetArchitecture::ALL
        .iter()
        .map(|arch| format!("\"{}\"", arch.short_name()))
        .collect::<Vec<_>>()
        .join(", ");
    out.push(format!(
        "cargo::rustc-check-cfg=cfg({TARGET_ARCH_CFG}, values({values}))"
    ));

    out.push(format!(
        "cargo::rustc-cfg={TARGET_ARCH_CFG}=\"{}\"",
        profile.arch().short_name()
    ));
    for cap in profile.capabilities() {
        out.push(format!("cargo::rustc-cfg={}", cap.cfg_name()));
    }
    if profile.no_explicit_bzero() {
        out.push(format!("cargo::rustc-cfg={NO_EXPLICIT_BZERO_CFG}"));
    }
    out
}

/// Prints [`cfg_directives`] for cargo, and asks cargo to rerun
/// the build script when [`FAILSAFE_ENV`] changes.
#[instrument(level = "debug", skip(profile), fields(code_path = ?profile.code_path()))]
pub fn emit(profile: &Profile) {
    println!("cargo::rerun-if-env-changed={FAILSAFE_ENV}");
    for line in cfg_directives(profile) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use std::{env, fs, process};

    use super::{cfg_directives, clang_args, configure_for, write_header, HEADER_NAME};
    use crate::{
        arch::TargetArchitecture,
        capability::Capability,
        header::parse,
        profile::{Profile, ProfileError},
    };

    #[test]
    fn test_configure_baseline() {
        let cases = [
            ("x86_64", Profile::baseline(TargetArchitecture::X64)),
            ("x86", Profile::baseline(TargetArchitecture::X86)),
            ("aarch64", Profile::baseline(TargetArchitecture::Arm7)),
            ("arm", Profile::baseline(TargetArchitecture::Arm7)),
        ];
        for (target, want) in cases {
            assert_eq!(configure_for(Some(target), false), Ok(want), "{target}");
        }
        let got = configure_for(Some("x86_64"), false).unwrap();
        assert!(got.can_compile(Capability::Vale));
        assert!(got.header().to_string().contains("TARGET_ARCHITECTURE_ID_X64"));
    }

    #[test]
    fn test_configure_failsafe() {
        for target in ["x86_64", "x86", "aarch64", "s390x"] {
            let arch = TargetArchitecture::from_target_arch(target);
            let got = configure_for(Some(target), true);
            assert_eq!(got, Ok(Profile::failsafe(arch)), "{target}");
        }
        // Keeps the architecture of the target, not x86-64.
        let got = configure_for(Some("aarch64"), true).unwrap();
        assert_eq!(got.arch(), TargetArchitecture::Arm8);
        assert!(got.capabilities().is_empty());
    }

    #[test]
    fn test_configure_unrecognized_target() {
        for failsafe in [false, true] {
            assert_eq!(
                configure_for(Some("riscv64"), failsafe),
                Err(ProfileError::UnknownArchitecture)
            );
        }
        assert_eq!(
            configure_for(None, false).map(|p| p.arch()),
            match TargetArchitecture::host() {
                TargetArchitecture::Unknown => Err(ProfileError::UnknownArchitecture),
                TargetArchitecture::Arm8 => Ok(TargetArchitecture::Arm7),
                host => Ok(host),
            }
        );
    }

    #[test]
    fn test_clang_args() {
        let args = clang_args(&Profile::conservative());
        assert_eq!(
            args,
            [
                "-DTARGET_ARCHITECTURE=TARGET_ARCHITECTURE_ID_X64",
                "-DHACL_CAN_COMPILE_INLINE_ASM=1",
                "-DLib_IntVector_Intrinsics_vec128=void *",
                "-DLib_IntVector_Intrinsics_vec256=void *",
                "-DLINUX_NO_EXPLICIT_BZERO=1",
            ]
        );
        for cap in [Capability::Intrinsics, Capability::Vale, Capability::Uint128] {
            assert!(!args.iter().any(|a| a.contains(cap.c_name())), "{cap}");
        }
    }

    #[test]
    fn test_cfg_directives() {
        let got = cfg_directives(&Profile::conservative());
        let set: Vec<_> = got
            .iter()
            .filter_map(|l| l.strip_prefix("cargo::rustc-cfg="))
            .collect();
        assert_eq!(
            set,
            [
                "hacl_target_arch=\"x64\"",
                "hacl_can_compile_inline_asm",
                "hacl_no_explicit_bzero",
            ]
        );
        let declared = got
            .iter()
            .filter(|l| l.starts_with("cargo::rustc-check-cfg="))
            .count();
        assert_eq!(declared, Capability::ALL.len() + 2);
        assert!(got.iter().any(|l| l.contains("values(\"unknown\", \"x86\", \"x64\"")));
    }

    #[test]
    fn test_cfg_directives_custom() {
        let p = Profile::builder()
            .arch(TargetArchitecture::Arm8)
            .capability(Capability::Intrinsics, true)
            .no_explicit_bzero(false)
            .build()
            .unwrap();
        let got = cfg_directives(&p);
        assert!(got.contains(&"cargo::rustc-cfg=hacl_target_arch=\"arm8\"".to_string()));
        assert!(got.contains(&"cargo::rustc-cfg=hacl_can_compile_intrinsics".to_string()));
        assert!(!got.contains(&"cargo::rustc-cfg=hacl_no_explicit_bzero".to_string()));
    }

    #[test]
    fn test_write_header() {
        let dir = env::temp_dir().join(format!("hacl-config-{}", process::id()));
        fs::create_dir_all(&dir).unwrap();

        let path = write_header(&Profile::conservative(), &dir).unwrap();
        assert_eq!(path, dir.join(HEADER_NAME));
        let got = fs::read_to_string(&path).unwrap();
        assert_eq!(got, include_str!("testdata/config.h"));
        assert_eq!(parse(&got), Ok(Profile::conservative()));

        fs::remove_dir_all(&dir).unwrap();
    }
}
