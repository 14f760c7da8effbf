//! Conservative build configuration for HACL/EverCrypt bindings.
//!
//! A [`Profile`] carries the switches a HACL/EverCrypt build
//! branches on: the target architecture, which fast paths may be
//! compiled (intrinsics, Vale assembly, inline assembly, native
//! 128-bit integers), how SIMD vectors are represented, and
//! whether a hardened zeroing primitive exists.
//!
//! The switches a crate is compiled with come from cargo
//! features; see [`Profile::compiled`]. [`Profile::header`]
//! renders the `config.h` a binding generator reads.
//!
//! ```
//! use hacl_config::{CodePath, Profile};
//!
//! let profile = Profile::conservative();
//! assert!(profile.check_conservative().is_ok());
//! assert_eq!(profile.code_path(), CodePath::InlineAssembly);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(not(any(test, doctest, feature = "std")), no_std)]
#![cfg_attr(not(any(feature = "std", test)), deny(clippy::std_instead_of_core))]

mod arch;
#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
pub mod build;
pub mod capability;
pub mod header;
mod profile;
pub mod uint128;
pub mod vector;
pub mod zero;

pub use arch::{TargetArchitecture, UnknownArchitecture};
pub use capability::{Capabilities, Capability};
pub use header::{Define, Header, ParseError, ParseErrorKind};
pub use profile::{Builder, CodePath, Profile, ProfileError, VectorKind, WideArith};
pub use zero::Zeroing;
