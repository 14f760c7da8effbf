//! Rendering and parsing `config.h`.
//!
//! The header is the form a [`Profile`] takes for the binding
//! generator and for the C preprocessor. Enabled switches are
//! `#define`d; disabled ones are written commented out so the
//! file documents every switch it could set. Each vector width is
//! either given its `void *` placeholder or announced as native
//! with `HACL_CAN_COMPILE_VEC128`/`HACL_CAN_COMPILE_VEC256`.
//!
//! ```
//! use hacl_config::Profile;
//!
//! let header = Profile::conservative().header().to_string();
//! assert!(header.contains("#define HACL_CAN_COMPILE_INLINE_ASM 1\n"));
//! assert!(header.contains("// #define HACL_CAN_COMPILE_VALE 1\n"));
//!
//! let profile: Profile = header.parse().unwrap();
//! assert_eq!(profile, Profile::conservative());
//! ```

use core::{error, fmt, str::FromStr};

use crate::{
    arch::TargetArchitecture,
    capability::{Capabilities, Capability},
    profile::{Profile, VectorKind},
    vector::{
        PLACEHOLDER_DEFINITION, VEC128_NATIVE_SYMBOL, VEC128_SYMBOL, VEC256_NATIVE_SYMBOL,
        VEC256_SYMBOL,
    },
};

/// The symbol naming the target architecture.
pub const TARGET_ARCHITECTURE: &str = "TARGET_ARCHITECTURE";

/// The symbol signalling the lack of a hardened zeroing
/// primitive.
pub const LINUX_NO_EXPLICIT_BZERO: &str = "LINUX_NO_EXPLICIT_BZERO";

const CONSERVATIVE_BANNER: &str = "// Use most conservative settings for bindgen";
const CUSTOM_BANNER: &str = "// Custom settings for bindgen";

/// A single preprocessor definition.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Define {
    name: &'static str,
    value: &'static str,
}

impl Define {
    const fn new(name: &'static str, value: &'static str) -> Self {
        Self { name, value }
    }

    /// Returns the symbol name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the replacement text, which may be empty.
    pub const fn value(&self) -> &'static str {
        self.value
    }
}

impl fmt::Display for Define {
    /// Writes `NAME=VALUE`, or `NAME` if the value is empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            f.write_str(self.name)
        } else {
            write!(f, "{}={}", self.name, self.value)
        }
    }
}

/// The `config.h` of a [`Profile`].
///
/// Its [`Display`][fmt::Display] impl writes the header.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Header {
    profile: Profile,
}

impl Header {
    pub(crate) const fn new(profile: Profile) -> Self {
        Self { profile }
    }

    /// Returns the profile.
    pub const fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Iterates over every switch in header order, paired with
    /// whether it is defined.
    fn entries(&self) -> impl Iterator<Item = (Define, bool)> {
        let p = self.profile;
        let cap = move |cap: Capability| (Define::new(cap.c_name(), "1"), p.can_compile(cap));
        let vector = |kind, placeholder, native| match kind {
            VectorKind::Opaque => (Define::new(placeholder, PLACEHOLDER_DEFINITION), true),
            VectorKind::Native => (Define::new(native, "1"), true),
        };
        [
            (
                Define::new(TARGET_ARCHITECTURE, p.arch().c_name()),
                true,
            ),
            cap(Capability::Intrinsics),
            cap(Capability::Vale),
            cap(Capability::InlineAsm),
            vector(p.vec128(), VEC128_SYMBOL, VEC128_NATIVE_SYMBOL),
            vector(p.vec256(), VEC256_SYMBOL, VEC256_NATIVE_SYMBOL),
            cap(Capability::Uint128),
            (
                Define::new(LINUX_NO_EXPLICIT_BZERO, "1"),
                p.no_explicit_bzero(),
            ),
        ]
        .into_iter()
    }

    /// Iterates over the active definitions.
    ///
    /// These are suitable for `-D` compiler flags.
    pub fn defines(&self) -> impl Iterator<Item = Define> {
        self.entries()
            .filter_map(|(define, enabled)| enabled.then_some(define))
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.profile.is_conservative() {
            writeln!(f, "{CONSERVATIVE_BANNER}")?;
        } else {
            writeln!(f, "{CUSTOM_BANNER}")?;
        }
        writeln!(f)?;
        for (define, enabled) in self.entries() {
            if !enabled {
                f.write_str("// ")?;
            }
            write!(f, "#define {} {}", define.name, define.value)?;
            // Matches the historical header byte for byte.
            if define.name == TARGET_ARCHITECTURE {
                f.write_str(" ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Parses a `config.h`.
///
/// `//` comments (including commented-out definitions), trailing
/// `/* ... */` comments and blank lines are ignored. A vector width
/// with neither its placeholder nor its `HACL_CAN_COMPILE_VEC*`
/// symbol defined uses the native vector type.
///
/// The returned profile is not validated; see
/// [`Profile::validate`].
pub fn parse(src: &str) -> Result<Profile, ParseError> {
    let mut arch = None;
    let mut capabilities = Capabilities::NONE;
    let mut vec128 = VectorKind::Native;
    let mut vec256 = VectorKind::Native;
    let mut no_explicit_bzero = false;

    let mut seen = Seen::default();
    for (idx, line) in src.lines().enumerate() {
        let lineno = idx.saturating_add(1);
        let err = |kind| ParseError {
            line: Some(lineno),
            kind,
        };

        let line = strip_comment(line).map_err(err)?.trim();
        if line.is_empty() {
            continue;
        }
        let Some(rest) = line.strip_prefix('#') else {
            return Err(err(ParseErrorKind::Malformed));
        };
        let Some(rest) = rest.trim_start().strip_prefix("define") else {
            return Err(err(ParseErrorKind::UnsupportedDirective));
        };
        if !rest.starts_with(char::is_whitespace) {
            return Err(err(ParseErrorKind::Malformed));
        }
        let (name, value) = match rest.trim().split_once(char::is_whitespace) {
            Some((name, value)) => (name, value.trim()),
            None => (rest.trim(), ""),
        };

        match name {
            TARGET_ARCHITECTURE => {
                seen.mark(Slot::Arch).map_err(err)?;
                let id = TargetArchitecture::from_c_name(value)
                    .ok_or_else(|| err(ParseErrorKind::UnknownArchitecture))?;
                arch = Some(id);
            }
            VEC128_SYMBOL | VEC256_SYMBOL => {
                if !is_placeholder(value) {
                    return Err(err(ParseErrorKind::InvalidVector));
                }
                if name == VEC128_SYMBOL {
                    seen.mark(Slot::Vec128).map_err(err)?;
                    vec128 = VectorKind::Opaque;
                } else {
                    seen.mark(Slot::Vec256).map_err(err)?;
                    vec256 = VectorKind::Opaque;
                }
            }
            VEC128_NATIVE_SYMBOL => {
                seen.mark(Slot::Vec128).map_err(err)?;
                check_flag(value).map_err(err)?;
                vec128 = VectorKind::Native;
            }
            VEC256_NATIVE_SYMBOL => {
                seen.mark(Slot::Vec256).map_err(err)?;
                check_flag(value).map_err(err)?;
                vec256 = VectorKind::Native;
            }
            LINUX_NO_EXPLICIT_BZERO => {
                seen.mark(Slot::Bzero).map_err(err)?;
                check_flag(value).map_err(err)?;
                no_explicit_bzero = true;
            }
            _ => {
                let cap = Capability::from_c_name(name)
                    .ok_or_else(|| err(ParseErrorKind::UnknownSymbol))?;
                seen.mark(Slot::Capability(cap)).map_err(err)?;
                check_flag(value).map_err(err)?;
                capabilities = capabilities.with(cap);
            }
        }
    }

    let arch = arch.ok_or(ParseError {
        line: None,
        kind: ParseErrorKind::MissingArchitecture,
    })?;
    Ok(Profile::builder()
        .arch(arch)
        .capabilities(capabilities)
        .vec128(vec128)
        .vec256(vec256)
        .no_explicit_bzero(no_explicit_bzero)
        .build_unchecked())
}

impl FromStr for Profile {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Removes a trailing `//` or single-line `/* */` comment.
fn strip_comment(line: &str) -> Result<&str, ParseErrorKind> {
    let start = match (line.find("//"), line.find("/*")) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => return Ok(line),
    };
    let (code, comment) = line.split_at(start);
    if let Some(body) = comment.strip_prefix("/*") {
        let Some((_, tail)) = body.split_once("*/") else {
            return Err(ParseErrorKind::Malformed);
        };
        // Only more comments may follow.
        if !strip_comment(tail)?.trim().is_empty() {
            return Err(ParseErrorKind::Malformed);
        }
    }
    Ok(code)
}

fn check_flag(value: &str) -> Result<(), ParseErrorKind> {
    match value {
        "" | "1" => Ok(()),
        _ => Err(ParseErrorKind::InvalidValue),
    }
}

/// Reports whether `value` spells `void *`, ignoring
/// whitespace.
fn is_placeholder(value: &str) -> bool {
    let mut want = PLACEHOLDER_DEFINITION.chars().filter(|c| !c.is_whitespace());
    let mut got = value.chars().filter(|c| !c.is_whitespace());
    loop {
        match (want.next(), got.next()) {
            (None, None) => return true,
            (a, b) if a == b => {}
            _ => return false,
        }
    }
}

#[derive(Copy, Clone)]
enum Slot {
    Arch,
    Capability(Capability),
    Vec128,
    Vec256,
    Bzero,
}

/// Tracks which symbols have been defined.
#[derive(Default)]
struct Seen {
    arch: bool,
    capabilities: Capabilities,
    vec128: bool,
    vec256: bool,
    bzero: bool,
}

impl Seen {
    fn mark(&mut self, slot: Slot) -> Result<(), ParseErrorKind> {
        let flag = match slot {
            Slot::Arch => &mut self.arch,
            Slot::Vec128 => &mut self.vec128,
            Slot::Vec256 => &mut self.vec256,
            Slot::Bzero => &mut self.bzero,
            Slot::Capability(cap) => {
                if self.capabilities.contains(cap) {
                    return Err(ParseErrorKind::Duplicate);
                }
                self.capabilities = self.capabilities.with(cap);
                return Ok(());
            }
        };
        if *flag {
            return Err(ParseErrorKind::Duplicate);
        }
        *flag = true;
        Ok(())
    }
}

/// A `config.h` could not be parsed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ParseError {
    line: Option<usize>,
    kind: ParseErrorKind,
}

impl ParseError {
    /// Returns the 1-based line number, if the error belongs to
    /// a line.
    pub const fn line(&self) -> Option<usize> {
        self.line
    }

    /// Returns the kind of error.
    pub const fn kind(&self) -> ParseErrorKind {
        self.kind
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl error::Error for ParseError {}

/// The kind of [`ParseError`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ParseErrorKind {
    /// The line is neither a directive nor a comment, or a
    /// block comment does not end on its line.
    Malformed,
    /// The directive is not `#define`.
    UnsupportedDirective,
    /// The symbol is not a configuration switch.
    UnknownSymbol,
    /// The symbol was already defined.
    Duplicate,
    /// The architecture identifier is not recognized.
    UnknownArchitecture,
    /// A switch was given a value other than `1`.
    InvalidValue,
    /// A vector symbol was defined as something other than
    /// `void *`.
    InvalidVector,
    /// `TARGET_ARCHITECTURE` is never defined.
    MissingArchitecture,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::Malformed => "malformed line",
            Self::UnsupportedDirective => "unsupported preprocessor directive",
            Self::UnknownSymbol => "unknown symbol",
            Self::Duplicate => "duplicate definition",
            Self::UnknownArchitecture => "unknown target architecture",
            Self::InvalidValue => "switch must be defined as `1`",
            Self::InvalidVector => "vector placeholder must be `void *`",
            Self::MissingArchitecture => "`TARGET_ARCHITECTURE` is not defined",
        };
        f.write_str(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::{parse, Define, ParseErrorKind};
    use crate::{
        arch::TargetArchitecture,
        capability::Capability,
        profile::{Profile, VectorKind},
    };

    const ORIGINAL: &str = include_str!("testdata/config.h");

    #[test]
    fn test_render_conservative() {
        assert_eq!(Profile::conservative().header().to_string(), ORIGINAL);
    }

    #[test]
    fn test_parse_conservative() {
        let p = parse(ORIGINAL).unwrap();
        assert_eq!(p, Profile::conservative());
        assert!(p.is_conservative());
    }

    #[test]
    fn test_defines() {
        let got: Vec<String> = Profile::conservative()
            .header()
            .defines()
            .map(|d| d.to_string())
            .collect();
        assert_eq!(
            got,
            [
                "TARGET_ARCHITECTURE=TARGET_ARCHITECTURE_ID_X64",
                "HACL_CAN_COMPILE_INLINE_ASM=1",
                "Lib_IntVector_Intrinsics_vec128=void *",
                "Lib_IntVector_Intrinsics_vec256=void *",
                "LINUX_NO_EXPLICIT_BZERO=1",
            ]
        );
        assert_eq!(Define::new("FOO", "").to_string(), "FOO");
    }

    #[test]
    fn test_render_custom() {
        let p = Profile::builder()
            .arch(TargetArchitecture::Arm8)
            .capability(Capability::Intrinsics, true)
            .capability(Capability::Uint128, true)
            .no_explicit_bzero(false)
            .build()
            .unwrap();
        let got = p.header().to_string();
        assert!(got.starts_with("// Custom settings for bindgen\n\n"));
        assert!(got.contains("#define TARGET_ARCHITECTURE TARGET_ARCHITECTURE_ID_ARM8 \n"));
        assert!(got.contains("\n#define HACL_CAN_COMPILE_INTRINSICS 1\n"));
        assert!(got.contains("\n#define HACL_CAN_COMPILE_VEC128 1\n"));
        assert!(!got.contains("Lib_IntVector_Intrinsics_vec128"));
        assert!(got.contains("\n#define Lib_IntVector_Intrinsics_vec256 void *\n"));
        assert!(got.contains("// #define LINUX_NO_EXPLICIT_BZERO 1\n"));
        assert_eq!(parse(&got), Ok(p));
    }

    #[test]
    fn test_parse_lenient_spacing() {
        let src = "  #  define TARGET_ARCHITECTURE\tTARGET_ARCHITECTURE_ID_X64\n\
                   #define HACL_CAN_COMPILE_VALE\n\
                   #define Lib_IntVector_Intrinsics_vec128 void*\n\
                   #define Lib_IntVector_Intrinsics_vec256   void   *  \n";
        let p = parse(src).unwrap();
        assert_eq!(p.arch(), TargetArchitecture::X64);
        assert!(p.can_compile(Capability::Vale));
        assert!(!p.can_compile(Capability::InlineAsm));
        assert_eq!(p.vec128(), VectorKind::Opaque);
        assert_eq!(p.vec256(), VectorKind::Opaque);
        assert!(!p.no_explicit_bzero());
    }

    #[test]
    fn test_parse_errors() {
        let cases: &[(&str, Option<usize>, ParseErrorKind)] = &[
            ("", None, ParseErrorKind::MissingArchitecture),
            ("// only comments\n", None, ParseErrorKind::MissingArchitecture),
            ("int x;\n", Some(1), ParseErrorKind::Malformed),
            ("#include <stdint.h>\n", Some(1), ParseErrorKind::UnsupportedDirective),
            ("#defineFOO 1\n", Some(1), ParseErrorKind::Malformed),
            ("\n#define FOO 1\n", Some(2), ParseErrorKind::UnknownSymbol),
            (
                "#define TARGET_ARCHITECTURE TARGET_ARCHITECTURE_ID_RISCV\n",
                Some(1),
                ParseErrorKind::UnknownArchitecture,
            ),
            (
                "#define TARGET_ARCHITECTURE TARGET_ARCHITECTURE_ID_X64\n\
                 #define TARGET_ARCHITECTURE TARGET_ARCHITECTURE_ID_X86\n",
                Some(2),
                ParseErrorKind::Duplicate,
            ),
            (
                "#define HACL_CAN_COMPILE_VALE 1\n#define HACL_CAN_COMPILE_VALE 1\n",
                Some(2),
                ParseErrorKind::Duplicate,
            ),
            (
                "#define HACL_CAN_COMPILE_UINT128 0\n",
                Some(1),
                ParseErrorKind::InvalidValue,
            ),
            (
                "#define Lib_IntVector_Intrinsics_vec128 __m128i\n",
                Some(1),
                ParseErrorKind::InvalidVector,
            ),
            (
                "#define TARGET_ARCHITECTURE x64\n",
                Some(1),
                ParseErrorKind::UnknownArchitecture,
            ),
            (
                "#define HACL_CAN_COMPILE_VEC256 1\n#define Lib_IntVector_Intrinsics_vec256 void *\n",
                Some(2),
                ParseErrorKind::Duplicate,
            ),
            (
                "#define HACL_CAN_COMPILE_VEC128 2\n",
                Some(1),
                ParseErrorKind::InvalidValue,
            ),
            (
                "#define HACL_CAN_COMPILE_VALE 1 /* unterminated\n",
                Some(1),
                ParseErrorKind::Malformed,
            ),
            (
                "#define HACL_CAN_COMPILE_VALE /* on */ 1\n",
                Some(1),
                ParseErrorKind::Malformed,
            ),
        ];
        for (i, (src, line, kind)) in cases.iter().enumerate() {
            let err = parse(src).unwrap_err();
            assert_eq!(err.kind(), *kind, "#{i}: {src:?}");
            assert_eq!(err.line(), *line, "#{i}: {src:?}");
        }
    }

    #[test]
    fn test_error_display() {
        let err = parse("\n\n#define FOO\n").unwrap_err();
        assert_eq!(err.to_string(), "line 3: unknown symbol");
        let err = parse("").unwrap_err();
        assert_eq!(err.to_string(), "`TARGET_ARCHITECTURE` is not defined");
    }

    #[test]
    fn test_parse_trailing_comments() {
        let src = "#define TARGET_ARCHITECTURE TARGET_ARCHITECTURE_ID_X64 // x86-64\n\
                   #define HACL_CAN_COMPILE_INLINE_ASM 1 /* allowed */\n\
                   #define Lib_IntVector_Intrinsics_vec128 void * /* opaque */ // 128\n\
                   /* block comment on its own line */\n\
                   #define Lib_IntVector_Intrinsics_vec256 void *//256\n\
                   #define LINUX_NO_EXPLICIT_BZERO/**/\n";
        assert_eq!(parse(src), Ok(Profile::conservative()));
    }

    #[test]
    fn test_native_vector_symbols() {
        let src = "#define TARGET_ARCHITECTURE TARGET_ARCHITECTURE_ID_X64\n\
                   #define HACL_CAN_COMPILE_INTRINSICS 1\n\
                   #define HACL_CAN_COMPILE_VEC128 1\n\
                   #define Lib_IntVector_Intrinsics_vec256 void *\n";
        let p = parse(src).unwrap();
        assert_eq!(p.vec128(), VectorKind::Native);
        assert_eq!(p.vec256(), VectorKind::Opaque);
        assert_eq!(p.validate(), Ok(()));

        let defines: Vec<String> = p.header().defines().map(|d| d.to_string()).collect();
        assert!(defines.contains(&"HACL_CAN_COMPILE_VEC128=1".to_string()));
        assert!(defines.contains(&"Lib_IntVector_Intrinsics_vec256=void *".to_string()));
        assert_eq!(parse(&p.header().to_string()), Ok(p));
    }

    #[test]
    fn test_missing_vectors_mean_native() {
        let src = "#define TARGET_ARCHITECTURE TARGET_ARCHITECTURE_ID_X64\n\
                   #define HACL_CAN_COMPILE_INTRINSICS 1\n";
        let p: Profile = src.parse().unwrap();
        assert_eq!(p.vec128(), VectorKind::Native);
        assert_eq!(p.vec256(), VectorKind::Native);
        assert_eq!(p.validate(), Ok(()));
    }
}
