//! fOS Presentation Forms - Base Unicode to Presentation Forms
//!
//! This crate rewrites runs of base Unicode characters into their contextual
//! presentation forms, driven by a rule set supplied at runtime:
//! - Character classification (combining, miscellaneous, presentational)
//! - "Pre" ligatures resolved while words are collected
//! - Ordered, non-backtracking pattern rules selecting isolated, initial,
//!   medial and final forms
//! - "After" ligatures applied to each formatted word
//!
//! # Example
//! ```rust
//! use fos_pforms::{Context, FormatOptions};
//!
//! let mut context = Context::new();
//! context.add_rules("
//!     P a U+E001 U+E002 U+E003 U+E004
//!     R ^ ( . ) $ -> \\s
//!     R ^ ( . ) -> \\i
//!     R ( . ) $ -> \\f
//!     R ( . ) -> \\m
//! ").unwrap();
//!
//! let mut output = [0u32; 16];
//! let formatted = context
//!     .format(&['a' as u32; 3], &mut output, FormatOptions::empty())
//!     .unwrap();
//! assert_eq!(&output[..formatted.written], &[0xE002, 0xE003, 0xE004]);
//! ```

pub mod tree;
pub mod class;
pub mod rule;
pub mod context;
pub mod format;
pub mod encoding;
pub mod message;
pub mod config;

pub use tree::{IntervalTree, Overlap};
pub use class::{CharClass, CharKind, Form, MISCELLANEOUS};
pub use rule::{CompiledRule, Control, Instr};
pub use context::{CheckFailure, Context, Ligature, LigatureVariant};
pub use format::{FormatOptions, FormatStatus, Formatted};
pub use encoding::UtfError;
pub use message::error_message;
pub use config::RulesConfig;

/// Longest word, in characters, that can be formatted
pub const WORD_MAX: usize = 100;

/// Largest Unicode code point
pub const MAX_CODE_POINT: u32 = 0x10FFFF;

/// Pack an ordered pair of code points into a ligature tree key
pub fn ligature_key(first: u32, second: u32) -> u64 {
    (u64::from(first) << 32) | u64::from(second)
}

/// Error in a rule line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("No space after rule identifier")]
    NoSpace,

    #[error("Unknown rule identifier '{0}'")]
    UnknownRule(char),

    #[error("Duplicate character or range overlap in rule")]
    DuplicateChar,

    #[error("Unknown escape sequence in rule")]
    BadEscape,

    #[error("Missing ] after rule options")]
    MissingOptionKet,

    #[error("Misplaced ^ in rule (must be at start)")]
    MisplacedCircumflex,

    #[error("Misplaced $ in rule (must be at end or just before ->)")]
    MisplacedDollar,

    #[error("Found ) before ( in rule")]
    MissingBra,

    #[error("Repeated ( in rule")]
    RepeatedBra,

    #[error("Repeated ) in rule")]
    RepeatedKet,

    #[error("Missing ) in rule")]
    MissingKet,

    #[error("Invalid character range in rule")]
    BadRange,

    #[error("Extraneous character(s) at end of rule")]
    ExtraChars,

    #[error("Missing or invalid ligature data")]
    BadLigature,

    #[error("Duplicate ligature")]
    DuplicateLigature,

    #[error("\\n, \\N, \\p, and \\P are invalid in replacement text")]
    BadReplacement,

    #[error("Code point U+{0:X} is greater than U+10FFFF")]
    CodePointTooLarge(u64),

    #[error("Code point U+{0:04X} is a surrogate")]
    Surrogate(u32),
}

impl RuleError {
    /// Numeric code, as understood by [`error_message`]
    pub fn code(&self) -> i32 {
        match self {
            RuleError::NoSpace => 8,
            RuleError::DuplicateChar => 9,
            RuleError::BadEscape => 10,
            RuleError::MissingOptionKet => 11,
            RuleError::MisplacedCircumflex => 12,
            RuleError::MisplacedDollar => 13,
            RuleError::MissingBra => 14,
            RuleError::RepeatedBra => 15,
            RuleError::RepeatedKet => 16,
            RuleError::MissingKet => 17,
            RuleError::UnknownRule(_) => 18,
            RuleError::BadRange => 19,
            RuleError::ExtraChars => 20,
            RuleError::BadLigature => 27,
            RuleError::DuplicateLigature => 28,
            RuleError::BadReplacement => 29,
            RuleError::CodePointTooLarge(_) => -13,
            RuleError::Surrogate(_) => -14,
        }
    }
}

/// Presentation forms error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PformsError {
    #[error("Bad option setting")]
    BadOptions,

    #[error("Buffer is too small (at offset {offset})")]
    Overflow { offset: usize },

    #[error("Unknown error number {0}")]
    UnknownErrorCode(i32),

    #[error("Failed to open rules file {name}: {reason}")]
    File { name: String, reason: String },

    #[error("Rules line {line}: {source}")]
    Rules {
        line: usize,
        #[source]
        source: RuleError,
    },

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("Word is too long (maximum {} characters) at offset {offset}", WORD_MAX)]
    OverlongWord { offset: usize },

    #[error("Internal error {code} at offset {offset}")]
    Internal { code: u8, offset: usize },

    #[error("No matched character for character type replacement (at offset {offset})")]
    MissingCapture { offset: usize },

    #[error("Matched character does not have the requested presentation form (at offset {offset})")]
    MissingForm { offset: usize },

    #[error(transparent)]
    Utf(#[from] UtfError),
}

impl PformsError {
    /// Numeric code, as understood by [`error_message`]
    pub fn code(&self) -> i32 {
        match self {
            PformsError::BadOptions => 4,
            PformsError::Overflow { .. } => 5,
            PformsError::UnknownErrorCode(_) => 6,
            PformsError::File { .. } => 7,
            PformsError::Rules { source, .. } => source.code(),
            PformsError::Rule(source) => source.code(),
            PformsError::OverlongWord { .. } => 21,
            PformsError::Internal { code, .. } => 21 + i32::from(*code),
            PformsError::MissingCapture { .. } => 25,
            PformsError::MissingForm { .. } => 26,
            PformsError::Utf(utf) => utf.code(),
        }
    }

    /// Input offset an error refers to, if any
    pub fn offset(&self) -> Option<usize> {
        match self {
            PformsError::Overflow { offset }
            | PformsError::OverlongWord { offset }
            | PformsError::Internal { offset, .. }
            | PformsError::MissingCapture { offset }
            | PformsError::MissingForm { offset } => Some(*offset),
            PformsError::Utf(utf) => Some(utf.offset()),
            _ => None,
        }
    }

    /// Move the offset of a word-relative error to an input offset
    pub(crate) fn shifted(self, by: usize) -> Self {
        match self {
            Self::Overflow { offset } => Self::Overflow { offset: offset + by },
            Self::OverlongWord { offset } => Self::OverlongWord { offset: offset + by },
            Self::Internal { code, offset } => Self::Internal { code, offset: offset + by },
            Self::MissingCapture { offset } => Self::MissingCapture { offset: offset + by },
            Self::MissingForm { offset } => Self::MissingForm { offset: offset + by },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, PformsError>;
