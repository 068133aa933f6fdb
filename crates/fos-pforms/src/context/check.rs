//! Context consistency check
//!
//! Ligature pairs are validated against the classification tree before a
//! context is first used for formatting. "Pre" ligatures must join two known
//! characters of the same combining type; "after" ligatures may involve
//! unknown characters but never combining ones.

use super::{Context, LigatureVariant};

/// First inconsistency found by the context check
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CheckFailure {
    #[error("The first character in the U+{0:04X}/U+{1:04X} ligature is unknown")]
    UnknownFirst(u32, u32),

    #[error("The second character in the U+{0:04X}/U+{1:04X} ligature is unknown")]
    UnknownSecond(u32, u32),

    #[error("The U+{0:04X}/U+{1:04X} ligature has characters of different combining types")]
    MixedCombining(u32, u32),

    #[error("The U+{0:04X}/U+{1:04X} \"after\" ligature contains a combining character")]
    CombiningAfter(u32, u32),
}

impl CheckFailure {
    /// The offending ligature pair
    pub fn pair(&self) -> (u32, u32) {
        match *self {
            CheckFailure::UnknownFirst(x, y)
            | CheckFailure::UnknownSecond(x, y)
            | CheckFailure::MixedCombining(x, y)
            | CheckFailure::CombiningAfter(x, y) => (x, y),
        }
    }
}

/// Split a ligature key into its pair
fn unpack(key: u64) -> (u32, u32) {
    ((key >> 32) as u32, key as u32)
}

/// Validate both ligature trees, stopping at the first failure in key order
pub(super) fn check_ligatures(context: &Context) -> Result<(), CheckFailure> {
    for (key, _, _) in context.ligature_tree(LigatureVariant::Pre).iter() {
        let (x, y) = unpack(key);
        let Some(first) = context.classify(x) else {
            return Err(CheckFailure::UnknownFirst(x, y));
        };
        let Some(second) = context.classify(y) else {
            return Err(CheckFailure::UnknownSecond(x, y));
        };
        if first.is_combining() != second.is_combining() {
            return Err(CheckFailure::MixedCombining(x, y));
        }
    }

    for (key, _, _) in context.ligature_tree(LigatureVariant::After).iter() {
        let (x, y) = unpack(key);
        if context.is_combining(x) || context.is_combining(y) {
            return Err(CheckFailure::CombiningAfter(x, y));
        }
    }

    Ok(())
}
