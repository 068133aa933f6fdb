//! "After" ligatures over a formatted word

use super::OutputBuffer;
use crate::context::{Context, LigatureVariant};

/// Join pairs of adjacent non-combining characters in `output[start..]`
///
/// Combiners between the two characters are skipped and kept. A joined
/// result is tried again against the character that follows it.
pub(super) fn apply_after_ligatures(
    context: &Context,
    output: &mut OutputBuffer<'_>,
    start: usize,
) {
    let mut x = start;
    while x + 1 < output.used() {
        let written = output.as_slice();
        if context.is_combining(written[x]) {
            x += 1;
            continue;
        }

        let Some(y) = (x + 1..written.len()).find(|&y| !context.is_combining(written[y])) else {
            break;
        };

        match context.ligature(LigatureVariant::After, written[x], written[y]) {
            Some(result) => {
                output.set(x, result);
                output.remove(y);
            }
            None => x = y,
        }
    }
}
