//! Reversal of backwards text

use crate::context::Context;

/// Granularity of a reversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reversal {
    /// Reverse code by code
    ByCode,
    /// Reverse characters, keeping combiners after their base
    ByChar,
}

pub(crate) fn reverse(context: &Context, codes: &mut [u32], reversal: Reversal) {
    codes.reverse();
    if reversal == Reversal::ByCode {
        return;
    }

    // Each combiner run now precedes its base; move the base in front of it
    let mut i = 0;
    while i < codes.len() {
        if !context.is_combining(codes[i]) {
            i += 1;
            continue;
        }
        let base = (i + 1..codes.len()).find(|&j| !context.is_combining(codes[j]));
        match base {
            Some(j) => {
                codes[i..=j].rotate_right(1);
                i = j + 1;
            }
            // Combiners with no base stay where they are
            None => break,
        }
    }
}
