//! Word segmentation with "pre" ligatures

use crate::class::{CharClass, MISCELLANEOUS};
use crate::context::{Context, LigatureVariant};
use crate::{PformsError, Result, WORD_MAX};

/// A word: classified characters starting with a non-combining one
#[derive(Debug)]
pub(super) struct Word<'c> {
    pub chars: Vec<u32>,
    pub classes: Vec<&'c CharClass>,
    /// Input offset of the first character
    pub start: usize,
}

impl Word<'_> {
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Index just past the slot at `k`: its character and trailing combiners
    pub fn slot_end(&self, k: usize) -> usize {
        let mut end = k + 1;
        while end < self.len() && self.classes[end].is_combining() {
            end += 1;
        }
        end
    }

    /// Only combiners from `k` to the end of the word
    pub fn only_combiners_from(&self, k: usize) -> bool {
        self.classes[k.min(self.len())..].iter().all(|class| class.is_combining())
    }
}

/// Collect the word starting at `start`
///
/// Returns the word and the input offset just past it. The input may be
/// rearranged when a ligature partner is found beyond a run of combiners.
pub(super) fn collect_word<'c>(
    context: &'c Context,
    input: &mut [u32],
    start: usize,
    first: &'c CharClass,
) -> Result<(Word<'c>, usize)> {
    let mut word = Word { chars: vec![input[start]], classes: vec![first], start };
    let mut pos = start + 1;

    while pos < input.len() {
        let c = input[pos];
        let Some(class) = context.classify(c) else {
            break;
        };

        let last = word.len() - 1;
        let (prev, prev_class) = (word.chars[last], word.classes[last]);
        let ligature = if !prev_class.is_combining() || class.is_combining() {
            find_ligature(context, input, pos, prev, prev_class, class)
        } else {
            None
        };

        match ligature {
            Some((result, second)) => {
                word.chars[last] = result;
                word.classes[last] = context.classify(result).unwrap_or(&MISCELLANEOUS);
                // Drop the partner, keeping the combiners that preceded it
                if second > pos {
                    input.copy_within(pos..second, pos + 1);
                }
            }
            None => {
                if word.len() >= WORD_MAX {
                    return Err(PformsError::OverlongWord { offset: pos });
                }
                word.chars.push(c);
                word.classes.push(class);
            }
        }
        pos += 1;
    }

    Ok((word, pos))
}

/// Look for a "pre" ligature of `prev` with the character at `pos`
///
/// A combiner following a base letter is skipped over: the partner is then
/// the next non-combining character. Returns the result and the partner's
/// offset.
fn find_ligature(
    context: &Context,
    input: &[u32],
    pos: usize,
    prev: u32,
    prev_class: &CharClass,
    class: &CharClass,
) -> Option<(u32, usize)> {
    let mut second = pos;
    if !prev_class.is_combining() && class.is_combining() {
        second = (pos + 1..input.len()).find(|&j| !context.is_combining(input[j]))?;
        context.classify(input[second])?;
    }

    context
        .ligature(LigatureVariant::Pre, prev, input[second])
        .map(|result| (result, second))
}
