//! Rule matching and substitution
//!
//! Rules are tried in order at each slot of a word. The first rule whose
//! pattern holds emits its replacement and scanning resumes after the
//! matched span. There is no backtracking: a failed item rejects the rule.
//! Error offsets are slot indexes within the word.

use super::segment::Word;
use super::OutputBuffer;
use crate::class::{CharKind, Form};
use crate::context::Context;
use crate::rule::{CompiledRule, Control, Instr};
use crate::{PformsError, Result};

/// A successful pattern match
#[derive(Debug, PartialEq, Eq)]
struct Match {
    /// Slot index where the replaceable span ends
    kket: usize,
    /// Slots matched by controls inside the span, in pattern order
    captures: Vec<usize>,
}

/// Apply the context's rules to one word
pub(super) fn format_word(
    context: &Context,
    word: &Word<'_>,
    output: &mut OutputBuffer<'_>,
) -> Result<()> {
    let mut i = 0;
    while i < word.len() {
        let mut resume = None;
        for rule in context.rules() {
            if let Some(found) = match_rule(rule, word, i)? {
                emit_replacement(rule, word, i, &found, output)?;
                resume = Some(found.kket);
                break;
            }
        }

        i = match resume {
            Some(kket) if kket > i => kket,
            // Nothing matched, or the span was empty
            _ => copy_slot(word, i, output, i)?,
        };
    }
    Ok(())
}

/// Test one rule with its replaceable span starting at slot `i`
fn match_rule(rule: &CompiledRule, word: &Word<'_>, i: usize) -> Result<Option<Match>> {
    let count = word.len();

    let mut k = i;
    for _ in 0..rule.pre_len {
        loop {
            if k == 0 {
                return Ok(None);
            }
            k -= 1;
            if !word.classes[k].is_combining() {
                break;
            }
        }
    }

    let mut kket = count;
    let mut captures = Vec::new();
    for &instr in &rule.pattern {
        match instr {
            // Anchors the replaceable span, not the pre-context
            Instr::Control(Control::WordStart) => {
                if i != 0 {
                    return Ok(None);
                }
            }
            Instr::Control(Control::WordEnd) => {
                if k != count {
                    return Ok(None);
                }
            }
            Instr::Control(Control::Bra) => {
                if k != i {
                    return Err(PformsError::Internal { code: 2, offset: i });
                }
            }
            Instr::Control(Control::Ket) => kket = k,
            Instr::Literal(c) => {
                if k >= count || word.chars[k] != c {
                    return Ok(None);
                }
                k = word.slot_end(k);
            }
            Instr::Control(control) => {
                if k >= count || !control.matches(word.classes[k]) {
                    return Ok(None);
                }
                if k >= i && k <= kket {
                    captures.push(k);
                }
                k = word.slot_end(k);
            }
        }
    }

    Ok(Some(Match { kket, captures }))
}

fn emit_replacement(
    rule: &CompiledRule,
    word: &Word<'_>,
    i: usize,
    found: &Match,
    output: &mut OutputBuffer<'_>,
) -> Result<()> {
    let mut captures = found.captures.iter().copied();

    for &instr in &rule.replacement {
        let control = match instr {
            Instr::Literal(c) => {
                output.push(c, i)?;
                continue;
            }
            Instr::Control(control) => control,
        };

        let j = captures.next().ok_or(PformsError::MissingCapture { offset: i })?;
        if control == Control::Any {
            copy_slot(word, j, output, i)?;
            continue;
        }

        let class = word.classes[j];
        if class.kind != CharKind::Presentational {
            return Err(PformsError::MissingForm { offset: i });
        }
        let form = match control {
            Control::JoinNext if j == 0 => Form::Initial,
            Control::JoinNext => Form::Medial,
            Control::JoinPrev if word.only_combiners_from(found.kket) => Form::Final,
            Control::JoinPrev => Form::Medial,
            other => other.form().ok_or(PformsError::Internal { code: 3, offset: i })?,
        };
        let glyph = class.form(form).ok_or(PformsError::MissingForm { offset: i })?;

        output.push(glyph, i)?;
        output.extend(&word.chars[j + 1..word.slot_end(j)], i)?;
    }
    Ok(())
}

/// Copy the slot at `k` verbatim; returns the index past it
fn copy_slot(
    word: &Word<'_>,
    k: usize,
    output: &mut OutputBuffer<'_>,
    offset: usize,
) -> Result<usize> {
    let end = word.slot_end(k);
    output.extend(&word.chars[k..end], offset)?;
    Ok(end)
}
