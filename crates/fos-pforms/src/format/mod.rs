//! Presentation forms formatting
//!
//! [`Context::format`] scans decoded code points for words. Characters that
//! cannot start a word are copied through; each word has its "pre" ligatures
//! resolved while it is collected, is rewritten by the compiled rules and
//! finally has its "after" ligatures applied to the produced output.

mod after;
mod matcher;
mod reverse;
mod segment;

use bitflags::bitflags;

use crate::context::Context;
use crate::{PformsError, Result};

use reverse::Reversal;

bitflags! {
    /// Options for a format call
    ///
    /// The width hints only select the code unit width of the UTF layer;
    /// [`Context::format`] itself always works on code points.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FormatOptions: u32 {
        /// Code units are 16 bits wide
        const UTF_16 = 1 << 0;
        /// Code units are 32 bits wide
        const UTF_32 = 1 << 1;
        /// Input is backwards; reverse it keeping combiners after their base
        const INPUT_BACKCHARS = 1 << 2;
        /// Input is backwards; reverse it code by code
        const INPUT_BACKCODES = 1 << 3;
        /// Produce backwards output, keeping combiners after their base
        const OUTPUT_BACKCHARS = 1 << 4;
        /// Produce backwards output, code by code
        const OUTPUT_BACKCODES = 1 << 5;
    }
}

impl FormatOptions {
    /// Reject mutually exclusive settings
    pub fn validate(self) -> Result<Self> {
        let exclusive = [
            Self::UTF_16 | Self::UTF_32,
            Self::INPUT_BACKCHARS | Self::INPUT_BACKCODES,
            Self::OUTPUT_BACKCHARS | Self::OUTPUT_BACKCODES,
        ];
        if exclusive.iter().any(|pair| self.contains(*pair)) {
            return Err(PformsError::BadOptions);
        }
        Ok(self)
    }

    /// Options from raw bits; unknown bits are an error
    pub fn from_raw(bits: u32) -> Result<Self> {
        Self::from_bits(bits).ok_or(PformsError::BadOptions)?.validate()
    }

    /// Code unit width in bits selected by the width hints
    pub fn code_unit_bits(self) -> u32 {
        if self.contains(Self::UTF_32) {
            32
        } else if self.contains(Self::UTF_16) {
            16
        } else {
            8
        }
    }

    fn input_reversal(self) -> Option<Reversal> {
        if self.contains(Self::INPUT_BACKCHARS) {
            Some(Reversal::ByChar)
        } else if self.contains(Self::INPUT_BACKCODES) {
            Some(Reversal::ByCode)
        } else {
            None
        }
    }

    fn output_reversal(self) -> Option<Reversal> {
        if self.contains(Self::OUTPUT_BACKCHARS) {
            Some(Reversal::ByChar)
        } else if self.contains(Self::OUTPUT_BACKCODES) {
            Some(Reversal::ByCode)
        } else {
            None
        }
    }
}

/// Outcome of a format call that produced output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatStatus {
    Success,
    /// The context check failed; output was produced with the ligature
    /// tables as they are
    ContextCheckFailed,
}

/// Result of a format call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Formatted {
    /// Code points written to the output buffer
    pub written: usize,
    pub status: FormatStatus,
}

impl Formatted {
    pub fn check_failed(&self) -> bool {
        self.status == FormatStatus::ContextCheckFailed
    }
}

/// Caller's output buffer with a fill count
pub(crate) struct OutputBuffer<'a> {
    buf: &'a mut [u32],
    used: usize,
}

impl<'a> OutputBuffer<'a> {
    pub(crate) fn new(buf: &'a mut [u32]) -> Self {
        Self { buf, used: 0 }
    }

    pub(crate) fn used(&self) -> usize {
        self.used
    }

    /// Append a code point; `offset` locates the failure if the buffer is full
    pub(crate) fn push(&mut self, c: u32, offset: usize) -> Result<()> {
        let Some(slot) = self.buf.get_mut(self.used) else {
            return Err(PformsError::Overflow { offset });
        };
        *slot = c;
        self.used += 1;
        Ok(())
    }

    pub(crate) fn extend(&mut self, codes: &[u32], offset: usize) -> Result<()> {
        codes.iter().try_for_each(|&c| self.push(c, offset))
    }

    pub(crate) fn as_slice(&self) -> &[u32] {
        &self.buf[..self.used]
    }

    pub(crate) fn set(&mut self, index: usize, c: u32) {
        self.buf[index] = c;
    }

    /// Remove one written code point, closing the gap
    pub(crate) fn remove(&mut self, index: usize) {
        self.buf.copy_within(index + 1..self.used, index);
        self.used -= 1;
    }
}

impl Context {
    /// Format decoded code points into `output`
    ///
    /// Returns the number of code points written. A failed context check
    /// does not stop formatting; it is reported in [`Formatted::status`]
    /// and kept for [`Context::check_message`]. Errors carry the input
    /// offset they relate to.
    pub fn format(
        &mut self,
        input: &[u32],
        output: &mut [u32],
        options: FormatOptions,
    ) -> Result<Formatted> {
        let options = options.validate()?;
        let consistent = self.ensure_checked();
        self.format_with(input, output, options, consistent)
    }

    /// Format through a shared reference
    ///
    /// Behaves like [`Context::format`] but records nothing, so several
    /// threads can format with one context. A context changed since its
    /// last [`Context::check`] is checked again on every call.
    pub fn format_shared(
        &self,
        input: &[u32],
        output: &mut [u32],
        options: FormatOptions,
    ) -> Result<Formatted> {
        let options = options.validate()?;
        self.format_with(input, output, options, self.is_consistent())
    }

    fn format_with(
        &self,
        input: &[u32],
        output: &mut [u32],
        options: FormatOptions,
        consistent: bool,
    ) -> Result<Formatted> {
        let status = if consistent {
            FormatStatus::Success
        } else {
            FormatStatus::ContextCheckFailed
        };

        // Pre ligatures shuffle the input, so work on a copy
        let mut codes = input.to_vec();
        if let Some(reversal) = options.input_reversal() {
            reverse::reverse(self, &mut codes, reversal);
        }

        let mut buffer = OutputBuffer::new(output);
        self.format_codes(&mut codes, &mut buffer)?;
        let written = buffer.used();

        if let Some(reversal) = options.output_reversal() {
            reverse::reverse(self, &mut output[..written], reversal);
        }

        tracing::trace!("Formatted {} code points into {}", input.len(), written);
        Ok(Formatted { written, status })
    }

    fn format_codes(&self, codes: &mut [u32], output: &mut OutputBuffer<'_>) -> Result<()> {
        let mut pos = 0;
        while pos < codes.len() {
            let first = match self.classify(codes[pos]) {
                Some(class) if !class.is_combining() => class,
                _ => {
                    output.push(codes[pos], pos)?;
                    pos += 1;
                    continue;
                }
            };

            let (word, end) = segment::collect_word(self, codes, pos, first)?;
            tracing::trace!("Word at {}: {} slots", word.start, word.len());

            let word_output = output.used();
            matcher::format_word(self, &word, output)
                .map_err(|err| err.shifted(word.start))?;
            if self.has_after_ligatures() {
                after::apply_after_ligatures(self, output, word_output);
            }
            pos = end;
        }
        Ok(())
    }
}
