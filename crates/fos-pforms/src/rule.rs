//! Compiled formatting rules
//!
//! A rule line such as `R ^ ( . ) -> \i` compiles into a pattern and a
//! replacement, each a sequence of [`Instr`]. Literal code points and control
//! items are distinct variants, so no code point value is reserved.

use std::fmt;

use crate::class::{CharClass, Form};

/// Control item in a pattern or replacement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// `^` - start of word
    WordStart,
    /// `$` - end of word
    WordEnd,
    /// `(` - start of the replaceable characters
    Bra,
    /// `)` - end of the replaceable characters
    Ket,
    /// `.` - any character
    Any,
    /// `\f` - character with a final form
    Final,
    /// `\i` - character with an initial form
    Initial,
    /// `\m` - character with a medial form
    Medial,
    /// `\s` - character with an isolated form
    Isolated,
    /// `\n` - character that can join to the next one
    JoinNext,
    /// `\p` - character that can join to the previous one
    JoinPrev,
    /// `\N` - character that can't join to the next one
    NotJoinNext,
    /// `\P` - character that can't join to the previous one
    NotJoinPrev,
}

impl Control {
    /// Whether matching this item consumes a character
    pub fn consumes(self) -> bool {
        !matches!(self, Control::WordStart | Control::WordEnd | Control::Bra | Control::Ket)
    }

    /// Test a character against a consuming item
    pub fn matches(self, class: &CharClass) -> bool {
        match self {
            Control::Any => true,
            Control::Final => class.has_form(Form::Final),
            Control::Initial => class.has_form(Form::Initial),
            Control::Medial => class.has_form(Form::Medial),
            Control::Isolated => class.has_form(Form::Isolated),
            Control::JoinNext => class.joins_next(),
            Control::JoinPrev => class.joins_prev(),
            Control::NotJoinNext => !class.joins_next(),
            Control::NotJoinPrev => !class.joins_prev(),
            Control::WordStart | Control::WordEnd | Control::Bra | Control::Ket => false,
        }
    }

    /// Form selected by this item in a replacement
    pub fn form(self) -> Option<Form> {
        match self {
            Control::Final => Some(Form::Final),
            Control::Initial => Some(Form::Initial),
            Control::Medial => Some(Form::Medial),
            Control::Isolated => Some(Form::Isolated),
            _ => None,
        }
    }

    fn token(self) -> &'static str {
        match self {
            Control::WordStart => "^",
            Control::WordEnd => "$",
            Control::Bra => "(",
            Control::Ket => ")",
            Control::Any => ".",
            Control::Final => "\\f",
            Control::Initial => "\\i",
            Control::Medial => "\\m",
            Control::Isolated => "\\s",
            Control::JoinNext => "\\n",
            Control::JoinPrev => "\\p",
            Control::NotJoinNext => "\\N",
            Control::NotJoinPrev => "\\P",
        }
    }
}

/// One item of a compiled pattern or replacement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instr {
    Literal(u32),
    Control(Control),
}

impl Instr {
    /// Whether matching this item consumes a character
    pub fn consumes(self) -> bool {
        match self {
            Instr::Literal(_) => true,
            Instr::Control(control) => control.consumes(),
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instr::Control(control) => f.write_str(control.token()),
            Instr::Literal(c) => match char::from_u32(c) {
                Some(ch) if ch.is_alphanumeric() && ch != 'U' => write!(f, "{}", ch),
                _ => write!(f, "\\U+{:04X}", c),
            },
        }
    }
}

/// A compiled `R` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRule {
    /// Characters matched before the replaceable span
    pub pre_len: usize,
    /// Characters inside the replaceable span
    pub repl_len: usize,
    pub pattern: Vec<Instr>,
    pub replacement: Vec<Instr>,
}

impl fmt::Display for CompiledRule {
    /// Renders the rule back into rule-file syntax
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("R")?;
        for instr in &self.pattern {
            write!(f, " {}", instr)?;
        }
        if !self.replacement.is_empty() {
            f.write_str(" ->")?;
            for instr in &self.replacement {
                write!(f, " {}", instr)?;
            }
        }
        Ok(())
    }
}
