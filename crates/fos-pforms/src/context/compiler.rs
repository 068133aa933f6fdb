//! Rules line compiler
//!
//! Each line starts with a one-letter identifier and a space:
//!
//! | Line | Meaning |
//! |------|---------|
//! | `C c...` | combining characters or `first-last` ranges |
//! | `M c...` | letters with no special characteristics |
//! | `P c isolated initial medial final` | letter with presentation forms (`-` for none) |
//! | `L c1 c2 result` | "pre" ligature |
//! | `A c1 c2 result` | "after" ligature |
//! | `R pattern [-> replacement]` | formatting rule |
//! | `O ...` | reserved for options |
//!
//! Characters are written literally or as `U+XXXX`. In `R` lines only the
//! escaped form `\U+XXXX` is recognized.

use super::{Context, LigatureVariant};
use crate::class::CharClass;
use crate::rule::{CompiledRule, Control, Instr};
use crate::{RuleError, MAX_CODE_POINT};

type Result<T> = std::result::Result<T, RuleError>;

/// Character cursor over one rules line
struct LineReader {
    chars: Vec<char>,
    pos: usize,
}

impl LineReader {
    fn new(line: &str) -> Self {
        Self { chars: line.chars().collect(), pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_space(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// At end of line or at a comment
    fn at_end(&self) -> bool {
        matches!(self.peek(), None | Some('#'))
    }

    /// Only spaces remain before the end, a comment or `->`
    fn at_dollar_boundary(&self) -> bool {
        let mut i = self.pos;
        while self.chars.get(i).is_some_and(|c| c.is_whitespace()) {
            i += 1;
        }
        match self.chars.get(i) {
            None | Some('#') => true,
            Some('-') => self.chars.get(i + 1) == Some(&'>'),
            _ => false,
        }
    }

    /// `+` followed by a hex digit
    fn at_hex_escape(&self) -> bool {
        self.peek() == Some('+') && self.peek_at(1).is_some_and(|c| c.is_ascii_hexdigit())
    }

    /// Read the `+XXXX` part of a code point escape
    fn read_hex(&mut self) -> Result<u32> {
        self.pos += 1;
        let mut value: u64 = 0;
        while let Some(digit) = self.peek().and_then(|c| c.to_digit(16)) {
            value = value.saturating_mul(16).saturating_add(u64::from(digit));
            self.pos += 1;
        }
        if value > u64::from(MAX_CODE_POINT) {
            return Err(RuleError::CodePointTooLarge(value));
        }
        let value = value as u32;
        if (0xD800..=0xDFFF).contains(&value) {
            return Err(RuleError::Surrogate(value));
        }
        Ok(value)
    }

    /// Read a literal character or a `U+XXXX` code point
    fn read_char(&mut self, missing: RuleError) -> Result<u32> {
        let c = self.bump().ok_or(missing)?;
        if c == 'U' && self.at_hex_escape() {
            return self.read_hex();
        }
        Ok(c as u32)
    }
}

/// Compile one rules line into the context
pub(super) fn compile_line(context: &mut Context, line: &str) -> Result<()> {
    let mut reader = LineReader::new(line);
    reader.skip_space();

    let Some(kind) = reader.bump() else {
        return Ok(());
    };
    if kind == '#' {
        return Ok(());
    }
    if reader.bump() != Some(' ') {
        return Err(RuleError::NoSpace);
    }

    match kind {
        'C' => compile_classes(context, &mut reader, CharClass::combining),
        'M' => compile_classes(context, &mut reader, CharClass::miscellaneous),
        'P' => compile_presentational(context, &mut reader),
        'L' => compile_ligature(context, &mut reader, LigatureVariant::Pre),
        'A' => compile_ligature(context, &mut reader, LigatureVariant::After),
        'O' => Ok(()),
        'R' => compile_rule(context, &mut reader),
        other => Err(RuleError::UnknownRule(other)),
    }
}

fn compile_classes(
    context: &mut Context,
    reader: &mut LineReader,
    class: fn() -> CharClass,
) -> Result<()> {
    loop {
        reader.skip_space();
        if reader.at_end() {
            return Ok(());
        }

        let first = reader.read_char(RuleError::BadRange)?;
        let last = if reader.peek() == Some('-') {
            reader.bump();
            if reader.peek().is_none_or(char::is_whitespace) {
                return Err(RuleError::BadRange);
            }
            let last = reader
                .read_char(RuleError::BadRange)
                .map_err(|_| RuleError::BadRange)?;
            if last < first {
                return Err(RuleError::BadRange);
            }
            last
        } else {
            first
        };

        context.insert_class(first, last, class())?;
    }
}

fn compile_presentational(context: &mut Context, reader: &mut LineReader) -> Result<()> {
    reader.skip_space();
    if reader.at_end() {
        return Ok(());
    }
    let c = reader.read_char(RuleError::ExtraChars)?;

    let mut forms = [None; 4];
    reader.skip_space();
    for form in forms.iter_mut() {
        if reader.at_end() {
            break;
        }
        let f = reader.read_char(RuleError::ExtraChars)?;
        // `-` (or U+0000) marks a missing form
        *form = (f != '-' as u32 && f != 0).then_some(f);
        reader.skip_space();
    }

    if !reader.at_end() {
        return Err(RuleError::ExtraChars);
    }
    context.insert_class(c, c, CharClass::presentational(forms))
}

fn compile_ligature(
    context: &mut Context,
    reader: &mut LineReader,
    variant: LigatureVariant,
) -> Result<()> {
    reader.skip_space();
    let mut chars = [0u32; 3];
    for slot in chars.iter_mut() {
        if reader.at_end() {
            return Err(RuleError::BadLigature);
        }
        *slot = reader.read_char(RuleError::BadLigature)?;
        reader.skip_space();
    }
    if !reader.at_end() {
        return Err(RuleError::ExtraChars);
    }

    let [first, second, result] = chars;
    context.insert_ligature(variant, first, second, result)
}

/// Skip a `[...]` rule options block; no options are defined yet
fn skip_rule_options(reader: &mut LineReader) -> Result<()> {
    reader.bump();
    loop {
        match reader.bump() {
            Some(']') => return Ok(()),
            Some(_) => {}
            None => return Err(RuleError::MissingOptionKet),
        }
    }
}

/// Compile the item after a backslash
fn compile_escape(reader: &mut LineReader, in_replacement: bool) -> Result<Instr> {
    let c = reader.bump().ok_or(RuleError::BadEscape)?;
    let control = match c {
        'f' => Control::Final,
        'i' => Control::Initial,
        'm' => Control::Medial,
        's' => Control::Isolated,
        'n' | 'N' | 'p' | 'P' if in_replacement => return Err(RuleError::BadReplacement),
        'n' => Control::JoinNext,
        'N' => Control::NotJoinNext,
        'p' => Control::JoinPrev,
        'P' => Control::NotJoinPrev,
        'U' if reader.at_hex_escape() => return Ok(Instr::Literal(reader.read_hex()?)),
        c if c.is_ascii_alphanumeric() => return Err(RuleError::BadEscape),
        c => return Ok(Instr::Literal(c as u32)),
    };
    Ok(Instr::Control(control))
}

fn compile_rule(context: &mut Context, reader: &mut LineReader) -> Result<()> {
    reader.skip_space();
    if reader.peek() == Some('[') {
        skip_rule_options(reader)?;
    }
    reader.skip_space();

    let mut pattern = Vec::new();
    let mut replacement = Vec::new();
    let mut had_bra = false;
    let mut had_ket = false;
    let mut had_arrow = false;
    let mut pre_len = 0;
    let mut repl_len = 0;
    // Consuming items since the start or since `(`
    let mut count = 0;

    while let Some(c) = reader.bump() {
        let instr = match c {
            '#' => break,

            '(' if !had_arrow => {
                if had_bra {
                    return Err(RuleError::RepeatedBra);
                }
                had_bra = true;
                pre_len = count;
                count = 0;
                Instr::Control(Control::Bra)
            }

            ')' if !had_arrow => {
                if had_ket {
                    return Err(RuleError::RepeatedKet);
                }
                if !had_bra {
                    return Err(RuleError::MissingBra);
                }
                had_ket = true;
                repl_len = count;
                Instr::Control(Control::Ket)
            }

            '^' if !had_arrow => {
                if !pattern.is_empty() {
                    return Err(RuleError::MisplacedCircumflex);
                }
                Instr::Control(Control::WordStart)
            }

            '$' if !had_arrow => {
                if !reader.at_dollar_boundary() {
                    return Err(RuleError::MisplacedDollar);
                }
                Instr::Control(Control::WordEnd)
            }

            '-' if !had_arrow && reader.peek() == Some('>') => {
                reader.bump();
                had_arrow = true;
                if !had_bra {
                    pre_len = count;
                }
                reader.skip_space();
                continue;
            }

            '.' => Instr::Control(Control::Any),
            '\\' => compile_escape(reader, had_arrow)?,
            other => Instr::Literal(other as u32),
        };

        if instr.consumes() {
            count += 1;
        }
        if had_arrow {
            replacement.push(instr);
        } else {
            pattern.push(instr);
        }
        reader.skip_space();
    }

    if had_bra && !had_ket {
        return Err(RuleError::MissingKet);
    }
    if pattern.is_empty() && replacement.is_empty() {
        return Ok(());
    }
    if !had_bra && !had_arrow {
        pre_len = count;
    }

    context.push_rule(CompiledRule { pre_len, repl_len, pattern, replacement });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{CharKind, Form};

    fn compile(line: &str) -> Result<Context> {
        let mut context = Context::new();
        compile_line(&mut context, line)?;
        Ok(context)
    }

    fn rule(line: &str) -> CompiledRule {
        let context = compile(line).unwrap();
        assert_eq!(context.rules().len(), 1, "no rule compiled from {:?}", line);
        context.rules()[0].clone()
    }

    #[test]
    fn test_blank_and_comment_lines() {
        for line in ["", "   ", "# comment", "  # indented comment", "O anything"] {
            let context = compile(line).unwrap();
            assert!(context.rules().is_empty());
        }
    }

    #[test]
    fn test_line_identifier_errors() {
        assert_eq!(compile("Mx").unwrap_err(), RuleError::NoSpace);
        assert_eq!(compile("M").unwrap_err(), RuleError::NoSpace);
        assert_eq!(compile("X a").unwrap_err(), RuleError::UnknownRule('X'));
    }

    #[test]
    fn test_classes_and_ranges() {
        let context = compile("C U+064B-U+0652 U+0670 # harakat").unwrap();
        assert_eq!(context.classify(0x064B).map(|c| c.kind), Some(CharKind::Combining));
        assert_eq!(context.classify(0x0650).map(|c| c.kind), Some(CharKind::Combining));
        assert_eq!(context.classify(0x0670).map(|c| c.kind), Some(CharKind::Combining));
        assert!(context.classify(0x0653).is_none());

        let context = compile("M a-z 0").unwrap();
        assert_eq!(context.classify('m' as u32).map(|c| c.kind), Some(CharKind::Miscellaneous));
        assert!(context.classify('0' as u32).is_some());
    }

    #[test]
    fn test_class_errors() {
        assert_eq!(compile("M z-a").unwrap_err(), RuleError::BadRange);
        assert_eq!(compile("M a-").unwrap_err(), RuleError::BadRange);
        assert_eq!(compile("M a- b").unwrap_err(), RuleError::BadRange);
        assert_eq!(compile("M a-U+110000").unwrap_err(), RuleError::BadRange);
        assert_eq!(compile("M a a").unwrap_err(), RuleError::DuplicateChar);
        assert_eq!(compile("M a-f c").unwrap_err(), RuleError::DuplicateChar);
        assert_eq!(compile("C U+110000").unwrap_err(), RuleError::CodePointTooLarge(0x110000));
        assert_eq!(compile("C U+D800").unwrap_err(), RuleError::Surrogate(0xD800));
    }

    #[test]
    fn test_presentational_forms() {
        let context = compile("P U+0628 U+FE8F U+FE91 U+FE92 U+FE90").unwrap();
        let class = context.classify(0x0628).unwrap();
        assert_eq!(class.kind, CharKind::Presentational);
        assert_eq!(class.form(Form::Isolated), Some(0xFE8F));
        assert_eq!(class.form(Form::Final), Some(0xFE90));

        let context = compile("P U+0627 U+FE8D - - U+FE8E").unwrap();
        let class = context.classify(0x0627).unwrap();
        assert_eq!(class.form(Form::Initial), None);
        assert_eq!(class.form(Form::Medial), None);
        assert_eq!(class.form(Form::Final), Some(0xFE8E));

        let context = compile("P a b").unwrap();
        assert_eq!(
            context.classify('a' as u32).unwrap().forms,
            [Some('b' as u32), None, None, None]
        );

        assert_eq!(compile("P a b c d e f").unwrap_err(), RuleError::ExtraChars);
    }

    #[test]
    fn test_ligatures() {
        let mut context = compile("L U+0644 U+0627 U+FEFB").unwrap();
        assert_eq!(context.ligature(LigatureVariant::Pre, 0x0644, 0x0627), Some(0xFEFB));
        assert_eq!(context.ligature(LigatureVariant::After, 0x0644, 0x0627), None);
        assert_eq!(
            compile_line(&mut context, "L U+0644 U+0627 U+FEFC").unwrap_err(),
            RuleError::DuplicateLigature
        );
        // The same pair is independent in the other table
        compile_line(&mut context, "A U+0644 U+0627 U+FEFC").unwrap();

        assert_eq!(compile("L a b").unwrap_err(), RuleError::BadLigature);
        assert_eq!(compile("A a b # c").unwrap_err(), RuleError::BadLigature);
        assert_eq!(compile("L a b c d").unwrap_err(), RuleError::ExtraChars);
    }

    #[test]
    fn test_rule_lengths() {
        let r = rule("R ^ ( . ) $ -> \\s");
        assert_eq!((r.pre_len, r.repl_len), (0, 1));
        assert_eq!(
            r.pattern,
            vec![
                Instr::Control(Control::WordStart),
                Instr::Control(Control::Bra),
                Instr::Control(Control::Any),
                Instr::Control(Control::Ket),
                Instr::Control(Control::WordEnd),
            ]
        );
        assert_eq!(r.replacement, vec![Instr::Control(Control::Isolated)]);

        let r = rule("R \\n ( . \\m ) \\p -> \\f \\i");
        assert_eq!((r.pre_len, r.repl_len), (1, 2));

        let r = rule("R a b c");
        assert_eq!((r.pre_len, r.repl_len), (3, 0));
        assert!(r.replacement.is_empty());

        let r = rule("R a b -> c");
        assert_eq!((r.pre_len, r.repl_len), (2, 0));
        assert_eq!(r.replacement, vec![Instr::Literal('c' as u32)]);
    }

    #[test]
    fn test_rule_literals_and_escapes() {
        let r = rule("R (\\U+0644 U) -> \\( ) ^ $ U+");
        assert_eq!(r.pattern[1], Instr::Literal(0x0644));
        assert_eq!(r.pattern[2], Instr::Literal('U' as u32));
        assert_eq!(
            r.replacement,
            vec![
                Instr::Literal('(' as u32),
                Instr::Literal(')' as u32),
                Instr::Literal('^' as u32),
                Instr::Literal('$' as u32),
                Instr::Literal('U' as u32),
                Instr::Literal('+' as u32),
            ]
        );

        let r = rule("R [ ] ( a ) -> - > x");
        assert_eq!(
            r.replacement,
            vec![Instr::Literal('-' as u32), Instr::Literal('>' as u32), Instr::Literal('x' as u32)]
        );
    }

    #[test]
    fn test_rule_errors() {
        assert_eq!(compile("R ( ( a )").unwrap_err(), RuleError::RepeatedBra);
        assert_eq!(compile("R ( a ) )").unwrap_err(), RuleError::RepeatedKet);
        assert_eq!(compile("R a )").unwrap_err(), RuleError::MissingBra);
        assert_eq!(compile("R ( a").unwrap_err(), RuleError::MissingKet);
        assert_eq!(compile("R ( a -> b )").unwrap_err(), RuleError::MissingKet);
        assert_eq!(compile("R a ^ ( b )").unwrap_err(), RuleError::MisplacedCircumflex);
        assert_eq!(compile("R ( a ) $ b").unwrap_err(), RuleError::MisplacedDollar);
        assert_eq!(compile("R \\q").unwrap_err(), RuleError::BadEscape);
        assert_eq!(compile("R \\U").unwrap_err(), RuleError::BadEscape);
        assert_eq!(compile("R a \\").unwrap_err(), RuleError::BadEscape);
        assert_eq!(compile("R ( . ) -> \\n").unwrap_err(), RuleError::BadReplacement);
        assert_eq!(compile("R ( . ) -> \\P").unwrap_err(), RuleError::BadReplacement);
        assert_eq!(compile("R [ ( . )").unwrap_err(), RuleError::MissingOptionKet);
        assert_eq!(compile("R \\U+D800").unwrap_err(), RuleError::Surrogate(0xD800));
    }

    #[test]
    fn test_dollar_positions() {
        assert!(compile("R ( . ) $").is_ok());
        assert!(compile("R ( . ) $ # end").is_ok());
        assert!(compile("R ( . ) $->\\f").is_ok());
    }

    #[test]
    fn test_empty_rule_dropped() {
        for line in ["R ", "R # nothing", "R ->", "R [ ]"] {
            let mut context = Context::new();
            compile_line(&mut context, line).unwrap();
            assert!(context.rules().is_empty(), "{:?} compiled a rule", line);
        }
    }

    #[test]
    fn test_rules_appended_in_order() {
        let mut context = Context::new();
        compile_line(&mut context, "R ( a ) -> b").unwrap();
        compile_line(&mut context, "R ( b ) -> c").unwrap();
        let replacements: Vec<_> = context.rules().iter().map(|r| r.replacement[0]).collect();
        assert_eq!(replacements, vec![Instr::Literal('b' as u32), Instr::Literal('c' as u32)]);
    }

    #[test]
    fn test_recompile_is_deterministic() {
        for line in [
            "R ^ ( . ) $ -> \\s",
            "R \\n ( \\m ) \\P -> \\i x",
            "R \\U+0644 ( \\U+0627 . ) -> \\U+FEFB .",
            "R a b c",
        ] {
            let first = rule(line);
            assert_eq!(first, rule(line));
            // Rendering back to rule syntax and recompiling gives the same rule
            assert_eq!(first, rule(&first.to_string()), "round trip of {:?}", line);
        }
    }
}
