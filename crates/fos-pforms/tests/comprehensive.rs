//! Comprehensive tests for fos-pforms
//!
//! End-to-end formatting with realistic rule sets.

use anyhow::Result;
use fos_pforms::{
    Context, FormatOptions, FormatStatus, LigatureVariant, PformsError, RuleError, RulesConfig,
};

/// Beh, alef and lam with their presentation forms, harakat and lam-alef
const ARABIC: &str = r"
# Letters: isolated initial medial final
P U+0628 U+FE8F U+FE91 U+FE92 U+FE90
P U+0627 U+FE8D -      -      U+FE8E
P U+0644 U+FEDD U+FEDF U+FEE0 U+FEDE
P U+FEFB U+FEFB -      -      U+FEFC
C U+064B-U+0652

L U+0644 U+0627 U+FEFB

R \n ( \m ) \p -> \m
R \n ( \f ) -> \f
R ( \i ) \p -> \i
R ( \s ) -> \s
";

fn arabic() -> Context {
    let mut context = Context::new();
    context.add_rules(ARABIC).expect("rules compile");
    context
}

fn codes(text: &str) -> Vec<u32> {
    text.chars().map(u32::from).collect()
}

fn format(context: &mut Context, input: &[u32], options: FormatOptions) -> Result<Vec<u32>> {
    let mut output = vec![0u32; 64];
    let formatted = context.format(input, &mut output, options)?;
    assert_eq!(formatted.status, FormatStatus::Success);
    output.truncate(formatted.written);
    Ok(output)
}

// ============================================================================
// FORM SELECTION
// ============================================================================

#[test]
fn test_isolated_initial_medial_final() -> Result<()> {
    let mut context = Context::new();
    context.add_rules(
        "P a U+E001 U+E002 U+E003 U+E004\n\
         R ^ ( . ) $ -> \\s\n\
         R ^ ( . ) -> \\i\n\
         R ( . ) $ -> \\f\n\
         R ( . ) -> \\m\n",
    )?;

    assert_eq!(
        format(&mut context, &codes("aaa"), FormatOptions::empty())?,
        vec![0xE002, 0xE003, 0xE004]
    );
    assert_eq!(format(&mut context, &codes("a"), FormatOptions::empty())?, vec![0xE001]);
    assert_eq!(
        format(&mut context, &codes("aaaa"), FormatOptions::empty())?,
        vec![0xE002, 0xE003, 0xE003, 0xE004]
    );
    Ok(())
}

#[test]
fn test_arabic_joining() -> Result<()> {
    let mut context = arabic();
    assert_eq!(format(&mut context, &codes("بب"), FormatOptions::empty())?, vec![0xFE91, 0xFE90]);
    assert_eq!(
        format(&mut context, &codes("ببب"), FormatOptions::empty())?,
        vec![0xFE91, 0xFE92, 0xFE90]
    );
    // Alef does not join to the following letter
    assert_eq!(
        format(&mut context, &codes("باب"), FormatOptions::empty())?,
        vec![0xFE91, 0xFE8E, 0xFE8F]
    );
    Ok(())
}

#[test]
fn test_harakat_follow_their_letter() -> Result<()> {
    let mut context = arabic();
    assert_eq!(
        format(&mut context, &codes("بَبُ"), FormatOptions::empty())?,
        vec![0xFE91, 0x064E, 0xFE90, 0x064F]
    );
    Ok(())
}

#[test]
fn test_non_word_characters_copied() -> Result<()> {
    let mut context = arabic();
    assert_eq!(
        format(&mut context, &codes("بب، ب!"), FormatOptions::empty())?,
        vec![0xFE91, 0xFE90, 0x060C, 0x20, 0xFE8F, 0x21]
    );
    // A harakah outside a word cannot start one
    assert_eq!(format(&mut context, &codes("َب"), FormatOptions::empty())?, vec![0x064E, 0xFE8F]);
    Ok(())
}

// ============================================================================
// LIGATURES
// ============================================================================

#[test]
fn test_simple_pre_ligature() -> Result<()> {
    let mut context = Context::new();
    context.add_rules("M A B\nL A B L")?;
    assert_eq!(format(&mut context, &codes("AB"), FormatOptions::empty())?, codes("L"));

    let err = context.add_line("L A B L").unwrap_err();
    assert_eq!(err, RuleError::DuplicateLigature);
    Ok(())
}

#[test]
fn test_lam_alef() -> Result<()> {
    let mut context = arabic();
    assert_eq!(format(&mut context, &codes("لا"), FormatOptions::empty())?, vec![0xFEFB]);
    assert_eq!(format(&mut context, &codes("بلا"), FormatOptions::empty())?, vec![0xFE91, 0xFEFC]);
    Ok(())
}

#[test]
fn test_lam_alef_across_harakah() -> Result<()> {
    let mut context = arabic();
    // The fatha moves after the ligature
    assert_eq!(format(&mut context, &codes("لَا"), FormatOptions::empty())?, vec![0xFEFB, 0x064E]);
    Ok(())
}

#[test]
fn test_after_ligatures() -> Result<()> {
    let mut context = arabic();
    context.add_line("A U+FE91 U+FE90 U+E000")?;
    assert_eq!(context.ligature(LigatureVariant::After, 0xFE91, 0xFE90), Some(0xE000));

    assert_eq!(format(&mut context, &codes("بب"), FormatOptions::empty())?, vec![0xE000]);
    assert_eq!(
        format(&mut context, &codes("بَب"), FormatOptions::empty())?,
        vec![0xE000, 0x064E]
    );
    // Each word is handled on its own
    assert_eq!(
        format(&mut context, &codes("ب ب"), FormatOptions::empty())?,
        vec![0xFE8F, 0x20, 0xFE8F]
    );
    Ok(())
}

// ============================================================================
// BUFFERS
// ============================================================================

#[test]
fn test_overflow() {
    let mut context = arabic();
    let input = codes("ببب");
    let mut output = [0u32; 2];
    let err = context.format(&input, &mut output, FormatOptions::empty()).unwrap_err();
    assert!(matches!(err, PformsError::Overflow { .. }));
    assert_eq!(err.code(), 5);
}

#[test]
fn test_exact_fit() -> Result<()> {
    let mut context = arabic();
    let input = codes("ببب");
    let mut output = [0u32; 3];
    let formatted = context.format(&input, &mut output, FormatOptions::empty())?;
    assert_eq!(formatted.written, 3);
    Ok(())
}

// ============================================================================
// REVERSAL
// ============================================================================

#[test]
fn test_output_reversal() -> Result<()> {
    let mut context = arabic();
    let input = codes("بَب");
    assert_eq!(
        format(&mut context, &input, FormatOptions::OUTPUT_BACKCODES)?,
        vec![0xFE90, 0x064E, 0xFE91]
    );
    assert_eq!(
        format(&mut context, &input, FormatOptions::OUTPUT_BACKCHARS)?,
        vec![0xFE90, 0xFE91, 0x064E]
    );
    Ok(())
}

#[test]
fn test_input_reversal() -> Result<()> {
    let mut context = arabic();
    // Visual order, harakah after its letter
    let input = [0x0628, 0x0628, 0x064E];
    assert_eq!(
        format(&mut context, &input, FormatOptions::INPUT_BACKCHARS)?,
        vec![0xFE91, 0x064E, 0xFE90]
    );
    assert_eq!(
        format(&mut context, &[0x0628, 0x0627], FormatOptions::INPUT_BACKCODES)?,
        vec![0xFE8D, 0xFE8F]
    );
    Ok(())
}

// ============================================================================
// UTF LAYER
// ============================================================================

#[test]
fn test_format_utf8() -> Result<()> {
    let mut context = arabic();
    let mut output = [0u8; 32];
    let formatted = context.format_utf8("بلا".as_bytes(), &mut output, FormatOptions::empty())?;
    assert_eq!(std::str::from_utf8(&output[..formatted.written])?, "\u{FE91}\u{FEFC}");
    Ok(())
}

#[test]
fn test_format_utf16() -> Result<()> {
    let mut context = arabic();
    let input: Vec<u16> = "بب".encode_utf16().collect();
    let mut output = [0u16; 8];
    let formatted = context.format_utf16(&input, &mut output, FormatOptions::UTF_16)?;
    assert_eq!(&output[..formatted.written], &[0xFE91, 0xFE90]);
    Ok(())
}

#[test]
fn test_format_utf8_small_buffer() {
    let mut context = arabic();
    // Two code points fit the internal buffer but not the bytes
    let mut output = [0u8; 4];
    let err = context
        .format_utf8("بب".as_bytes(), &mut output, FormatOptions::empty())
        .unwrap_err();
    assert!(matches!(err, PformsError::Overflow { .. }));
}

// ============================================================================
// RULE FILES
// ============================================================================

#[test]
fn test_rules_file() -> Result<()> {
    let dir = std::env::temp_dir().join(format!("fos-pforms-comprehensive-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    std::fs::write(dir.join("arabic.rules"), ARABIC)?;

    let config = RulesConfig::from_search_path(&dir.to_string_lossy());
    let mut context = Context::from_file("arabic.rules", config)?;
    assert_eq!(context.rules().len(), 4);
    assert_eq!(format(&mut context, &codes("بب"), FormatOptions::empty())?, vec![0xFE91, 0xFE90]);

    std::fs::remove_dir_all(dir)?;
    Ok(())
}

#[test]
fn test_rules_render_back() -> Result<()> {
    let context = arabic();
    let rendered: Vec<String> = context.rules().iter().map(ToString::to_string).collect();
    assert_eq!(rendered[0], "R \\n ( \\m ) \\p -> \\m");
    assert_eq!(rendered[3], "R ( \\s ) -> \\s");
    Ok(())
}
