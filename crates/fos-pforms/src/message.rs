//! Error code diagnostics

use crate::{PformsError, Result};

/// Messages for library error codes, indexed by code
const ERROR_TEXTS: [&str; 30] = [
    "No error",
    "Context check failed: call Context::check_message() for details",
    "Failed to get memory",
    "Invalid NULL argument",
    "Bad option setting",
    // 5
    "Buffer is too small",
    "Unknown error number",
    "Failed to open rules file",
    "No space after rule identifier",
    "Duplicate character or range overlap in rule",
    // 10
    "Unknown escape sequence in rule",
    "Missing ] after rule options",
    "Misplaced ^ in rule (must be at start)",
    "Misplaced $ in rule (must be at end or just before ->)",
    "Found ) before ( in rule",
    // 15
    "Repeated ( in rule",
    "Repeated ) in rule",
    "Missing ) in rule",
    "Unknown rule identifier",
    "Invalid character range in rule",
    // 20
    "Extraneous character(s) at end of rule",
    "Word is too long (maximum 100 characters)",
    "Internal error 1",
    "Internal error 2",
    "Internal error 3",
    // 25
    "No matched character for character type replacement",
    "Matched character does not have the requested presentation form",
    "Missing or invalid ligature data",
    "Duplicate ligature",
    "\\n, \\N, \\p, and \\P are invalid in replacement text",
];

/// Messages for UTF error codes, indexed by negated code
const UTF_ERROR_TEXTS: [&str; 27] = [
    "no error",
    "UTF-8 error: 1 byte missing at end",
    "UTF-8 error: 2 bytes missing at end",
    "UTF-8 error: 3 bytes missing at end",
    "UTF-8 error: 4 bytes missing at end",
    // 5
    "UTF-8 error: 5 bytes missing at end",
    "UTF-8 error: byte 2 top bits not 0x80",
    "UTF-8 error: byte 3 top bits not 0x80",
    "UTF-8 error: byte 4 top bits not 0x80",
    "UTF-8 error: byte 5 top bits not 0x80",
    // 10
    "UTF-8 error: byte 6 top bits not 0x80",
    "UTF-8 error: 5-byte character is not allowed (RFC 3629)",
    "UTF-8 error: 6-byte character is not allowed (RFC 3629)",
    "UTF-8 error: code points greater than 0x10ffff are not defined",
    "UTF-8 error: code points 0xd800-0xdfff are not defined",
    // 15
    "UTF-8 error: overlong 2-byte sequence",
    "UTF-8 error: overlong 3-byte sequence",
    "UTF-8 error: overlong 4-byte sequence",
    "UTF-8 error: overlong 5-byte sequence",
    "UTF-8 error: overlong 6-byte sequence",
    // 20
    "UTF-8 error: isolated byte with 0x80 bit set",
    "UTF-8 error: illegal byte (0xfe or 0xff)",
    "UTF-16 error: missing low surrogate at end",
    "UTF-16 error: invalid low surrogate",
    "UTF-16 error: isolated low surrogate",
    // 25
    "UTF-32 error: code points 0xd800-0xdfff are not defined",
    "UTF-32 error: code points greater than 0x10ffff are not defined",
];

/// Fixed message for an error code
///
/// Positive codes are library errors, negative codes UTF errors, as
/// returned by [`PformsError::code`].
pub fn error_message(code: i32) -> Result<&'static str> {
    let text = if code >= 0 {
        usize::try_from(code).ok().and_then(|index| ERROR_TEXTS.get(index))
    } else {
        usize::try_from(code.unsigned_abs()).ok().and_then(|index| UTF_ERROR_TEXTS.get(index))
    };
    text.copied().ok_or(PformsError::UnknownErrorCode(code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RuleError, UtfError};

    #[test]
    fn test_library_messages() {
        assert_eq!(error_message(0).unwrap(), "No error");
        assert_eq!(error_message(5).unwrap(), "Buffer is too small");
        assert_eq!(
            error_message(29).unwrap(),
            "\\n, \\N, \\p, and \\P are invalid in replacement text"
        );
    }

    #[test]
    fn test_overlong_word_message_names_limit() {
        let code = PformsError::OverlongWord { offset: 0 }.code();
        let text = error_message(code).unwrap();
        assert!(text.contains(&format!("maximum {} characters", crate::WORD_MAX)));
    }

    #[test]
    fn test_utf_messages() {
        assert_eq!(error_message(-1).unwrap(), "UTF-8 error: 1 byte missing at end");
        assert_eq!(
            error_message(-26).unwrap(),
            "UTF-32 error: code points greater than 0x10ffff are not defined"
        );
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(error_message(30), Err(PformsError::UnknownErrorCode(30)));
        assert_eq!(error_message(-27), Err(PformsError::UnknownErrorCode(-27)));
        assert_eq!(error_message(i32::MIN), Err(PformsError::UnknownErrorCode(i32::MIN)));
        assert_eq!(PformsError::UnknownErrorCode(30).code(), 6);
    }

    #[test]
    fn test_error_codes_have_messages() {
        let errors = [
            PformsError::Overflow { offset: 0 },
            PformsError::OverlongWord { offset: 0 },
            PformsError::MissingForm { offset: 0 },
            PformsError::Rule(RuleError::BadReplacement),
            PformsError::Internal { code: 3, offset: 0 },
            PformsError::Utf(UtfError::Utf16IsolatedLow { offset: 0 }),
        ];
        for err in errors {
            assert!(error_message(err.code()).is_ok(), "no message for {:?}", err);
        }
        assert_eq!(
            error_message(RuleError::MissingKet.code()).unwrap(),
            RuleError::MissingKet.to_string()
        );
    }
}
