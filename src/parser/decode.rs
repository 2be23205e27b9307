//! Byte-to-text decoding for uploaded exports.

use thiserror::Error;

/// Errors raised while turning an upload into a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The bytes are not interpretable as text.
    #[error("{label}: not a text file ({reason})")]
    Decode { label: String, reason: String },
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Decode raw bytes into text.
///
/// Accepts UTF-8 (with or without BOM) and UTF-16 with a BOM. BOM-less
/// input that is not UTF-8 is read as Latin-1, which covers older
/// single-byte exports (`m\xB2`). Text holding NUL or other control
/// bytes is rejected as binary.
pub fn decode_text(label: &str, bytes: &[u8]) -> Result<String, ParseError> {
    let fail = |reason: String| ParseError::Decode {
        label: label.to_string(),
        reason,
    };

    let text = if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        utf8(rest).map_err(fail)?
    } else if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        utf16(rest, u16::from_le_bytes).map_err(fail)?
    } else if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        utf16(rest, u16::from_be_bytes).map_err(fail)?
    } else {
        utf8(bytes).unwrap_or_else(|_| latin1(bytes))
    };

    if text.contains('\0') {
        return Err(fail("contains NUL bytes".to_string()));
    }
    if let Some(c) = text.chars().find(|c| is_binary_control(*c)) {
        return Err(fail(format!("contains control character U+{:04X}", c as u32)));
    }

    Ok(text)
}

fn utf8(bytes: &[u8]) -> Result<String, String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| format!("invalid UTF-8 at byte {}", e.valid_up_to()))
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Control characters that never appear in a text export.
fn is_binary_control(c: char) -> bool {
    c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\r' | '\x0C')
}

fn utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> Result<String, String> {
    if bytes.len() % 2 != 0 {
        return Err("truncated UTF-16 data".to_string());
    }

    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]))
        .collect();

    String::from_utf16(&units).map_err(|_| "invalid UTF-16".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_utf8() {
        assert_eq!(decode_text("a.txt", b"Test 1: NSEO").unwrap(), "Test 1: NSEO");
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("Área".as_bytes());
        assert_eq!(decode_text("a.txt", &bytes).unwrap(), "Área");
    }

    #[test]
    fn test_utf16_le() {
        let mut bytes = UTF16_LE_BOM.to_vec();
        for unit in "Test 1".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_text("a.txt", &bytes).unwrap(), "Test 1");
    }

    #[test]
    fn test_utf16_be() {
        let mut bytes = UTF16_BE_BOM.to_vec();
        for unit in "NSEC".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_text("a.txt", &bytes).unwrap(), "NSEC");
    }

    #[test]
    fn test_png_rejected() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00];
        let err = decode_text("scan.png", &png).unwrap_err();
        let ParseError::Decode { label, reason } = err;
        assert_eq!(label, "scan.png");
        assert!(reason.contains("NUL"));
    }

    #[test]
    fn test_latin1_fallback() {
        let text = decode_text("old.txt", b"* Sway Area: 2.8 m\xB2\n").unwrap();
        assert_eq!(text, "* Sway Area: 2.8 m\u{B2}\n");
    }

    #[test]
    fn test_control_bytes_rejected() {
        let err = decode_text("blob.bin", &[0x89, b'P', b'N', b'G', 0x1A, 0xFF]).unwrap_err();
        assert!(err.to_string().contains("control character"));
    }

    #[test]
    fn test_nul_bytes_rejected() {
        let err = decode_text("blob.bin", b"abc\0def").unwrap_err();
        assert!(err.to_string().contains("NUL"));
    }

    #[test]
    fn test_odd_utf16_rejected() {
        let bytes = [0xFF, 0xFE, 0x41];
        assert!(decode_text("a.txt", &bytes).is_err());
    }
}
