//! Base64 variable-length quantity encoding used by source map `mappings`.

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const SHIFT: u32 = 5;
const CONTINUATION_BIT: u32 = 1 << SHIFT;
const VALUE_MASK: u32 = CONTINUATION_BIT - 1;

/// Errors produced while decoding a VLQ string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VlqError {
    /// A character outside the base64 alphabet was found.
    #[error("invalid base64 VLQ digit '{0}'")]
    InvalidDigit(char),

    /// The input ended in the middle of a value.
    #[error("truncated VLQ value")]
    Truncated,

    /// A decoded value does not fit in 32 bits.
    #[error("VLQ value overflows 32 bits")]
    Overflow,
}

/// Appends the VLQ encoding of `value` to `out`.
pub fn encode(value: i64, out: &mut String) {
    let mut vlq = if value < 0 {
        ((-value as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };
    loop {
        let mut digit = (vlq & u64::from(VALUE_MASK)) as u32;
        vlq >>= SHIFT;
        if vlq > 0 {
            digit |= CONTINUATION_BIT;
        }
        out.push(ALPHABET[digit as usize] as char);
        if vlq == 0 {
            break;
        }
    }
}

/// Encodes a whole segment (one field per value).
pub fn encode_segment(fields: &[i64]) -> String {
    let mut out = String::new();
    for &field in fields {
        encode(field, &mut out);
    }
    out
}

/// Decodes all values of a single segment.
pub fn decode_segment(segment: &str) -> Result<Vec<i64>, VlqError> {
    let mut values = Vec::new();
    let mut accum: u64 = 0;
    let mut shift = 0u32;
    let mut in_value = false;

    for ch in segment.chars() {
        let digit = digit_value(ch).ok_or(VlqError::InvalidDigit(ch))?;
        if shift > 32 {
            return Err(VlqError::Overflow);
        }
        accum |= u64::from(digit & VALUE_MASK) << shift;
        in_value = true;
        if digit & CONTINUATION_BIT != 0 {
            shift += SHIFT;
            continue;
        }
        let magnitude = (accum >> 1) as i64;
        values.push(if accum & 1 == 1 { -magnitude } else { magnitude });
        accum = 0;
        shift = 0;
        in_value = false;
    }

    if in_value {
        return Err(VlqError::Truncated);
    }
    Ok(values)
}

fn digit_value(ch: char) -> Option<u32> {
    let byte = u8::try_from(ch).ok()?;
    ALPHABET.iter().position(|&b| b == byte).map(|p| p as u32)
}
