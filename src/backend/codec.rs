//! Row serialization
//!
//! Records are stored as a flat byte string:
//!
//! ```text
//! | name_len: u32 LE | name | value_len: u32 LE | value | ... repeated per field
//! ```
//!
//! Decoding validates every length against the remaining buffer; a truncated
//! row is an error, never a panic.

use super::{Field, FieldSet};
use thiserror::Error;

/// Row decoding failure
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("row truncated at byte {offset}: need {needed} more bytes")]
    Truncated { offset: usize, needed: usize },

    #[error("field name at byte {offset} is not valid UTF-8")]
    InvalidName { offset: usize },
}

/// Encoded size of a row
pub fn encoded_len(values: &[Field]) -> usize {
    values.iter().map(|f| 8 + f.name.len() + f.value.len()).sum()
}

/// Append the encoding of `values` to `out`
pub fn encode_row_into(values: &[Field], out: &mut Vec<u8>) {
    out.reserve(encoded_len(values));
    for field in values {
        out.extend_from_slice(&(field.name.len() as u32).to_le_bytes());
        out.extend_from_slice(field.name.as_bytes());
        out.extend_from_slice(&(field.value.len() as u32).to_le_bytes());
        out.extend_from_slice(&field.value);
    }
}

/// Encode `values` into a fresh buffer
pub fn encode_row(values: &[Field]) -> Vec<u8> {
    let mut out = Vec::new();
    encode_row_into(values, &mut out);
    out
}

/// Decode a full row
pub fn decode_row(mut data: &[u8]) -> Result<FieldSet, CodecError> {
    let total = data.len();
    let mut fields = Vec::new();

    while !data.is_empty() {
        let offset = total - data.len();
        let name = take_chunk(&mut data, offset)?;
        let name = std::str::from_utf8(name)
            .map_err(|_| CodecError::InvalidName { offset })?
            .to_string();

        let offset = total - data.len();
        let value = take_chunk(&mut data, offset)?.to_vec();

        fields.push(Field { name, value });
    }

    Ok(fields)
}

/// Split one length-prefixed chunk off the front of `data`
fn take_chunk<'a>(data: &mut &'a [u8], offset: usize) -> Result<&'a [u8], CodecError> {
    if data.len() < 4 {
        return Err(CodecError::Truncated {
            offset,
            needed: 4 - data.len(),
        });
    }
    let (len_bytes, rest) = data.split_at(4);
    let len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;

    if rest.len() < len {
        return Err(CodecError::Truncated {
            offset: offset + 4,
            needed: len - rest.len(),
        });
    }
    let (chunk, rest) = rest.split_at(len);
    *data = rest;
    Ok(chunk)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> FieldSet {
        vec![
            Field::new("field0", b"alpha".to_vec()),
            Field::new("field1", Vec::new()),
            Field::new("", b"x".to_vec()),
        ]
    }

    #[test]
    fn test_encode_layout() {
        let bytes = encode_row(&[Field::new("ab", b"xyz".to_vec())]);
        assert_eq!(bytes, vec![2, 0, 0, 0, b'a', b'b', 3, 0, 0, 0, b'x', b'y', b'z']);
        assert_eq!(encoded_len(&[Field::new("ab", b"xyz".to_vec())]), bytes.len());
    }

    #[test]
    fn test_decode_restores_fields() {
        let row = sample_row();
        assert_eq!(decode_row(&encode_row(&row)).unwrap(), row);
        assert_eq!(decode_row(&[]).unwrap(), Vec::new());
    }

    #[test]
    fn test_decode_truncated_length() {
        let err = decode_row(&[1, 0]).unwrap_err();
        assert_eq!(err, CodecError::Truncated { offset: 0, needed: 2 });
    }

    #[test]
    fn test_decode_truncated_value() {
        let mut bytes = encode_row(&[Field::new("f", b"value".to_vec())]);
        bytes.truncate(bytes.len() - 2);
        let err = decode_row(&bytes).unwrap_err();
        assert_eq!(err, CodecError::Truncated { offset: 9, needed: 2 });
    }

    #[test]
    fn test_decode_invalid_name() {
        let bytes = vec![1, 0, 0, 0, 0xff, 0, 0, 0, 0];
        assert_eq!(decode_row(&bytes).unwrap_err(), CodecError::InvalidName { offset: 0 });
    }
}
