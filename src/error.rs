use thiserror::Error;

use crate::key::Algorithm;

pub type Result<T> = std::result::Result<T, CipherError>;

/// Every failure the cipher engine can report. Each stage fails with its own kind so callers
/// can tell a bad key apart from corrupted ciphertext.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CipherError {
    #[error("{algorithm} key must be {expected} hex characters but got {actual}")]
    KeyLength { algorithm: Algorithm, expected: usize, actual: usize },

    #[error("invalid input format: {0}")]
    Format(#[from] FormatError),

    #[error("invalid padding: {0}")]
    Padding(#[from] PaddingError),

    #[error("invalid encoding: {0}")]
    Encoding(#[from] EncodingError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("expected a single {expected}-byte block but got {actual} bytes")]
    BlockLength { expected: usize, actual: usize },

    #[error("input length {0} is not a positive multiple of the block size")]
    NotBlockAligned(usize),

    #[error("CBC mode requires an initialization vector")]
    MissingIv,

    #[error("initialization vector must be {expected} bytes but got {actual}")]
    IvLength { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaddingError {
    #[error("padded input is empty")]
    Empty,

    #[error("pad length byte {0:#04x} is outside 1..={1}")]
    InvalidLength(u8, usize),

    #[error("expected pad byte {expected:#04x} at index {index} but found {found:#04x}")]
    InconsistentByte { index: usize, expected: u8, found: u8 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    #[error("hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("decrypted data is not valid UTF-8")]
    Utf8,
}

impl From<hex::FromHexError> for CipherError {
    fn from(e: hex::FromHexError) -> Self {
        CipherError::Encoding(EncodingError::Hex(e))
    }
}

impl From<base64::DecodeError> for CipherError {
    fn from(e: base64::DecodeError) -> Self {
        CipherError::Encoding(EncodingError::Base64(e))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn key_length_message_test() {
        let e = CipherError::KeyLength { algorithm: Algorithm::Des, expected: 16, actual: 8 };
        assert_eq!("DES key must be 16 hex characters but got 8", e.to_string());
    }

    #[test]
    fn nested_kinds_convert_test() {
        let e: CipherError = PaddingError::InvalidLength(0, 8).into();
        assert!(matches!(e, CipherError::Padding(PaddingError::InvalidLength(0, 8))));

        let e: CipherError = hex::FromHexError::OddLength.into();
        assert!(matches!(e, CipherError::Encoding(EncodingError::Hex(_))));
    }
}
