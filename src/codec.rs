use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::Result;

/// Textual form of ciphertext and IVs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Hex,
    Base64
}

impl Encoding {
    pub fn encode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Hex => hex_encode(bytes),
            Encoding::Base64 => base64_encode(bytes)
        }
    }

    pub fn decode(self, s: &str) -> Result<Vec<u8>> {
        match self {
            Encoding::Hex => hex_decode(s),
            Encoding::Base64 => base64_decode(s)
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Hex => f.write_str("hex"),
            Encoding::Base64 => f.write_str("base64")
        }
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hex" => Ok(Encoding::Hex),
            "base64" => Ok(Encoding::Base64),
            other => Err(format!("Unknown encoding '{}' - expected hex or base64", other))
        }
    }
}

/// Lowercase hex, two characters per byte.
pub fn hex_encode(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Accepts either case. Odd lengths and non-hex characters are rejected.
pub fn hex_decode(s: &str) -> Result<Vec<u8>> {
    Ok(hex::decode(s)?)
}

/// RFC 4648 standard alphabet with `=` padding.
pub fn base64_encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Requires canonical padding: unpadded or over-padded input is an error.
pub fn base64_decode(s: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(s)?)
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;
    use crate::error::{CipherError, EncodingError};

    #[test]
    fn hex_lowercase_test() {
        assert_eq!("0aff10", hex_encode(&[0x0a, 0xff, 0x10]));
        assert_eq!(vec![0x0a, 0xff, 0x10], hex_decode("0AFF10").unwrap());
    }

    #[test]
    fn hex_odd_length_test() {
        let result = hex_decode("abc");
        assert_eq!(Err(CipherError::Encoding(EncodingError::Hex(hex::FromHexError::OddLength))), result);
    }

    #[test]
    fn hex_invalid_char_test() {
        let result = hex_decode("zz");
        assert!(matches!(result, Err(CipherError::Encoding(EncodingError::Hex(hex::FromHexError::InvalidHexCharacter { c: 'z', index: 0 })))));
    }

    #[test]
    fn base64_known_values_test() {
        assert_eq!("", base64_encode(b""));
        assert_eq!("YQ==", base64_encode(b"a"));
        assert_eq!("dGg=", base64_encode(b"th"));
        assert_eq!("cXVp", base64_encode(b"qui"));
        assert_eq!(b"qui".to_vec(), base64_decode("cXVp").unwrap());
    }

    #[test]
    fn base64_invalid_char_test() {
        let result = base64_decode("dGhlcX!pY2ti");
        assert!(matches!(result, Err(CipherError::Encoding(EncodingError::Base64(_)))));
    }

    #[test]
    fn base64_missing_padding_test() {
        let result = base64_decode("YQ");
        assert!(matches!(result, Err(CipherError::Encoding(EncodingError::Base64(_)))));
    }

    #[test]
    fn encoding_parse_test() {
        assert_eq!(Ok(Encoding::Hex), "HEX".parse());
        assert_eq!(Ok(Encoding::Base64), "base64".parse());
        assert!("base32".parse::<Encoding>().is_err());
    }

    proptest! {
        #[test]
        fn hex_roundtrip(bytes in prop::collection::vec(any::<u8>(), 0 .. 128)) {
            prop_assert_eq!(hex_decode(&hex_encode(&bytes)).unwrap(), bytes);
        }

        #[test]
        fn base64_roundtrip(bytes in prop::collection::vec(any::<u8>(), 0 .. 128)) {
            prop_assert_eq!(base64_decode(&base64_encode(&bytes)).unwrap(), bytes);
        }
    }
}
