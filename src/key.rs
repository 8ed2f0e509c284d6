use std::fmt;
use std::str::FromStr;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CipherError, Result};

pub const DES_KEY_SIZE: usize = 8;
pub const TRIPLE_DES_KEY_SIZE: usize = 3 * DES_KEY_SIZE;

// FIPS 74 weak keys: every round subkey is identical, so encryption is its own inverse
static WEAK_KEYS: [u64; 4] = [
    0x0101010101010101,
    0xFEFEFEFEFEFEFEFE,
    0xE0E0E0E0F1F1F1F1,
    0x1F1F1F1F0E0E0E0E
];

// semi-weak keys come in pairs where encrypting under one decrypts under the other
static SEMI_WEAK_KEYS: [u64; 12] = [
    0x01FE01FE01FE01FE, 0xFE01FE01FE01FE01,
    0x1FE01FE00EF10EF1, 0xE01FE01FF10EF10E,
    0x01E001E001F101F1, 0xE001E001F101F101,
    0x1FFE1FFE0EFE0EFE, 0xFE1FFE1FFE0EFE0E,
    0x011F011F010E010E, 0x1F011F010E010E01,
    0xE0FEE0FEF1FEF1FE, 0xFEE0FEE0FEF1FEF1
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Des,
    TripleDes
}

impl Algorithm {
    pub fn key_size(self) -> usize {
        match self {
            Algorithm::Des => DES_KEY_SIZE,
            Algorithm::TripleDes => TRIPLE_DES_KEY_SIZE
        }
    }

    /// Number of hex characters a textual key for this algorithm must have.
    pub fn key_hex_len(self) -> usize {
        self.key_size() * 2
    }

    pub fn key_bits(self) -> usize {
        self.key_size() * 8
    }

    /// Security margin after removing parity bits and, for EDE3, the meet-in-the-middle attack.
    pub fn effective_key_bits(self) -> usize {
        match self {
            Algorithm::Des => 56,
            Algorithm::TripleDes => 112
        }
    }

    pub fn from_key_bits(bits: usize) -> Option<Self> {
        match bits {
            64 => Some(Algorithm::Des),
            192 => Some(Algorithm::TripleDes),
            _ => None
        }
    }

    fn key_length_error(self, actual_hex_len: usize) -> CipherError {
        CipherError::KeyLength {
            algorithm: self,
            expected: self.key_hex_len(),
            actual: actual_hex_len
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Des => f.write_str("DES"),
            Algorithm::TripleDes => f.write_str("3DES")
        }
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "des" => Ok(Algorithm::Des),
            "3des" | "des3" | "tdes" | "triple-des" => Ok(Algorithm::TripleDes),
            other => Err(format!("Unknown algorithm '{}' - expected des or 3des", other))
        }
    }
}

/// A single 64-bit DES key. The low bit of every byte is a parity bit that the key schedule
/// never reads, so only 56 bits contribute to the cipher.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Key64([u8; DES_KEY_SIZE]);

impl Key64 {
    pub fn new(bytes: [u8; DES_KEY_SIZE]) -> Self {
        Key64(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; DES_KEY_SIZE] = bytes.try_into()
            .map_err(|_| Algorithm::Des.key_length_error(bytes.len() * 2))?;
        Ok(Key64(arr))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != Algorithm::Des.key_hex_len() {
            return Err(Algorithm::Des.key_length_error(s.len()));
        }
        let mut bytes = hex::decode(s)?;
        let key = Self::from_slice(&bytes);
        bytes.zeroize();
        key
    }

    pub fn as_bytes(&self) -> &[u8; DES_KEY_SIZE] {
        &self.0
    }

    fn without_parity(&self) -> u64 {
        u64::from_be_bytes(self.0) & 0xFEFEFEFEFEFEFEFE
    }

    fn matches_any(&self, keys: &[u64]) -> bool {
        let k = self.without_parity();
        keys.iter().any(|w| w & 0xFEFEFEFEFEFEFEFE == k)
    }

    pub fn is_weak(&self) -> bool {
        self.matches_any(&WEAK_KEYS)
    }

    pub fn is_semi_weak(&self) -> bool {
        self.matches_any(&SEMI_WEAK_KEYS)
    }

    /// Whether every byte has an odd number of set bits, as FIPS 46-3 recommends.
    pub fn has_odd_parity(&self) -> bool {
        self.0.iter().all(|b| b.count_ones() % 2 == 1)
    }

    /// Copy of this key with each parity bit adjusted to give the byte odd parity.
    /// The cipher output is unchanged since parity bits are not part of the schedule.
    pub fn with_odd_parity(&self) -> Self {
        let mut bytes = self.0;
        for b in bytes.iter_mut() {
            let data = *b & 0xFE;
            *b = if data.count_ones() % 2 == 0 { data | 0x01 } else { data };
        }
        Key64(bytes)
    }
}

impl fmt::Debug for Key64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key64(..)")
    }
}

/// Three independent DES keys for EDE3, in the order K1, K2, K3.
#[derive(Clone, PartialEq, Eq)]
pub struct TripleKey {
    keys: [Key64; 3]
}

impl TripleKey {
    pub fn new(k1: Key64, k2: Key64, k3: Key64) -> Self {
        TripleKey { keys: [k1, k2, k3] }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != TRIPLE_DES_KEY_SIZE {
            return Err(Algorithm::TripleDes.key_length_error(bytes.len() * 2));
        }

        let k1 = Key64::from_slice(&bytes[0 .. 8])?;
        let k2 = Key64::from_slice(&bytes[8 .. 16])?;
        let k3 = Key64::from_slice(&bytes[16 .. 24])?;
        Ok(Self::new(k1, k2, k3))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != Algorithm::TripleDes.key_hex_len() {
            return Err(Algorithm::TripleDes.key_length_error(s.len()));
        }
        let mut bytes = hex::decode(s)?;
        let key = Self::from_slice(&bytes);
        bytes.zeroize();
        key
    }

    pub fn k1(&self) -> &Key64 {
        &self.keys[0]
    }

    pub fn k2(&self) -> &Key64 {
        &self.keys[1]
    }

    pub fn k3(&self) -> &Key64 {
        &self.keys[2]
    }

    /// K1 = K2 or K2 = K3 cancels two of the three passes, leaving single DES under the
    /// remaining key. Such keys are legal, just no stronger than DES.
    pub fn is_degenerate(&self) -> bool {
        self.keys[0] == self.keys[1] || self.keys[1] == self.keys[2]
    }
}

impl fmt::Debug for TripleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TripleKey(..)")
    }
}

/// Parsed key for either algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    Des(Key64),
    TripleDes(TripleKey)
}

impl KeyMaterial {
    pub fn from_hex(algorithm: Algorithm, s: &str) -> Result<Self> {
        match algorithm {
            Algorithm::Des => Key64::from_hex(s).map(KeyMaterial::Des),
            Algorithm::TripleDes => TripleKey::from_hex(s).map(KeyMaterial::TripleDes)
        }
    }

    pub fn from_bytes(algorithm: Algorithm, bytes: &[u8]) -> Result<Self> {
        match algorithm {
            Algorithm::Des => Key64::from_slice(bytes).map(KeyMaterial::Des),
            Algorithm::TripleDes => TripleKey::from_slice(bytes).map(KeyMaterial::TripleDes)
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            KeyMaterial::Des(_) => Algorithm::Des,
            KeyMaterial::TripleDes(_) => Algorithm::TripleDes
        }
    }
}
