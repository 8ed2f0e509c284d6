use std::time::{Duration, Instant};

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use crate::block::{Block, BlockCipher, Chaining, Mode, BLOCK_SIZE};
use crate::codec::Encoding;
use crate::des::Des;
use crate::des3::TripleDes;
use crate::error::{EncodingError, Result};
use crate::key::{Algorithm, Key64, KeyMaterial, TripleKey};
use crate::padding;

/// Result of an encryption. `iv` is set for CBC and uses the same encoding as the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encrypted {
    pub algorithm: Algorithm,
    pub mode: Mode,
    pub ciphertext: String,
    pub iv: Option<String>,
    pub elapsed: Duration
}

impl Encrypted {
    pub fn elapsed_micros(&self) -> u128 {
        self.elapsed.as_micros()
    }
}

/// The same plaintext encrypted under DES and 3DES.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub des: Encrypted,
    pub triple_des: Encrypted
}

enum Cipher {
    Des(Des),
    TripleDes(TripleDes)
}

fn warn_weak(key: &Key64, name: &str) {
    if key.is_weak() {
        log::warn!("{} is a DES weak key", name);
    } else if key.is_semi_weak() {
        log::warn!("{} is a DES semi-weak key", name);
    }
}

impl Cipher {
    fn new(key: &KeyMaterial) -> Self {
        match key {
            KeyMaterial::Des(k) => {
                warn_weak(k, "key");
                Cipher::Des(Des::new(k))
            },
            KeyMaterial::TripleDes(k) => {
                warn_weak(k.k1(), "K1");
                warn_weak(k.k2(), "K2");
                warn_weak(k.k3(), "K3");
                if k.is_degenerate() {
                    log::warn!("3DES key repeats K2 next to K1 or K3, strength is that of single DES");
                }
                Cipher::TripleDes(TripleDes::new(k))
            }
        }
    }
}

impl BlockCipher for Cipher {
    fn encrypt_block(&self, input: &Block) -> Block {
        match self {
            Cipher::Des(c) => c.encrypt_block(input),
            Cipher::TripleDes(c) => c.encrypt_block(input)
        }
    }

    fn decrypt_block(&self, input: &Block) -> Block {
        match self {
            Cipher::Des(c) => c.decrypt_block(input),
            Cipher::TripleDes(c) => c.decrypt_block(input)
        }
    }
}

/// Entry point for callers: key generation, and encrypt/decrypt pipelines of
/// pad → chain → encode and back.
///
/// All randomness (keys and IVs) is drawn from the RNG the service is built with, which must
/// be cryptographically secure. [`CipherService::new`] uses the operating system's generator.
pub struct CipherService<R = OsRng> {
    rng: R
}

impl CipherService<OsRng> {
    pub fn new() -> Self {
        CipherService { rng: OsRng }
    }
}

impl Default for CipherService<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl <R: RngCore + CryptoRng> CipherService<R> {
    pub fn with_rng(rng: R) -> Self {
        CipherService { rng }
    }

    /// 8 random bytes for DES, 24 for 3DES.
    pub fn generate_key(&mut self, algorithm: Algorithm) -> Zeroizing<Vec<u8>> {
        let mut key = Zeroizing::new(vec![0; algorithm.key_size()]);
        self.rng.fill_bytes(&mut key[..]);
        key
    }

    pub fn generate_key_hex(&mut self, algorithm: Algorithm) -> Zeroizing<String> {
        let key = self.generate_key(algorithm);
        Zeroizing::new(hex::encode(&key[..]))
    }

    pub fn generate_iv(&mut self) -> Block {
        let mut iv = [0; BLOCK_SIZE];
        self.rng.fill_bytes(&mut iv);
        iv
    }

    /// Pads, encrypts and encodes `plaintext`. CBC gets a fresh random IV on every call.
    pub fn encrypt(&mut self, plaintext: &[u8], key: &KeyMaterial, mode: Mode, encoding: Encoding) -> Result<Encrypted> {
        let chaining = match mode {
            Mode::Ecb => Chaining::Ecb,
            Mode::Cbc => Chaining::Cbc { iv: self.generate_iv() }
        };

        let start = Instant::now();
        let cipher = Cipher::new(key);
        let padded = padding::pad(plaintext, BLOCK_SIZE);
        let ciphertext = chaining.encrypt(&cipher, &padded)?;
        let encoded = encoding.encode(&ciphertext);
        let elapsed = start.elapsed();

        log::debug!("{} {} encrypted {} bytes into {} blocks in {:?}",
                    key.algorithm(), mode, plaintext.len(), ciphertext.len() / BLOCK_SIZE, elapsed);

        Ok(Encrypted {
            algorithm: key.algorithm(),
            mode: chaining.mode(),
            ciphertext: encoded,
            iv: chaining.iv().map(|iv| encoding.encode(iv)),
            elapsed
        })
    }

    /// Decodes, decrypts and unpads `ciphertext`. The IV is required for CBC and must use the
    /// same encoding as the ciphertext. Errors from every stage are returned unchanged.
    pub fn decrypt(&self, ciphertext: &str, key: &KeyMaterial, mode: Mode, encoding: Encoding, iv: Option<&str>) -> Result<Vec<u8>> {
        let ciphertext = encoding.decode(ciphertext)?;
        let iv = match iv {
            Some(iv) if mode.requires_iv() => Some(encoding.decode(iv)?),
            _ => None
        };
        let chaining = Chaining::new(mode, iv.as_deref())?;

        let cipher = Cipher::new(key);
        let padded = Zeroizing::new(chaining.decrypt(&cipher, &ciphertext)?);
        let plaintext = padding::unpad(&padded, BLOCK_SIZE)?.to_vec();

        log::debug!("{} {} decrypted {} blocks into {} bytes", key.algorithm(), mode, ciphertext.len() / BLOCK_SIZE, plaintext.len());
        Ok(plaintext)
    }

    /// Text front end of [`CipherService::encrypt`] taking the key as hex.
    pub fn encrypt_text(&mut self, plaintext: &str, key_hex: &str, algorithm: Algorithm, mode: Mode, encoding: Encoding) -> Result<Encrypted> {
        let key = KeyMaterial::from_hex(algorithm, key_hex)?;
        self.encrypt(plaintext.as_bytes(), &key, mode, encoding)
    }

    /// Text front end of [`CipherService::decrypt`]. Fails rather than returning lossy text
    /// when the plaintext is not UTF-8.
    pub fn decrypt_text(&self, ciphertext: &str, key_hex: &str, algorithm: Algorithm, mode: Mode, encoding: Encoding, iv: Option<&str>) -> Result<String> {
        let key = KeyMaterial::from_hex(algorithm, key_hex)?;
        let plaintext = self.decrypt(ciphertext, &key, mode, encoding, iv)?;
        String::from_utf8(plaintext).map_err(|_| EncodingError::Utf8.into())
    }

    /// Encrypts one plaintext under both algorithms so their output and cost can be compared.
    pub fn compare(&mut self, plaintext: &str, des_key_hex: &str, triple_key_hex: &str, mode: Mode, encoding: Encoding) -> Result<Comparison> {
        let des_key = KeyMaterial::Des(Key64::from_hex(des_key_hex)?);
        let triple_key = KeyMaterial::TripleDes(TripleKey::from_hex(triple_key_hex)?);

        let des = self.encrypt(plaintext.as_bytes(), &des_key, mode, encoding)?;
        let triple_des = self.encrypt(plaintext.as_bytes(), &triple_key, mode, encoding)?;
        Ok(Comparison { des, triple_des })
    }
}
