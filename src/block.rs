use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;

use crate::error::{FormatError, Result};
use crate::util::xor;

pub const BLOCK_SIZE: usize = 8;

pub type Block = [u8; BLOCK_SIZE];

// inputs at least this long are spread over the rayon pool
const PARALLEL_THRESHOLD: usize = 64 * 1024;

/// Capability shared by DES and 3DES: transform one 8-byte block under an already scheduled key.
pub trait BlockCipher {
    fn encrypt_block(&self, input: &Block) -> Block;
    fn decrypt_block(&self, input: &Block) -> Block;

    fn encrypt_slice(&self, input: &[u8]) -> Result<Block> {
        to_block(input).map(|block| self.encrypt_block(&block))
    }

    fn decrypt_slice(&self, input: &[u8]) -> Result<Block> {
        to_block(input).map(|block| self.decrypt_block(&block))
    }
}

pub fn to_block(input: &[u8]) -> Result<Block> {
    let block: Block = input.try_into()
        .map_err(|_| FormatError::BlockLength { expected: BLOCK_SIZE, actual: input.len() })?;
    Ok(block)
}

fn check_aligned(data: &[u8]) -> Result<()> {
    if data.is_empty() || data.len() % BLOCK_SIZE != 0 {
        Err(FormatError::NotBlockAligned(data.len()).into())
    } else {
        Ok(())
    }
}

// applies op to every block independently, in parallel for large inputs
fn map_blocks<F>(data: &[u8], op: F) -> Vec<u8>
    where F: Fn(&Block) -> Block + Sync
{
    let mut output = vec![0; data.len()];
    let apply = |(input, out): (&[u8], &mut [u8])| {
        let mut block = [0; BLOCK_SIZE];
        block.copy_from_slice(input);
        out.copy_from_slice(&op(&block));
    };

    if data.len() >= PARALLEL_THRESHOLD {
        data.par_chunks_exact(BLOCK_SIZE)
            .zip(output.par_chunks_exact_mut(BLOCK_SIZE))
            .for_each(&apply);
    } else {
        data.chunks_exact(BLOCK_SIZE)
            .zip(output.chunks_exact_mut(BLOCK_SIZE))
            .for_each(&apply);
    }

    output
}

pub struct CbcEncryptMode<'a, C: BlockCipher> {
    cipher: &'a C,
    previous_ciphertext_block: Block
}

impl <'a, C: BlockCipher> CbcEncryptMode<'a, C> {
    pub fn new(cipher: &'a C, iv: &Block) -> Self {
        CbcEncryptMode {
            cipher,
            previous_ciphertext_block: *iv
        }
    }

    pub fn encrypt_block(&mut self, input: &Block) -> Block {
        // XOR input with previous ciphertext
        let mut buf = *input;
        xor(&mut buf, &self.previous_ciphertext_block);

        let output = self.cipher.encrypt_block(&buf);

        // store ciphertext for next operation
        self.previous_ciphertext_block = output;
        output
    }
}

pub struct CbcDecryptMode<'a, C: BlockCipher> {
    cipher: &'a C,
    previous_ciphertext_block: Block
}

impl <'a, C: BlockCipher> CbcDecryptMode<'a, C> {
    pub fn new(cipher: &'a C, iv: &Block) -> Self {
        CbcDecryptMode { cipher, previous_ciphertext_block: *iv }
    }

    pub fn decrypt_block(&mut self, input: &Block) -> Block {
        let mut output = self.cipher.decrypt_block(input);

        // XOR with previous ciphertext
        xor(&mut output, &self.previous_ciphertext_block);

        self.previous_ciphertext_block = *input;
        output
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Ecb,
    Cbc
}

impl Mode {
    pub fn requires_iv(self) -> bool {
        matches!(self, Mode::Cbc)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Ecb => f.write_str("ECB"),
            Mode::Cbc => f.write_str("CBC")
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ecb" => Ok(Mode::Ecb),
            "cbc" => Ok(Mode::Cbc),
            other => Err(format!("Unknown mode '{}' - expected ECB or CBC", other))
        }
    }
}

/// A chaining mode together with the state it needs. Modes never pad: input must already be
/// a whole number of blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chaining {
    /// Each block is encrypted on its own. Equal plaintext blocks give equal ciphertext blocks.
    Ecb,
    Cbc { iv: Block }
}

impl Chaining {
    /// Builds the strategy for `mode`. CBC requires an 8-byte IV; ECB ignores any IV given.
    pub fn new(mode: Mode, iv: Option<&[u8]>) -> Result<Self> {
        match mode {
            Mode::Ecb => Ok(Chaining::Ecb),
            Mode::Cbc => {
                let iv = iv.ok_or(FormatError::MissingIv)?;
                let iv: Block = iv.try_into()
                    .map_err(|_| FormatError::IvLength { expected: BLOCK_SIZE, actual: iv.len() })?;
                Ok(Chaining::Cbc { iv })
            }
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Chaining::Ecb => Mode::Ecb,
            Chaining::Cbc { .. } => Mode::Cbc
        }
    }

    pub fn iv(&self) -> Option<&Block> {
        match self {
            Chaining::Ecb => None,
            Chaining::Cbc { iv } => Some(iv)
        }
    }

    pub fn encrypt<C: BlockCipher + Sync>(&self, cipher: &C, plaintext: &[u8]) -> Result<Vec<u8>> {
        check_aligned(plaintext)?;

        match self {
            Chaining::Ecb => Ok(map_blocks(plaintext, |block| cipher.encrypt_block(block))),
            Chaining::Cbc { iv } => {
                // each block depends on the previous ciphertext so this is strictly sequential
                let mut mode = CbcEncryptMode::new(cipher, iv);
                let mut output = Vec::with_capacity(plaintext.len());
                for chunk in plaintext.chunks_exact(BLOCK_SIZE) {
                    output.extend_from_slice(&mode.encrypt_block(&to_block(chunk)?));
                }
                Ok(output)
            }
        }
    }

    pub fn decrypt<C: BlockCipher + Sync>(&self, cipher: &C, ciphertext: &[u8]) -> Result<Vec<u8>> {
        check_aligned(ciphertext)?;

        match self {
            Chaining::Ecb => Ok(map_blocks(ciphertext, |block| cipher.decrypt_block(block))),
            Chaining::Cbc { iv } if ciphertext.len() >= PARALLEL_THRESHOLD => {
                // block decryption is independent, only the XOR needs the previous ciphertext
                let mut output = map_blocks(ciphertext, |block| cipher.decrypt_block(block));
                let previous_blocks = std::iter::once(&iv[..]).chain(ciphertext.chunks_exact(BLOCK_SIZE));
                for (out, previous) in output.chunks_exact_mut(BLOCK_SIZE).zip(previous_blocks) {
                    xor(out, previous);
                }
                Ok(output)
            },
            Chaining::Cbc { iv } => {
                let mut mode = CbcDecryptMode::new(cipher, iv);
                let mut output = Vec::with_capacity(ciphertext.len());
                for chunk in ciphertext.chunks_exact(BLOCK_SIZE) {
                    output.extend_from_slice(&mode.decrypt_block(&to_block(chunk)?));
                }
                Ok(output)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use hex_literal::hex;

    use super::*;
    use crate::des::Des;
    use crate::error::CipherError;
    use crate::key::Key64;

    // XORs with a fixed mask so expected outputs can be worked out by hand
    struct XorCipher(Block);

    impl BlockCipher for XorCipher {
        fn encrypt_block(&self, input: &Block) -> Block {
            let mut out = *input;
            xor(&mut out, &self.0);
            out
        }

        fn decrypt_block(&self, input: &Block) -> Block {
            self.encrypt_block(input)
        }
    }

    fn des() -> Des {
        Des::new(&Key64::new(hex!("133457799BBCDFF1")))
    }

    #[test]
    fn ecb_identical_blocks_test() {
        let ciphertext = Chaining::Ecb.encrypt(&des(), b"AAAAAAAAAAAAAAAA").expect("Failed to encrypt");
        assert_eq!(16, ciphertext.len());
        assert_eq!(ciphertext[.. 8], ciphertext[8 ..]);
    }

    #[test]
    fn cbc_identical_blocks_differ_test() {
        let chaining = Chaining::Cbc { iv: hex!("0102030405060708") };
        let ciphertext = chaining.encrypt(&des(), b"AAAAAAAAAAAAAAAA").expect("Failed to encrypt");
        assert_ne!(ciphertext[.. 8], ciphertext[8 ..]);

        let plaintext = chaining.decrypt(&des(), &ciphertext).expect("Failed to decrypt");
        assert_eq!(b"AAAAAAAAAAAAAAAA", &plaintext[..]);
    }

    #[test]
    fn cbc_chains_previous_block_test() {
        let cipher = XorCipher([0xff; 8]);
        let chaining = Chaining::Cbc { iv: [0x0f; 8] };

        let ciphertext = chaining.encrypt(&cipher, &[0u8; 16]).unwrap();
        // C0 = (0 ^ IV) ^ mask, C1 = (0 ^ C0) ^ mask
        assert_eq!([0xf0; 8], ciphertext[.. 8]);
        assert_eq!([0x0f; 8], ciphertext[8 ..]);
    }

    #[test]
    fn cbc_first_block_matches_ecb_of_xored_input_test() {
        let iv = hex!("0123456789ABCDEF");
        let plaintext = hex!("4E6F772069732074");
        let cbc = Chaining::Cbc { iv }.encrypt(&des(), &plaintext).unwrap();

        let mut mixed = plaintext;
        xor(&mut mixed, &iv);
        assert_eq!(des().encrypt_block(&mixed), cbc[..]);
    }

    #[test]
    fn unaligned_input_test() {
        let result = Chaining::Ecb.encrypt(&des(), &[0u8; 12]);
        assert_eq!(Err(CipherError::Format(FormatError::NotBlockAligned(12))), result);

        let result = Chaining::Cbc { iv: [0; 8] }.decrypt(&des(), &[]);
        assert_eq!(Err(CipherError::Format(FormatError::NotBlockAligned(0))), result);
    }

    #[test]
    fn cbc_requires_iv_test() {
        assert_eq!(Err(CipherError::Format(FormatError::MissingIv)), Chaining::new(Mode::Cbc, None));
        assert_eq!(
            Err(CipherError::Format(FormatError::IvLength { expected: 8, actual: 4 })),
            Chaining::new(Mode::Cbc, Some(&[0u8; 4])));
        assert_eq!(Ok(Chaining::Ecb), Chaining::new(Mode::Ecb, Some(&[0u8; 4])));
        assert_eq!(Some(&[7u8; 8]), Chaining::new(Mode::Cbc, Some(&[7u8; 8])).unwrap().iv());
    }

    #[test]
    fn large_input_parallel_path_test() {
        let plaintext: Vec<u8> = (0 .. PARALLEL_THRESHOLD + 64).map(|i| (i % 251) as u8).collect();
        let cipher = des();

        for chaining in [Chaining::Ecb, Chaining::Cbc { iv: hex!("A1B2C3D4E5F60718") }] {
            let ciphertext = chaining.encrypt(&cipher, &plaintext).unwrap();

            // the parallel result must agree with block-at-a-time processing
            let mut sequential = CbcDecryptMode::new(&cipher, chaining.iv().unwrap_or(&[0; 8]));
            let expected: Vec<u8> = ciphertext.chunks_exact(BLOCK_SIZE)
                .flat_map(|c| match chaining {
                    Chaining::Ecb => cipher.decrypt_block(&to_block(c).unwrap()),
                    Chaining::Cbc { .. } => sequential.decrypt_block(&to_block(c).unwrap())
                })
                .collect();

            assert_eq!(expected, chaining.decrypt(&cipher, &ciphertext).unwrap());
            assert_eq!(plaintext, expected);
        }
    }

    #[test]
    fn mode_parse_test() {
        assert_eq!(Ok(Mode::Ecb), "ECB".parse());
        assert_eq!(Ok(Mode::Cbc), "cbc".parse());
        assert!("ctr".parse::<Mode>().is_err());
        assert_eq!("CBC", Mode::Cbc.to_string());
    }
}
