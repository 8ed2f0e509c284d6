use crate::block::{Block, BlockCipher, BLOCK_SIZE};
use crate::key::Key64;
use crate::key_schedule::{Direction, RoundKeySchedule, Subkey, ROUNDS};
use crate::tables::{EXPANSION_TABLE, FP_TABLE, IP_TABLE, P_TABLE, SBOXES};
use crate::util::{get_bit, permute, xor};

const HALF_BLOCK_SIZE: usize = BLOCK_SIZE / 2;
const EXPANSION_BLOCK_SIZE: usize = 6;

pub type HalfBlock = [u8; HALF_BLOCK_SIZE];

// reads the 6-bit group feeding S-box `index` out of the 48-bit expanded block
fn sbox_input(expansion_block: &[u8; EXPANSION_BLOCK_SIZE], index: usize) -> u8 {
    (0 .. 6).fold(0, |group, bit| (group << 1) | get_bit(expansion_block, index * 6 + bit) as u8)
}

// the round function f(R, K)
fn feistel(right: &HalfBlock, subkey: &Subkey) -> HalfBlock {
    // expand the right half to 48 bits and mix in the round subkey
    let mut expansion_block: [u8; EXPANSION_BLOCK_SIZE] = permute(right, &EXPANSION_TABLE);
    xor(&mut expansion_block, subkey);

    // each 6-bit group selects a 4-bit value from its S-box
    // the outer two bits pick the row and the inner four the column
    let mut substitution_block = [0u8; HALF_BLOCK_SIZE];
    for (i, sbox) in SBOXES.iter().enumerate() {
        let group = sbox_input(&expansion_block, i);
        let row = ((group & 0x20) >> 4) | (group & 0x01);
        let column = (group & 0x1E) >> 1;
        let value = sbox[row as usize][column as usize];

        if i % 2 == 0 {
            substitution_block[i / 2] = value << 4;
        } else {
            substitution_block[i / 2] |= value;
        }
    }

    permute(&substitution_block, &P_TABLE)
}

/// Runs one block through IP, the 16 Feistel rounds and FP. Decryption is the same
/// operation with the subkeys applied in reverse order.
///
/// `on_round` sees the round index, the halves after the round and the subkey it used.
pub(crate) fn des_block_operate<F>(input: &Block, schedule: &RoundKeySchedule, direction: Direction, mut on_round: F) -> Block
    where F: FnMut(usize, &HalfBlock, &HalfBlock, &Subkey)
{
    // initial input permutation
    let ip_block: Block = permute(input, &IP_TABLE);

    let mut left = [0u8; HALF_BLOCK_SIZE];
    let mut right = [0u8; HALF_BLOCK_SIZE];
    left.copy_from_slice(&ip_block[.. HALF_BLOCK_SIZE]);
    right.copy_from_slice(&ip_block[HALF_BLOCK_SIZE ..]);

    for round in 0 .. ROUNDS {
        let subkey = schedule.subkey(round, direction);

        // L(i) = R(i-1), R(i) = L(i-1) xor f(R(i-1), K(i))
        let mut recombined = feistel(&right, subkey);
        xor(&mut recombined, &left);
        left = right;
        right = recombined;

        on_round(round, &left, &right, subkey);
    }

    // undo the last swap so the output is R16 || L16
    let mut preoutput = [0u8; BLOCK_SIZE];
    preoutput[.. HALF_BLOCK_SIZE].copy_from_slice(&right);
    preoutput[HALF_BLOCK_SIZE ..].copy_from_slice(&left);

    // final permutation
    permute(&preoutput, &FP_TABLE)
}

/// Single DES under one key. The round subkeys are derived once when the cipher is built.
#[derive(Clone)]
pub struct Des {
    schedule: RoundKeySchedule
}

impl Des {
    pub fn new(key: &Key64) -> Self {
        Des { schedule: RoundKeySchedule::derive(key) }
    }

    pub fn schedule(&self) -> &RoundKeySchedule {
        &self.schedule
    }

    pub fn crypt_block(&self, input: &Block, direction: Direction) -> Block {
        des_block_operate(input, &self.schedule, direction, |_, _, _, _| {})
    }
}

impl BlockCipher for Des {
    fn encrypt_block(&self, input: &Block) -> Block {
        self.crypt_block(input, Direction::Encrypt)
    }

    fn decrypt_block(&self, input: &Block) -> Block {
        self.crypt_block(input, Direction::Decrypt)
    }
}

#[cfg(test)]
mod test {
    use hex_literal::hex;

    use super::*;
    use crate::error::{CipherError, FormatError};

    fn des(key: [u8; 8]) -> Des {
        Des::new(&Key64::new(key))
    }

    #[test]
    fn fips_vector_test() {
        let cipher = des(hex!("133457799BBCDFF1"));
        let ciphertext = cipher.encrypt_block(&hex!("0123456789ABCDEF"));
        assert_eq!(hex!("85E813540F0AB405"), ciphertext);

        let plaintext = cipher.decrypt_block(&ciphertext);
        assert_eq!(hex!("0123456789ABCDEF"), plaintext);
    }

    #[test]
    fn now_is_the_time_test() {
        let cipher = des(hex!("0123456789ABCDEF"));
        assert_eq!(hex!("3FA40E8A984D4815"), cipher.encrypt_block(b"Now is t"));
    }

    #[test]
    fn zero_output_vector_test() {
        let cipher = des(hex!("0E329232EA6D0D73"));
        assert_eq!([0u8; 8], cipher.encrypt_block(&hex!("8787878787878787")));
    }

    #[test]
    fn complementation_property_test() {
        let key = hex!("133457799BBCDFF1");
        let plaintext = hex!("0123456789ABCDEF");

        let ciphertext = des(key).encrypt_block(&plaintext);
        let complemented = des(key.map(|b| !b)).encrypt_block(&plaintext.map(|b| !b));
        assert_eq!(ciphertext.map(|b| !b), complemented);
    }

    #[test]
    fn weak_key_is_involution_test() {
        let cipher = des([0x01; 8]);
        let plaintext = hex!("0123456789ABCDEF");
        assert_eq!(plaintext, cipher.encrypt_block(&cipher.encrypt_block(&plaintext)));
    }

    #[test]
    fn slice_must_be_one_block_test() {
        let cipher = des(hex!("133457799BBCDFF1"));
        let result = cipher.encrypt_slice(&[0u8; 7]);
        assert_eq!(Err(CipherError::Format(FormatError::BlockLength { expected: 8, actual: 7 })), result);

        let result = cipher.decrypt_slice(&[0u8; 9]);
        assert_eq!(Err(CipherError::Format(FormatError::BlockLength { expected: 8, actual: 9 })), result);
    }

    #[test]
    fn round_observer_sees_sixteen_rounds_test() {
        let cipher = des(hex!("133457799BBCDFF1"));
        let mut rounds = Vec::new();
        let out = des_block_operate(&hex!("0123456789ABCDEF"), cipher.schedule(), Direction::Encrypt, |round, _, _, subkey| {
            rounds.push((round, *subkey));
        });

        assert_eq!(hex!("85E813540F0AB405"), out);
        assert_eq!(16, rounds.len());
        assert_eq!((0, hex!("1B02EFFC7072")), rounds[0]);
        assert_eq!((15, hex!("CB3D8B0E17F5")), rounds[15]);
    }
}
