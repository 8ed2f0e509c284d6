use std::ops;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::key::Key64;
use crate::tables::{PC1_TABLE, PC2_TABLE, ROTATION_SCHEDULE};
use crate::util::permute;

pub const ROUNDS: usize = 16;
pub const SUBKEY_SIZE: usize = 6;
const PC1_KEY_SIZE: usize = 7;
const HALF_MASK: u32 = 0x0FFF_FFFF;

pub type Subkey = [u8; SUBKEY_SIZE];

/// Order in which the round subkeys are fed to the Feistel network. DES decryption is
/// encryption with the schedule reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Direction::Encrypt => Direction::Decrypt,
            Direction::Decrypt => Direction::Encrypt
        }
    }
}

/// The 16 48-bit round subkeys for one DES key, in encryption order.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RoundKeySchedule {
    subkeys: [Subkey; ROUNDS]
}

fn rotate_half(half: u32, n: usize) -> u32 {
    ((half << n) | (half >> (28 - n))) & HALF_MASK
}

impl RoundKeySchedule {
    pub fn derive(key: &Key64) -> Self {
        // initial key permutation drops the parity bits and leaves C0 || D0
        let pc1_key: [u8; PC1_KEY_SIZE] = permute(key.as_bytes(), &PC1_TABLE);

        let mut cd_bytes = [0u8; 8];
        cd_bytes[1 ..].copy_from_slice(&pc1_key);
        let cd = u64::from_be_bytes(cd_bytes);

        let mut c = ((cd >> 28) as u32) & HALF_MASK;
        let mut d = (cd as u32) & HALF_MASK;

        let mut subkeys = [[0u8; SUBKEY_SIZE]; ROUNDS];
        for (round, shift) in ROTATION_SCHEDULE.iter().enumerate() {
            c = rotate_half(c, *shift);
            d = rotate_half(d, *shift);

            let joined = ((c as u64) << 28) | d as u64;
            let joined_bytes = joined.to_be_bytes();
            subkeys[round] = permute(&joined_bytes[1 ..], &PC2_TABLE);
        }

        cd_bytes.zeroize();
        RoundKeySchedule { subkeys }
    }

    /// Subkey for the given round (0-based) when running in `direction`.
    pub fn subkey(&self, round: usize, direction: Direction) -> &Subkey {
        match direction {
            Direction::Encrypt => &self.subkeys[round],
            Direction::Decrypt => &self.subkeys[ROUNDS - 1 - round]
        }
    }

    pub fn len(&self) -> usize {
        self.subkeys.len()
    }
}

impl ops::Index<usize> for RoundKeySchedule {
    type Output = Subkey;

    fn index(&self, round: usize) -> &Self::Output {
        &self.subkeys[round]
    }
}
