//! Triple DES in the EDE3 construction: encrypt under K1, decrypt under K2, encrypt under K3.
//!
//! Three 56-bit keys give 168 bits of key material, but a meet-in-the-middle attack reduces the
//! effective strength to about 112 bits. When K1 = K2 or K2 = K3 two passes cancel and the
//! result is single DES under the remaining key, which keeps EDE3 backwards compatible.

use crate::block::{Block, BlockCipher};
use crate::des::Des;
use crate::key::TripleKey;

#[derive(Clone)]
pub struct TripleDes {
    k1: Des,
    k2: Des,
    k3: Des
}

impl TripleDes {
    pub fn new(key: &TripleKey) -> Self {
        TripleDes {
            k1: Des::new(key.k1()),
            k2: Des::new(key.k2()),
            k3: Des::new(key.k3())
        }
    }

    /// The three single-DES passes in key order K1, K2, K3.
    pub fn passes(&self) -> [&Des; 3] {
        [&self.k1, &self.k2, &self.k3]
    }
}

impl BlockCipher for TripleDes {
    fn encrypt_block(&self, input: &Block) -> Block {
        let first = self.k1.encrypt_block(input);
        let second = self.k2.decrypt_block(&first);
        self.k3.encrypt_block(&second)
    }

    fn decrypt_block(&self, input: &Block) -> Block {
        let first = self.k3.decrypt_block(input);
        let second = self.k2.encrypt_block(&first);
        self.k1.decrypt_block(&second)
    }
}

#[cfg(test)]
mod test {
    use hex_literal::hex;

    use super::*;
    use crate::key::Key64;

    fn triple(k1: [u8; 8], k2: [u8; 8], k3: [u8; 8]) -> TripleDes {
        TripleDes::new(&TripleKey::new(Key64::new(k1), Key64::new(k2), Key64::new(k3)))
    }

    #[test]
    fn equal_keys_degenerate_to_des_test() {
        let key = hex!("133457799BBCDFF1");
        let cipher = triple(key, key, key);

        let ciphertext = cipher.encrypt_block(&hex!("0123456789ABCDEF"));
        assert_eq!(hex!("85E813540F0AB405"), ciphertext);
        assert_eq!(hex!("0123456789ABCDEF"), cipher.decrypt_block(&ciphertext));
    }

    #[test]
    fn k1_equals_k2_leaves_des_under_k3_test() {
        let cipher = triple(hex!("0123456789ABCDEF"), hex!("0123456789ABCDEF"), hex!("133457799BBCDFF1"));
        assert_eq!(hex!("85E813540F0AB405"), cipher.encrypt_block(&hex!("0123456789ABCDEF")));
    }

    #[test]
    fn ede_composition_test() {
        let (k1, k2, k3) = (hex!("0123456789ABCDEF"), hex!("23456789ABCDEF01"), hex!("456789ABCDEF0123"));
        let cipher = triple(k1, k2, k3);
        let plaintext = *b"The qufc";

        let expected = Des::new(&Key64::new(k3)).encrypt_block(
            &Des::new(&Key64::new(k2)).decrypt_block(
                &Des::new(&Key64::new(k1)).encrypt_block(&plaintext)));

        let ciphertext = cipher.encrypt_block(&plaintext);
        assert_eq!(expected, ciphertext);
        assert_ne!(Des::new(&Key64::new(k1)).encrypt_block(&plaintext), ciphertext);
        assert_eq!(plaintext, cipher.decrypt_block(&ciphertext));
    }

    #[test]
    fn sp800_67_vector_test() {
        let cipher = triple(hex!("0123456789ABCDEF"), hex!("23456789ABCDEF01"), hex!("456789ABCDEF0123"));
        assert_eq!(hex!("A826FD8CE53B855F"), cipher.encrypt_block(b"The qufc"));
    }
}
