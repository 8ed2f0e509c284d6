// Bits are numbered from the most significant bit of the first byte, matching the tables.

pub fn get_bit(arr: &[u8], bit: usize) -> bool {
    arr[bit / 8] & (0x80 >> (bit % 8)) > 0
}

pub fn set_bit(arr: &mut [u8], bit: usize, value: bool) {
    if value {
        arr[bit / 8] |= 0x80 >> (bit % 8);
    } else {
        arr[bit / 8] &= !(0x80 >> (bit % 8));
    }
}

// Builds an N-byte output where output bit i is input bit table[i].
// src can be shorter than N bytes since it is only indexed through the table. The expansion
// step depends on this behaviour.
// WARNING: table entries are 1-based, as printed in FIPS 46-3
pub fn permute<const N: usize>(src: &[u8], table: &[usize]) -> [u8; N] {
    debug_assert_eq!(table.len(), N * 8, "permutation table must fill the output");

    let mut target = [0; N];
    for (i, source_bit) in table.iter().enumerate() {
        set_bit(&mut target, i, get_bit(src, source_bit - 1));
    }
    target
}

pub fn xor(target: &mut [u8], src: &[u8]) {
    for (t, s) in target.iter_mut().zip(src.iter()) {
        *t ^= s;
    }
}
