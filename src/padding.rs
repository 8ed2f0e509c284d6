//! PKCS#7 padding. Padding is always added, so an input that is already block aligned gains a
//! whole block of padding and unpadding is never ambiguous.

use crate::error::{PaddingError, Result};

pub fn pad(bytes: &[u8], block_size: usize) -> Vec<u8> {
    debug_assert!(block_size > 0 && block_size <= 255, "PKCS#7 block size must fit in a byte");

    let pad_len = block_size - (bytes.len() % block_size);
    let mut padded = Vec::with_capacity(bytes.len() + pad_len);
    padded.extend_from_slice(bytes);
    padded.resize(bytes.len() + pad_len, pad_len as u8);
    padded
}

pub fn unpad(bytes: &[u8], block_size: usize) -> Result<&[u8]> {
    let last = *bytes.last().ok_or(PaddingError::Empty)?;
    let pad_len = last as usize;

    if pad_len == 0 || pad_len > block_size || pad_len > bytes.len() {
        return Err(PaddingError::InvalidLength(last, block_size).into());
    }

    // every padding byte must hold the padding length
    let start = bytes.len() - pad_len;
    if let Some((offset, found)) = bytes[start ..].iter().enumerate().find(|(_, b)| **b != last) {
        return Err(PaddingError::InconsistentByte { index: start + offset, expected: last, found: *found }.into());
    }

    Ok(&bytes[.. start])
}
