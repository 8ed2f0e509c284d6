pub mod block;
pub mod codec;
pub mod des;
pub mod des3;
pub mod error;
pub mod key;
pub mod key_schedule;
pub mod padding;
pub mod service;
pub mod tables;
pub mod trace;
pub mod util;

pub use block::{BlockCipher, Chaining, Mode};
pub use codec::Encoding;
pub use error::{CipherError, Result};
pub use key::{Algorithm, Key64, KeyMaterial, TripleKey};
pub use service::{CipherService, Comparison, Encrypted};
