//! Biometric crypto layer on top of the CKKS engine.

mod arithmetic;
mod codec;
mod context;
mod matching;

pub use arithmetic::*;
pub use codec::{decode, encode, EncryptedTemplate};
pub use context::*;
pub use matching::*;
