// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! Turning cleartext numbers into [`crate::Plaintext`]s and back.
//!
//! A [`PlainEncoder`] maps one integer or floating-point number to a plaintext by scaling it to a
//! fixed-point integer. A [`BatchEncoder`] packs two fixed-width integers into one plaintext, so
//! that a single homomorphic addition adds both slots at once.

pub use batch_encoder::{BatchEncoder, BatchSlot};
pub use plain_encoder::PlainEncoder;

mod batch_encoder;
mod plain_encoder;
