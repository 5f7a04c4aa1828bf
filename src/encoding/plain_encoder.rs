// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use std::fmt;

use crypto_bigint::U2048;
use serde::{Deserialize, Serialize};

use crate::{Error, Plaintext, Result};

/// Encodes a number `x` as the plaintext $x \cdot scale$, truncated toward zero.
///
/// Encodings add up like the numbers they encode, so a sum of encoded values decodes to the sum
/// of the cleartexts, to `log10(scale)` decimal places for floating-point inputs.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct PlainEncoder {
    scale: i64,
}

impl Default for PlainEncoder {
    fn default() -> Self {
        Self {
            scale: Self::DEFAULT_SCALE,
        }
    }
}

impl PlainEncoder {
    pub const DEFAULT_SCALE: i64 = 1_000_000;

    /// Fails with [`Error::InvalidScale`] unless `scale` is positive.
    pub fn new(scale: i64) -> Result<Self> {
        if scale <= 0 {
            return Err(Error::InvalidScale(scale));
        }

        Ok(Self { scale })
    }

    pub fn scale(&self) -> i64 {
        self.scale
    }

    /// Encodes an integer of up to 128 bits. The product with the scale always fits a plaintext.
    pub fn encode<T: Into<i128>>(&self, cleartext: T) -> Plaintext {
        let cleartext: i128 = cleartext.into();
        let scale = U2048::from_u64(self.scale.unsigned_abs());
        let magnitude = U2048::from_u128(cleartext.unsigned_abs()).wrapping_mul(&scale);

        Plaintext::new(magnitude, cleartext < 0)
    }

    /// Encodes a floating-point number, failing with [`Error::UnencodableValue`] for non-finite
    /// values and for values whose scaled magnitude reaches $2^{127}$.
    pub fn encode_f64(&self, cleartext: f64) -> Result<Plaintext> {
        let scaled = cleartext * self.scale as f64;
        if !scaled.is_finite() || scaled.abs() >= i128::MAX as f64 {
            return Err(Error::UnencodableValue(cleartext.to_string()));
        }

        // `as` truncates toward zero.
        Ok(Plaintext::from(scaled as i128))
    }

    /// Decodes into an integer type, dropping the fractional part.
    ///
    /// Fails with [`Error::UndecodablePlaintext`] when the result does not fit `T`.
    pub fn decode<T: TryFrom<i128>>(&self, plaintext: &Plaintext) -> Result<T> {
        plaintext
            .checked_div(&Plaintext::from(self.scale))
            .and_then(|cleartext| cleartext.to_i128())
            .and_then(|cleartext| T::try_from(cleartext).ok())
            .ok_or_else(|| Error::UndecodablePlaintext(plaintext.to_decimal_string()))
    }

    /// Decodes into a floating-point number. Fails with [`Error::UndecodablePlaintext`] for
    /// plaintexts wider than 128 bits.
    pub fn decode_f64(&self, plaintext: &Plaintext) -> Result<f64> {
        let scaled = plaintext
            .to_i128()
            .ok_or_else(|| Error::UndecodablePlaintext(plaintext.to_decimal_string()))?;

        Ok(scaled as f64 / self.scale as f64)
    }
}

impl TryFrom<i64> for PlainEncoder {
    type Error = Error;

    fn try_from(scale: i64) -> Result<Self> {
        Self::new(scale)
    }
}

impl From<PlainEncoder> for i64 {
    fn from(encoder: PlainEncoder) -> Self {
        encoder.scale
    }
}

impl fmt::Display for PlainEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlainEncoder(scale={})", self.scale)
    }
}
