// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;

use crypto_bigint::{CheckedAdd, CheckedMul, NonZero, U2048};
use serde::{Deserialize, Serialize};

use crate::{low_u128, to_decimal_string, to_hex_string, LargeBiPrimeSizedNumber};

/// A signed integer to be encrypted, stored as a sign and a magnitude.
///
/// Zero is never negative. Whether a plaintext is in range is decided by the scheme that encrypts
/// it, see e.g. [`crate::paillier::PublicKey::plaintext_bound`].
#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(from = "SignedMagnitude", into = "SignedMagnitude")]
pub struct Plaintext {
    magnitude: LargeBiPrimeSizedNumber,
    is_negative: bool,
}

#[derive(Clone, Copy, Serialize, Deserialize)]
struct SignedMagnitude {
    magnitude: LargeBiPrimeSizedNumber,
    is_negative: bool,
}

impl Plaintext {
    pub const ZERO: Self = Self {
        magnitude: LargeBiPrimeSizedNumber::ZERO,
        is_negative: false,
    };

    pub fn new(magnitude: LargeBiPrimeSizedNumber, is_negative: bool) -> Self {
        Self {
            magnitude,
            is_negative: is_negative && magnitude != LargeBiPrimeSizedNumber::ZERO,
        }
    }

    pub fn magnitude(&self) -> &LargeBiPrimeSizedNumber {
        &self.magnitude
    }

    pub fn is_negative(&self) -> bool {
        self.is_negative
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude == LargeBiPrimeSizedNumber::ZERO
    }

    /// The bit length of the magnitude.
    pub fn bits(&self) -> usize {
        self.magnitude.bits_vartime()
    }

    pub fn compare_abs(&self, other: &Self) -> Ordering {
        self.magnitude.cmp(&other.magnitude)
    }

    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        if self.is_negative == other.is_negative {
            let magnitude: Option<LargeBiPrimeSizedNumber> =
                self.magnitude.checked_add(&other.magnitude).into();

            return magnitude.map(|magnitude| Self::new(magnitude, self.is_negative));
        }

        Some(match self.compare_abs(other) {
            Ordering::Less => Self::new(
                other.magnitude.wrapping_sub(&self.magnitude),
                other.is_negative,
            ),
            _ => Self::new(
                self.magnitude.wrapping_sub(&other.magnitude),
                self.is_negative,
            ),
        })
    }

    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        self.checked_add(&-*other)
    }

    pub fn checked_mul(&self, other: &Self) -> Option<Self> {
        let magnitude: Option<LargeBiPrimeSizedNumber> =
            self.magnitude.checked_mul(&other.magnitude).into();

        magnitude.map(|magnitude| Self::new(magnitude, self.is_negative != other.is_negative))
    }

    /// Divides by `divisor`, rounding toward zero. Returns `None` when `divisor` is zero.
    pub fn checked_div(&self, divisor: &Self) -> Option<Self> {
        let non_zero_divisor: Option<NonZero<U2048>> = NonZero::new(divisor.magnitude).into();

        non_zero_divisor.map(|non_zero_divisor| {
            let (quotient, _) = self.magnitude.div_rem(&non_zero_divisor);

            Self::new(quotient, self.is_negative != divisor.is_negative)
        })
    }

    /// The value as an `i128`, if it fits.
    pub fn to_i128(&self) -> Option<i128> {
        if self.bits() > u128::BITS as usize {
            return None;
        }

        let magnitude = low_u128(&self.magnitude);
        if self.is_negative {
            0i128.checked_sub_unsigned(magnitude)
        } else {
            i128::try_from(magnitude).ok()
        }
    }

    /// Decimal rendering, prefixed with `-` when negative.
    pub fn to_decimal_string(&self) -> String {
        let magnitude = to_decimal_string(&self.magnitude);

        if self.is_negative {
            format!("-{magnitude}")
        } else {
            magnitude
        }
    }

    /// The representative of `self` in $[0, modulus)$.
    pub(crate) fn to_residue(
        &self,
        modulus: &NonZero<LargeBiPrimeSizedNumber>,
    ) -> LargeBiPrimeSizedNumber {
        let residue = self.magnitude.rem(modulus);

        if self.is_negative && residue != LargeBiPrimeSizedNumber::ZERO {
            modulus.wrapping_sub(&residue)
        } else {
            residue
        }
    }

    /// Reads a residue in $[0, modulus)$ as a signed value: residues above `half` stand for
    /// `residue - modulus`.
    pub(crate) fn from_residue(
        residue: LargeBiPrimeSizedNumber,
        modulus: &LargeBiPrimeSizedNumber,
        half: &LargeBiPrimeSizedNumber,
    ) -> Self {
        if residue > *half {
            Self::new(modulus.wrapping_sub(&residue), true)
        } else {
            Self::new(residue, false)
        }
    }
}

impl Neg for Plaintext {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(self.magnitude, !self.is_negative)
    }
}

impl From<i64> for Plaintext {
    fn from(value: i64) -> Self {
        Self::new(
            LargeBiPrimeSizedNumber::from(value.unsigned_abs()),
            value < 0,
        )
    }
}

impl From<i128> for Plaintext {
    fn from(value: i128) -> Self {
        Self::new(U2048::from_u128(value.unsigned_abs()), value < 0)
    }
}

impl From<u64> for Plaintext {
    fn from(value: u64) -> Self {
        Self::new(LargeBiPrimeSizedNumber::from(value), false)
    }
}

impl From<U2048> for Plaintext {
    fn from(magnitude: U2048) -> Self {
        Self::new(magnitude, false)
    }
}

impl From<SignedMagnitude> for Plaintext {
    fn from(value: SignedMagnitude) -> Self {
        Self::new(value.magnitude, value.is_negative)
    }
}

impl From<Plaintext> for SignedMagnitude {
    fn from(value: Plaintext) -> Self {
        Self {
            magnitude: value.magnitude,
            is_negative: value.is_negative,
        }
    }
}

/// Upper-case hex without leading zeros, prefixed with `-` when negative.
impl fmt::Display for Plaintext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative {
            write!(f, "-")?;
        }

        write!(f, "{}", to_hex_string(&self.magnitude))
    }
}
