// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use serde::{Deserialize, Serialize};

use crate::{PaillierModulusSizedNumber, PaillierRingElement};

/// A Paillier ciphertext: an element of $\mathbb{Z}_{N^2}$ in Montgomery form.
///
/// A ciphertext may come from an untrusted peer, so its range is only checked (against the public
/// key) when an operation consumes it.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Ciphertext(PaillierModulusSizedNumber);

impl Ciphertext {
    pub fn new(value: PaillierModulusSizedNumber) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &PaillierModulusSizedNumber {
        &self.0
    }
}

impl From<PaillierRingElement> for Ciphertext {
    fn from(element: PaillierRingElement) -> Self {
        Self(*element.as_montgomery())
    }
}

/// The result of multiplying a ciphertext by zero: the trivial encryption of zero.
///
/// It reveals that the scalar was zero, so it cannot be serialized; it can only be used in further
/// local arithmetic through [`UnrandomizedCiphertext::intermediate`], or made transmittable by
/// [`crate::paillier::Evaluator::randomize_unrandomized`].
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct UnrandomizedCiphertext(Ciphertext);

impl UnrandomizedCiphertext {
    pub(crate) fn new(ciphertext: Ciphertext) -> Self {
        Self(ciphertext)
    }

    pub fn intermediate(&self) -> &Ciphertext {
        &self.0
    }
}

/// The result of [`crate::paillier::Evaluator::mul`].
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ScaledCiphertext {
    Transmittable(Ciphertext),
    Unrandomized(UnrandomizedCiphertext),
}

impl ScaledCiphertext {
    /// The ciphertext, for local arithmetic only; see [`UnrandomizedCiphertext`].
    pub fn intermediate(&self) -> &Ciphertext {
        match self {
            ScaledCiphertext::Transmittable(ciphertext) => ciphertext,
            ScaledCiphertext::Unrandomized(unrandomized) => unrandomized.intermediate(),
        }
    }

    pub fn is_transmittable(&self) -> bool {
        matches!(self, ScaledCiphertext::Transmittable(_))
    }

    /// The ciphertext, unless it still needs to be randomized.
    pub fn transmittable(self) -> Option<Ciphertext> {
        match self {
            ScaledCiphertext::Transmittable(ciphertext) => Some(ciphertext),
            ScaledCiphertext::Unrandomized(_) => None,
        }
    }
}
