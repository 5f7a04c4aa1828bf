// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! A scheme that does not encrypt: ciphertexts carry their plaintext in the clear.
//!
//! It mirrors the interface and the range checks of [`crate::paillier`] at no cost, so that
//! protocols can be run and debugged end to end with readable ciphertexts. It offers no secrecy
//! whatsoever.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, LargeBiPrimeSizedNumber, Plaintext, Result, MAXIMUM_KEY_SIZE, MINIMUM_KEY_SIZE};

fn validate_key_size(key_size: usize) -> Result<()> {
    if key_size % 2 != 0 || !(MINIMUM_KEY_SIZE..=MAXIMUM_KEY_SIZE).contains(&key_size) {
        return Err(Error::InvalidKeySize(key_size));
    }

    Ok(())
}

/// Plaintexts must be strictly below $2^{key\_size - 1}$ in absolute value.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct PublicKey {
    key_size: usize,
    plaintext_bound: Plaintext,
}

impl PublicKey {
    pub fn new(key_size: usize) -> Result<Self> {
        validate_key_size(key_size)?;

        Ok(Self {
            key_size,
            plaintext_bound: Plaintext::from(
                LargeBiPrimeSizedNumber::ONE.shl_vartime(key_size - 1),
            ),
        })
    }

    pub fn key_size(&self) -> usize {
        self.key_size
    }

    pub fn plaintext_bound(&self) -> Plaintext {
        self.plaintext_bound
    }

    fn validate_plaintext(&self, plaintext: &Plaintext) -> Result<()> {
        if plaintext.compare_abs(&self.plaintext_bound).is_lt() {
            Ok(())
        } else {
            Err(Error::PlaintextOutOfRange {
                plaintext: plaintext.to_string(),
                bound: self.plaintext_bound.to_string(),
            })
        }
    }

    fn validate_ciphertext(&self, ciphertext: &Ciphertext) -> Result<Plaintext> {
        self.validate_plaintext(&ciphertext.0)
            .map_err(|_| Error::MalformedCiphertext(format!("{} is out of range", ciphertext.0)))?;

        Ok(ciphertext.0)
    }

    /// Checks the result of an operation, which overflowed if it is `None`.
    fn checked_result(&self, result: Option<Plaintext>) -> Result<Ciphertext> {
        let plaintext = result.ok_or_else(|| Error::PlaintextOutOfRange {
            plaintext: "an overflowing result".to_string(),
            bound: self.plaintext_bound.to_string(),
        })?;
        self.validate_plaintext(&plaintext)?;

        Ok(Ciphertext(plaintext))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mock public key with {} bit length", self.key_size)
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.key_size.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        PublicKey::new(usize::deserialize(deserializer)?).map_err(serde::de::Error::custom)
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SecretKey {
    key_size: usize,
}

impl SecretKey {
    pub fn key_size(&self) -> usize {
        self.key_size
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mock secret key with {} bit length", self.key_size)
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct KeyGenerator {
    key_size: usize,
}

impl KeyGenerator {
    pub fn new(key_size: usize) -> Result<Self> {
        validate_key_size(key_size)?;

        Ok(Self { key_size })
    }

    pub fn generate(&self) -> Result<(PublicKey, SecretKey)> {
        Ok((
            PublicKey::new(self.key_size)?,
            SecretKey {
                key_size: self.key_size,
            },
        ))
    }
}

/// A "ciphertext" holding its plaintext as is.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Ciphertext(Plaintext);

impl Ciphertext {
    pub fn new(plaintext: Plaintext) -> Self {
        Self(plaintext)
    }

    pub fn plaintext(&self) -> &Plaintext {
        &self.0
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Encryptor<'a> {
    public_key: &'a PublicKey,
}

impl<'a> Encryptor<'a> {
    pub fn new(public_key: &'a PublicKey) -> Self {
        Self { public_key }
    }

    pub fn encrypt(&self, plaintext: &Plaintext) -> Result<Ciphertext> {
        self.public_key.validate_plaintext(plaintext)?;

        Ok(Ciphertext(*plaintext))
    }

    pub fn encrypt_zero(&self) -> Ciphertext {
        Ciphertext(Plaintext::ZERO)
    }

    /// Encrypts `plaintext` and renders the record `mock:<plaintext>`, the plaintext in decimal.
    pub fn encrypt_with_audit(&self, plaintext: &Plaintext) -> Result<(Ciphertext, String)> {
        let ciphertext = self.encrypt(plaintext)?;

        Ok((
            ciphertext,
            format!("mock:{}", plaintext.to_decimal_string()),
        ))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Decryptor<'a> {
    public_key: &'a PublicKey,
}

impl<'a> Decryptor<'a> {
    /// Fails with [`Error::KeyMismatch`] unless both keys are of the same size.
    pub fn new(public_key: &'a PublicKey, secret_key: &SecretKey) -> Result<Self> {
        if public_key.key_size != secret_key.key_size {
            return Err(Error::KeyMismatch);
        }

        Ok(Self { public_key })
    }

    pub fn decrypt(&self, ciphertext: &Ciphertext) -> Result<Plaintext> {
        self.public_key.validate_ciphertext(ciphertext)
    }
}

/// Plain integer arithmetic, failing with [`Error::PlaintextOutOfRange`] on results that leave
/// the plaintext range.
#[derive(Clone, Copy, Debug)]
pub struct Evaluator<'a> {
    public_key: &'a PublicKey,
}

impl<'a> Evaluator<'a> {
    pub fn new(public_key: &'a PublicKey) -> Self {
        Self { public_key }
    }

    pub fn add(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Result<Ciphertext> {
        let lhs = self.public_key.validate_ciphertext(lhs)?;
        let rhs = self.public_key.validate_ciphertext(rhs)?;

        self.public_key.checked_result(lhs.checked_add(&rhs))
    }

    pub fn add_plaintext(
        &self,
        ciphertext: &Ciphertext,
        plaintext: &Plaintext,
    ) -> Result<Ciphertext> {
        self.public_key.validate_plaintext(plaintext)?;

        self.add(ciphertext, &Ciphertext(*plaintext))
    }

    pub fn sub(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Result<Ciphertext> {
        self.add(lhs, &self.negate(rhs)?)
    }

    pub fn sub_plaintext(
        &self,
        ciphertext: &Ciphertext,
        plaintext: &Plaintext,
    ) -> Result<Ciphertext> {
        self.add_plaintext(ciphertext, &-*plaintext)
    }

    pub fn negate(&self, ciphertext: &Ciphertext) -> Result<Ciphertext> {
        Ok(Ciphertext(-self.public_key.validate_ciphertext(ciphertext)?))
    }

    /// Multiplication by any scalar; the result must still be in range.
    pub fn mul(&self, ciphertext: &Ciphertext, scalar: &Plaintext) -> Result<Ciphertext> {
        let plaintext = self.public_key.validate_ciphertext(ciphertext)?;

        self.public_key.checked_result(plaintext.checked_mul(scalar))
    }

    /// There is no randomness to refresh: returns the ciphertext once it is checked.
    pub fn randomize(&self, ciphertext: &Ciphertext) -> Result<Ciphertext> {
        self.public_key
            .validate_ciphertext(ciphertext)
            .map(Ciphertext)
    }
}
