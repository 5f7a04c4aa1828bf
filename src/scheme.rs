// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! Picking a scheme at runtime.
//!
//! Each scheme implements the [`HomomorphicEncryptor`], [`HomomorphicDecryptor`] and
//! [`HomomorphicEvaluator`] traits on its own types. The enums in this module wrap those types
//! with one variant per scheme and dispatch by `match`; a [`HeKit`] bundles the keys of one
//! scheme and hands them out.

use std::fmt;
use std::str::FromStr;

use crypto_bigint::rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use crate::{mock, paillier, Error, Plaintext, Result};

pub trait HomomorphicEncryptor {
    type Ciphertext;

    fn encrypt(
        &self,
        plaintext: &Plaintext,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Self::Ciphertext>;

    fn encrypt_zero(&self, rng: &mut impl CryptoRngCore) -> Result<Self::Ciphertext>;

    /// Encrypts `plaintext`, along with a textual record of the encryption.
    fn encrypt_with_audit(
        &self,
        plaintext: &Plaintext,
        rng: &mut impl CryptoRngCore,
    ) -> Result<(Self::Ciphertext, String)>;
}

pub trait HomomorphicDecryptor {
    type Ciphertext;

    fn decrypt(&self, ciphertext: &Self::Ciphertext) -> Result<Plaintext>;
}

/// Arithmetic on ciphertexts. Every ciphertext returned is safe to transmit.
pub trait HomomorphicEvaluator {
    type Ciphertext;

    fn add(&self, lhs: &Self::Ciphertext, rhs: &Self::Ciphertext) -> Result<Self::Ciphertext>;

    fn add_plaintext(
        &self,
        ciphertext: &Self::Ciphertext,
        plaintext: &Plaintext,
    ) -> Result<Self::Ciphertext>;

    fn sub(&self, lhs: &Self::Ciphertext, rhs: &Self::Ciphertext) -> Result<Self::Ciphertext>;

    fn sub_plaintext(
        &self,
        ciphertext: &Self::Ciphertext,
        plaintext: &Plaintext,
    ) -> Result<Self::Ciphertext>;

    fn negate(&self, ciphertext: &Self::Ciphertext) -> Result<Self::Ciphertext>;

    /// Multiplies by `scalar`, randomizing the result where the scheme requires it.
    fn scalar_mul(
        &self,
        ciphertext: &Self::Ciphertext,
        scalar: &Plaintext,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Self::Ciphertext>;

    fn randomize(
        &self,
        ciphertext: &Self::Ciphertext,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Self::Ciphertext>;
}

#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, Serialize, Deserialize)]
pub enum SchemeType {
    Paillier,
    Mock,
}

impl fmt::Display for SchemeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemeType::Paillier => write!(f, "paillier"),
            SchemeType::Mock => write!(f, "mock"),
        }
    }
}

/// Parses scheme names, ignoring case.
impl FromStr for SchemeType {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "paillier" => Ok(SchemeType::Paillier),
            "mock" => Ok(SchemeType::Mock),
            _ => Err(Error::UnknownScheme(name.to_string())),
        }
    }
}

#[derive(PartialEq, Clone, Debug, Serialize, Deserialize)]
pub enum PublicKey {
    Paillier(paillier::PublicKey),
    Mock(mock::PublicKey),
}

impl PublicKey {
    pub fn scheme_type(&self) -> SchemeType {
        match self {
            PublicKey::Paillier(_) => SchemeType::Paillier,
            PublicKey::Mock(_) => SchemeType::Mock,
        }
    }

    pub fn key_size(&self) -> usize {
        match self {
            PublicKey::Paillier(public_key) => public_key.key_size(),
            PublicKey::Mock(public_key) => public_key.key_size(),
        }
    }

    pub fn plaintext_bound(&self) -> Plaintext {
        match self {
            PublicKey::Paillier(public_key) => public_key.plaintext_bound(),
            PublicKey::Mock(public_key) => public_key.plaintext_bound(),
        }
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublicKey::Paillier(public_key) => fmt::Display::fmt(public_key, f),
            PublicKey::Mock(public_key) => fmt::Display::fmt(public_key, f),
        }
    }
}

#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub enum SecretKey {
    Paillier(paillier::SecretKey),
    Mock(mock::SecretKey),
}

impl SecretKey {
    pub fn scheme_type(&self) -> SchemeType {
        match self {
            SecretKey::Paillier(_) => SchemeType::Paillier,
            SecretKey::Mock(_) => SchemeType::Mock,
        }
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
pub enum Ciphertext {
    Paillier(paillier::Ciphertext),
    Mock(mock::Ciphertext),
}

impl Ciphertext {
    pub fn scheme_type(&self) -> SchemeType {
        match self {
            Ciphertext::Paillier(_) => SchemeType::Paillier,
            Ciphertext::Mock(_) => SchemeType::Mock,
        }
    }

    fn as_paillier(&self) -> Result<&paillier::Ciphertext> {
        match self {
            Ciphertext::Paillier(ciphertext) => Ok(ciphertext),
            _ => Err(self.mismatch(SchemeType::Paillier)),
        }
    }

    fn as_mock(&self) -> Result<&mock::Ciphertext> {
        match self {
            Ciphertext::Mock(ciphertext) => Ok(ciphertext),
            _ => Err(self.mismatch(SchemeType::Mock)),
        }
    }

    fn mismatch(&self, expected: SchemeType) -> Error {
        Error::SchemeMismatch {
            expected,
            actual: self.scheme_type(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Encryptor<'a> {
    Paillier(paillier::Encryptor<'a>),
    Mock(mock::Encryptor<'a>),
}

#[derive(Clone, Copy, Debug)]
pub enum Decryptor<'a> {
    Paillier(paillier::Decryptor<'a>),
    Mock(mock::Decryptor<'a>),
}

#[derive(Clone, Copy, Debug)]
pub enum Evaluator<'a> {
    Paillier(paillier::Evaluator<'a>),
    Mock(mock::Evaluator<'a>),
}

/// The keys of one scheme: a public key, and the matching secret key if this party holds it.
#[derive(Clone, Debug)]
pub struct HeKit {
    public_key: PublicKey,
    secret_key: Option<SecretKey>,
}

impl HeKit {
    /// Generates a fresh key pair of `scheme_type` with `N` of `key_size` bits.
    pub fn generate(
        scheme_type: SchemeType,
        key_size: usize,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Self> {
        let (public_key, secret_key) = match scheme_type {
            SchemeType::Paillier => {
                let (public_key, secret_key) =
                    paillier::KeyGenerator::new(key_size)?.generate(rng)?;

                (
                    PublicKey::Paillier(public_key),
                    SecretKey::Paillier(secret_key),
                )
            }
            SchemeType::Mock => {
                let (public_key, secret_key) = mock::KeyGenerator::new(key_size)?.generate()?;

                (PublicKey::Mock(public_key), SecretKey::Mock(secret_key))
            }
        };

        Ok(Self {
            public_key,
            secret_key: Some(secret_key),
        })
    }

    /// Bundles a key pair, failing with [`Error::SchemeMismatch`] or [`Error::KeyMismatch`] unless
    /// the keys belong together.
    pub fn new(public_key: PublicKey, secret_key: SecretKey) -> Result<Self> {
        let kit = Self {
            public_key,
            secret_key: Some(secret_key),
        };
        kit.decryptor()?;

        Ok(kit)
    }

    /// A kit that can encrypt and evaluate, but not decrypt.
    pub fn from_public_key(public_key: PublicKey) -> Self {
        Self {
            public_key,
            secret_key: None,
        }
    }

    pub fn scheme_type(&self) -> SchemeType {
        self.public_key.scheme_type()
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn secret_key(&self) -> Option<&SecretKey> {
        self.secret_key.as_ref()
    }

    pub fn encryptor(&self) -> Encryptor<'_> {
        match &self.public_key {
            PublicKey::Paillier(public_key) => {
                Encryptor::Paillier(paillier::Encryptor::new(public_key))
            }
            PublicKey::Mock(public_key) => Encryptor::Mock(mock::Encryptor::new(public_key)),
        }
    }

    pub fn evaluator(&self) -> Evaluator<'_> {
        match &self.public_key {
            PublicKey::Paillier(public_key) => {
                Evaluator::Paillier(paillier::Evaluator::new(public_key))
            }
            PublicKey::Mock(public_key) => Evaluator::Mock(mock::Evaluator::new(public_key)),
        }
    }

    pub fn decryptor(&self) -> Result<Decryptor<'_>> {
        let secret_key = self.secret_key.as_ref().ok_or(Error::MissingSecretKey)?;

        match (&self.public_key, secret_key) {
            (PublicKey::Paillier(public_key), SecretKey::Paillier(secret_key)) => Ok(
                Decryptor::Paillier(paillier::Decryptor::new(public_key, secret_key)?),
            ),
            (PublicKey::Mock(public_key), SecretKey::Mock(secret_key)) => Ok(Decryptor::Mock(
                mock::Decryptor::new(public_key, secret_key)?,
            )),
            (public_key, secret_key) => Err(Error::SchemeMismatch {
                expected: public_key.scheme_type(),
                actual: secret_key.scheme_type(),
            }),
        }
    }
}

impl HomomorphicEncryptor for paillier::Encryptor<'_> {
    type Ciphertext = paillier::Ciphertext;

    fn encrypt(
        &self,
        plaintext: &Plaintext,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Self::Ciphertext> {
        paillier::Encryptor::encrypt(self, plaintext, rng)
    }

    fn encrypt_zero(&self, rng: &mut impl CryptoRngCore) -> Result<Self::Ciphertext> {
        paillier::Encryptor::encrypt_zero(self, rng)
    }

    fn encrypt_with_audit(
        &self,
        plaintext: &Plaintext,
        rng: &mut impl CryptoRngCore,
    ) -> Result<(Self::Ciphertext, String)> {
        paillier::Encryptor::encrypt_with_audit(self, plaintext, rng)
    }
}

impl HomomorphicDecryptor for paillier::Decryptor<'_> {
    type Ciphertext = paillier::Ciphertext;

    fn decrypt(&self, ciphertext: &Self::Ciphertext) -> Result<Plaintext> {
        paillier::Decryptor::decrypt(self, ciphertext)
    }
}

impl HomomorphicEvaluator for paillier::Evaluator<'_> {
    type Ciphertext = paillier::Ciphertext;

    fn add(&self, lhs: &Self::Ciphertext, rhs: &Self::Ciphertext) -> Result<Self::Ciphertext> {
        paillier::Evaluator::add(self, lhs, rhs)
    }

    fn add_plaintext(
        &self,
        ciphertext: &Self::Ciphertext,
        plaintext: &Plaintext,
    ) -> Result<Self::Ciphertext> {
        paillier::Evaluator::add_plaintext(self, ciphertext, plaintext)
    }

    fn sub(&self, lhs: &Self::Ciphertext, rhs: &Self::Ciphertext) -> Result<Self::Ciphertext> {
        paillier::Evaluator::sub(self, lhs, rhs)
    }

    fn sub_plaintext(
        &self,
        ciphertext: &Self::Ciphertext,
        plaintext: &Plaintext,
    ) -> Result<Self::Ciphertext> {
        paillier::Evaluator::sub_plaintext(self, ciphertext, plaintext)
    }

    fn negate(&self, ciphertext: &Self::Ciphertext) -> Result<Self::Ciphertext> {
        paillier::Evaluator::negate(self, ciphertext)
    }

    fn scalar_mul(
        &self,
        ciphertext: &Self::Ciphertext,
        scalar: &Plaintext,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Self::Ciphertext> {
        self.finalize(self.mul(ciphertext, scalar)?, rng)
    }

    fn randomize(
        &self,
        ciphertext: &Self::Ciphertext,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Self::Ciphertext> {
        paillier::Evaluator::randomize(self, ciphertext, rng)
    }
}

impl HomomorphicEncryptor for mock::Encryptor<'_> {
    type Ciphertext = mock::Ciphertext;

    fn encrypt(
        &self,
        plaintext: &Plaintext,
        _rng: &mut impl CryptoRngCore,
    ) -> Result<Self::Ciphertext> {
        mock::Encryptor::encrypt(self, plaintext)
    }

    fn encrypt_zero(&self, _rng: &mut impl CryptoRngCore) -> Result<Self::Ciphertext> {
        Ok(mock::Encryptor::encrypt_zero(self))
    }

    fn encrypt_with_audit(
        &self,
        plaintext: &Plaintext,
        _rng: &mut impl CryptoRngCore,
    ) -> Result<(Self::Ciphertext, String)> {
        mock::Encryptor::encrypt_with_audit(self, plaintext)
    }
}

impl HomomorphicDecryptor for mock::Decryptor<'_> {
    type Ciphertext = mock::Ciphertext;

    fn decrypt(&self, ciphertext: &Self::Ciphertext) -> Result<Plaintext> {
        mock::Decryptor::decrypt(self, ciphertext)
    }
}

impl HomomorphicEvaluator for mock::Evaluator<'_> {
    type Ciphertext = mock::Ciphertext;

    fn add(&self, lhs: &Self::Ciphertext, rhs: &Self::Ciphertext) -> Result<Self::Ciphertext> {
        mock::Evaluator::add(self, lhs, rhs)
    }

    fn add_plaintext(
        &self,
        ciphertext: &Self::Ciphertext,
        plaintext: &Plaintext,
    ) -> Result<Self::Ciphertext> {
        mock::Evaluator::add_plaintext(self, ciphertext, plaintext)
    }

    fn sub(&self, lhs: &Self::Ciphertext, rhs: &Self::Ciphertext) -> Result<Self::Ciphertext> {
        mock::Evaluator::sub(self, lhs, rhs)
    }

    fn sub_plaintext(
        &self,
        ciphertext: &Self::Ciphertext,
        plaintext: &Plaintext,
    ) -> Result<Self::Ciphertext> {
        mock::Evaluator::sub_plaintext(self, ciphertext, plaintext)
    }

    fn negate(&self, ciphertext: &Self::Ciphertext) -> Result<Self::Ciphertext> {
        mock::Evaluator::negate(self, ciphertext)
    }

    fn scalar_mul(
        &self,
        ciphertext: &Self::Ciphertext,
        scalar: &Plaintext,
        _rng: &mut impl CryptoRngCore,
    ) -> Result<Self::Ciphertext> {
        self.mul(ciphertext, scalar)
    }

    fn randomize(
        &self,
        ciphertext: &Self::Ciphertext,
        _rng: &mut impl CryptoRngCore,
    ) -> Result<Self::Ciphertext> {
        mock::Evaluator::randomize(self, ciphertext)
    }
}

impl HomomorphicEncryptor for Encryptor<'_> {
    type Ciphertext = Ciphertext;

    fn encrypt(
        &self,
        plaintext: &Plaintext,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Self::Ciphertext> {
        match self {
            Encryptor::Paillier(encryptor) => {
                HomomorphicEncryptor::encrypt(encryptor, plaintext, rng).map(Ciphertext::Paillier)
            }
            Encryptor::Mock(encryptor) => {
                HomomorphicEncryptor::encrypt(encryptor, plaintext, rng).map(Ciphertext::Mock)
            }
        }
    }

    fn encrypt_zero(&self, rng: &mut impl CryptoRngCore) -> Result<Self::Ciphertext> {
        match self {
            Encryptor::Paillier(encryptor) => {
                HomomorphicEncryptor::encrypt_zero(encryptor, rng).map(Ciphertext::Paillier)
            }
            Encryptor::Mock(encryptor) => {
                HomomorphicEncryptor::encrypt_zero(encryptor, rng).map(Ciphertext::Mock)
            }
        }
    }

    fn encrypt_with_audit(
        &self,
        plaintext: &Plaintext,
        rng: &mut impl CryptoRngCore,
    ) -> Result<(Self::Ciphertext, String)> {
        match self {
            Encryptor::Paillier(encryptor) => {
                HomomorphicEncryptor::encrypt_with_audit(encryptor, plaintext, rng)
                    .map(|(ciphertext, audit)| (Ciphertext::Paillier(ciphertext), audit))
            }
            Encryptor::Mock(encryptor) => {
                HomomorphicEncryptor::encrypt_with_audit(encryptor, plaintext, rng)
                    .map(|(ciphertext, audit)| (Ciphertext::Mock(ciphertext), audit))
            }
        }
    }
}

impl HomomorphicDecryptor for Decryptor<'_> {
    type Ciphertext = Ciphertext;

    fn decrypt(&self, ciphertext: &Self::Ciphertext) -> Result<Plaintext> {
        match self {
            Decryptor::Paillier(decryptor) => {
                HomomorphicDecryptor::decrypt(decryptor, ciphertext.as_paillier()?)
            }
            Decryptor::Mock(decryptor) => {
                HomomorphicDecryptor::decrypt(decryptor, ciphertext.as_mock()?)
            }
        }
    }
}

impl HomomorphicEvaluator for Evaluator<'_> {
    type Ciphertext = Ciphertext;

    fn add(&self, lhs: &Self::Ciphertext, rhs: &Self::Ciphertext) -> Result<Self::Ciphertext> {
        match self {
            Evaluator::Paillier(evaluator) => {
                HomomorphicEvaluator::add(evaluator, lhs.as_paillier()?, rhs.as_paillier()?)
                    .map(Ciphertext::Paillier)
            }
            Evaluator::Mock(evaluator) => {
                HomomorphicEvaluator::add(evaluator, lhs.as_mock()?, rhs.as_mock()?)
                    .map(Ciphertext::Mock)
            }
        }
    }

    fn add_plaintext(
        &self,
        ciphertext: &Self::Ciphertext,
        plaintext: &Plaintext,
    ) -> Result<Self::Ciphertext> {
        match self {
            Evaluator::Paillier(evaluator) => HomomorphicEvaluator::add_plaintext(
                evaluator,
                ciphertext.as_paillier()?,
                plaintext,
            )
            .map(Ciphertext::Paillier),
            Evaluator::Mock(evaluator) => {
                HomomorphicEvaluator::add_plaintext(evaluator, ciphertext.as_mock()?, plaintext)
                    .map(Ciphertext::Mock)
            }
        }
    }

    fn sub(&self, lhs: &Self::Ciphertext, rhs: &Self::Ciphertext) -> Result<Self::Ciphertext> {
        match self {
            Evaluator::Paillier(evaluator) => {
                HomomorphicEvaluator::sub(evaluator, lhs.as_paillier()?, rhs.as_paillier()?)
                    .map(Ciphertext::Paillier)
            }
            Evaluator::Mock(evaluator) => {
                HomomorphicEvaluator::sub(evaluator, lhs.as_mock()?, rhs.as_mock()?)
                    .map(Ciphertext::Mock)
            }
        }
    }

    fn sub_plaintext(
        &self,
        ciphertext: &Self::Ciphertext,
        plaintext: &Plaintext,
    ) -> Result<Self::Ciphertext> {
        match self {
            Evaluator::Paillier(evaluator) => HomomorphicEvaluator::sub_plaintext(
                evaluator,
                ciphertext.as_paillier()?,
                plaintext,
            )
            .map(Ciphertext::Paillier),
            Evaluator::Mock(evaluator) => {
                HomomorphicEvaluator::sub_plaintext(evaluator, ciphertext.as_mock()?, plaintext)
                    .map(Ciphertext::Mock)
            }
        }
    }

    fn negate(&self, ciphertext: &Self::Ciphertext) -> Result<Self::Ciphertext> {
        match self {
            Evaluator::Paillier(evaluator) => {
                HomomorphicEvaluator::negate(evaluator, ciphertext.as_paillier()?)
                    .map(Ciphertext::Paillier)
            }
            Evaluator::Mock(evaluator) => {
                HomomorphicEvaluator::negate(evaluator, ciphertext.as_mock()?)
                    .map(Ciphertext::Mock)
            }
        }
    }

    fn scalar_mul(
        &self,
        ciphertext: &Self::Ciphertext,
        scalar: &Plaintext,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Self::Ciphertext> {
        match self {
            Evaluator::Paillier(evaluator) => HomomorphicEvaluator::scalar_mul(
                evaluator,
                ciphertext.as_paillier()?,
                scalar,
                rng,
            )
            .map(Ciphertext::Paillier),
            Evaluator::Mock(evaluator) => {
                HomomorphicEvaluator::scalar_mul(evaluator, ciphertext.as_mock()?, scalar, rng)
                    .map(Ciphertext::Mock)
            }
        }
    }

    fn randomize(
        &self,
        ciphertext: &Self::Ciphertext,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Self::Ciphertext> {
        match self {
            Evaluator::Paillier(evaluator) => {
                HomomorphicEvaluator::randomize(evaluator, ciphertext.as_paillier()?, rng)
                    .map(Ciphertext::Paillier)
            }
            Evaluator::Mock(evaluator) => {
                HomomorphicEvaluator::randomize(evaluator, ciphertext.as_mock()?, rng)
                    .map(Ciphertext::Mock)
            }
        }
    }
}
