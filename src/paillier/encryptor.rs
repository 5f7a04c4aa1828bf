// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use crypto_bigint::rand_core::CryptoRngCore;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::paillier::{Ciphertext, PublicKey};
use crate::{to_hex_string, PaillierRingElement, Plaintext, Result};

/// Encrypts plaintexts under a [`PublicKey`]: $c = g^m \cdot h_s^r mod N^2$.
#[derive(Clone, Copy, Debug)]
pub struct Encryptor<'a> {
    public_key: &'a PublicKey,
}

impl<'a> Encryptor<'a> {
    pub fn new(public_key: &'a PublicKey) -> Self {
        Self { public_key }
    }

    pub fn public_key(&self) -> &'a PublicKey {
        self.public_key
    }

    /// Encrypts `plaintext`, which must be strictly below the plaintext bound in absolute value.
    pub fn encrypt(
        &self,
        plaintext: &Plaintext,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Ciphertext> {
        self.public_key.validate_plaintext(plaintext)?;

        Ok(self.encrypt_with_randomizer(plaintext, &self.random_rn(rng)?))
    }

    pub fn encrypt_zero(&self, rng: &mut impl CryptoRngCore) -> Result<Ciphertext> {
        Ok(Ciphertext::from(self.random_rn(rng)?))
    }

    /// Encrypts `plaintext` and renders the record `p:<plaintext>,rn:<randomizer>,c:<ciphertext>`
    /// in hex, with the randomizer and the ciphertext in the form they are serialized in.
    pub fn encrypt_with_audit(
        &self,
        plaintext: &Plaintext,
        rng: &mut impl CryptoRngCore,
    ) -> Result<(Ciphertext, String)> {
        self.public_key.validate_plaintext(plaintext)?;

        let randomizer = self.random_rn(rng)?;
        let ciphertext = self.encrypt_with_randomizer(plaintext, &randomizer);

        let audit = format!(
            "p:{},rn:{},c:{}",
            plaintext,
            to_hex_string(randomizer.as_montgomery()),
            to_hex_string(ciphertext.value())
        );

        Ok((ciphertext, audit))
    }

    /// Draws a fresh randomizer $r^N = h_s^r mod N^2$.
    pub fn random_rn(&self, rng: &mut impl CryptoRngCore) -> Result<PaillierRingElement> {
        self.public_key
            .randomizer(&self.public_key.random_exponent(rng))
    }

    /// Encrypts every plaintext, failing if any of them is out of range.
    ///
    /// Randomizer exponents are drawn from `rng` upfront, so that the exponentiations can run
    /// in parallel.
    pub fn encrypt_batch(
        &self,
        plaintexts: &[Plaintext],
        rng: &mut impl CryptoRngCore,
    ) -> Result<Vec<Ciphertext>> {
        plaintexts
            .iter()
            .try_for_each(|plaintext| self.public_key.validate_plaintext(plaintext))?;

        let exponents: Vec<_> = plaintexts
            .iter()
            .map(|_| self.public_key.random_exponent(rng))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let iter = plaintexts.iter().zip(exponents.iter());
        #[cfg(feature = "parallel")]
        let iter = plaintexts.par_iter().zip(exponents.par_iter());

        iter.map(|(plaintext, exponent)| {
            Ok(self.encrypt_with_randomizer(plaintext, &self.public_key.randomizer(exponent)?))
        })
        .collect()
    }

    // `plaintext` must already be validated.
    fn encrypt_with_randomizer(
        &self,
        plaintext: &Plaintext,
        randomizer: &PaillierRingElement,
    ) -> Ciphertext {
        Ciphertext::from(self.public_key.encode(plaintext) * *randomizer)
    }
}
