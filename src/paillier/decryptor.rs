// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use crypto_bigint::NonZero;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::paillier::{Ciphertext, PublicKey, SecretKey};
use crate::{
    mul_wide, narrow, widen, Error, LargeBiPrimeSizedNumber, PaillierModulusSizedNumber, Plaintext,
    Result,
};

/// Decrypts ciphertexts of a [`PublicKey`] with its matching [`SecretKey`].
#[derive(Clone, Copy, Debug)]
pub struct Decryptor<'a> {
    public_key: &'a PublicKey,
    secret_key: &'a SecretKey,
    // $N$ at the width of $N^2$, for dividing and reducing intermediate values.
    n: NonZero<PaillierModulusSizedNumber>,
}

impl<'a> Decryptor<'a> {
    /// Pairs the keys, failing with [`Error::KeyMismatch`] unless $pq = N$.
    pub fn new(public_key: &'a PublicKey, secret_key: &'a SecretKey) -> Result<Self> {
        if secret_key.n() != public_key.n() {
            return Err(Error::KeyMismatch);
        }

        let n: Option<_> = NonZero::new(widen(public_key.n())).into();

        Ok(Self {
            public_key,
            secret_key,
            n: n.ok_or(Error::InternalError)?,
        })
    }

    /// Decrypts `ciphertext` into a signed plaintext: residues above $N/2$ are negative.
    pub fn decrypt(&self, ciphertext: &Ciphertext) -> Result<Plaintext> {
        let element = self.public_key.ciphertext_element(ciphertext)?;
        let value = self.public_key.space().map_back_to_z_space(&element);
        if value == PaillierModulusSizedNumber::ZERO {
            return Err(Error::MalformedCiphertext("ciphertext is zero".to_string()));
        }

        // $c^\lambda = 1 + N \cdot m \lambda mod N^2$
        let power = self
            .secret_key
            .pow_mod_n_square_crt(&value, self.secret_key.lambda());

        // $L(x) = (x - 1) / N$, which is exact for every encryption.
        let (quotient, remainder) = power
            .wrapping_sub(&PaillierModulusSizedNumber::ONE)
            .div_rem(&self.n);
        if remainder != PaillierModulusSizedNumber::ZERO {
            return Err(Error::MalformedCiphertext(
                "ciphertext is not a unit modulo N^2".to_string(),
            ));
        }

        let residue: LargeBiPrimeSizedNumber = narrow(
            &mul_wide(&narrow(&quotient), self.secret_key.mu()).rem(&self.n),
        );

        Ok(Plaintext::from_residue(
            residue,
            self.public_key.n(),
            self.public_key.n_half(),
        ))
    }

    /// Decrypts every ciphertext, failing on the first malformed one.
    pub fn decrypt_batch(&self, ciphertexts: &[Ciphertext]) -> Result<Vec<Plaintext>> {
        #[cfg(not(feature = "parallel"))]
        let iter = ciphertexts.iter();
        #[cfg(feature = "parallel")]
        let iter = ciphertexts.par_iter();

        iter.map(|ciphertext| self.decrypt(ciphertext)).collect()
    }
}
