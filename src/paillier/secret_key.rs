// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use std::fmt;

use crypto_bigint::NonZero;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::montgomery::MontgomerySpace;
use crate::{
    mul_wide, narrow, widen, Error, LargeBiPrimeSizedNumber, LargePrimeSizedNumber,
    PaillierModulusSizedNumber, PaillierRingElement, Result, MODULUS_LIMBS, MODULUS_SQUARE_LIMBS,
};

/// A Paillier secret key: the factorization $N = pq$ and everything derived from it.
///
/// Decryption exponentiates by $\lambda = (p-1)(q-1)/2$ and multiplies by $\mu = \lambda^{-1} mod N$.
/// All exponentiations modulo $N^2$ are split over $p^2$ and $q^2$ and recombined with the CRT.
#[derive(Clone)]
pub struct SecretKey {
    p: LargePrimeSizedNumber,
    q: LargePrimeSizedNumber,
    n: LargeBiPrimeSizedNumber,
    lambda: LargeBiPrimeSizedNumber,
    mu: LargeBiPrimeSizedNumber,
    p_square: PrimeSquare,
    q_square: PrimeSquare,
    n_square_space: MontgomerySpace<MODULUS_SQUARE_LIMBS>,
    // $((q^2)^{-1} mod p^2) \cdot q^2$, which is $1 mod p^2$ and $0 mod q^2$.
    crt_coefficient: PaillierRingElement,
}

/// The CRT component of $\mathbb{Z}_{N^2}$ modulo the square of one of the primes.
#[derive(Clone)]
struct PrimeSquare {
    // $p^2$, at the width of the values it reduces.
    modulus: NonZero<PaillierModulusSizedNumber>,
    space: MontgomerySpace<MODULUS_LIMBS>,
    // $\varphi(p^2) = p(p-1)$
    totient: NonZero<LargeBiPrimeSizedNumber>,
}

impl PrimeSquare {
    fn new(prime: &LargePrimeSizedNumber) -> Result<Self> {
        let square = mul_wide(prime, prime);
        let space = MontgomerySpace::new(&square).map_err(|_| Error::InvalidPrimes)?;

        let modulus: Option<_> = NonZero::new(widen(&square)).into();
        let totient: Option<_> =
            NonZero::new(mul_wide(prime, &prime.wrapping_sub(&LargePrimeSizedNumber::ONE))).into();

        Ok(Self {
            modulus: modulus.ok_or(Error::InvalidPrimes)?,
            space,
            totient: totient.ok_or(Error::InvalidPrimes)?,
        })
    }

    /// $base^{exponent} mod p^2$, with the base and exponent reduced first.
    fn pow(
        &self,
        base: &PaillierModulusSizedNumber,
        exponent: &LargeBiPrimeSizedNumber,
    ) -> PaillierModulusSizedNumber {
        let base = narrow(&base.rem(&self.modulus));
        let exponent = exponent.rem(&self.totient);

        let power = self
            .space
            .map_into_space(&base)
            .pow_bounded_exp(&exponent, self.totient.bits_vartime());

        widen(&self.space.map_back_to_z_space(&power))
    }
}

impl SecretKey {
    /// Derives the secret key of $N = pq$.
    ///
    /// Fails with [`Error::InvalidPrimes`] when `p` and `q` cannot form a key: they must be
    /// distinct and odd, with $\lambda$ invertible modulo $N$. Primality itself is not re-checked.
    pub fn new(p: LargePrimeSizedNumber, q: LargePrimeSizedNumber) -> Result<Self> {
        if p == q {
            return Err(Error::InvalidPrimes);
        }

        let p_square = PrimeSquare::new(&p)?;
        let q_square = PrimeSquare::new(&q)?;

        let n = mul_wide(&p, &q);
        let n_space = MontgomerySpace::new(&n).map_err(|_| Error::InvalidPrimes)?;

        let lambda = mul_wide(
            &p.wrapping_sub(&LargePrimeSizedNumber::ONE),
            &q.wrapping_sub(&LargePrimeSizedNumber::ONE),
        )
        .shr_vartime(1);
        let mu = n_space
            .invert(&n_space.map_into_space(&lambda))
            .ok_or(Error::InvalidPrimes)?;

        let q_square_value = narrow(&*q_square.modulus);
        let q_square_inverse = p_square
            .space
            .invert(&p_square.space.map_into_space(&q_square_value))
            .ok_or(Error::InvalidPrimes)?;

        let n_square_space =
            MontgomerySpace::new(&mul_wide(&n, &n)).map_err(|_| Error::InvalidPrimes)?;
        let crt_coefficient = n_square_space.map_into_space(&mul_wide(
            &p_square.space.map_back_to_z_space(&q_square_inverse),
            &q_square_value,
        ));

        Ok(Self {
            p,
            q,
            n,
            lambda,
            mu: n_space.map_back_to_z_space(&mu),
            p_square,
            q_square,
            n_square_space,
            crt_coefficient,
        })
    }

    pub fn p(&self) -> &LargePrimeSizedNumber {
        &self.p
    }

    pub fn q(&self) -> &LargePrimeSizedNumber {
        &self.q
    }

    /// The modulus $N = pq$ this key decrypts under.
    pub fn n(&self) -> &LargeBiPrimeSizedNumber {
        &self.n
    }

    pub(crate) fn lambda(&self) -> &LargeBiPrimeSizedNumber {
        &self.lambda
    }

    pub(crate) fn mu(&self) -> &LargeBiPrimeSizedNumber {
        &self.mu
    }

    /// Computes $base^{exponent} mod N^2$ as two half-width exponentiations modulo $p^2$ and
    /// $q^2$, recombined as $((r_p - r_q) \cdot c + r_q) mod N^2$ for the CRT coefficient $c$.
    ///
    /// The exponents are reduced modulo $\varphi(p^2)$ and $\varphi(q^2)$, so `base` must be a unit.
    pub fn pow_mod_n_square_crt(
        &self,
        base: &PaillierModulusSizedNumber,
        exponent: &LargeBiPrimeSizedNumber,
    ) -> PaillierModulusSizedNumber {
        let p_power = self
            .n_square_space
            .map_into_space(&self.p_square.pow(base, exponent));
        let q_power = self
            .n_square_space
            .map_into_space(&self.q_square.pow(base, exponent));

        self.n_square_space
            .map_back_to_z_space(&((p_power - q_power) * self.crt_coefficient + q_power))
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.p == other.p && self.q == other.q
    }
}

impl Eq for SecretKey {}

/// Only the sizes of the primes are shown.
impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Paillier secret key: p=[{}bits], q=[{}bits]",
            self.p.bits_vartime(),
            self.q.bits_vartime()
        )
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("key_size", &self.n.bits_vartime())
            .finish_non_exhaustive()
    }
}

impl Serialize for SecretKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (self.p, self.q).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (p, q) =
            <(LargePrimeSizedNumber, LargePrimeSizedNumber)>::deserialize(deserializer)?;

        SecretKey::new(p, q).map_err(serde::de::Error::custom)
    }
}
