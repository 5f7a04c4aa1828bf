// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use crypto_bigint::rand_core::CryptoRngCore;
use crypto_bigint::{NonZero, RandomMod};
use crypto_primes::generate_prime_with_rng;
use log::{debug, trace};

use crate::montgomery::{BaseTable, MontgomerySpace};
use crate::paillier::{PublicKey, SecretKey};
use crate::{
    mul_wide, widen, Error, LargeBiPrimeSizedNumber, LargePrimeSizedNumber, Result,
    DEFAULT_KEY_SIZE, DEFAULT_TABLE_DENSITY, MAXIMUM_KEY_GENERATION_ATTEMPTS, MAXIMUM_KEY_SIZE,
    MINIMUM_KEY_SIZE, MODULUS_SQUARE_LIMBS,
};

/// `|p - q|` must be at most this many bits shorter than the primes, against Fermat factoring.
const PRIME_DIFFERENCE_BITS_SLACK: usize = 2;

/// Generates Paillier key pairs.
///
/// The primes are Blum primes ($p \equiv q \equiv 3 mod 4$) of `key_size / 2` bits, with
/// $gcd(p-1, q-1) = 2$ (so that $\lambda = (p-1)(q-1)/2$ is the Carmichael function of $N$), a
/// large difference $|p - q|$, and a product of exactly `key_size` bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyGenerator {
    key_size: usize,
    table_density: usize,
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self {
            key_size: DEFAULT_KEY_SIZE,
            table_density: DEFAULT_TABLE_DENSITY,
        }
    }
}

impl KeyGenerator {
    /// Fails with [`Error::InvalidKeySize`] unless `key_size` is even and within
    /// [[`MINIMUM_KEY_SIZE`], [`MAXIMUM_KEY_SIZE`]].
    pub fn new(key_size: usize) -> Result<Self> {
        if key_size % 2 != 0 || !(MINIMUM_KEY_SIZE..=MAXIMUM_KEY_SIZE).contains(&key_size) {
            return Err(Error::InvalidKeySize(key_size));
        }

        Ok(Self {
            key_size,
            ..Self::default()
        })
    }

    /// Sets the density of the base table of generated public keys, see
    /// [`PublicKey::with_table_density`].
    ///
    /// Fails with [`Error::InvalidTableDensity`] unless `table_density` is within
    /// `[1, BaseTable::MAXIMUM_WINDOW_BITS]`, before any prime is searched for.
    pub fn with_table_density(self, table_density: usize) -> Result<Self> {
        if !(1..=BaseTable::<MODULUS_SQUARE_LIMBS>::MAXIMUM_WINDOW_BITS).contains(&table_density) {
            return Err(Error::InvalidTableDensity(table_density));
        }

        Ok(Self {
            table_density,
            ..self
        })
    }

    pub fn key_size(&self) -> usize {
        self.key_size
    }

    pub fn table_density(&self) -> usize {
        self.table_density
    }

    pub fn generate(&self, rng: &mut impl CryptoRngCore) -> Result<(PublicKey, SecretKey)> {
        let (p, q) = self.generate_primes(rng)?;
        let x = Self::sample_unit(&mul_wide(&p, &q), rng)?;

        let (public_key, secret_key) = Self::key_pair_from_primes(p, q, x, self.table_density)?;
        debug!("generated a {}-bit Paillier key pair", public_key.key_size());

        Ok((public_key, secret_key))
    }

    /// Derives the key pair of `p` and `q`, with the randomizer base $h_s = (-x^2)^N mod N^2$.
    ///
    /// `x` must be coprime to $N$.
    pub(crate) fn key_pair_from_primes(
        p: LargePrimeSizedNumber,
        q: LargePrimeSizedNumber,
        x: LargeBiPrimeSizedNumber,
        table_density: usize,
    ) -> Result<(PublicKey, SecretKey)> {
        let secret_key = SecretKey::new(p, q)?;
        let n = *secret_key.n();

        let n_space = MontgomerySpace::new(&n)?;
        let h = n_space.map_back_to_z_space(&-n_space.map_into_space(&x).square());
        let h_s = secret_key.pow_mod_n_square_crt(&widen(&h), &n);

        let public_key = PublicKey::with_table_density(n, h_s, table_density)?;

        Ok((public_key, secret_key))
    }

    fn generate_primes(
        &self,
        rng: &mut impl CryptoRngCore,
    ) -> Result<(LargePrimeSizedNumber, LargePrimeSizedNumber)> {
        let prime_bits = self.key_size / 2;
        let minimum_difference_bits = prime_bits - PRIME_DIFFERENCE_BITS_SLACK;

        for attempt in 1..=MAXIMUM_KEY_GENERATION_ATTEMPTS {
            let p = Self::blum_prime(prime_bits, rng)?;

            let mut q = None;
            for _ in 0..MAXIMUM_KEY_GENERATION_ATTEMPTS {
                let candidate = Self::blum_prime(prime_bits, rng)?;
                if Self::are_compatible(&p, &candidate, minimum_difference_bits) {
                    q = Some(candidate);
                    break;
                }

                trace!("rejected an incompatible prime pair");
            }

            let Some(q) = q else {
                continue;
            };

            // The product of two `k`-bit numbers may be one bit short of `2k`.
            if mul_wide(&p, &q).bits_vartime() == self.key_size {
                debug!(
                    "found a pair of {}-bit primes after {} attempts",
                    prime_bits, attempt
                );

                return Ok((p, q));
            }

            trace!("rejected a prime pair with a short product");
        }

        Err(Error::KeyGenerationExhausted(
            MAXIMUM_KEY_GENERATION_ATTEMPTS,
        ))
    }

    fn blum_prime(
        bits: usize,
        rng: &mut impl CryptoRngCore,
    ) -> Result<LargePrimeSizedNumber> {
        for _ in 0..MAXIMUM_KEY_GENERATION_ATTEMPTS {
            let prime: LargePrimeSizedNumber = generate_prime_with_rng(rng, Some(bits));
            if prime.as_words()[0] & 3 == 3 {
                return Ok(prime);
            }
        }

        Err(Error::KeyGenerationExhausted(
            MAXIMUM_KEY_GENERATION_ATTEMPTS,
        ))
    }

    /// Whether the Blum primes `p` and `q` satisfy $gcd(p-1, q-1) = 2$ and are far enough apart.
    fn are_compatible(
        p: &LargePrimeSizedNumber,
        q: &LargePrimeSizedNumber,
        minimum_difference_bits: usize,
    ) -> bool {
        let difference = if p > q {
            p.wrapping_sub(q)
        } else {
            q.wrapping_sub(p)
        };
        if difference.bits_vartime() < minimum_difference_bits {
            return false;
        }

        // $(p-1)/2$ and $(q-1)/2$ are odd for Blum primes, so $gcd(p-1, q-1) = 2$ exactly when
        // they are coprime, i.e. when one is invertible modulo the other.
        let (p_half, q_half) = (p.shr_vartime(1), q.shr_vartime(1));

        MontgomerySpace::new(&q_half)
            .ok()
            .and_then(|space| space.invert(&space.map_into_space(&p_half)))
            .is_some()
    }

    /// Samples a uniformly random unit modulo `n`.
    fn sample_unit(
        n: &LargeBiPrimeSizedNumber,
        rng: &mut impl CryptoRngCore,
    ) -> Result<LargeBiPrimeSizedNumber> {
        let space = MontgomerySpace::new(n)?;
        let modulus: Option<_> = NonZero::new(*n).into();
        let modulus = modulus.ok_or(Error::InvalidModulus)?;

        // Classic rejection-sampling technique.
        for _ in 0..MAXIMUM_KEY_GENERATION_ATTEMPTS {
            let x = LargeBiPrimeSizedNumber::random_mod(rng, &modulus);
            if space.invert(&space.map_into_space(&x)).is_some() {
                return Ok(x);
            }
        }

        Err(Error::KeyGenerationExhausted(
            MAXIMUM_KEY_GENERATION_ATTEMPTS,
        ))
    }
}

#[cfg(test)]
mod tests {
    use rand_core::{CryptoRng, OsRng, RngCore};
    use rstest::rstest;

    use super::*;
    use crate::paillier::{Decryptor, Encryptor};
    use crate::test_exports::{N_512, P_512, Q_512, TEST_TABLE_DENSITY};
    use crate::Plaintext;

    #[rstest]
    #[case::odd(1023)]
    #[case::too_small(128)]
    #[case::too_large(4096)]
    #[case::zero(0)]
    fn rejects_invalid_key_sizes(#[case] key_size: usize) {
        assert_eq!(
            KeyGenerator::new(key_size),
            Err(Error::InvalidKeySize(key_size))
        );
    }

    #[rstest]
    #[case::zero(0)]
    #[case::too_wide(17)]
    fn rejects_invalid_table_densities(#[case] table_density: usize) {
        let generator = KeyGenerator::new(MINIMUM_KEY_SIZE).unwrap();

        assert_eq!(
            generator.with_table_density(table_density),
            Err(Error::InvalidTableDensity(table_density))
        );
        assert_eq!(
            generator
                .with_table_density(BaseTable::<MODULUS_SQUARE_LIMBS>::MAXIMUM_WINDOW_BITS)
                .map(|generator| generator.table_density()),
            Ok(16)
        );
    }

    #[test]
    fn defaults_to_full_size_keys() {
        let generator = KeyGenerator::default();

        assert_eq!(generator.key_size(), DEFAULT_KEY_SIZE);
        assert_eq!(generator.table_density(), DEFAULT_TABLE_DENSITY);
        assert_eq!(KeyGenerator::new(DEFAULT_KEY_SIZE).unwrap(), generator);
    }

    #[test]
    fn generates_working_key_pairs() {
        let _ = env_logger::builder().is_test(true).try_init();

        let generator = KeyGenerator::new(MINIMUM_KEY_SIZE)
            .unwrap()
            .with_table_density(TEST_TABLE_DENSITY)
            .unwrap();
        let (public_key, secret_key) = generator.generate(&mut OsRng).unwrap();

        assert_eq!(public_key.key_size(), MINIMUM_KEY_SIZE);
        assert_eq!(public_key.table_density(), TEST_TABLE_DENSITY);
        assert_eq!(secret_key.n(), public_key.n());
        for prime in [secret_key.p(), secret_key.q()] {
            assert_eq!(prime.bits_vartime(), MINIMUM_KEY_SIZE / 2);
            assert_eq!(prime.as_words()[0] & 3, 3);
        }
        assert!(KeyGenerator::are_compatible(
            secret_key.p(),
            secret_key.q(),
            MINIMUM_KEY_SIZE / 2 - PRIME_DIFFERENCE_BITS_SLACK
        ));

        let plaintext = Plaintext::from(-12345i64);
        let ciphertext = Encryptor::new(&public_key)
            .encrypt(&plaintext, &mut OsRng)
            .unwrap();
        assert_eq!(
            Decryptor::new(&public_key, &secret_key)
                .unwrap()
                .decrypt(&ciphertext)
                .unwrap(),
            plaintext
        );
    }

    #[test]
    fn derives_key_pairs_from_primes() {
        let x = LargeBiPrimeSizedNumber::from(3u64);

        let (public_key, secret_key) =
            KeyGenerator::key_pair_from_primes(P_512, Q_512, x, TEST_TABLE_DENSITY).unwrap();

        assert_eq!(public_key.n(), &N_512);
        assert_eq!(secret_key, SecretKey::new(P_512, Q_512).unwrap());

        // $h_s$ is an $N$-th residue, so it encrypts zero.
        let decryptor = Decryptor::new(&public_key, &secret_key).unwrap();
        assert_eq!(
            decryptor
                .decrypt(&crate::paillier::Ciphertext::from(
                    public_key.space().map_into_space(public_key.h_s())
                ))
                .unwrap(),
            Plaintext::ZERO
        );
    }

    #[test]
    fn rejects_close_or_related_primes() {
        assert!(KeyGenerator::are_compatible(&P_512, &Q_512, 254));
        assert!(!KeyGenerator::are_compatible(&P_512, &P_512, 254));
        // 7 and 11: $gcd(6, 10) = 2$; 7 and 19: $gcd(6, 18) = 6$.
        let seven = LargePrimeSizedNumber::from(7u64);
        assert!(KeyGenerator::are_compatible(
            &seven,
            &LargePrimeSizedNumber::from(11u64),
            1
        ));
        assert!(!KeyGenerator::are_compatible(
            &seven,
            &LargePrimeSizedNumber::from(19u64),
            1
        ));
    }

    /// A generator that only ever yields zero bytes.
    struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
            dest.fill(0);

            Ok(())
        }
    }

    impl CryptoRng for ZeroRng {}

    #[test]
    fn gives_up_sampling_after_too_many_attempts() {
        // Zero is never a unit, so every draw is rejected.
        assert_eq!(
            KeyGenerator::sample_unit(&N_512, &mut ZeroRng),
            Err(Error::KeyGenerationExhausted(
                MAXIMUM_KEY_GENERATION_ATTEMPTS
            ))
        );
    }

    #[test]
    fn samples_units() {
        let unit = KeyGenerator::sample_unit(&N_512, &mut OsRng).unwrap();
        let space = MontgomerySpace::new(&N_512).unwrap();

        assert!(unit < N_512);
        assert!(space.invert(&space.map_into_space(&unit)).is_some());
    }
}
