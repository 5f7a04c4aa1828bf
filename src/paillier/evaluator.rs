// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use crypto_bigint::rand_core::CryptoRngCore;

use crate::paillier::{Ciphertext, Encryptor, PublicKey, ScaledCiphertext, UnrandomizedCiphertext};
use crate::{Error, LargeBiPrimeSizedNumber, Plaintext, Result};

/// Homomorphic arithmetic on ciphertexts of a [`PublicKey`].
///
/// Every operand is range-checked before use; operations on plaintexts check them against the
/// plaintext bound, except for the scalar of [`Evaluator::mul`].
#[derive(Clone, Copy, Debug)]
pub struct Evaluator<'a> {
    public_key: &'a PublicKey,
    encryptor: Encryptor<'a>,
}

impl<'a> Evaluator<'a> {
    pub fn new(public_key: &'a PublicKey) -> Self {
        Self {
            public_key,
            encryptor: Encryptor::new(public_key),
        }
    }

    /// The encryptor used to draw randomizers.
    pub fn encryptor(&self) -> &Encryptor<'a> {
        &self.encryptor
    }

    /// $Enc(a + b) = Enc(a) \cdot Enc(b)$
    pub fn add(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Result<Ciphertext> {
        let lhs = self.public_key.ciphertext_element(lhs)?;
        let rhs = self.public_key.ciphertext_element(rhs)?;

        Ok(Ciphertext::from(lhs * rhs))
    }

    /// $Enc(a + p) = Enc(a) \cdot g^p$
    pub fn add_plaintext(
        &self,
        ciphertext: &Ciphertext,
        plaintext: &Plaintext,
    ) -> Result<Ciphertext> {
        let element = self.public_key.ciphertext_element(ciphertext)?;
        self.public_key.validate_plaintext(plaintext)?;

        Ok(Ciphertext::from(element * self.public_key.encode(plaintext)))
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

    /// $Enc(p - a)$
    pub fn plaintext_sub(
        &self,
        plaintext: &Plaintext,
        ciphertext: &Ciphertext,
    ) -> Result<Ciphertext> {
        self.public_key.validate_plaintext(plaintext)?;

        self.add_plaintext(&self.negate(ciphertext)?, plaintext)
    }

    /// $Enc(-a) = Enc(a)^{-1}$
    pub fn negate(&self, ciphertext: &Ciphertext) -> Result<Ciphertext> {
        let element = self.public_key.ciphertext_element(ciphertext)?;

        self.public_key
            .space()
            .invert(&element)
            .map(Ciphertext::from)
            .ok_or_else(|| {
                Error::MalformedCiphertext("ciphertext is not a unit modulo N^2".to_string())
            })
    }

    /// $Enc(a \cdot k) = Enc(a)^k$, for any scalar `k`.
    ///
    /// Multiplying by zero yields the trivial encryption of zero, which gives the scalar away;
    /// it is returned as [`ScaledCiphertext::Unrandomized`] and must go through
    /// [`Evaluator::finalize`] before leaving this party. Multiplying by one returns the ciphertext
    /// as is.
    pub fn mul(&self, ciphertext: &Ciphertext, scalar: &Plaintext) -> Result<ScaledCiphertext> {
        let element = self.public_key.ciphertext_element(ciphertext)?;

        if scalar.is_zero() {
            return Ok(ScaledCiphertext::Unrandomized(UnrandomizedCiphertext::new(
                Ciphertext::from(self.public_key.space().identity()),
            )));
        }

        if *scalar.magnitude() == LargeBiPrimeSizedNumber::ONE {
            return Ok(ScaledCiphertext::Transmittable(if scalar.is_negative() {
                self.negate(ciphertext)?
            } else {
                *ciphertext
            }));
        }

        let power = element.pow_bounded_exp(scalar.magnitude(), scalar.bits());
        let power = Ciphertext::from(power);

        Ok(ScaledCiphertext::Transmittable(if scalar.is_negative() {
            self.negate(&power)?
        } else {
            power
        }))
    }

    /// Multiplies in a fresh randomizer; the result decrypts to the same plaintext.
    pub fn randomize(
        &self,
        ciphertext: &Ciphertext,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Ciphertext> {
        let element = self.public_key.ciphertext_element(ciphertext)?;

        Ok(Ciphertext::from(element * self.encryptor.random_rn(rng)?))
    }

    pub fn randomize_unrandomized(
        &self,
        unrandomized: &UnrandomizedCiphertext,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Ciphertext> {
        self.randomize(unrandomized.intermediate(), rng)
    }

    /// Turns the result of [`Evaluator::mul`] into a ciphertext that is safe to send.
    pub fn finalize(
        &self,
        scaled: ScaledCiphertext,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Ciphertext> {
        match scaled {
            ScaledCiphertext::Transmittable(ciphertext) => Ok(ciphertext),
            ScaledCiphertext::Unrandomized(unrandomized) => {
                self.randomize_unrandomized(&unrandomized, rng)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;
    use rstest::rstest;

    use super::*;
    use crate::paillier::{Decryptor, SecretKey};
    use crate::test_exports::{key_pair_2048, key_pair_512};
    use crate::PaillierModulusSizedNumber;

    struct Fixture {
        public_key: PublicKey,
        secret_key: SecretKey,
    }

    impl Fixture {
        fn new() -> Self {
            let (public_key, secret_key) = key_pair_512();

            Self {
                public_key,
                secret_key,
            }
        }

        fn encrypt(&self, value: i64) -> Ciphertext {
            Encryptor::new(&self.public_key)
                .encrypt(&Plaintext::from(value), &mut OsRng)
                .unwrap()
        }

        fn decrypt(&self, ciphertext: &Ciphertext) -> Plaintext {
            Decryptor::new(&self.public_key, &self.secret_key)
                .unwrap()
                .decrypt(ciphertext)
                .unwrap()
        }

        fn evaluator(&self) -> Evaluator<'_> {
            Evaluator::new(&self.public_key)
        }
    }

    #[rstest]
    #[case(-12345, -12345)]
    #[case(123, -12345)]
    #[case(0, 0)]
    #[case(-1, 1)]
    fn adds_and_subtracts(#[case] lhs: i64, #[case] rhs: i64) {
        let fixture = Fixture::new();
        let evaluator = fixture.evaluator();
        let (lhs_ciphertext, rhs_ciphertext) = (fixture.encrypt(lhs), fixture.encrypt(rhs));

        let sum = evaluator.add(&lhs_ciphertext, &rhs_ciphertext).unwrap();
        assert_eq!(fixture.decrypt(&sum), Plaintext::from(lhs + rhs));

        let difference = evaluator.sub(&lhs_ciphertext, &rhs_ciphertext).unwrap();
        assert_eq!(fixture.decrypt(&difference), Plaintext::from(lhs - rhs));

        let rhs_plaintext = Plaintext::from(rhs);
        let sum = evaluator
            .add_plaintext(&lhs_ciphertext, &rhs_plaintext)
            .unwrap();
        assert_eq!(fixture.decrypt(&sum), Plaintext::from(lhs + rhs));

        let difference = evaluator
            .sub_plaintext(&lhs_ciphertext, &rhs_plaintext)
            .unwrap();
        assert_eq!(fixture.decrypt(&difference), Plaintext::from(lhs - rhs));

        let difference = evaluator
            .plaintext_sub(&Plaintext::from(lhs), &rhs_ciphertext)
            .unwrap();
        assert_eq!(fixture.decrypt(&difference), Plaintext::from(lhs - rhs));
    }

    #[rstest]
    #[case(0)]
    #[case(42)]
    #[case(-42)]
    fn negates(#[case] value: i64) {
        let fixture = Fixture::new();

        let negated = fixture.evaluator().negate(&fixture.encrypt(value)).unwrap();

        assert_eq!(fixture.decrypt(&negated), Plaintext::from(-value));
    }

    #[rstest]
    #[case(123, 2)]
    #[case(123, -2)]
    #[case(-12345, 3)]
    #[case(-12345, -1000)]
    #[case(7, 1)]
    #[case(7, -1)]
    fn multiplies_by_scalars(#[case] value: i64, #[case] scalar: i64) {
        let fixture = Fixture::new();

        let product = fixture
            .evaluator()
            .mul(&fixture.encrypt(value), &Plaintext::from(scalar))
            .unwrap();

        assert!(product.is_transmittable());
        assert_eq!(
            fixture.decrypt(product.intermediate()),
            Plaintext::from(value * scalar)
        );
    }

    #[test]
    fn multiplying_by_one_is_the_identity() {
        let fixture = Fixture::new();
        let ciphertext = fixture.encrypt(99);

        let product = fixture
            .evaluator()
            .mul(&ciphertext, &Plaintext::from(1i64))
            .unwrap();

        assert_eq!(product, ScaledCiphertext::Transmittable(ciphertext));
    }

    #[test]
    fn multiplying_by_zero_must_be_randomized() {
        let fixture = Fixture::new();
        let evaluator = fixture.evaluator();

        let product = evaluator
            .mul(&fixture.encrypt(99), &Plaintext::ZERO)
            .unwrap();

        assert!(!product.is_transmittable());
        assert_eq!(product.transmittable(), None);
        // Still usable in local arithmetic.
        let sum = evaluator
            .add(product.intermediate(), &fixture.encrypt(5))
            .unwrap();
        assert_eq!(fixture.decrypt(&sum), Plaintext::from(5i64));

        let finalized = evaluator.finalize(product, &mut OsRng).unwrap();
        assert_ne!(&finalized, product.intermediate());
        assert_eq!(fixture.decrypt(&finalized), Plaintext::ZERO);
    }

    #[test]
    fn finalizing_leaves_transmittable_ciphertexts_alone() {
        let fixture = Fixture::new();
        let evaluator = fixture.evaluator();

        let product = evaluator
            .mul(&fixture.encrypt(4), &Plaintext::from(2i64))
            .unwrap();

        assert_eq!(
            evaluator.finalize(product, &mut OsRng).unwrap(),
            *product.intermediate()
        );
    }

    #[test]
    fn randomizing_preserves_the_plaintext() {
        let fixture = Fixture::new();
        let ciphertext = fixture.encrypt(-12345);

        let randomized = fixture
            .evaluator()
            .randomize(&ciphertext, &mut OsRng)
            .unwrap();

        assert_ne!(randomized, ciphertext);
        assert_eq!(fixture.decrypt(&randomized), Plaintext::from(-12345i64));
    }

    #[test]
    fn rejects_malformed_operands() {
        let fixture = Fixture::new();
        let evaluator = fixture.evaluator();
        let valid = fixture.encrypt(1);
        let malformed = Ciphertext::new(*fixture.public_key.n_square());

        let results = [
            evaluator.add(&valid, &malformed),
            evaluator.add(&malformed, &valid),
            evaluator.sub(&malformed, &valid),
            evaluator.sub(&valid, &malformed),
            evaluator.add_plaintext(&malformed, &Plaintext::ZERO),
            evaluator.plaintext_sub(&Plaintext::ZERO, &malformed),
            evaluator.negate(&malformed),
            evaluator.randomize(&malformed, &mut OsRng),
            evaluator
                .mul(&malformed, &Plaintext::ZERO)
                .map(|product| *product.intermediate()),
        ];

        for result in results {
            assert!(matches!(result, Err(Error::MalformedCiphertext(_))));
        }

        let zero = Ciphertext::new(PaillierModulusSizedNumber::ZERO);
        assert!(matches!(
            evaluator.negate(&zero),
            Err(Error::MalformedCiphertext(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_plaintext_operands() {
        let fixture = Fixture::new();
        let evaluator = fixture.evaluator();
        let ciphertext = fixture.encrypt(1);
        let bound = fixture.public_key.plaintext_bound();

        assert!(matches!(
            evaluator.add_plaintext(&ciphertext, &bound),
            Err(Error::PlaintextOutOfRange { .. })
        ));
        assert!(matches!(
            evaluator.sub_plaintext(&ciphertext, &bound),
            Err(Error::PlaintextOutOfRange { .. })
        ));
        assert!(matches!(
            evaluator.plaintext_sub(&-bound, &ciphertext),
            Err(Error::PlaintextOutOfRange { .. })
        ));
    }

    #[test]
    fn evaluates_the_reference_scenario_under_a_full_size_key() {
        let (public_key, secret_key) = key_pair_2048();
        let encryptor = Encryptor::new(&public_key);
        let evaluator = Evaluator::new(&public_key);
        let decryptor = Decryptor::new(&public_key, &secret_key).unwrap();

        let m0 = Plaintext::from(-12345i64);
        let sum = evaluator
            .add(
                &encryptor.encrypt(&m0, &mut OsRng).unwrap(),
                &encryptor.encrypt(&m0, &mut OsRng).unwrap(),
            )
            .unwrap();
        assert_eq!(decryptor.decrypt(&sum).unwrap(), Plaintext::from(-24690i64));

        let product = evaluator
            .mul(
                &encryptor.encrypt(&Plaintext::from(123i64), &mut OsRng).unwrap(),
                &Plaintext::from(-2i64),
            )
            .unwrap();
        let product = evaluator.finalize(product, &mut OsRng).unwrap();
        assert_eq!(decryptor.decrypt(&product).unwrap(), Plaintext::from(-246i64));
    }
}
