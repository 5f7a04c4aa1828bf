// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use std::fmt;
use std::sync::Arc;

use crypto_bigint::rand_core::CryptoRngCore;
use crypto_bigint::{Limb, NonZero, Random};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::montgomery::{BaseTable, MontgomerySpace};
use crate::paillier::Ciphertext;
use crate::{
    mul_wide, to_hex_string, Error, LargeBiPrimeSizedNumber, LargePrimeSizedNumber,
    PaillierModulusSizedNumber, PaillierRingElement, Plaintext, Result, DEFAULT_TABLE_DENSITY,
    MINIMUM_KEY_SIZE, MODULUS_SQUARE_LIMBS,
};

/// A Paillier public key: the modulus $N$ and the randomizer base $h_s$.
///
/// Everything else ($N^2$, the sign threshold $N/2$, the Montgomery space and the base table of
/// $h_s$) is derived on construction, so `(n, h_s)` is all that is ever serialized.
#[derive(Clone, Debug)]
pub struct PublicKey {
    n: NonZero<LargeBiPrimeSizedNumber>,
    h_s: PaillierModulusSizedNumber,
    n_square: PaillierModulusSizedNumber,
    n_half: LargeBiPrimeSizedNumber,
    key_size: usize,
    space: MontgomerySpace<MODULUS_SQUARE_LIMBS>,
    // Built once per key; clones share it.
    table: Arc<BaseTable<MODULUS_SQUARE_LIMBS>>,
}

impl PublicKey {
    pub fn new(n: LargeBiPrimeSizedNumber, h_s: PaillierModulusSizedNumber) -> Result<Self> {
        Self::with_table_density(n, h_s, DEFAULT_TABLE_DENSITY)
    }

    /// Instantiates the key with a base table consuming `table_density` exponent bits per lookup.
    ///
    /// The density trades memory for encryption speed, and is a purely local choice: it does not
    /// affect ciphertexts, equality or serialization.
    pub fn with_table_density(
        n: LargeBiPrimeSizedNumber,
        h_s: PaillierModulusSizedNumber,
        table_density: usize,
    ) -> Result<Self> {
        let key_size = n.bits_vartime();
        if key_size < MINIMUM_KEY_SIZE {
            return Err(Error::InvalidKeySize(key_size));
        }

        let n_square = mul_wide(&n, &n);
        let space = MontgomerySpace::new(&n_square)?;
        if !space.contains(&h_s) {
            return Err(Error::MalformedCiphertext(
                "the randomizer base h_s is not below N^2".to_string(),
            ));
        }

        // Randomizer exponents are `key_size / 2` bits long.
        let max_exponent_bits = (key_size / 2 + Limb::BITS - 1) / Limb::BITS * Limb::BITS;
        let table = BaseTable::new(space, &h_s, table_density, max_exponent_bits)?;

        let n_half = n.shr_vartime(1);
        let n: Option<_> = NonZero::new(n).into();
        let n = n.ok_or(Error::InvalidModulus)?;

        Ok(Self {
            n,
            h_s,
            n_square,
            n_half,
            key_size,
            space,
            table: Arc::new(table),
        })
    }

    pub fn n(&self) -> &LargeBiPrimeSizedNumber {
        &self.n
    }

    pub fn h_s(&self) -> &PaillierModulusSizedNumber {
        &self.h_s
    }

    pub fn n_square(&self) -> &PaillierModulusSizedNumber {
        &self.n_square
    }

    /// $\lfloor N/2 \rfloor$; decrypted residues above it are negative.
    pub fn n_half(&self) -> &LargeBiPrimeSizedNumber {
        &self.n_half
    }

    /// The bit length of $N$.
    pub fn key_size(&self) -> usize {
        self.key_size
    }

    pub fn table_density(&self) -> usize {
        self.table.window_bits()
    }

    /// Plaintexts must be strictly smaller than this in absolute value.
    pub fn plaintext_bound(&self) -> Plaintext {
        Plaintext::from(self.n_half)
    }

    pub(crate) fn space(&self) -> &MontgomerySpace<MODULUS_SQUARE_LIMBS> {
        &self.space
    }

    pub(crate) fn validate_plaintext(&self, plaintext: &Plaintext) -> Result<()> {
        if plaintext.magnitude() >= &self.n_half {
            return Err(Error::PlaintextOutOfRange {
                plaintext: plaintext.to_string(),
                bound: to_hex_string(&self.n_half),
            });
        }

        Ok(())
    }

    /// Checks that `ciphertext` lies in $[0, N^2)$ and lifts it into the ciphertext space.
    pub(crate) fn ciphertext_element(&self, ciphertext: &Ciphertext) -> Result<PaillierRingElement> {
        if !self.space.contains(ciphertext.value()) {
            return Err(Error::MalformedCiphertext(
                "ciphertext is not below N^2".to_string(),
            ));
        }

        Ok(self.space.from_montgomery(*ciphertext.value()))
    }

    /// Computes $g^m$ for $g = N + 1$ without exponentiating.
    pub(crate) fn encode(&self, plaintext: &Plaintext) -> PaillierRingElement {
        let residue = plaintext.to_residue(&self.n);

        // $(1 + N)^m = 1 + N \cdot m mod N^2$, and $N \cdot m + 1 < N^2$ for $m < N$.
        let g_to_m = mul_wide(self.n(), &residue).wrapping_add(&PaillierModulusSizedNumber::ONE);

        self.space.map_into_space(&g_to_m)
    }

    /// Samples the exponent $r$ of a randomizer $h_s^r$: `key_size / 2` uniformly random bits.
    pub(crate) fn random_exponent(&self, rng: &mut impl CryptoRngCore) -> LargePrimeSizedNumber {
        LargePrimeSizedNumber::random(rng)
            .shr_vartime(LargePrimeSizedNumber::BITS - self.key_size / 2)
    }

    /// Computes $h_s^{exponent}$ through the base table.
    pub(crate) fn randomizer(&self, exponent: &LargePrimeSizedNumber) -> Result<PaillierRingElement> {
        self.table.pow_mod(exponent)
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        *self.n == *other.n && self.h_s == other.h_s
    }
}

impl Eq for PublicKey {}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Paillier public key: n={}[{}bits], h_s={}, max_plaintext={}[~{}bits]",
            to_hex_string(&*self.n),
            self.key_size,
            to_hex_string(&self.h_s),
            to_hex_string(&self.n_half),
            self.n_half.bits_vartime()
        )
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (*self.n, self.h_s).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (n, h_s) =
            <(LargeBiPrimeSizedNumber, PaillierModulusSizedNumber)>::deserialize(deserializer)?;

        PublicKey::new(n, h_s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;
    use rstest::rstest;

    use super::*;
    use crate::test_exports::{key_pair_512, N_512, TEST_TABLE_DENSITY};
    use crate::widen;

    #[test]
    fn derives_public_values() {
        let (public_key, _) = key_pair_512();

        assert_eq!(public_key.n(), &N_512);
        assert_eq!(public_key.key_size(), 512);
        assert_eq!(public_key.n_square(), &mul_wide(&N_512, &N_512));
        assert_eq!(public_key.n_half(), &N_512.shr_vartime(1));
        assert_eq!(public_key.table_density(), TEST_TABLE_DENSITY);
        assert_eq!(
            public_key.plaintext_bound(),
            Plaintext::from(N_512.shr_vartime(1))
        );
    }

    #[test]
    fn summarizes_public_values() {
        let (public_key, _) = key_pair_512();
        let summary = public_key.to_string();

        assert!(summary.starts_with(&format!(
            "Paillier public key: n={}[512bits], h_s=",
            to_hex_string(&N_512)
        )));
        assert!(summary.ends_with("[~511bits]"));
    }

    #[test]
    fn serializes_only_the_modulus_and_randomizer_base() {
        let (public_key, _) = key_pair_512();

        let serialized = serde_json::to_string(&public_key).unwrap();
        let deserialized: PublicKey = serde_json::from_str(&serialized).unwrap();

        assert_eq!(deserialized, public_key);
        assert_eq!(deserialized.n_square(), public_key.n_square());
        assert_eq!(deserialized.n_half(), public_key.n_half());
        // The table density is local and falls back to the default.
        assert_eq!(deserialized.table_density(), DEFAULT_TABLE_DENSITY);
        assert_eq!(
            serde_json::to_string(&(public_key.n(), public_key.h_s())).unwrap(),
            serialized
        );
    }

    #[test]
    fn equality_ignores_table_density() {
        let (public_key, _) = key_pair_512();

        let denser = PublicKey::with_table_density(
            *public_key.n(),
            *public_key.h_s(),
            TEST_TABLE_DENSITY + 2,
        )
        .unwrap();

        assert_eq!(denser, public_key);
        assert_ne!(denser.table_density(), public_key.table_density());
    }

    #[rstest]
    #[case::even(N_512.wrapping_add(&LargeBiPrimeSizedNumber::ONE), Error::InvalidModulus)]
    #[case::too_small(LargeBiPrimeSizedNumber::from(0xFFFF_FFFFu64), Error::InvalidKeySize(32))]
    fn rejects_invalid_moduli(#[case] n: LargeBiPrimeSizedNumber, #[case] error: Error) {
        assert_eq!(
            PublicKey::new(n, PaillierModulusSizedNumber::from(4u64)),
            Err(error)
        );
    }

    #[test]
    fn rejects_randomizer_base_outside_the_ciphertext_space() {
        let n_square = mul_wide(&N_512, &N_512);

        assert!(matches!(
            PublicKey::new(N_512, n_square),
            Err(Error::MalformedCiphertext(_))
        ));
    }

    #[test]
    fn bounds_plaintexts_strictly_below_half_the_modulus() {
        let (public_key, _) = key_pair_512();
        let bound = public_key.plaintext_bound();
        let largest = bound.checked_sub(&Plaintext::from(1i64)).unwrap();

        assert_eq!(public_key.validate_plaintext(&largest), Ok(()));
        assert_eq!(public_key.validate_plaintext(&-largest), Ok(()));

        for out_of_range in [bound, -bound, bound.checked_add(&Plaintext::from(1i64)).unwrap()] {
            assert_eq!(
                public_key.validate_plaintext(&out_of_range),
                Err(Error::PlaintextOutOfRange {
                    plaintext: out_of_range.to_string(),
                    bound: to_hex_string(public_key.n_half()),
                })
            );
        }
    }

    #[test]
    fn encodes_plaintexts_as_powers_of_the_generator() {
        let (public_key, _) = key_pair_512();
        let space = public_key.space();
        let generator =
            space.map_into_space(&widen(&N_512).wrapping_add(&PaillierModulusSizedNumber::ONE));

        for value in [0i64, 1, 12345, -1, -12345] {
            let plaintext = Plaintext::from(value);
            let expected = if value < 0 {
                space
                    .invert(&generator.pow(&LargeBiPrimeSizedNumber::from(value.unsigned_abs())))
                    .unwrap()
            } else {
                generator.pow(&LargeBiPrimeSizedNumber::from(value.unsigned_abs()))
            };

            assert_eq!(public_key.encode(&plaintext), expected, "encoding {value}");
        }
    }

    #[test]
    fn draws_randomizers_of_half_the_key_size() {
        let (public_key, _) = key_pair_512();

        let exponent = public_key.random_exponent(&mut OsRng);
        assert!(exponent.bits_vartime() <= 256);

        assert_eq!(
            public_key.randomizer(&exponent).unwrap(),
            public_key
                .space()
                .map_into_space(public_key.h_s())
                .pow(&exponent)
        );
    }
}
