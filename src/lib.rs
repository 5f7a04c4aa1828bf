// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use crypto_bigint::modular::runtime_mod::DynResidue;
use crypto_bigint::{Concat, Limb, NonZero, Split, Uint, U1024, U2048};

pub use encoding::{BatchEncoder, BatchSlot, PlainEncoder};
pub use error::{Error, Result};
pub use montgomery::{BaseTable, MontgomerySpace};
pub use plaintext::Plaintext;
pub use scheme::{
    HeKit, HomomorphicDecryptor, HomomorphicEncryptor, HomomorphicEvaluator, SchemeType,
};

#[cfg(feature = "benchmarking")]
criterion::criterion_group!(
    benches,
    montgomery::benchmark_pow_mod,
    paillier::benchmark_key_generation,
    paillier::benchmark_encrypt,
    paillier::benchmark_decrypt,
    paillier::benchmark_evaluate,
);

pub mod encoding;
mod error;
pub mod mock;
pub mod montgomery;
pub mod paillier;
mod plaintext;
pub mod scheme;

/* Types & helpers around `crypto_bigint` for internal use */

/// A number the size of one of the two secret primes `p`, `q`.
pub type LargePrimeSizedNumber = U1024;
/// A number the size of the Paillier modulus `N = pq`.
pub type LargeBiPrimeSizedNumber = <LargePrimeSizedNumber as Concat>::Output;
/// A number the size of the ciphertext modulus `N^2`.
pub type PaillierModulusSizedNumber = <LargeBiPrimeSizedNumber as Concat>::Output;
/// An element of $\mathbb{Z}_{N^2}$, kept in Montgomery form.
pub type PaillierRingElement = DynResidue<{ PaillierModulusSizedNumber::LIMBS }>;

pub(crate) const MODULUS_LIMBS: usize = LargeBiPrimeSizedNumber::LIMBS;
pub(crate) const MODULUS_SQUARE_LIMBS: usize = PaillierModulusSizedNumber::LIMBS;

/// The smallest key size (bit length of `N`) accepted by the key generator.
pub const MINIMUM_KEY_SIZE: usize = 256;
/// The largest key size, bounded by the width of [`LargeBiPrimeSizedNumber`].
pub const MAXIMUM_KEY_SIZE: usize = U2048::BITS;
pub const DEFAULT_KEY_SIZE: usize = 2048;

/// Number of exponent bits consumed per base-table lookup.
///
/// This is a local performance knob: every party may choose its own and it is never transmitted.
pub const DEFAULT_TABLE_DENSITY: usize = 10;

/// Upper bound on the number of candidates tried at each stage of prime-pair generation.
pub const MAXIMUM_KEY_GENERATION_ATTEMPTS: usize = 1000;

/// Multiplies two numbers into a number of double the width.
pub(crate) fn mul_wide<const LIMBS: usize>(
    lhs: &Uint<LIMBS>,
    rhs: &Uint<LIMBS>,
) -> <Uint<LIMBS> as Concat>::Output
where
    Uint<LIMBS>: Concat,
{
    let (lo, hi) = lhs.mul_wide(rhs);

    hi.concat(&lo)
}

/// Zero-extends `value` to double its width.
pub(crate) fn widen<const LIMBS: usize>(value: &Uint<LIMBS>) -> <Uint<LIMBS> as Concat>::Output
where
    Uint<LIMBS>: Concat,
{
    Uint::<LIMBS>::ZERO.concat(value)
}

/// The lower half of `value`; callers make sure the upper half is zero.
pub(crate) fn narrow<const LIMBS: usize>(value: &Uint<LIMBS>) -> <Uint<LIMBS> as Split>::Output
where
    Uint<LIMBS>: Split,
{
    let (_, lo) = value.split();

    lo
}

/// Renders `value` as upper-case hex without leading zeros.
pub(crate) fn to_hex_string<const LIMBS: usize>(value: &Uint<LIMBS>) -> String {
    let padded = format!("{value:X}");
    let trimmed = padded.trim_start_matches('0');

    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Renders `value` in decimal.
pub(crate) fn to_decimal_string<const LIMBS: usize>(value: &Uint<LIMBS>) -> String {
    // The largest power of ten below `2^64`.
    const CHUNK: u64 = 10_000_000_000_000_000_000;

    let chunk: Option<NonZero<Uint<LIMBS>>> = NonZero::new(Uint::<LIMBS>::from_u64(CHUNK)).into();
    let Some(chunk) = chunk else {
        // Too narrow to hold a chunk, so the value fits a `u128`.
        return low_u128(value).to_string();
    };

    // Little-endian base-`CHUNK` digits.
    let mut digits = Vec::new();
    let mut rest = *value;
    while rest != Uint::<LIMBS>::ZERO {
        let (quotient, remainder) = rest.div_rem(&chunk);
        digits.push(low_u128(&remainder));
        rest = quotient;
    }

    match digits.split_last() {
        None => "0".to_string(),
        Some((leading, rest)) => rest
            .iter()
            .rev()
            .fold(leading.to_string(), |rendered, digit| {
                format!("{rendered}{digit:019}")
            }),
    }
}

/// The lowest 128 bits of `value`.
pub(crate) fn low_u128<const LIMBS: usize>(value: &Uint<LIMBS>) -> u128 {
    let words = (u128::BITS as usize / Limb::BITS).min(LIMBS);

    value.as_words()[..words]
        .iter()
        .rev()
        .fold(0u128, |low, word| (low << Limb::BITS) | u128::from(*word))
}

#[cfg(any(test, feature = "test_exports"))]
pub mod test_exports {
    use crate::paillier::{KeyGenerator, PublicKey, SecretKey};
    use crate::{LargeBiPrimeSizedNumber, LargePrimeSizedNumber};

    /// Table density used by the fixtures; small enough to keep debug builds fast.
    pub const TEST_TABLE_DENSITY: usize = 4;

    // A 512-bit key: Blum primes with $gcd(p-1, q-1) = 2$ and a 254-bit $|p-q|$.
    pub const P_512: LargePrimeSizedNumber = LargePrimeSizedNumber::from_be_hex("0000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000009fe51907468636ef111722c430998ed039a43982e45025e05dcb9d193214b82f");
    pub const Q_512: LargePrimeSizedNumber = LargePrimeSizedNumber::from_be_hex("000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000e3d7120070a5dc42235e1cece0934104043f94b973b965e46e31f338860202af");
    pub const N_512: LargeBiPrimeSizedNumber = LargeBiPrimeSizedNumber::from_be_hex("0000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000008e4e79d7dac393921000a917813311bbdeea6f18e275346839b2d66bdbdff5b44c67d557bb597ba8944c6cdde12eaf904606672d1e054ef2322fba776ff84621");

    // A 2048-bit key with the same properties.
    pub const P_2048: LargePrimeSizedNumber = LargePrimeSizedNumber::from_be_hex("d14937d825983b51e87778731446c07fb8a06a053dee347174f668e8ddf465dc20d84581e2f43e32ccfb822c6518fdd382a255909aafa81cf27a2b438460112f69794e528840e2fb2f2e4724cc63e77015386402b45851693b1e0f618a06df3036b16faaac9ef439a107c8ec2594d71e2e9c367ae8f7093e185aad13057b6def");
    pub const Q_2048: LargePrimeSizedNumber = LargePrimeSizedNumber::from_be_hex("ae0a866c08acc22f0bcd55fc1ae062c88b714dd6aaeb5d7bc3dec6880f43625ead7b2a7623d50940476c9e1cc5d52963c3d23f0ee40c97c8308a4ec05e549749d1d13a75780aee7762f7036389d4056ac2e328c70b464028f8922ded84d3808b6c5917b47eff77d35aa9c0ffb5d4019fbbcf2ec9a6b2b9c882776dfdc35d8c1f");
    pub const N_2048: LargeBiPrimeSizedNumber = LargeBiPrimeSizedNumber::from_be_hex("8e485eb5bd3528d1c1494367a137143406e77450870343d7cd8c5444e26d5248e4b0927a635da9f25fda7dd0278e30d7d72426e45047a0ab7e86fd360ff7cf3ef4dcb3da34196e490a547ffe84d13267c9bca90ea810c438ddf9bf05636eae6482ad7e8ed4434d537954815cc5faa4095318a22bcadd465dcf360846e0779467144994872dfcce8768589fe65680a651f8317ce9e75b6eebe064851dd3f3b6acac56e29411d258db610b1332895aeea11da97d1c0465e2186f086ac1d07974c46589d4bb1dcab7025ed91e1a4c481f3686b81f68bfa9f1544bdc79f5f36df9529e60db563f1298195dfaf8e3c87c556febbca06da60ff7aa579ac71426e403f1");

    // The seed $x$ of the generator $h = -x^2 mod N$; any small prime is coprime to both keys.
    const GENERATOR_SEED: u64 = 3;

    pub fn key_pair_512() -> (PublicKey, SecretKey) {
        key_pair(P_512, Q_512)
    }

    pub fn key_pair_2048() -> (PublicKey, SecretKey) {
        key_pair(P_2048, Q_2048)
    }

    pub fn key_pair(p: LargePrimeSizedNumber, q: LargePrimeSizedNumber) -> (PublicKey, SecretKey) {
        KeyGenerator::key_pair_from_primes(
            p,
            q,
            LargeBiPrimeSizedNumber::from(GENERATOR_SEED),
            TEST_TABLE_DENSITY,
        )
        .unwrap()
    }
}
