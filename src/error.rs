// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use crate::scheme::SchemeType;

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum Error {
    #[error("invalid key size {0}: must be even and within [{min}, {max}]", min = crate::MINIMUM_KEY_SIZE, max = crate::MAXIMUM_KEY_SIZE)]
    InvalidKeySize(usize),
    #[error("plaintext {plaintext} is out of range: its absolute value must be below {bound}")]
    PlaintextOutOfRange { plaintext: String, bound: String },
    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),
    #[error("the secret key does not match the public key")]
    KeyMismatch,
    #[error("exponent of {exponent_bits} bits exceeds the table's maximum of {max_exponent_bits} bits")]
    ExponentTooWide {
        exponent_bits: usize,
        max_exponent_bits: usize,
    },
    #[error("invalid table parameters: window of {window_bits} bits over exponents of {max_exponent_bits} bits")]
    InvalidTableParameters {
        window_bits: usize,
        max_exponent_bits: usize,
    },
    #[error("invalid table density {0}: must be within [1, {max}]", max = crate::BaseTable::<1>::MAXIMUM_WINDOW_BITS)]
    InvalidTableDensity(usize),
    #[error("the modulus must be odd and greater than one")]
    InvalidModulus,
    #[error("the supplied primes do not form a valid Paillier key")]
    InvalidPrimes,
    #[error("key generation gave up after {0} attempts")]
    KeyGenerationExhausted(usize),
    #[error("expected objects of the {expected} scheme, got {actual}")]
    SchemeMismatch {
        expected: SchemeType,
        actual: SchemeType,
    },
    #[error("unknown scheme {0:?}")]
    UnknownScheme(String),
    #[error("the operation requires a secret key, which this kit does not hold")]
    MissingSecretKey,
    #[error("invalid encoding scale {0}: must be positive")]
    InvalidScale(i64),
    #[error("invalid padding of {0} bits: two slots of 128 bits and their padding must fit a plaintext")]
    InvalidPaddingBits(usize),
    #[error("cannot encode {0}: the scaled value is out of range")]
    UnencodableValue(String),
    #[error("plaintext {0} does not decode into the requested type")]
    UndecodablePlaintext(String),
    #[error("an internal error that should never have happened and signifies a bug")]
    InternalError,
}

pub type Result<T> = std::result::Result<T, Error>;
