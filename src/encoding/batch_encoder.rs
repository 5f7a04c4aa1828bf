// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use std::fmt;

use crypto_bigint::U2048;
use serde::{Deserialize, Serialize};

use crate::{low_u128, Error, LargeBiPrimeSizedNumber, Plaintext, Result};

/// A fixed-width integer type that fits one slot of a [`BatchEncoder`].
pub trait BatchSlot: Copy + fmt::Display {
    const BITS: usize;

    /// `self * scale`, or `None` on overflow or when `scale` does not fit the type.
    fn checked_scale(self, scale: i64) -> Option<Self>;

    /// `self / scale`, rounding toward zero, or `None` when `scale` does not fit the type.
    fn unscale(self, scale: i64) -> Option<Self>;

    /// The two's complement bit pattern of `self`, zero-extended.
    fn to_bits(self) -> u128;

    /// Reads the lowest [`BatchSlot::BITS`] bits of `bits` as a two's complement number.
    fn from_bits(bits: u128) -> Self;
}

macro_rules! impl_batch_slot {
    ($($slot:ty => $unsigned:ty),* $(,)?) => {
        $(
            impl BatchSlot for $slot {
                const BITS: usize = <$slot>::BITS as usize;

                fn checked_scale(self, scale: i64) -> Option<Self> {
                    <$slot>::try_from(scale)
                        .ok()
                        .and_then(|scale| self.checked_mul(scale))
                }

                fn unscale(self, scale: i64) -> Option<Self> {
                    <$slot>::try_from(scale).ok().map(|scale| self / scale)
                }

                fn to_bits(self) -> u128 {
                    self as $unsigned as u128
                }

                fn from_bits(bits: u128) -> Self {
                    bits as $unsigned as $slot
                }
            }
        )*
    };
}

impl_batch_slot!(
    u8 => u8,
    u16 => u16,
    u32 => u32,
    u64 => u64,
    u128 => u128,
    i8 => u8,
    i16 => u16,
    i32 => u32,
    i64 => u64,
    i128 => u128,
);

/// Packs two scaled integers into one plaintext.
///
/// The first value occupies the lowest `T::BITS` bits, followed by `padding_bits` zero bits and
/// the second value. Adding packed plaintexts adds the slots independently for as long as the
/// carries out of the first slot fit in the padding: 32 bits of padding absorb about $2^{32}$
/// additions.
///
/// Negative values are packed in two's complement, so the packed plaintext is always
/// non-negative. It must stay below the plaintext bound of the scheme it is encrypted under.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(try_from = "BatchEncoderParameters", into = "BatchEncoderParameters")]
pub struct BatchEncoder {
    scale: i64,
    padding_bits: usize,
}

#[derive(Clone, Copy, Serialize, Deserialize)]
struct BatchEncoderParameters {
    scale: i64,
    padding_bits: usize,
}

impl Default for BatchEncoder {
    fn default() -> Self {
        Self {
            scale: Self::DEFAULT_SCALE,
            padding_bits: Self::DEFAULT_PADDING_BITS,
        }
    }
}

impl BatchEncoder {
    pub const DEFAULT_SCALE: i64 = 1;
    pub const DEFAULT_PADDING_BITS: usize = 32;
    /// Two 128-bit slots and their padding must fit a plaintext.
    pub const MAXIMUM_PADDING_BITS: usize =
        LargeBiPrimeSizedNumber::BITS - 2 * u128::BITS as usize;

    /// Fails with [`Error::InvalidScale`] unless `scale` is positive, and with
    /// [`Error::InvalidPaddingBits`] for padding wider than [`BatchEncoder::MAXIMUM_PADDING_BITS`].
    pub fn new(scale: i64, padding_bits: usize) -> Result<Self> {
        if scale <= 0 {
            return Err(Error::InvalidScale(scale));
        }

        if padding_bits > Self::MAXIMUM_PADDING_BITS {
            return Err(Error::InvalidPaddingBits(padding_bits));
        }

        Ok(Self {
            scale,
            padding_bits,
        })
    }

    pub fn scale(&self) -> i64 {
        self.scale
    }

    pub fn padding_bits(&self) -> usize {
        self.padding_bits
    }

    /// Scales and packs `first` and `second`.
    ///
    /// Fails with [`Error::UnencodableValue`] when a scaled value overflows `T`.
    pub fn encode<T: BatchSlot>(&self, first: T, second: T) -> Result<Plaintext> {
        let scale = |cleartext: T| {
            cleartext
                .checked_scale(self.scale)
                .ok_or_else(|| Error::UnencodableValue(cleartext.to_string()))
        };

        Ok(self.pack(scale(first)?.to_bits(), scale(second)?.to_bits(), T::BITS))
    }

    /// Unpacks and unscales the two values [`BatchEncoder::encode`] packed, with the same `T`.
    pub fn decode<T: BatchSlot>(&self, plaintext: &Plaintext) -> Result<(T, T)> {
        let (first, second) = self.unpack(plaintext, T::BITS);
        let unscale = |slot: u128| {
            T::from_bits(slot)
                .unscale(self.scale)
                .ok_or_else(|| Error::UndecodablePlaintext(plaintext.to_decimal_string()))
        };

        Ok((unscale(first)?, unscale(second)?))
    }

    /// Scales `first` and `second`, truncating toward zero, and packs them as `i64` slots.
    ///
    /// Fails with [`Error::UnencodableValue`] for non-finite values and for scaled values out of
    /// the `i64` range.
    pub fn encode_f64(&self, first: f64, second: f64) -> Result<Plaintext> {
        let scale = |cleartext: f64| {
            let scaled = cleartext * self.scale as f64;
            if !scaled.is_finite() || scaled.abs() >= i64::MAX as f64 {
                return Err(Error::UnencodableValue(cleartext.to_string()));
            }

            Ok(scaled as i64)
        };

        Ok(self.pack(
            scale(first)?.to_bits(),
            scale(second)?.to_bits(),
            <i64 as BatchSlot>::BITS,
        ))
    }

    pub fn decode_f64(&self, plaintext: &Plaintext) -> (f64, f64) {
        let (first, second) = self.unpack(plaintext, <i64 as BatchSlot>::BITS);
        let unscale = |slot: u128| <i64 as BatchSlot>::from_bits(slot) as f64 / self.scale as f64;

        (unscale(first), unscale(second))
    }

    fn pack(&self, first: u128, second: u128, slot_bits: usize) -> Plaintext {
        let packed = U2048::from_u128(second).shl_vartime(slot_bits + self.padding_bits)
            | U2048::from_u128(first);

        Plaintext::from(packed)
    }

    /// The raw bits of both slots. A negative plaintext is read in two's complement, as if the
    /// slots had been packed from negated values.
    fn unpack(&self, plaintext: &Plaintext, slot_bits: usize) -> (u128, u128) {
        let bits = if plaintext.is_negative() {
            U2048::ZERO.wrapping_sub(plaintext.magnitude())
        } else {
            *plaintext.magnitude()
        };

        (
            low_u128(&bits),
            low_u128(&bits.shr_vartime(slot_bits + self.padding_bits)),
        )
    }
}

impl TryFrom<BatchEncoderParameters> for BatchEncoder {
    type Error = Error;

    fn try_from(parameters: BatchEncoderParameters) -> Result<Self> {
        Self::new(parameters.scale, parameters.padding_bits)
    }
}

impl From<BatchEncoder> for BatchEncoderParameters {
    fn from(encoder: BatchEncoder) -> Self {
        Self {
            scale: encoder.scale,
            padding_bits: encoder.padding_bits,
        }
    }
}

impl fmt::Display for BatchEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BatchEncoder(scale={}, padding_bits={}, max_batch=2)",
            self.scale, self.padding_bits
        )
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Debug;
    use std::ops::Add;

    use rand_core::OsRng;
    use rstest::rstest;

    use super::*;
    use crate::paillier::{Decryptor, Encryptor, Evaluator};
    use crate::test_exports::key_pair_512;

    fn assert_slots_add_up<T>(encoder: &BatchEncoder, first: T, second: T)
    where
        T: BatchSlot + Add<Output = T> + PartialEq + Debug,
    {
        let plaintext = encoder.encode(first, second).unwrap();
        assert!(!plaintext.is_negative());
        assert_eq!(
            encoder.decode::<T>(&plaintext),
            Ok((first, second)),
            "{encoder}, {first}, {second}"
        );

        let (two, one) = (T::from_bits(2), T::from_bits(1));
        let sum = plaintext
            .checked_add(&encoder.encode(two, one).unwrap())
            .unwrap();
        assert_eq!(
            encoder.decode::<T>(&sum),
            Ok((first + two, second + one)),
            "{encoder}, {first}, {second}"
        );
    }

    #[rstest]
    #[case::defaults(BatchEncoder::default())]
    #[case::scaled(BatchEncoder::new(2, BatchEncoder::DEFAULT_PADDING_BITS).unwrap())]
    #[case::narrow_padding(BatchEncoder::new(10, 16).unwrap())]
    fn packs_two_integers(#[case] encoder: BatchEncoder) {
        assert_slots_add_up(&encoder, 1u8, 6);
        assert_slots_add_up(&encoder, 10u16, 60);
        assert_slots_add_up(&encoder, 100u32, 6000);
        assert_slots_add_up(&encoder, 1000u64, 60000);
        assert_slots_add_up(&encoder, 50000u128, 600000);

        for (first_sign, second_sign) in [(1i8, 1i8), (1, -1), (-1, 1), (-1, -1)] {
            assert_slots_add_up(&encoder, first_sign, second_sign * 6);
            assert_slots_add_up(
                &encoder,
                i16::from(first_sign) * 10,
                i16::from(second_sign) * 60,
            );
            assert_slots_add_up(
                &encoder,
                i32::from(first_sign) * 100,
                i32::from(second_sign) * 6000,
            );
            assert_slots_add_up(
                &encoder,
                i64::from(first_sign) * 1000,
                i64::from(second_sign) * 60000,
            );
            assert_slots_add_up(
                &encoder,
                i128::from(first_sign) * 50000,
                i128::from(second_sign) * 600000,
            );
        }
    }

    #[test]
    fn wraps_within_a_slot_on_overflow() {
        let encoder = BatchEncoder::new(10, 16).unwrap();
        let plaintext = encoder.encode(1i8, -6).unwrap();

        // 10 * 1000 and -60 * 1000 wrap around to 16 and -96 in an `i8`.
        let scaled = plaintext.checked_mul(&Plaintext::from(1000i64)).unwrap();

        assert_eq!(encoder.decode::<i8>(&scaled), Ok((1, -9)));
    }

    #[test]
    fn reads_negative_plaintexts_as_negated_slots() {
        let encoder = BatchEncoder::default();
        let plaintext = encoder.encode(3i32, 5).unwrap();

        assert_eq!(encoder.decode::<i32>(&-plaintext), Ok((-3, -6)));

        let incremented = plaintext
            .checked_add(&encoder.encode(0i32, 1).unwrap())
            .unwrap();
        assert_eq!(encoder.decode::<i32>(&-incremented), Ok((-3, -7)));
    }

    #[test]
    fn accumulates_many_sums() {
        let encoder = BatchEncoder::new(64, 31).unwrap();
        let step = i64::MAX / 100_000_000;

        let mut plaintext = encoder.encode(0i64, 0).unwrap();
        let (mut first_sum, mut second_sum) = (0i64, 0i64);
        for n in (1..=100).map(|k| k * step) {
            plaintext = plaintext
                .checked_add(&encoder.encode(-n, n).unwrap())
                .unwrap();
            first_sum -= n;
            second_sum += n;

            assert_eq!(encoder.decode::<i64>(&plaintext), Ok((first_sum, second_sum)));
        }
    }

    #[test]
    fn packs_two_floats() {
        let encoder = BatchEncoder::new(1000, BatchEncoder::DEFAULT_PADDING_BITS).unwrap();

        let sum = encoder
            .encode_f64(4.5, 93.72)
            .unwrap()
            .checked_add(&encoder.encode_f64(10.9, 2.4).unwrap())
            .unwrap();
        assert_eq!(encoder.decode_f64(&sum), (15.4, 96.12));

        let negative = encoder.encode_f64(-1.25, 0.5).unwrap();
        assert_eq!(encoder.decode_f64(&negative), (-1.25, 0.5));

        assert!(matches!(
            encoder.encode_f64(f64::NAN, 1.0),
            Err(Error::UnencodableValue(_))
        ));
        assert_eq!(
            encoder.encode_f64(1.0, 1e300),
            Err(Error::UnencodableValue(1e300.to_string()))
        );
    }

    #[test]
    fn rejects_slot_overflow() {
        let encoder = BatchEncoder::new(10, BatchEncoder::DEFAULT_PADDING_BITS).unwrap();

        assert_eq!(
            encoder.encode(13i8, 0),
            Err(Error::UnencodableValue("13".to_string()))
        );
        assert_eq!(
            BatchEncoder::new(1000, 0).unwrap().encode(1u8, 1),
            Err(Error::UnencodableValue("1".to_string()))
        );
    }

    #[test]
    fn adds_encrypted_batches() {
        let (public_key, secret_key) = key_pair_512();
        let encryptor = Encryptor::new(&public_key);
        let evaluator = Evaluator::new(&public_key);
        let decryptor = Decryptor::new(&public_key, &secret_key).unwrap();
        let encoder = BatchEncoder::new(100, BatchEncoder::DEFAULT_PADDING_BITS).unwrap();

        let lhs = encryptor
            .encrypt(&encoder.encode(-1000i64, 60000).unwrap(), &mut OsRng)
            .unwrap();
        let rhs = encryptor
            .encrypt(&encoder.encode(250i64, -70000).unwrap(), &mut OsRng)
            .unwrap();

        let sum = decryptor.decrypt(&evaluator.add(&lhs, &rhs).unwrap()).unwrap();

        assert_eq!(encoder.decode::<i64>(&sum), Ok((-750, -10000)));
    }

    #[rstest]
    #[case::zero_scale(0, 32, Error::InvalidScale(0))]
    #[case::negative_scale(-5, 32, Error::InvalidScale(-5))]
    #[case::padding_too_wide(1, 1793, Error::InvalidPaddingBits(1793))]
    fn rejects_invalid_parameters(
        #[case] scale: i64,
        #[case] padding_bits: usize,
        #[case] error: Error,
    ) {
        assert_eq!(BatchEncoder::new(scale, padding_bits), Err(error));
    }

    #[test]
    fn serializes_parameters() {
        let encoder = BatchEncoder::new(10000, 12).unwrap();

        let serialized = serde_json::to_string(&encoder).unwrap();
        assert_eq!(serialized, r#"{"scale":10000,"padding_bits":12}"#);
        assert_eq!(
            serde_json::from_str::<BatchEncoder>(&serialized).unwrap(),
            encoder
        );
        assert!(serde_json::from_str::<BatchEncoder>(r#"{"scale":0,"padding_bits":12}"#).is_err());

        assert_eq!(
            encoder.to_string(),
            "BatchEncoder(scale=10000, padding_bits=12, max_batch=2)"
        );
        assert_eq!(BatchEncoder::MAXIMUM_PADDING_BITS, 1792);
    }
}
