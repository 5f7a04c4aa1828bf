// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use crypto_bigint::modular::runtime_mod::DynResidue;
use crypto_bigint::{Limb, Uint, Word};
use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "benchmarking")]
pub(crate) use benches::benchmark_pow_mod;

use crate::montgomery::MontgomerySpace;
use crate::{Error, Result};

/// A cache of windowed powers of a fixed base, for fast repeated `base^exponent mod modulus`.
///
/// The exponent is cut into `window_bits`-wide digits (little-endian), and every non-zero digit
/// `d` at window `i` is a single lookup of $base^{d \cdot 2^{i \cdot window\_bits}}$, so an
/// exponentiation costs at most one multiplication per window and no squarings.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct BaseTable<const LIMBS: usize> {
    space: MontgomerySpace<LIMBS>,
    window_bits: usize,
    max_exponent_bits: usize,
    // Window `i` owns the `2^window_bits - 1` entries starting at `i * (2^window_bits - 1)`, one
    // for every non-zero digit. Entries are bare Montgomery forms; the residue parameters live
    // once in `space`.
    stairs: Vec<Uint<LIMBS>>,
}

impl<const LIMBS: usize> BaseTable<LIMBS> {
    /// Windows wider than this would need more than `2^16` entries per window.
    pub const MAXIMUM_WINDOW_BITS: usize = 16;

    /// Precomputes the table of `base` in `space`.
    ///
    /// `max_exponent_bits` must be a positive multiple of the limb size; the table actually
    /// supports exponents up to the next multiple of `window_bits`, see
    /// [`BaseTable::max_exponent_bits`].
    pub fn new(
        space: MontgomerySpace<LIMBS>,
        base: &Uint<LIMBS>,
        window_bits: usize,
        max_exponent_bits: usize,
    ) -> Result<Self> {
        if window_bits == 0
            || window_bits > Self::MAXIMUM_WINDOW_BITS
            || max_exponent_bits == 0
            || max_exponent_bits % Limb::BITS != 0
        {
            return Err(Error::InvalidTableParameters {
                window_bits,
                max_exponent_bits,
            });
        }

        let windows = (max_exponent_bits + window_bits - 1) / window_bits;
        let digits = (1usize << window_bits) - 1;

        // $base^{2^{i \cdot window\_bits}}$ for every window `i`.
        let mut level_bases = Vec::with_capacity(windows);
        let mut level_base = space.map_into_space(base);
        for _ in 0..windows {
            level_bases.push(level_base);
            for _ in 0..window_bits {
                level_base = level_base.square();
            }
        }

        let mut stairs = vec![Uint::<LIMBS>::ZERO; windows * digits];

        #[cfg(not(feature = "parallel"))]
        let iter = stairs.chunks_mut(digits).zip(level_bases.iter());
        #[cfg(feature = "parallel")]
        let iter = stairs.par_chunks_mut(digits).zip(level_bases.par_iter());

        iter.for_each(|(stair, level_base)| {
            let mut power = *level_base;
            for entry in stair.iter_mut() {
                *entry = *power.as_montgomery();
                power *= level_base;
            }
        });

        debug!(
            "built a base table of {} entries ({} windows of {} bits) over a {}-bit modulus",
            stairs.len(),
            windows,
            window_bits,
            space.modulus().bits_vartime()
        );

        Ok(Self {
            space,
            window_bits,
            max_exponent_bits: windows * window_bits,
            stairs,
        })
    }

    /// Computes `base^exponent` in the table's space.
    ///
    /// Returns [`Error::ExponentTooWide`] for exponents longer than [`BaseTable::max_exponent_bits`].
    pub fn pow_mod<const EXPONENT_LIMBS: usize>(
        &self,
        exponent: &Uint<EXPONENT_LIMBS>,
    ) -> Result<DynResidue<LIMBS>> {
        let exponent_bits = exponent.bits_vartime();
        if exponent_bits > self.max_exponent_bits {
            return Err(Error::ExponentTooWide {
                exponent_bits,
                max_exponent_bits: self.max_exponent_bits,
            });
        }

        let digits = self.digits_per_window();
        let mask: Word = (1 << self.window_bits) - 1;
        let words = exponent.as_words();
        let windows = (exponent_bits + self.window_bits - 1) / self.window_bits;

        // Not constant-time: the digit pattern of the exponent decides which entries are read.
        Ok((0..windows).fold(self.space.identity(), |power, window| {
            let digit = Self::digit(words, window * self.window_bits, self.window_bits) & mask;
            if digit == 0 {
                power
            } else {
                power
                    * self
                        .space
                        .from_montgomery(self.stairs[window * digits + (digit as usize) - 1])
            }
        }))
    }

    /// The bits of `words` starting at `bit`, reaching into the next word when the window
    /// straddles a word boundary. The caller masks the result.
    fn digit(words: &[Word], bit: usize, window_bits: usize) -> Word {
        let (index, offset) = (bit / Limb::BITS, bit % Limb::BITS);

        let mut digit = words[index] >> offset;
        if offset + window_bits > Limb::BITS && index + 1 < words.len() {
            digit |= words[index + 1] << (Limb::BITS - offset);
        }

        digit
    }

    fn digits_per_window(&self) -> usize {
        (1 << self.window_bits) - 1
    }

    pub fn space(&self) -> &MontgomerySpace<LIMBS> {
        &self.space
    }

    pub fn window_bits(&self) -> usize {
        self.window_bits
    }

    /// The widest exponent the table supports, a multiple of the window size.
    pub fn max_exponent_bits(&self) -> usize {
        self.max_exponent_bits
    }

    /// The number of cached powers.
    pub fn len(&self) -> usize {
        self.stairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stairs.is_empty()
    }
}

#[cfg(feature = "benchmarking")]
mod benches {
    use criterion::Criterion;
    use crypto_bigint::{NonZero, Random, RandomMod, U1024};
    use rand_core::OsRng;

    use super::*;
    use crate::test_exports::N_2048;
    use crate::{mul_wide, PaillierModulusSizedNumber};

    pub(crate) fn benchmark_pow_mod(c: &mut Criterion) {
        let mut g = c.benchmark_group("BaseTable::pow_mod()");
        g.sample_size(10);

        let n_square = mul_wide(&N_2048, &N_2048);
        let space = MontgomerySpace::new(&n_square).unwrap();
        let base =
            PaillierModulusSizedNumber::random_mod(&mut OsRng, &NonZero::new(n_square).unwrap());
        let exponent = U1024::random(&mut OsRng);

        g.bench_function("square-and-multiply", |bench| {
            bench.iter(|| space.map_into_space(&base).pow(&exponent));
        });

        for window_bits in [4, 8, 10, 12] {
            let table = BaseTable::new(space, &base, window_bits, U1024::BITS).unwrap();

            g.bench_function(format!("{window_bits}-bit windows"), |bench| {
                bench.iter(|| table.pow_mod(&exponent).unwrap());
            });
        }

        g.finish();
    }
}
