// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use crypto_bigint::modular::runtime_mod::{DynResidue, DynResidueParams};
use crypto_bigint::Uint;

#[cfg(feature = "benchmarking")]
pub(crate) use base_table::benchmark_pow_mod;
pub use base_table::BaseTable;

use crate::{Error, Result};

mod base_table;

/// The ring of integers modulo an odd `modulus`, with elements represented in Montgomery form.
///
/// Values enter through [`MontgomerySpace::map_into_space`] and leave through
/// [`MontgomerySpace::map_back_to_z_space`]; a [`DynResidue`] must never be compared with or
/// combined with a plain residue without going through one of the two.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct MontgomerySpace<const LIMBS: usize> {
    params: DynResidueParams<LIMBS>,
}

impl<const LIMBS: usize> MontgomerySpace<LIMBS> {
    pub fn new(modulus: &Uint<LIMBS>) -> Result<Self> {
        // Montgomery multiplication needs `R = 2^(LIMBS * Limb::BITS)` to be invertible.
        if modulus.as_words()[0] & 1 == 0 || *modulus <= Uint::<LIMBS>::ONE {
            return Err(Error::InvalidModulus);
        }

        Ok(Self {
            params: DynResidueParams::new(modulus),
        })
    }

    pub fn modulus(&self) -> &Uint<LIMBS> {
        self.params.modulus()
    }

    /// Whether `value` is a canonical residue, i.e. lies in `[0, modulus)`.
    pub fn contains(&self, value: &Uint<LIMBS>) -> bool {
        value < self.modulus()
    }

    /// Maps `value` into the space. Values above the modulus are reduced.
    pub fn map_into_space(&self, value: &Uint<LIMBS>) -> DynResidue<LIMBS> {
        DynResidue::new(value, self.params)
    }

    pub fn map_back_to_z_space(&self, element: &DynResidue<LIMBS>) -> Uint<LIMBS> {
        element.retrieve()
    }

    /// Wraps a number that is already in Montgomery form.
    pub fn from_montgomery(&self, montgomery_form: Uint<LIMBS>) -> DynResidue<LIMBS> {
        DynResidue::from_montgomery(montgomery_form, self.params)
    }

    /// The multiplicative identity of the space.
    pub fn identity(&self) -> DynResidue<LIMBS> {
        DynResidue::one(self.params)
    }

    /// The multiplicative inverse of `element`, if it is a unit (coprime to the modulus).
    pub fn invert(&self, element: &DynResidue<LIMBS>) -> Option<DynResidue<LIMBS>> {
        let (inverse, _) = element.invert();

        (inverse * *element == self.identity()).then_some(inverse)
    }
}
