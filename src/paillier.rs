// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! The Paillier cryptosystem over $\mathbb{Z}_{N^2}$, with generator $g = N + 1$.
//!
//! Randomizers $r^N$ are drawn as $h_s^r$ for a fixed $h_s = h^N mod N^2$ published in the public
//! key, which lets every encryption use a precomputed [`crate::BaseTable`] instead of a full
//! exponentiation.

#[cfg(feature = "benchmarking")]
pub(crate) use benches::{
    benchmark_decrypt, benchmark_encrypt, benchmark_evaluate, benchmark_key_generation,
};
pub use ciphertext::{Ciphertext, ScaledCiphertext, UnrandomizedCiphertext};
pub use decryptor::Decryptor;
pub use encryptor::Encryptor;
pub use evaluator::Evaluator;
pub use key_generator::KeyGenerator;
pub use public_key::PublicKey;
pub use secret_key::SecretKey;

mod ciphertext;
mod decryptor;
mod encryptor;
mod evaluator;
mod key_generator;
mod public_key;
mod secret_key;

#[cfg(feature = "benchmarking")]
mod benches {
    use criterion::{BatchSize, Criterion};
    use rand_core::OsRng;

    use super::*;
    use crate::test_exports::{N_2048, P_2048, Q_2048};
    use crate::{LargeBiPrimeSizedNumber, Plaintext, DEFAULT_TABLE_DENSITY};

    fn key_pair(table_density: usize) -> (PublicKey, SecretKey) {
        let (public_key, secret_key) = KeyGenerator::key_pair_from_primes(
            P_2048,
            Q_2048,
            LargeBiPrimeSizedNumber::from(3u64),
            table_density,
        )
        .unwrap();
        assert_eq!(public_key.n(), &N_2048);

        (public_key, secret_key)
    }

    pub(crate) fn benchmark_key_generation(c: &mut Criterion) {
        let mut g = c.benchmark_group("KeyGenerator::generate()");
        g.sample_size(10);

        for key_size in [1024, 2048] {
            let generator = KeyGenerator::new(key_size).unwrap();

            g.bench_function(format!("{key_size}-bit keys"), |bench| {
                bench.iter(|| generator.generate(&mut OsRng).unwrap());
            });
        }

        g.finish();
    }

    pub(crate) fn benchmark_encrypt(c: &mut Criterion) {
        let mut g = c.benchmark_group("Encryptor::encrypt()");
        g.sample_size(10);

        let plaintext = Plaintext::from(-12345i64);
        for table_density in [4, 8, DEFAULT_TABLE_DENSITY] {
            let (public_key, _) = key_pair(table_density);
            let encryptor = Encryptor::new(&public_key);

            g.bench_function(format!("table density {table_density}"), |bench| {
                bench.iter(|| encryptor.encrypt(&plaintext, &mut OsRng).unwrap());
            });
        }

        let (public_key, _) = key_pair(DEFAULT_TABLE_DENSITY);
        let encryptor = Encryptor::new(&public_key);
        for batch_size in [10, 100] {
            let plaintexts = vec![plaintext; batch_size];

            g.bench_function(format!("batches of {batch_size}"), |bench| {
                bench.iter(|| encryptor.encrypt_batch(&plaintexts, &mut OsRng).unwrap());
            });
        }

        g.finish();
    }

    pub(crate) fn benchmark_decrypt(c: &mut Criterion) {
        let mut g = c.benchmark_group("Decryptor::decrypt()");
        g.sample_size(10);

        let (public_key, secret_key) = key_pair(DEFAULT_TABLE_DENSITY);
        let encryptor = Encryptor::new(&public_key);
        let decryptor = Decryptor::new(&public_key, &secret_key).unwrap();

        g.bench_function("2048-bit key", |bench| {
            bench.iter_batched(
                || {
                    encryptor
                        .encrypt(&Plaintext::from(-12345i64), &mut OsRng)
                        .unwrap()
                },
                |ciphertext| decryptor.decrypt(&ciphertext).unwrap(),
                BatchSize::SmallInput,
            );
        });

        g.finish();
    }

    pub(crate) fn benchmark_evaluate(c: &mut Criterion) {
        let mut g = c.benchmark_group("Evaluator");
        g.sample_size(10);

        let (public_key, _) = key_pair(DEFAULT_TABLE_DENSITY);
        let evaluator = Evaluator::new(&public_key);
        let ciphertext = evaluator
            .encryptor()
            .encrypt(&Plaintext::from(123i64), &mut OsRng)
            .unwrap();

        g.bench_function("add()", |bench| {
            bench.iter(|| evaluator.add(&ciphertext, &ciphertext).unwrap());
        });

        g.bench_function("negate()", |bench| {
            bench.iter(|| evaluator.negate(&ciphertext).unwrap());
        });

        for scalar in [-2i64, 12345, i64::MAX] {
            let scalar = Plaintext::from(scalar);

            g.bench_function(format!("mul() by a {}-bit scalar", scalar.bits()), |bench| {
                bench.iter(|| evaluator.mul(&ciphertext, &scalar).unwrap());
            });
        }

        g.bench_function("randomize()", |bench| {
            bench.iter(|| evaluator.randomize(&ciphertext, &mut OsRng).unwrap());
        });

        g.finish();
    }
}
