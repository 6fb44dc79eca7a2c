use rand::RngCore;
use shuffle_manager::curve::{scalar_mul, Point, BASE8, SUBGROUP_ORDER};
use shuffle_manager::field::reduce_be_bytes_mod;

use crate::{PlayerError, Result};

/// A player's ElGamal secret key: a non-zero scalar below the order of the
/// BabyJubJub prime subgroup.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ShuffleSecret([u64; 4]);

impl ShuffleSecret {
    /// Reduces 32 big-endian bytes into a scalar. A zero result becomes one.
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        let mut limbs = reduce_be_bytes_mod(bytes, &SUBGROUP_ORDER);
        if limbs == [0; 4] {
            limbs[0] = 1;
        }
        ShuffleSecret(limbs)
    }

    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Self::from_be_bytes(&bytes)
    }

    pub fn limbs(&self) -> &[u64; 4] {
        &self.0
    }

    /// `secret·BASE8`.
    pub fn public_key(&self) -> Result<Point> {
        scalar_mul(&BASE8, &self.0).map_err(|_| PlayerError::InvalidSecret)
    }
}

// Keep secrets out of logs.
impl core::fmt::Debug for ShuffleSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("ShuffleSecret(..)")
    }
}

pub fn generate_shuffle_secret<R: RngCore>(rng: &mut R) -> ShuffleSecret {
    let mut bytes = [0u8; 32];
    rng.fill_bytes(&mut bytes);
    ShuffleSecret::from_be_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shuffle_manager::field::Fq;

    #[test]
    fn small_secrets_are_kept() {
        assert_eq!(ShuffleSecret::from_u64(7).limbs(), &[7, 0, 0, 0]);
        assert_eq!(ShuffleSecret::from_u64(0).limbs(), &[1, 0, 0, 0]);
    }

    #[test]
    fn secrets_stay_below_subgroup_order() {
        let max = ShuffleSecret::from_be_bytes(&[0xFF; 32]);
        let limbs = max.limbs();
        assert!(limbs.iter().rev().cmp(SUBGROUP_ORDER.iter().rev()).is_lt());

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..8 {
            let secret = generate_shuffle_secret(&mut rng);
            assert!(secret.limbs().iter().rev().cmp(SUBGROUP_ORDER.iter().rev()).is_lt());
            assert_ne!(secret.limbs(), &[0; 4]);
        }
    }

    #[test]
    fn public_key_is_secret_times_generator() {
        let one = ShuffleSecret::from_u64(1).public_key().unwrap();
        assert_eq!(one, BASE8);

        let key = ShuffleSecret::from_u64(5).public_key().unwrap();
        assert!(key.is_on_curve());
        assert_ne!(key.x, Fq::ZERO);
    }

    #[test]
    fn debug_hides_scalar() {
        assert_eq!(format!("{:?}", ShuffleSecret::from_u64(99)), "ShuffleSecret(..)");
    }
}
