//! Arithmetic in the BabyJubJub base field, i.e. the BN254 scalar field
//! `q = 21888242871839275222246405745257275088548364400416034343698204186575808495617`.
//!
//! Elements are four little-endian `u64` limbs and are always kept below `q`.
//! Reduction is bit-serial, which keeps the code small for the contract
//! build; the hot paths (key aggregation, y recovery) only need a handful
//! of multiplications per call.

use core::cmp::Ordering;
use core::ops::{Add, Mul, Neg, Sub};

use soroban_sdk::{Bytes, Env, U256};

/// `q` as little-endian limbs.
pub const MODULUS: [u64; 4] = [
    0x43e1f593f0000001,
    0x2833e84879b97091,
    0xb85045b68181585d,
    0x30644e72e131a029,
];

/// `q - 2`, the Fermat inversion exponent.
const MODULUS_MINUS_TWO: [u64; 4] = [
    0x43e1f593efffffff,
    0x2833e84879b97091,
    0xb85045b68181585d,
    0x30644e72e131a029,
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Fq([u64; 4]);

impl Fq {
    pub const ZERO: Fq = Fq([0, 0, 0, 0]);
    pub const ONE: Fq = Fq([1, 0, 0, 0]);

    /// Builds an element from limbs that are already known to be below `q`.
    pub const fn from_limbs(limbs: [u64; 4]) -> Self {
        Fq(limbs)
    }

    pub const fn limbs(&self) -> &[u64; 4] {
        &self.0
    }

    pub fn from_u64(value: u64) -> Self {
        Fq([value, 0, 0, 0])
    }

    /// Parses a 32-byte big-endian value. Returns `None` when the value is
    /// not below `q`.
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Option<Self> {
        let limbs = limbs_from_be_bytes(bytes);
        if limbs_cmp(&limbs, &MODULUS) == Ordering::Less {
            Some(Fq(limbs))
        } else {
            None
        }
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (i, limb) in self.0.iter().rev().enumerate() {
            out[i * 8..i * 8 + 8].copy_from_slice(&limb.to_be_bytes());
        }
        out
    }

    pub fn from_u256(value: &U256) -> Option<Self> {
        let mut buf = [0u8; 32];
        value.to_be_bytes().copy_into_slice(&mut buf);
        Self::from_be_bytes(&buf)
    }

    pub fn to_u256(&self, env: &Env) -> U256 {
        U256::from_be_bytes(env, &Bytes::from_array(env, &self.to_be_bytes()))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0, 0, 0, 0]
    }

    pub fn square(&self) -> Self {
        *self * *self
    }

    /// `self^exp` by left-to-right square-and-multiply.
    pub fn pow(&self, exp: &[u64; 4]) -> Self {
        let mut acc = Fq::ONE;
        for limb in exp.iter().rev() {
            for bit in (0..64).rev() {
                acc = acc.square();
                if (limb >> bit) & 1 == 1 {
                    acc = acc * *self;
                }
            }
        }
        acc
    }

    pub fn invert(&self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }
        Some(self.pow(&MODULUS_MINUS_TWO))
    }
}

impl PartialOrd for Fq {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fq {
    fn cmp(&self, other: &Self) -> Ordering {
        limbs_cmp(&self.0, &other.0)
    }
}

impl Add for Fq {
    type Output = Fq;

    fn add(self, rhs: Fq) -> Fq {
        // Both operands are below q < 2^254, so the sum cannot carry out.
        let (sum, _) = limbs_add(&self.0, &rhs.0);
        if limbs_cmp(&sum, &MODULUS) == Ordering::Less {
            Fq(sum)
        } else {
            Fq(limbs_sub(&sum, &MODULUS).0)
        }
    }
}

impl Sub for Fq {
    type Output = Fq;

    fn sub(self, rhs: Fq) -> Fq {
        let (diff, borrow) = limbs_sub(&self.0, &rhs.0);
        if borrow == 0 {
            Fq(diff)
        } else {
            Fq(limbs_add(&diff, &MODULUS).0)
        }
    }
}

impl Neg for Fq {
    type Output = Fq;

    fn neg(self) -> Fq {
        Fq::ZERO - self
    }
}

impl Mul for Fq {
    type Output = Fq;

    fn mul(self, rhs: Fq) -> Fq {
        Fq(reduce_wide(&mul_wide(&self.0, &rhs.0), &MODULUS))
    }
}

/// Reduces a 32-byte big-endian integer modulo `modulus`. The modulus must
/// leave the top bit of its high limb clear.
pub fn reduce_be_bytes_mod(bytes: &[u8; 32], modulus: &[u64; 4]) -> [u64; 4] {
    let low = limbs_from_be_bytes(bytes);
    let wide = [low[0], low[1], low[2], low[3], 0, 0, 0, 0];
    reduce_wide(&wide, modulus)
}

pub(crate) fn limbs_cmp(a: &[u64; 4], b: &[u64; 4]) -> Ordering {
    for i in (0..4).rev() {
        match a[i].cmp(&b[i]) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn limbs_from_be_bytes(bytes: &[u8; 32]) -> [u64; 4] {
    let mut limbs = [0u64; 4];
    for (i, limb) in limbs.iter_mut().enumerate() {
        let start = 32 - (i + 1) * 8;
        let mut word = [0u8; 8];
        word.copy_from_slice(&bytes[start..start + 8]);
        *limb = u64::from_be_bytes(word);
    }
    limbs
}

fn adc(a: u64, b: u64, carry: u64) -> (u64, u64) {
    let t = a as u128 + b as u128 + carry as u128;
    (t as u64, (t >> 64) as u64)
}

fn sbb(a: u64, b: u64, borrow: u64) -> (u64, u64) {
    let t = (a as u128).wrapping_sub(b as u128 + borrow as u128);
    (t as u64, (t >> 127) as u64)
}

fn limbs_add(a: &[u64; 4], b: &[u64; 4]) -> ([u64; 4], u64) {
    let mut out = [0u64; 4];
    let mut carry = 0;
    for i in 0..4 {
        let (v, c) = adc(a[i], b[i], carry);
        out[i] = v;
        carry = c;
    }
    (out, carry)
}

fn limbs_sub(a: &[u64; 4], b: &[u64; 4]) -> ([u64; 4], u64) {
    let mut out = [0u64; 4];
    let mut borrow = 0;
    for i in 0..4 {
        let (v, b_out) = sbb(a[i], b[i], borrow);
        out[i] = v;
        borrow = b_out;
    }
    (out, borrow)
}

fn mul_wide(a: &[u64; 4], b: &[u64; 4]) -> [u64; 8] {
    let mut wide = [0u64; 8];
    for i in 0..4 {
        let mut carry = 0u64;
        for j in 0..4 {
            let t = wide[i + j] as u128 + (a[i] as u128) * (b[j] as u128) + carry as u128;
            wide[i + j] = t as u64;
            carry = (t >> 64) as u64;
        }
        wide[i + 4] = carry;
    }
    wide
}

/// Shift-and-subtract reduction of a 512-bit value.
fn reduce_wide(wide: &[u64; 8], modulus: &[u64; 4]) -> [u64; 4] {
    let mut r = [0u64; 4];
    for limb in wide.iter().rev() {
        for bit in (0..64).rev() {
            // r < modulus < 2^255, so doubling stays within 256 bits.
            r[3] = (r[3] << 1) | (r[2] >> 63);
            r[2] = (r[2] << 1) | (r[1] >> 63);
            r[1] = (r[1] << 1) | (r[0] >> 63);
            r[0] = (r[0] << 1) | ((limb >> bit) & 1);
            if limbs_cmp(&r, modulus) != Ordering::Less {
                r = limbs_sub(&r, modulus).0;
            }
        }
    }
    r
}
