//! BabyJubJub, the twisted Edwards curve `a·x² + y² = 1 + d·x²·y²` over the
//! BN254 scalar field, with `a = 168700` and `d = 168696`.
//!
//! Player keys, the aggregated game key and every card live on this curve.

use crate::field::Fq;

pub const A: Fq = Fq::from_limbs([168_700, 0, 0, 0]);
pub const D: Fq = Fq::from_limbs([168_696, 0, 0, 0]);

/// `(q - 1) / 2`. A compressed y-coordinate ("delta") is the smaller of
/// `y` and `q - y`, so it never exceeds this bound.
pub const DELTA_MAX: Fq = Fq::from_limbs([
    0xa1f0fac9f8000000,
    0x9419f4243cdcb848,
    0xdc2822db40c0ac2e,
    0x183227397098d014,
]);

/// Order of the prime subgroup generated by [`BASE8`].
pub const SUBGROUP_ORDER: [u64; 4] = [
    0x677297dc392126f1,
    0xab3eedb83920ee0a,
    0x370a08b6d0302b0b,
    0x060c89ce5c263405,
];

/// Generator of the prime-order subgroup.
pub const BASE8: Point = Point {
    x: Fq::from_limbs([
        0x2893f3f6bb957051,
        0x2ab8d8010534e0b6,
        0x4eacb2e09d6277c1,
        0x0bb77a6ad63e739b,
    ]),
    y: Fq::from_limbs([
        0x4b3c257a872d7d8b,
        0xfce0051fb9e13377,
        0x25572e1cd16bf9ed,
        0x25797203f7a0b249,
    ]),
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CurveError {
    /// Delta exceeds `(q - 1) / 2`.
    DeltaOutOfRange,
    NotOnCurve,
    /// A denominator in the addition law vanished.
    Degenerate,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Point {
    pub x: Fq,
    pub y: Fq,
}

impl Point {
    pub const IDENTITY: Point = Point {
        x: Fq::ZERO,
        y: Fq::ONE,
    };

    pub fn is_on_curve(&self) -> bool {
        is_on_curve(&self.x, &self.y)
    }
}

pub fn is_on_curve(x: &Fq, y: &Fq) -> bool {
    let x2 = x.square();
    let y2 = y.square();
    A * x2 + y2 == Fq::ONE + D * x2 * y2
}

/// Affine addition:
/// `x3 = (x1·y2 + y1·x2) / (1 + d·x1·x2·y1·y2)`,
/// `y3 = (y1·y2 − a·x1·x2) / (1 − d·x1·x2·y1·y2)`.
pub fn point_add(p: &Point, q: &Point) -> Result<Point, CurveError> {
    let x1x2 = p.x * q.x;
    let y1y2 = p.y * q.y;
    let t = D * x1x2 * y1y2;
    let inv_x = (Fq::ONE + t).invert().ok_or(CurveError::Degenerate)?;
    let inv_y = (Fq::ONE - t).invert().ok_or(CurveError::Degenerate)?;
    Ok(Point {
        x: (p.x * q.y + p.y * q.x) * inv_x,
        y: (y1y2 - A * x1x2) * inv_y,
    })
}

/// Double-and-add over projective coordinates, normalised once at the end.
pub fn scalar_mul(p: &Point, k: &[u64; 4]) -> Result<Point, CurveError> {
    let base = Projective::from_affine(p);
    let mut acc = Projective::from_affine(&Point::IDENTITY);
    for limb in k.iter().rev() {
        for bit in (0..64).rev() {
            acc = acc.add(&acc);
            if (limb >> bit) & 1 == 1 {
                acc = acc.add(&base);
            }
        }
    }
    acc.to_affine()
}

/// Rebuilds a y-coordinate from its compressed form. `sign` selects `delta`
/// itself, otherwise `q - delta` is returned.
pub fn recover_y(x: &Fq, delta: &Fq, sign: bool) -> Result<Fq, CurveError> {
    if *delta > DELTA_MAX {
        return Err(CurveError::DeltaOutOfRange);
    }
    if !is_on_curve(x, delta) {
        return Err(CurveError::NotOnCurve);
    }
    if sign {
        Ok(*delta)
    } else {
        Ok(-*delta)
    }
}

/// Compresses `y` into `(delta, sign)` such that `recover_y` inverts it.
pub fn compress_y(y: &Fq) -> (Fq, bool) {
    if *y <= DELTA_MAX {
        (*y, true)
    } else {
        (-*y, false)
    }
}

pub fn mul_mod_q(a: &Fq, b: &Fq) -> Fq {
    *a * *b
}

#[derive(Copy, Clone, Debug)]
struct Projective {
    x: Fq,
    y: Fq,
    z: Fq,
}

impl Projective {
    fn from_affine(p: &Point) -> Self {
        Projective {
            x: p.x,
            y: p.y,
            z: Fq::ONE,
        }
    }

    // add-2008-bbjlp; complete on BabyJubJub, so it doubles too.
    fn add(&self, other: &Projective) -> Projective {
        let a = self.z * other.z;
        let b = a.square();
        let c = self.x * other.x;
        let d = self.y * other.y;
        let e = D * c * d;
        let f = b - e;
        let g = b + e;
        let x3 = a * f * ((self.x + self.y) * (other.x + other.y) - c - d);
        let y3 = a * g * (d - A * c);
        Projective {
            x: x3,
            y: y3,
            z: f * g,
        }
    }

    fn to_affine(self) -> Result<Point, CurveError> {
        let z_inv = self.z.invert().ok_or(CurveError::Degenerate)?;
        Ok(Point {
            x: self.x * z_inv,
            y: self.y * z_inv,
        })
    }
}
