// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Row-major 2D affine transformation matrix with display-list composition
//! semantics.

use core::f64::consts::PI;

use kurbo::{Affine, Point};

#[cfg(not(feature = "std"))]
#[allow(unused_imports, reason = "FloatExt is the no_std math fallback")]
use crate::common::FloatExt;

/// Multiplier for converting degrees to radians.
pub const DEG_TO_RAD: f64 = PI / 180.0;

/// An affine transformation matrix of the form:
///
/// ```text
/// [ a  c  tx ]
/// [ b  d  ty ]
/// [ 0  0  1  ]
/// ```
///
/// Angles passed to the transform builders are in degrees, matching the
/// display-object transform properties they are generated from.
///
/// Composition is expressed as `append` (`self * other`, the other transform
/// applies first in local-to-parent order) and `prepend` (`other * self`).
/// Walking a display tree leaf-to-root with [`Matrix2D::prepend_matrix`]
/// yields the concatenated local-to-global transform.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Matrix2D {
    /// Position (0, 0) in the 3x3 affine transformation matrix.
    pub a: f64,
    /// Position (0, 1) in the 3x3 affine transformation matrix.
    pub b: f64,
    /// Position (1, 0) in the 3x3 affine transformation matrix.
    pub c: f64,
    /// Position (1, 1) in the 3x3 affine transformation matrix.
    pub d: f64,
    /// Position (2, 0): the horizontal translation.
    pub tx: f64,
    /// Position (2, 1): the vertical translation.
    pub ty: f64,
}

impl Default for Matrix2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix2D {
    /// The identity matrix, representing a null transformation.
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Constructs a matrix from its six components.
    pub const fn new(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    /// Resets this matrix to identity.
    pub fn identity(&mut self) -> &mut Self {
        *self = Self::IDENTITY;
        self
    }

    /// Whether this matrix is exactly the identity.
    pub fn is_identity(&self) -> bool {
        self.tx == 0.0
            && self.ty == 0.0
            && self.a == 1.0
            && self.b == 0.0
            && self.c == 0.0
            && self.d == 1.0
    }

    /// Appends the specified components to this matrix: `self * other`.
    ///
    /// When the incoming 2x2 block is identity only the translation is
    /// folded in.
    pub fn append(&mut self, a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> &mut Self {
        let a1 = self.a;
        let b1 = self.b;
        let c1 = self.c;
        let d1 = self.d;
        if a != 1.0 || b != 0.0 || c != 0.0 || d != 1.0 {
            self.a = a1 * a + c1 * b;
            self.b = b1 * a + d1 * b;
            self.c = a1 * c + c1 * d;
            self.d = b1 * c + d1 * d;
        }
        self.tx = a1 * tx + c1 * ty + self.tx;
        self.ty = b1 * tx + d1 * ty + self.ty;
        self
    }

    /// Prepends the specified components to this matrix: `other * self`.
    pub fn prepend(&mut self, a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> &mut Self {
        let a1 = self.a;
        let c1 = self.c;
        let tx1 = self.tx;

        self.a = a * a1 + c * self.b;
        self.b = b * a1 + d * self.b;
        self.c = a * c1 + c * self.d;
        self.d = b * c1 + d * self.d;
        self.tx = a * tx1 + c * self.ty + tx;
        self.ty = b * tx1 + d * self.ty + ty;
        self
    }

    /// Appends `matrix` to this matrix: `self * matrix`.
    pub fn append_matrix(&mut self, matrix: &Self) -> &mut Self {
        self.append(matrix.a, matrix.b, matrix.c, matrix.d, matrix.tx, matrix.ty)
    }

    /// Prepends `matrix` to this matrix: `matrix * self`.
    pub fn prepend_matrix(&mut self, matrix: &Self) -> &mut Self {
        self.prepend(matrix.a, matrix.b, matrix.c, matrix.d, matrix.tx, matrix.ty)
    }

    /// Generates matrix components from display-object transform properties
    /// and appends them to this matrix.
    ///
    /// `rotation`, `skew_x`, and `skew_y` are in degrees. The registration
    /// point `(reg_x, reg_y)` offsets the local origin and is applied last.
    pub fn append_transform(
        &mut self,
        x: f64,
        y: f64,
        scale_x: f64,
        scale_y: f64,
        rotation: f64,
        skew_x: f64,
        skew_y: f64,
        reg_x: f64,
        reg_y: f64,
    ) -> &mut Self {
        let (cos, sin) = if rotation % 360.0 != 0.0 {
            let r = rotation * DEG_TO_RAD;
            (r.cos(), r.sin())
        } else {
            (1.0, 0.0)
        };

        if skew_x != 0.0 || skew_y != 0.0 {
            let skew_x = skew_x * DEG_TO_RAD;
            let skew_y = skew_y * DEG_TO_RAD;
            self.append(skew_y.cos(), skew_y.sin(), -skew_x.sin(), skew_x.cos(), x, y);
            self.append(cos * scale_x, sin * scale_x, -sin * scale_y, cos * scale_y, 0.0, 0.0);
        } else {
            self.append(cos * scale_x, sin * scale_x, -sin * scale_y, cos * scale_y, x, y);
        }

        if reg_x != 0.0 || reg_y != 0.0 {
            // fold the registration offset into the translation:
            self.tx -= reg_x * self.a + reg_y * self.c;
            self.ty -= reg_x * self.b + reg_y * self.d;
        }
        self
    }

    /// Generates matrix components from display-object transform properties
    /// and prepends them to this matrix.
    ///
    /// Prepending the transform of each node while walking leaf-to-root
    /// produces the same matrix as appending them root-to-leaf.
    pub fn prepend_transform(
        &mut self,
        x: f64,
        y: f64,
        scale_x: f64,
        scale_y: f64,
        rotation: f64,
        skew_x: f64,
        skew_y: f64,
        reg_x: f64,
        reg_y: f64,
    ) -> &mut Self {
        let (cos, sin) = if rotation % 360.0 != 0.0 {
            let r = rotation * DEG_TO_RAD;
            (r.cos(), r.sin())
        } else {
            (1.0, 0.0)
        };

        if reg_x != 0.0 || reg_y != 0.0 {
            self.tx -= reg_x;
            self.ty -= reg_y;
        }
        if skew_x != 0.0 || skew_y != 0.0 {
            let skew_x = skew_x * DEG_TO_RAD;
            let skew_y = skew_y * DEG_TO_RAD;
            self.prepend(cos * scale_x, sin * scale_x, -sin * scale_y, cos * scale_y, 0.0, 0.0);
            self.prepend(skew_y.cos(), skew_y.sin(), -skew_x.sin(), skew_x.cos(), x, y);
        } else {
            self.prepend(cos * scale_x, sin * scale_x, -sin * scale_y, cos * scale_y, x, y);
        }
        self
    }

    /// Applies a clockwise rotation to the matrix.
    ///
    /// `angle` is in degrees.
    pub fn rotate(&mut self, angle: f64) -> &mut Self {
        let angle = angle * DEG_TO_RAD;
        let cos = angle.cos();
        let sin = angle.sin();

        let a1 = self.a;
        let b1 = self.b;

        self.a = a1 * cos + self.c * sin;
        self.b = b1 * cos + self.d * sin;
        self.c = -a1 * sin + self.c * cos;
        self.d = -b1 * sin + self.d * cos;
        self
    }

    /// Applies a skew transformation, in degrees per axis.
    pub fn skew(&mut self, skew_x: f64, skew_y: f64) -> &mut Self {
        let skew_x = skew_x * DEG_TO_RAD;
        let skew_y = skew_y * DEG_TO_RAD;
        self.append(skew_y.cos(), skew_y.sin(), -skew_x.sin(), skew_x.cos(), 0.0, 0.0)
    }

    /// Applies a scale transformation.
    pub fn scale(&mut self, x: f64, y: f64) -> &mut Self {
        self.a *= x;
        self.b *= x;
        self.c *= y;
        self.d *= y;
        self
    }

    /// Translates the matrix along its local axes.
    pub fn translate(&mut self, x: f64, y: f64) -> &mut Self {
        self.tx += self.a * x + self.c * y;
        self.ty += self.b * x + self.d * y;
        self
    }

    /// Inverts the matrix in place.
    ///
    /// The determinant divide is unguarded: inverting a singular matrix
    /// produces non-finite components rather than an error.
    pub fn invert(&mut self) -> &mut Self {
        let a1 = self.a;
        let b1 = self.b;
        let c1 = self.c;
        let d1 = self.d;
        let tx1 = self.tx;
        let n = a1 * d1 - b1 * c1;

        self.a = d1 / n;
        self.b = -b1 / n;
        self.c = -c1 / n;
        self.d = a1 / n;
        self.tx = (c1 * self.ty - d1 * tx1) / n;
        self.ty = -(a1 * self.ty - b1 * tx1) / n;
        self
    }

    /// Returns the inverse without modifying this matrix.
    ///
    /// See [`Matrix2D::invert`] for singular-matrix behavior.
    pub fn inverted(&self) -> Self {
        let mut m = *self;
        m.invert();
        m
    }

    /// Transforms a point according to this matrix.
    pub fn transform_point(&self, pt: Point) -> Point {
        Point::new(
            pt.x * self.a + pt.y * self.c + self.tx,
            pt.x * self.b + pt.y * self.d + self.ty,
        )
    }

    /// Decomposes the matrix into transform properties.
    ///
    /// The result may not match the properties the matrix was generated
    /// from, but reproduces the same visual transform. When the implied
    /// skews agree the rotation is reported with zero skews; otherwise both
    /// skews are reported with zero rotation.
    pub fn decompose(&self) -> Decomposition {
        let mut out = Decomposition {
            x: self.tx,
            y: self.ty,
            scale_x: (self.a * self.a + self.b * self.b).sqrt(),
            scale_y: (self.c * self.c + self.d * self.d).sqrt(),
            rotation: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
        };

        let skew_x = (-self.c).atan2(self.d);
        let skew_y = self.b.atan2(self.a);

        let delta = (1.0 - skew_x / skew_y).abs();
        if delta < 0.00001 {
            // effectively identical, can use rotation:
            out.rotation = skew_y / DEG_TO_RAD;
            if self.a < 0.0 && self.d >= 0.0 {
                out.rotation += if out.rotation <= 0.0 { 180.0 } else { -180.0 };
            }
        } else {
            out.skew_x = skew_x / DEG_TO_RAD;
            out.skew_y = skew_y / DEG_TO_RAD;
        }
        out
    }
}

/// Transform properties recovered from a [`Matrix2D`] by
/// [`Matrix2D::decompose`]. Angles are in degrees.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Decomposition {
    /// Horizontal translation.
    pub x: f64,
    /// Vertical translation.
    pub y: f64,
    /// Horizontal scale factor.
    pub scale_x: f64,
    /// Vertical scale factor.
    pub scale_y: f64,
    /// Rotation in degrees; zero when skews are reported.
    pub rotation: f64,
    /// Horizontal skew in degrees; zero when rotation is reported.
    pub skew_x: f64,
    /// Vertical skew in degrees; zero when rotation is reported.
    pub skew_y: f64,
}

impl From<Matrix2D> for Affine {
    fn from(m: Matrix2D) -> Self {
        Self::new([m.a, m.b, m.c, m.d, m.tx, m.ty])
    }
}

impl From<Affine> for Matrix2D {
    fn from(affine: Affine) -> Self {
        let [a, b, c, d, tx, ty] = affine.as_coeffs();
        Self::new(a, b, c, d, tx, ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(m: &Matrix2D, n: &Matrix2D, eps: f64, what: &str) {
        for (x, y) in [
            (m.a, n.a),
            (m.b, n.b),
            (m.c, n.c),
            (m.d, n.d),
            (m.tx, n.tx),
            (m.ty, n.ty),
        ] {
            assert!((x - y).abs() < eps, "{what}: {m:?} vs {n:?}");
        }
    }

    #[test]
    fn append_matches_composition() {
        // Appending should apply the appended transform first.
        let mut m = Matrix2D::IDENTITY;
        m.translate(10.0, 5.0);
        m.scale(2.0, 3.0);
        let p = m.transform_point(Point::new(1.0, 1.0));
        assert_eq!(p, Point::new(12.0, 8.0), "scale then translate");
    }

    #[test]
    fn append_is_associative() {
        let mut r = Matrix2D::IDENTITY;
        r.rotate(30.0);
        let mut s = Matrix2D::IDENTITY;
        s.scale(2.0, 0.5);
        let mut t = Matrix2D::IDENTITY;
        t.translate(7.0, -3.0);

        let mut ab_c = r;
        ab_c.append_matrix(&s);
        ab_c.append_matrix(&t);

        let mut bc = s;
        bc.append_matrix(&t);
        let mut a_bc = r;
        a_bc.append_matrix(&bc);

        assert_close(&ab_c, &a_bc, 1e-12, "(r*s)*t == r*(s*t)");
    }

    #[test]
    fn prepend_is_append_from_the_other_side() {
        let mut r = Matrix2D::IDENTITY;
        r.rotate(45.0);
        let mut t = Matrix2D::IDENTITY;
        t.translate(3.0, 4.0);

        let mut a = r;
        a.prepend_matrix(&t);
        let mut b = t;
        b.append_matrix(&r);
        assert_close(&a, &b, 1e-12, "t*r via prepend and append");
    }

    #[test]
    fn invert_round_trips() {
        let mut m = Matrix2D::IDENTITY;
        m.append_transform(12.0, -7.0, 1.5, 0.75, 33.0, 10.0, -4.0, 3.0, 2.0);
        let mut inv = m;
        inv.invert();
        let mut round = m;
        round.append_matrix(&inv);
        assert_close(&round, &Matrix2D::IDENTITY, 1e-9, "m * m^-1");

        let p = Point::new(5.0, -2.0);
        let q = inv.transform_point(m.transform_point(p));
        assert!((q.x - p.x).abs() < 1e-9 && (q.y - p.y).abs() < 1e-9, "point round trip");
    }

    #[test]
    fn singular_invert_is_non_finite() {
        let mut m = Matrix2D::new(2.0, 0.0, 0.0, 0.0, 1.0, 1.0);
        m.invert();
        assert!(!m.d.is_finite(), "zero determinant yields non-finite components");
    }

    #[test]
    fn decompose_recovers_rotation() {
        for rotation in [0.0, 10.0, 90.0, 135.0, 180.0, 250.0, 359.0] {
            let mut m = Matrix2D::IDENTITY;
            m.append_transform(40.0, -12.0, 2.0, 3.0, rotation, 0.0, 0.0, 0.0, 0.0);
            let d = m.decompose();
            // Rotation is reported in (-180, 180].
            let expected = if rotation > 180.0 { rotation - 360.0 } else { rotation };
            assert!((d.x - 40.0).abs() < 1e-9, "x for rotation {rotation}");
            assert!((d.y + 12.0).abs() < 1e-9, "y for rotation {rotation}");
            assert!((d.scale_x - 2.0).abs() < 1e-9, "scale_x for rotation {rotation}");
            assert!((d.scale_y - 3.0).abs() < 1e-9, "scale_y for rotation {rotation}");
            assert!((d.rotation - expected).abs() < 1e-6, "rotation {rotation}: got {}", d.rotation);
            assert_eq!(d.skew_x, 0.0, "skew_x is zero for pure rotation {rotation}");
            assert_eq!(d.skew_y, 0.0, "skew_y is zero for pure rotation {rotation}");
        }
    }

    #[test]
    fn decompose_recompose_round_trips() {
        for rotation in [0.0, 25.0, 88.0, 179.0, 271.5] {
            let mut m = Matrix2D::IDENTITY;
            m.append_transform(5.0, 6.0, 1.25, 0.5, rotation, 0.0, 0.0, 0.0, 0.0);
            let d = m.decompose();
            let mut back = Matrix2D::IDENTITY;
            back.append_transform(
                d.x, d.y, d.scale_x, d.scale_y, d.rotation, d.skew_x, d.skew_y, 0.0, 0.0,
            );
            assert_close(&m, &back, 1e-9, "recompose");
        }
    }

    #[test]
    fn decompose_reports_mismatched_skews() {
        let mut m = Matrix2D::IDENTITY;
        m.append_transform(0.0, 0.0, 1.0, 1.0, 0.0, 20.0, 5.0, 0.0, 0.0);
        let d = m.decompose();
        assert_eq!(d.rotation, 0.0, "no rotation when skews disagree");
        assert!((d.skew_x - 20.0).abs() < 1e-9, "skew_x: got {}", d.skew_x);
        assert!((d.skew_y - 5.0).abs() < 1e-9, "skew_y: got {}", d.skew_y);
    }

    #[test]
    fn prepend_transform_matches_append_construction() {
        // Walking leaf-to-root with prepend_transform must agree with
        // walking root-to-leaf with append_transform, including the
        // registration-point handling on both sides.
        let chains: &[&[(f64, f64, f64, f64, f64, f64, f64, f64, f64)]] = &[
            &[
                (10.0, 5.0, 2.0, 2.0, 30.0, 0.0, 0.0, 4.0, 6.0),
                (-3.0, 8.0, 1.0, 0.5, 0.0, 15.0, -10.0, 0.0, 2.0),
            ],
            &[
                (0.0, 0.0, 1.0, 1.0, 90.0, 0.0, 0.0, 0.0, 0.0),
                (20.0, 20.0, 3.0, 0.25, 45.0, 5.0, 5.0, 1.0, 1.0),
                (1.0, 2.0, 1.0, 1.0, 0.0, 0.0, 0.0, 7.0, -7.0),
            ],
        ];
        for chain in chains {
            let mut appended = Matrix2D::IDENTITY;
            for t in chain.iter() {
                appended.append_transform(t.0, t.1, t.2, t.3, t.4, t.5, t.6, t.7, t.8);
            }
            let mut prepended = Matrix2D::IDENTITY;
            for t in chain.iter().rev() {
                prepended.prepend_transform(t.0, t.1, t.2, t.3, t.4, t.5, t.6, t.7, t.8);
            }
            assert_close(&appended, &prepended, 1e-9, "prepend vs append chain");
        }
    }

    #[test]
    fn affine_round_trip() {
        let mut m = Matrix2D::IDENTITY;
        m.append_transform(1.0, 2.0, 3.0, 4.0, 5.0, 0.0, 0.0, 0.0, 0.0);
        let back = Matrix2D::from(Affine::from(m));
        assert_eq!(m, back, "conversion through Affine");
    }

    #[test]
    fn identity_checks() {
        let mut m = Matrix2D::IDENTITY;
        assert!(m.is_identity(), "fresh matrix is identity");
        m.translate(1.0, 0.0);
        assert!(!m.is_identity(), "translated matrix is not identity");
        m.identity();
        assert!(m.is_identity(), "reset matrix is identity");
        assert_eq!(m, Matrix2D::default(), "default is identity");
    }
}
