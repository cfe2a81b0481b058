// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Float math routed to `libm` when `std` is unavailable.

#[cfg(all(not(feature = "std"), not(feature = "libm")))]
compile_error!("limelight_geom requires either the `std` or `libm` feature");

/// Floating-point functions normally provided by `std`.
///
/// With `std` enabled the inherent `f64` methods shadow these at call sites;
/// the trait exists so the same code compiles against `libm` in `no_std`
/// builds.
#[cfg(not(feature = "std"))]
pub trait FloatExt: Sized {
    /// Equivalent of [`f64::sin`].
    fn sin(self) -> Self;
    /// Equivalent of [`f64::cos`].
    fn cos(self) -> Self;
    /// Equivalent of [`f64::atan2`].
    fn atan2(self, other: Self) -> Self;
    /// Equivalent of [`f64::sqrt`].
    fn sqrt(self) -> Self;
    /// Equivalent of [`f64::hypot`].
    fn hypot(self, other: Self) -> Self;
    /// Equivalent of [`f64::abs`].
    fn abs(self) -> Self;
    /// Equivalent of [`f64::floor`].
    fn floor(self) -> Self;
    /// Equivalent of [`f64::ceil`].
    fn ceil(self) -> Self;
    /// Equivalent of [`f64::round`].
    fn round(self) -> Self;
    /// Equivalent of [`f64::trunc`].
    fn trunc(self) -> Self;
}

#[cfg(not(feature = "std"))]
impl FloatExt for f64 {
    #[inline]
    fn sin(self) -> Self {
        libm::sin(self)
    }
    #[inline]
    fn cos(self) -> Self {
        libm::cos(self)
    }
    #[inline]
    fn atan2(self, other: Self) -> Self {
        libm::atan2(self, other)
    }
    #[inline]
    fn sqrt(self) -> Self {
        libm::sqrt(self)
    }
    #[inline]
    fn hypot(self, other: Self) -> Self {
        libm::hypot(self, other)
    }
    #[inline]
    fn abs(self) -> Self {
        libm::fabs(self)
    }
    #[inline]
    fn floor(self) -> Self {
        libm::floor(self)
    }
    #[inline]
    fn ceil(self) -> Self {
        libm::ceil(self)
    }
    #[inline]
    fn round(self) -> Self {
        libm::round(self)
    }
    #[inline]
    fn trunc(self) -> Self {
        libm::trunc(self)
    }
}
