// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Math fallbacks for `no_std` builds.

#[cfg(all(not(feature = "std"), not(feature = "libm")))]
compile_error!("limelight_display requires either the `std` or `libm` feature");

/// The float rounding methods drawing needs, provided by `libm` when `std`
/// is off.
#[cfg(not(feature = "std"))]
pub(crate) trait FloatExt {
    fn floor(self) -> Self;
    fn ceil(self) -> Self;
    fn trunc(self) -> Self;
}

#[cfg(not(feature = "std"))]
impl FloatExt for f64 {
    #[inline]
    fn floor(self) -> Self {
        libm::floor(self)
    }

    #[inline]
    fn ceil(self) -> Self {
        libm::ceil(self)
    }

    #[inline]
    fn trunc(self) -> Self {
        libm::trunc(self)
    }
}
