// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Limelight Geom: geometry and display-state value types for a retained
//! 2D display list.
//!
//! - [`Matrix2D`]: a six-component affine matrix with `append`/`prepend`
//!   composition, transform-property builders, and [`Matrix2D::decompose`].
//! - [`DisplayProps`]: the visibility/alpha/shadow/compositing/matrix bundle
//!   inherited down an ancestor chain.
//! - [`rect`]: rectangle helpers over [`kurbo::Rect`] (emptiness,
//!   `Option`-returning intersection, conservative transformed bounding
//!   boxes).
//!
//! Angles on the transform builders are in degrees, matching display-object
//! transform properties. Points and rectangles are [`kurbo`] types so
//! results interoperate with the wider 2D ecosystem; [`Matrix2D`] converts
//! to and from [`kurbo::Affine`].
//!
//! ```
//! use limelight_geom::Matrix2D;
//! use kurbo::Point;
//!
//! let mut m = Matrix2D::IDENTITY;
//! m.append_transform(10.0, 20.0, 2.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0);
//! assert_eq!(m.transform_point(Point::new(1.0, 1.0)), Point::new(12.0, 22.0));
//!
//! let mut inv = m;
//! inv.invert();
//! assert_eq!(inv.transform_point(Point::new(12.0, 22.0)), Point::new(1.0, 1.0));
//! ```
//!
//! This crate is `no_std`; enable the `libm` feature for builds without
//! `std`.

#![cfg_attr(not(feature = "std"), no_std)]

mod common;
mod matrix;
mod props;
pub mod rect;

#[cfg(not(feature = "std"))]
pub use common::FloatExt;
pub use matrix::{DEG_TO_RAD, Decomposition, Matrix2D};
pub use props::{CompositeOperation, DisplayProps, Rgba, Shadow};
