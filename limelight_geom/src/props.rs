// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inherited display state: the property bundle a display tree concatenates
//! along an ancestor chain, and the small value types it carries.

use crate::matrix::Matrix2D;

/// An RGBA color with 8 bits per channel, straight (non-premultiplied) alpha.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel; 0 is fully transparent.
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    /// Constructs a color from its four channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Constructs an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }
}

/// A drop shadow description.
///
/// This is pure state: surfaces carry it and may approximate the blur.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Shadow {
    /// Shadow color.
    pub color: Rgba,
    /// Horizontal offset in device pixels.
    pub offset_x: f64,
    /// Vertical offset in device pixels.
    pub offset_y: f64,
    /// Blur radius; zero is a hard-edged silhouette.
    pub blur: f64,
}

impl Shadow {
    /// The null shadow: transparent, no offset, no blur.
    pub const IDENTITY: Self = Self {
        color: Rgba::TRANSPARENT,
        offset_x: 0.0,
        offset_y: 0.0,
        blur: 0.0,
    };

    /// Constructs a shadow.
    pub const fn new(color: Rgba, offset_x: f64, offset_y: f64, blur: f64) -> Self {
        Self { color, offset_x, offset_y, blur }
    }
}

impl Default for Shadow {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Pixel compositing modes a surface must understand.
///
/// `None` on a display object means "inherit from the ancestor chain";
/// the enum itself is always a concrete mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CompositeOperation {
    /// Standard painter's blending; the default.
    #[default]
    SourceOver,
    /// New pixels render beneath existing content.
    DestinationOver,
    /// Existing content is erased where new pixels are opaque.
    DestinationOut,
    /// Additive blending.
    Lighter,
    /// New pixels replace existing content outright.
    Copy,
}

/// The display state inherited down a display tree: visibility, alpha,
/// shadow, compositing mode, and the concatenated transform.
///
/// [`DisplayProps::append`] folds a descendant's state under this one
/// (walking root-to-leaf); [`DisplayProps::prepend`] folds an ancestor's
/// state over it (walking leaf-to-root). Alpha multiplies and visibility
/// ANDs in both directions; shadow and compositing mode resolve to the
/// nearest explicit value for the direction walked.
#[derive(Clone, PartialEq, Debug)]
pub struct DisplayProps {
    /// Whether the subtree is visible.
    pub visible: bool,
    /// Concatenated opacity in `0.0..=1.0`.
    pub alpha: f64,
    /// Effective shadow, if any ancestor or self sets one.
    pub shadow: Option<Shadow>,
    /// Effective compositing mode, if any ancestor or self sets one.
    pub composite_operation: Option<CompositeOperation>,
    /// Concatenated transform.
    pub matrix: Matrix2D,
}

impl Default for DisplayProps {
    fn default() -> Self {
        Self {
            visible: true,
            alpha: 1.0,
            shadow: None,
            composite_operation: None,
            matrix: Matrix2D::IDENTITY,
        }
    }
}

impl DisplayProps {
    /// Constructs identity props: visible, opaque, no shadow or compositing
    /// override, identity matrix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets to identity props.
    pub fn identity(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }

    /// Folds a descendant's state under this bundle.
    ///
    /// The incoming shadow and compositing mode win over the existing ones.
    pub fn append(
        &mut self,
        visible: bool,
        alpha: f64,
        shadow: Option<Shadow>,
        composite_operation: Option<CompositeOperation>,
        matrix: Option<&Matrix2D>,
    ) -> &mut Self {
        self.alpha *= alpha;
        self.shadow = shadow.or(self.shadow);
        self.composite_operation = composite_operation.or(self.composite_operation);
        self.visible = self.visible && visible;
        if let Some(m) = matrix {
            self.matrix.append_matrix(m);
        }
        self
    }

    /// Folds an ancestor's state over this bundle.
    ///
    /// The existing shadow and compositing mode win over the incoming ones.
    pub fn prepend(
        &mut self,
        visible: bool,
        alpha: f64,
        shadow: Option<Shadow>,
        composite_operation: Option<CompositeOperation>,
        matrix: Option<&Matrix2D>,
    ) -> &mut Self {
        self.alpha *= alpha;
        self.shadow = self.shadow.or(shadow);
        self.composite_operation = self.composite_operation.or(composite_operation);
        self.visible = self.visible && visible;
        if let Some(m) = matrix {
            self.matrix.prepend_matrix(m);
        }
        self
    }
}
