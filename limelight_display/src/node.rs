// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node identity, behavior flags, and the per-node display payload.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use bitflags::bitflags;
use kurbo::Rect;

use limelight_geom::{CompositeOperation, Matrix2D, Rgba, Shadow};

use crate::cache::Filter;
use crate::pixmap::Pixmap;

/// Identifier for a node in a [`DisplayList`](crate::DisplayList).
///
/// This is a small, copyable handle that stays stable across updates but
/// becomes invalid when the underlying slot is reused.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On remove, the slot is freed; any existing `NodeId` that pointed to
///   that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a
///   new, distinct `NodeId`.
///
/// ### Liveness
///
/// Use [`DisplayList::is_alive`](crate::DisplayList::is_alive) to check
/// whether a `NodeId` still refers to a live node. Stale `NodeId`s never
/// alias a different live node because the generation must match.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    #[inline]
    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

bitflags! {
    /// Per-node behavior switches.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct NodeFlags: u8 {
        /// The node (and its subtree) renders and can be hit.
        const VISIBLE = 1 << 0;
        /// The node receives pointer events.
        const MOUSE_ENABLED = 1 << 1;
        /// Pointer events reach this container's descendants; when clear,
        /// hits inside the subtree report the container itself.
        const MOUSE_CHILDREN = 1 << 2;
        /// The node receives tick events.
        const TICK_ENABLED = 1 << 3;
        /// Ticks propagate into this container's children.
        const TICK_CHILDREN = 1 << 4;
        /// The node's translation is rounded to whole pixels while drawing,
        /// when the stage enables snapping.
        const SNAP_TO_PIXEL = 1 << 5;
        /// Marks a stage's own root container. Set by the stage, never by
        /// user code; the root cannot be cloned or reparented.
        const STAGE_ROOT = 1 << 6;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::all().difference(Self::STAGE_ROOT)
    }
}

/// An ordered list of colored, axis-aligned fill rectangles.
///
/// This is the minimal vector content a [`NodeKind::Shape`] carries; it is
/// enough to express solid shapes, masks, and hit areas. A full path
/// builder is deliberately out of scope.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct FillPath {
    rects: Vec<(Rect, Rgba)>,
}

impl FillPath {
    /// An empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the path has no fills.
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Appends a filled rectangle.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) -> &mut Self {
        self.rects.push((rect, color));
        self
    }

    /// Removes all fills.
    pub fn clear(&mut self) -> &mut Self {
        self.rects.clear();
        self
    }

    /// The fills in paint order.
    pub fn fills(&self) -> &[(Rect, Rgba)] {
        &self.rects
    }

    /// Just the rectangles, e.g. for use as a clip region.
    pub fn rects(&self) -> impl Iterator<Item = Rect> + '_ {
        self.rects.iter().map(|(r, _)| *r)
    }

    /// The union of all fill rectangles, or `None` when empty.
    pub fn bounds(&self) -> Option<Rect> {
        let mut iter = self.rects();
        let first = iter.next()?;
        Some(iter.fold(first, limelight_geom::rect::union))
    }
}

/// Raster content of a [`NodeKind::Bitmap`].
#[derive(Clone, Debug, Default)]
pub struct BitmapData {
    /// The source image; `None` until loaded.
    pub image: Option<Arc<Pixmap>>,
    /// Optional sub-region of the image to display, in image coordinates.
    pub source_rect: Option<Rect>,
}

/// Frame-based raster content of a [`NodeKind::Sprite`].
///
/// Timeline control (frame advancing, labels, animations) is out of scope;
/// the sprite renders whichever frame `frame` addresses.
#[derive(Clone, Debug, Default)]
pub struct SpriteData {
    /// Frame images.
    pub frames: Vec<Arc<Pixmap>>,
    /// Index of the displayed frame.
    pub frame: usize,
}

impl SpriteData {
    /// The currently displayed frame, if the index addresses one.
    pub fn current_frame(&self) -> Option<&Arc<Pixmap>> {
        self.frames.get(self.frame)
    }
}

/// Text content with deterministic cell metrics.
///
/// Real text layout is out of scope; each character occupies a fixed-size
/// cell on a single line, which keeps bounds and raster output exact for
/// hit testing.
#[derive(Clone, Debug)]
pub struct TextData {
    /// The text to render.
    pub text: String,
    /// Advance per character.
    pub char_width: f64,
    /// Cell height.
    pub line_height: f64,
    /// Fill color for the cells.
    pub color: Rgba,
}

impl Default for TextData {
    fn default() -> Self {
        Self {
            text: String::new(),
            char_width: 8.0,
            line_height: 16.0,
            color: Rgba::BLACK,
        }
    }
}

impl TextData {
    /// The rendered size: `chars * char_width` by `line_height`.
    pub fn measure(&self) -> (f64, f64) {
        let count = self.text.chars().count();
        let w = count as f64 * self.char_width;
        (w, self.line_height)
    }
}

/// Glyph-sheet text content of a [`NodeKind::BitmapText`].
///
/// The sheet is a fixed grid of `16` glyph cells per row, indexed from
/// `' '` (0x20) in codepoint order.
#[derive(Clone, Debug, Default)]
pub struct BitmapTextData {
    /// The text to render.
    pub text: String,
    /// The glyph sheet; `None` until loaded.
    pub sheet: Option<Arc<Pixmap>>,
    /// Width of one glyph cell in the sheet.
    pub glyph_width: f64,
    /// Height of one glyph cell in the sheet.
    pub glyph_height: f64,
}

impl BitmapTextData {
    /// Source rect of `ch` within the sheet.
    pub fn glyph_rect(&self, ch: char) -> Rect {
        let index = (ch as u32).saturating_sub(0x20);
        let col = f64::from(index % 16);
        let row = f64::from(index / 16);
        Rect::new(
            col * self.glyph_width,
            row * self.glyph_height,
            (col + 1.0) * self.glyph_width,
            (row + 1.0) * self.glyph_height,
        )
    }
}

/// What a node renders.
///
/// The set is closed: every renderable the tree supports is a variant, and
/// traversal matches on it rather than dispatching through a trait object.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// An ordered list of children; renders nothing of its own.
    Container,
    /// Vector content as colored fill rectangles.
    Shape(FillPath),
    /// A raster image, optionally windowed by a source rect.
    Bitmap(BitmapData),
    /// One frame of a frame list.
    Sprite(SpriteData),
    /// Fixed-metric text cells.
    Text(TextData),
    /// Glyph-sheet text.
    BitmapText(BitmapTextData),
    /// An externally positioned overlay; renders nothing and does not
    /// receive pointer events by default.
    DomElement,
}

impl NodeKind {
    /// Whether the node is a container.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Container)
    }

    /// Whether the kind has anything to render, ignoring caches and
    /// children (the tree folds those in).
    pub(crate) fn has_content(&self) -> bool {
        match self {
            Self::Container => false,
            Self::Shape(path) => !path.is_empty(),
            Self::Bitmap(data) => data.image.is_some(),
            Self::Sprite(data) => data.current_frame().is_some(),
            Self::Text(data) => !data.text.is_empty(),
            Self::BitmapText(data) => !data.text.is_empty() && data.sheet.is_some(),
            Self::DomElement => true,
        }
    }

    /// Intrinsic bounds implied by the content, in local coordinates.
    pub(crate) fn intrinsic_bounds(&self) -> Option<Rect> {
        match self {
            Self::Container | Self::Shape(_) | Self::DomElement => None,
            Self::Bitmap(data) => {
                if let Some(src) = data.source_rect {
                    Some(Rect::new(0.0, 0.0, src.width(), src.height()))
                } else {
                    data.image
                        .as_ref()
                        .map(|img| Rect::new(0.0, 0.0, f64::from(img.width()), f64::from(img.height())))
                }
            }
            Self::Sprite(data) => data
                .current_frame()
                .map(|img| Rect::new(0.0, 0.0, f64::from(img.width()), f64::from(img.height()))),
            Self::Text(data) => {
                let (w, h) = data.measure();
                Some(Rect::new(0.0, 0.0, w, h))
            }
            Self::BitmapText(data) => {
                let count = data.text.chars().count();
                let w = count as f64 * data.glyph_width;
                Some(Rect::new(0.0, 0.0, w, data.glyph_height))
            }
        }
    }
}

/// The user-settable payload of a node: transform properties, visual
/// state, behavior flags, and content.
///
/// Structural data (parent, children, listeners, the cache) lives on the
/// tree, so mutating a `DisplayObject` can never corrupt tree invariants.
///
/// Angles are in degrees. The transform is derived from the nine
/// properties unless [`DisplayObject::transform_matrix`] overrides it
/// wholesale.
#[derive(Clone)]
pub struct DisplayObject {
    /// Horizontal position relative to the parent.
    pub x: f64,
    /// Vertical position relative to the parent.
    pub y: f64,
    /// Horizontal scale factor.
    pub scale_x: f64,
    /// Vertical scale factor.
    pub scale_y: f64,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Horizontal skew in degrees.
    pub skew_x: f64,
    /// Vertical skew in degrees.
    pub skew_y: f64,
    /// Horizontal registration point, offsetting the local origin.
    pub reg_x: f64,
    /// Vertical registration point.
    pub reg_y: f64,
    /// Opacity in `0.0..=1.0`, concatenated multiplicatively down the tree.
    pub alpha: f64,
    /// When set, replaces the matrix derived from the nine transform
    /// properties.
    pub transform_matrix: Option<Matrix2D>,
    /// Drop shadow applied while drawing.
    pub shadow: Option<Shadow>,
    /// Compositing mode; `None` inherits from the ancestor chain.
    pub composite_operation: Option<CompositeOperation>,
    /// Filters applied when the node is cached. Cloning a node shares the
    /// filter instances.
    pub filters: Vec<Rc<dyn Filter>>,
    /// A Shape node clipping this node's rendering and hits. The mask is
    /// positioned in this node's parent coordinate space and need not be
    /// part of the tree.
    pub mask: Option<NodeId>,
    /// A node standing in for this one during hit tests. Hit areas are
    /// never rendered and never recursed into.
    pub hit_area: Option<NodeId>,
    /// Cursor to show while the pointer hovers this node. A set cursor
    /// also makes the node an active pointer target.
    pub cursor: Option<String>,
    /// Optional name for [`child_by_name`](crate::DisplayList::child_by_name).
    pub name: Option<String>,
    /// Manual bounds override, in local coordinates.
    pub bounds: Option<Rect>,
    /// Behavior switches; see [`NodeFlags`].
    pub flags: NodeFlags,
    /// What the node renders.
    pub kind: NodeKind,
}

impl Default for DisplayObject {
    fn default() -> Self {
        Self::container()
    }
}

impl fmt::Debug for DisplayObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayObject")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("scale_x", &self.scale_x)
            .field("scale_y", &self.scale_y)
            .field("rotation", &self.rotation)
            .field("alpha", &self.alpha)
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("filters", &self.filters.len())
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl DisplayObject {
    fn with_kind(kind: NodeKind) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
            reg_x: 0.0,
            reg_y: 0.0,
            alpha: 1.0,
            transform_matrix: None,
            shadow: None,
            composite_operation: None,
            filters: Vec::new(),
            mask: None,
            hit_area: None,
            cursor: None,
            name: None,
            bounds: None,
            flags: NodeFlags::default(),
            kind,
        }
    }

    /// A container node payload.
    pub fn container() -> Self {
        Self::with_kind(NodeKind::Container)
    }

    /// A shape node payload.
    pub fn shape(path: FillPath) -> Self {
        Self::with_kind(NodeKind::Shape(path))
    }

    /// A bitmap node payload.
    pub fn bitmap(data: BitmapData) -> Self {
        Self::with_kind(NodeKind::Bitmap(data))
    }

    /// A sprite node payload.
    pub fn sprite(data: SpriteData) -> Self {
        Self::with_kind(NodeKind::Sprite(data))
    }

    /// A text node payload.
    pub fn text(data: TextData) -> Self {
        Self::with_kind(NodeKind::Text(data))
    }

    /// A bitmap-text node payload.
    pub fn bitmap_text(data: BitmapTextData) -> Self {
        Self::with_kind(NodeKind::BitmapText(data))
    }

    /// A DOM-overlay node payload: invisible to the surface and to the
    /// pointer by default.
    pub fn dom_element() -> Self {
        let mut obj = Self::with_kind(NodeKind::DomElement);
        obj.flags.remove(NodeFlags::MOUSE_ENABLED);
        obj
    }

    /// Sets position, scale, rotation, skew, and registration in one call.
    pub fn set_transform(
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
        self.x = x;
        self.y = y;
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self.rotation = rotation;
        self.skew_x = skew_x;
        self.skew_y = skew_y;
        self.reg_x = reg_x;
        self.reg_y = reg_y;
        self
    }

    /// The node's local transform: [`DisplayObject::transform_matrix`] if
    /// set, else the matrix generated from the nine transform properties.
    pub fn matrix(&self) -> Matrix2D {
        if let Some(m) = self.transform_matrix {
            return m;
        }
        let mut m = Matrix2D::IDENTITY;
        m.append_transform(
            self.x,
            self.y,
            self.scale_x,
            self.scale_y,
            self.rotation,
            self.skew_x,
            self.skew_y,
            self.reg_x,
            self.reg_y,
        );
        m
    }

    /// Whether the VISIBLE flag is set.
    pub fn visible(&self) -> bool {
        self.flags.contains(NodeFlags::VISIBLE)
    }

    /// Sets or clears the VISIBLE flag.
    pub fn set_visible(&mut self, visible: bool) -> &mut Self {
        self.flags.set(NodeFlags::VISIBLE, visible);
        self
    }

    /// Whether the MOUSE_ENABLED flag is set.
    pub fn mouse_enabled(&self) -> bool {
        self.flags.contains(NodeFlags::MOUSE_ENABLED)
    }

    /// Sets or clears the MOUSE_ENABLED flag.
    pub fn set_mouse_enabled(&mut self, enabled: bool) -> &mut Self {
        self.flags.set(NodeFlags::MOUSE_ENABLED, enabled);
        self
    }

    /// Whether the MOUSE_CHILDREN flag is set.
    pub fn mouse_children(&self) -> bool {
        self.flags.contains(NodeFlags::MOUSE_CHILDREN)
    }

    /// Sets or clears the MOUSE_CHILDREN flag.
    pub fn set_mouse_children(&mut self, enabled: bool) -> &mut Self {
        self.flags.set(NodeFlags::MOUSE_CHILDREN, enabled);
        self
    }
}
