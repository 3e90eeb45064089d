#![forbid(unsafe_code)]

//! Field identities.
//!
//! A [`FieldIdentity`] names one editable style property inside a panel. It
//! pairs a symbolic [`FieldKind`] with an index so that repeated entries
//! (several dash segments, several colour-map rows) can coexist.
//!
//! Ordering is `(kind, index)` lexicographic, kinds compare in declaration
//! order.

use std::fmt;

/// Symbolic kind of a styled property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FieldKind {
    Unknown,
    Name,
    Title,
    Description,
    DefaultStyle,
    FillColour,
    FillOpacity,
    StrokeColour,
    StrokeOpacity,
    StrokeWidth,
    StrokeDashArray,
    StrokeDashOffset,
    StrokeLineJoin,
    StrokeLineCap,
    Size,
    Rotation,
    Opacity,
    Gap,
    InitialGap,
    AnchorPointH,
    AnchorPointV,
    DisplacementX,
    DisplacementY,
    WellKnownName,
    Geometry,
    Label,
    Font,
    HaloRadius,
    HaloColour,
    Align,
    ColourMap,
    FeatureTypeConstraint,
    TimePeriod,
    VendorOption,
}

impl FieldKind {
    /// Stable snake_case name, used in logs and entry descriptions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Name => "name",
            Self::Title => "title",
            Self::Description => "description",
            Self::DefaultStyle => "default_style",
            Self::FillColour => "fill_colour",
            Self::FillOpacity => "fill_opacity",
            Self::StrokeColour => "stroke_colour",
            Self::StrokeOpacity => "stroke_opacity",
            Self::StrokeWidth => "stroke_width",
            Self::StrokeDashArray => "stroke_dash_array",
            Self::StrokeDashOffset => "stroke_dash_offset",
            Self::StrokeLineJoin => "stroke_line_join",
            Self::StrokeLineCap => "stroke_line_cap",
            Self::Size => "size",
            Self::Rotation => "rotation",
            Self::Opacity => "opacity",
            Self::Gap => "gap",
            Self::InitialGap => "initial_gap",
            Self::AnchorPointH => "anchor_point_h",
            Self::AnchorPointV => "anchor_point_v",
            Self::DisplacementX => "displacement_x",
            Self::DisplacementY => "displacement_y",
            Self::WellKnownName => "well_known_name",
            Self::Geometry => "geometry",
            Self::Label => "label",
            Self::Font => "font",
            Self::HaloRadius => "halo_radius",
            Self::HaloColour => "halo_colour",
            Self::Align => "align",
            Self::ColourMap => "colour_map",
            Self::FeatureTypeConstraint => "feature_type_constraint",
            Self::TimePeriod => "time_period",
            Self::VendorOption => "vendor_option",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of a field within a registry.
///
/// Equal iff both kind and index match. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldIdentity {
    kind: FieldKind,
    index: u32,
}

impl FieldIdentity {
    /// Identity of a field that has not been registered anywhere yet.
    pub const UNKNOWN: Self = Self::new(FieldKind::Unknown);

    /// Identity with index 0.
    #[must_use]
    pub const fn new(kind: FieldKind) -> Self {
        Self { kind, index: 0 }
    }

    /// Identity of the `index`-th repeated entry of `kind`.
    #[must_use]
    pub const fn indexed(kind: FieldKind, index: u32) -> Self {
        Self { kind, index }
    }

    #[must_use]
    pub const fn kind(self) -> FieldKind {
        self.kind
    }

    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }
}

impl From<FieldKind> for FieldIdentity {
    fn from(kind: FieldKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for FieldIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index == 0 {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}[{}]", self.kind, self.index)
        }
    }
}
