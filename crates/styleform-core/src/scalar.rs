#![forbid(unsafe_code)]

//! Typed literal values and the declared-type tag of a field.
//!
//! A field's [`DataType`] is only known when its panel is built, so typing is
//! checked at runtime: [`DataType::coerce`] is the single gate every raw value
//! passes through before it can become a field's constant.
//!
//! # Coercion rules
//!
//! | Declared     | Accepts                                             |
//! |--------------|-----------------------------------------------------|
//! | `Integer`    | integers, doubles (truncated), whole-number text    |
//! | `Double`     | doubles, integers, numeric text                     |
//! | `Boolean`    | booleans, `"true"` / `"false"` (any case)           |
//! | `String`     | anything (rendered through its display form)        |
//! | `Enum`       | text                                                |
//! | `Geometry`   | text (well-known text is not validated here)        |
//! | `Colour`     | colours, `#RRGGBB` / `#RRGGBBAA` text               |
//! | `Date`       | dates, ISO-8601 or `dd-mm-yyyy` text                |
//! | composites   | the same composite only                             |
//!
//! Anything else is a [`FieldError::MalformedValue`].

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{FieldError, Result};

const DATE_DISPLAY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%d-%m-%Y %H:%M:%S"];
const DATE_ONLY_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d-%m-%Y"];

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DataType {
    String,
    Integer,
    Double,
    Boolean,
    Date,
    Geometry,
    Colour,
    Enum,
    Font,
    ColourMap,
    FeatureTypeConstraint,
}

impl DataType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Geometry => "geometry",
            Self::Colour => "colour",
            Self::Enum => "enum",
            Self::Font => "font",
            Self::ColourMap => "colour_map",
            Self::FeatureTypeConstraint => "feature_type_constraint",
        }
    }

    /// Whether a [`NumericConfig`](crate::numeric::NumericConfig) applies.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Double)
    }

    /// The value a field of this type holds when nothing else was specified.
    #[must_use]
    pub fn zero_value(self) -> Scalar {
        match self {
            Self::String => Scalar::String(String::new()),
            Self::Integer => Scalar::Integer(0),
            Self::Double => Scalar::Double(0.0),
            Self::Boolean => Scalar::Boolean(false),
            Self::Date => Scalar::Date(NaiveDateTime::default()),
            Self::Geometry => Scalar::Geometry(String::new()),
            Self::Colour => Scalar::Colour(Colour::BLACK),
            Self::Enum => Scalar::Enum(String::new()),
            Self::Font => Scalar::Font(Font::default()),
            Self::ColourMap => Scalar::ColourMap(ColourMap::default()),
            Self::FeatureTypeConstraint => Scalar::FeatureTypeConstraints(Vec::new()),
        }
    }

    /// Convert `raw` into a scalar of this type.
    pub fn coerce(self, raw: Scalar) -> Result<Scalar> {
        match (self, raw) {
            (Self::String, Scalar::String(s)) => Ok(Scalar::String(s)),
            (Self::String, other) => Ok(Scalar::String(other.to_string())),

            (Self::Integer, Scalar::Integer(i)) => Ok(Scalar::Integer(i)),
            (Self::Integer, Scalar::Double(d)) => truncate(d)
                .map(Scalar::Integer)
                .ok_or_else(|| FieldError::malformed(self, d.to_string())),
            (Self::Integer, Scalar::String(s) | Scalar::Enum(s)) => parse_integer(&s)
                .map(Scalar::Integer)
                .ok_or_else(|| FieldError::malformed(self, s)),

            (Self::Double, Scalar::Double(d)) if d.is_finite() => Ok(Scalar::Double(d)),
            (Self::Double, Scalar::Integer(i)) => Ok(Scalar::Double(i as f64)),
            (Self::Double, Scalar::String(s) | Scalar::Enum(s)) => parse_double(&s)
                .map(Scalar::Double)
                .ok_or_else(|| FieldError::malformed(self, s)),

            (Self::Boolean, Scalar::Boolean(b)) => Ok(Scalar::Boolean(b)),
            (Self::Boolean, Scalar::String(s) | Scalar::Enum(s)) => {
                match s.trim().to_ascii_lowercase().as_str() {
                    "true" => Ok(Scalar::Boolean(true)),
                    "false" => Ok(Scalar::Boolean(false)),
                    _ => Err(FieldError::malformed(self, s)),
                }
            }

            (Self::Enum, Scalar::Enum(s) | Scalar::String(s)) => Ok(Scalar::Enum(s)),

            (Self::Geometry, Scalar::Geometry(s) | Scalar::String(s)) => {
                Ok(Scalar::Geometry(s.trim().to_string()))
            }

            (Self::Colour, Scalar::Colour(c)) => Ok(Scalar::Colour(c)),
            (Self::Colour, Scalar::String(s)) => s
                .parse::<Colour>()
                .map(Scalar::Colour)
                .map_err(|_| FieldError::malformed(self, s)),

            (Self::Date, Scalar::Date(d)) => Ok(Scalar::Date(d)),
            (Self::Date, Scalar::String(s)) => parse_date(&s)
                .map(Scalar::Date)
                .ok_or_else(|| FieldError::malformed(self, s)),

            (Self::Font, Scalar::Font(f)) => Ok(Scalar::Font(f)),
            (Self::ColourMap, Scalar::ColourMap(m)) => Ok(Scalar::ColourMap(m)),
            (Self::FeatureTypeConstraint, Scalar::FeatureTypeConstraints(c)) => {
                Ok(Scalar::FeatureTypeConstraints(c))
            }

            (_, other) => Err(FieldError::malformed(self, other.to_string())),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_double(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|d| d.is_finite())
}

/// `"12"` and `"12.0"` parse; `"12.7"` does not.
fn parse_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>()
        .ok()
        .or_else(|| parse_double(s).filter(|d| d.fract() == 0.0).and_then(truncate))
}

fn truncate(d: f64) -> Option<i64> {
    let t = d.trunc();
    (t.is_finite() && t >= i64::MIN as f64 && t <= i64::MAX as f64).then_some(t as i64)
}

fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_ONLY_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// A typed literal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scalar {
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    Date(NaiveDateTime),
    /// Geometry as well-known text.
    Geometry(String),
    Colour(Colour),
    /// One entry of a fixed option list (combo box value).
    Enum(String),
    Font(Font),
    ColourMap(ColourMap),
    FeatureTypeConstraints(Vec<FeatureTypeConstraint>),
}

impl Scalar {
    /// The declared type this scalar naturally belongs to.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::String(_) => DataType::String,
            Self::Integer(_) => DataType::Integer,
            Self::Double(_) => DataType::Double,
            Self::Boolean(_) => DataType::Boolean,
            Self::Date(_) => DataType::Date,
            Self::Geometry(_) => DataType::Geometry,
            Self::Colour(_) => DataType::Colour,
            Self::Enum(_) => DataType::Enum,
            Self::Font(_) => DataType::Font,
            Self::ColourMap(_) => DataType::ColourMap,
            Self::FeatureTypeConstraints(_) => DataType::FeatureTypeConstraint,
        }
    }

    /// Whether this literal renders as a bare (unquoted) token in expressions.
    #[must_use]
    pub const fn is_bare(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Double(_) | Self::Boolean(_))
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) | Self::Geometry(s) | Self::Enum(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d:?}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{}", d.format(DATE_DISPLAY_FORMAT)),
            Self::Colour(c) => write!(f, "{c}"),
            Self::Font(font) => write!(f, "{font}"),
            Self::ColourMap(map) => write!(f, "{map}"),
            Self::FeatureTypeConstraints(list) => {
                for (i, c) in list.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{c}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Colour> for Scalar {
    fn from(v: Colour) -> Self {
        Self::Colour(v)
    }
}

impl From<Font> for Scalar {
    fn from(v: Font) -> Self {
        Self::Font(v)
    }
}

impl From<ColourMap> for Scalar {
    fn from(v: ColourMap) -> Self {
        Self::ColourMap(v)
    }
}

impl From<NaiveDateTime> for Scalar {
    fn from(v: NaiveDateTime) -> Self {
        Self::Date(v)
    }
}

impl From<Vec<FeatureTypeConstraint>> for Scalar {
    fn from(v: Vec<FeatureTypeConstraint>) -> Self {
        Self::FeatureTypeConstraints(v)
    }
}

// ---------------------------------------------------------------------------
// Colour
// ---------------------------------------------------------------------------

/// RGBA colour. Displays as `#RRGGBB`, or `#RRGGBBAA` when not opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Colour {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Alpha as a 0..=1 opacity.
    #[must_use]
    pub fn opacity(self) -> f64 {
        f64::from(self.a) / 255.0
    }
}

/// Error from parsing a colour string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseColourError(pub String);

impl fmt::Display for ParseColourError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a #RRGGBB colour: {:?}", self.0)
    }
}

impl std::error::Error for ParseColourError {}

impl FromStr for Colour {
    type Err = ParseColourError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let err = || ParseColourError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.is_ascii() || !(hex.len() == 6 || hex.len() == 8) {
            return Err(err());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        let alpha = if hex.len() == 8 { byte(6)? } else { 255 };
        Ok(Self::rgba(byte(0)?, byte(2)?, byte(4)?, alpha))
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02X}", self.a)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Font
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Text symbolizer font.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Font {
    pub family: String,
    pub style: FontStyle,
    pub weight: FontWeight,
    pub size: f64,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: "Serif".to_string(),
            style: FontStyle::Normal,
            weight: FontWeight::Normal,
            size: 10.0,
        }
    }
}

impl fmt::Display for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = match self.style {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
            FontStyle::Oblique => "oblique",
        };
        let weight = match self.weight {
            FontWeight::Normal => "normal",
            FontWeight::Bold => "bold",
        };
        write!(f, "{} {style} {weight} {:?}", self.family, self.size)
    }
}

// ---------------------------------------------------------------------------
// Colour map
// ---------------------------------------------------------------------------

/// One row of a raster colour map.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColourMapEntry {
    pub colour: Colour,
    pub opacity: f64,
    pub quantity: f64,
    pub label: Option<String>,
}

impl fmt::Display for ColourMapEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}:{:?}", self.colour, self.opacity, self.quantity)?;
        if let Some(label) = &self.label {
            write!(f, ":{label}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColourMap {
    pub entries: Vec<ColourMapEntry>,
}

impl ColourMap {
    #[must_use]
    pub fn new(entries: Vec<ColourMapEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for ColourMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Feature type constraint
// ---------------------------------------------------------------------------

/// Restricts a user layer to one feature type, optionally filtered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureTypeConstraint {
    pub feature_type_name: String,
    pub filter: Option<String>,
}

impl FeatureTypeConstraint {
    #[must_use]
    pub fn new(feature_type_name: impl Into<String>) -> Self {
        Self {
            feature_type_name: feature_type_name.into(),
            filter: None,
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

impl fmt::Display for FeatureTypeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filter {
            Some(filter) => write!(f, "{}[{filter}]", self.feature_type_name),
            None => f.write_str(&self.feature_type_name),
        }
    }
}
