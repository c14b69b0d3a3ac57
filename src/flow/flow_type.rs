use std::{fmt, io::Cursor, path::Path, sync::Arc};

use image::{ImageError, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::nodes::registry::NodeTypeId;

/// The kind of data flowing through a connector or stored in a content slot.
///
/// A kind doubles as the connector's type id: it is the registry id of the
/// constant node that produces values of that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Int,
    Real,
    Text,
    Image,
}

impl ValueKind {
    pub fn type_id(self) -> NodeTypeId {
        match self {
            ValueKind::Int => 0,
            ValueKind::Real => 1,
            ValueKind::Text => 2,
            ValueKind::Image => 3,
        }
    }

    pub fn from_type_id(id: NodeTypeId) -> Option<Self> {
        match id {
            0 => Some(ValueKind::Int),
            1 => Some(ValueKind::Real),
            2 => Some(ValueKind::Text),
            3 => Some(ValueKind::Image),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ValueKind::Int => write!(f, "Int"),
            ValueKind::Real => write!(f, "Float"),
            ValueKind::Text => write!(f, "String"),
            ValueKind::Image => write!(f, "Image"),
        }
    }
}

/// An immutable RGBA image shared between content slots and node outputs.
///
/// Cloning is cheap. Two images are equal when their pixels are.
#[derive(Clone)]
pub struct Image(Arc<RgbaImage>);

impl Image {
    pub fn new(pixels: RgbaImage) -> Self {
        Self(Arc::new(pixels))
    }

    /// The 1x1 transparent placeholder used as the default of image slots.
    pub fn blank() -> Self {
        Self::new(RgbaImage::new(1, 1))
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.0
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn from_png(bytes: &[u8]) -> Result<Self, ImageError> {
        let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
        Ok(Self::new(decoded.into_rgba8()))
    }

    pub fn to_png(&self) -> Result<Vec<u8>, ImageError> {
        let mut bytes = Cursor::new(Vec::new());
        self.0.write_to(&mut bytes, ImageFormat::Png)?;
        Ok(bytes.into_inner())
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        Ok(Self::new(image::open(path)?.into_rgba8()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ImageError> {
        self.0.save(path)
    }
}

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Image({}x{})", self.width(), self.height())
    }
}

/// A value held by a content slot or produced by a node.
///
/// The variant of a content slot is fixed by the schema default it was created
/// from; only `Value::None` carries no kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    Int(i32),
    Real(f32),
    Text(String),
    Image(Image),
    #[default]
    None,
}

impl Value {
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Int(_) => Some(ValueKind::Int),
            Value::Real(_) => Some(ValueKind::Real),
            Value::Text(_) => Some(ValueKind::Text),
            Value::Image(_) => Some(ValueKind::Image),
            Value::None => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f32> {
        match self {
            Value::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Image> {
        match self {
            Value::Image(v) => Some(v),
            _ => None,
        }
    }

    /// Parses user-entered text into a value of the given kind.
    ///
    /// Returns `None` if the text is not a valid literal of that kind. Images
    /// cannot be entered as text.
    pub fn parse(kind: Option<ValueKind>, raw: &str) -> Option<Value> {
        match kind {
            Some(ValueKind::Int) => raw.parse().ok().map(Value::Int),
            Some(ValueKind::Real) => raw.parse().ok().map(Value::Real),
            Some(ValueKind::Text) => Some(Value::Text(raw.to_owned())),
            Some(ValueKind::Image) => None,
            None => raw.is_empty().then_some(Value::None),
        }
    }
}

/// Plain textual form. Images have no textual form and render as their size.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
            Value::Image(v) => write!(f, "{}x{}", v.width(), v.height()),
            Value::None => Ok(()),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Image> for Value {
    fn from(v: Image) -> Self {
        Value::Image(v)
    }
}
