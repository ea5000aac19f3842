//! Typed vertex and face records.

use bytemuck::{Pod, Zeroable};
use glam::{DVec3, Vec3};

use crate::ply::{ElementDescriptor, PropertyDescriptor, PropertyKind, PropertyValue, Record};
use crate::util::{Error, Result, Scalar, ScalarType};

/// Property names accepted for face indices, in lookup order.
const FACE_INDEX_NAMES: [&str; 2] = ["vertex_indices", "vertex_index"];

/// A Rust type that maps to the records of one PLY element.
///
/// Decoding matches properties by name, so files that order or type their
/// properties differently still convert as long as the values fit.
pub trait PlyRecord: Sized {
    /// Element name this type is written as.
    const ELEMENT: &'static str;

    /// Properties written for this type, in order.
    fn properties() -> Vec<PropertyDescriptor>;

    /// Convert a decoded record of `element`.
    fn from_record(element: &ElementDescriptor, record: &Record) -> Result<Self>;

    /// Build a record matching [`PlyRecord::properties`].
    fn to_record(&self) -> Result<Record>;
}

/// A [`PlyRecord`] whose memory layout is exactly its packed binary record.
///
/// `LAYOUT` lists the scalar type of each field in declaration order; the
/// sizes must add up to `size_of::<Self>()`.
pub trait PodRecord: PlyRecord + Pod {
    const LAYOUT: &'static [ScalarType];
}

fn scalar_field(element: &ElementDescriptor, record: &Record, name: &str) -> Result<Scalar> {
    record
        .field(element, name)?
        .as_scalar()
        .ok_or_else(|| Error::mismatch(format!("scalar '{}.{name}'", element.name), "list"))
}

fn float_field(element: &ElementDescriptor, record: &Record, name: &str) -> Result<f64> {
    Ok(scalar_field(element, record, name)?.as_f64())
}

fn u8_field(element: &ElementDescriptor, record: &Record, name: &str) -> Result<u8> {
    let value = scalar_field(element, record, name)?;
    value
        .as_i64()
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(|| Error::mismatch(format!("0..=255 for '{}.{name}'", element.name), value.to_string()))
}

/// Triangle indices from the first face index property found.
fn triangle(element: &ElementDescriptor, record: &Record) -> Result<[i64; 3]> {
    let name = FACE_INDEX_NAMES
        .iter()
        .copied()
        .find(|name| element.property_index(name).is_some())
        .ok_or_else(|| Error::PropertyNotFound {
            element: element.name.clone(),
            property: FACE_INDEX_NAMES[0].to_string(),
        })?;

    let items = record
        .field(element, name)?
        .as_list()
        .ok_or_else(|| Error::mismatch(format!("list '{}.{name}'", element.name), "scalar"))?;
    let [a, b, c] = items else {
        return Err(Error::invalid(format!(
            "face with {} vertices, only triangles are supported",
            items.len()
        )));
    };

    let index = |s: &Scalar| {
        s.as_i64()
            .ok_or_else(|| Error::mismatch("integer vertex index", s.to_string()))
    };
    Ok([index(a)?, index(b)?, index(c)?])
}

fn index_list() -> PropertyDescriptor {
    PropertyDescriptor {
        name: FACE_INDEX_NAMES[0].to_string(),
        kind: PropertyKind::List {
            count: ScalarType::Uint8,
            value: ScalarType::Int32,
        },
    }
}

fn xyz(ty: ScalarType) -> Vec<PropertyDescriptor> {
    ["x", "y", "z"]
        .into_iter()
        .map(|axis| PropertyDescriptor::scalar(axis, ty))
        .collect()
}

/// Colored vertex: position plus 8-bit RGB.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Vertex {
    pub fn new(position: Vec3, color: [u8; 3]) -> Self {
        Self {
            x: position.x,
            y: position.y,
            z: position.z,
            red: color[0],
            green: color[1],
            blue: color[2],
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    #[inline]
    pub fn color(&self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }
}

impl PlyRecord for Vertex {
    const ELEMENT: &'static str = "vertex";

    fn properties() -> Vec<PropertyDescriptor> {
        let mut props = xyz(ScalarType::Float32);
        for channel in ["red", "green", "blue"] {
            props.push(PropertyDescriptor::scalar(channel, ScalarType::Uint8));
        }
        props
    }

    fn from_record(element: &ElementDescriptor, record: &Record) -> Result<Self> {
        Ok(Self {
            x: float_field(element, record, "x")? as f32,
            y: float_field(element, record, "y")? as f32,
            z: float_field(element, record, "z")? as f32,
            red: u8_field(element, record, "red")?,
            green: u8_field(element, record, "green")?,
            blue: u8_field(element, record, "blue")?,
        })
    }

    fn to_record(&self) -> Result<Record> {
        Ok(Record::new(vec![
            self.x.into(),
            self.y.into(),
            self.z.into(),
            self.red.into(),
            self.green.into(),
            self.blue.into(),
        ]))
    }
}

/// Uncolored single precision vertex.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct VertexMono {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl VertexMono {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

impl From<Vec3> for VertexMono {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<VertexMono> for Vec3 {
    fn from(v: VertexMono) -> Self {
        v.position()
    }
}

impl PlyRecord for VertexMono {
    const ELEMENT: &'static str = "vertex";

    fn properties() -> Vec<PropertyDescriptor> {
        xyz(ScalarType::Float32)
    }

    fn from_record(element: &ElementDescriptor, record: &Record) -> Result<Self> {
        Ok(Self::new(
            float_field(element, record, "x")? as f32,
            float_field(element, record, "y")? as f32,
            float_field(element, record, "z")? as f32,
        ))
    }

    fn to_record(&self) -> Result<Record> {
        Ok(Record::new(vec![self.x.into(), self.y.into(), self.z.into()]))
    }
}

impl PodRecord for VertexMono {
    const LAYOUT: &'static [ScalarType] = &[ScalarType::Float32; 3];
}

/// Uncolored double precision vertex.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct VertexMono64 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl VertexMono64 {
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn position(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }
}

impl From<DVec3> for VertexMono64 {
    fn from(v: DVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<VertexMono64> for DVec3 {
    fn from(v: VertexMono64) -> Self {
        v.position()
    }
}

impl PlyRecord for VertexMono64 {
    const ELEMENT: &'static str = "vertex";

    fn properties() -> Vec<PropertyDescriptor> {
        xyz(ScalarType::Float64)
    }

    fn from_record(element: &ElementDescriptor, record: &Record) -> Result<Self> {
        Ok(Self::new(
            float_field(element, record, "x")?,
            float_field(element, record, "y")?,
            float_field(element, record, "z")?,
        ))
    }

    fn to_record(&self) -> Result<Record> {
        Ok(Record::new(vec![self.x.into(), self.y.into(), self.z.into()]))
    }
}

impl PodRecord for VertexMono64 {
    const LAYOUT: &'static [ScalarType] = &[ScalarType::Float64; 3];
}

/// Triangle with 32-bit vertex indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Face32 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Face32 {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn indices(&self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[i32; 3]> for Face32 {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl PlyRecord for Face32 {
    const ELEMENT: &'static str = "face";

    fn properties() -> Vec<PropertyDescriptor> {
        vec![index_list()]
    }

    fn from_record(element: &ElementDescriptor, record: &Record) -> Result<Self> {
        let narrow = |v: i64| {
            i32::try_from(v).map_err(|_| Error::invalid(format!("vertex index {v} overflows i32")))
        };
        let [x, y, z] = triangle(element, record)?;
        Ok(Self::new(narrow(x)?, narrow(y)?, narrow(z)?))
    }

    fn to_record(&self) -> Result<Record> {
        Ok(Record::new(vec![self.indices().into_iter().collect()]))
    }
}

/// Triangle with 64-bit vertex indices.
///
/// PLY has no 64-bit integer type, so indices are written as `int` and must
/// fit in an `i32`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Face64 {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Face64 {
    #[inline]
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn indices(&self) -> [i64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[i64; 3]> for Face64 {
    fn from([x, y, z]: [i64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<Face32> for Face64 {
    fn from(f: Face32) -> Self {
        Self::new(f.x.into(), f.y.into(), f.z.into())
    }
}

impl PlyRecord for Face64 {
    const ELEMENT: &'static str = "face";

    fn properties() -> Vec<PropertyDescriptor> {
        vec![index_list()]
    }

    fn from_record(element: &ElementDescriptor, record: &Record) -> Result<Self> {
        triangle(element, record).map(Self::from)
    }

    fn to_record(&self) -> Result<Record> {
        let items = self
            .indices()
            .into_iter()
            .map(|v| {
                i32::try_from(v)
                    .map_err(|_| Error::invalid(format!("vertex index {v} does not fit a PLY int")))
            })
            .collect::<Result<Vec<i32>>>()?;
        Ok(Record::new(vec![items.into_iter().collect::<PropertyValue>()]))
    }
}
