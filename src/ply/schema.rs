//! Schema model: elements and properties declared by a PLY header.
//!
//! The schema says nothing about where bytes live; it only fixes names,
//! types and order. Property order determines serialization order, element
//! order determines payload section order.

use crate::util::{Error, Result, ScalarType};

use super::format::{Encoding, DEFAULT_VERSION};

/// Layout of a single property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// One value per record.
    Scalar(ScalarType),
    /// A `count`-typed length followed by that many `value`-typed items.
    List { count: ScalarType, value: ScalarType },
}

/// A named property of an element.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropertyDescriptor {
    /// Property name.
    pub name: String,
    /// Scalar or list layout.
    pub kind: PropertyKind,
}

impl PropertyDescriptor {
    /// Create a scalar property.
    pub fn scalar(name: impl Into<String>, value: ScalarType) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Scalar(value),
        }
    }

    /// Create a list property. The count type must be an integer type.
    pub fn list(name: impl Into<String>, count: ScalarType, value: ScalarType) -> Result<Self> {
        if !count.is_integer() {
            return Err(Error::invalid(format!(
                "list count type must be an integer, got {count}"
            )));
        }
        Ok(Self {
            name: name.into(),
            kind: PropertyKind::List { count, value },
        })
    }

    /// Returns true for list properties.
    #[inline]
    pub fn is_list(&self) -> bool {
        matches!(self.kind, PropertyKind::List { .. })
    }

    /// Type of the value (or of each list item).
    #[inline]
    pub fn value_type(&self) -> ScalarType {
        match self.kind {
            PropertyKind::Scalar(value) | PropertyKind::List { value, .. } => value,
        }
    }

    /// Type of the list count, for list properties.
    #[inline]
    pub fn count_type(&self) -> Option<ScalarType> {
        match self.kind {
            PropertyKind::Scalar(_) => None,
            PropertyKind::List { count, .. } => Some(count),
        }
    }

    /// Encoded size in bytes, if it does not depend on the data.
    #[inline]
    pub fn fixed_size(&self) -> Option<usize> {
        match self.kind {
            PropertyKind::Scalar(value) => Some(value.num_bytes()),
            PropertyKind::List { .. } => None,
        }
    }

    /// The `property ...` header line, without terminator.
    pub fn header_line(&self) -> String {
        match self.kind {
            PropertyKind::Scalar(value) => format!("property {} {}", value.name(), self.name),
            PropertyKind::List { count, value } => format!(
                "property list {} {} {}",
                count.name(),
                value.name(),
                self.name
            ),
        }
    }
}

/// A named, counted collection of records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementDescriptor {
    /// Element name.
    pub name: String,
    /// Number of records, authoritative for reading and writing.
    pub count: usize,
    /// Properties in declaration order.
    pub properties: Vec<PropertyDescriptor>,
}

impl ElementDescriptor {
    /// Create an element with no properties.
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
            properties: Vec::new(),
        }
    }

    /// Append a property.
    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    /// Returns true if any property is a list.
    #[inline]
    pub fn has_list(&self) -> bool {
        self.properties.iter().any(PropertyDescriptor::is_list)
    }

    /// Byte size of one binary record when every property is scalar.
    pub fn record_size(&self) -> Option<usize> {
        self.properties.iter().map(PropertyDescriptor::fixed_size).sum()
    }

    /// Index of the first property with the given name.
    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == name)
    }

    /// Property lookup by name.
    pub fn property(&self, name: &str) -> Result<&PropertyDescriptor> {
        self.property_index(name)
            .map(|i| &self.properties[i])
            .ok_or_else(|| Error::PropertyNotFound {
                element: self.name.clone(),
                property: name.to_string(),
            })
    }

    /// Scalar types of every property, when the element is fixed-width.
    pub fn scalar_layout(&self) -> Option<Vec<ScalarType>> {
        self.properties
            .iter()
            .map(|p| match p.kind {
                PropertyKind::Scalar(value) => Some(value),
                PropertyKind::List { .. } => None,
            })
            .collect()
    }
}

/// Everything a PLY header declares.
#[derive(Clone, Debug, PartialEq)]
pub struct PlyHeader {
    /// Payload encoding.
    pub encoding: Encoding,
    /// Format version (`1.0` in practice).
    pub version: f32,
    /// Elements in declaration order, which is also payload order.
    pub elements: Vec<ElementDescriptor>,
    /// Comment lines, without the keyword.
    pub comments: Vec<String>,
    /// Object info tokens.
    pub obj_info: Vec<String>,
    /// Header size in bytes, terminator line included.
    pub header_len: u64,
}

impl PlyHeader {
    /// Create an empty header.
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            version: DEFAULT_VERSION,
            elements: Vec::new(),
            comments: Vec::new(),
            obj_info: Vec::new(),
            header_len: 0,
        }
    }

    /// Element names in declaration order.
    pub fn element_names(&self) -> Vec<&str> {
        self.elements.iter().map(|e| e.name.as_str()).collect()
    }

    /// Index of the element with the given name.
    pub fn element_index(&self, name: &str) -> Result<usize> {
        self.elements
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| Error::ElementNotFound(name.to_string()))
    }

    /// Element lookup by name.
    pub fn element(&self, name: &str) -> Result<&ElementDescriptor> {
        self.element_index(name).map(|i| &self.elements[i])
    }

    /// Mutable element lookup by name.
    pub fn element_mut(&mut self, name: &str) -> Result<&mut ElementDescriptor> {
        let index = self.element_index(name)?;
        Ok(&mut self.elements[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face() -> ElementDescriptor {
        ElementDescriptor::new("face", 2)
            .with_property(PropertyDescriptor::scalar("flags", ScalarType::Uint8))
            .with_property(
                PropertyDescriptor::list("vertex_indices", ScalarType::Uint8, ScalarType::Int32)
                    .unwrap(),
            )
    }

    #[test]
    fn test_record_size() {
        let vertex = ElementDescriptor::new("vertex", 1)
            .with_property(PropertyDescriptor::scalar("x", ScalarType::Float32))
            .with_property(PropertyDescriptor::scalar("y", ScalarType::Float32))
            .with_property(PropertyDescriptor::scalar("z", ScalarType::Float64))
            .with_property(PropertyDescriptor::scalar("red", ScalarType::Uint8));
        assert_eq!(vertex.record_size(), Some(17));
        assert!(!vertex.has_list());

        assert_eq!(face().record_size(), None);
        assert!(face().has_list());
        assert_eq!(face().scalar_layout(), None);
    }

    #[test]
    fn test_list_count_must_be_integer() {
        assert!(PropertyDescriptor::list("bad", ScalarType::Float32, ScalarType::Int32).is_err());
    }

    #[test]
    fn test_header_lines() {
        let face = face();
        assert_eq!(face.properties[0].header_line(), "property uchar flags");
        assert_eq!(
            face.properties[1].header_line(),
            "property list uchar int vertex_indices"
        );
    }

    #[test]
    fn test_lookup() {
        let mut header = PlyHeader::new(Encoding::Ascii);
        header.elements.push(ElementDescriptor::new("vertex", 3));
        header.elements.push(face());

        assert_eq!(header.element_names(), vec!["vertex", "face"]);
        assert_eq!(header.element_index("face").unwrap(), 1);
        assert!(matches!(
            header.element("edge"),
            Err(Error::ElementNotFound(ref n)) if n == "edge"
        ));

        let face = header.element("face").unwrap();
        assert_eq!(face.property("vertex_indices").unwrap().count_type(), Some(ScalarType::Uint8));
        assert!(matches!(
            face.property("nope"),
            Err(Error::PropertyNotFound { .. })
        ));
    }
}
