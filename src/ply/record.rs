//! Decoded records.

use smallvec::SmallVec;

use crate::util::{Error, Result, Scalar};

use super::schema::{ElementDescriptor, PropertyKind};

/// Items of a list property. Faces rarely exceed four indices.
pub type ListValue = SmallVec<[Scalar; 4]>;

/// Value of one property within a record.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Scalar(Scalar),
    List(ListValue),
}

impl PropertyValue {
    /// The scalar value, if this is not a list.
    #[inline]
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::List(_) => None,
        }
    }

    /// The list items, if this is a list.
    #[inline]
    pub fn as_list(&self) -> Option<&[Scalar]> {
        match self {
            Self::Scalar(_) => None,
            Self::List(items) => Some(items),
        }
    }
}

macro_rules! impl_value_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for PropertyValue {
                #[inline]
                fn from(v: $ty) -> Self {
                    Self::Scalar(v.into())
                }
            }
        )*
    };
}

impl_value_from!(Scalar, i8, u8, i16, u16, i32, u32, f32, f64);

impl<T: Into<Scalar>> FromIterator<T> for PropertyValue {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::List(iter.into_iter().map(Into::into).collect())
    }
}

/// One record: a value per property, in declaration order.
///
/// Records own their data and keep no reference to the header they were
/// decoded with.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    values: Vec<PropertyValue>,
}

impl Record {
    /// Create a record from values in property order.
    pub fn new(values: Vec<PropertyValue>) -> Self {
        Self { values }
    }

    /// Create an empty record with room for `n` values.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            values: Vec::with_capacity(n),
        }
    }

    /// Append the value of the next property.
    pub fn push(&mut self, value: impl Into<PropertyValue>) {
        self.values.push(value.into());
    }

    /// Values in property order.
    #[inline]
    pub fn values(&self) -> &[PropertyValue] {
        &self.values
    }

    /// Consume the record.
    #[inline]
    pub fn into_values(self) -> Vec<PropertyValue> {
        self.values
    }

    /// Number of values.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the record has no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at property index `i`.
    #[inline]
    pub fn get(&self, i: usize) -> Option<&PropertyValue> {
        self.values.get(i)
    }

    /// Value of the named property of `element`.
    pub fn field(&self, element: &ElementDescriptor, name: &str) -> Result<&PropertyValue> {
        let index = element
            .property_index(name)
            .ok_or_else(|| Error::PropertyNotFound {
                element: element.name.clone(),
                property: name.to_string(),
            })?;
        self.values
            .get(index)
            .ok_or_else(|| Error::mismatch(format!("value for '{name}'"), "short record"))
    }

    /// Check that this record has the shape and types `element` declares.
    pub fn check(&self, element: &ElementDescriptor) -> Result<()> {
        if self.values.len() != element.properties.len() {
            return Err(Error::mismatch(
                format!("{} values for '{}'", element.properties.len(), element.name),
                format!("{} values", self.values.len()),
            ));
        }

        for (value, prop) in self.values.iter().zip(&element.properties) {
            let ok = match (&prop.kind, value) {
                (PropertyKind::Scalar(ty), PropertyValue::Scalar(v)) => v.scalar_type() == *ty,
                (PropertyKind::List { value: ty, .. }, PropertyValue::List(items)) => {
                    items.iter().all(|v| v.scalar_type() == *ty)
                }
                _ => false,
            };
            if !ok {
                return Err(Error::mismatch(
                    prop.header_line(),
                    format!("{value:?} for '{}.{}'", element.name, prop.name),
                ));
            }
        }
        Ok(())
    }
}

impl From<Vec<PropertyValue>> for Record {
    fn from(values: Vec<PropertyValue>) -> Self {
        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ply::schema::PropertyDescriptor;
    use crate::util::ScalarType;

    fn face() -> ElementDescriptor {
        ElementDescriptor::new("face", 1).with_property(
            PropertyDescriptor::list("vertex_indices", ScalarType::Uint8, ScalarType::Int32)
                .unwrap(),
        )
    }

    #[test]
    fn test_build_and_lookup() {
        let face = face();
        let record = Record::new(vec![[0i32, 1, 2].into_iter().collect()]);
        record.check(&face).unwrap();

        let list = record.field(&face, "vertex_indices").unwrap().as_list().unwrap();
        assert_eq!(list, &[Scalar::Int32(0), Scalar::Int32(1), Scalar::Int32(2)]);
    }

    #[test]
    fn test_check_rejects_wrong_type() {
        let record = Record::new(vec![[0u32, 1, 2].into_iter().collect()]);
        assert!(matches!(
            record.check(&face()),
            Err(Error::SchemaMismatch { .. })
        ));

        let record = Record::new(vec![PropertyValue::from(3i32)]);
        assert!(record.check(&face()).is_err());
    }

    #[test]
    fn test_check_rejects_wrong_arity() {
        let mut record = Record::with_capacity(2);
        record.push([1i32].into_iter().collect::<PropertyValue>());
        record.push(1.0f32);
        assert!(matches!(
            record.check(&face()),
            Err(Error::SchemaMismatch { .. })
        ));
    }
}
