//! Record encoding.
//!
//! Records are encoded into a scratch buffer first, so a record that fails
//! to encode never leaves partial bytes in the file.

use std::io::Write;

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};

use crate::ply::format::Encoding;
use crate::ply::record::{PropertyValue, Record};
use crate::ply::schema::{ElementDescriptor, PropertyKind};
use crate::util::{Error, Result, Scalar};

/// Write one binary scalar in byte order `B`.
fn write_scalar<B: ByteOrder, W: Write>(w: &mut W, value: Scalar) -> std::io::Result<()> {
    match value {
        Scalar::Int8(v) => w.write_i8(v),
        Scalar::Uint8(v) => w.write_u8(v),
        Scalar::Int16(v) => w.write_i16::<B>(v),
        Scalar::Uint16(v) => w.write_u16::<B>(v),
        Scalar::Int32(v) => w.write_i32::<B>(v),
        Scalar::Uint32(v) => w.write_u32::<B>(v),
        Scalar::Float32(v) => w.write_f32::<B>(v),
        Scalar::Float64(v) => w.write_f64::<B>(v),
    }
}

/// Encode `record` as `element` declares it, appending to `buf`.
///
/// The record is checked against the element first: value count, scalar
/// versus list, and exact scalar types must all match.
pub(crate) fn encode_record(
    element: &ElementDescriptor,
    record: &Record,
    encoding: Encoding,
    buf: &mut Vec<u8>,
) -> Result<()> {
    record.check(element)?;
    match encoding {
        Encoding::Ascii => encode_ascii(element, record, buf),
        Encoding::BinaryLittleEndian => encode_binary::<LittleEndian>(element, record, buf),
        Encoding::BinaryBigEndian => encode_binary::<BigEndian>(element, record, buf),
    }
}

/// Visit every value of a record in payload order, list counts included.
fn for_each_scalar(
    element: &ElementDescriptor,
    record: &Record,
    mut f: impl FnMut(Scalar) -> Result<()>,
) -> Result<()> {
    for (property, value) in element.properties.iter().zip(record.values()) {
        match (&property.kind, value) {
            (PropertyKind::Scalar(_), PropertyValue::Scalar(v)) => f(*v)?,
            (PropertyKind::List { count, .. }, PropertyValue::List(items)) => {
                f(Scalar::count(*count, items.len())?)?;
                for item in items {
                    f(*item)?;
                }
            }
            _ => {
                return Err(Error::mismatch(
                    property.header_line(),
                    format!("{value:?}"),
                ))
            }
        }
    }
    Ok(())
}

fn encode_binary<B: ByteOrder>(
    element: &ElementDescriptor,
    record: &Record,
    buf: &mut Vec<u8>,
) -> Result<()> {
    for_each_scalar(element, record, |scalar| {
        write_scalar::<B, _>(buf, scalar)?;
        Ok(())
    })
}

/// Decimal tokens separated by single spaces, newline terminated.
fn encode_ascii(element: &ElementDescriptor, record: &Record, buf: &mut Vec<u8>) -> Result<()> {
    let mut first = true;
    for_each_scalar(element, record, |scalar| {
        if !first {
            buf.push(b' ');
        }
        write!(buf, "{scalar}")?;
        first = false;
        Ok(())
    })?;
    buf.push(b'\n');
    Ok(())
}
