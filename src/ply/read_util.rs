//! Payload decoding.
//!
//! One record loop serves every element: properties are decoded strictly in
//! declared order from a [`ScalarSource`], so scalar/list mixes need no
//! per-layout code. Binary sources thread a running byte offset.
//!
//! Fixed-width binary elements are additionally read in one block per call
//! and decoded from memory; list-bearing elements are decoded one record at
//! a time straight from the stream.

use std::io::{self, BufRead, Read};
use std::marker::PhantomData;
use std::str::SplitAsciiWhitespace;

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};

use crate::util::{Error, Result, Scalar, ScalarType};

use super::format::Encoding;
use super::reader::IStream;
use super::record::{ListValue, PropertyValue, Record};
use super::schema::{ElementDescriptor, PropertyKind};

/// Upper bound on list capacity reserved before items are actually read.
const MAX_LIST_RESERVE: usize = 1024;

/// Upper bound on record capacity reserved from a declared count.
const MAX_RECORD_RESERVE: usize = 1 << 16;

/// Yields scalar values of a requested type, in payload order.
trait ScalarSource {
    fn next_scalar(&mut self, ty: ScalarType) -> Result<Scalar>;
}

/// Read one binary scalar in byte order `B`.
pub(crate) fn read_scalar<B: ByteOrder, R: Read>(r: &mut R, ty: ScalarType) -> io::Result<Scalar> {
    let value = match ty {
        ScalarType::Int8 => Scalar::Int8(r.read_i8()?),
        ScalarType::Uint8 => Scalar::Uint8(r.read_u8()?),
        ScalarType::Int16 => Scalar::Int16(r.read_i16::<B>()?),
        ScalarType::Uint16 => Scalar::Uint16(r.read_u16::<B>()?),
        ScalarType::Int32 => Scalar::Int32(r.read_i32::<B>()?),
        ScalarType::Uint32 => Scalar::Uint32(r.read_u32::<B>()?),
        ScalarType::Float32 => Scalar::Float32(r.read_f32::<B>()?),
        ScalarType::Float64 => Scalar::Float64(r.read_f64::<B>()?),
    };
    Ok(value)
}

/// Binary scalars from any reader, tracking the absolute byte offset.
struct BinarySource<'a, R, B> {
    reader: &'a mut R,
    offset: u64,
    _order: PhantomData<B>,
}

impl<'a, R: Read, B: ByteOrder> BinarySource<'a, R, B> {
    fn new(reader: &'a mut R, offset: u64) -> Self {
        Self {
            reader,
            offset,
            _order: PhantomData,
        }
    }
}

impl<R: Read, B: ByteOrder> ScalarSource for BinarySource<'_, R, B> {
    fn next_scalar(&mut self, ty: ScalarType) -> Result<Scalar> {
        let value = read_scalar::<B, R>(self.reader, ty).map_err(|e| eof_at(e, self.offset))?;
        self.offset += ty.num_bytes() as u64;
        Ok(value)
    }
}

/// Decimal tokens of one ASCII record line.
struct AsciiSource<'a> {
    element: &'a str,
    tokens: SplitAsciiWhitespace<'a>,
}

impl ScalarSource for AsciiSource<'_> {
    fn next_scalar(&mut self, ty: ScalarType) -> Result<Scalar> {
        let token = self.tokens.next().ok_or_else(|| {
            Error::mismatch(format!("{ty} value in '{}' record", self.element), "end of line")
        })?;
        ty.parse(token).ok_or_else(|| Error::InvalidValue {
            element: self.element.to_string(),
            token: token.to_string(),
        })
    }
}

fn eof_at(e: io::Error, offset: u64) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::UnexpectedEof(offset)
    } else {
        Error::Io(e)
    }
}

/// Decode one record, property by property.
fn decode_record<S: ScalarSource>(element: &ElementDescriptor, src: &mut S) -> Result<Record> {
    let mut record = Record::with_capacity(element.properties.len());
    for property in &element.properties {
        let value = match property.kind {
            PropertyKind::Scalar(ty) => PropertyValue::Scalar(src.next_scalar(ty)?),
            PropertyKind::List { count, value } => {
                let n = src.next_scalar(count)?.as_count()?;
                let mut items = ListValue::with_capacity(n.min(MAX_LIST_RESERVE));
                for _ in 0..n {
                    items.push(src.next_scalar(value)?);
                }
                PropertyValue::List(items)
            }
        };
        record.push(value);
    }
    Ok(record)
}

fn truncated(element: &ElementDescriptor, actual: usize) -> Error {
    Error::Truncated {
        element: element.name.clone(),
        expected: element.count,
        actual,
    }
}

/// Decode `n` records of `element`.
///
/// `consumed` holds the records already taken from the element and moves
/// forward with every record the stream passes, so after an ASCII error it
/// points past the offending line. Short payloads yield [`Error::Truncated`]
/// with the number of complete records the element actually holds; no
/// partial record is returned.
pub(crate) fn read_records<R: BufRead>(
    stream: &mut IStream<R>,
    element: &ElementDescriptor,
    encoding: Encoding,
    consumed: &mut usize,
    n: usize,
) -> Result<Vec<Record>> {
    match encoding {
        Encoding::Ascii => read_ascii_records(stream, element, consumed, n),
        Encoding::BinaryLittleEndian => {
            read_binary_records::<LittleEndian, R>(stream, element, consumed, n)
        }
        Encoding::BinaryBigEndian => read_binary_records::<BigEndian, R>(stream, element, consumed, n),
    }
}

fn read_binary_records<B: ByteOrder, R: BufRead>(
    stream: &mut IStream<R>,
    element: &ElementDescriptor,
    consumed: &mut usize,
    n: usize,
) -> Result<Vec<Record>> {
    let mut records = Vec::with_capacity(n.min(MAX_RECORD_RESERVE));

    if let Some(size) = element.record_size() {
        let base = stream.pos();
        let block = read_block(stream, element, *consumed, n, size)?;
        let mut slice = block.as_slice();
        let mut src = BinarySource::<_, B>::new(&mut slice, base);
        for _ in 0..n {
            records.push(decode_record(element, &mut src)?);
        }
        *consumed += n;
        return Ok(records);
    }

    for _ in 0..n {
        let base = stream.pos();
        let mut src = BinarySource::<_, B>::new(stream, base);
        match decode_record(element, &mut src) {
            Ok(record) => records.push(record),
            Err(Error::UnexpectedEof(_)) => return Err(truncated(element, *consumed)),
            Err(e) => return Err(e),
        }
        *consumed += 1;
    }
    Ok(records)
}

/// Read `n` fixed-size records as one contiguous block.
pub(crate) fn read_block<R: BufRead>(
    stream: &mut IStream<R>,
    element: &ElementDescriptor,
    done: usize,
    n: usize,
    record_size: usize,
) -> Result<Vec<u8>> {
    let len = n
        .checked_mul(record_size)
        .ok_or_else(|| Error::invalid(format!("element '{}' is too large", element.name)))?;

    let mut block = Vec::new();
    stream.by_ref().take(len as u64).read_to_end(&mut block)?;
    if block.len() < len {
        return Err(truncated(element, done + block.len() / record_size));
    }
    Ok(block)
}

/// Next record line, or `false` at end of stream.
///
/// A record with properties always has tokens, so blank lines before it are
/// skipped. A record of an element without properties is exactly one line,
/// blank or not.
fn next_line<R: BufRead>(
    stream: &mut IStream<R>,
    element: &ElementDescriptor,
    line: &mut String,
) -> Result<bool> {
    loop {
        line.clear();
        if stream.read_line(line)? == 0 {
            return Ok(false);
        }
        if element.properties.is_empty() || !line.trim().is_empty() {
            return Ok(true);
        }
    }
}

fn read_ascii_records<R: BufRead>(
    stream: &mut IStream<R>,
    element: &ElementDescriptor,
    consumed: &mut usize,
    n: usize,
) -> Result<Vec<Record>> {
    let mut records = Vec::with_capacity(n.min(MAX_RECORD_RESERVE));
    let mut line = String::new();

    for _ in 0..n {
        if !next_line(stream, element, &mut line)? {
            return Err(truncated(element, *consumed));
        }
        *consumed += 1;

        let mut src = AsciiSource {
            element: &element.name,
            tokens: line.split_ascii_whitespace(),
        };
        let record = decode_record(element, &mut src)?;
        if let Some(extra) = src.tokens.next() {
            return Err(Error::mismatch(
                format!("{} values in '{}' record", element.properties.len(), element.name),
                format!("extra token '{extra}'"),
            ));
        }
        records.push(record);
    }
    Ok(records)
}

/// Advance past `n` records of `element` without materializing them.
///
/// Fixed-width binary records are skipped by size; list-bearing records
/// still need every count field decoded to know how far to go.
pub(crate) fn skip_records<R: BufRead>(
    stream: &mut IStream<R>,
    element: &ElementDescriptor,
    encoding: Encoding,
    done: usize,
    n: usize,
) -> Result<()> {
    match encoding {
        Encoding::Ascii => {
            let mut line = String::new();
            for i in 0..n {
                if !next_line(stream, element, &mut line)? {
                    return Err(truncated(element, done + i));
                }
            }
            Ok(())
        }
        Encoding::BinaryLittleEndian => skip_binary::<LittleEndian, R>(stream, element, done, n),
        Encoding::BinaryBigEndian => skip_binary::<BigEndian, R>(stream, element, done, n),
    }
}

fn skip_binary<B: ByteOrder, R: BufRead>(
    stream: &mut IStream<R>,
    element: &ElementDescriptor,
    done: usize,
    n: usize,
) -> Result<()> {
    if let Some(size) = element.record_size() {
        let len = (n as u64).saturating_mul(size as u64);
        let skipped = skip_bytes(stream, len)?;
        if skipped < len {
            return Err(truncated(element, done + (skipped / size as u64) as usize));
        }
        return Ok(());
    }

    for i in 0..n {
        if !skip_list_record::<B, R>(stream, element)? {
            return Err(truncated(element, done + i));
        }
    }
    Ok(())
}

/// Skip one list-bearing record. Returns `false` if the stream ran out.
fn skip_list_record<B: ByteOrder, R: BufRead>(
    stream: &mut IStream<R>,
    element: &ElementDescriptor,
) -> Result<bool> {
    for property in &element.properties {
        let len = match property.kind {
            PropertyKind::Scalar(ty) => ty.num_bytes() as u64,
            PropertyKind::List { count, value } => {
                let k = match read_scalar::<B, _>(stream, count) {
                    Ok(k) => k.as_count()?,
                    Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(false),
                    Err(e) => return Err(e.into()),
                };
                (k as u64).saturating_mul(value.num_bytes() as u64)
            }
        };
        if skip_bytes(stream, len)? < len {
            return Ok(false);
        }
    }
    Ok(true)
}

fn skip_bytes<R: BufRead>(stream: &mut IStream<R>, len: u64) -> io::Result<u64> {
    io::copy(&mut stream.by_ref().take(len), &mut io::sink())
}
