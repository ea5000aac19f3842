//! PLY reader implementation.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::geom::{PlyRecord, PodRecord};
use crate::util::{Error, Result};

use super::format::Encoding;
use super::header::parse_header;
use super::read_util::{read_block, read_records, skip_records};
use super::record::Record;
use super::schema::{ElementDescriptor, PlyHeader, PropertyDescriptor};

/// Read buffer size for files opened by path.
const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Buffered input stream that counts consumed bytes.
///
/// The position only ever moves forward.
pub struct IStream<R> {
    inner: R,
    pos: u64,
}

impl<R: BufRead> IStream<R> {
    /// Wrap a buffered reader positioned at offset 0.
    pub fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }

    /// Bytes consumed so far.
    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead> Read for IStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<R: BufRead> BufRead for IStream<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt);
        self.pos += amt as u64;
    }
}

/// Consumption state of a read session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ReadState {
    /// Cursor is inside element `index`, after `records` decoded records.
    Element { index: usize, records: usize },
    /// Every declared element has been consumed.
    Exhausted,
    /// A failed binary read left the stream inside element `index`.
    Poisoned { index: usize },
    /// Stream released.
    Closed,
}

/// PLY file opened for reading.
///
/// Elements must be consumed in declaration order. Asking for a later
/// element skips the ones in between; asking for an earlier one fails with
/// [`Error::SchemaMismatch`].
pub struct IPlyFile<R = BufReader<File>> {
    stream: Option<IStream<R>>,
    header: PlyHeader,
    path: Option<PathBuf>,
    state: ReadState,
}

impl IPlyFile<BufReader<File>> {
    /// Open a PLY file and parse its header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;

        let mut ply = Self::from_reader(BufReader::with_capacity(READ_BUFFER_SIZE, file))?;
        ply.path = Some(path.to_path_buf());
        Ok(ply)
    }
}

impl<R: BufRead> IPlyFile<R> {
    /// Parse the header from a reader positioned at the start of a PLY file.
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut stream = IStream::new(reader);
        let header = parse_header(&mut stream)?;
        if stream.pos() != header.header_len {
            return Err(Error::invalid(format!(
                "payload starts at {}, header is {} bytes",
                stream.pos(),
                header.header_len
            )));
        }

        let state = Self::first_state(&header, 0);
        Ok(Self {
            stream: Some(stream),
            header,
            path: None,
            state,
        })
    }

    fn first_state(header: &PlyHeader, index: usize) -> ReadState {
        if index < header.elements.len() {
            ReadState::Element { index, records: 0 }
        } else {
            ReadState::Exhausted
        }
    }

    /// State once `consumed` records of element `index` are behind the cursor.
    fn after(header: &PlyHeader, index: usize, consumed: usize) -> ReadState {
        if consumed < header.elements[index].count {
            ReadState::Element {
                index,
                records: consumed,
            }
        } else {
            Self::first_state(header, index + 1)
        }
    }

    /// Record where a failed read left the stream and hand the error back.
    ///
    /// ASCII records are whole lines, so the session resumes after the
    /// offending line. A binary failure leaves no record boundary to resume
    /// from and poisons the session.
    fn fail(&mut self, index: usize, consumed: usize, error: Error) -> Error {
        let resumable = self.header.encoding == Encoding::Ascii && !matches!(error, Error::Io(_));
        self.state = if resumable {
            Self::after(&self.header, index, consumed)
        } else {
            ReadState::Poisoned { index }
        };
        tracing::debug!(
            element = %self.header.elements[index].name,
            consumed,
            resumable,
            error = %error,
            "read failed"
        );
        error
    }

    /// The header, unless the session is closed.
    fn open_header(&self) -> Result<&PlyHeader> {
        match self.state {
            ReadState::Closed => Err(Error::Closed),
            _ => Ok(&self.header),
        }
    }

    /// Path the file was opened from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The parsed header. It does not change after open.
    #[inline]
    pub fn header(&self) -> &PlyHeader {
        &self.header
    }

    /// Payload encoding.
    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.header.encoding
    }

    /// Format version.
    #[inline]
    pub fn version(&self) -> f32 {
        self.header.version
    }

    /// Header size in bytes, i.e. the payload offset.
    #[inline]
    pub fn header_len(&self) -> u64 {
        self.header.header_len
    }

    /// Header comments.
    pub fn comments(&self) -> Result<&[String]> {
        Ok(&self.open_header()?.comments)
    }

    /// Header object info tokens.
    pub fn obj_info(&self) -> Result<&[String]> {
        Ok(&self.open_header()?.obj_info)
    }

    /// Element names in declaration order.
    pub fn element_names(&self) -> Result<Vec<&str>> {
        Ok(self.open_header()?.element_names())
    }

    /// Properties and declared record count of an element.
    pub fn describe_element(&self, name: &str) -> Result<(&[PropertyDescriptor], usize)> {
        let element = self.element(name)?;
        Ok((&element.properties, element.count))
    }

    /// Returns true once the stream has been released.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state == ReadState::Closed
    }

    /// Current byte offset in the file.
    pub fn pos(&self) -> Result<u64> {
        self.stream.as_ref().map(IStream::pos).ok_or(Error::Closed)
    }

    /// Read every remaining record of an element.
    pub fn read_element(&mut self, name: &str) -> Result<Vec<Record>> {
        let (index, done) = self.seek_element(name)?;
        let element = &self.header.elements[index];
        let n = element.count - done;
        let stream = self.stream.as_mut().ok_or(Error::Closed)?;
        let mut consumed = done;
        let records = read_records(stream, element, self.header.encoding, &mut consumed, n)
            .map_err(|e| self.fail(index, consumed, e))?;

        tracing::trace!(element = name, records = records.len(), "read element");
        self.state = Self::first_state(&self.header, index + 1);
        Ok(records)
    }

    /// Read an element whose properties are all scalar.
    pub fn read_scalar_element(&mut self, name: &str) -> Result<Vec<Record>> {
        let element = self.element(name)?;
        if element.has_list() {
            return Err(Error::mismatch(
                format!("scalar-only element '{name}'"),
                "element with list properties",
            ));
        }
        self.read_element(name)
    }

    /// Read an element that has at least one list property.
    pub fn read_list_element(&mut self, name: &str) -> Result<Vec<Record>> {
        let element = self.element(name)?;
        if !element.has_list() {
            return Err(Error::mismatch(
                format!("list element '{name}'"),
                "element with scalar properties only",
            ));
        }
        self.read_element(name)
    }

    /// Read the next record of an element.
    ///
    /// Asking for more records than the header declares is a
    /// [`Error::SchemaMismatch`].
    pub fn read_record(&mut self, name: &str) -> Result<Record> {
        let (index, done) = self.seek_element(name)?;
        let element = &self.header.elements[index];
        if done >= element.count {
            return Err(Error::mismatch(
                format!("at most {} '{name}' records", element.count),
                format!("record {}", done + 1),
            ));
        }
        let stream = self.stream.as_mut().ok_or(Error::Closed)?;
        let mut consumed = done;
        let record = read_records(stream, element, self.header.encoding, &mut consumed, 1)
            .map_err(|e| self.fail(index, consumed, e))?
            .pop()
            .ok_or_else(|| Error::invalid("record decoder returned nothing"))?;

        self.state = Self::after(&self.header, index, done + 1);
        Ok(record)
    }

    /// Read the remaining records of an element as typed values.
    pub fn read_typed<T: PlyRecord>(&mut self, name: &str) -> Result<Vec<T>> {
        let records = self.read_element(name)?;
        let element = self.header.element(name)?;
        records
            .iter()
            .map(|record| T::from_record(element, record))
            .collect()
    }

    /// Read the remaining records of an element straight into `T`.
    ///
    /// When the element is fixed-width, its scalar types equal `T::LAYOUT`
    /// and the payload is in native byte order, the bytes are cast in bulk.
    /// Any other element goes through [`IPlyFile::read_typed`].
    pub fn read_pod_element<T: PodRecord>(&mut self, name: &str) -> Result<Vec<T>> {
        let (index, done) = self.seek_element(name)?;
        let element = &self.header.elements[index];
        let native = self.header.encoding == Encoding::native_binary();
        if !native || element.scalar_layout().as_deref() != Some(T::LAYOUT) {
            return self.read_typed(name);
        }

        let n = element.count - done;
        let stream = self.stream.as_mut().ok_or(Error::Closed)?;
        let block = read_block(stream, element, done, n, std::mem::size_of::<T>())
            .map_err(|e| self.fail(index, done, e))?;

        tracing::trace!(element = name, records = n, "cast element in bulk");
        self.state = Self::first_state(&self.header, index + 1);
        Ok(bytemuck::pod_collect_to_vec(&block))
    }

    /// Skip the remaining records of an element.
    pub fn skip_element(&mut self, name: &str) -> Result<()> {
        let (index, done) = self.seek_element(name)?;
        self.skip_remaining(index, done)
    }

    fn skip_remaining(&mut self, index: usize, done: usize) -> Result<()> {
        let element = &self.header.elements[index];
        let stream = self.stream.as_mut().ok_or(Error::Closed)?;
        if let Err(e) = skip_records(stream, element, self.header.encoding, done, element.count - done)
        {
            self.state = ReadState::Poisoned { index };
            return Err(e);
        }

        tracing::debug!(element = %element.name, "skipped element");
        self.state = Self::first_state(&self.header, index + 1);
        Ok(())
    }

    /// Move the cursor to element `name`, skipping anything in between.
    ///
    /// Returns the element index and the records already consumed from it.
    fn seek_element(&mut self, name: &str) -> Result<(usize, usize)> {
        let target = self.open_header()?.element_index(name)?;
        loop {
            match self.state {
                ReadState::Closed => return Err(Error::Closed),
                ReadState::Poisoned { index } => {
                    return Err(Error::Poisoned(self.header.elements[index].name.clone()))
                }
                ReadState::Exhausted => return Err(self.consumed(target)),
                ReadState::Element { index, records } if index == target => {
                    return Ok((index, records))
                }
                ReadState::Element { index, .. } if index > target => {
                    return Err(self.consumed(target))
                }
                ReadState::Element { index, records } => self.skip_remaining(index, records)?,
            }
        }
    }

    fn consumed(&self, target: usize) -> Error {
        let next = match self.state {
            ReadState::Element { index, .. } => format!("'{}'", self.header.elements[index].name),
            _ => "end of payload".to_string(),
        };
        Error::mismatch(
            format!("{next} or a later element"),
            format!("'{}' (already consumed)", self.header.elements[target].name),
        )
    }

    /// Release the stream. Every later operation fails with [`Error::Closed`].
    pub fn close(&mut self) -> Result<()> {
        if self.state == ReadState::Closed {
            return Err(Error::Closed);
        }
        self.stream = None;
        self.state = ReadState::Closed;
        tracing::debug!(path = ?self.path, "closed PLY reader");
        Ok(())
    }

    /// Consume the session and return the underlying reader, positioned
    /// wherever decoding stopped.
    pub fn into_inner(self) -> Result<R> {
        self.stream.map(IStream::into_inner).ok_or(Error::Closed)
    }

    /// Element descriptor by name.
    pub fn element(&self, name: &str) -> Result<&ElementDescriptor> {
        self.open_header()?.element(name)
    }
}
