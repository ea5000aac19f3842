//! PLY writer implementation.
//!
//! A write session has two phases. While the schema is open, element counts,
//! properties, comments and object info can be declared. [`OPlyFile::write_header`]
//! freezes the schema; after that, records are written element by element
//! in declaration order.

mod stream;
mod write_util;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::geom::PlyRecord;
use crate::util::{Error, Result};

use super::format::Encoding;
use super::header::header_text;
use super::record::Record;
use super::schema::{ElementDescriptor, PlyHeader, PropertyDescriptor};

pub use stream::OStream;
pub(crate) use write_util::encode_record;

/// Progress of a write session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WriteState {
    /// Header not yet written, schema can change.
    Schema,
    /// Writing element `index`, `records` already written.
    Element { index: usize, records: usize },
    /// Every declared record has been written.
    Done,
    /// Stream released.
    Closed,
}

/// PLY file opened for writing.
pub struct OPlyFile<W: Write = BufWriter<File>> {
    stream: Option<OStream<W>>,
    header: PlyHeader,
    path: Option<PathBuf>,
    state: WriteState,
    scratch: Vec<u8>,
}

impl OPlyFile<BufWriter<File>> {
    /// Create a PLY file declaring `element_names`, in that order, each
    /// with zero records and no properties.
    pub fn create<S: AsRef<str>>(
        path: impl AsRef<Path>,
        element_names: &[S],
        encoding: Encoding,
    ) -> Result<Self> {
        let path = path.as_ref();
        let mut ply = Self::with_stream(OStream::create(path)?, element_names, encoding)?;
        ply.path = Some(path.to_path_buf());
        Ok(ply)
    }
}

impl<W: Write> OPlyFile<W> {
    /// Start a PLY file on an existing writer.
    pub fn from_writer<S: AsRef<str>>(
        writer: W,
        element_names: &[S],
        encoding: Encoding,
    ) -> Result<Self> {
        Self::with_stream(OStream::new(writer), element_names, encoding)
    }

    fn with_stream<S: AsRef<str>>(
        stream: OStream<W>,
        element_names: &[S],
        encoding: Encoding,
    ) -> Result<Self> {
        let mut header = PlyHeader::new(encoding);
        for name in element_names {
            let name = name.as_ref();
            if header.element_index(name).is_ok() {
                return Err(Error::invalid(format!("duplicate element '{name}'")));
            }
            header.elements.push(ElementDescriptor::new(name, 0));
        }

        Ok(Self {
            stream: Some(stream),
            header,
            path: None,
            state: WriteState::Schema,
            scratch: Vec::with_capacity(256),
        })
    }

    /// Path the file was created at, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The header as declared so far.
    #[inline]
    pub fn header(&self) -> &PlyHeader {
        &self.header
    }

    /// Mutable header access while the schema is still open.
    fn schema_mut(&mut self) -> Result<&mut PlyHeader> {
        match self.state {
            WriteState::Schema => Ok(&mut self.header),
            WriteState::Closed => Err(Error::Closed),
            _ => Err(Error::Frozen),
        }
    }

    /// Set the format version written on the `format` line.
    pub fn set_version(&mut self, version: f32) -> Result<()> {
        self.schema_mut()?.version = version;
        Ok(())
    }

    /// Declare how many records an element will have.
    pub fn set_element_count(&mut self, name: &str, count: usize) -> Result<()> {
        self.schema_mut()?.element_mut(name)?.count = count;
        Ok(())
    }

    /// Append a property to an element.
    pub fn add_property(&mut self, element: &str, property: PropertyDescriptor) -> Result<()> {
        let element = self.schema_mut()?.element_mut(element)?;
        if element.property_index(&property.name).is_some() {
            return Err(Error::invalid(format!(
                "duplicate property '{}' on element '{}'",
                property.name, element.name
            )));
        }
        element.properties.push(property);
        Ok(())
    }

    /// Append a fully described element after the ones declared at creation.
    pub fn add_element(&mut self, element: ElementDescriptor) -> Result<()> {
        let header = self.schema_mut()?;
        if header.element_index(&element.name).is_ok() {
            return Err(Error::invalid(format!("duplicate element '{}'", element.name)));
        }
        header.elements.push(element);
        Ok(())
    }

    /// Declare `count` records of `T`, with the properties `T` writes.
    ///
    /// The element `T::ELEMENT` must already be declared and have no
    /// properties yet.
    pub fn describe_typed<T: PlyRecord>(&mut self, count: usize) -> Result<()> {
        self.set_element_count(T::ELEMENT, count)?;
        for property in T::properties() {
            self.add_property(T::ELEMENT, property)?;
        }
        Ok(())
    }

    /// Add a comment line.
    pub fn add_comment(&mut self, comment: impl Into<String>) -> Result<()> {
        self.schema_mut()?.comments.push(comment.into());
        Ok(())
    }

    /// Add an object info line.
    ///
    /// Readers split object info into whitespace separated tokens.
    pub fn add_obj_info(&mut self, info: impl Into<String>) -> Result<()> {
        self.schema_mut()?.obj_info.push(info.into());
        Ok(())
    }

    fn first_state(&self, index: usize) -> WriteState {
        if index < self.header.elements.len() {
            WriteState::Element { index, records: 0 }
        } else {
            WriteState::Done
        }
    }

    /// Write the header text and freeze the schema.
    pub fn write_header(&mut self) -> Result<()> {
        self.schema_mut()?;
        let text = header_text(&self.header);
        let stream = self.stream.as_mut().ok_or(Error::Closed)?;
        stream.write_bytes(text.as_bytes())?;

        self.header.header_len = text.len() as u64;
        self.state = self.first_state(0);
        tracing::debug!(
            encoding = %self.header.encoding,
            elements = self.header.elements.len(),
            header_len = self.header.header_len,
            "wrote PLY header"
        );
        Ok(())
    }

    /// Write the next record of an element.
    ///
    /// Elements are written in declaration order; moving on to a later
    /// element requires every earlier one to be complete.
    pub fn write_record(&mut self, name: &str, record: &Record) -> Result<()> {
        let (index, done) = self.seek_element(name)?;
        let element = &self.header.elements[index];
        if done >= element.count {
            return Err(Error::mismatch(
                format!("at most {} '{name}' records", element.count),
                format!("record {}", done + 1),
            ));
        }

        self.scratch.clear();
        encode_record(element, record, self.header.encoding, &mut self.scratch)?;
        let stream = self.stream.as_mut().ok_or(Error::Closed)?;
        stream.write_bytes(&self.scratch)?;

        self.state = if done + 1 < element.count {
            WriteState::Element {
                index,
                records: done + 1,
            }
        } else {
            self.first_state(index + 1)
        };
        Ok(())
    }

    /// Write several records of one element.
    pub fn write_element<'a>(
        &mut self,
        name: &str,
        records: impl IntoIterator<Item = &'a Record>,
    ) -> Result<()> {
        for record in records {
            self.write_record(name, record)?;
        }
        Ok(())
    }

    /// Write typed values as records of `T::ELEMENT`.
    pub fn write_typed<T: PlyRecord>(&mut self, values: &[T]) -> Result<()> {
        for value in values {
            self.write_record(T::ELEMENT, &value.to_record()?)?;
        }
        Ok(())
    }

    fn seek_element(&mut self, name: &str) -> Result<(usize, usize)> {
        let target = self.header.element_index(name)?;
        loop {
            match self.state {
                WriteState::Schema => return Err(Error::HeaderNotWritten),
                WriteState::Closed => return Err(Error::Closed),
                WriteState::Done => return Err(self.already_written(target)),
                WriteState::Element { index, records } if index == target => {
                    return Ok((index, records))
                }
                WriteState::Element { index, .. } if index > target => {
                    return Err(self.already_written(target))
                }
                WriteState::Element { index, records } => {
                    self.check_complete(index, records)?;
                    self.state = self.first_state(index + 1);
                }
            }
        }
    }

    fn already_written(&self, target: usize) -> Error {
        Error::mismatch(
            "elements in declaration order",
            format!("'{}' after it was completed", self.header.elements[target].name),
        )
    }

    fn check_complete(&self, index: usize, records: usize) -> Result<()> {
        let element = &self.header.elements[index];
        if records < element.count {
            return Err(Error::IncompleteElement {
                element: element.name.clone(),
                expected: element.count,
                actual: records,
            });
        }
        Ok(())
    }

    /// Write a pending header, verify every declared record was written,
    /// and release the stream.
    fn finalize(&mut self) -> Result<OStream<W>> {
        if self.state == WriteState::Schema {
            self.write_header()?;
        }
        if self.state == WriteState::Closed {
            return Err(Error::Closed);
        }

        let state = std::mem::replace(&mut self.state, WriteState::Closed);
        let mut stream = self.stream.take().ok_or(Error::Closed)?;
        stream.flush()?;

        if let WriteState::Element { index, records } = state {
            self.check_complete(index, records)?;
            for later in index + 1..self.header.elements.len() {
                self.check_complete(later, 0)?;
            }
        }

        tracing::debug!(path = ?self.path, bytes = stream.pos(), "closed PLY writer");
        Ok(stream)
    }

    /// Flush and release the stream. Every later operation fails with
    /// [`Error::Closed`].
    ///
    /// Fails with [`Error::IncompleteElement`] if fewer records were written
    /// than declared; the stream is released either way.
    pub fn close(&mut self) -> Result<()> {
        self.finalize().map(drop)
    }

    /// Close the session and return the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.finalize()?.into_inner()
    }
}
