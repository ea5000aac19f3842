//! PLY (Polygon File Format) reading and writing.
//!
//! A PLY file is a text header followed by a payload in one of three
//! encodings. The header declares, in order, the elements of the file, how
//! many records each one holds, and the typed properties of each record.
//!
//! ## File Structure
//!
//! ```text
//! ply
//! format <ascii|binary_little_endian|binary_big_endian> 1.0
//! comment <free text>                  (any number)
//! obj_info <free text>                 (any number)
//! element <name> <count>
//! property <type> <name>
//! property list <count-type> <type> <name>
//! ...
//! end_header
//! <payload: element records in declaration order>
//! ```
//!
//! Binary records are packed with no padding; a list stores its item count
//! in the count type, then the items. ASCII records are one line each.

mod format;
mod header;
mod read_util;
mod reader;
mod record;
mod schema;
pub mod writer;

pub use format::*;
pub use header::{header_text, parse_header};
pub use reader::*;
pub use record::*;
pub use schema::*;
pub use writer::*;
