//! # plyfile
//!
//! Reading and writing PLY (Polygon File Format) files.
//!
//! A PLY file declares named elements (vertices, faces, ...) in a text
//! header; each element holds a number of records made of typed scalar and
//! list properties. The payload follows in ASCII, binary little-endian or
//! binary big-endian.
//!
//! ## Modules
//!
//! - [`util`] - Scalar types, errors
//! - [`ply`] - Header model, read and write sessions, payload codec
//! - [`geom`] - Typed vertex/face records and mesh helpers
//!
//! ## Example
//!
//! ```no_run
//! use plyfile::prelude::*;
//!
//! # fn main() -> plyfile::Result<()> {
//! let mut ply = IPlyFile::open("bunny.ply")?;
//! for name in ply.element_names()? {
//!     println!("{name}");
//! }
//! let vertices = ply.read_element("vertex")?;
//! println!("{} vertices", vertices.len());
//! # Ok(())
//! # }
//! ```

pub mod util;
pub mod ply;
pub mod geom;

// Re-export commonly used types
pub use util::{Error, Result, Scalar, ScalarType};
pub use ply::{Encoding, IPlyFile, OPlyFile};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result, Scalar, ScalarType};
    pub use crate::ply::{
        ElementDescriptor, Encoding, IPlyFile, OPlyFile, PlyHeader, PropertyDescriptor,
        PropertyKind, PropertyValue, Record,
    };
    pub use crate::geom::*;
}
