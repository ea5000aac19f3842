//! Typed geometry records on top of the generic PLY codec.
//!
//! - [`Vertex`] - position with 8-bit RGB color
//! - [`VertexMono`] / [`VertexMono64`] - position only, f32 / f64
//! - [`Face32`] / [`Face64`] - triangles, 32 / 64-bit indices
//!
//! [`PlyRecord`] converts between these and [`Record`](crate::ply::Record);
//! [`PodRecord`] types can additionally be read by a bulk byte cast.

mod mesh;
mod records;

pub use mesh::{read_mono32, read_mono64, write_mono32, write_mono64};
pub use records::*;
