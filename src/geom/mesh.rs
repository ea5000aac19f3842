//! Whole-mesh helpers for triangle meshes without vertex color.

use std::path::Path;

use crate::ply::{Encoding, IPlyFile, OPlyFile};
use crate::util::Result;

use super::records::{Face32, Face64, PlyRecord, PodRecord, VertexMono, VertexMono64};

/// Read the `vertex` and `face` elements of a PLY file as single precision
/// vertices and 32-bit triangles.
///
/// Other elements are skipped. A missing element yields an empty vector.
pub fn read_mono32(path: impl AsRef<Path>) -> Result<(Vec<VertexMono>, Vec<Face32>)> {
    read_mesh(path.as_ref())
}

/// Like [`read_mono32`], with double precision vertices and 64-bit indices.
pub fn read_mono64(path: impl AsRef<Path>) -> Result<(Vec<VertexMono64>, Vec<Face64>)> {
    read_mesh(path.as_ref())
}

fn read_mesh<V: PodRecord, F: PlyRecord>(path: &Path) -> Result<(Vec<V>, Vec<F>)> {
    let mut ply = IPlyFile::open(path)?;
    let names: Vec<String> = ply.element_names()?.into_iter().map(String::from).collect();

    let mut vertices = Vec::new();
    let mut faces = Vec::new();
    for name in &names {
        if name == V::ELEMENT {
            vertices = ply.read_pod_element(name)?;
        } else if name == F::ELEMENT {
            faces = ply.read_typed(name)?;
        } else {
            ply.skip_element(name)?;
        }
    }
    ply.close()?;

    tracing::debug!(
        path = %path.display(),
        vertices = vertices.len(),
        faces = faces.len(),
        "read mesh"
    );
    Ok((vertices, faces))
}

/// Write a mesh with `vertex` (float x, y, z) and `face` elements.
pub fn write_mono32(
    path: impl AsRef<Path>,
    encoding: Encoding,
    vertices: &[VertexMono],
    faces: &[Face32],
) -> Result<()> {
    write_mesh(path.as_ref(), encoding, vertices, faces)
}

/// Write a mesh with `vertex` (double x, y, z) and `face` elements.
///
/// Face indices must fit in a PLY `int`.
pub fn write_mono64(
    path: impl AsRef<Path>,
    encoding: Encoding,
    vertices: &[VertexMono64],
    faces: &[Face64],
) -> Result<()> {
    write_mesh(path.as_ref(), encoding, vertices, faces)
}

fn write_mesh<V: PlyRecord, F: PlyRecord>(
    path: &Path,
    encoding: Encoding,
    vertices: &[V],
    faces: &[F],
) -> Result<()> {
    let mut ply = OPlyFile::create(path, &[V::ELEMENT, F::ELEMENT], encoding)?;
    ply.describe_typed::<V>(vertices.len())?;
    ply.describe_typed::<F>(faces.len())?;
    ply.write_header()?;
    ply.write_typed(vertices)?;
    ply.write_typed(faces)?;
    ply.close()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use tempfile::NamedTempFile;

    fn triangle() -> (Vec<VertexMono>, Vec<Face32>) {
        let vertices = vec![
            Vec3::new(0.0, 0.0, 0.0).into(),
            Vec3::new(1.0, 0.0, 0.0).into(),
            Vec3::new(0.0, 1.0, 0.5).into(),
        ];
        (vertices, vec![Face32::new(0, 1, 2)])
    }

    #[test]
    fn test_mono32_round_trip() -> Result<()> {
        let (vertices, faces) = triangle();
        for encoding in [
            Encoding::Ascii,
            Encoding::BinaryLittleEndian,
            Encoding::BinaryBigEndian,
        ] {
            let temp = NamedTempFile::new()?;
            write_mono32(temp.path(), encoding, &vertices, &faces)?;

            let (v, f) = read_mono32(temp.path())?;
            assert_eq!(v, vertices);
            assert_eq!(f, faces);
        }
        Ok(())
    }

    #[test]
    fn test_mono64_reads_float_file() -> Result<()> {
        let (vertices, faces) = triangle();
        let temp = NamedTempFile::new()?;
        write_mono32(temp.path(), Encoding::native_binary(), &vertices, &faces)?;

        let (v, f) = read_mono64(temp.path())?;
        assert_eq!(v[2], VertexMono64::new(0.0, 1.0, 0.5));
        assert_eq!(f, vec![Face64::new(0, 1, 2)]);
        Ok(())
    }

    #[test]
    fn test_mono64_round_trip() -> Result<()> {
        let vertices = vec![VertexMono64::new(0.1, 0.2, 0.3); 3];
        let faces = vec![Face64::new(2, 1, 0)];
        let temp = NamedTempFile::new()?;
        write_mono64(temp.path(), Encoding::BinaryLittleEndian, &vertices, &faces)?;

        let (v, f) = read_mono64(temp.path())?;
        assert_eq!(v, vertices);
        assert_eq!(f, faces);
        Ok(())
    }
}
