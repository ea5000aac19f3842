//! Integration tests for writing PLY files and verifying round-trip.

use std::fs;
use std::io::Cursor;

use plyfile::geom::{read_mono32, write_mono32, Face32, Vertex, VertexMono};
use plyfile::ply::{Encoding, IPlyFile, OPlyFile, PropertyDescriptor, PropertyValue, Record};
use plyfile::{Error, Scalar, ScalarType};

use glam::Vec3;
use tempfile::NamedTempFile;

const ENCODINGS: [Encoding; 3] = [
    Encoding::Ascii,
    Encoding::BinaryLittleEndian,
    Encoding::BinaryBigEndian,
];

fn declare_vertex(ply: &mut OPlyFile, count: usize) {
    ply.set_element_count("vertex", count).expect("Failed to set count");
    for axis in ["x", "y", "z"] {
        ply.add_property("vertex", PropertyDescriptor::scalar(axis, ScalarType::Float32))
            .expect("Failed to add property");
    }
}

#[test]
fn test_roundtrip_vertex_and_face() {
    for encoding in ENCODINGS {
        let temp = NamedTempFile::new().expect("Failed to create temp file");
        let path = temp.path();

        {
            let mut ply = OPlyFile::create(path, &["vertex", "face"], encoding)
                .expect("Failed to create PLY");
            declare_vertex(&mut ply, 2);
            ply.set_element_count("face", 1).expect("Failed to set count");
            ply.add_property(
                "face",
                PropertyDescriptor::list("vertex_indices", ScalarType::Uint8, ScalarType::Int32)
                    .expect("Failed to build list property"),
            )
            .expect("Failed to add property");
            ply.add_comment("written by write_tests").expect("Failed to add comment");
            ply.add_obj_info("scale 1").expect("Failed to add obj_info");
            ply.write_header().expect("Failed to write header");

            ply.write_record("vertex", &Record::new(vec![0.0f32.into(), 0.0f32.into(), 0.0f32.into()]))
                .expect("Failed to write vertex");
            ply.write_record("vertex", &Record::new(vec![1.0f32.into(), 0.0f32.into(), 0.0f32.into()]))
                .expect("Failed to write vertex");
            ply.write_record("face", &Record::new(vec![[0i32, 1, 1].into_iter().collect()]))
                .expect("Failed to write face");
            ply.close().expect("Failed to close");
        }

        let mut ply = IPlyFile::open(path).expect("Failed to open PLY");
        assert_eq!(ply.encoding(), encoding);
        assert_eq!(ply.comments().expect("Failed to read comments"), ["written by write_tests"]);
        assert_eq!(ply.obj_info().expect("Failed to read obj_info"), ["scale", "1"]);
        assert_eq!(ply.element_names().expect("Failed to list elements"), ["vertex", "face"]);

        let vertices = ply.read_element("vertex").expect("Failed to read vertices");
        assert_eq!(vertices.len(), 2);
        let faces = ply.read_element("face").expect("Failed to read faces");
        assert_eq!(faces[0].values()[0].as_list().map(<[_]>::len), Some(3));
    }
}

#[test]
fn test_binary_payload_layout() {
    let temp = NamedTempFile::new().expect("Failed to create temp file");
    let path = temp.path();

    let mut ply = OPlyFile::create(path, &["vertex"], Encoding::BinaryLittleEndian)
        .expect("Failed to create PLY");
    declare_vertex(&mut ply, 2);
    ply.write_header().expect("Failed to write header");
    let header_len = ply.header().header_len as usize;
    ply.write_record("vertex", &Record::new(vec![0.0f32.into(), 0.0f32.into(), 0.0f32.into()]))
        .expect("Failed to write vertex");
    ply.write_record("vertex", &Record::new(vec![1.0f32.into(), 0.0f32.into(), 0.0f32.into()]))
        .expect("Failed to write vertex");
    ply.close().expect("Failed to close");

    let bytes = fs::read(path).expect("Failed to read file");
    let payload = &bytes[header_len..];
    let mut expected = vec![0u8; 12];
    expected.extend_from_slice(&[0x00, 0x00, 0x80, 0x3f]);
    expected.extend_from_slice(&[0u8; 8]);
    assert_eq!(payload, expected.as_slice());
}

#[test]
fn test_ascii_text_layout() {
    let temp = NamedTempFile::new().expect("Failed to create temp file");
    let path = temp.path();

    let vertices = [VertexMono::new(0.5, -1.0, 2.0)];
    let faces = [Face32::new(0, 0, 0)];
    write_mono32(path, Encoding::Ascii, &vertices, &faces).expect("Failed to write mesh");

    let text = fs::read_to_string(path).expect("Failed to read file");
    assert_eq!(
        text,
        "ply\n\
         format ascii 1.0\n\
         element vertex 1\n\
         property float x\n\
         property float y\n\
         property float z\n\
         element face 1\n\
         property list uchar int vertex_indices\n\
         end_header\n\
         0.5 -1 2\n\
         3 0 0 0\n"
    );
}

#[test]
fn test_mesh_helpers_roundtrip() {
    let vertices: Vec<VertexMono> = (0..16)
        .map(|i| Vec3::new(i as f32 * 0.1, (i * i) as f32, -(i as f32)).into())
        .collect();
    let faces: Vec<Face32> = (0..14).map(|i| Face32::new(i, i + 1, i + 2)).collect();

    for encoding in ENCODINGS {
        let temp = NamedTempFile::new().expect("Failed to create temp file");
        write_mono32(temp.path(), encoding, &vertices, &faces).expect("Failed to write mesh");

        let (v, f) = read_mono32(temp.path()).expect("Failed to read mesh");
        assert_eq!(v, vertices);
        assert_eq!(f, faces);
    }
}

#[test]
fn test_colored_vertices() {
    let temp = NamedTempFile::new().expect("Failed to create temp file");
    let path = temp.path();
    let vertices = [
        Vertex::new(Vec3::new(0.0, 0.0, 0.0), [255, 0, 0]),
        Vertex::new(Vec3::new(1.0, 1.0, 1.0), [0, 255, 0]),
    ];

    let mut ply = OPlyFile::create(path, &["vertex"], Encoding::BinaryBigEndian)
        .expect("Failed to create PLY");
    ply.describe_typed::<Vertex>(vertices.len()).expect("Failed to describe vertex");
    ply.write_header().expect("Failed to write header");
    ply.write_typed(&vertices).expect("Failed to write vertices");
    ply.close().expect("Failed to close");

    let mut reader = IPlyFile::open(path).expect("Failed to open PLY");
    let element = reader.element("vertex").expect("Missing vertex element");
    assert_eq!(element.record_size(), Some(15));
    let read: Vec<Vertex> = reader.read_typed("vertex").expect("Failed to read vertices");
    assert_eq!(read, vertices);
}

#[test]
fn test_incomplete_write_reported() {
    let temp = NamedTempFile::new().expect("Failed to create temp file");
    let mut ply = OPlyFile::create(temp.path(), &["vertex"], Encoding::Ascii)
        .expect("Failed to create PLY");
    declare_vertex(&mut ply, 3);
    ply.write_header().expect("Failed to write header");
    ply.write_record("vertex", &Record::new(vec![0.0f32.into(), 0.0f32.into(), 0.0f32.into()]))
        .expect("Failed to write vertex");

    let err = ply.close().unwrap_err();
    assert!(matches!(
        err,
        Error::IncompleteElement { expected: 3, actual: 1, .. }
    ));

    // The short file is still readable up to the truncation.
    let mut reader = IPlyFile::open(temp.path()).expect("Failed to open PLY");
    let err = reader.read_element("vertex").unwrap_err();
    assert!(matches!(err, Error::Truncated { actual: 1, .. }));
}

#[test]
fn test_version_written() {
    let temp = NamedTempFile::new().expect("Failed to create temp file");
    let mut ply = OPlyFile::create(temp.path(), &["vertex"], Encoding::Ascii)
        .expect("Failed to create PLY");
    ply.set_version(1.25).expect("Failed to set version");
    ply.close().expect("Failed to close");

    let reader = IPlyFile::open(temp.path()).expect("Failed to open PLY");
    assert_eq!(reader.version(), 1.25);
    assert_eq!(reader.describe_element("vertex").expect("Missing vertex").1, 0);
}

/// Three edge values per type: range ends, signed zero, NaN payloads and
/// subnormals.
fn extremes(ty: ScalarType) -> [Scalar; 3] {
    match ty {
        ScalarType::Int8 => [i8::MIN.into(), i8::MAX.into(), 0i8.into()],
        ScalarType::Uint8 => [u8::MIN.into(), u8::MAX.into(), 7u8.into()],
        ScalarType::Int16 => [i16::MIN.into(), i16::MAX.into(), (-1i16).into()],
        ScalarType::Uint16 => [u16::MIN.into(), u16::MAX.into(), 1u16.into()],
        ScalarType::Int32 => [i32::MIN.into(), i32::MAX.into(), (-1i32).into()],
        ScalarType::Uint32 => [u32::MIN.into(), u32::MAX.into(), 1u32.into()],
        ScalarType::Float32 => [
            (-0.0f32).into(),
            f32::from_bits(0x7fc0_1234).into(),
            f32::from_bits(1).into(),
        ],
        ScalarType::Float64 => [
            f64::MAX.into(),
            f64::from_bits(0x7ff8_0000_0000_beef).into(),
            f64::from_bits(1).into(),
        ],
    }
}

fn sample_records() -> Vec<Record> {
    (0..3)
        .map(|row| {
            Record::new(
                ScalarType::ALL
                    .iter()
                    .map(|&ty| PropertyValue::Scalar(extremes(ty)[row]))
                    .collect(),
            )
        })
        .collect()
}

/// `id` scalar, two lists, `flag` scalar.
fn poly_records() -> Vec<Record> {
    let weights: [&[f64]; 3] = [&[], &[-0.0, f64::NAN], &[0.1, 1e300, -2.5e-310]];
    let indices: [&[u32]; 3] = [&[], &[u32::MAX], &[0, 1, 2]];
    (0..3)
        .map(|i| {
            Record::new(vec![
                (i as u16 * 1000).into(),
                weights[i].iter().copied().collect(),
                indices[i].iter().copied().collect(),
                (i as i8 - 1).into(),
            ])
        })
        .collect()
}

fn write_typed_payload(encoding: Encoding, samples: &[Record], polys: &[Record]) -> Vec<u8> {
    let mut ply = OPlyFile::from_writer(Vec::new(), &["sample", "poly"], encoding)
        .expect("Failed to start PLY");
    ply.set_element_count("sample", samples.len()).expect("Failed to set count");
    for ty in ScalarType::ALL {
        ply.add_property("sample", PropertyDescriptor::scalar(format!("v_{}", ty.name()), ty))
            .expect("Failed to add property");
    }
    ply.set_element_count("poly", polys.len()).expect("Failed to set count");
    for property in [
        PropertyDescriptor::scalar("id", ScalarType::Uint16),
        PropertyDescriptor::list("weights", ScalarType::Uint8, ScalarType::Float64)
            .expect("Failed to build list property"),
        PropertyDescriptor::list("idx", ScalarType::Uint16, ScalarType::Uint32)
            .expect("Failed to build list property"),
        PropertyDescriptor::scalar("flag", ScalarType::Int8),
    ] {
        ply.add_property("poly", property).expect("Failed to add property");
    }
    ply.write_header().expect("Failed to write header");
    ply.write_element("sample", samples).expect("Failed to write samples");
    ply.write_element("poly", polys).expect("Failed to write polys");
    ply.finish().expect("Failed to finish")
}

/// Bit pattern of a scalar. ASCII keeps no NaN payload, so `exact_nan`
/// is off for it.
fn scalar_bits(value: &Scalar, exact_nan: bool) -> (ScalarType, u64) {
    let bits = match *value {
        Scalar::Float32(v) if v.is_nan() && !exact_nan => u64::MAX,
        Scalar::Float64(v) if v.is_nan() && !exact_nan => u64::MAX,
        Scalar::Float32(v) => u64::from(v.to_bits()),
        Scalar::Float64(v) => v.to_bits(),
        other => other.as_i64().expect("Integer scalar") as u64,
    };
    (value.scalar_type(), bits)
}

fn record_bits(records: &[Record], exact_nan: bool) -> Vec<Vec<Vec<(ScalarType, u64)>>> {
    records
        .iter()
        .map(|record| {
            record
                .values()
                .iter()
                .map(|value| match value {
                    PropertyValue::Scalar(v) => vec![scalar_bits(v, exact_nan)],
                    PropertyValue::List(items) => {
                        items.iter().map(|v| scalar_bits(v, exact_nan)).collect()
                    }
                })
                .collect()
        })
        .collect()
}

#[test]
fn test_roundtrip_every_scalar_type() {
    let samples = sample_records();
    let polys = poly_records();

    for encoding in ENCODINGS {
        let bytes = write_typed_payload(encoding, &samples, &polys);
        let mut ply = IPlyFile::from_reader(Cursor::new(bytes.clone())).expect("Failed to open PLY");
        let read_samples = ply.read_scalar_element("sample").expect("Failed to read samples");
        let read_polys = ply.read_list_element("poly").expect("Failed to read polys");

        let exact_nan = encoding != Encoding::Ascii;
        assert_eq!(
            record_bits(&read_samples, exact_nan),
            record_bits(&samples, exact_nan),
            "{encoding}"
        );
        assert_eq!(
            record_bits(&read_polys, exact_nan),
            record_bits(&polys, exact_nan),
            "{encoding}"
        );

        // Writing the decoded records again reproduces the file byte for byte.
        let again = write_typed_payload(encoding, &read_samples, &read_polys);
        assert_eq!(again, bytes, "{encoding}");
    }
}

#[test]
fn test_roundtrip_element_without_properties() {
    for encoding in ENCODINGS {
        let mut ply = OPlyFile::from_writer(Vec::new(), &["marker", "vertex"], encoding)
            .expect("Failed to start PLY");
        ply.set_element_count("marker", 2).expect("Failed to set count");
        ply.set_element_count("vertex", 1).expect("Failed to set count");
        ply.add_property("vertex", PropertyDescriptor::scalar("x", ScalarType::Float32))
            .expect("Failed to add property");
        ply.write_header().expect("Failed to write header");
        ply.write_element("marker", &[Record::default(), Record::default()])
            .expect("Failed to write markers");
        ply.write_record("vertex", &Record::new(vec![1.5f32.into()]))
            .expect("Failed to write vertex");
        let bytes = ply.finish().expect("Failed to finish");

        let mut ply = IPlyFile::from_reader(Cursor::new(bytes)).expect("Failed to open PLY");
        let markers = ply.read_element("marker").expect("Failed to read markers");
        assert_eq!(markers, [Record::default(), Record::default()]);
        let vertices = ply.read_element("vertex").expect("Failed to read vertices");
        assert_eq!(vertices, [Record::new(vec![1.5f32.into()])]);
    }
}
