//! PLY header parsing and writing.
//!
//! ```text
//! ply
//! format <ascii|binary_little_endian|binary_big_endian> <version>
//! comment <free text>
//! obj_info <token> <token> ...
//! element <name> <count>
//! property <type> <name>
//! property list <count type> <value type> <name>
//! end_header
//! ```

use std::io::BufRead;
use std::str::SplitWhitespace;

use crate::util::{Error, Result, ScalarType};

use super::format::*;
use super::schema::{ElementDescriptor, PlyHeader, PropertyDescriptor};

/// Parse a header from a stream positioned at the start of the file.
///
/// On success the stream has consumed exactly `header_len` bytes and sits at
/// the first payload byte. Any malformed line aborts the parse; no partial
/// header is returned.
pub fn parse_header<R: BufRead>(reader: &mut R) -> Result<PlyHeader> {
    let mut header = PlyHeader::new(Encoding::Ascii);
    let mut format_seen = false;
    let mut buf = Vec::with_capacity(128);
    let mut line_no = 0;

    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Err(Error::header(
                line_no + 1,
                format!("unexpected end of file before '{END_HEADER}'"),
            ));
        }
        line_no += 1;
        header.header_len += n as u64;

        let line = std::str::from_utf8(&buf)
            .map_err(|_| Error::header(line_no, "header line is not valid UTF-8"))?
            .trim_end_matches(['\n', '\r']);

        if line_no == 1 {
            if line.trim() != PLY_MAGIC {
                return Err(Error::header(1, format!("expected '{PLY_MAGIC}', got '{line}'")));
            }
            continue;
        }

        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        match keyword {
            FORMAT_KEYWORD => {
                let (encoding, version) = parse_format(line_no, tokens)?;
                header.encoding = encoding;
                header.version = version;
                format_seen = true;
            }
            COMMENT_KEYWORD => header.comments.push(comment_text(line).to_string()),
            OBJ_INFO_KEYWORD => header.obj_info.extend(tokens.map(str::to_string)),
            ELEMENT_KEYWORD => {
                let element = parse_element(line_no, tokens)?;
                if header.element_index(&element.name).is_ok() {
                    return Err(Error::header(
                        line_no,
                        format!("duplicate element '{}'", element.name),
                    ));
                }
                header.elements.push(element);
            }
            PROPERTY_KEYWORD => {
                let property = parse_property(line_no, tokens)?;
                let element = header.elements.last_mut().ok_or_else(|| {
                    Error::header(line_no, "property declared before any element")
                })?;
                element.properties.push(property);
            }
            END_HEADER => break,
            other => {
                tracing::warn!(line = line_no, keyword = other, "ignoring unknown header keyword");
            }
        }
    }

    if !format_seen {
        return Err(Error::header(line_no, "missing 'format' line"));
    }

    tracing::debug!(
        encoding = %header.encoding,
        elements = header.elements.len(),
        header_len = header.header_len,
        "parsed PLY header"
    );
    Ok(header)
}

fn parse_format(line_no: usize, mut tokens: SplitWhitespace<'_>) -> Result<(Encoding, f32)> {
    let (Some(keyword), Some(version)) = (tokens.next(), tokens.next()) else {
        return Err(Error::header(line_no, "expected 'format <encoding> <version>'"));
    };
    let encoding =
        Encoding::from_keyword(keyword).map_err(|e| Error::header(line_no, e.to_string()))?;
    let version = version
        .parse::<f32>()
        .map_err(|_| Error::header(line_no, format!("invalid format version '{version}'")))?;
    Ok((encoding, version))
}

/// Text after `comment` and one separating space.
fn comment_text(line: &str) -> &str {
    let rest = line
        .trim_start()
        .strip_prefix(COMMENT_KEYWORD)
        .unwrap_or_default();
    rest.strip_prefix([' ', '\t']).unwrap_or(rest)
}

fn parse_element(line_no: usize, mut tokens: SplitWhitespace<'_>) -> Result<ElementDescriptor> {
    let (Some(name), Some(count)) = (tokens.next(), tokens.next()) else {
        return Err(Error::header(line_no, "expected 'element <name> <count>'"));
    };
    let count = count
        .parse::<usize>()
        .map_err(|_| Error::header(line_no, format!("invalid element count '{count}'")))?;
    Ok(ElementDescriptor::new(name, count))
}

fn parse_property(line_no: usize, mut tokens: SplitWhitespace<'_>) -> Result<PropertyDescriptor> {
    let scalar = |token: &str| {
        ScalarType::from_name(token).map_err(|e| Error::header(line_no, e.to_string()))
    };

    match tokens.next() {
        Some(LIST_KEYWORD) => {
            let (Some(count), Some(value), Some(name)) = (tokens.next(), tokens.next(), tokens.next())
            else {
                return Err(Error::header(
                    line_no,
                    "expected 'property list <count type> <value type> <name>'",
                ));
            };
            PropertyDescriptor::list(name, scalar(count)?, scalar(value)?)
                .map_err(|e| Error::header(line_no, e.to_string()))
        }
        Some(value) => {
            let Some(name) = tokens.next() else {
                return Err(Error::header(line_no, "expected 'property <type> <name>'"));
            };
            Ok(PropertyDescriptor::scalar(name, scalar(value)?))
        }
        None => Err(Error::header(line_no, "expected 'property <type> <name>'")),
    }
}

/// Render the header text, `end_header` line included.
pub fn header_text(header: &PlyHeader) -> String {
    let mut lines = vec![
        PLY_MAGIC.to_string(),
        format!("{FORMAT_KEYWORD} {} {:?}", header.encoding.keyword(), header.version),
    ];
    lines.extend(header.comments.iter().map(|c| format!("{COMMENT_KEYWORD} {c}")));
    lines.extend(header.obj_info.iter().map(|i| format!("{OBJ_INFO_KEYWORD} {i}")));
    for element in &header.elements {
        lines.push(format!("{ELEMENT_KEYWORD} {} {}", element.name, element.count));
        lines.extend(element.properties.iter().map(PropertyDescriptor::header_line));
    }
    lines.push(END_HEADER.to_string());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
