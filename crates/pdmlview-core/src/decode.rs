/// Dissection document decoder.
///
/// Turns one self-contained PDML document (a single `<packet>` element)
/// into an owned [`PdmlElement`] tree, then runs the full pipeline: prune,
/// link, apply expansion paths. A whole capture as written by
/// `tshark -T pdml` wraps its packets in `<pdml>`; [`packet_bytes`] cuts
/// one packet out of such a capture first.
///
/// # Attribute handling
///
/// Every attribute lands in the element's attribute map. A fixed set of
/// recognised keys additionally populate dedicated fields:
///
/// | key        | field                                   |
/// |------------|-----------------------------------------|
/// | `pos`      | `pos` (must parse as a non-negative int) |
/// | `size`     | `size` (must parse as a non-negative int)|
/// | `showname` | `label`                                 |
/// | `show`     | `label`, only when `showname` is empty  |
/// | `hide`     | `hidden` when the value is `yes`        |
/// | `name`     | `name`                                  |
///
/// A `pos` or `size` that fails to parse aborts the decode. It is never
/// defaulted to zero, since a bogus range would silently corrupt hex
/// highlighting later on.
use crate::expansion::SharedExpandedPaths;
use crate::model::{PdmlElement, PdmlTree};
use crate::prune::prune;
use compact_str::CompactString;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::num::ParseIntError;
use thiserror::Error;
use tracing::{debug, warn};

/// Deepest element nesting accepted before decoding gives up.
///
/// Real dissections rarely exceed a dozen levels; the cap keeps hostile
/// input from exhausting the stack.
pub const MAX_DEPTH: usize = 256;

/// Reasons a document can fail to decode.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed document at byte {position}: {source}")]
    Malformed {
        position: usize,
        source: quick_xml::Error,
    },

    #[error("bad attribute syntax in <{tag}>: {source}")]
    Attribute { tag: String, source: AttrError },

    #[error("bad value for attribute {attribute:?} in <{tag}>: {source}")]
    AttributeValue {
        tag: String,
        attribute: String,
        source: quick_xml::Error,
    },

    #[error("<{tag}> attribute {attribute}={value:?} is not a non-negative integer")]
    InvalidNumber {
        tag: String,
        attribute: &'static str,
        value: String,
        source: ParseIntError,
    },

    #[error("document contains no element")]
    NoRootElement,

    #[error("<pdml> capture contains no <packet>")]
    NoPacket,

    #[error("unexpected closing tag </{tag}> before any element")]
    StrayEndTag { tag: String },

    #[error("document ended inside <{tag}>")]
    Truncated { tag: String },

    #[error("elements nested deeper than {} levels", MAX_DEPTH)]
    TooDeep,
}

/// Attribute keys that map onto dedicated element fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KnownAttr {
    Pos,
    Size,
    ShowName,
    Show,
    Hide,
    Name,
}

impl KnownAttr {
    fn from_key(key: &[u8]) -> Option<Self> {
        match key {
            b"pos" => Some(Self::Pos),
            b"size" => Some(Self::Size),
            b"showname" => Some(Self::ShowName),
            b"show" => Some(Self::Show),
            b"hide" => Some(Self::Hide),
            b"name" => Some(Self::Name),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Pos => "pos",
            Self::Size => "size",
            Self::ShowName => "showname",
            Self::Show => "show",
            Self::Hide => "hide",
            Self::Name => "name",
        }
    }
}

/// Decode the first element of `data` and everything nested in it.
///
/// Leading declarations, comments, processing instructions and whitespace
/// are skipped. Anything after the root element's closing tag is ignored.
pub fn decode_document(data: &[u8]) -> Result<PdmlElement, DecodeError> {
    let mut reader = Reader::from_reader(data);
    loop {
        let event = reader
            .read_event()
            .map_err(|source| malformed(&reader, source))?;
        match event {
            Event::Start(start) => {
                let element = element_from_start(&start)?;
                return decode_body(&mut reader, data, element, 1);
            }
            Event::Empty(start) => return element_from_start(&start),
            Event::End(end) => {
                return Err(DecodeError::StrayEndTag {
                    tag: String::from_utf8_lossy(end.local_name().as_ref()).into_owned(),
                })
            }
            Event::Eof => return Err(DecodeError::NoRootElement),
            _ => {}
        }
    }
}

/// The bytes of one packet's dissection within `data`.
///
/// A document whose root is `<pdml>` is a whole capture: the first
/// `<packet>` child is cut out, start tag through closing tag. Any other
/// document is already a single packet and is returned unchanged.
pub fn packet_bytes(data: &[u8]) -> Result<&[u8], DecodeError> {
    let mut reader = Reader::from_reader(data);
    let mut in_capture = false;
    loop {
        let event = reader
            .read_event()
            .map_err(|source| malformed(&reader, source))?;
        match event {
            Event::Start(start) if !in_capture => {
                if start.local_name().as_ref() != b"pdml" {
                    return Ok(data);
                }
                in_capture = true;
            }
            Event::Empty(start) if !in_capture => {
                if start.local_name().as_ref() == b"pdml" {
                    return Err(DecodeError::NoPacket);
                }
                return Ok(data);
            }
            Event::Start(start) if start.local_name().as_ref() == b"packet" => {
                let begin = tag_start(data, &reader);
                skip_element(&mut reader, &start)?;
                let end = (reader.buffer_position() as usize).min(data.len());
                debug!("Taking packet at bytes {begin}..{end} of a <pdml> capture");
                return Ok(&data[begin..end]);
            }
            Event::Empty(start) if start.local_name().as_ref() == b"packet" => {
                let begin = tag_start(data, &reader);
                let end = (reader.buffer_position() as usize).min(data.len());
                return Ok(&data[begin..end]);
            }
            Event::Start(start) => skip_element(&mut reader, &start)?,
            Event::End(_) if in_capture => return Err(DecodeError::NoPacket),
            Event::End(end) => {
                return Err(DecodeError::StrayEndTag {
                    tag: String::from_utf8_lossy(end.local_name().as_ref()).into_owned(),
                })
            }
            Event::Eof if in_capture => {
                return Err(DecodeError::Truncated {
                    tag: "pdml".to_owned(),
                })
            }
            Event::Eof => return Err(DecodeError::NoRootElement),
            _ => {}
        }
    }
}

/// Offset of the `<` opening the tag the reader just consumed.
fn tag_start(data: &[u8], reader: &Reader<&[u8]>) -> usize {
    let after = (reader.buffer_position() as usize).min(data.len());
    data[..after]
        .iter()
        .rposition(|&b| b == b'<')
        .unwrap_or(0)
}

/// Consume events up to and including the closing tag of `start`.
fn skip_element(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<(), DecodeError> {
    let mut depth = 1usize;
    loop {
        let event = reader
            .read_event()
            .map_err(|source| malformed(reader, source))?;
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => {
                return Err(DecodeError::Truncated {
                    tag: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
                })
            }
            _ => {}
        }
    }
}

/// Decode, prune, link and expand one packet's dissection.
///
/// Returns `None` when the document is malformed (the error is logged) or
/// when the root element itself is pruned away. Either way the caller should
/// show no detail view for the packet; neither case is fatal.
pub fn decode_packet(data: &[u8], expanded: &SharedExpandedPaths) -> Option<PdmlTree> {
    match try_decode_packet(data, expanded) {
        Ok(tree) => tree,
        Err(e) => {
            warn!("Failed to decode packet dissection: {e}");
            None
        }
    }
}

/// Like [`decode_packet`], but hands the decode error back to the caller.
pub fn try_decode_packet(
    data: &[u8],
    expanded: &SharedExpandedPaths,
) -> Result<Option<PdmlTree>, DecodeError> {
    let root = decode_document(data)?;
    let decoded = root.subtree_len();

    let Some(root) = prune(root) else {
        debug!("Root element pruned, no tree for this packet");
        return Ok(None);
    };
    debug!(
        "Decoded {} elements, {} kept after pruning",
        decoded,
        root.subtree_len()
    );

    let tree = PdmlTree::link(root, expanded.clone());
    tree.apply_expanded_paths();
    Ok(Some(tree))
}

/// Read children until the element's closing tag, recording the verbatim
/// inner markup on the way.
fn decode_body(
    reader: &mut Reader<&[u8]>,
    data: &[u8],
    mut element: PdmlElement,
    depth: usize,
) -> Result<PdmlElement, DecodeError> {
    if depth > MAX_DEPTH {
        return Err(DecodeError::TooDeep);
    }
    let content_start = reader.buffer_position() as usize;
    loop {
        let event = reader
            .read_event()
            .map_err(|source| malformed(reader, source))?;
        match event {
            Event::Start(start) => {
                let child = element_from_start(&start)?;
                element
                    .children
                    .push(decode_body(reader, data, child, depth + 1)?);
            }
            Event::Empty(start) => element.children.push(element_from_start(&start)?),
            Event::End(_) => {
                // The closing tag is the last `<` before the reader's position.
                let after = (reader.buffer_position() as usize).min(data.len());
                let body = &data[content_start..after];
                let end_tag = body.iter().rposition(|&b| b == b'<').unwrap_or(body.len());
                element.content = body[..end_tag].to_vec();
                return Ok(element);
            }
            Event::Eof => {
                return Err(DecodeError::Truncated {
                    tag: element.tag.to_string(),
                })
            }
            _ => {}
        }
    }
}

/// Build an element (without children) from its start tag.
fn element_from_start(start: &BytesStart<'_>) -> Result<PdmlElement, DecodeError> {
    let mut element = PdmlElement {
        tag: CompactString::new(String::from_utf8_lossy(start.local_name().as_ref())),
        ..Default::default()
    };
    let mut showname: Option<String> = None;
    let mut show: Option<String> = None;

    for attr in start.attributes() {
        let attr = attr.map_err(|source| DecodeError::Attribute {
            tag: element.tag.to_string(),
            source,
        })?;
        let key_name = attr.key.local_name();
        let key_bytes = key_name.as_ref();
        let key = CompactString::new(String::from_utf8_lossy(key_bytes));
        let value = attr
            .unescape_value()
            .map_err(|source| DecodeError::AttributeValue {
                tag: element.tag.to_string(),
                attribute: key.to_string(),
                source,
            })?
            .into_owned();

        match KnownAttr::from_key(key_bytes) {
            Some(known @ (KnownAttr::Pos | KnownAttr::Size)) => {
                let n = parse_extent(&element.tag, known, &value)?;
                if known == KnownAttr::Pos {
                    element.pos = n;
                } else {
                    element.size = n;
                }
            }
            Some(KnownAttr::ShowName) => showname = Some(value.clone()),
            Some(KnownAttr::Show) => show = Some(value.clone()),
            Some(KnownAttr::Hide) => element.hidden = value == "yes",
            Some(KnownAttr::Name) => element.name = CompactString::new(&value),
            None => {}
        }
        element.attrs.insert(key, value);
    }

    element.label = showname
        .filter(|s| !s.is_empty())
        .or(show)
        .unwrap_or_default();
    Ok(element)
}

fn parse_extent(tag: &str, attr: KnownAttr, value: &str) -> Result<usize, DecodeError> {
    value
        .parse::<usize>()
        .map_err(|source| DecodeError::InvalidNumber {
            tag: tag.to_owned(),
            attribute: attr.key(),
            value: value.to_owned(),
            source,
        })
}

fn malformed(reader: &Reader<&[u8]>, source: quick_xml::Error) -> DecodeError {
    DecodeError::Malformed {
        position: reader.error_position() as usize,
        source,
    }
}
