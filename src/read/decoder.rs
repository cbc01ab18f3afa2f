//! The element-by-element unmarshalling engine behind the streaming batch
//! decode path.

use std::io::BufRead;
use std::mem;

use log::debug;
use quick_xml::de::from_str;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader as XmlReader;
use serde::de::DeserializeOwned;

use crate::context::MarshalContext;
use crate::error::{XmlError, XmlResult};

/// Walks the token stream, decoding each child of the wrapper element into
/// one record and invoking `reduce` once per full batch, plus once for a
/// non-empty remainder. Returns the final accumulator, `None` when the
/// wrapper held no records.
pub(crate) fn read_many<T, R, F>(
    source: Box<dyn BufRead>,
    ctx: &MarshalContext,
    validate: bool,
    batch_size: usize,
    mut reduce: F,
) -> XmlResult<Option<R>>
where
    T: DeserializeOwned,
    F: FnMut(Option<R>, Vec<T>) -> R,
{
    let shape = ctx.shape();
    let mut xml = XmlReader::from_reader(source);
    xml.config_mut().check_comments = validate;

    let mut buffer = Vec::with_capacity(1024);

    // Skip the prologue (declaration, processing instructions, comments,
    // doctype, inter-element whitespace) up to the wrapper element, then
    // step past it. Text is never trimmed at the parser level: captured
    // record subtrees must stay byte-faithful.
    loop {
        buffer.clear();
        match xml
            .read_event_into(&mut buffer)
            .map_err(|e| XmlError::decode(shape, e))?
        {
            Event::Start(_) => break,
            // A self-closing wrapper holds no records.
            Event::Empty(_) | Event::Eof => return Ok(None),
            _ => continue,
        }
    }

    let mut result = None;
    let mut batch: Vec<T> = Vec::new();
    loop {
        buffer.clear();
        let event = xml
            .read_event_into(&mut buffer)
            .map_err(|e| XmlError::decode(shape, e))?;
        let fragment = match event {
            Event::Start(ref start) => capture_element(&mut xml, start, shape)?,
            Event::Empty(ref start) => {
                let mut fragment = String::new();
                append_tag(&mut fragment, start, shape, true)?;
                fragment
            }
            Event::End(_) | Event::Eof => break,
            // Whitespace between record elements, comments, PIs.
            _ => continue,
        };

        debug!("decoding record element: {fragment}");
        let record = from_str(&fragment).map_err(|e| XmlError::decode(shape, e))?;
        batch.push(record);
        if batch.len() >= batch_size {
            result = Some(reduce(result, mem::take(&mut batch)));
        }
    }
    if !batch.is_empty() {
        result = Some(reduce(result, batch));
    }
    Ok(result)
}

/// Decodes the document's root element, prologue skipped, into a single
/// record, with the parser configured the same way as the streaming path.
pub(crate) fn read_one<T>(
    source: Box<dyn BufRead>,
    ctx: &MarshalContext,
    validate: bool,
) -> XmlResult<T>
where
    T: DeserializeOwned,
{
    let shape = ctx.shape();
    let mut xml = XmlReader::from_reader(source);
    xml.config_mut().check_comments = validate;

    let mut buffer = Vec::with_capacity(1024);
    let fragment = loop {
        buffer.clear();
        match xml
            .read_event_into(&mut buffer)
            .map_err(|e| XmlError::decode(shape, e))?
        {
            Event::Start(ref start) => break capture_element(&mut xml, start, shape)?,
            Event::Empty(ref start) => {
                let mut fragment = String::new();
                append_tag(&mut fragment, start, shape, true)?;
                break fragment;
            }
            Event::Eof => return Err(XmlError::decode(shape, "unexpected end of document")),
            _ => continue,
        }
    };
    debug!("decoding root element: {fragment}");
    from_str(&fragment).map_err(|e| XmlError::decode(shape, e))
}

/// Re-assembles the text of the element that `start` opened, subtree
/// included, so it can be deserialized on its own. Content is carried over
/// escaped exactly as it appeared in the source.
fn capture_element(
    xml: &mut XmlReader<Box<dyn BufRead>>,
    start: &BytesStart,
    shape: &'static str,
) -> XmlResult<String> {
    let mut fragment = String::new();
    append_tag(&mut fragment, start, shape, false)?;

    let mut buffer = Vec::with_capacity(1024);
    let mut depth = 1;
    while depth > 0 {
        buffer.clear();
        match xml
            .read_event_into(&mut buffer)
            .map_err(|e| XmlError::decode(shape, e))?
        {
            Event::Start(ref e) => {
                depth += 1;
                append_tag(&mut fragment, e, shape, false)?;
            }
            Event::Empty(ref e) => append_tag(&mut fragment, e, shape, true)?,
            Event::End(ref e) => {
                depth -= 1;
                fragment.push_str("</");
                fragment.push_str(&String::from_utf8_lossy(e.name().as_ref()));
                fragment.push('>');
            }
            Event::Text(ref text) => {
                fragment.push_str(&String::from_utf8_lossy(text.as_ref()));
            }
            Event::GeneralRef(ref entity) => {
                fragment.push('&');
                fragment.push_str(&String::from_utf8_lossy(entity.as_ref()));
                fragment.push(';');
            }
            Event::CData(ref cdata) => {
                fragment.push_str("<![CDATA[");
                fragment.push_str(&String::from_utf8_lossy(cdata.as_ref()));
                fragment.push_str("]]>");
            }
            Event::Eof => {
                return Err(XmlError::decode(shape, "unexpected end of document"));
            }
            _ => {}
        }
    }
    Ok(fragment)
}

/// Writes an opening (or self-closing) tag with its attributes carried over
/// verbatim.
fn append_tag(
    fragment: &mut String,
    element: &BytesStart,
    shape: &'static str,
    self_closing: bool,
) -> XmlResult<()> {
    fragment.push('<');
    fragment.push_str(&String::from_utf8_lossy(element.name().as_ref()));
    for attr in element.attributes() {
        let attr = attr.map_err(|e| XmlError::decode(shape, e))?;
        fragment.push(' ');
        fragment.push_str(&String::from_utf8_lossy(attr.key.as_ref()));
        fragment.push_str("=\"");
        fragment.push_str(&String::from_utf8_lossy(&attr.value));
        fragment.push('"');
    }
    fragment.push_str(if self_closing { "/>" } else { ">" });
    Ok(())
}
