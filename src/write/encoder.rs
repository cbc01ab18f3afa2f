//! The element-by-element marshalling engines behind the write builders.

use std::io;

use log::debug;
use quick_xml::Writer as XmlWriter;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::se::Serializer;
use serde::Serialize;

use crate::Xml;
use crate::encoding::{TextEncoding, TranscodingWriter};
use crate::error::{XmlError, XmlResult};
use crate::shape::Shape;

/// Renders one record as a complete document: declaration (with
/// `standalone="yes"`, the record being the root element) followed by the
/// record under its resolved element name.
pub(crate) fn write_one<T>(xml: &Xml, value: &T, label: &str, format: bool) -> XmlResult<String>
where
    T: Shape + Serialize + 'static,
{
    let ctx = xml.contexts().get::<T>()?;
    let mut text = format!("<?xml version=\"1.0\" encoding=\"{label}\" standalone=\"yes\"?>");
    if format {
        text.push('\n');
    }
    let mut serializer =
        Serializer::with_root(&mut text, Some(ctx.element_name())).map_err(XmlError::encode)?;
    if format {
        serializer.indent(' ', 4);
    }
    value.serialize(serializer).map_err(XmlError::encode)?;
    Ok(text)
}

/// Streams a sequence of records into `sink`: declaration, wrapper start
/// element, one child element per record in iteration order, wrapper end,
/// flush. Only one record is held in memory at a time; batching is
/// invisible in the output.
pub(crate) fn write_many<I, W>(
    xml: &Xml,
    records: I,
    root_element: &str,
    element: Option<&str>,
    label: &str,
    encoding: TextEncoding,
    format: bool,
    sink: W,
) -> XmlResult<W>
where
    I: Iterator,
    I::Item: Shape + Serialize + 'static,
    W: io::Write,
{
    debug!("streaming records under wrapper element '{root_element}'");
    let out = TranscodingWriter::new(sink, encoding);
    let mut writer = if format {
        XmlWriter::new_with_indent(out, b' ', 4)
    } else {
        XmlWriter::new(out)
    };
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some(label), None)))
        .map_err(XmlError::encode)?;
    writer
        .write_event(Event::Start(BytesStart::new(root_element)))
        .map_err(XmlError::encode)?;

    // The per-record element name is resolved lazily: an empty sequence
    // never touches the context cache.
    let mut resolved = element.map(str::to_owned);
    for record in records {
        if resolved.is_none() {
            resolved = Some(xml.contexts().get::<I::Item>()?.element_name().to_owned());
        }
        if let Some(tag) = resolved.as_deref() {
            writer
                .write_serializable(tag, &record)
                .map_err(XmlError::encode)?;
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new(root_element)))
        .map_err(XmlError::encode)?;
    let mut out = writer.into_inner();
    io::Write::flush(&mut out).map_err(XmlError::encode)?;
    Ok(out.into_inner())
}
