//! The write side: immutable builders for single-record and streaming
//! multi-record encodes.

mod encoder;

use std::fmt;
use std::io;

use serde::Serialize;

use crate::Xml;
use crate::encoding::TextEncoding;
use crate::error::{XmlError, XmlResult};
use crate::shape::Shape;

/// A builder for single-record write configuration.
///
/// Writers are plain values with a fluent api: every configuration call
/// consumes the builder and returns a new one. Obtain one from
/// [`Xml::write`].
///
/// ```
/// use serde::Serialize;
/// use xml_marshal::{Shape, Xml};
///
/// #[derive(Serialize)]
/// struct Person {
///     name: String,
///     age: u32,
/// }
/// impl Shape for Person {}
///
/// let xml = Xml::new();
/// let person = Person { name: "Alice".to_string(), age: 30 };
/// assert_eq!(
///     xml.write(person).string().unwrap(),
///     "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
///      <person><name>Alice</name><age>30</age></person>"
/// );
/// ```
pub struct Writer<'x, T> {
    xml: &'x Xml,
    value: T,
    encoding: String,
    format: bool,
}

impl<'x, T> Writer<'x, T>
where
    T: Shape + Serialize + 'static,
{
    pub(crate) fn new(xml: &'x Xml, value: T) -> Self {
        Writer {
            xml,
            value,
            encoding: "UTF-8".to_string(),
            format: false,
        }
    }

    /// Indents the output. Formatting never changes the document structure,
    /// only its whitespace.
    pub fn format(self) -> Self {
        Writer {
            format: true,
            ..self
        }
    }

    /// The encoding of the output xml. Defaults to "UTF-8".
    pub fn encoding(self, encoding: impl Into<String>) -> Self {
        Writer {
            encoding: encoding.into(),
            ..self
        }
    }

    /// Encodes the record and writes it to the given byte sink, returning
    /// the sink for chaining.
    pub fn to<W: io::Write>(self, mut sink: W) -> XmlResult<W> {
        let encoding = TextEncoding::resolve(&self.encoding).map_err(XmlError::encode)?;
        let text = encoder::write_one(self.xml, &self.value, &self.encoding, self.format)?;
        sink.write_all(&encoding.encode_document(&text))
            .map_err(XmlError::encode)?;
        sink.flush().map_err(XmlError::encode)?;
        Ok(sink)
    }

    /// Writes the record to a character sink. The text is not byte-encoded;
    /// the declaration still names the configured encoding.
    pub fn to_fmt<W: fmt::Write>(self, mut sink: W) -> XmlResult<W> {
        let text = encoder::write_one(self.xml, &self.value, &self.encoding, self.format)?;
        sink.write_str(&text).map_err(XmlError::encode)?;
        Ok(sink)
    }

    /// Encodes the record to an in-memory byte buffer and decodes it back
    /// into a string with the configured encoding.
    pub fn string(self) -> XmlResult<String> {
        let encoding = TextEncoding::resolve(&self.encoding).map_err(XmlError::encode)?;
        let bytes = self.to(Vec::new())?;
        encoding.decode_document(&bytes).map_err(XmlError::encode)
    }
}

/// A builder for streaming multi-record write configuration. Obtain one
/// from [`Xml::write_all`]; it accepts any iterable, including lazy
/// iterators, and never holds more than one record in memory at a time.
pub struct BatchWriter<'x, I> {
    xml: &'x Xml,
    records: I,
    root_element: String,
    element: Option<String>,
    encoding: String,
    format: bool,
}

impl<'x, I> BatchWriter<'x, I>
where
    I: Iterator,
    I::Item: Shape + Serialize + 'static,
{
    pub(crate) fn new(xml: &'x Xml, records: I) -> Self {
        BatchWriter {
            xml,
            records,
            root_element: "Root".to_string(),
            element: None,
            encoding: "UTF-8".to_string(),
            format: false,
        }
    }

    /// Indents the output.
    pub fn format(self) -> Self {
        BatchWriter {
            format: true,
            ..self
        }
    }

    /// The encoding of the output xml. Defaults to "UTF-8".
    pub fn encoding(self, encoding: impl Into<String>) -> Self {
        BatchWriter {
            encoding: encoding.into(),
            ..self
        }
    }

    /// The name of the wrapper element around the record fragments.
    /// Defaults to "Root".
    pub fn root_element(self, root_element: impl Into<String>) -> Self {
        BatchWriter {
            root_element: root_element.into(),
            ..self
        }
    }

    /// Overrides the per-record element name. When unset, the name is
    /// resolved from the record shape: its declared name when present,
    /// otherwise the lower-camel-cased type name.
    pub fn element(self, element: impl Into<String>) -> Self {
        BatchWriter {
            element: Some(element.into()),
            ..self
        }
    }

    /// Streams the records to the given byte sink, returning the sink for
    /// chaining.
    pub fn to<W: io::Write>(self, sink: W) -> XmlResult<W> {
        let encoding = TextEncoding::resolve(&self.encoding).map_err(XmlError::encode)?;
        encoder::write_many(
            self.xml,
            self.records,
            &self.root_element,
            self.element.as_deref(),
            &self.encoding,
            encoding,
            self.format,
            sink,
        )
    }

    /// Streams the records to a character sink. The text is not
    /// byte-encoded; the declaration still names the configured encoding.
    pub fn to_fmt<W: fmt::Write>(self, mut sink: W) -> XmlResult<W> {
        let bytes = encoder::write_many(
            self.xml,
            self.records,
            &self.root_element,
            self.element.as_deref(),
            &self.encoding,
            TextEncoding::Utf8,
            self.format,
            Vec::new(),
        )?;
        let text = String::from_utf8(bytes).map_err(XmlError::encode)?;
        sink.write_str(&text).map_err(XmlError::encode)?;
        Ok(sink)
    }

    /// Streams the records to an in-memory byte buffer and decodes it back
    /// into a string with the configured encoding.
    pub fn string(self) -> XmlResult<String> {
        let encoding = TextEncoding::resolve(&self.encoding).map_err(XmlError::encode)?;
        let bytes = self.to(Vec::new())?;
        encoding.decode_document(&bytes).map_err(XmlError::encode)
    }
}
