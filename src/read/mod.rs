//! The read side: an immutable builder over a data source, executing
//! single-record, full-list or streaming batch decodes.

mod decoder;

use std::io::{BufRead, BufReader, Cursor, Read};
use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::Xml;
use crate::encoding::sniff_to_string;
use crate::error::{XmlError, XmlResult};
use crate::shape::Shape;

/// Where the XML comes from.
pub enum Source {
    /// A byte stream, consumed as UTF-8 text.
    Reader(Box<dyn Read>),
    /// An in-memory byte block; the encoding is sniffed from a BOM, then
    /// from the XML declaration, defaulting to UTF-8.
    Bytes(Vec<u8>),
    /// Already-decoded text.
    Text(String),
}

impl Source {
    fn into_buf_read(self, shape: &'static str) -> XmlResult<Box<dyn BufRead>> {
        match self {
            Source::Reader(reader) => Ok(Box::new(BufReader::new(reader))),
            Source::Bytes(bytes) => {
                let text = sniff_to_string(&bytes).map_err(|e| XmlError::decode(shape, e))?;
                Ok(Box::new(Cursor::new(text.into_bytes())))
            }
            Source::Text(text) => Ok(Box::new(Cursor::new(text.into_bytes()))),
        }
    }
}

/// A builder for read configuration.
///
/// Readers are plain values with a fluent api: every configuration call
/// consumes the builder and returns a new one, so retain the result of each
/// call. Obtain one from [`Xml::read`].
///
/// ```
/// use serde::Deserialize;
/// use xml_marshal::{Shape, Xml};
///
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct Person {
///     name: String,
///     age: u32,
/// }
/// impl Shape for Person {}
///
/// let xml = Xml::new();
/// let person: Person = xml
///     .read()
///     .from_str("<person><name>Alice</name><age>30</age></person>")
///     .one()
///     .unwrap();
/// assert_eq!(person.age, 30);
/// ```
pub struct Reader<'x, T> {
    xml: &'x Xml,
    source: Option<Source>,
    validate: bool,
    batch_size: usize,
    _marker: PhantomData<T>,
}

impl<'x, T> Reader<'x, T>
where
    T: Shape + DeserializeOwned + 'static,
{
    pub(crate) fn new(xml: &'x Xml) -> Self {
        Reader {
            xml,
            source: None,
            validate: false,
            batch_size: 200,
            _marker: PhantomData,
        }
    }

    /// Controls whether the parser performs its optional strict
    /// well-formedness checks. Defaults to false for performance. Basic
    /// well-formedness is always enforced.
    pub fn validate(self, validate: bool) -> Self {
        Reader { validate, ..self }
    }

    /// The number of records handed to the reducer at a time on the
    /// streaming interfaces. Controls memory consumption only. Defaults to
    /// 200; values below 1 are clamped to 1.
    pub fn batch_size(self, batch_size: usize) -> Self {
        Reader {
            batch_size: batch_size.max(1),
            ..self
        }
    }

    /// Reads from a byte stream. The stream is consumed as UTF-8; use
    /// [`from_bytes`](Reader::from_bytes) for other encodings.
    pub fn from(self, reader: impl Read + 'static) -> Self {
        Reader {
            source: Some(Source::Reader(Box::new(reader))),
            ..self
        }
    }

    /// Reads from an in-memory byte block of sniffed encoding.
    pub fn from_bytes(self, bytes: impl Into<Vec<u8>>) -> Self {
        Reader {
            source: Some(Source::Bytes(bytes.into())),
            ..self
        }
    }

    /// Reads from a string.
    pub fn from_str(self, text: impl Into<String>) -> Self {
        Reader {
            source: Some(Source::Text(text.into())),
            ..self
        }
    }

    /// Decodes the source into one record: the document's root element is
    /// the record itself.
    pub fn one(self) -> XmlResult<T> {
        let ctx = self.xml.contexts().get::<T>()?;
        let source = self.source.ok_or(XmlError::NoSource)?;
        let reader = source.into_buf_read(ctx.shape())?;
        decoder::read_one(reader, &ctx, self.validate)
    }

    /// Decodes a wrapper element containing zero or more record elements
    /// into a list, in document order. Runs the streaming path internally;
    /// the batch size has no effect on the result.
    pub fn list(self) -> XmlResult<Vec<T>> {
        let gathered = self.stream(|acc: Option<Vec<T>>, mut batch| {
            let mut all = acc.unwrap_or_default();
            all.append(&mut batch);
            all
        })?;
        Ok(gathered.unwrap_or_default())
    }

    /// Decodes a wrapper element containing zero or more record elements,
    /// invoking `reduce` once per batch with the accumulator so far.
    ///
    /// The first invocation receives `None`; the reducer's return value
    /// becomes the accumulator for the next batch and, ultimately, the
    /// result. If the source holds no records the reducer is never invoked
    /// and the result is `None`. On failure, batches already handed to the
    /// reducer stand — there is no transactional guarantee across the
    /// stream.
    ///
    /// ```
    /// use serde::Deserialize;
    /// use xml_marshal::{Shape, Xml};
    ///
    /// #[derive(Deserialize)]
    /// struct Item {
    ///     value: i64,
    /// }
    /// impl Shape for Item {}
    ///
    /// let xml = Xml::new();
    /// let sum = xml
    ///     .read::<Item>()
    ///     .batch_size(2)
    ///     .from_str("<list><item><value>1</value></item><item><value>2</value></item><item><value>3</value></item></list>")
    ///     .stream(|sum, batch| {
    ///         sum.unwrap_or(0) + batch.iter().map(|i| i.value).sum::<i64>()
    ///     })
    ///     .unwrap();
    /// assert_eq!(sum, Some(6));
    /// ```
    pub fn stream<R, F>(self, reduce: F) -> XmlResult<Option<R>>
    where
        F: FnMut(Option<R>, Vec<T>) -> R,
    {
        let ctx = self.xml.contexts().get::<T>()?;
        let source = self.source.ok_or(XmlError::NoSource)?;
        let reader = source.into_buf_read(ctx.shape())?;
        decoder::read_many(reader, &ctx, self.validate, self.batch_size, reduce)
    }
}
