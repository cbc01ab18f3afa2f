#![cfg_attr(docsrs, feature(doc_cfg))]

/*!
 # xml-marshal

 A centralised and consistent way of handling XML to record and record to
 XML conversion. As well as managing straightforward conversions in a
 convenient way, it can read and write XML in a streaming fashion, which
 allows processing of large amounts of XML without requiring the full
 document or model to be in memory.

 Record types implement [`Shape`] (marshalling metadata, usually an empty
 impl) alongside the serde traits.

 ## Reading

 Basic XML to record conversion:

 ```
 use serde::Deserialize;
 use xml_marshal::{Shape, Xml};

 #[derive(Debug, Deserialize, PartialEq)]
 struct Person {
     name: String,
     age: u32,
 }
 impl Shape for Person {}

 let xml = Xml::new();

 // The document root is the record itself.
 let person: Person = xml
     .read()
     .from_str("<person><name>Alice</name><age>30</age></person>")
     .one()
     .unwrap();
 assert_eq!(person.name, "Alice");

 // A wrapper element containing one record element per child.
 let people: Vec<Person> = xml
     .read()
     .from_str(
         "<Root>\
            <person><name>Alice</name><age>30</age></person>\
            <person><name>Bob</name><age>25</age></person>\
          </Root>",
     )
     .list()
     .unwrap();
 assert_eq!(people.len(), 2);
 ```

 Streamed reading keeps memory consumption bounded: records are decoded
 element by element and handed to a reducer in batches (see
 [`Reader::stream`]). The reducer receives the accumulator so far (`None`
 on the first invocation) and returns the next accumulator, so it can
 aggregate a result across all batches.

 ## Writing

 Basic record to XML conversion:

 ```
 use serde::Serialize;
 use xml_marshal::{Shape, Xml};

 #[derive(Serialize, Clone)]
 struct Person {
     name: String,
     age: u32,
 }
 impl Shape for Person {}

 let xml = Xml::new();
 let alice = Person { name: "Alice".to_string(), age: 30 };

 let out = xml.write(alice.clone()).string().unwrap();
 assert_eq!(
     out,
     "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
      <person><name>Alice</name><age>30</age></person>"
 );

 // Sequences are wrapped in a synthetic root element and streamed out one
 // record at a time; lazy iterators produce byte-identical output.
 let out = xml.write_all(vec![alice.clone(), alice]).string().unwrap();
 assert_eq!(
     out,
     "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
      <Root>\
      <person><name>Alice</name><age>30</age></person>\
      <person><name>Alice</name><age>30</age></person>\
      </Root>"
 );
 ```

 ## Resource consumption

 [`Xml`] retains a [`MarshalContext`](context::MarshalContext) for each
 shape it transforms, so treat it as expensive to throw away and recreate.
 It is thread-safe and, beyond context creation, stateless: create one and
 share it amongst many consumers. Readers and writers are plain values;
 every configuration call returns a new one.
*/

pub mod context;
mod encoding;
pub mod error;
pub mod read;
pub mod shape;
pub mod write;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use crate::error::{XmlError, XmlResult};
pub use crate::read::{Reader, Source};
pub use crate::shape::Shape;
pub use crate::write::{BatchWriter, Writer};

use crate::context::ContextCache;

/// The shared marshalling core: owns the per-shape context cache and hands
/// out read/write builders. Thread-safe; share one instance.
#[derive(Debug, Default)]
pub struct Xml {
    contexts: ContextCache,
}

impl Xml {
    pub fn new() -> Self {
        Xml {
            contexts: ContextCache::new(),
        }
    }

    pub(crate) fn contexts(&self) -> &ContextCache {
        &self.contexts
    }

    /// Starts configuring a read of records of type `T`.
    pub fn read<T>(&self) -> Reader<'_, T>
    where
        T: Shape + DeserializeOwned + 'static,
    {
        Reader::new(self)
    }

    /// Starts configuring a write of a single record.
    pub fn write<T>(&self, value: T) -> Writer<'_, T>
    where
        T: Shape + Serialize + 'static,
    {
        Writer::new(self, value)
    }

    /// Starts configuring a streaming write of a sequence of records. Any
    /// iterable is accepted, including lazy iterators supplying records in
    /// batches.
    pub fn write_all<I>(&self, records: I) -> BatchWriter<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: Shape + Serialize + 'static,
    {
        BatchWriter::new(self, records.into_iter())
    }
}
