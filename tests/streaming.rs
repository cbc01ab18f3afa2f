use serde::{Deserialize, Serialize};
use xml_marshal::{Shape, Xml};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
struct Item {
    seq: usize,
    name: String,
}
impl Shape for Item {}

fn document(count: usize) -> String {
    let mut doc = String::from("<Root>");
    for seq in 0..count {
        doc.push_str(&format!(
            "<item><seq>{seq}</seq><name>item-{seq}</name></item>"
        ));
    }
    doc.push_str("</Root>");
    doc
}

#[test]
fn test_list_returns_all_records_in_document_order() {
    let xml = Xml::new();
    let records: Vec<Item> = xml.read().from_str(document(5)).list().unwrap();
    assert_eq!(records.len(), 5);
    for (position, record) in records.iter().enumerate() {
        assert_eq!(record.seq, position);
        assert_eq!(record.name, format!("item-{position}"));
    }
}

#[test]
fn test_list_ignores_batch_size() {
    let xml = Xml::new();
    let all: Vec<Item> = xml.read().from_str(document(10)).list().unwrap();
    let batched: Vec<Item> = xml
        .read()
        .batch_size(3)
        .from_str(document(10))
        .list()
        .unwrap();
    assert_eq!(all, batched);
}

#[test]
fn test_stream_with_batch_size_one_invokes_reducer_per_record() {
    let xml = Xml::new();
    let mut invocations = 0;
    let counted = xml
        .read::<Item>()
        .batch_size(1)
        .from_str(document(20))
        .stream(|count, batch| {
            invocations += 1;
            assert_eq!(batch.len(), 1);
            count.unwrap_or(0) + batch.len()
        })
        .unwrap();
    assert_eq!(invocations, 20);
    assert_eq!(counted, Some(20));
}

#[test]
fn test_stream_batch_completeness() {
    let _ = env_logger::try_init();
    let xml = Xml::new();
    let batch_size = 200;
    for count in [0usize, 1, 199, 200, 201, 1000] {
        let mut invocations = 0;
        let total = xml
            .read::<Item>()
            .from_str(document(count))
            .stream(|sum, batch| {
                invocations += 1;
                assert!(batch.len() <= batch_size);
                sum.unwrap_or(0) + batch.len()
            })
            .unwrap();
        assert_eq!(total.unwrap_or(0), count, "lost records for K={count}");
        assert_eq!(
            invocations,
            count.div_ceil(batch_size),
            "wrong invocation count for K={count}"
        );
    }
}

#[test]
fn test_stream_with_uneven_batch_size() {
    let xml = Xml::new();
    let mut batch_lengths = Vec::new();
    xml.read::<Item>()
        .batch_size(7)
        .from_str(document(199))
        .stream(|acc: Option<()>, batch| {
            batch_lengths.push(batch.len());
            acc.unwrap_or(())
        })
        .unwrap();
    assert_eq!(batch_lengths.len(), 199usize.div_ceil(7));
    assert_eq!(batch_lengths.iter().sum::<usize>(), 199);
    assert_eq!(*batch_lengths.last().unwrap(), 199 % 7);
}

#[test]
fn test_batch_size_is_clamped_to_one() {
    let xml = Xml::new();
    let mut invocations = 0;
    xml.read::<Item>()
        .batch_size(0)
        .from_str(document(3))
        .stream(|acc: Option<()>, batch| {
            invocations += 1;
            assert_eq!(batch.len(), 1);
            acc.unwrap_or(())
        })
        .unwrap();
    assert_eq!(invocations, 3);
}

#[test]
fn test_empty_wrapper_never_invokes_reducer() {
    let xml = Xml::new();
    for doc in ["<Root></Root>", "<Root/>"] {
        let mut invocations = 0;
        let result = xml
            .read::<Item>()
            .from_str(doc)
            .stream(|acc: Option<usize>, _| {
                invocations += 1;
                acc.unwrap_or(0)
            })
            .unwrap();
        assert_eq!(invocations, 0, "reducer invoked for {doc}");
        assert!(result.is_none());

        let records: Vec<Item> = xml.read().from_str(doc).list().unwrap();
        assert!(records.is_empty());
    }
}

#[test]
fn test_stream_skips_prologue_and_wrapper() {
    let xml = Xml::new();
    let doc = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <!-- generated -->\
         <?processing hint?>\
         {}",
        document(2)
    );
    let records: Vec<Item> = xml.read().from_str(doc).list().unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn test_stream_decodes_nested_and_attributed_elements() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Engine {
        #[serde(rename = "@kind")]
        kind: String,
        power: u32,
    }
    #[derive(Debug, Deserialize, PartialEq)]
    struct Vehicle {
        #[serde(rename = "@id")]
        id: String,
        make: String,
        engine: Engine,
    }
    impl Shape for Vehicle {}

    let xml = Xml::new();
    let doc = "<fleet>\
                 <vehicle id=\"v1\"><make>Toyota</make>\
                   <engine kind=\"hybrid\"><power>208</power></engine>\
                 </vehicle>\
                 <vehicle id=\"v2\"><make>Honda</make>\
                   <engine kind=\"gas\"><power>190</power></engine>\
                 </vehicle>\
               </fleet>";
    let records: Vec<Vehicle> = xml.read().from_str(doc).list().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "v1");
    assert_eq!(records[0].engine.kind, "hybrid");
    assert_eq!(records[1].make, "Honda");
    assert_eq!(records[1].engine.power, 190);
}

#[test]
fn test_stream_decodes_cdata_and_entities() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Note {
        body: String,
    }
    impl Shape for Note {}

    let xml = Xml::new();
    let doc = "<notes>\
                 <note><body><![CDATA[a < b & c]]></body></note>\
                 <note><body>x &amp; y</body></note>\
               </notes>";
    let records: Vec<Note> = xml.read().from_str(doc).list().unwrap();
    assert_eq!(records[0].body, "a < b & c");
    assert_eq!(records[1].body, "x & y");
}

#[test]
fn test_stream_preserves_spacing_around_entities() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Rec {
        id: String,
        note: String,
    }
    impl Shape for Rec {}

    let xml = Xml::new();
    let doc = "<Root><rec><id>x</id><note>a &amp; b &lt; c</note></rec></Root>";
    let records: Vec<Rec> = xml.read().from_str(doc).list().unwrap();
    assert_eq!(records[0].note, "a & b < c");
}

#[test]
fn test_stream_decodes_indented_documents() {
    let xml = Xml::new();
    let doc = "<Root>\n  <item>\n    <seq>0</seq>\n    <name>item-0</name>\n  </item>\n  \
               <item>\n    <seq>1</seq>\n    <name>item-1</name>\n  </item>\n</Root>\n";
    let records: Vec<Item> = xml.read().from_str(doc).list().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].name, "item-1");
}

#[test]
fn test_stream_decodes_self_closing_records() {
    #[derive(Debug, Deserialize, Default, PartialEq)]
    #[serde(default)]
    struct Marker {
        #[serde(rename = "@label")]
        label: String,
    }
    impl Shape for Marker {}

    let xml = Xml::new();
    let doc = "<markers><marker label=\"a\"/><marker label=\"b\"/></markers>";
    let records: Vec<Marker> = xml.read().from_str(doc).list().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].label, "a");
    assert_eq!(records[1].label, "b");
}
