//! Byte/text conversion between the XML text layer (always UTF-8 in memory)
//! and the configured wire encoding.

use std::borrow::Cow;
use std::io::{self, Write};

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};

/// A resolved output/input encoding. UTF-16 needs dedicated handling because
/// `encoding_rs` only encodes into ASCII-compatible encodings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Legacy(&'static Encoding),
}

impl TextEncoding {
    /// Resolves an encoding label such as "UTF-8", "UTF-16" or "ISO-8859-1".
    pub(crate) fn resolve(label: &str) -> Result<TextEncoding, String> {
        let Some(encoding) = Encoding::for_label(label.trim().as_bytes()) else {
            return Err(format!("unsupported character encoding: {label}"));
        };
        Ok(if encoding == UTF_8 {
            TextEncoding::Utf8
        } else if encoding == UTF_16LE {
            TextEncoding::Utf16Le
        } else if encoding == UTF_16BE {
            TextEncoding::Utf16Be
        } else {
            TextEncoding::Legacy(encoding)
        })
    }

    fn bom(&self) -> &'static [u8] {
        match self {
            TextEncoding::Utf16Le => &[0xFF, 0xFE],
            TextEncoding::Utf16Be => &[0xFE, 0xFF],
            _ => &[],
        }
    }

    fn encode_str<'t>(&self, text: &'t str) -> Cow<'t, [u8]> {
        match self {
            TextEncoding::Utf8 => Cow::Borrowed(text.as_bytes()),
            TextEncoding::Utf16Le => {
                let mut out = Vec::with_capacity(text.len() * 2);
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
                Cow::Owned(out)
            }
            TextEncoding::Utf16Be => {
                let mut out = Vec::with_capacity(text.len() * 2);
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
                Cow::Owned(out)
            }
            TextEncoding::Legacy(encoding) => {
                let (bytes, _, _) = encoding.encode(text);
                Cow::Owned(bytes.into_owned())
            }
        }
    }

    /// Encodes a complete document, including a BOM for UTF-16 variants.
    pub(crate) fn encode_document(&self, text: &str) -> Vec<u8> {
        let mut out = self.bom().to_vec();
        out.extend_from_slice(&self.encode_str(text));
        out
    }

    /// Decodes bytes previously produced by [`encode_document`], stripping
    /// any BOM.
    pub(crate) fn decode_document(&self, bytes: &[u8]) -> Result<String, String> {
        let encoding = match self {
            TextEncoding::Utf8 => UTF_8,
            TextEncoding::Utf16Le => UTF_16LE,
            TextEncoding::Utf16Be => UTF_16BE,
            TextEncoding::Legacy(encoding) => encoding,
        };
        let (text, _, malformed) = encoding.decode(bytes);
        if malformed {
            return Err(format!("output is not valid {}", encoding.name()));
        }
        Ok(text.into_owned())
    }
}

/// Decodes an in-memory XML document of unknown encoding: a BOM wins, then
/// the `encoding` pseudo-attribute of the XML declaration, then UTF-8.
pub(crate) fn sniff_to_string(bytes: &[u8]) -> Result<String, String> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_checked(encoding, bytes);
    }
    if let Some(label) = declared_encoding(bytes) {
        let Some(encoding) = Encoding::for_label(label.as_bytes()) else {
            return Err(format!("unsupported character encoding: {label}"));
        };
        return decode_checked(encoding, bytes);
    }
    String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string())
}

fn decode_checked(encoding: &'static Encoding, bytes: &[u8]) -> Result<String, String> {
    let (text, _, malformed) = encoding.decode(bytes);
    if malformed {
        return Err(format!("input is not valid {}", encoding.name()));
    }
    Ok(text.into_owned())
}

/// Extracts the encoding label from an XML declaration, if one is present.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    if !bytes.starts_with(b"<?xml") {
        return None;
    }
    let head = &bytes[..bytes.len().min(512)];
    let end = head.windows(2).position(|w| w == b"?>")?;
    let decl = &head[..end];
    let at = decl.windows(8).position(|w| w == b"encoding")?;
    let mut rest = decl[at + 8..].iter().copied().skip_while(|b| b.is_ascii_whitespace());
    if rest.next() != Some(b'=') {
        return None;
    }
    let mut rest = rest.skip_while(|b| b.is_ascii_whitespace());
    let quote = rest.next()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let label: Vec<u8> = rest.take_while(|&b| b != quote).collect();
    String::from_utf8(label).ok()
}

/// An `io::Write` adapter that accepts UTF-8 text and forwards it to the
/// underlying sink in the target encoding. Incomplete trailing UTF-8
/// sequences are carried over to the next write.
pub(crate) struct TranscodingWriter<W: Write> {
    sink: W,
    encoding: TextEncoding,
    bom_pending: bool,
    pending: [u8; 4],
    pending_len: usize,
}

impl<W: Write> TranscodingWriter<W> {
    pub(crate) fn new(sink: W, encoding: TextEncoding) -> Self {
        TranscodingWriter {
            sink,
            encoding,
            bom_pending: !encoding.bom().is_empty(),
            pending: [0; 4],
            pending_len: 0,
        }
    }

    pub(crate) fn into_inner(self) -> W {
        self.sink
    }

    fn transcode(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.bom_pending {
            self.sink.write_all(self.encoding.bom())?;
            self.bom_pending = false;
        }
        let carried;
        let data: &[u8] = if self.pending_len > 0 {
            let mut joined = Vec::with_capacity(self.pending_len + buf.len());
            joined.extend_from_slice(&self.pending[..self.pending_len]);
            joined.extend_from_slice(buf);
            self.pending_len = 0;
            carried = joined;
            &carried
        } else {
            buf
        };
        match std::str::from_utf8(data) {
            Ok(text) => self.sink.write_all(&self.encoding.encode_str(text)),
            Err(e) if e.error_len().is_none() && data.len() - e.valid_up_to() <= 3 => {
                let (valid, tail) = data.split_at(e.valid_up_to());
                let text = std::str::from_utf8(valid)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                self.sink.write_all(&self.encoding.encode_str(text))?;
                self.pending[..tail.len()].copy_from_slice(tail);
                self.pending_len = tail.len();
                Ok(())
            }
            Err(e) => Err(io::Error::new(io::ErrorKind::InvalidData, e)),
        }
    }
}

impl<W: Write> Write for TranscodingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.encoding == TextEncoding::Utf8 {
            self.sink.write_all(buf)?;
        } else {
            self.transcode(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_labels() {
        assert_eq!(TextEncoding::resolve("UTF-8").unwrap(), TextEncoding::Utf8);
        assert_eq!(TextEncoding::resolve("utf-8").unwrap(), TextEncoding::Utf8);
        assert_eq!(
            TextEncoding::resolve("UTF-16").unwrap(),
            TextEncoding::Utf16Le
        );
        assert_eq!(
            TextEncoding::resolve("UTF-16BE").unwrap(),
            TextEncoding::Utf16Be
        );
        assert!(matches!(
            TextEncoding::resolve("ISO-8859-1").unwrap(),
            TextEncoding::Legacy(_)
        ));
        assert!(TextEncoding::resolve("UTF-99").is_err());
    }

    #[test]
    fn test_utf16_document_round_trip() {
        let enc = TextEncoding::resolve("UTF-16").unwrap();
        let bytes = enc.encode_document("<a>hi</a>");
        assert_eq!(&bytes[..2], &[0xFF, 0xFE]);
        assert_eq!(enc.decode_document(&bytes).unwrap(), "<a>hi</a>");
    }

    #[test]
    fn test_sniff_bom() {
        let enc = TextEncoding::resolve("UTF-16").unwrap();
        let bytes = enc.encode_document("<a>hi</a>");
        assert_eq!(sniff_to_string(&bytes).unwrap(), "<a>hi</a>");
    }

    #[test]
    fn test_sniff_declared_encoding() {
        let doc = "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a>hi</a>";
        assert_eq!(sniff_to_string(doc.as_bytes()).unwrap(), doc);
        assert_eq!(declared_encoding(doc.as_bytes()).unwrap(), "ISO-8859-1");
    }

    #[test]
    fn test_sniff_defaults_to_utf8() {
        assert_eq!(sniff_to_string(b"<a>hi</a>").unwrap(), "<a>hi</a>");
        assert!(sniff_to_string(&[b'<', 0xFF, 0xFF]).is_err());
    }

    #[test]
    fn test_transcoding_writer_utf16() {
        let mut writer = TranscodingWriter::new(Vec::new(), TextEncoding::Utf16Le);
        writer.write_all(b"<a>hi</a>").unwrap();
        let bytes = writer.into_inner();
        assert_eq!(
            TextEncoding::Utf16Le.decode_document(&bytes).unwrap(),
            "<a>hi</a>"
        );
    }

    #[test]
    fn test_transcoding_writer_split_utf8_sequence() {
        let text = "é".as_bytes();
        let mut writer = TranscodingWriter::new(
            Vec::new(),
            TextEncoding::Legacy(encoding_rs::WINDOWS_1252),
        );
        writer.write_all(&text[..1]).unwrap();
        writer.write_all(&text[1..]).unwrap();
        assert_eq!(writer.into_inner(), vec![0xE9]);
    }
}
