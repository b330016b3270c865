//! Format sniffing for streams of unknown compression.
//!
//! Thin wrapper around standard library I/O primitives ([`Read::take`],
//! [`Cursor`], [`Chain`](std::io::Chain)): peek the magic bytes, then replay
//! them in front of the rest of the stream.

use crate::Compression;
use crate::construct::GZIP_MAGIC;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::io::{Cursor, Read};

/// A decoding [`Read`]er produced by [`Compression::sniff`].
///
/// Yields the *decompressed* document from its first byte, regardless of how
/// many bytes were consumed to detect the format.
pub struct Sniffed<'a> {
    compression: Compression,
    reader: Box<dyn Read + 'a>,
}
impl Sniffed<'_> {
    /// The format detected from the stream's magic bytes.
    pub fn compression(&self) -> Compression {
        self.compression
    }
}
impl Read for Sniffed<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}
impl Debug for Sniffed<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Sniffed").field("compression", &self.compression).finish_non_exhaustive()
    }
}

impl Compression {
    /// Detect the compression of a stream from its magic bytes and wrap it in
    /// the matching decoder.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::{Cursor, Read};
    /// use upsite_compress::Compression;
    ///
    /// let compressed = Compression::Gzip.compress(b"<files/>").unwrap();
    /// let mut sniffed = Compression::sniff(Cursor::new(compressed)).unwrap();
    /// assert_eq!(sniffed.compression(), Compression::Gzip);
    ///
    /// let mut xml = String::new();
    /// sniffed.read_to_string(&mut xml).unwrap();
    /// assert_eq!(xml, "<files/>");
    /// ```
    pub fn sniff<'a, R: Read + 'a>(mut reader: R) -> Result<Sniffed<'a>> {
        let mut head = Vec::with_capacity(GZIP_MAGIC.len());
        (&mut reader).take(GZIP_MAGIC.len() as u64).read_to_end(&mut head).or_raise(|| ErrorKind::Io)?;
        let compression = Compression::from_magic_bytes(&head);
        tracing::trace!(format = %compression, "sniffed index stream");
        let replay = Cursor::new(head).chain(reader);
        Ok(Sniffed {
            compression,
            reader: compression.wrap_reader(replay),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const DOCUMENT: &[u8] = b"<?xml version=\"1.0\"?><files/>";

    #[rstest]
    #[case(Compression::None)]
    #[case(Compression::Gzip)]
    fn test_sniff_detects_and_replays(#[case] format: Compression) {
        let encoded = format.compress(DOCUMENT).unwrap();
        let mut sniffed = Compression::sniff(Cursor::new(encoded)).unwrap();
        assert_eq!(sniffed.compression(), format);
        let mut output = Vec::new();
        sniffed.read_to_end(&mut output).unwrap();
        assert_eq!(output, DOCUMENT);
    }

    #[rstest]
    #[case(b"")]
    #[case(b"<")]
    fn test_sniff_short_input(#[case] input: &[u8]) {
        let mut sniffed = Compression::sniff(Cursor::new(input)).unwrap();
        assert_eq!(sniffed.compression(), Compression::None);
        let mut output = Vec::new();
        sniffed.read_to_end(&mut output).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_sniff_truncated_gzip() {
        let encoded = Compression::Gzip.compress(DOCUMENT).unwrap();
        let truncated = encoded[..encoded.len() / 2].to_vec();
        let mut sniffed = Compression::sniff(Cursor::new(truncated)).unwrap();
        let mut output = Vec::new();
        assert!(sniffed.read_to_end(&mut output).is_err());
    }
}
