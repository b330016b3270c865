//! Compression Operations

use crate::Compression;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use flate2::{Compression as GzCompression, read::GzDecoder, write::GzEncoder};
use std::io::{Read, Write};
use tracing::instrument;

// Index documents are written rarely and read often; favour size.
const GZIP_LEVEL: GzCompression = GzCompression::best();

/// A writer that compresses everything written to it into `W`.
///
/// Call [`finish`](Self::finish) once done: it writes the gzip trailer and
/// reports if that fails, which dropping the encoder would not.
#[derive(Debug)]
pub enum Encoder<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
}

impl<W: Write> Encoder<W> {
    /// Complete the stream and hand back the inner writer.
    pub fn finish(self) -> Result<W> {
        match self {
            Encoder::Plain(writer) => Ok(writer),
            Encoder::Gzip(encoder) => encoder.finish().or_raise(|| ErrorKind::Io),
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Encoder::Plain(writer) => writer.write(buf),
            Encoder::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Encoder::Plain(writer) => writer.flush(),
            Encoder::Gzip(encoder) => encoder.flush(),
        }
    }
}

impl Compression {
    /// Compress a byte slice in memory.
    ///
    /// # Examples
    ///
    /// ```
    /// use upsite_compress::Compression;
    ///
    /// let compressed = Compression::Gzip.compress(b"<files/>").unwrap();
    /// assert_eq!(Compression::from_magic_bytes(&compressed), Compression::Gzip);
    /// ```
    #[instrument(skip(input), fields(format = %self, input_size = input.len(), output_size))]
    pub fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = self.encoder(Vec::with_capacity(input.len()));
        encoder.write_all(input).or_raise(|| ErrorKind::Io)?;
        let output = encoder.finish()?;
        tracing::Span::current().record("output_size", output.len());
        Ok(output)
    }

    /// Decompress a byte slice in memory.
    #[instrument(skip(input), fields(format = %self, input_size = input.len(), output_size))]
    pub fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.wrap_reader(input).read_to_end(&mut output).or_raise(|| ErrorKind::InvalidData)?;
        tracing::Span::current().record("output_size", output.len());
        Ok(output)
    }

    /// Wrap a writer in the matching compression layer.
    pub fn encoder<W: Write>(&self, writer: W) -> Encoder<W> {
        match self {
            Compression::None => Encoder::Plain(writer),
            Compression::Gzip => Encoder::Gzip(GzEncoder::new(writer, GZIP_LEVEL)),
        }
    }

    /// Wrap a reader with the appropriate decompression layer.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::{Cursor, Read};
    /// use upsite_compress::Compression;
    ///
    /// let compressed = Compression::Gzip.compress(b"<files/>").unwrap();
    /// let mut reader = Compression::Gzip.wrap_reader(Cursor::new(compressed));
    /// let mut xml = String::new();
    /// reader.read_to_string(&mut xml).unwrap();
    /// assert_eq!(xml, "<files/>");
    /// ```
    pub fn wrap_reader<'a, R: Read + 'a>(&self, reader: R) -> Box<dyn Read + 'a> {
        match self {
            Compression::None => Box::new(reader),
            Compression::Gzip => Box::new(GzDecoder::new(reader)),
        }
    }
}
