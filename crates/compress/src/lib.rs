//! Compression handling for update-site index documents.
//!
//! Remote sources publish their index as `db.xml.gz`, while hand-maintained
//! mirrors and test fixtures are often plain XML. This crate hides that
//! difference behind the [`Compression`] enum:
//!
//! - **Format detection** from file names ([`Compression::from_path`]) or
//!   magic bytes ([`Compression::from_magic_bytes`])
//! - **In-memory** compression/decompression ([`Compression::compress`],
//!   [`Compression::decompress`])
//! - **Streaming** via [`Compression::wrap_reader`] and an [`Encoder`] from
//!   [`Compression::encoder`]
//! - **Sniffing** an unknown stream via [`Compression::sniff`], which peeks
//!   at the magic bytes and hands back a decoding reader that still yields the
//!   complete document.

mod construct;
pub mod error;
mod ops;
mod sniff;
mod util;

pub use crate::ops::Encoder;
pub use crate::sniff::Sniffed;

/// A supported index compression format.
///
/// Defaults to [`Gzip`](Self::Gzip), the format every update site publishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Plain XML (.xml)
    None,
    /// Gzip compression (.gz)
    #[default]
    Gzip,
}

#[cfg(test)]
mod tests {
    use crate::Compression;

    #[test]
    fn compression_default() {
        assert_eq!(Compression::default(), Compression::Gzip);
    }
}
