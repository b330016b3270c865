use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::Read;

/// Opaque content digest identifying one build of a file.
///
/// Checksums read from an index are kept verbatim; the engine only ever
/// compares them for equality, so digests produced by other tools work too.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Checksum(String);

impl Checksum {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// BLAKE3 digest of an in-memory buffer.
    pub fn of_bytes(bytes: impl AsRef<[u8]>) -> Self {
        Self(blake3::hash(bytes.as_ref()).to_string())
    }

    /// BLAKE3 digest of everything the reader yields.
    ///
    /// Each call owns its own hasher, so concurrent callers never share
    /// digest state.
    pub fn of_reader(mut reader: impl Read) -> Result<Self> {
        let mut hasher = blake3::Hasher::new();
        hasher.update_reader(&mut reader).or_raise(|| ErrorKind::Io)?;
        Ok(Self(hasher.finalize().to_string()))
    }
}

impl From<String> for Checksum {
    fn from(value: String) -> Self {
        Self(value)
    }
}
impl From<&str> for Checksum {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
impl AsRef<str> for Checksum {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
impl Display for Checksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reader_matches_bytes() {
        let content = b"PK\x03\x04 definitely a jar file";
        let from_reader = Checksum::of_reader(Cursor::new(content)).unwrap();
        assert_eq!(from_reader, Checksum::of_bytes(content));
        assert_eq!(from_reader.as_str().len(), 64);
    }

    #[test]
    fn test_different_content_differs() {
        assert_ne!(Checksum::of_bytes("a"), Checksum::of_bytes("b"));
    }

    #[test]
    fn test_verbatim_checksums_compare_by_text() {
        assert_eq!(Checksum::from("abc"), Checksum::new(String::from("abc")));
        assert_eq!(Checksum::from("abc").to_string(), "abc");
    }
}
