use crate::Compression;
use crate::error::{Error, ErrorKind};
use std::{path::Path, str::FromStr};

pub(crate) const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

impl FromStr for Compression {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "xml" | "plain" => Ok(Compression::None),
            "gz" | "gzip" => Ok(Compression::Gzip),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(s.to_string())),
        }
    }
}
impl From<&[u8]> for Compression {
    fn from(value: &[u8]) -> Self {
        Compression::from_magic_bytes(value)
    }
}
impl Compression {
    /// Detect compression from a file name, e.g. `db.xml.gz`.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| match ext.to_lowercase().as_str() {
                "gz" => Compression::Gzip,
                _ => Compression::None,
            })
            .unwrap_or(Compression::None)
    }

    /// Detect compression format from magic bytes.
    ///
    /// Anything that isn't gzip is assumed to be plain markup; the XML parser
    /// downstream is the one to complain if it isn't.
    #[must_use]
    pub fn from_magic_bytes(bytes: &[u8]) -> Self {
        if bytes.starts_with(&GZIP_MAGIC) {
            return Compression::Gzip;
        }
        Compression::None
    }
}

#[cfg(test)]
mod tests {
    use crate::Compression;
    use rstest::rstest;

    #[rstest]
    #[case("none", Compression::None)]
    #[case("xml", Compression::None)]
    #[case("gz", Compression::Gzip)]
    #[case("gzip", Compression::Gzip)]
    #[case(" GZIP ", Compression::Gzip)]
    fn test_from_str(#[case] test: &str, #[case] expected: Compression) {
        assert_eq!(test.parse::<Compression>().unwrap(), expected);
    }

    #[rstest]
    #[case("bzip2")]
    #[case("definitely not valid")]
    #[case("")]
    fn test_from_str_invalid(#[case] test: &str) {
        assert!(test.parse::<Compression>().is_err());
    }

    #[rstest]
    #[case("db.xml", Compression::None)]
    #[case("db.xml.gz", Compression::Gzip)]
    #[case("cache/DB.XML.GZ", Compression::Gzip)]
    // A dotfile has no extension.
    #[case(".gz", Compression::None)]
    #[case("db", Compression::None)]
    fn test_from_path(#[case] test: &str, #[case] expected: Compression) {
        assert_eq!(Compression::from_path(test), expected);
    }

    #[rstest]
    #[case(b"<?xml version=\"1.0\"?>", Compression::None)]
    #[case(b"", Compression::None)]
    #[case(&[0x1F], Compression::None)]
    #[case(&[0x1F, 0x8B, 0x08, 0x00], Compression::Gzip)]
    fn test_from_magic_bytes(#[case] bytes: &[u8], #[case] expected: Compression) {
        assert_eq!(Compression::from_magic_bytes(bytes), expected);
        assert_eq!(<&[u8] as Into<Compression>>::into(bytes), expected);
    }
}
