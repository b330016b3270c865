use crate::Compression;
use std::fmt::{Display, Formatter, Result as FmtResult};

impl Display for Compression {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl AsRef<str> for Compression {
    fn as_ref(&self) -> &'static str {
        self.as_str()
    }
}

impl Compression {
    /// Returns the file extension for this compression format.
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Compression::None => "",
            Compression::Gzip => ".gz",
        }
    }

    /// Returns the short name used in configuration files.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
        }
    }

    /// Index file name for this format, e.g. `db.xml.gz`.
    #[must_use]
    pub fn index_filename(&self, stem: &str) -> String {
        format!("{stem}.xml{}", self.extension())
    }
}

#[cfg(test)]
mod tests {
    use crate::Compression;
    use rstest::rstest;

    #[rstest]
    #[case(Compression::None, "", "db.xml")]
    #[case(Compression::Gzip, ".gz", "db.xml.gz")]
    fn test_extension(#[case] format: Compression, #[case] extension: &str, #[case] filename: &str) {
        assert_eq!(format.extension(), extension);
        assert_eq!(format.index_filename("db"), filename);
    }

    #[rstest]
    #[case(Compression::None)]
    #[case(Compression::Gzip)]
    fn test_display_parses_back(#[case] format: Compression) {
        assert_eq!(format.to_string().parse::<Compression>().unwrap(), format);
    }
}
