use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use quick_xml::events::BytesStart;
use upsite_model::Timestamp;

/// The elements an index document is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Element {
    File,
    Version,
    PreviousVersion,
    Dependency,
    SourceDescriptor,
    Description,
    Author,
    Platform,
    Category,
    Link,
    /// The root element and anything this reader doesn't understand.
    Other,
}

impl Element {
    pub(crate) fn from_name(name: &[u8]) -> Self {
        match name {
            b"file" | b"plugin" => Self::File,
            b"version" => Self::Version,
            b"previous-version" => Self::PreviousVersion,
            b"dependency" => Self::Dependency,
            b"source-descriptor" | b"update-site" => Self::SourceDescriptor,
            b"description" => Self::Description,
            b"author" => Self::Author,
            b"platform" => Self::Platform,
            b"category" => Self::Category,
            b"link" => Self::Link,
            _ => Self::Other,
        }
    }

    /// Canonical element name, as written by this crate.
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Version => "version",
            Self::PreviousVersion => "previous-version",
            Self::Dependency => "dependency",
            Self::SourceDescriptor => "source-descriptor",
            Self::Description => "description",
            Self::Author => "author",
            Self::Platform => "platform",
            Self::Category => "category",
            Self::Link => "link",
            Self::Other => "other",
        }
    }

    /// Elements that are only meaningful inside a `<file>`.
    pub(crate) fn belongs_to_file(&self) -> bool {
        !matches!(self, Self::File | Self::SourceDescriptor | Self::Other)
    }
}

/// Unescaped attributes of one start tag, keyed by local name.
#[derive(Debug)]
pub(crate) struct Attributes {
    element: Element,
    values: Vec<(String, String)>,
}

impl Attributes {
    pub(crate) fn read(element: Element, start: &BytesStart<'_>) -> Result<Self> {
        let mut values = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.or_raise(|| ErrorKind::MalformedDocument)?;
            let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
            let value = attribute.unescape_value().or_raise(|| ErrorKind::MalformedDocument)?;
            values.push((key, value.into_owned()));
        }
        Ok(Self { element, values })
    }

    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.values.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
    }

    pub(crate) fn require(&self, key: &'static str) -> Result<&str> {
        self.get(key).ok_or_raise(|| ErrorKind::MissingAttribute {
            element: self.element.as_str(),
            attribute: key,
        })
    }

    /// A timestamp attribute; absent means [`Timestamp::ZERO`].
    pub(crate) fn timestamp(&self, key: &'static str) -> Result<Timestamp> {
        match self.get(key) {
            None => Ok(Timestamp::ZERO),
            Some(value) => value.parse::<Timestamp>().or_raise(|| self.invalid_number(key, value)),
        }
    }

    /// A timestamp attribute that has no sensible default.
    pub(crate) fn required_timestamp(&self, key: &'static str) -> Result<Timestamp> {
        let value = self.require(key)?;
        value.parse::<Timestamp>().or_raise(|| self.invalid_number(key, value))
    }

    /// A size attribute; absent means zero.
    pub(crate) fn size(&self, key: &'static str) -> Result<u64> {
        match self.get(key) {
            None => Ok(0),
            Some(value) => value.trim().parse::<u64>().or_raise(|| self.invalid_number(key, value)),
        }
    }

    fn invalid_number(&self, key: &'static str, value: &str) -> ErrorKind {
        ErrorKind::InvalidNumber {
            element: self.element.as_str(),
            attribute: key,
            value: value.to_string(),
        }
    }
}
