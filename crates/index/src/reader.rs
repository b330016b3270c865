//! Single-pass reader for index documents.
//!
//! The document is walked once, front to back. Outside of a `<file>` only
//! source descriptors mean anything; inside one, every child element adds to
//! a [`Draft`] that is classified and committed into the registry as soon as
//! the `<file>` closes. A failure part-way through leaves every earlier
//! `<file>` committed and discards the one being read.

use crate::element::{Attributes, Element};
use crate::error::{ErrorKind, Result};
use derive_more::Display;
use exn::{OptionExt, ResultExt};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::io::{BufReader, Read};
use tracing::{debug, instrument, warn};
use upsite_compress::Compression;
use upsite_model::{DEFAULT_SOURCE, Dependency, Draft, Origin, PlatformPolicy, Timestamp, VersionRecord};
use upsite_registry::{FileRegistry, Source};

/// Something worth telling the user about that didn't stop the read.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Two sources publish a file under the same name; the later read wins.
    #[display("'{filename}' from source '{source}' shadows the one from source '{shadowed}'")]
    Shadowed {
        filename: String,
        source: String,
        shadowed: String,
    },
}

/// Outcome of reading one index document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadReport {
    /// Compression detected on the input stream.
    pub compression: Compression,
    /// Number of `<file>` elements merged into the registry.
    pub committed: usize,
    /// Number of `<file>` elements skipped because their source is unknown.
    pub dropped: usize,
    pub warnings: Vec<Warning>,
}

/// Read an index published by a remote source and merge it into the
/// registry.
///
/// Every file is attributed to `source`, whatever the document itself
/// claims. Entries are classified against the source's last-synced marker as
/// it stood before this call; advancing that marker afterwards is up to the
/// caller.
#[instrument(skip(registry, reader, policy), fields(committed, warnings))]
pub fn read_remote<R, P>(registry: &mut FileRegistry, source: &str, reader: R, policy: &P) -> Result<ReadReport>
where
    R: Read,
    P: PlatformPolicy + ?Sized,
{
    let last_synced = registry
        .sources()
        .get(source)
        .map(Source::last_synced)
        .ok_or_raise(|| ErrorKind::UnknownSource(source.to_string()))?;
    let mode = Mode::Remote { source };
    let report = IndexReader::new(registry, mode, last_synced, policy).read(reader)?;
    record_span(&report);
    Ok(report)
}

/// Read the client's own cache document and merge it into the registry.
///
/// Source descriptors in the document are registered as they are met. A
/// file claiming a source that is not registered by the time it is read is
/// dropped.
#[instrument(skip(registry, reader, policy), fields(committed, warnings))]
pub fn read_local_cache<R, P>(registry: &mut FileRegistry, reader: R, policy: &P) -> Result<ReadReport>
where
    R: Read,
    P: PlatformPolicy + ?Sized,
{
    let report = IndexReader::new(registry, Mode::LocalCache, Timestamp::ZERO, policy).read(reader)?;
    record_span(&report);
    Ok(report)
}

fn record_span(report: &ReadReport) {
    let span = tracing::Span::current();
    span.record("committed", report.committed);
    span.record("warnings", report.warnings.len());
}

#[derive(Debug, Clone, Copy)]
enum Mode<'a> {
    Remote { source: &'a str },
    LocalCache,
}

impl Mode<'_> {
    fn origin(&self) -> Origin {
        match self {
            Mode::Remote { .. } => Origin::Remote,
            Mode::LocalCache => Origin::LocalCache,
        }
    }
}

enum State {
    Outside,
    InsideFile(Draft),
}

struct IndexReader<'a, P: ?Sized> {
    registry: &'a mut FileRegistry,
    mode: Mode<'a>,
    /// Last-synced marker of the source as it stood before the read began.
    last_synced: Timestamp,
    policy: &'a P,
    state: State,
    body: String,
    report: ReadReport,
}

impl<'a, P> IndexReader<'a, P>
where
    P: PlatformPolicy + ?Sized,
{
    fn new(registry: &'a mut FileRegistry, mode: Mode<'a>, last_synced: Timestamp, policy: &'a P) -> Self {
        Self {
            registry,
            mode,
            last_synced,
            policy,
            state: State::Outside,
            body: String::new(),
            report: ReadReport::default(),
        }
    }

    fn read<R: Read>(mut self, input: R) -> Result<ReadReport> {
        let sniffed = Compression::sniff(input).or_raise(|| ErrorKind::Compression)?;
        self.report.compression = sniffed.compression();
        let mut reader = Reader::from_reader(BufReader::new(sniffed));
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        loop {
            let event = reader.read_event_into(&mut buf).or_raise(|| ErrorKind::MalformedDocument)?;
            match event {
                Event::Start(start) => {
                    self.open(&start)?;
                },
                Event::Empty(start) => {
                    let element = self.open(&start)?;
                    self.close(element)?;
                },
                Event::End(end) => self.close(Element::from_name(end.local_name().as_ref()))?,
                Event::Text(text) => {
                    let text = text.unescape().or_raise(|| ErrorKind::MalformedDocument)?;
                    self.body.push_str(&text);
                },
                Event::CData(data) => {
                    let text = std::str::from_utf8(&data).or_raise(|| ErrorKind::MalformedDocument)?;
                    self.body.push_str(text);
                },
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }

        if let State::InsideFile(draft) = &self.state {
            debug!(filename = draft.filename(), "Document ended inside a file element");
            exn::bail!(ErrorKind::MalformedDocument);
        }
        Ok(self.report)
    }

    fn open(&mut self, start: &BytesStart<'_>) -> Result<Element> {
        let element = Element::from_name(start.local_name().as_ref());
        self.body.clear();
        let inside_file = matches!(self.state, State::InsideFile(_));
        match element {
            Element::Other => {},
            Element::File if !inside_file => {
                let attributes = Attributes::read(element, start)?;
                self.state = State::InsideFile(self.start_file(&attributes)?);
            },
            Element::SourceDescriptor if !inside_file => {
                let attributes = Attributes::read(element, start)?;
                self.register_source(&attributes)?;
            },
            element if element.belongs_to_file() && inside_file => self.extend_draft(element, start)?,
            element => exn::bail!(ErrorKind::UnexpectedElement(element.as_str())),
        }
        Ok(element)
    }

    /// Apply the attributes of a child element to the draft being read.
    fn extend_draft(&mut self, element: Element, start: &BytesStart<'_>) -> Result<()> {
        let State::InsideFile(draft) = &mut self.state else {
            return Ok(());
        };
        match element {
            Element::Version => {
                let attributes = Attributes::read(element, start)?;
                let record = VersionRecord::new(attributes.require("checksum")?, attributes.timestamp("timestamp")?);
                let file_size = attributes.size("filesize")?;
                if draft.set_version(record) {
                    draft.file_size = file_size;
                }
            },
            Element::PreviousVersion => {
                let attributes = Attributes::read(element, start)?;
                let record = VersionRecord::new(attributes.require("checksum")?, attributes.timestamp("timestamp")?);
                draft.add_previous_version(record);
            },
            Element::Dependency => {
                let attributes = Attributes::read(element, start)?;
                draft.add_dependency(Dependency::new(
                    attributes.require("filename")?,
                    attributes.timestamp("timestamp")?,
                    attributes.get("overrides") == Some("true"),
                ));
            },
            // Text elements are applied when they close.
            _ => {},
        }
        Ok(())
    }

    fn close(&mut self, element: Element) -> Result<()> {
        let body = std::mem::take(&mut self.body);
        if element == Element::File {
            if let State::InsideFile(draft) = std::mem::replace(&mut self.state, State::Outside) {
                self.finish_file(draft);
            }
            return Ok(());
        }
        let State::InsideFile(draft) = &mut self.state else {
            return Ok(());
        };
        match element {
            Element::Description => draft.description = Some(body),
            Element::Author => draft.add_author(body),
            Element::Platform => draft.add_platform(body),
            Element::Category => draft.add_category(body),
            Element::Link => draft.add_link(body),
            _ => {},
        }
        Ok(())
    }

    fn start_file(&mut self, attributes: &Attributes) -> Result<Draft> {
        let filename = attributes.require("filename")?;
        let source = match self.mode {
            Mode::Remote { source } => source,
            Mode::LocalCache => attributes.get("update-site").unwrap_or(DEFAULT_SOURCE),
        };

        if let Mode::Remote { source } = self.mode
            && source != DEFAULT_SOURCE
            && let Some(existing) = self.registry.owner_of(filename)
            && existing != source
        {
            let warning = Warning::Shadowed {
                filename: filename.to_string(),
                source: source.to_string(),
                shadowed: existing.to_string(),
            };
            warn!(%warning, "Shadowed file");
            self.report.warnings.push(warning);
        }

        let mut draft = Draft::new(filename, source);
        draft.executable = attributes.get("executable").is_some_and(|value| value.eq_ignore_ascii_case("true"));
        Ok(draft)
    }

    fn finish_file(&mut self, mut draft: Draft) {
        draft.classify(self.last_synced, self.policy);
        if matches!(self.mode, Mode::LocalCache) && !self.registry.sources().contains(&draft.source) {
            debug!(filename = draft.filename(), source = %draft.source, "Dropped file from unknown source");
            self.report.dropped += 1;
            return;
        }
        self.registry.commit(draft, self.mode.origin());
        self.report.committed += 1;
    }

    fn register_source(&mut self, attributes: &Attributes) -> Result<()> {
        // Remote indexes don't get to define sources.
        if let Mode::Remote { .. } = self.mode {
            return Ok(());
        }
        let mut source = Source::new(attributes.require("name")?, attributes.require("url")?)
            .with_last_synced(attributes.required_timestamp("timestamp")?);
        source.ssh_host = attributes.get("ssh-host").map(str::to_string);
        source.upload_target = attributes.get("upload-directory").map(str::to_string);
        self.registry.sources_mut().add(source);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use upsite_model::{Action, AnyPlatform, Checksum, HostPlatform, Status};
    use upsite_registry::Sources;

    const SITE1: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<pluginRecords>
  <plugin filename="jars/foo.jar" executable="TRUE">
    <version checksum="abc" timestamp="100" filesize="1234"/>
    <previous-version checksum="old" timestamp="20"/>
    <description>Does &amp; things</description>
    <author>Curtis</author>
    <platform>linux64</platform>
    <category>Analysis</category>
    <link>https://example.org/foo</link>
    <dependency filename="jars/bar.jar" timestamp="90"/>
  </plugin>
</pluginRecords>"#;

    #[fixture]
    fn registry() -> FileRegistry {
        let mut sources = Sources::new();
        sources.add(Source::new("site1", "https://one.example.org/").with_last_synced(Timestamp::new(50)));
        sources.add(Source::new("site2", "https://two.example.org/"));
        FileRegistry::with_sources(sources)
    }

    fn remote(registry: &mut FileRegistry, source: &str, document: &str) -> Result<ReadReport> {
        read_remote(registry, source, document.as_bytes(), &AnyPlatform)
    }

    #[rstest]
    fn test_new_file_is_installable(registry: FileRegistry) {
        let mut registry = registry;
        let report = remote(&mut registry, "site1", SITE1).unwrap();
        assert_eq!(report.committed, 1);
        assert_eq!(report.compression, Compression::None);
        assert!(report.warnings.is_empty());

        let entry = registry.get("jars/foo.jar").unwrap();
        assert_eq!(entry.status, Status::New);
        assert_eq!(entry.action, Action::Install);
        assert_eq!(entry.current(), Some(&VersionRecord::new("abc", Timestamp::new(100))));
        assert_eq!(entry.previous_versions(), &[VersionRecord::new("old", Timestamp::new(20))]);
        assert_eq!(entry.file_size, 1234);
        assert_eq!(entry.description.as_deref(), Some("Does & things"));
        assert_eq!(entry.authors(), &["Curtis".to_string()]);
        assert!(entry.platforms.contains("linux64"));
        assert!(entry.categories.contains("Analysis"));
        assert!(entry.links.contains("https://example.org/foo"));
        assert_eq!(entry.dependencies(), &[Dependency::new("jars/bar.jar", Timestamp::new(90), false)]);
        assert!(entry.executable);
        assert_eq!(entry.source, "site1");
    }

    #[rstest]
    fn test_already_seen_version_is_not_new(registry: FileRegistry) {
        let mut registry = registry;
        registry.sources_mut().advance("site1", Timestamp::new(100)).unwrap();
        remote(&mut registry, "site1", SITE1).unwrap();
        let entry = registry.get("jars/foo.jar").unwrap();
        assert_ne!(entry.status, Status::New);
        assert_eq!(entry.action, Action::NotInstalled);
    }

    #[rstest]
    fn test_new_status_clears_once_synced_past(registry: FileRegistry) {
        let mut registry = registry;
        remote(&mut registry, "site1", SITE1).unwrap();
        assert_eq!(registry.get("jars/foo.jar").unwrap().status, Status::New);

        registry.sources_mut().advance("site1", Timestamp::new(100)).unwrap();
        remote(&mut registry, "site1", SITE1).unwrap();
        let entry = registry.get("jars/foo.jar").unwrap();
        assert_eq!(entry.status, Status::NotInstalled);
        assert_eq!(entry.action, Action::NotInstalled);
    }

    #[rstest]
    fn test_incompatible_platform_is_new_but_not_installed(registry: FileRegistry) {
        let mut registry = registry;
        read_remote(&mut registry, "site1", SITE1.as_bytes(), &HostPlatform::new("win64")).unwrap();
        let entry = registry.get("jars/foo.jar").unwrap();
        assert_eq!(entry.status, Status::New);
        assert_eq!(entry.action, Action::New);
    }

    #[rstest]
    fn test_file_without_version_is_obsolete(registry: FileRegistry) {
        let mut registry = registry;
        let document = r#"<files>
            <file filename="jars/gone.jar">
                <previous-version checksum="x" timestamp="10"/>
                <previous-version checksum="y" timestamp="30"/>
            </file>
        </files>"#;
        remote(&mut registry, "site1", document).unwrap();
        let entry = registry.get("jars/gone.jar").unwrap();
        assert_eq!(entry.status, Status::ObsoleteUninstalled);
        assert!(entry.current().is_none());
        assert_eq!(entry.previous_versions().len(), 2);
        assert!(entry.has_version(&Checksum::from("y")));
    }

    #[rstest]
    fn test_second_source_shadows_first(registry: FileRegistry) {
        let mut registry = registry;
        let first = remote(&mut registry, "site1", SITE1).unwrap();
        let second = remote(&mut registry, "site2", SITE1).unwrap();
        let third = remote(&mut registry, "site2", SITE1).unwrap();

        assert!(first.warnings.is_empty());
        assert_eq!(second.warnings.len(), 1);
        assert_eq!(
            second.warnings[0].to_string(),
            "'jars/foo.jar' from source 'site2' shadows the one from source 'site1'"
        );
        assert!(third.warnings.is_empty());
        assert_eq!(registry.owner_of("jars/foo.jar"), Some("site2"));
    }

    #[rstest]
    fn test_overriding_dependency_replaces_earlier_edge(registry: FileRegistry) {
        let mut registry = registry;
        let document = r#"<files>
            <file filename="jars/foo.jar">
                <dependency filename="a.jar" timestamp="1"/>
                <dependency filename="a.jar" timestamp="2" overrides="true"/>
            </file>
        </files>"#;
        remote(&mut registry, "site1", document).unwrap();
        let entry = registry.get("jars/foo.jar").unwrap();
        assert_eq!(entry.dependencies(), &[Dependency::new("a.jar", Timestamp::new(2), true)]);
    }

    #[rstest]
    fn test_reading_twice_changes_nothing(registry: FileRegistry) {
        let mut registry = registry;
        remote(&mut registry, "site1", SITE1).unwrap();
        let once = registry.clone();
        remote(&mut registry, "site1", SITE1).unwrap();
        assert_eq!(registry, once);
    }

    #[rstest]
    fn test_gzip_input(registry: FileRegistry) {
        let mut registry = registry;
        let compressed = Compression::Gzip.compress(SITE1.as_bytes()).unwrap();
        let report = read_remote(&mut registry, "site1", compressed.as_slice(), &AnyPlatform).unwrap();
        assert_eq!(report.compression, Compression::Gzip);
        assert!(registry.contains("jars/foo.jar"));
    }

    #[rstest]
    fn test_unknown_remote_source_is_rejected(registry: FileRegistry) {
        let mut registry = registry;
        let err = remote(&mut registry, "nowhere", SITE1).unwrap_err();
        assert_eq!(*err, ErrorKind::UnknownSource("nowhere".into()));
        assert!(registry.is_empty());
    }

    #[rstest]
    fn test_remote_documents_cannot_define_sources(registry: FileRegistry) {
        let mut registry = registry;
        let document = r#"<files><source-descriptor name="evil" url="https://evil.example.org/" timestamp="1"/></files>"#;
        remote(&mut registry, "site1", document).unwrap();
        assert!(!registry.sources().contains("evil"));
    }

    #[rstest]
    #[case(
        r#"<files><file><version checksum="a"/></file></files>"#,
        ErrorKind::MissingAttribute { element: "file", attribute: "filename" }
    )]
    #[case(
        r#"<files><file filename="a.jar"><version timestamp="1"/></file></files>"#,
        ErrorKind::MissingAttribute { element: "version", attribute: "checksum" }
    )]
    #[case(
        r#"<files><file filename="a.jar"><version checksum="a" timestamp="soon"/></file></files>"#,
        ErrorKind::InvalidNumber { element: "version", attribute: "timestamp", value: "soon".into() }
    )]
    #[case(r#"<files><version checksum="a"/></files>"#, ErrorKind::UnexpectedElement("version"))]
    #[case(r#"<files><file filename="a.jar"><file filename="b.jar"/></file></files>"#, ErrorKind::UnexpectedElement("file"))]
    fn test_document_errors(registry: FileRegistry, #[case] document: &str, #[case] expected: ErrorKind) {
        let mut registry = registry;
        let err = remote(&mut registry, "site1", document).unwrap_err();
        assert_eq!(*err, expected);
    }

    #[rstest]
    fn test_failure_keeps_earlier_files(registry: FileRegistry) {
        let mut registry = registry;
        let document = r#"<files>
            <file filename="jars/a.jar"><version checksum="a" timestamp="1"/></file>
            <file filename="jars/b.jar"><version checksum="b" timestamp="-1"/></file>
        </files>"#;
        assert!(remote(&mut registry, "site1", document).is_err());
        assert!(registry.contains("jars/a.jar"));
        assert!(!registry.contains("jars/b.jar"));
    }

    #[rstest]
    #[case(r#"<files><file filename="jars/a.jar"><version checksum="a" timestamp="1"/>"#)]
    #[case(r#"<files><file filename="jars/a.jar"><version checksum="a" timestamp="1"/></files>"#)]
    fn test_unfinished_file_is_discarded(registry: FileRegistry, #[case] document: &str) {
        let mut registry = registry;
        assert!(remote(&mut registry, "site1", document).is_err());
        assert!(!registry.contains("jars/a.jar"));
    }

    #[test]
    fn test_local_cache_registers_sources_and_drops_orphans() {
        let document = r#"<pluginRecords>
            <update-site name="site3" url="https://three.example.org/" ssh-host="three" upload-directory="/srv/three" timestamp="77"/>
            <plugin filename="jars/a.jar" update-site="site3"><version checksum="a" timestamp="1"/></plugin>
            <plugin filename="jars/b.jar" update-site="gone"><version checksum="b" timestamp="1"/></plugin>
            <plugin filename="jars/c.jar"><version checksum="c" timestamp="1"/></plugin>
        </pluginRecords>"#;
        let mut registry = FileRegistry::new();
        let report = read_local_cache(&mut registry, document.as_bytes(), &AnyPlatform).unwrap();
        assert_eq!(report.committed, 2);
        assert_eq!(report.dropped, 1);

        let site3 = registry.sources().get("site3").unwrap();
        assert_eq!(site3.last_synced(), Timestamp::new(77));
        assert_eq!(site3.ssh_host.as_deref(), Some("three"));
        assert_eq!(site3.upload_target.as_deref(), Some("/srv/three"));

        assert_eq!(registry.owner_of("jars/a.jar"), Some("site3"));
        assert_eq!(registry.owner_of("jars/b.jar"), None);
        assert_eq!(registry.owner_of("jars/c.jar"), Some(DEFAULT_SOURCE));
        assert_eq!(registry.get("jars/a.jar").unwrap().status, Status::New);
    }

    #[test]
    fn test_local_cache_never_changes_provenance() {
        let mut registry = FileRegistry::new();
        registry.sources_mut().add(Source::new("site1", "https://one.example.org/"));
        registry.sources_mut().add(Source::new("site2", "https://two.example.org/"));
        read_remote(&mut registry, "site1", SITE1.as_bytes(), &AnyPlatform).unwrap();

        let document = r#"<files>
            <file filename="jars/foo.jar" update-site="site2"><version checksum="abc" timestamp="100"/></file>
        </files>"#;
        let report = read_local_cache(&mut registry, document.as_bytes(), &AnyPlatform).unwrap();
        assert!(report.warnings.is_empty());
        assert_eq!(registry.owner_of("jars/foo.jar"), Some("site1"));
    }

    #[test]
    fn test_source_descriptor_requires_timestamp() {
        let document = r#"<files><source-descriptor name="site3" url="https://three.example.org/"/></files>"#;
        let err = read_local_cache(&mut FileRegistry::new(), document.as_bytes(), &AnyPlatform).unwrap_err();
        assert_eq!(
            *err,
            ErrorKind::MissingAttribute {
                element: "source-descriptor",
                attribute: "timestamp"
            }
        );
    }
}
