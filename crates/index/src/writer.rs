use crate::element::Element;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;
use tracing::instrument;
use upsite_compress::Compression;
use upsite_model::FileEntry;
use upsite_registry::{FileRegistry, Source};

const ROOT: &str = "files";

/// Serialize the whole registry as a local-cache document.
///
/// Sources come first so that reading the document back registers them
/// before any file that refers to them. Entries are written in filename
/// order; the same registry always produces the same bytes. Status and
/// action are not written, they are derived again on the next read.
#[instrument(skip(registry, output), fields(entries = registry.len()))]
pub fn write_local_cache<W: Write>(registry: &FileRegistry, output: W, compression: Compression) -> Result<()> {
    let mut writer = Writer::new_with_indent(compression.encoder(output), b' ', 2);
    render(&mut writer, registry)?;
    let mut output = writer.into_inner().finish().or_raise(|| ErrorKind::Compression)?;
    output.flush().or_raise(|| ErrorKind::Io)?;
    Ok(())
}

fn render<W: Write>(writer: &mut Writer<W>, registry: &FileRegistry) -> Result<()> {
    emit(writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    emit(writer, Event::Start(BytesStart::new(ROOT)))?;
    for source in registry.sources().iter() {
        write_source(writer, source)?;
    }
    for entry in registry.entries() {
        write_entry(writer, entry)?;
    }
    emit(writer, Event::End(BytesEnd::new(ROOT)))
}

fn emit<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<()> {
    writer.write_event(event).or_raise(|| ErrorKind::Io)
}

fn write_source<W: Write>(writer: &mut Writer<W>, source: &Source) -> Result<()> {
    let last_synced = source.last_synced().to_string();
    let mut element = BytesStart::new(Element::SourceDescriptor.as_str());
    element.push_attribute(("name", source.name()));
    element.push_attribute(("url", source.url.as_str()));
    if let Some(ssh_host) = &source.ssh_host {
        element.push_attribute(("ssh-host", ssh_host.as_str()));
    }
    if let Some(upload_target) = &source.upload_target {
        element.push_attribute(("upload-directory", upload_target.as_str()));
    }
    element.push_attribute(("timestamp", last_synced.as_str()));
    emit(writer, Event::Empty(element))
}

fn write_entry<W: Write>(writer: &mut Writer<W>, entry: &FileEntry) -> Result<()> {
    let name = Element::File.as_str();
    let mut element = BytesStart::new(name);
    element.push_attribute(("filename", entry.filename()));
    element.push_attribute(("update-site", entry.source.as_str()));
    if entry.executable {
        element.push_attribute(("executable", "true"));
    }
    emit(writer, Event::Start(element))?;

    if let Some(current) = entry.current() {
        let timestamp = current.timestamp.to_string();
        let file_size = entry.file_size.to_string();
        let mut version = BytesStart::new(Element::Version.as_str());
        version.push_attribute(("checksum", current.checksum.as_str()));
        version.push_attribute(("timestamp", timestamp.as_str()));
        version.push_attribute(("filesize", file_size.as_str()));
        emit(writer, Event::Empty(version))?;
    }
    for record in entry.previous_versions() {
        let timestamp = record.timestamp.to_string();
        let mut previous = BytesStart::new(Element::PreviousVersion.as_str());
        previous.push_attribute(("checksum", record.checksum.as_str()));
        previous.push_attribute(("timestamp", timestamp.as_str()));
        emit(writer, Event::Empty(previous))?;
    }
    if let Some(description) = &entry.description {
        write_text(writer, Element::Description, description)?;
    }
    for author in entry.authors() {
        write_text(writer, Element::Author, author)?;
    }
    for platform in &entry.platforms {
        write_text(writer, Element::Platform, platform)?;
    }
    for category in &entry.categories {
        write_text(writer, Element::Category, category)?;
    }
    for link in &entry.links {
        write_text(writer, Element::Link, link)?;
    }
    for dependency in entry.dependencies() {
        let timestamp = dependency.timestamp.to_string();
        let mut element = BytesStart::new(Element::Dependency.as_str());
        element.push_attribute(("filename", dependency.filename.as_str()));
        element.push_attribute(("timestamp", timestamp.as_str()));
        if dependency.overrides {
            element.push_attribute(("overrides", "true"));
        }
        emit(writer, Event::Empty(element))?;
    }

    emit(writer, Event::End(BytesEnd::new(name)))
}

fn write_text<W: Write>(writer: &mut Writer<W>, element: Element, text: &str) -> Result<()> {
    let name = element.as_str();
    emit(writer, Event::Start(BytesStart::new(name)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}
