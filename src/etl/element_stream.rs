//! Forward-only stream of top-level elements from an .osm document.
//!
//! Only the element currently being handed out is held in memory. The reader's event
//! buffer is cleared before every event, and element kinds the caller did not ask for
//! are skipped to their end tag without collecting their children.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use xz::bufread::XzDecoder;

use crate::data::osm::{Attributes, Child, Element, ElementKind};
use crate::errors::{Error, ErrorKind, Result};

pub type OsmSource = Box<dyn BufRead + Send>;

/// Opens an .osm file, transparently decompressing `.xz` files.
pub fn open_osm_reader(path: &Path) -> Result<Reader<OsmSource>> {
    let file = fs::File::open(path)
        .map_err(|err| Error::new(ErrorKind::Io, format!("Could not open {}: {}", path.display(), err)))?;
    let file_reader = BufReader::new(file);

    let source: OsmSource = match path.extension().and_then(|ext| ext.to_str()) {
        Some("xz") => Box::new(BufReader::new(XzDecoder::new(file_reader))),
        _ => Box::new(file_reader),
    };

    let mut reader = Reader::from_reader(source);
    reader.trim_text(true);
    Ok(reader)
}

fn read_attributes(el: &BytesStart) -> Result<Attributes> {
    let mut attributes = Attributes::new();
    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        let key = str::from_utf8(attribute.key.as_ref())?.to_string();
        let value = attribute.unescape_value()?.into_owned();
        attributes.push(key, value);
    }
    Ok(attributes)
}

fn wanted_kind(kinds: &[ElementKind], name: &[u8]) -> Option<ElementKind> {
    ElementKind::from_name(name).filter(|kind| kinds.contains(kind))
}

pub struct ElementStream<R: BufRead> {
    reader: Reader<R>,
    kinds: Vec<ElementKind>,
    buf: Vec<u8>,
    skip_buf: Vec<u8>,
    finished: bool,
}

impl ElementStream<OsmSource> {
    pub fn open(path: &Path, kinds: &[ElementKind]) -> Result<Self> {
        Ok(ElementStream::new(open_osm_reader(path)?, kinds))
    }
}

impl<R: BufRead> ElementStream<R> {
    pub fn new(reader: Reader<R>, kinds: &[ElementKind]) -> Self {
        ElementStream {
            reader,
            kinds: kinds.to_vec(),
            buf: Vec::new(),
            skip_buf: Vec::new(),
            finished: false,
        }
    }

    fn next_element(&mut self) -> Result<Option<Element>> {
        loop {
            self.buf.clear();
            let (kind, attributes, has_children) = match self.reader.read_event_into(&mut self.buf)? {
                Event::Eof => return Ok(None),
                Event::Start(e) => match wanted_kind(&self.kinds, e.name().as_ref()) {
                    Some(kind) => (kind, read_attributes(&e)?, true),
                    None => {
                        // Unwanted node/way/relation: drop the whole subtree.
                        if ElementKind::from_name(e.name().as_ref()).is_some() {
                            let end = e.to_end().into_owned();
                            self.skip_buf.clear();
                            self.reader.read_to_end_into(end.name(), &mut self.skip_buf)?;
                        }
                        continue;
                    }
                },
                Event::Empty(e) => match wanted_kind(&self.kinds, e.name().as_ref()) {
                    Some(kind) => (kind, read_attributes(&e)?, false),
                    None => continue,
                },
                _ => continue,
            };

            let children = if has_children {
                self.read_children(kind)?
            } else {
                Vec::new()
            };

            return Ok(Some(Element {
                kind,
                attributes,
                children,
            }));
        }
    }

    fn read_children(&mut self, parent: ElementKind) -> Result<Vec<Child>> {
        let mut children = Vec::new();
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Empty(e) => {
                    children.push(Child {
                        name: str::from_utf8(e.name().as_ref())?.to_string(),
                        attributes: read_attributes(&e)?,
                    });
                }
                Event::Start(e) => {
                    // Children are not expected to nest, keep only their attributes.
                    let child = Child {
                        name: str::from_utf8(e.name().as_ref())?.to_string(),
                        attributes: read_attributes(&e)?,
                    };
                    let end = e.to_end().into_owned();
                    self.skip_buf.clear();
                    self.reader.read_to_end_into(end.name(), &mut self.skip_buf)?;
                    children.push(child);
                }
                Event::End(_) => return Ok(children),
                Event::Eof => {
                    return Err(Error::parse(format!(
                        "Document ended inside <{}> at byte {}",
                        parent.as_str(),
                        self.reader.buffer_position(),
                    )))
                }
                _ => (),
            }
        }
    }
}

impl<R: BufRead> Iterator for ElementStream<R> {
    type Item = Result<Element>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_element() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}
