use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str;

use log::info;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::UserConfig;
use crate::errors::Result;
use crate::etl::element_stream::{open_osm_reader, OsmSource};
use crate::etl::{write_json, Etl};

pub const ETL_NAME: &str = "count_tags";
pub const OUTPUT_FILE_NAME: &str = "tag_counts.json";

/// Number of occurrences of every element name in the document.
pub type TagCounts = BTreeMap<String, u64>;

pub fn count_tags<R: std::io::BufRead>(reader: &mut Reader<R>) -> Result<TagCounts> {
    let mut counts = TagCounts::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) => {
                let qname = e.name();
                let name = str::from_utf8(qname.as_ref())?;
                match counts.get_mut(name) {
                    Some(count) => *count += 1,
                    None => {
                        counts.insert(name.to_string(), 1);
                    }
                }
            }
            _ => (),
        }
        buf.clear();
    }
    Ok(counts)
}

pub struct CountTagsEtl<'a> {
    config: &'a UserConfig,
}

impl CountTagsEtl<'_> {
    fn output_path(dir: &Path) -> PathBuf {
        dir.join(OUTPUT_FILE_NAME)
    }

    pub fn new(config: &UserConfig) -> CountTagsEtl<'_> {
        CountTagsEtl { config }
    }
}

impl Etl for CountTagsEtl<'_> {
    type Input = Reader<OsmSource>;
    type Output = TagCounts;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn is_cached(&self, dir: &Path) -> Result<bool> {
        Ok(Self::output_path(dir).try_exists()?)
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        crate::etl::remove_outputs(dir, &[OUTPUT_FILE_NAME])
    }

    fn extract(&mut self, _dir: &Path) -> Result<Self::Input> {
        open_osm_reader(Path::new(&self.config.data_path))
    }

    fn transform(&mut self, mut input: Self::Input) -> Result<Self::Output> {
        count_tags(&mut input)
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        for (name, count) in &output {
            info!(etl_name = ETL_NAME, tag = name.as_str(), count = *count; "Tag count");
        }
        write_json(&Self::output_path(dir), &output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use crate::errors::ErrorKind;
    use tempfile::tempdir;

    const OSM_SAMPLE: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<osm version="0.6">
  <bounds minlat="0" minlon="0" maxlat="1" maxlon="1"/>
  <node id="1" lat="0" lon="0"><tag k="a" v="b"/><tag k="c" v="d"/></node>
  <node id="2" lat="0" lon="0"/>
  <way id="3"><nd ref="1"/><nd ref="2"/><tag k="highway" v="path"/></way>
  <relation id="4"><member type="way" ref="3" role=""/><tag k="type" v="route"/></relation>
</osm>"#;

    #[test]
    fn counts_every_element_name() {
        let mut reader = Reader::from_str(OSM_SAMPLE);
        let counts = count_tags(&mut reader).unwrap();

        let expected: TagCounts = [
            ("bounds", 1),
            ("member", 1),
            ("nd", 2),
            ("node", 2),
            ("osm", 1),
            ("relation", 1),
            ("tag", 4),
            ("way", 1),
        ]
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
        assert_eq!(counts, expected);
    }

    #[test]
    fn counts_start_and_empty_forms_under_one_name() {
        let mut reader = Reader::from_str(r#"<osm><tag k="a" v="b"/><tag k="c" v="d"></tag><nd ref="1"/></osm>"#);
        let counts = count_tags(&mut reader).unwrap();
        assert_eq!(counts["tag"], 2);
        assert_eq!(counts["nd"], 1);
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn malformed_document_fails() {
        let mut reader = Reader::from_str("<osm><node></way></osm>");
        let err = count_tags(&mut reader).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
    }

    #[test]
    fn writes_counts_as_json() {
        let dir = tempdir().unwrap();
        let osm_path = dir.path().join("map.osm");
        std::fs::write(&osm_path, OSM_SAMPLE).unwrap();
        let config = UserConfig::for_input(
            osm_path.to_string_lossy().to_string(),
            dir.path().to_string_lossy().to_string(),
        );

        CountTagsEtl::new(&config).process(dir.path()).unwrap();

        let file = File::open(dir.path().join(OUTPUT_FILE_NAME)).unwrap();
        let counts: TagCounts = serde_json::from_reader(file).unwrap();
        assert_eq!(counts["tag"], 4);
        assert_eq!(counts["node"], 2);
    }
}
