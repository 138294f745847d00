use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::UserConfig;
use crate::data::osm::{Element, ElementKind};
use crate::data::records::ShapedElement;
use crate::errors::{ErrorKind, Result};
use crate::etl::element_stream::ElementStream;
use crate::etl::shape::Shaper;
use crate::etl::tables::{OutputTables, Table};
use crate::etl::validate::RecordValidator;
use crate::etl::{outputs_exist, remove_outputs, write_json, Etl};

pub const ETL_NAME: &str = "convert";
pub const SUMMARY_FILE_NAME: &str = "conversion.json";

pub type ElementSource = Box<dyn Iterator<Item = Result<Element>>>;
pub type ShapedStream = Box<dyn Iterator<Item = Result<Option<ShapedElement>>>>;

/// What to do with a node or way that lacks one of its required attributes.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingFieldPolicy {
    #[default]
    Abort,
    Skip,
}

/// Written next to the tables once every element has been converted.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    pub nodes: u64,
    pub node_tags: u64,
    pub ways: u64,
    pub way_nodes: u64,
    pub way_tags: u64,
    pub skipped: u64,
}

pub struct ConvertEtl<'a> {
    config: &'a UserConfig,
    shaper: Shaper,
    validator: Option<RecordValidator>,
}

impl ConvertEtl<'_> {
    fn output_file_names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Table::ALL.iter().map(|table| table.file_name()).collect();
        names.push(SUMMARY_FILE_NAME);
        names
    }

    pub fn new(config: &UserConfig) -> Result<ConvertEtl<'_>> {
        let validator = if config.validate {
            Some(RecordValidator::new()?)
        } else {
            None
        };
        Ok(ConvertEtl {
            config,
            shaper: Shaper::new(&config.default_tag_type)?,
            validator,
        })
    }
}

impl Etl for ConvertEtl<'_> {
    type Input = ElementSource;
    type Output = ShapedStream;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn is_cached(&self, dir: &Path) -> Result<bool> {
        outputs_exist(dir, &Self::output_file_names())
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        remove_outputs(dir, &Self::output_file_names())
    }

    fn extract(&mut self, _dir: &Path) -> Result<Self::Input> {
        let stream = ElementStream::open(
            Path::new(&self.config.data_path),
            &[ElementKind::Node, ElementKind::Way],
        )?;
        if self.config.progress {
            Ok(Box::new(tqdm::tqdm(stream)))
        } else {
            Ok(Box::new(stream))
        }
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let shaper = self.shaper.clone();
        Ok(Box::new(input.map(move |element| shaper.shape(&element?))))
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        let mut tables = OutputTables::create(dir, self.config.encoding)?;
        let mut skipped = 0;

        for shaped in output {
            let shaped = match shaped {
                Ok(Some(shaped)) => shaped,
                Ok(None) => continue,
                Err(err) if err.kind == ErrorKind::MissingField
                    && self.config.on_missing_field == MissingFieldPolicy::Skip => {
                    warn!(etl_name = ETL_NAME, err = err.message.as_str(); "Skipping element");
                    skipped += 1;
                    continue;
                },
                Err(err) => return Err(err),
            };

            if let Some(validator) = &self.validator {
                validator.validate(&shaped)?;
            }
            tables.write(&shaped)?;
        }
        tables.flush()?;

        let summary = ConversionSummary {
            nodes: tables.rows(Table::Nodes),
            node_tags: tables.rows(Table::NodeTags),
            ways: tables.rows(Table::Ways),
            way_nodes: tables.rows(Table::WayNodes),
            way_tags: tables.rows(Table::WayTags),
            skipped,
        };
        info!(
            etl_name = ETL_NAME,
            nodes = summary.nodes,
            ways = summary.ways,
            skipped = summary.skipped;
            "Conversion finished"
        );
        write_json(&dir.join(SUMMARY_FILE_NAME), &summary)
    }
}
