use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::UserConfig;
use crate::data::osm::ElementKind;
use crate::errors::Result;
use crate::etl::convert::ElementSource;
use crate::etl::element_stream::ElementStream;
use crate::etl::{write_json, Etl};
use crate::streets::{is_street_name, StreetNameAuditor, StreetTypes};

pub const ETL_NAME: &str = "audit_streets";
pub const OUTPUT_FILE_NAME: &str = "street_audit.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StreetFix {
    pub original: String,
    pub proposed: String,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct StreetAudit {
    pub street_types: StreetTypes,
    pub fixes: Vec<StreetFix>,
}

pub struct AuditStreetsEtl<'a> {
    config: &'a UserConfig,
    auditor: StreetNameAuditor,
}

impl AuditStreetsEtl<'_> {
    fn output_path(dir: &Path) -> PathBuf {
        dir.join(OUTPUT_FILE_NAME)
    }

    pub fn new(config: &UserConfig) -> Result<AuditStreetsEtl<'_>> {
        Ok(AuditStreetsEtl {
            config,
            auditor: StreetNameAuditor::new(&config.street_audit)?,
        })
    }
}

impl Etl for AuditStreetsEtl<'_> {
    type Input = ElementSource;
    type Output = StreetAudit;

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
        let stream = ElementStream::open(
            Path::new(&self.config.data_path),
            &[ElementKind::Node, ElementKind::Way],
        )?;
        Ok(Box::new(stream))
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let mut street_types = StreetTypes::new();
        for element in input {
            let element = element?;
            for tag in element.tags() {
                if let (Some(key), Some(value)) = (tag.attributes.get("k"), tag.attributes.get("v")) {
                    if is_street_name(key) {
                        self.auditor.audit(&mut street_types, value);
                    }
                }
            }
        }

        let mut fixes = Vec::new();
        for names in street_types.values() {
            for name in names {
                let proposed = self.auditor.update_name(name);
                if proposed == *name {
                    continue;
                }
                info!(etl_name = ETL_NAME, original = name.as_str(), proposed = proposed.as_str(); "Proposed street name");
                fixes.push(StreetFix {
                    original: name.clone(),
                    proposed,
                });
            }
        }

        Ok(StreetAudit { street_types, fixes })
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        write_json(&Self::output_path(dir), &output)
    }
}
