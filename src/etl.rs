pub mod audit_streets;
pub mod convert;
pub mod count_tags;
pub mod element_stream;
pub mod shape;
pub mod tables;
pub mod validate;

use std::fs::File;
use std::path::Path;
use log::{info, error};
use serde::Serialize;

use crate::errors::{Error, Result};


/// A single pass over the source document. `Input` and `Output` are expected to be
/// lazy where the data is large, so that nothing is materialized between the phases.
pub trait Etl {
    type Input;
    type Output;

    fn etl_name(&self) -> &str;

    fn is_cached(&self, dir: &Path) -> Result<bool>;
    fn clean(&self, dir: &Path) -> Result<()>;

    fn extract(&mut self, dir: &Path) -> Result<Self::Input>;
    fn transform(&mut self, input: Self::Input) -> Result<Self::Output>;
    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()>;

    fn process(&mut self, dir: &Path) -> Result<()> {
        info!(etl_name = self.etl_name(); "Starting ETL process");
        if self.is_cached(dir)? {
            info!(etl_name = self.etl_name(); "Using cached value");
        } else {
            info!(etl_name = self.etl_name(); "Extracting");
            let input = match self.extract(dir) {
                Ok(input) => Ok(input),
                Err(err) => {
                    error!(etl_name = self.etl_name(), err = err.message.as_str(); "Extraction failed with error");
                    Err(err)
                },
            }?;

            info!(etl_name = self.etl_name(); "Transforming");
            let output = match self.transform(input) {
                Ok(output) => Ok(output),
                Err(err) => {
                    error!(etl_name = self.etl_name(), err = err.message.as_str(); "Transformation failed with error");
                    Err(err)
                },
            }?;

            info!(etl_name = self.etl_name(); "Loading");
            match self.load(dir, output) {
                Ok(_) => Ok(()),
                Err(err) => {
                    error!(etl_name = self.etl_name(), err = err.message.as_str(); "Loading failed with error");
                    Err(err)
                },
            }?;
        }
        info!(etl_name = self.etl_name(); "Process finished");
        Ok(())
    }
}

/// Removes the given output files from `dir`, ignoring the ones that don't exist.
pub fn remove_outputs(dir: &Path, file_names: &[&str]) -> Result<()> {
    for file_name in file_names {
        let path = dir.join(file_name);
        if path.try_exists()? {
            std::fs::remove_file(path)?;
        }
    }
    Ok(())
}

/// True if every one of the given output files exists in `dir`.
pub fn outputs_exist(dir: &Path, file_names: &[&str]) -> Result<bool> {
    for file_name in file_names {
        if !dir.join(file_name).try_exists()? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Writes `value` as pretty-printed JSON to `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|err| Error::sink(format!("Could not write {}: {}", path.display(), err)))
}
