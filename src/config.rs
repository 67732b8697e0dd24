//! Run configuration loaded from the campaign's YAML file.
//!
//! A run directory carries a `config.yaml` whose `flash.base` names the
//! base image and whose `input.mem` / `input.fixed` lists drive the
//! overlay. List entries are consumed in order until one lacks a required
//! field; the rest of that list is then dropped and the cut is reported as
//! a soft diagnostic on the parsed config, not as an error.

use alloc::vec::Vec;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use yaml_rust::{ScanError, YamlLoader};

use crate::types::{FixedValue, MemoryRegion};

/// Fatal setup problems that stop a batch before it starts.
#[derive(Debug, Error)]
pub enum SetupError {
    /// A file or directory could not be read or written.
    #[error("{}: {source}", path.display())]
    Io {
        /// The path that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The configuration is not valid YAML.
    #[error("invalid config: {0}")]
    Yaml(#[from] ScanError),
    /// The configuration document is empty.
    #[error("config holds no document")]
    EmptyConfig,
    /// The configuration is missing a required key.
    #[error("config missing `{0}`")]
    MissingKey(&'static str),
}

impl SetupError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Input specification for one fuzzing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Base flash image path from `flash.base`, as written in the config.
    pub base_image: PathBuf,
    /// Ordered overlay regions from `input.mem`.
    pub regions: Vec<MemoryRegion>,
    /// Fixed patches from `input.fixed`.
    pub fixed: Vec<FixedValue>,
    /// Whether the region list was cut short by a missing field.
    pub regions_truncated: bool,
    /// Whether the patch list was cut short by a missing field.
    pub fixed_truncated: bool,
}

impl RunConfig {
    /// Load and parse a run's `config.yaml`.
    pub fn load(path: &Path) -> Result<Self, SetupError> {
        let contents = fs::read_to_string(path).map_err(|source| SetupError::io(path, source))?;
        Self::parse(&contents)
    }

    /// Parse the YAML document text.
    pub fn parse(contents: &str) -> Result<Self, SetupError> {
        let docs = YamlLoader::load_from_str(contents)?;
        let doc = docs.first().ok_or(SetupError::EmptyConfig)?;

        let base_image = doc["flash"]["base"]
            .as_str()
            .ok_or(SetupError::MissingKey("flash.base"))?;
        let mem = doc["input"]["mem"]
            .as_vec()
            .ok_or(SetupError::MissingKey("input.mem"))?;
        let fixed = doc["input"]["fixed"]
            .as_vec()
            .ok_or(SetupError::MissingKey("input.fixed"))?;

        let mut regions = Vec::new();
        let mut regions_truncated = false;
        for area in mem {
            let (Some(addr), Some(size)) = (area["addr"].as_i64(), area["size"].as_i64()) else {
                regions_truncated = true;
                break;
            };
            regions.push(MemoryRegion {
                addr: addr as u32,
                size: size as usize,
            });
        }

        let mut patches = Vec::new();
        let mut fixed_truncated = false;
        for patch in fixed {
            let (Some(addr), Some(val)) = (patch["addr"].as_i64(), patch["val"].as_i64()) else {
                fixed_truncated = true;
                break;
            };
            patches.push(FixedValue {
                addr: addr as u32,
                val: val as u32,
            });
        }

        Ok(Self {
            base_image: PathBuf::from(base_image),
            regions,
            fixed: patches,
            regions_truncated,
            fixed_truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    const GOOD: &str = "
flash:
  base: amd/bios.ROM
input:
  mem:
    - addr: 0x1000
      size: 0x100
    - addr: 0x77000
      size: 64
  fixed:
    - addr: 0xc0000
      val: 0x50535032
";

    #[test]
    fn test_parse_full_config() {
        let config = RunConfig::parse(GOOD).unwrap();
        assert_eq!(config.base_image, PathBuf::from("amd/bios.ROM"));
        assert_eq!(
            config.regions,
            vec![
                MemoryRegion { addr: 0x1000, size: 0x100 },
                MemoryRegion { addr: 0x77000, size: 64 },
            ]
        );
        assert_eq!(
            config.fixed,
            vec![FixedValue { addr: 0xc0000, val: 0x5053_5032 }]
        );
        assert!(!config.regions_truncated);
        assert!(!config.fixed_truncated);
    }

    #[test]
    fn test_null_field_truncates_region_list() {
        let config = RunConfig::parse(
            "
flash:
  base: base.ROM
input:
  mem:
    - addr: 0x1000
      size: 0x100
    - addr: ~
      size: 0x100
    - addr: 0x3000
      size: 0x100
  fixed: []
",
        )
        .unwrap();
        // The null entry cuts the list; the entry after it is dropped too.
        assert_eq!(config.regions, vec![MemoryRegion { addr: 0x1000, size: 0x100 }]);
        assert!(config.regions_truncated);
    }

    #[test]
    fn test_missing_field_truncates_fixed_list() {
        let config = RunConfig::parse(
            "
flash:
  base: base.ROM
input:
  mem: []
  fixed:
    - addr: 0x10
",
        )
        .unwrap();
        assert!(config.fixed.is_empty());
        assert!(config.fixed_truncated);
    }

    #[test]
    fn test_missing_base_is_fatal() {
        let err = RunConfig::parse("input:\n  mem: []\n  fixed: []\n").unwrap_err();
        assert!(matches!(err, SetupError::MissingKey("flash.base")));
    }

    #[test]
    fn test_missing_input_lists_are_fatal() {
        let err = RunConfig::parse("flash:\n  base: base.ROM\n").unwrap_err();
        assert!(matches!(err, SetupError::MissingKey("input.mem")));
    }

    #[test]
    fn test_empty_document_is_fatal() {
        assert!(matches!(RunConfig::parse(""), Err(SetupError::EmptyConfig)));
    }
}
