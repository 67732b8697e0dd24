//! Batch processing of fuzzer run directories.
//!
//! A run directory holds a `config.yaml` and a `solutions/` directory of
//! minimized fuzzer solutions. The batch drivers share one immutable base
//! template and configuration across all files; each file succeeds or
//! fails on its own, and a failure is logged and counted without stopping
//! the rest of the batch.

use alloc::vec::Vec;
use std::fs;
use std::path::{Path, PathBuf};

use crate::checksum::Fletcher32;
use crate::classify::{Classification, classify};
use crate::config::{RunConfig, SetupError};
use crate::image::FlashImage;
use crate::rebuild::Rebuilder;
use crate::types::FlashLayout;

/// Name of the per-run configuration file.
pub const CONFIG_FILE: &str = "config.yaml";

/// Name of the solutions directory inside a run directory.
pub const SOLUTIONS_DIR: &str = "solutions";

/// Default output directory for rebuilt images, inside the solutions
/// directory.
pub const DEFAULT_IMAGE_DIR: &str = "full_img";

/// Suffix appended to rebuilt image file names.
pub const IMAGE_SUFFIX: &str = "_full.ROM";

/// Outcome counts of a rebuild batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildSummary {
    /// Solution files seen.
    pub files: usize,
    /// Solution files transformed into full images.
    pub transformed: usize,
}

/// Outcome counts of a triage batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriageSummary {
    /// Image files seen.
    pub files: usize,
    /// Images carrying the known overflow signature.
    pub known: usize,
    /// Images with no known signature.
    pub unknown: usize,
    /// Images that could not be classified at all.
    pub failed: usize,
}

/// Rebuild every solution of a run into a full flash image.
///
/// Loads `config.yaml`, reads the base image named by its `flash.base`
/// (resolved against the run directory), and writes one
/// `<name>_full.ROM` per solution file into `solutions/<new_dir>`,
/// creating it as needed. Solution files are processed in name order.
pub fn rebuild_run(
    run_dir: &Path,
    new_dir: &Path,
    layout: &FlashLayout,
) -> Result<RebuildSummary, SetupError> {
    let config = RunConfig::load(&run_dir.join(CONFIG_FILE))?;
    if config.regions_truncated {
        log::warn!("input.mem entry missing addr/size, region list truncated");
    }
    if config.fixed_truncated {
        log::warn!("input.fixed entry missing addr/val, patch list truncated");
    }

    let base_path = run_dir.join(&config.base_image);
    let template = FlashImage::new(
        fs::read(&base_path).map_err(|source| SetupError::io(&base_path, source))?,
    );
    log::debug!(
        "base image {} ({:#x} bytes), {} regions, {} patches",
        base_path.display(),
        template.len(),
        config.regions.len(),
        config.fixed.len()
    );

    let solutions_dir = run_dir.join(SOLUTIONS_DIR);
    let out_dir = solutions_dir.join(new_dir);
    fs::create_dir_all(&out_dir).map_err(|source| SetupError::io(&out_dir, source))?;

    let rebuilder = Rebuilder::new(&template, &config.regions, &config.fixed, layout, Fletcher32);

    let mut summary = RebuildSummary::default();
    for path in files_in(&solutions_dir)? {
        summary.files += 1;
        let solution = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("{}: {e}", path.display());
                continue;
            }
        };
        let image = match rebuilder.rebuild(&solution) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("{}: {e}", path.display());
                continue;
            }
        };

        let out_path = output_path(&out_dir, &path);
        if let Err(e) = fs::write(&out_path, image.as_bytes()) {
            log::warn!("{}: {e}", out_path.display());
            continue;
        }
        log::info!("{} ---> {}", path.display(), out_path.display());
        summary.transformed += 1;
    }
    Ok(summary)
}

/// Triage the rebuilt images of a run for the known buffer overflow.
///
/// Scans `solutions/full_img` under the run directory. A known hit is
/// logged with the bootloader kind and the absolute address of the length
/// field that tripped the predicate.
pub fn triage_run(run_dir: &Path, layout: &FlashLayout) -> Result<TriageSummary, SetupError> {
    let image_dir = run_dir.join(SOLUTIONS_DIR).join(DEFAULT_IMAGE_DIR);

    let mut summary = TriageSummary::default();
    for path in files_in(&image_dir)? {
        summary.files += 1;
        let image = match fs::read(&path) {
            Ok(bytes) => FlashImage::new(bytes),
            Err(e) => {
                log::warn!("{}: {e}", path.display());
                summary.failed += 1;
                continue;
            }
        };
        match classify(&image, layout) {
            Ok(Classification::Known { kind, len_addr }) => {
                log::info!(
                    "{}: known overflow at {kind} bootloader, length field {len_addr:#010x}",
                    path.display()
                );
                summary.known += 1;
            }
            Ok(Classification::Unknown) => {
                log::info!("{}: unknown solution", path.display());
                summary.unknown += 1;
            }
            Err(e) => {
                log::warn!("{}: {e}", path.display());
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}

/// Regular files of a directory in name order.
fn files_in(dir: &Path) -> Result<Vec<PathBuf>, SetupError> {
    let entries = fs::read_dir(dir).map_err(|source| SetupError::io(dir, source))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| SetupError::io(dir, source))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Output path for a rebuilt image: the solution's file name plus
/// [`IMAGE_SUFFIX`], under `out_dir`.
fn output_path(out_dir: &Path, solution: &Path) -> PathBuf {
    let mut name = solution
        .file_name()
        .unwrap_or_default()
        .to_os_string();
    name.push(IMAGE_SUFFIX);
    out_dir.join(name)
}
