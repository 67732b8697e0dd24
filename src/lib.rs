//! # psp-flash
//!
//! Parsing, rebuilding and triaging AMD PSP flash images produced by a
//! fuzzing campaign.
//!
//! A minimized fuzzer solution covers only the mutated memory regions of
//! a flash image. This crate rebuilds complete, checksum-valid images
//! from such solutions, and scans the PSP directory of an image to check
//! its bootloader headers for a known length-field overflow.
//!
//! ## Features
//!
//! - `no_std` compatible core (requires `alloc`)
//! - Bounds-checked parsing of combo/primary PSP flash directories
//! - Deterministic image reconstruction with Fletcher-32 checksum repair
//! - Known-overflow triage with a three-way verdict
//! - `std`: YAML run configuration and per-run batch drivers
//! - `cli`: the `psp-flash` command-line tool
//!
//! ## Example
//!
//! ```ignore
//! use psp_flash::{classify, Classification, FlashImage, FlashLayout};
//!
//! let image = FlashImage::new(std::fs::read("input07_full.ROM")?);
//! match classify(&image, &FlashLayout::PSP)? {
//!     Classification::Known { kind, len_addr } => {
//!         println!("known overflow at {kind} bootloader: {len_addr:#010x}")
//!     }
//!     Classification::Unknown => println!("unknown solution"),
//! }
//! ```

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "std")]
pub mod batch;
mod checksum;
mod classify;
#[cfg(feature = "std")]
pub mod config;
mod constants;
mod directory;
mod error;
mod image;
mod rebuild;
mod types;

pub use checksum::{Fletcher32, fletcher32};
pub use classify::{Classification, bootloader_length, classify};
pub use constants::*;
pub use directory::{DirEntries, DirEntry, DirectoryHeader, locate};
pub use error::{FlashError, Result};
pub use image::FlashImage;
pub use rebuild::Rebuilder;
pub use types::*;
