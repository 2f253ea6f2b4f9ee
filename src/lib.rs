//! Strip green-screen backgrounds from uploads, trim them and store them as WebP.
//!
//! The core is a three-stage pipeline over a single RGBA image:
//!
//! 1. **Keying**: pixels where `R + B < G` become transparent.
//! 2. **Denoising**: four directional sweeps erase small opaque particles
//!    left behind by keying.
//! 3. **Cropping**: the image is trimmed to the bounding box of what remains.
//!
//! # Quick Start
//!
//! ```no_run
//! use chroma_trim::{remove_green_background, DEFAULT_MIN_SIZE};
//!
//! let img = image::open("shirt.png").unwrap().to_rgba8();
//! let trimmed = remove_green_background(&img, DEFAULT_MIN_SIZE);
//! if trimmed.width() == 0 {
//!     eprintln!("nothing survived background removal");
//! }
//! ```
//!
//! # Files
//!
//! [`Engine`] wraps the pipeline with upload handling: PNG files are decoded,
//! processed and stored as WebP, JPEG and WebP files are stored unchanged.
//!
//! ```no_run
//! use std::path::Path;
//! use chroma_trim::{Engine, ProcessOptions};
//!
//! let engine = Engine::new(ProcessOptions::default()).expect("valid options");
//! let result = engine.process_file(Path::new("shirt.png"), Path::new("shirt.webp"));
//! println!("{}: {}", result.path.display(), result.message);
//! ```

#![deny(missing_docs)]

pub mod crop;
pub mod denoise;
mod engine;
pub mod error;
pub mod keying;
mod pipeline;

pub use crop::{crop, find_bounding_box, BoundingBox};
pub use denoise::denoise;
pub use engine::{
    default_output_path, is_supported_image, needs_reencode, save_webp, stored_file_name, Engine,
    ProcessOptions, ProcessResult,
};
pub use error::{Error, Result};
pub use keying::key_out;
pub use pipeline::{remove_green_background, DEFAULT_MIN_SIZE};
