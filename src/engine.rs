//! File and directory processing around the background removal pipeline.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::pipeline::{remove_green_background, DEFAULT_MIN_SIZE};

/// Options controlling how uploads are processed.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Run the green-screen removal and trim pipeline on re-encoded images.
    pub remove_background: bool,
    /// Erosion threshold for particle removal, in pixels.
    pub min_size: u32,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            remove_background: true,
            min_size: DEFAULT_MIN_SIZE,
            verbose: false,
            quiet: false,
        }
    }
}

/// Result of processing a single file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the input file.
    pub path: PathBuf,
    /// Where the file was stored, if it was.
    pub output: Option<PathBuf>,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether the file was stored as-is without re-encoding.
    pub stored_verbatim: bool,
    /// Dimensions of the re-encoded image.
    pub dimensions: Option<(u32, u32)>,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn failed(path: &Path, err: &Error) -> Self {
        Self {
            path: path.to_path_buf(),
            output: None,
            success: false,
            stored_verbatim: false,
            dimensions: None,
            message: err.to_string(),
        }
    }
}

/// Processes uploads with a fixed set of options.
///
/// Holds no mutable state, so one engine can serve many files concurrently.
#[derive(Debug, Clone)]
pub struct Engine {
    opts: ProcessOptions,
}

impl Engine {
    /// Create an engine after validating the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMinSize`] if `opts.min_size` is zero.
    pub fn new(opts: ProcessOptions) -> Result<Self> {
        if opts.min_size == 0 {
            return Err(Error::InvalidMinSize(opts.min_size));
        }
        Ok(Self { opts })
    }

    /// The options this engine was built with.
    #[must_use]
    pub fn options(&self) -> &ProcessOptions {
        &self.opts
    }

    /// Run the pipeline on a decoded image, if background removal is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyForeground`] when nothing opaque is left after
    /// background removal.
    pub fn process_image(&self, image: &RgbaImage) -> Result<RgbaImage> {
        if !self.opts.remove_background {
            return Ok(image.clone());
        }

        let trimmed = remove_green_background(image, self.opts.min_size);
        if trimmed.width() == 0 || trimmed.height() == 0 {
            return Err(Error::EmptyForeground {
                width: image.width(),
                height: image.height(),
            });
        }
        Ok(trimmed)
    }

    /// Process a single file: PNG uploads are decoded, run through the
    /// pipeline and stored as WebP; JPEG and WebP uploads are stored as-is.
    #[must_use]
    pub fn process_file(&self, input: &Path, output: &Path) -> ProcessResult {
        match self.try_process_file(input, output) {
            Ok(result) => {
                info!(input = %input.display(), output = %output.display(), "{}", result.message);
                result
            }
            Err(e) => {
                warn!(input = %input.display(), error = %e, "processing failed");
                ProcessResult::failed(input, &e)
            }
        }
    }

    fn try_process_file(&self, input: &Path, output: &Path) -> Result<ProcessResult> {
        if !is_supported_image(input) {
            let ext = input
                .extension()
                .map_or_else(String::new, |e| e.to_string_lossy().to_string());
            return Err(Error::UnsupportedFormat(ext));
        }

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        if !needs_reencode(input) {
            // copying a file onto itself truncates it
            let message = if is_same_file(input, output) {
                "Already stored".to_string()
            } else {
                std::fs::copy(input, output)?;
                "Stored as-is".to_string()
            };
            return Ok(ProcessResult {
                path: input.to_path_buf(),
                output: Some(output.to_path_buf()),
                success: true,
                stored_verbatim: true,
                dimensions: None,
                message,
            });
        }

        let decoded = image::open(input)?.to_rgba8();
        debug!(
            width = decoded.width(),
            height = decoded.height(),
            "decoded upload"
        );

        let processed = self.process_image(&decoded)?;
        save_webp(&processed, output)?;

        let message = if self.opts.remove_background {
            format!(
                "Background removed ({}x{} -> {}x{})",
                decoded.width(),
                decoded.height(),
                processed.width(),
                processed.height()
            )
        } else {
            "Converted to WebP".to_string()
        };

        Ok(ProcessResult {
            path: input.to_path_buf(),
            output: Some(output.to_path_buf()),
            success: true,
            stored_verbatim: false,
            dimensions: Some(processed.dimensions()),
            message,
        })
    }

    /// Process all supported images in a directory.
    ///
    /// Uses parallel iteration when the `cli` feature is enabled (via rayon).
    /// Returns a [`ProcessResult`] for each image found.
    #[must_use]
    pub fn process_directory(&self, input_dir: &Path, output_dir: &Path) -> Vec<ProcessResult> {
        let mut entries: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p))
                .collect(),
            Err(e) => return vec![ProcessResult::failed(input_dir, &Error::Io(e))],
        };
        entries.sort();

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                return vec![ProcessResult::failed(output_dir, &Error::Io(e))];
            }
        }

        info!(count = entries.len(), dir = %input_dir.display(), "processing directory");

        // Output names are claimed in path order so the first upload wins.
        // An output may not land on another upload of the same batch.
        let sources: HashSet<PathBuf> = entries
            .iter()
            .filter_map(|p| std::fs::canonicalize(p).ok())
            .collect();
        let mut claimed = HashSet::new();
        let jobs: Vec<(PathBuf, Result<PathBuf>)> = entries
            .into_iter()
            .map(|input| {
                let target = match stored_file_name(&input) {
                    Some(name) => {
                        let out = output_dir.join(name);
                        let overwrites_source = std::fs::canonicalize(&out)
                            .is_ok_and(|c| sources.contains(&c) && !is_same_file(&input, &out));
                        if !overwrites_source && claimed.insert(out.clone()) {
                            Ok(out)
                        } else {
                            Err(Error::DuplicateOutput(out))
                        }
                    }
                    None => Err(Error::UnsupportedFormat(input.display().to_string())),
                };
                (input, target)
            })
            .collect();

        let process = |(input, target): &(PathBuf, Result<PathBuf>)| match target {
            Ok(out) => self.process_file(input, out),
            Err(e) => {
                warn!(input = %input.display(), error = %e, "skipping upload");
                ProcessResult::failed(input, e)
            }
        };

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            jobs.par_iter().map(process).collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            jobs.iter().map(process).collect()
        }
    }
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}

/// Returns `true` if both paths resolve to the same existing file.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Check if a file has a supported upload extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    matches!(
        lowercase_extension(path).as_deref(),
        Some("png" | "jpg" | "jpeg" | "webp")
    )
}

/// Returns `true` for uploads that are decoded and re-encoded as WebP.
///
/// Only PNG uploads go through the pipeline; other formats are stored as-is.
#[must_use]
pub fn needs_reencode(path: &Path) -> bool {
    lowercase_extension(path).as_deref() == Some("png")
}

/// Name under which an upload is stored: `{stem}.webp` for PNG, the original
/// file name otherwise.
#[must_use]
pub fn stored_file_name(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?;
    if needs_reencode(path) {
        let stem = path.file_stem()?.to_string_lossy();
        Some(PathBuf::from(format!("{stem}.webp")))
    } else {
        Some(PathBuf::from(name))
    }
}

/// Encode an RGBA image as lossless WebP.
///
/// # Errors
///
/// Returns [`Error::EmptyForeground`] for a zero-sized image, or an error if
/// encoding or writing fails.
pub fn save_webp(img: &RgbaImage, path: &Path) -> Result<()> {
    if img.width() == 0 || img.height() == 0 {
        return Err(Error::EmptyForeground {
            width: img.width(),
            height: img.height(),
        });
    }

    img.save_with_format(path, ImageFormat::WebP)?;
    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"shirt.png"` becomes `"shirt_trimmed.webp"`, while `"hat.jpg"`
/// becomes `"hat_trimmed.jpg"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    if needs_reencode(input) {
        parent.join(format!("{stem}_trimmed.webp"))
    } else {
        let ext = input.extension().unwrap_or_default().to_string_lossy();
        parent.join(format!("{stem}_trimmed.{ext}"))
    }
}
