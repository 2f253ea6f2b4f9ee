//! Error types for the chroma-trim crate.

/// Errors that can occur while processing uploads.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Nothing opaque survived background removal.
    #[error("nothing survived background removal ({width}x{height} input)")]
    EmptyForeground {
        /// Width of the image before processing.
        width: u32,
        /// Height of the image before processing.
        height: u32,
    },

    /// The particle erosion threshold must be at least one pixel.
    #[error("invalid minimum particle size: {0} (must be >= 1)")]
    InvalidMinSize(u32),

    /// Another upload in the same batch is already stored under this path.
    #[error("output {} is already claimed by another upload", .0.display())]
    DuplicateOutput(std::path::PathBuf),

    /// An I/O error occurred while reading, writing or copying files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred while decoding or encoding an image.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let io_err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("gone"));

        let unsupported = Error::UnsupportedFormat("gif".to_string());
        assert!(unsupported.to_string().contains("gif"));

        let empty = Error::EmptyForeground {
            width: 10,
            height: 20,
        };
        let msg = empty.to_string();
        assert!(msg.contains("nothing survived"));
        assert!(msg.contains("10x20"));

        assert!(Error::InvalidMinSize(0).to_string().contains(">= 1"));

        let dup = Error::DuplicateOutput(std::path::PathBuf::from("out/a.webp"));
        assert!(dup.to_string().contains("a.webp"));
    }
}
