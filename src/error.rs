//! Error types for the cropping session.
//!
//! Every variant is recoverable: the UI reports it as a warning and the
//! session carries on in its previous state.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by [`crate::CropSession`] operations.
#[derive(Error, Debug)]
pub enum CropError {
    /// The file could not be opened or decoded as an image.
    #[error("Failed to load image {}: {source}", .path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The save destination is missing, not a directory, or read-only.
    #[error("Not a writable directory: {}", .path.display())]
    InvalidDestination { path: PathBuf },

    /// A save destination has to be chosen first.
    #[error("Choose the save path first!")]
    DestinationRequired,

    /// Crop size input was not a positive integer.
    #[error("Crop size must be a positive number, got {input:?}")]
    InvalidSize { input: String },

    /// A click-crop was attempted before any crop size was set.
    #[error("Please set a numeric crop size before cropping.")]
    CropSizeUnset,

    /// Commit was requested without a pending rectangle.
    #[error("Nothing to crop: select a region first")]
    NothingToCrop,

    /// Writing the cropped image failed.
    #[error("Failed to save image {}: {source}", .path.display())]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CropError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_size_message_quotes_input() {
        let err = CropError::InvalidSize {
            input: "abc".into(),
        };
        assert_eq!(
            err.to_string(),
            "Crop size must be a positive number, got \"abc\""
        );
    }

    #[test]
    fn test_destination_message() {
        let err = CropError::InvalidDestination {
            path: PathBuf::from("/nope"),
        };
        assert_eq!(err.to_string(), "Not a writable directory: /nope");
    }
}
