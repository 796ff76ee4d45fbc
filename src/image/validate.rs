use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use thiserror::Error;

use crate::{MAX_PROG_SIZE, WORD_SIZE};

/// The maximum number of bytes a raw program image may occupy
///
/// The limit is a `u32` so that any image that passes validation can be described by the 4-byte
/// length header of a flash image.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ImageSizeLimit(u32);

impl ImageSizeLimit {
    /// Creates a new limit of `bytes` bytes
    pub const fn new(bytes: u32) -> ImageSizeLimit {
        ImageSizeLimit(bytes)
    }

    /// Returns the limit in bytes
    pub const fn bytes(self) -> u32 {
        self.0
    }
}

impl Default for ImageSizeLimit {
    fn default() -> ImageSizeLimit {
        ImageSizeLimit(MAX_PROG_SIZE)
    }
}

impl fmt::Display for ImageSizeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.0)
    }
}

/// Errors when parsing an `ImageSizeLimit` from a string
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ParseLimitError {
    #[error("Invalid image size limit {:?}, expected a byte count such as 131072 or 128K", _0)]
    Invalid(String),
    #[error("Image size limit {:?} does not fit in the 4-byte length header", _0)]
    Overflow(String),
}

impl FromStr for ImageSizeLimit {
    type Err = ParseLimitError;

    /// Parses a plain byte count, or a count of KiB when suffixed with `K`, `k` or `KiB`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        let (digits, multiplier) = match trimmed
            .strip_suffix("KiB")
            .or_else(|| trimmed.strip_suffix('K'))
            .or_else(|| trimmed.strip_suffix('k'))
        {
            Some(digits) => (digits.trim_end(), 1024u32),
            None => (trimmed, 1),
        };

        let count: u32 = digits
            .parse()
            .map_err(|_| ParseLimitError::Invalid(s.to_string()))?;

        count
            .checked_mul(multiplier)
            .map(ImageSizeLimit)
            .ok_or_else(|| ParseLimitError::Overflow(s.to_string()))
    }
}

/// A single rule that a raw image broke
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum Violation {
    #[error("program is {size} bytes, which exceeds the limit of {limit} bytes")]
    SizeExceeded { size: usize, limit: u32 },
    #[error("program size of {size} bytes is not word-aligned")]
    MisalignedSize { size: usize },
}

/// Every rule a raw image broke during validation, in the order they were checked
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    /// Returns the violated rules
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Returns true if the image was larger than the limit
    pub fn is_size_exceeded(&self) -> bool {
        self.violations
            .iter()
            .any(|v| matches!(v, Violation::SizeExceeded { .. }))
    }

    /// Returns true if the image size was not a multiple of the word size
    pub fn is_misaligned(&self) -> bool {
        self.violations
            .iter()
            .any(|v| matches!(v, Violation::MisalignedSize { .. }))
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }

            write!(f, "{}", violation)?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// A raw program image that is known to satisfy the size and alignment rules
///
/// This can only be obtained through [`validate`], which makes it the proof required by
/// [`pack`](super::pack).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ValidatedImage<'a> {
    bytes: &'a [u8],
}

impl<'a> ValidatedImage<'a> {
    /// Returns the raw image bytes
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Checks a raw image size against `limit` and the word alignment
pub(crate) fn check_size(size: usize, limit: ImageSizeLimit) -> Result<(), ValidationError> {
    let mut violations = Vec::new();

    if size > limit.bytes() as usize {
        violations.push(Violation::SizeExceeded {
            size,
            limit: limit.bytes(),
        });
    }

    if size % WORD_SIZE != 0 {
        violations.push(Violation::MisalignedSize { size });
    }

    if violations.is_empty() {
        Ok(())
    } else {
        for violation in &violations {
            warn!("{}", violation);
        }

        Err(ValidationError { violations })
    }
}

/// Validates that `image` is no larger than `limit` and that its size is word-aligned
///
/// All violated rules are reported, not only the first one. An empty image is valid.
pub fn validate(image: &[u8], limit: ImageSizeLimit) -> Result<ValidatedImage<'_>, ValidationError> {
    check_size(image.len(), limit)?;

    debug!("Validated {} byte image against a limit of {}", image.len(), limit);

    Ok(ValidatedImage { bytes: image })
}
