//! Image preparation for the KRZ RISC-V SoC.
//!
//! A raw program binary is validated, packed into a flash image with a little-endian length
//! header and rendered as a word-reversed hex memory file for simulation.
//!
//! ```
//! use krz::image::{self, ImageSizeLimit};
//!
//! let raw = [0x01, 0x02, 0x03, 0x04];
//! let validated = image::validate(&raw, ImageSizeLimit::default())?;
//! let packed = image::pack(validated);
//!
//! assert_eq!(packed.as_bytes(), &[0x04, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04]);
//! assert_eq!(image::emit(&raw)?, "04030201\n");
//!
//! # Ok::<(), krz::Error>(())
//! ```

pub mod artifacts;
mod error;
pub mod image;

pub use error::Error;

pub use image::{ImageSizeLimit, PackedImage, ValidatedImage};

/// The largest program the KRZ bootloader will copy out of flash
pub const MAX_PROG_SIZE: u32 = 128 * 1024;

/// The number of bytes in a memory word on the target
pub const WORD_SIZE: usize = 4;
