//! KRZ image formats

pub mod flash;
pub mod mem;
mod validate;

pub use flash::{pack, pack_raw, PackedImage, HEADER_SIZE};
pub use mem::{emit, parse, write_mem, MemoryWord};
pub use validate::{validate, ImageSizeLimit, ParseLimitError, ValidatedImage, ValidationError, Violation};
