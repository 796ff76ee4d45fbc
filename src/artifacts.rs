//! Output artifacts for a program binary and where they are written
//!
//! Everything is computed in memory first, so a failing stage never leaves a partially written
//! artifact on disk.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, info};
use thiserror::Error;

use crate::image::{self, ImageSizeLimit, PackedImage};
use crate::Error;

/// Suffix of the flash image written next to `<base>`
pub const FLASH_IMAGE_SUFFIX: &str = ".krz.bin";
/// Suffix of a memory image emitted from the raw program
pub const MEM_IMAGE_SUFFIX: &str = ".mem";
/// Suffix of a memory image emitted from the flash image
pub const PACKED_MEM_IMAGE_SUFFIX: &str = ".krz.mem";

/// Which bytes the memory image is emitted from
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MemSource {
    /// The raw program, as loaded into RAM by the bootloader
    Raw,
    /// The flash image, length header included
    Packed,
}

impl Default for MemSource {
    fn default() -> MemSource {
        MemSource::Raw
    }
}

#[derive(Error, Debug)]
#[error("Unknown memory image source {:?}, expected \"raw\" or \"packed\"", _0)]
pub struct ParseMemSourceError(String);

impl FromStr for MemSource {
    type Err = ParseMemSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(MemSource::Raw),
            "packed" => Ok(MemSource::Packed),
            _ => Err(ParseMemSourceError(s.to_string())),
        }
    }
}

impl fmt::Display for MemSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemSource::Raw => f.write_str("raw"),
            MemSource::Packed => f.write_str("packed"),
        }
    }
}

/// The artifacts produced from a single program
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Artifacts {
    /// The flash-ready image
    pub flash: PackedImage,
    /// The memory image text and the bytes it was emitted from, if requested
    pub mem: Option<(MemSource, String)>,
}

/// Runs the validate, pack and emit stages for `raw`
///
/// Validation failure stops the pipeline with `Error::PreconditionViolated`.
pub fn build(raw: &[u8], limit: ImageSizeLimit, mem: Option<MemSource>) -> Result<Artifacts, Error> {
    let flash = image::pack_raw(raw, limit)?;

    let mem = match mem {
        Some(MemSource::Raw) => Some((MemSource::Raw, image::emit(raw)?)),
        Some(MemSource::Packed) => Some((MemSource::Packed, image::emit(flash.as_bytes())?)),
        None => None,
    };

    Ok(Artifacts { flash, mem })
}

/// Returns the output base name for `input`: its file name without a trailing `.bin`
fn base_name(input: &Path) -> OsString {
    let name = input
        .file_name()
        .map(OsStr::to_os_string)
        .unwrap_or_default();

    match name.to_str().and_then(|name| name.strip_suffix(".bin")) {
        Some(stem) if !stem.is_empty() => OsString::from(stem),
        _ => name,
    }
}

fn derive_path(input: &Path, out_dir: Option<&Path>, suffix: &str) -> PathBuf {
    let mut name = base_name(input);
    name.push(suffix);

    let dir = match out_dir {
        Some(dir) => dir,
        None => input.parent().unwrap_or_else(|| Path::new("")),
    };

    dir.join(name)
}

/// Returns the path of the flash image for `input`
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use krz::artifacts::flash_image_path;
///
/// assert_eq!(flash_image_path(Path::new("build/blinky.bin"), None), Path::new("build/blinky.krz.bin"));
/// ```
pub fn flash_image_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    derive_path(input, out_dir, FLASH_IMAGE_SUFFIX)
}

/// Returns the path of the memory image for `input` emitted from `source`
pub fn mem_image_path(input: &Path, source: MemSource, out_dir: Option<&Path>) -> PathBuf {
    match source {
        MemSource::Raw => derive_path(input, out_dir, MEM_IMAGE_SUFFIX),
        MemSource::Packed => derive_path(input, out_dir, PACKED_MEM_IMAGE_SUFFIX),
    }
}

/// The files written by `write_artifacts`
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ArtifactPaths {
    pub flash: PathBuf,
    pub mem: Option<PathBuf>,
}

/// Reads a program binary from `path`
pub fn read_image<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, Error> {
    let bytes = fs::read(path.as_ref())?;

    info!("Processing {}", path.as_ref().display());
    info!("Program size: {} bytes", bytes.len());

    Ok(bytes)
}

/// Writes `artifacts` for the program at `input` and returns the written paths
pub fn write_artifacts(
    input: &Path,
    artifacts: &Artifacts,
    out_dir: Option<&Path>,
) -> Result<ArtifactPaths, Error> {
    let flash = flash_image_path(input, out_dir);

    debug!("Writing flash image to {}", flash.display());
    fs::write(&flash, artifacts.flash.as_bytes())?;

    let mem = match &artifacts.mem {
        Some((source, text)) => {
            let path = mem_image_path(input, *source, out_dir);

            debug!("Writing {} memory image to {}", source, path.display());
            fs::write(&path, text)?;

            Some(path)
        }
        None => None,
    };

    Ok(ArtifactPaths { flash, mem })
}

/// Writes the memory image of the raw program at `input`, returning the written path
pub fn write_mem_image(input: &Path, raw: &[u8], out_dir: Option<&Path>) -> Result<PathBuf, Error> {
    let text = image::emit(raw)?;
    let path = mem_image_path(input, MemSource::Raw, out_dir);

    debug!("Writing memory image to {}", path.display());
    fs::write(&path, text)?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn it_should_replace_a_bin_extension() {
        let input = Path::new("build/krz_blinky.bin");

        assert_eq!(
            flash_image_path(input, None),
            Path::new("build/krz_blinky.krz.bin")
        );
        assert_eq!(
            mem_image_path(input, MemSource::Raw, None),
            Path::new("build/krz_blinky.mem")
        );
        assert_eq!(
            mem_image_path(input, MemSource::Packed, None),
            Path::new("build/krz_blinky.krz.mem")
        );
    }

    #[test]
    fn it_should_keep_other_extensions() {
        assert_eq!(
            flash_image_path(Path::new("app.elf"), None),
            Path::new("app.elf.krz.bin")
        );
        assert_eq!(
            flash_image_path(Path::new("firmware"), None),
            Path::new("firmware.krz.bin")
        );
        assert_eq!(
            flash_image_path(Path::new(".bin"), None),
            Path::new(".bin.krz.bin")
        );
    }

    #[test]
    fn it_should_place_outputs_in_the_output_directory() {
        assert_eq!(
            flash_image_path(Path::new("build/app.bin"), Some(Path::new("out"))),
            Path::new("out/app.krz.bin")
        );
    }

    #[test]
    fn it_should_build_all_artifacts_from_the_raw_image() {
        let raw = hex!("01 02 03 04 05 06 07 08");
        let artifacts = build(&raw, ImageSizeLimit::default(), Some(MemSource::Raw)).unwrap();

        assert_eq!(
            artifacts.flash.as_bytes(),
            &hex!("08 00 00 00 01 02 03 04 05 06 07 08")[..]
        );
        assert_eq!(
            artifacts.mem,
            Some((MemSource::Raw, "04030201\n08070605\n".to_string()))
        );
    }

    #[test]
    fn it_should_build_the_memory_image_from_the_packed_image() {
        let raw = hex!("01 02 03 04");
        let artifacts = build(&raw, ImageSizeLimit::default(), Some(MemSource::Packed)).unwrap();

        assert_eq!(
            artifacts.mem,
            Some((MemSource::Packed, "00000004\n04030201\n".to_string()))
        );
    }

    #[test]
    fn it_should_stop_at_validation() {
        let err = build(&[0u8; 3], ImageSizeLimit::default(), Some(MemSource::Raw)).unwrap_err();

        assert!(matches!(err, Error::PreconditionViolated(_)));
    }

    #[test]
    fn it_should_parse_mem_sources() {
        assert_eq!("raw".parse::<MemSource>().unwrap(), MemSource::Raw);
        assert_eq!("packed".parse::<MemSource>().unwrap(), MemSource::Packed);
        assert!("flash".parse::<MemSource>().is_err());
        assert_eq!(MemSource::default(), MemSource::Raw);
    }
}
