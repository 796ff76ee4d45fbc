use std::io::{self, Read, Write};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use log::{debug, trace};
use sha2::{Digest, Sha256};

use super::validate::{check_size, validate, ImageSizeLimit, ValidatedImage};
use crate::{Error, WORD_SIZE};

/// The size of the little-endian length header that precedes the payload
pub const HEADER_SIZE: usize = 4;

/// A flash-ready image: a little-endian `u32` payload length followed by the payload itself
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PackedImage {
    bytes: Vec<u8>,
}

/// Packs a validated raw image into a flash image
///
/// The output is always exactly `HEADER_SIZE` bytes longer than the input and carries the payload
/// unmodified. There is no padding or checksum.
pub fn pack(image: ValidatedImage<'_>) -> PackedImage {
    let payload = image.as_bytes();
    let mut bytes = vec![0u8; HEADER_SIZE + payload.len()];

    // `ImageSizeLimit` is a u32, so a validated length always fits in the header
    LittleEndian::write_u32(&mut bytes[..HEADER_SIZE], payload.len() as u32);
    bytes[HEADER_SIZE..].copy_from_slice(payload);

    debug!("Packed {} byte payload into a {} byte flash image", payload.len(), bytes.len());

    PackedImage { bytes }
}

/// Validates `image` against `limit` and packs it
///
/// Returns `Error::PreconditionViolated` with every violated rule instead of producing a flash
/// image from an invalid program.
pub fn pack_raw(image: &[u8], limit: ImageSizeLimit) -> Result<PackedImage, Error> {
    let validated = validate(image, limit).map_err(Error::PreconditionViolated)?;

    Ok(pack(validated))
}

impl PackedImage {
    /// Reads a flash image from `reader` the same way the bootloader loads it from flash
    ///
    /// The declared length must satisfy `limit` and the word alignment. Any bytes following the
    /// declared payload are left unread.
    pub fn from_reader<R: Read>(mut reader: R, limit: ImageSizeLimit) -> Result<Self, Error> {
        // Read the payload length
        let declared = match reader.read_u32::<LittleEndian>() {
            Ok(declared) => declared as usize,
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(Error::TruncatedHeader)
            }
            Err(err) => return Err(err.into()),
        };

        trace!("Flash image header declares {} payload bytes", declared);

        check_size(declared, limit)?;

        let mut bytes = Vec::with_capacity(HEADER_SIZE + declared);
        bytes.extend_from_slice(&(declared as u32).to_le_bytes());

        // Read exactly the declared payload
        let actual = reader.take(declared as u64).read_to_end(&mut bytes)?;

        if actual < declared {
            return Err(Error::TruncatedPayload { declared, actual });
        }

        Ok(PackedImage { bytes })
    }

    /// Returns the payload length stored in the header
    pub fn declared_len(&self) -> u32 {
        LittleEndian::read_u32(&self.bytes[..HEADER_SIZE])
    }

    /// Returns the raw program carried by this image
    pub fn payload(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..]
    }

    /// Returns the whole image, header included
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Returns the total length of the image, header included
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// A flash image always holds at least its header
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns the number of payload words
    pub fn word_count(&self) -> usize {
        self.payload().len() / WORD_SIZE
    }

    /// Returns false if the bootloader would refuse to start this image
    ///
    /// The bootloader treats a zero length as blank flash.
    pub fn is_bootable(&self) -> bool {
        self.declared_len() != 0
    }

    /// Calculates the SHA-256 hash of the payload
    pub fn payload_digest(&self) -> [u8; 32] {
        let digest = Sha256::digest(self.payload());
        let mut hash = [0u8; 32];

        hash.copy_from_slice(&digest);

        hash
    }

    /// Writes the whole image to `writer`
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), Error> {
        writer.write_all(&self.bytes)?;

        Ok(())
    }
}

impl AsRef<[u8]> for PackedImage {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
