//! Simulation memory images
//!
//! A memory image holds one line per 4-byte word of the input. Each line is the word's bytes in
//! reverse file order, rendered as 8 uppercase hex digits, which is the order the memory model in
//! the test bench loads them in.

use std::fmt;
use std::io::Write;

use byteorder::{ByteOrder, LittleEndian};
use log::debug;

use crate::{Error, WORD_SIZE};

/// A single memory word, stored in file order
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MemoryWord([u8; WORD_SIZE]);

impl MemoryWord {
    /// Creates a word from 4 bytes in the order they appear in the image file
    pub fn from_file_order(bytes: [u8; WORD_SIZE]) -> MemoryWord {
        MemoryWord(bytes)
    }

    /// Returns the bytes in the order they appear in the image file
    pub fn to_file_order(self) -> [u8; WORD_SIZE] {
        self.0
    }

    /// Returns the word value as the target's little-endian load sees it
    pub fn value(self) -> u32 {
        LittleEndian::read_u32(&self.0)
    }
}

impl fmt::Display for MemoryWord {
    /// Renders `[b0, b1, b2, b3]` as the hex digits of `b3 b2 b1 b0`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.value())
    }
}

/// Splits `image` into memory words, failing if its size is not word-aligned
fn words(image: &[u8]) -> Result<impl Iterator<Item = MemoryWord> + '_, Error> {
    if image.len() % WORD_SIZE != 0 {
        return Err(Error::MisalignedSize(image.len()));
    }

    Ok(image.chunks_exact(WORD_SIZE).map(|chunk| {
        let mut word = [0u8; WORD_SIZE];
        word.copy_from_slice(chunk);

        MemoryWord(word)
    }))
}

/// Writes the memory image for `image` to `writer`
///
/// Nothing is written if `image` is not word-aligned.
pub fn write_mem<W: Write>(image: &[u8], writer: &mut W) -> Result<(), Error> {
    for word in words(image)? {
        writeln!(writer, "{}", word)?;
    }

    debug!("Wrote {} memory words", image.len() / WORD_SIZE);

    Ok(())
}

/// Renders `image` as memory image text
///
/// Accepts either a raw program or a packed flash image, as long as its size is word-aligned.
pub fn emit(image: &[u8]) -> Result<String, Error> {
    let mut text = String::with_capacity(image.len() / WORD_SIZE * 9);

    for word in words(image)? {
        text.push_str(&word.to_string());
        text.push('\n');
    }

    Ok(text)
}

/// Parses memory image text back into the bytes it was emitted from
///
/// Blank lines are skipped. Every other line must hold exactly 8 hex digits.
pub fn parse(text: &str) -> Result<Vec<u8>, Error> {
    let mut bytes = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        let invalid = || Error::InvalidMemLine {
            line: index + 1,
            content: line.to_string(),
        };

        if line.len() != WORD_SIZE * 2 || !line.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let value = u32::from_str_radix(line, 16).map_err(|_| invalid())?;

        bytes.extend_from_slice(&value.to_le_bytes());
    }

    Ok(bytes)
}
