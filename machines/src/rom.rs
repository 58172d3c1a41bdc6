//! Cartridge and BIOS image loading.
//!
//! Images are padded up to the next power of two so address wrapping is a
//! mask, and hashed with BLAKE3 (truncated to 12 bytes) for the hint
//! database. Dumps with a 512-byte Super Magic Drive header have the header
//! stripped before padding.

use std::path::Path;

/// Length of the truncated BLAKE3 ROM hash.
pub const HASH_LENGTH: usize = 12;

/// Errors that can occur when loading a ROM or BIOS image.
#[derive(Debug)]
pub enum RomError {
    /// Underlying I/O error (file not found, permission denied, etc.)
    Io(std::io::Error),

    /// The file is empty once any copier header has been stripped.
    Empty,

    /// The image is too large for a 16-bit console's address space math.
    TooLarge(usize),
}

impl std::fmt::Display for RomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Empty => write!(f, "ROM file contains no data"),
            Self::TooLarge(size) => write!(f, "ROM of {size} bytes is too large"),
        }
    }
}

impl std::error::Error for RomError {}

impl From<std::io::Error> for RomError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Round up to the next power of two.
fn round_up(n: u32) -> u32 {
    let mut result = 1;
    while result < n {
        result <<= 1;
    }
    result
}

/// Detect a Super Magic Drive copier header: the file is 512 bytes over a
/// kibibyte multiple, and only the first two header bytes are nonzero.
fn smd_header_length(bytes: &[u8]) -> usize {
    if bytes.len() & 0x3FF == 512 && bytes[2..512].iter().all(|&b| b == 0) {
        512
    } else {
        0
    }
}

/// A loaded ROM or BIOS image: power-of-two padded content, the unpadded
/// size, and the 12-byte content hash.
#[derive(Clone)]
pub struct RomImage {
    data: Vec<u8>,
    size: u32,
    hash: [u8; HASH_LENGTH],
}

impl RomImage {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RomError> {
        let skip = smd_header_length(bytes);
        let content = &bytes[skip..];

        if content.is_empty() {
            return Err(RomError::Empty);
        }
        if content.len() > 1 << 22 {
            return Err(RomError::TooLarge(content.len()));
        }

        let size = content.len() as u32;
        let mut data = vec![0u8; round_up(size) as usize];
        data[..content.len()].copy_from_slice(content);

        let mut hash = [0u8; HASH_LENGTH];
        hash.copy_from_slice(&blake3::hash(content).as_bytes()[..HASH_LENGTH]);

        Ok(Self { data, size, hash })
    }

    pub fn from_file(path: &Path) -> Result<Self, RomError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Unpadded content length in bytes.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Address-wrapping mask over the padded content.
    pub fn mask(&self) -> u32 {
        self.data.len() as u32 - 1
    }

    pub fn hash(&self) -> &[u8; HASH_LENGTH] {
        &self.hash
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Read one byte, wrapping the address over the padded size.
    pub fn read(&self, addr: u32) -> u8 {
        self.data[(addr & self.mask()) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_power_of_two() {
        let rom = RomImage::from_bytes(&[0xAB; 40 << 10]).unwrap();
        assert_eq!(rom.size(), 40 << 10);
        assert_eq!(rom.data().len(), 64 << 10);
        assert_eq!(rom.mask(), (64 << 10) - 1);
        // Padding reads as zero
        assert_eq!(rom.read(63 << 10), 0x00);
    }

    #[test]
    fn exact_power_of_two_not_padded() {
        let rom = RomImage::from_bytes(&[0x55; 32 << 10]).unwrap();
        assert_eq!(rom.data().len(), 32 << 10);
    }

    #[test]
    fn read_wraps_over_mask() {
        let mut bytes = vec![0u8; 8 << 10];
        bytes[0] = 0xCD;
        let rom = RomImage::from_bytes(&bytes).unwrap();
        assert_eq!(rom.read(8 << 10), 0xCD);
    }

    #[test]
    fn smd_header_is_stripped() {
        let mut bytes = vec![0u8; (16 << 10) + 512];
        bytes[0] = 0x10;
        bytes[1] = 0x02;
        bytes[512] = 0x77;
        let rom = RomImage::from_bytes(&bytes).unwrap();
        assert_eq!(rom.size(), 16 << 10);
        assert_eq!(rom.read(0), 0x77);
    }

    #[test]
    fn short_file_with_512_tail_not_treated_as_header() {
        // 512-byte intros exist; a nonzero body byte keeps the header
        let mut bytes = vec![0u8; 512];
        bytes[0] = 0x01;
        bytes[100] = 0x99;
        let rom = RomImage::from_bytes(&bytes).unwrap();
        assert_eq!(rom.size(), 512);
    }

    #[test]
    fn hash_matches_content_not_padding() {
        let a = RomImage::from_bytes(&[0x11; 24 << 10]).unwrap();
        let b = RomImage::from_bytes(&[0x11; 24 << 10]).unwrap();
        let c = RomImage::from_bytes(&[0x22; 24 << 10]).unwrap();
        assert_eq!(a.hash(), b.hash());
        assert_ne!(a.hash(), c.hash());
    }

    #[test]
    fn empty_rom_rejected() {
        assert!(matches!(RomImage::from_bytes(&[]), Err(RomError::Empty)));
    }
}
