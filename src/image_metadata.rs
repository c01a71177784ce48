//! # Image Metadata Module
//!
//! Conserva ciò che la ricodifica dei pixel perderebbe: orientamento EXIF e
//! profilo colore ICC.
//!
//! ## Responsabilità:
//! - Lettura del tag EXIF `Orientation` con `kamadak-exif` e applicazione ai pixel
//!   (l'output non contiene EXIF, quindi la rotazione non viene applicata due volte)
//! - Estrazione dei segmenti ICC dal sorgente (JPEG `APP2 ICC_PROFILE`, PNG `iCCP`)
//!   e reinserimento verbatim nell'output dello stesso container
//!
//! Il profilo non viene convertito tra container diversi e TIFF non lo conserva:
//! l'encoder TIFF di `image` non scrive tag aggiuntivi.

use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const ICC_TAG: &[u8] = b"ICC_PROFILE\0";

/// EXIF orientation value (1-8); 1 means "as stored"
pub fn read_orientation(source: &[u8]) -> u32 {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(source)) {
        Ok(exif) => exif,
        Err(e) => {
            debug!("No usable EXIF data: {}", e);
            return 1;
        }
    };

    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .filter(|value| (1..=8).contains(value))
        .unwrap_or(1)
}

/// Rotate/flip `img` so that it displays upright without EXIF
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Colour profile lifted verbatim from the source container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorProfile {
    /// Complete `APP2 ICC_PROFILE` segments, markers included, in file order
    Jpeg(Vec<Vec<u8>>),
    /// Complete `iCCP` chunk, length and CRC included
    Png(Vec<u8>),
}

impl ColorProfile {
    pub fn read(source: &[u8]) -> Option<Self> {
        if source.starts_with(&JPEG_SOI) {
            let segments: Vec<Vec<u8>> = jpeg_segments(source)
                .filter(|(marker, segment)| *marker == 0xE2 && segment[4..].starts_with(ICC_TAG))
                .map(|(_, segment)| segment.to_vec())
                .collect();
            (!segments.is_empty()).then_some(Self::Jpeg(segments))
        } else if source.starts_with(&PNG_SIGNATURE) {
            png_chunks(source)
                .find(|(kind, _)| kind == b"iCCP")
                .map(|(_, chunk)| Self::Png(chunk.to_vec()))
        } else {
            None
        }
    }

    /// Insert the profile into freshly `encoded` bytes of the same container.
    ///
    /// Other containers are returned untouched.
    pub fn embed(&self, encoded: Vec<u8>) -> Vec<u8> {
        match self {
            Self::Jpeg(segments) if encoded.starts_with(&JPEG_SOI) => {
                // After SOI and the JFIF APP0 written by the encoder
                let at = jpeg_segments(&encoded)
                    .take_while(|(marker, _)| *marker == 0xE0)
                    .fold(JPEG_SOI.len(), |at, (_, segment)| at + segment.len());
                splice(encoded, at, segments.iter().map(Vec::as_slice))
            }
            Self::Png(chunk) if encoded.starts_with(&PNG_SIGNATURE) => {
                // iCCP must come before PLTE and IDAT: right after IHDR
                let ihdr_end = match png_chunks(&encoded).next() {
                    Some((kind, ihdr)) if &kind == b"IHDR" => Some(PNG_SIGNATURE.len() + ihdr.len()),
                    _ => None,
                };
                match ihdr_end {
                    Some(at) => splice(encoded, at, std::iter::once(chunk.as_slice())),
                    None => encoded,
                }
            }
            _ => {
                debug!("Colour profile not carried over: container changed");
                encoded
            }
        }
    }
}

fn splice<'a>(encoded: Vec<u8>, at: usize, parts: impl Iterator<Item = &'a [u8]>) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded.len());
    out.extend_from_slice(&encoded[..at]);
    for part in parts {
        out.extend_from_slice(part);
    }
    out.extend_from_slice(&encoded[at..]);
    out
}

/// `(marker, whole segment)` for every header segment before the scan data
fn jpeg_segments(bytes: &[u8]) -> impl Iterator<Item = (u8, &[u8])> {
    let mut pos = JPEG_SOI.len();
    std::iter::from_fn(move || loop {
        if pos + 4 > bytes.len() || bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        match marker {
            0xFF => pos += 1,
            0x01 | 0xD0..=0xD7 => pos += 2,
            0xD9 | 0xDA => return None,
            _ => {
                let len = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
                let end = pos + 2 + len;
                if len < 2 || end > bytes.len() {
                    return None;
                }
                let segment = &bytes[pos..end];
                pos = end;
                return Some((marker, segment));
            }
        }
    })
}

/// `(type, whole chunk)` for every chunk up to the image data
fn png_chunks(bytes: &[u8]) -> impl Iterator<Item = ([u8; 4], &[u8])> {
    let mut pos = PNG_SIGNATURE.len();
    std::iter::from_fn(move || {
        if pos + 12 > bytes.len() {
            return None;
        }
        let len = u32::from_be_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]]) as usize;
        let kind = [bytes[pos + 4], bytes[pos + 5], bytes[pos + 6], bytes[pos + 7]];
        let end = pos.checked_add(12 + len)?;
        if end > bytes.len() || &kind == b"IDAT" {
            return None;
        }
        let chunk = &bytes[pos..end];
        pos = end;
        Some((kind, chunk))
    })
}
