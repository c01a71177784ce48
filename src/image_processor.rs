//! # Image Processing Module
//!
//! Questo modulo ricodifica le immagini supportate nel loro formato originale
//! usando il crate `image`, senza tool esterni.
//!
//! ## Formati Supportati
//!
//! | Formato | Decode | Encode | Note |
//! |---------|--------|--------|------|
//! | JPEG    | ✅     | ✅     | Qualità da `Config::quality` (1-100) |
//! | PNG     | ✅     | ✅     | Lossless anche a 16 bit, `CompressionType::Best` + filtro adattivo |
//! | TIFF    | ✅     | ✅     | Encoder non compresso: spesso interviene il size guard |
//! | HEIC    | ❌     | ❌     | Nessun decoder disponibile: `InvalidInput` |
//!
//! ## Pipeline
//!
//! 1. **Decode**: il formato viene rilevato dal contenuto (fallback all'estensione)
//! 2. **Orient**: rotazione secondo il tag EXIF `Orientation`
//! 3. **Encode**: in memoria, con il profilo ICC del sorgente reinserito
//! 4. **Persist**: file temporaneo nella directory di destinazione, poi rename atomico
//!
//! Il confronto con la dimensione originale è compito di `SizeGuard`, applicato
//! dal backend dopo ogni compressione.
//!
//! ## Errori
//!
//! - Sorgente non decodificabile → `InvalidInput`
//! - Encoder non in grado di gestire il formato o i pixel → `ConversionFailed`
//! - Scrittura, flush o rename falliti → `SaveFailed`
//!
//! Tutte le funzioni sono bloccanti: il backend le esegue con `spawn_blocking`.

use crate::config::Config;
use crate::error::CompressError;
use crate::file_manager::{FileManager, ImageKind};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::tiff::TiffEncoder;
use crate::image_metadata::{apply_orientation, read_orientation, ColorProfile};
use image::{ColorType, DynamicImage, ImageEncoder, ImageError, ImageFormat};
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use tracing::{debug, error};

/// Re-encodes images at a configured quality
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    /// JPEG quality on the 1-100 scale
    quality: u8,
}

impl ImageProcessor {
    pub fn new(config: &Config) -> Self {
        Self {
            quality: config.jpeg_quality(),
        }
    }

    /// Re-encode `input` as `kind` into `destination`.
    ///
    /// The picture is turned upright according to its EXIF orientation and
    /// keeps its ICC profile when the container allows it. The destination's
    /// parent directory is created if missing.
    pub fn compress(&self, input: &Path, destination: &Path, kind: ImageKind) -> Result<(), CompressError> {
        let source = std::fs::read(input).map_err(|e| {
            debug!("Cannot open image {}: {}", input.display(), e);
            CompressError::invalid_input(input)
        })?;

        let orientation = read_orientation(&source);
        let img = apply_orientation(Self::decode(input, &source)?, orientation);

        let mut encoded = Vec::new();
        self.encode(&img, kind, &mut Cursor::new(&mut encoded))?;
        if let Some(profile) = ColorProfile::read(&source) {
            encoded = profile.embed(encoded);
        }

        let dir = destination.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = FileManager::temp_file_in(dir, ".nanopress-", ".img")?;
        temp.as_file_mut().write_all(&encoded).map_err(|e| {
            error!("Failed to write encoded image for {}: {}", input.display(), e);
            CompressError::SaveFailed
        })?;

        FileManager::persist(temp, destination)?;
        debug!(
            "Re-encoded {} ({}x{}, orientation {}) -> {}",
            input.display(),
            img.width(),
            img.height(),
            orientation,
            destination.display()
        );
        Ok(())
    }

    fn decode(input: &Path, source: &[u8]) -> Result<DynamicImage, CompressError> {
        let mut reader = image::io::Reader::new(Cursor::new(source));
        if let Ok(format) = ImageFormat::from_path(input) {
            reader.set_format(format);
        }
        let reader = reader.with_guessed_format().map_err(|e| {
            debug!("Cannot sniff image {}: {}", input.display(), e);
            CompressError::invalid_input(input)
        })?;

        reader.decode().map_err(|e| {
            debug!("Cannot decode image {}: {}", input.display(), e);
            CompressError::invalid_input(input)
        })
    }

    fn encode<W: Write + Seek>(
        &self,
        img: &DynamicImage,
        kind: ImageKind,
        writer: &mut W,
    ) -> Result<(), CompressError> {
        let (width, height) = (img.width(), img.height());

        let result = match kind {
            ImageKind::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(writer, self.quality);
                if is_grayscale(img.color()) {
                    let luma = img.to_luma8();
                    encoder.write_image(luma.as_raw(), width, height, ColorType::L8)
                } else {
                    let rgb = img.to_rgb8();
                    encoder.write_image(rgb.as_raw(), width, height, ColorType::Rgb8)
                }
            }
            ImageKind::Png => {
                let encoder = PngEncoder::new_with_quality(
                    writer,
                    CompressionType::Best,
                    FilterType::Adaptive,
                );
                let (bytes, color) = png_layout(img);
                encoder.write_image(&bytes, width, height, color)
            }
            ImageKind::Tiff => {
                let encoder = TiffEncoder::new(writer);
                let (bytes, color) = tiff_layout(img);
                encoder.write_image(&bytes, width, height, color)
            }
            ImageKind::Heic => {
                error!("No HEIC encoder available");
                return Err(CompressError::ConversionFailed);
            }
        };

        result.map_err(|e| match e {
            ImageError::IoError(io) => {
                error!("Failed to write encoded image: {}", io);
                CompressError::SaveFailed
            }
            other => {
                error!("Encoder rejected image: {}", other);
                CompressError::ConversionFailed
            }
        })
    }
}

fn is_grayscale(color: ColorType) -> bool {
    matches!(
        color,
        ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16
    )
}

/// PNG stores every 8 and 16-bit layout as decoded
fn png_layout(img: &DynamicImage) -> (Vec<u8>, ColorType) {
    match img.color() {
        ColorType::L8
        | ColorType::La8
        | ColorType::Rgb8
        | ColorType::Rgba8
        | ColorType::L16
        | ColorType::La16
        | ColorType::Rgb16
        | ColorType::Rgba16 => (img.as_bytes().to_vec(), img.color()),
        _ => sixteen_bit_rgb(img),
    }
}

/// The TIFF encoder has no grey+alpha layouts; those widen to RGBA
fn tiff_layout(img: &DynamicImage) -> (Vec<u8>, ColorType) {
    match img.color() {
        ColorType::L8
        | ColorType::Rgb8
        | ColorType::Rgba8
        | ColorType::L16
        | ColorType::Rgb16
        | ColorType::Rgba16 => (img.as_bytes().to_vec(), img.color()),
        ColorType::La8 => (DynamicImage::ImageRgba8(img.to_rgba8()).into_bytes(), ColorType::Rgba8),
        _ => sixteen_bit_rgb(img),
    }
}

/// 16-bit RGB(A) for layouts with no direct encoding (floats, 16-bit grey+alpha in TIFF)
fn sixteen_bit_rgb(img: &DynamicImage) -> (Vec<u8>, ColorType) {
    if img.color().has_alpha() {
        (DynamicImage::ImageRgba16(img.to_rgba16()).into_bytes(), ColorType::Rgba16)
    } else {
        (DynamicImage::ImageRgb16(img.to_rgb16()).into_bytes(), ColorType::Rgb16)
    }
}
