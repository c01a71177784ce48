//! Fixture builders shared by the unit tests.

use flate2::write::ZlibEncoder;
use flate2::{Compression, Crc};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ImageEncoder, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use std::io::Write;
use std::path::Path;

/// Deterministic pseudo-random bytes that deflate cannot shrink
pub fn noise(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x2545_f491;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

/// One-page PDF with `lines` lines of text in an uncompressed content stream
pub fn sample_pdf(path: &Path, lines: usize, with_info: bool) {
    sample_document(lines, with_info).save(path).unwrap();
}

fn sample_document(lines: usize, with_info: bool) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), Object::Integer(10)]),
        Operation::new("Td", vec![Object::Integer(40), Object::Integer(800)]),
    ];
    for i in 0..lines {
        operations.push(Operation::new("Td", vec![Object::Integer(0), Object::Integer(-12)]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(format!("Line {} of a rather repetitive quarterly report", i))],
        ));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if with_info {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Quarterly report"),
            "Author" => Object::string_literal("Finance"),
            "Producer" => Object::string_literal("fixture"),
        });
        doc.trailer.set("Info", info_id);
    }
    doc
}

/// Smooth gradient JPEG saved at `quality`
pub fn sample_jpeg(path: &Path, width: u32, height: u32, quality: u8) {
    std::fs::write(path, jpeg_bytes(width, height, quality)).unwrap();
}

/// Smooth gradient encoded as JPEG in memory
pub fn jpeg_bytes(width: u32, height: u32, quality: u8) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    });
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .write_image(img.as_raw(), width, height, ColorType::Rgb8)
        .unwrap();
    bytes
}

/// Insert `segment` (marker included) right after the SOI of `jpeg`
fn insert_after_soi(jpeg: &[u8], segment: &[u8]) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(segment);
    out.extend_from_slice(&jpeg[2..]);
    out
}

fn app_segment(marker: u8, payload: &[u8]) -> Vec<u8> {
    let mut segment = vec![0xFF, marker];
    segment.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    segment.extend_from_slice(payload);
    segment
}

/// `jpeg` with an APP1 EXIF block holding only the Orientation tag
pub fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    let mut payload = b"Exif\0\0".to_vec();
    // Big-endian TIFF header, IFD0 at offset 8 with a single SHORT entry
    payload.extend_from_slice(b"MM\0\x2a");
    payload.extend_from_slice(&8u32.to_be_bytes());
    payload.extend_from_slice(&1u16.to_be_bytes());
    payload.extend_from_slice(&0x0112u16.to_be_bytes());
    payload.extend_from_slice(&3u16.to_be_bytes());
    payload.extend_from_slice(&1u32.to_be_bytes());
    payload.extend_from_slice(&orientation.to_be_bytes());
    payload.extend_from_slice(&[0, 0]);
    payload.extend_from_slice(&0u32.to_be_bytes());
    insert_after_soi(jpeg, &app_segment(0xE1, &payload))
}

/// `jpeg` with a single-chunk APP2 ICC profile
pub fn with_icc_segment(jpeg: &[u8], profile: &[u8]) -> Vec<u8> {
    let mut payload = b"ICC_PROFILE\0".to_vec();
    payload.extend_from_slice(&[1, 1]);
    payload.extend_from_slice(profile);
    insert_after_soi(jpeg, &app_segment(0xE2, &payload))
}

/// `png` with an `iCCP` chunk carrying `profile` inserted after IHDR
pub fn with_iccp_chunk(png: &[u8], profile: &[u8]) -> Vec<u8> {
    let mut data = b"display\0\0".to_vec();
    let mut zlib = ZlibEncoder::new(Vec::new(), Compression::default());
    zlib.write_all(profile).unwrap();
    data.extend_from_slice(&zlib.finish().unwrap());

    let mut crc = Crc::new();
    crc.update(b"iCCP");
    crc.update(&data);

    let mut chunk = (data.len() as u32).to_be_bytes().to_vec();
    chunk.extend_from_slice(b"iCCP");
    chunk.extend_from_slice(&data);
    chunk.extend_from_slice(&crc.sum().to_be_bytes());

    // Signature (8) + IHDR (4 + 4 + 13 + 4)
    let at = 33;
    let mut out = png[..at].to_vec();
    out.extend_from_slice(&chunk);
    out.extend_from_slice(&png[at..]);
    out
}

/// One-page PDF encrypted with the standard RC4 40-bit handler (revision 2).
///
/// The owner password is "owner"; `user_password` may be empty.
pub fn sample_encrypted_pdf(path: &Path, lines: usize, user_password: &[u8]) {
    let mut doc = sample_document(lines, true);
    let file_id = b"nanopress-fixture".to_vec();
    let permissions: i32 = -44;

    let owner_digest = md5::compute(pad_password(b"owner"));
    let mut owner_entry = pad_password(user_password).to_vec();
    rc4(&owner_digest.0[..5], &mut owner_entry);

    let mut context = md5::Context::new();
    context.consume(pad_password(user_password));
    context.consume(&owner_entry);
    context.consume(permissions.to_le_bytes());
    context.consume(&file_id);
    let file_key = context.compute().0[..5].to_vec();

    let mut user_entry = PASSWORD_PADDING.to_vec();
    rc4(&file_key, &mut user_entry);

    for (&(number, generation), object) in doc.objects.iter_mut() {
        let mut seed = file_key.clone();
        seed.extend_from_slice(&number.to_le_bytes()[..3]);
        seed.extend_from_slice(&generation.to_le_bytes()[..2]);
        let object_digest = md5::compute(&seed);
        encrypt_object(object, &object_digest.0[..10]);
    }

    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "Length" => 40,
        "O" => Object::String(owner_entry, StringFormat::Hexadecimal),
        "U" => Object::String(user_entry, StringFormat::Hexadecimal),
        "P" => permissions as i64,
    });
    doc.trailer.set("Encrypt", encrypt_id);
    doc.trailer.set(
        "ID",
        vec![
            Object::String(file_id.clone(), StringFormat::Hexadecimal),
            Object::String(file_id, StringFormat::Hexadecimal),
        ],
    );
    doc.save(path).unwrap();
}

const PASSWORD_PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = PASSWORD_PADDING;
    let len = password.len().min(32);
    padded[..len].copy_from_slice(&password[..len]);
    padded[len..].copy_from_slice(&PASSWORD_PADDING[..32 - len]);
    padded
}

fn encrypt_object(object: &mut Object, key: &[u8]) {
    match object {
        Object::String(bytes, _) => rc4(key, bytes),
        Object::Array(items) => items.iter_mut().for_each(|item| encrypt_object(item, key)),
        Object::Dictionary(dict) => dict.iter_mut().for_each(|(_, value)| encrypt_object(value, key)),
        Object::Stream(stream) => {
            stream.dict.iter_mut().for_each(|(_, value)| encrypt_object(value, key));
            rc4(key, &mut stream.content);
        }
        _ => {}
    }
}

/// RC4 keystream applied in place
fn rc4(key: &[u8], data: &mut [u8]) {
    let mut state: Vec<u8> = (0..=255).collect();
    let mut j: u8 = 0;
    for i in 0..256 {
        j = j.wrapping_add(state[i]).wrapping_add(key[i % key.len()]);
        state.swap(i, j as usize);
    }

    let (mut i, mut j) = (0u8, 0u8);
    for byte in data.iter_mut() {
        i = i.wrapping_add(1);
        j = j.wrapping_add(state[i as usize]);
        state.swap(i as usize, j as usize);
        let k = state[state[i as usize].wrapping_add(state[j as usize]) as usize];
        *byte ^= k;
    }
}
