#![allow(dead_code)]

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{ImageBuffer, ImageFormat, Rgb};

/// A small solid-colour image; different shades give different payloads.
pub fn photo_bytes(shade: u8, format: ImageFormat) -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(4, 4, Rgb([shade, 120, 40]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

pub fn photo_payload(shade: u8) -> String {
    BASE64.encode(photo_bytes(shade, ImageFormat::Png))
}

pub fn photo_data_url(shade: u8) -> String {
    format!("data:image/png;base64,{}", photo_payload(shade))
}
