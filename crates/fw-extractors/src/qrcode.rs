use filewhisperer_types::{DataPayload, ExtractResult, Payload};
use image::GenericImageView;

use crate::{Extractor, ExtractInput};

/// Decodes every QR/2D barcode found in an image, in top-to-bottom,
/// left-to-right scan order, each as a `QRCODE` data node. An image with no
/// decodable codes yields no nodes; this is not an error.
pub struct QrCodeExtractor;

/// Decode all QR codes in `bytes`, returning their payload text. Returns an
/// empty vector (never an error) if the bytes are not a decodable image or
/// simply contain no codes — a decorative photo is the common case.
pub fn decode_qr_codes(bytes: &[u8]) -> Vec<String> {
    let Ok(image) = image::load_from_memory(bytes) else {
        return Vec::new();
    };
    let (width, height) = image.dimensions();
    let luma = image.to_luma8();
    let mut prepared = rqrr::PreparedImage::prepare(luma);
    let grids = prepared.detect_grids();

    let mut results: Vec<(u32, u32, String)> = Vec::new();
    for grid in grids {
        if let Ok((_, content)) = grid.decode() {
            let (x, y) = grid
                .bounds
                .first()
                .map(|p| (p.x as u32, p.y as u32))
                .unwrap_or((0, 0));
            results.push((y.min(height), x.min(width), content));
        }
    }
    results.sort_by_key(|(y, x, _)| (*y, *x));
    results.into_iter().map(|(_, _, content)| content).collect()
}

impl Extractor for QrCodeExtractor {
    fn name(&self) -> &'static str {
        "qrcode"
    }

    fn extract(&self, input: &mut ExtractInput<'_>) -> ExtractResult<Vec<Payload>> {
        let Some(file) = input.file() else {
            return Ok(Vec::new());
        };
        Ok(decode_qr_codes(&file.content)
            .into_iter()
            .map(|content| Payload::Data(DataPayload::text("QRCODE", content)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_image_bytes_decode_to_nothing() {
        assert!(decode_qr_codes(b"not an image").is_empty());
    }
}
