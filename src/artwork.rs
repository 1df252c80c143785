use eframe::egui::ColorImage;

/// Decodes album-art bytes into an egui image. Failure is non-fatal; the
/// caller logs it and keeps the display blank for that track.
pub fn decode_artwork(bytes: &[u8]) -> Result<ColorImage, String> {
    let image =
        image::load_from_memory(bytes).map_err(|e| format!("Failed to decode album art: {e}"))?;
    let image = image.to_rgba8();
    let size = [image.width() as usize, image.height() as usize];
    let pixels = image.into_raw();
    Ok(ColorImage::from_rgba_unmultiplied(size, &pixels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{codecs::png::PngEncoder, ExtendedColorType, ImageEncoder};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let raw = vec![200u8; (width * height * 4) as usize];
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(&raw, width, height, ExtendedColorType::Rgba8)
            .unwrap();
        out
    }

    #[test]
    fn decodes_png_to_expected_size() {
        let image = decode_artwork(&png_bytes(3, 2)).unwrap();
        assert_eq!(image.size, [3, 2]);
        assert_eq!(image.pixels[0].r(), 200);
    }

    #[test]
    fn garbage_bytes_are_a_soft_error() {
        assert!(decode_artwork(b"definitely not an image").is_err());
        assert!(decode_artwork(&[]).is_err());
    }
}
