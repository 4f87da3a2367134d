use crate::error::ViewerError;

/// WebGL2 guarantees 2D textures up to this size.
pub const MAX_TEXTURE_DIM: u32 = 2048;

/// Decoded RGBA8 pixels ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Decode a JPEG or PNG, shrinking it to fit `max_dim` on both sides.
pub fn decode_texture(bytes: &[u8], max_dim: u32) -> Result<TextureImage, ViewerError> {
    let mut image =
        image::load_from_memory(bytes).map_err(|e| ViewerError::Texture(e.to_string()))?;

    if image.width() > max_dim || image.height() > max_dim {
        tracing::debug!(
            width = image.width(),
            height = image.height(),
            max_dim,
            "downscaling globe texture"
        );
        image = image.resize(max_dim, max_dim, image::imageops::FilterType::Triangle);
    }

    let rgba = image.to_rgba8();
    Ok(TextureImage {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::decode_texture;
    use crate::error::ViewerError;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([10, 20, 30]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).expect("encode png");
        out.into_inner()
    }

    #[test]
    fn decodes_to_rgba() {
        let tex = decode_texture(&png(4, 2), 2048).expect("decode");
        assert_eq!((tex.width, tex.height), (4, 2));
        assert_eq!(tex.rgba.len(), 4 * 2 * 4);
        assert_eq!(&tex.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn oversized_images_keep_aspect_within_limit() {
        let tex = decode_texture(&png(64, 32), 16).expect("decode");
        assert_eq!((tex.width, tex.height), (16, 8));
    }

    #[test]
    fn garbage_is_a_texture_error() {
        assert!(matches!(
            decode_texture(b"not an image", 2048),
            Err(ViewerError::Texture(_))
        ));
    }
}
