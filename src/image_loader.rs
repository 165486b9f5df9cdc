use std::io::Cursor;

use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;
use image::{DynamicImage, ImageFormat};

use crate::error::ViewerError;

/// Decodes encoded image bytes into a raster. Animated GIFs yield their first frame.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ViewerError> {
    let format = image::guess_format(bytes).ok();

    if format == Some(ImageFormat::Gif) {
        let decoder = GifDecoder::new(Cursor::new(bytes))
            .map_err(|e| ViewerError::Decode(format!("Failed to decode GIF: {e}")))?;
        let mut frames = decoder.into_frames();
        if let Some(frame) = frames.next() {
            let frame =
                frame.map_err(|e| ViewerError::Decode(format!("Failed to decode GIF frame: {e}")))?;
            return Ok(DynamicImage::ImageRgba8(frame.into_buffer()));
        }
        return Err(ViewerError::Decode("GIF has no frames".to_string()));
    }

    match format {
        Some(fmt) => image::load_from_memory_with_format(bytes, fmt)
            .map_err(|e| ViewerError::Decode(e.to_string())),
        None => image::load_from_memory(bytes).map_err(|e| ViewerError::Decode(e.to_string())),
    }
}
