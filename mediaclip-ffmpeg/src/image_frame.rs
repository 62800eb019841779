//! Conversion of decoded frames into `image` buffers

use crate::{Error, Result};
use image::{DynamicImage, ImageBuffer, Rgb, Rgba};
use mediaclip_core::{FrameBuffer, PixelFormat};

/// Wraps a decoded frame as an image, RGB or RGBA to match its format
pub fn frame_to_image(frame: FrameBuffer) -> Result<DynamicImage> {
    let (width, height) = frame.size();
    let image = match frame.format {
        PixelFormat::Rgb24 => ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(width, height, frame.data)
            .map(DynamicImage::ImageRgb8),
        PixelFormat::Rgba => ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(width, height, frame.data)
            .map(DynamicImage::ImageRgba8),
    };
    image.ok_or_else(|| Error::DecodeFailure(format!("frame data does not fit {width}x{height}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_frame_to_image() {
        let frame = FrameBuffer::new(2, 1, PixelFormat::Rgb24, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let image = frame_to_image(frame).unwrap().to_rgb8();
        assert_eq!(image.dimensions(), (2, 1));
        assert_eq!(image.get_pixel(1, 0), &Rgb([4, 5, 6]));
    }

    #[test]
    fn test_rgba_frame_keeps_alpha() {
        let frame = FrameBuffer::filled(3, 2, PixelFormat::Rgba, 9);
        let image = frame_to_image(frame).unwrap();
        assert!(image.color().has_alpha());
        assert_eq!(image.to_rgba8().get_pixel(2, 1), &Rgba([9, 9, 9, 9]));
    }
}
