//! RGBA resizing with a fast path and a portable fallback

use std::num::NonZeroU32;

use fast_image_resize as fr;
use image::{ImageBuffer, RgbaImage, imageops};
use log::warn;
use serde::{Deserialize, Serialize};

/// Resampling kernel used when snippets are scaled to the strip height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    Nearest,
    Bilinear,
    #[default]
    Lanczos3,
}

impl ResampleFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResampleFilter::Nearest => "nearest",
            ResampleFilter::Bilinear => "bilinear",
            ResampleFilter::Lanczos3 => "lanczos3",
        }
    }

    fn fast_alg(self) -> fr::ResizeAlg {
        match self {
            ResampleFilter::Nearest => fr::ResizeAlg::Nearest,
            ResampleFilter::Bilinear => fr::ResizeAlg::Convolution(fr::FilterType::Bilinear),
            ResampleFilter::Lanczos3 => fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3),
        }
    }

    fn image_filter(self) -> imageops::FilterType {
        match self {
            ResampleFilter::Nearest => imageops::FilterType::Nearest,
            ResampleFilter::Bilinear => imageops::FilterType::Triangle,
            ResampleFilter::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

/// Resize `src` to exactly `width` x `height`.
///
/// Same-size requests hand back a copy untouched. Zero dimensions are
/// bumped to one pixel.
pub fn resize_rgba(src: &RgbaImage, width: u32, height: u32, filter: ResampleFilter) -> RgbaImage {
    let width = width.max(1);
    let height = height.max(1);
    if src.dimensions() == (width, height) {
        return src.clone();
    }

    match fast_resize(src, width, height, filter) {
        Ok(resized) => resized,
        Err(e) => {
            warn!(
                "Fast resize {}x{} -> {width}x{height} failed: {e}, falling back to slow resize",
                src.width(),
                src.height()
            );
            imageops::resize(src, width, height, filter.image_filter())
        }
    }
}

fn fast_resize(
    src: &RgbaImage,
    new_width: u32,
    new_height: u32,
    filter: ResampleFilter,
) -> Result<RgbaImage, Box<dyn std::error::Error>> {
    let src_view = fr::Image::from_vec_u8(
        NonZeroU32::new(src.width()).ok_or("Invalid width")?,
        NonZeroU32::new(src.height()).ok_or("Invalid height")?,
        src.as_raw().clone(),
        fr::PixelType::U8x4,
    )?;

    let dst_width = NonZeroU32::new(new_width).ok_or("Invalid target width")?;
    let dst_height = NonZeroU32::new(new_height).ok_or("Invalid target height")?;
    let mut dst_image = fr::Image::new(dst_width, dst_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new(filter.fast_alg());
    resizer.resize(&src_view.view(), &mut dst_image.view_mut())?;

    let buffer = ImageBuffer::from_raw(new_width, new_height, dst_image.into_vec())
        .ok_or("Failed to create ImageBuffer")?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn nearest_doubles_pixels_exactly() {
        let mut src = RgbaImage::new(2, 1);
        src.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        src.put_pixel(1, 0, Rgba([0, 0, 255, 255]));

        let out = resize_rgba(&src, 4, 2, ResampleFilter::Nearest);
        assert_eq!(out.dimensions(), (4, 2));
        for y in 0..2 {
            assert_eq!(out.get_pixel(0, y), &Rgba([255, 0, 0, 255]));
            assert_eq!(out.get_pixel(1, y), &Rgba([255, 0, 0, 255]));
            assert_eq!(out.get_pixel(2, y), &Rgba([0, 0, 255, 255]));
            assert_eq!(out.get_pixel(3, y), &Rgba([0, 0, 255, 255]));
        }
    }

    #[test]
    fn zero_target_becomes_one_pixel() {
        let src = RgbaImage::from_pixel(3, 3, Rgba([9, 9, 9, 255]));
        let out = resize_rgba(&src, 0, 0, ResampleFilter::Bilinear);
        assert_eq!(out.dimensions(), (1, 1));
    }

    #[test]
    fn filter_names_parse_from_yaml() {
        let filter: ResampleFilter = serde_yaml::from_str("bilinear").unwrap();
        assert_eq!(filter, ResampleFilter::Bilinear);
        assert_eq!(ResampleFilter::default().as_str(), "lanczos3");
    }
}
