//! Diagnostic overlay: the stretched image with the profile line drawn
//! over it, returned as a self-contained base64 PNG data URI.

use crate::analysis::coords::PixelPoint;
use crate::error::AppError;
use crate::render::stretch::stretch_to_gray;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{ImageFormat, Rgb, RgbImage};
use ndarray::ArrayView2;
use std::io::Cursor;

/// Line color, matching the front-end's selection highlight (#f33).
const LINE_COLOR: Rgb<u8> = Rgb([255, 51, 51]);

/// Render the stretched image with the sampled line drawn on top.
///
/// Presentation only: callers must treat a failure here as cosmetic and
/// never let it affect the computed profile.
pub fn render_line_overlay(
    image: &ArrayView2<'_, f64>,
    p0: PixelPoint,
    p1: PixelPoint,
) -> Result<String, AppError> {
    let (height, width) = image.dim();
    if height == 0 || width == 0 {
        return Err(AppError::InvalidGeometry(
            "cannot render an empty image".to_string(),
        ));
    }

    let gray = stretch_to_gray(image);
    let mut canvas = RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let g = gray[y as usize * width + x as usize];
        Rgb([g, g, g])
    });

    draw_line(&mut canvas, p0, p1);

    let mut png = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| AppError::Internal(format!("PNG encode failed: {e}")))?;

    Ok(format!("data:image/png;base64,{}", BASE64.encode(&png)))
}

/// Plot the segment pixel by pixel; positions off the canvas are simply
/// not drawn, so a diagnostic line may run past the image edge.
fn draw_line(canvas: &mut RgbImage, p0: PixelPoint, p1: PixelPoint) {
    let dx = p1.x - p0.x;
    let dy = p1.y - p0.y;
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;

    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = (p0.x + t * dx).round();
        let y = (p0.y + t * dy).round();

        if x >= 0.0 && y >= 0.0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
            canvas.put_pixel(x as u32, y as u32, LINE_COLOR);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn overlay_is_a_png_data_uri() {
        let image = Array2::from_shape_fn((16, 16), |(row, col)| (row + col) as f64 * 100.0);
        let uri = render_line_overlay(
            &image.view(),
            PixelPoint { x: 0.0, y: 0.0 },
            PixelPoint { x: 15.0, y: 15.0 },
        )
        .unwrap();

        assert!(uri.starts_with("data:image/png;base64,"));
        assert!(uri.len() > "data:image/png;base64,".len());
    }

    #[test]
    fn line_running_off_canvas_still_renders() {
        let image = Array2::from_elem((8, 8), 1000.0);
        let uri = render_line_overlay(
            &image.view(),
            PixelPoint { x: 4.0, y: 4.0 },
            PixelPoint { x: 20.0, y: 4.0 },
        );

        assert!(uri.is_ok());
    }

    #[test]
    fn empty_image_is_invalid_geometry() {
        let image = Array2::<f64>::zeros((0, 4));
        let result = render_line_overlay(
            &image.view(),
            PixelPoint { x: 0.0, y: 0.0 },
            PixelPoint { x: 1.0, y: 1.0 },
        );

        assert!(matches!(result, Err(AppError::InvalidGeometry(_))));
    }
}
