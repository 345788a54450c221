//! Rendered page rasters and background sampling

use crate::error::SamplingError;
use crate::geometry::{Color, Rect};

/// Read access to RGBA pixels of a rendered page.
pub trait PixelSource {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// RGBA value at `(x, y)`, row-major from the top-left corner.
    fn pixel(&self, x: u32, y: u32) -> Result<[u8; 4], SamplingError>;
}

/// A page rendered at the shared scale.
///
/// `pixels` is `None` when the renderer could not hand back readable pixel
/// data (for example a tainted browser canvas). Extraction still works, only
/// background hints degrade to white.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pixels: Option<Vec<u8>>,
}

impl Raster {
    /// Wrap an RGBA buffer of `width * height * 4` bytes.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels: Some(rgba),
        }
    }

    /// A raster whose pixels cannot be read.
    pub fn restricted(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: None,
        }
    }

    /// A raster filled with one color.
    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        let count = width as usize * height as usize;
        let mut rgba = Vec::with_capacity(count * 4);
        for _ in 0..count {
            rgba.extend_from_slice(&[color.r, color.g, color.b, 255]);
        }
        Self::from_rgba(width, height, rgba)
    }

    pub fn is_readable(&self) -> bool {
        self.pixels.is_some()
    }

    /// Paint a rectangle, clipped to the raster. Used to build test pages.
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Color) {
        let Some(pixels) = self.pixels.as_mut() else {
            return;
        };
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        for py in y.min(y_end)..y_end {
            for px in x.min(x_end)..x_end {
                let offset = (py as usize * self.width as usize + px as usize) * 4;
                if let Some(slot) = pixels.get_mut(offset..offset + 4) {
                    slot.copy_from_slice(&[color.r, color.g, color.b, 255]);
                }
            }
        }
    }
}

impl PixelSource for Raster {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> Result<[u8; 4], SamplingError> {
        let pixels = self.pixels.as_ref().ok_or(SamplingError::Restricted)?;
        let out_of_bounds = || SamplingError::OutOfBounds {
            x: x as f64,
            y: y as f64,
            width: self.width,
            height: self.height,
        };
        if x >= self.width || y >= self.height {
            return Err(out_of_bounds());
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let slice = pixels.get(offset..offset + 4).ok_or_else(out_of_bounds)?;
        Ok([slice[0], slice[1], slice[2], slice[3]])
    }
}

/// Average color of up to `limit` pixels inside `rect`.
///
/// The region is clamped to the raster: the origin is pulled inside the
/// bounds and the extent shrunk to fit, never below one pixel. Pixels are
/// visited row by row and the first `limit` are averaged.
pub fn average_color<S: PixelSource + ?Sized>(
    source: &S,
    rect: &Rect,
    limit: usize,
) -> Result<Color, SamplingError> {
    let (width, height) = (source.width() as i64, source.height() as i64);
    if width == 0 || height == 0 {
        return Err(SamplingError::EmptyRaster);
    }
    if ![rect.x, rect.y, rect.width, rect.height]
        .iter()
        .all(|v| v.is_finite())
    {
        return Err(SamplingError::OutOfBounds {
            x: rect.x,
            y: rect.y,
            width: source.width(),
            height: source.height(),
        });
    }

    let sx = (rect.x.floor() as i64).clamp(0, width - 1);
    let sy = (rect.y.floor() as i64).clamp(0, height - 1);
    let sw = (rect.width.floor() as i64).min(width - sx).max(1);
    let sh = (rect.height.floor() as i64).min(height - sy).max(1);

    let mut totals = [0u64; 3];
    let mut count = 0u64;
    'rows: for y in sy..sy + sh {
        for x in sx..sx + sw {
            if count as usize >= limit {
                break 'rows;
            }
            let [r, g, b, _] = source.pixel(x as u32, y as u32)?;
            totals[0] += r as u64;
            totals[1] += g as u64;
            totals[2] += b as u64;
            count += 1;
        }
    }

    if count == 0 {
        return Ok(Color::WHITE);
    }
    let avg = |total: u64| ((total as f64) / (count as f64)).round() as u8;
    Ok(Color::rgb(avg(totals[0]), avg(totals[1]), avg(totals[2])))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_average() {
        let raster = Raster::solid(20, 20, Color::rgb(10, 20, 30));
        let color = average_color(&raster, &Rect::new(2.0, 2.0, 5.0, 5.0), 100).unwrap();
        assert_eq!(color, Color::rgb(10, 20, 30));
    }

    #[test]
    fn test_limit_takes_first_pixels_row_major() {
        let mut raster = Raster::solid(10, 10, Color::WHITE);
        // First row black, rest white
        raster.fill_rect(0, 0, 10, 1, Color::BLACK);
        let color = average_color(&raster, &Rect::new(0.0, 0.0, 10.0, 10.0), 10).unwrap();
        assert_eq!(color, Color::BLACK);

        let color = average_color(&raster, &Rect::new(0.0, 0.0, 10.0, 10.0), 20).unwrap();
        assert_eq!(color, Color::rgb(128, 128, 128));
    }

    #[test]
    fn test_region_is_clamped() {
        let mut raster = Raster::solid(10, 10, Color::WHITE);
        raster.fill_rect(9, 9, 1, 1, Color::rgb(255, 0, 0));
        // Origin far outside the raster gets pulled to the last pixel
        let color = average_color(&raster, &Rect::new(50.0, 50.0, 30.0, 30.0), 100).unwrap();
        assert_eq!(color, Color::rgb(255, 0, 0));

        let color = average_color(&raster, &Rect::new(-5.0, -5.0, 0.0, 0.0), 100).unwrap();
        assert_eq!(color, Color::WHITE);
    }

    #[test]
    fn test_restricted_raster() {
        let raster = Raster::restricted(10, 10);
        assert!(!raster.is_readable());
        assert!(Raster::solid(1, 1, Color::WHITE).is_readable());
        let err = average_color(&raster, &Rect::new(0.0, 0.0, 5.0, 5.0), 100).unwrap_err();
        assert_eq!(err, SamplingError::Restricted);
    }

    #[test]
    fn test_empty_and_non_finite() {
        let raster = Raster::solid(0, 0, Color::WHITE);
        assert_eq!(
            average_color(&raster, &Rect::new(0.0, 0.0, 1.0, 1.0), 100),
            Err(SamplingError::EmptyRaster)
        );
        let raster = Raster::solid(4, 4, Color::WHITE);
        assert!(matches!(
            average_color(&raster, &Rect::new(f64::NAN, 0.0, 1.0, 1.0), 100),
            Err(SamplingError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_short_buffer_is_out_of_bounds() {
        let raster = Raster::from_rgba(4, 4, vec![0; 8]);
        assert!(matches!(
            raster.pixel(3, 3),
            Err(SamplingError::OutOfBounds { .. })
        ));
    }
}
