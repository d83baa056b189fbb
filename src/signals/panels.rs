use image::DynamicImage;
use rayon::prelude::*;

use crate::common::PanelRect;

/// Luminance above which a pixel counts as gutter white.
const WHITE_LUMA: u8 = 220;
/// Fraction of a row/column that must be white for it to join a gutter band.
const GUTTER_FRACTION: f32 = 0.5;
/// Candidate panels narrower or shorter than a tenth of the frame are noise.
const MIN_PANEL_DIVISOR: u32 = 10;

/// Fallback layout when no gutters are found: 3 rows by 2 columns.
const FALLBACK_ROWS: u32 = 3;
const FALLBACK_COLS: u32 = 2;

/// Segments a frame into panel rectangles by finding its gutter bands.
///
/// A row (column) is gutter when more than half of its pixels are brighter
/// than the white threshold; panels are the grid cells between gutter bands
/// on both axes, sorted into reading order. Guaranteed non-empty: a frame
/// with no discernible gutters gets the fixed uniform grid instead, so
/// boundary damping always has panel edges to work against.
pub fn detect_panels(image: &DynamicImage) -> Vec<PanelRect> {
    let gray = image.to_luma8();
    let (w, h) = (gray.width(), gray.height());
    if w < MIN_PANEL_DIVISOR || h < MIN_PANEL_DIVISOR {
        return fallback_grid(w.max(1), h.max(1));
    }
    let raw = gray.as_raw();

    let row_is_gutter: Vec<bool> = (0..h as usize)
        .into_par_iter()
        .map(|y| {
            let row = &raw[y * w as usize..(y + 1) * w as usize];
            let white = row.iter().filter(|&&l| l > WHITE_LUMA).count();
            white as f32 > w as f32 * GUTTER_FRACTION
        })
        .collect();

    let col_is_gutter: Vec<bool> = (0..w as usize)
        .into_par_iter()
        .map(|x| {
            let white = (0..h as usize)
                .filter(|y| raw[y * w as usize + x] > WHITE_LUMA)
                .count();
            white as f32 > h as f32 * GUTTER_FRACTION
        })
        .collect();

    let row_bands = content_bands(&row_is_gutter);
    let col_bands = content_bands(&col_is_gutter);

    let min_w = w / MIN_PANEL_DIVISOR;
    let min_h = h / MIN_PANEL_DIVISOR;
    let mut panels = Vec::new();
    for &(y0, y1) in &row_bands {
        for &(x0, x1) in &col_bands {
            let pw = (x1 - x0) as u32;
            let ph = (y1 - y0) as u32;
            if pw < min_w || ph < min_h {
                continue;
            }
            panels.push(PanelRect::new(x0 as u32, y0 as u32, pw, ph));
        }
    }

    if panels.is_empty() {
        return fallback_grid(w, h);
    }
    PanelRect::sort_reading_order(&mut panels);
    panels
}

/// Contiguous non-gutter runs as half-open `(start, end)` index pairs.
fn content_bands(is_gutter: &[bool]) -> Vec<(usize, usize)> {
    let mut bands = Vec::new();
    let mut start = None;
    for (i, &gutter) in is_gutter.iter().enumerate() {
        match (gutter, start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                bands.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        bands.push((s, is_gutter.len()));
    }
    bands
}

/// The fixed uniform grid used when segmentation finds nothing.
pub fn fallback_grid(frame_width: u32, frame_height: u32) -> Vec<PanelRect> {
    let cell_w = (frame_width / FALLBACK_COLS).max(1);
    let cell_h = (frame_height / FALLBACK_ROWS).max(1);
    let mut panels = Vec::with_capacity((FALLBACK_ROWS * FALLBACK_COLS) as usize);
    for row in 0..FALLBACK_ROWS {
        for col in 0..FALLBACK_COLS {
            panels.push(PanelRect::new(col * cell_w, row * cell_h, cell_w, cell_h));
        }
    }
    panels
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    /// A white page with dark panel blocks laid out on a grid.
    fn synthetic_page(rows: &[(u32, u32)], cols: &[(u32, u32)], w: u32, h: u32) -> DynamicImage {
        let mut img = RgbImage::from_pixel(w, h, Rgb([255, 255, 255]));
        for &(y0, y1) in rows {
            for &(x0, x1) in cols {
                draw_filled_rect_mut(
                    &mut img,
                    Rect::at(x0 as i32, y0 as i32).of_size(x1 - x0, y1 - y0),
                    Rgb([40, 40, 40]),
                );
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn two_by_two_grid_is_segmented() {
        let page = synthetic_page(&[(20, 280), (320, 580)], &[(20, 180), (220, 380)], 400, 600);
        let panels = detect_panels(&page);
        assert_eq!(panels.len(), 4);
        // Reading order: first panel is top-left.
        assert!(panels[0].x < panels[1].x);
        assert!(panels[0].y == panels[1].y);
        assert!(panels[2].y > panels[0].y);
        // Each recovered panel covers its drawn block.
        assert!(panels[0].w >= 160 && panels[0].h >= 260);
    }

    #[test]
    fn gutterless_page_falls_back_to_uniform_grid() {
        let img = RgbImage::from_pixel(400, 600, Rgb([90, 90, 90]));
        let panels = detect_panels(&DynamicImage::ImageRgb8(img));
        assert_eq!(panels.len(), 6);
        assert_eq!(panels[0], PanelRect::new(0, 0, 200, 200));
        assert_eq!(panels[5], PanelRect::new(200, 400, 200, 200));
    }

    #[test]
    fn all_white_page_falls_back_to_uniform_grid() {
        let img = RgbImage::from_pixel(300, 300, Rgb([255, 255, 255]));
        let panels = detect_panels(&DynamicImage::ImageRgb8(img));
        assert_eq!(panels.len(), 6);
    }

    #[test]
    fn slivers_below_a_tenth_of_the_frame_are_dropped() {
        // One real column plus a 20px sliver column on a 400px-wide page.
        let page = synthetic_page(&[(20, 580)], &[(20, 300), (360, 380)], 400, 600);
        let panels = detect_panels(&page);
        assert_eq!(panels.len(), 1);
        assert!(panels[0].w >= 280);
    }

    #[test]
    fn single_full_page_panel() {
        let page = synthetic_page(&[(10, 590)], &[(10, 390)], 400, 600);
        let panels = detect_panels(&page);
        assert_eq!(panels.len(), 1);
    }
}
