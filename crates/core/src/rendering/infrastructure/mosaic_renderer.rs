use crate::recognition::domain::identity::Identity;
use crate::rendering::domain::frame_renderer::FrameRenderer;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::DEFAULT_MOSAIC_KERNEL;
use crate::shared::frame::Frame;

const MARKER_COLOR: [u8; 3] = [255, 0, 0];
const BORDER_THICKNESS: usize = 2;
const LABEL_SCALE: usize = 2;

/// CPU renderer for recognition output.
///
/// Unknown faces are pixelated: the region is averaged down by the
/// mosaic kernel factor and blown back up with nearest-neighbor
/// sampling. Recognized faces get a rectangle outline and their name
/// drawn above the box with a small built-in bitmap font.
pub struct MosaicRenderer {
    kernel: usize,
}

impl MosaicRenderer {
    pub fn new(kernel: usize) -> Self {
        Self { kernel: kernel.max(2) }
    }
}

impl Default for MosaicRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_MOSAIC_KERNEL)
    }
}

impl FrameRenderer for MosaicRenderer {
    fn render(
        &self,
        frame: &mut Frame,
        boxes: &[BoundingBox],
        identities: &[Identity],
    ) -> Result<(), Box<dyn std::error::Error>> {
        debug_assert_eq!(boxes.len(), identities.len());
        for (bbox, identity) in boxes.iter().zip(identities) {
            let Some(rect) = PixelRect::from_bbox(bbox, frame.width(), frame.height()) else {
                continue;
            };
            match identity {
                Identity::Unknown => pixelate(frame, &rect, self.kernel),
                Identity::Known(name) => {
                    draw_rect(frame, &rect);
                    draw_label(frame, name, rect.x0 as i64, rect.y0 as i64 - 12);
                }
            }
        }
        Ok(())
    }
}

/// A bbox rounded to whole pixels and clamped inside the frame.
struct PixelRect {
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
}

impl PixelRect {
    fn from_bbox(bbox: &BoundingBox, width: u32, height: u32) -> Option<Self> {
        let clamped = bbox.clamp(width, height);
        let x0 = clamped.x0.round() as usize;
        let y0 = clamped.y0.round() as usize;
        let x1 = (clamped.x1.round() as usize).min(width as usize);
        let y1 = (clamped.y1.round() as usize).min(height as usize);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self { x0, y0, x1, y1 })
    }

    fn width(&self) -> usize {
        self.x1 - self.x0
    }

    fn height(&self) -> usize {
        self.y1 - self.y0
    }
}

/// Block-average the region down by `kernel`, then upscale with
/// nearest-neighbor sampling. Regions smaller than the kernel are left
/// untouched (nothing useful to obscure at that size).
fn pixelate(frame: &mut Frame, rect: &PixelRect, kernel: usize) {
    let w = rect.width();
    let h = rect.height();
    if w < kernel || h < kernel {
        return;
    }

    let small_w = w / kernel;
    let small_h = h / kernel;
    let stride = frame.width() as usize * 3;
    let data = frame.data_mut();

    // Downscale: each cell is the mean of its source block
    let mut small = vec![[0u8; 3]; small_w * small_h];
    for sy in 0..small_h {
        let by0 = rect.y0 + sy * h / small_h;
        let by1 = rect.y0 + (sy + 1) * h / small_h;
        for sx in 0..small_w {
            let bx0 = rect.x0 + sx * w / small_w;
            let bx1 = rect.x0 + (sx + 1) * w / small_w;

            let mut acc = [0u64; 3];
            for y in by0..by1 {
                for x in bx0..bx1 {
                    let offset = y * stride + x * 3;
                    for c in 0..3 {
                        acc[c] += data[offset + c] as u64;
                    }
                }
            }
            let count = ((by1 - by0) * (bx1 - bx0)) as u64;
            small[sy * small_w + sx] =
                [0, 1, 2].map(|c| (acc[c] / count.max(1)) as u8);
        }
    }

    // Upscale: nearest-neighbor back into the original region
    for y in rect.y0..rect.y1 {
        let sy = ((y - rect.y0) * small_h / h).min(small_h - 1);
        for x in rect.x0..rect.x1 {
            let sx = ((x - rect.x0) * small_w / w).min(small_w - 1);
            let cell = small[sy * small_w + sx];
            let offset = y * stride + x * 3;
            data[offset..offset + 3].copy_from_slice(&cell);
        }
    }
}

fn draw_rect(frame: &mut Frame, rect: &PixelRect) {
    let stride = frame.width() as usize * 3;
    let data = frame.data_mut();
    let put = |data: &mut [u8], x: usize, y: usize| {
        let offset = y * stride + x * 3;
        data[offset..offset + 3].copy_from_slice(&MARKER_COLOR);
    };

    for t in 0..BORDER_THICKNESS {
        for x in rect.x0..rect.x1 {
            if rect.y0 + t < rect.y1 {
                put(data, x, rect.y0 + t);
            }
            if rect.y1 > t + 1 && rect.y1 - 1 - t >= rect.y0 {
                put(data, x, rect.y1 - 1 - t);
            }
        }
        for y in rect.y0..rect.y1 {
            if rect.x0 + t < rect.x1 {
                put(data, rect.x0 + t, y);
            }
            if rect.x1 > t + 1 && rect.x1 - 1 - t >= rect.x0 {
                put(data, rect.x1 - 1 - t, y);
            }
        }
    }
}

fn draw_label(frame: &mut Frame, text: &str, x: i64, y: i64) {
    let mut cursor_x = x;
    for ch in text.chars() {
        draw_char(frame, cursor_x, y, ch);
        cursor_x += 4 * LABEL_SCALE as i64;
    }
}

/// 3×5 bitmap glyphs, one row per array element, 3 bits per row.
fn glyph(ch: char) -> [u8; 5] {
    match ch.to_ascii_lowercase() {
        'a' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'b' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'd' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'f' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'g' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'h' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'k' => [0b101, 0b110, 0b100, 0b110, 0b101],
        'l' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'n' => [0b101, 0b111, 0b111, 0b111, 0b101],
        'o' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'p' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'r' => [0b110, 0b101, 0b110, 0b110, 0b101],
        's' => [0b011, 0b100, 0b010, 0b001, 0b110],
        't' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'w' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'x' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        _ => [0b000, 0b000, 0b000, 0b000, 0b000],
    }
}

fn draw_char(frame: &mut Frame, x: i64, y: i64, ch: char) {
    let width = frame.width() as i64;
    let height = frame.height() as i64;
    let stride = frame.width() as usize * 3;
    let data = frame.data_mut();
    let scale = LABEL_SCALE as i64;

    for (row, bits) in glyph(ch).iter().enumerate() {
        for col in 0..3i64 {
            if (bits >> (2 - col)) & 1 == 0 {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    let px = x + col * scale + dx;
                    let py = y + row as i64 * scale + dy;
                    if px >= 0 && py >= 0 && px < width && py < height {
                        let offset = py as usize * stride + px as usize * 3;
                        data[offset..offset + 3].copy_from_slice(&MARKER_COLOR);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(w: u32, h: u32) -> Frame {
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                data.push((x * 2) as u8);
                data.push((y * 2) as u8);
                data.push(100);
            }
        }
        Frame::new(data, w, h, 0)
    }

    fn pixel(frame: &Frame, x: usize, y: usize) -> [u8; 3] {
        let offset = (y * frame.width() as usize + x) * 3;
        [
            frame.data()[offset],
            frame.data()[offset + 1],
            frame.data()[offset + 2],
        ]
    }

    fn bbox(x0: f64, y0: f64, x1: f64, y1: f64) -> BoundingBox {
        BoundingBox::from_corners(x0, y0, x1, y1)
    }

    #[test]
    fn test_unknown_face_gets_pixelated() {
        let mut frame = gradient_frame(100, 100);
        let original = frame.clone();
        let renderer = MosaicRenderer::new(10);

        renderer
            .render(
                &mut frame,
                &[bbox(10.0, 10.0, 90.0, 90.0)],
                &[Identity::Unknown],
            )
            .unwrap();

        assert_ne!(frame.data(), original.data());
        // Pixels inside one mosaic block are uniform
        assert_eq!(pixel(&frame, 12, 12), pixel(&frame, 15, 15));
        // Pixels outside the box are untouched
        assert_eq!(pixel(&frame, 5, 5), pixel(&original, 5, 5));
    }

    #[test]
    fn test_mosaic_preserves_mean_brightness() {
        let mut frame = gradient_frame(100, 100);
        let original = frame.clone();
        MosaicRenderer::new(10)
            .render(
                &mut frame,
                &[bbox(0.0, 0.0, 100.0, 100.0)],
                &[Identity::Unknown],
            )
            .unwrap();

        let avg = |f: &Frame| {
            f.data().iter().map(|&b| b as f64).sum::<f64>() / f.data().len() as f64
        };
        assert!((avg(&frame) - avg(&original)).abs() < 2.0);
    }

    #[test]
    fn test_region_smaller_than_kernel_untouched() {
        let mut frame = gradient_frame(100, 100);
        let original = frame.clone();
        MosaicRenderer::new(10)
            .render(
                &mut frame,
                &[bbox(10.0, 10.0, 15.0, 15.0)],
                &[Identity::Unknown],
            )
            .unwrap();
        assert_eq!(frame.data(), original.data());
    }

    #[test]
    fn test_known_face_gets_outline_not_mosaic() {
        let mut frame = gradient_frame(100, 100);
        MosaicRenderer::new(10)
            .render(
                &mut frame,
                &[bbox(20.0, 20.0, 80.0, 80.0)],
                &[Identity::known("alice")],
            )
            .unwrap();

        // Border pixels are the marker color
        assert_eq!(pixel(&frame, 20, 20), MARKER_COLOR);
        assert_eq!(pixel(&frame, 79, 79), MARKER_COLOR);
        // Interior is not pixelated: neighbors in the gradient still differ
        assert_ne!(pixel(&frame, 40, 40), pixel(&frame, 45, 45));
    }

    #[test]
    fn test_label_drawn_above_box() {
        let mut frame = gradient_frame(100, 100);
        MosaicRenderer::new(10)
            .render(
                &mut frame,
                &[bbox(20.0, 20.0, 80.0, 80.0)],
                &[Identity::known("i")],
            )
            .unwrap();

        // 'i' glyph top row starts at y0-12; its first row is solid
        let marked = (20..26).any(|x| pixel(&frame, x, 8) == MARKER_COLOR);
        assert!(marked, "expected label pixels above the box");
    }

    #[test]
    fn test_label_near_top_edge_is_clipped_not_panicking() {
        let mut frame = gradient_frame(100, 100);
        MosaicRenderer::new(10)
            .render(
                &mut frame,
                &[bbox(20.0, 2.0, 80.0, 80.0)],
                &[Identity::known("alice")],
            )
            .unwrap();
    }

    #[test]
    fn test_box_outside_frame_is_skipped() {
        let mut frame = gradient_frame(50, 50);
        let original = frame.clone();
        MosaicRenderer::new(10)
            .render(
                &mut frame,
                &[bbox(200.0, 200.0, 300.0, 300.0)],
                &[Identity::Unknown],
            )
            .unwrap();
        assert_eq!(frame.data(), original.data());
    }

    #[test]
    fn test_mixed_identities_rendered_independently() {
        let mut frame = gradient_frame(200, 100);
        MosaicRenderer::new(10)
            .render(
                &mut frame,
                &[bbox(10.0, 10.0, 90.0, 90.0), bbox(110.0, 10.0, 190.0, 90.0)],
                &[Identity::Unknown, Identity::known("bob")],
            )
            .unwrap();

        // Left box pixelated (uniform block), right box outlined
        assert_eq!(pixel(&frame, 12, 12), pixel(&frame, 15, 15));
        assert_eq!(pixel(&frame, 110, 10), MARKER_COLOR);
    }

    #[test]
    fn test_glyph_unsupported_char_is_blank() {
        assert_eq!(glyph('!'), [0, 0, 0, 0, 0]);
        assert_ne!(glyph('a'), [0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_glyph_case_insensitive() {
        assert_eq!(glyph('A'), glyph('a'));
    }
}
