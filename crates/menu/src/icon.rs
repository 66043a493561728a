//! Built-in tray icons, drawn at runtime so no image assets are required.

/// Raw RGBA icon bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

const RUNNING_FILL: [u8; 3] = [0x2e, 0xb8, 0x72];
const STOPPED_FILL: [u8; 3] = [0x8a, 0x8f, 0x98];
const RING: [u8; 3] = [0x1f, 0x24, 0x2b];
const CORE: [u8; 3] = [0xff, 0xff, 0xff];

/// Draws an anti-aliased disc: green when running, grey when stopped, with
/// a dark ring and a white core when running.
pub fn render_icon(running: bool, size: u32) -> IconImage {
    let size = size.max(8);
    let fill = if running { RUNNING_FILL } else { STOPPED_FILL };

    let center = size as f32 / 2.0;
    let outer = center - 0.5;
    let ring_width = (size as f32 / 12.0).max(1.0);
    let core = if running { outer * 0.35 } else { 0.0 };

    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            let d = (dx * dx + dy * dy).sqrt();

            // Coverage of the outer edge, 1 px feather.
            let alpha = (outer - d + 0.5).clamp(0.0, 1.0);
            let color = if d > outer - ring_width {
                RING
            } else if d < core {
                CORE
            } else {
                fill
            };

            rgba.extend_from_slice(&color);
            rgba.push((alpha * 255.0).round() as u8);
        }
    }

    IconImage {
        rgba,
        width: size,
        height: size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(img: &IconImage, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * img.width + x) * 4) as usize;
        [img.rgba[i], img.rgba[i + 1], img.rgba[i + 2], img.rgba[i + 3]]
    }

    #[test]
    fn dimensions_match_buffer() {
        let img = render_icon(false, 32);
        assert_eq!((img.width, img.height), (32, 32));
        assert_eq!(img.rgba.len(), 32 * 32 * 4);
    }

    #[test]
    fn corners_are_transparent() {
        let img = render_icon(true, 32);
        assert_eq!(pixel(&img, 0, 0)[3], 0);
        assert_eq!(pixel(&img, 31, 31)[3], 0);
    }

    #[test]
    fn running_and_stopped_differ() {
        let on = render_icon(true, 32);
        let off = render_icon(false, 32);
        assert_ne!(on, off);
        // Between core and ring the fill colour shows.
        let [r, g, b, a] = pixel(&on, 16, 9);
        assert_eq!([r, g, b], RUNNING_FILL);
        assert_eq!(a, 255);
        let [r, g, b, _] = pixel(&off, 16, 16);
        assert_eq!([r, g, b], STOPPED_FILL);
    }

    #[test]
    fn tiny_sizes_are_clamped() {
        assert_eq!(render_icon(false, 1).width, 8);
    }
}
