use glam::Vec2;
use image::{Rgba, RgbaImage};

/// Width of one digit glyph in unscaled pixels.
const GLYPH_WIDTH: u32 = 5;

/// Height of one digit glyph in unscaled pixels.
const GLYPH_HEIGHT: u32 = 7;

/// Columns of blank pixels between adjacent digits, unscaled.
const GLYPH_SPACING: u32 = 1;

/// 5x7 bitmaps for the digits 0..=9; bit 4 is the leftmost column.
const GLYPHS: [[u8; GLYPH_HEIGHT as usize]; 10] = [
    [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
    [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
    [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
    [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
    [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
    [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
    [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
];

/// Draws a one- or two-digit number centered on `center`.
pub(crate) fn draw_number(
    image: &mut RgbaImage,
    number: u8,
    center: Vec2,
    scale: u32,
    color: Rgba<u8>,
) {
    let tens = [number / 10, number % 10];
    let ones = [number % 10];
    let digits: &[u8] = if number >= 10 { &tens } else { &ones };

    let digit_count = digits.len() as u32;
    let width = (digit_count * GLYPH_WIDTH + (digit_count - 1) * GLYPH_SPACING) * scale;
    let height = GLYPH_HEIGHT * scale;
    let left = center.x - width as f32 / 2.0;
    let top = center.y - height as f32 / 2.0;

    for (position, digit) in digits.iter().enumerate() {
        let glyph = &GLYPHS[usize::from(*digit)];
        let glyph_left = left + (position as u32 * (GLYPH_WIDTH + GLYPH_SPACING) * scale) as f32;
        draw_glyph(image, glyph, Vec2::new(glyph_left, top), scale, color);
    }
}

fn draw_glyph(
    image: &mut RgbaImage,
    glyph: &[u8; GLYPH_HEIGHT as usize],
    top_left: Vec2,
    scale: u32,
    color: Rgba<u8>,
) {
    for (row, bits) in glyph.iter().enumerate() {
        for column in 0..GLYPH_WIDTH {
            if bits & (1 << (GLYPH_WIDTH - 1 - column)) == 0 {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    let x = top_left.x + (column * scale + dx) as f32;
                    let y = top_left.y + (row as u32 * scale + dy) as f32;
                    put_pixel_clamped(image, x, y, color);
                }
            }
        }
    }
}

fn put_pixel_clamped(image: &mut RgbaImage, x: f32, y: f32, color: Rgba<u8>) {
    if x < 0.0 || y < 0.0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x < image.width() && y < image.height() {
        image.put_pixel(x, y, color);
    }
}
