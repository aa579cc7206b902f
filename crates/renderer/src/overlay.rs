//! Control bars and debug text drawn over camera frames.

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

pub const BAR_WIDTH: u32 = 200;
pub const BAR_HEIGHT: u32 = 20;
/// Gap between the bars and the right image edge
pub const BAR_MARGIN_RIGHT: u32 = 20;
/// Steering bar top, measured up from the bottom edge
pub const BAR_OFFSET_BOTTOM: u32 = 60;
/// Vertical distance from the steering bar to the throttle bar
pub const BAR_SPACING: u32 = 30;

const INDICATOR_WIDTH: u32 = 2;
const TEXT_ORIGIN: (i32, i32) = (10, 30);
const TEXT_LINE_HEIGHT: i32 = 20;
const TEXT_SCALE: f32 = 16.0;

const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);
const INDICATOR: Rgb<u8> = Rgb([0, 255, 0]);
const TEXT: Rgb<u8> = Rgb([255, 255, 255]);

/// Top-left corner of the steering bar
pub fn bar_origin(width: u32, height: u32) -> (i32, i32) {
    (
        width as i32 - BAR_WIDTH as i32 - BAR_MARGIN_RIGHT as i32,
        height as i32 - BAR_OFFSET_BOTTOM as i32,
    )
}

/// Steering bar with a 2 px marker, throttle bar below it.
///
/// `steer` in [-1, 1] maps across the bar; `throttle` in [-1, 1] maps to the
/// filled width.
pub fn draw_control(image: &mut RgbImage, steer: f64, throttle: f64) {
    let (x, y) = bar_origin(image.width(), image.height());
    let bar = Rect::at(x, y).of_size(BAR_WIDTH, BAR_HEIGHT);
    draw_filled_rect_mut(image, bar, BACKGROUND);

    let marker = x + (BAR_WIDTH as f64 / 2.0 * (1.0 + steer)) as i32;
    draw_filled_rect_mut(
        image,
        Rect::at(marker - INDICATOR_WIDTH as i32 / 2, y).of_size(INDICATOR_WIDTH, BAR_HEIGHT),
        INDICATOR,
    );

    let y = y + BAR_SPACING as i32;
    draw_filled_rect_mut(image, Rect::at(x, y).of_size(BAR_WIDTH, BAR_HEIGHT), BACKGROUND);

    let filled = throttle_width(throttle);
    if filled > 0 {
        draw_filled_rect_mut(image, Rect::at(x, y).of_size(filled, BAR_HEIGHT), INDICATOR);
    }
}

pub fn throttle_width(throttle: f64) -> u32 {
    (BAR_WIDTH as f64 * (throttle + 1.0) / 2.0).clamp(0.0, BAR_WIDTH as f64) as u32
}

/// One `key: value` line per entry, top-left, 20 px apart
pub fn draw_debug(image: &mut RgbImage, font: &FontVec, lines: &[(String, String)]) {
    let scale = PxScale::from(TEXT_SCALE);
    let (x, mut y) = TEXT_ORIGIN;
    for (key, value) in lines {
        draw_text_mut(image, TEXT, x, y, scale, font, &format!("{key}: {value}"));
        y += TEXT_LINE_HEIGHT;
    }
}
