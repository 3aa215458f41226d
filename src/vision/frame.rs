use chrono::{DateTime, Utc};
use image::{Rgb, RgbImage};
use serde::Serialize;

use crate::models::GazeDirection;

use super::landmarks::Point;

const FOCUSED_BORDER: Rgb<u8> = Rgb([46, 204, 113]);
const DISTRACTED_BORDER: Rgb<u8> = Rgb([231, 76, 60]);
const LANDMARK_DOT: Rgb<u8> = Rgb([255, 255, 255]);
const BORDER_THICKNESS: u32 = 4;

/// Overlay metadata attached to every published frame. Cosmetic only;
/// UIs that render their own overlays can ignore the drawn-in versions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameAnnotations {
    pub timestamp: DateTime<Utc>,
    pub tracking: bool,
    pub focused: bool,
    pub direction: GazeDirection,
    pub blinking: bool,
    pub face_count: usize,
    pub saccade_count: usize,
    pub fixation_count: usize,
}

/// Mirrored RGB frame plus its annotations, published after every
/// capture iteration.
#[derive(Debug, Clone)]
pub struct FramePacket {
    pub image: RgbImage,
    pub annotations: FrameAnnotations,
}

/// Draw the focus border and eye landmark dots into the frame. The border
/// only appears while tracking, matching the live-preview treatment.
pub(crate) fn annotate_frame(
    image: &mut RgbImage,
    tracking: bool,
    focused: bool,
    eye_points: &[Point],
) {
    for point in eye_points {
        draw_dot(image, point.x, point.y, LANDMARK_DOT);
    }

    if tracking {
        let color = if focused { FOCUSED_BORDER } else { DISTRACTED_BORDER };
        draw_border(image, color, BORDER_THICKNESS);
    }
}

fn draw_border(image: &mut RgbImage, color: Rgb<u8>, thickness: u32) {
    let (width, height) = image.dimensions();
    let thickness = thickness.min(width / 2).min(height / 2);

    for y in 0..height {
        for x in 0..width {
            let on_edge = x < thickness
                || y < thickness
                || x >= width - thickness
                || y >= height - thickness;
            if on_edge {
                image.put_pixel(x, y, color);
            }
        }
    }
}

fn draw_dot(image: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    let (width, height) = image.dimensions();
    for dy in -1..=1 {
        for dx in -1..=1 {
            let px = x + dx;
            let py = y + dy;
            if px >= 0 && py >= 0 && (px as u32) < width && (py as u32) < height {
                image.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}
