use image::GrayImage;

use super::landmarks::Point;

/// Ratio returned for degenerate eye crops and for frames with no visible
/// sclera on the left half; reads as CENTER after classification.
const NEUTRAL_GAZE_RATIO: f64 = 1.0;
/// Ratio returned when the right half has no visible sclera.
const LEFT_SATURATED_RATIO: f64 = 5.0;

/// Midpoint with integer truncation, matching the landmark coordinate grid.
pub(crate) fn midpoint(a: Point, b: Point) -> Point {
    Point {
        x: (a.x + b.x) / 2,
        y: (a.y + b.y) / 2,
    }
}

fn distance(a: Point, b: Point) -> f64 {
    let dx = f64::from(a.x - b.x);
    let dy = f64::from(a.y - b.y);
    dx.hypot(dy)
}

/// Horizontal-to-vertical openness ratio of a six-point eye. High values
/// mean the eyelid is nearly closed. A fully degenerate eye (zero vertical
/// extent) yields the horizontal length itself.
pub fn blink_ratio(eye: &[Point; 6]) -> f64 {
    let left_corner = eye[0];
    let right_corner = eye[3];
    let top = midpoint(eye[1], eye[2]);
    let bottom = midpoint(eye[5], eye[4]);

    let horizontal = distance(left_corner, right_corner);
    let vertical = distance(top, bottom);

    if vertical > 0.0 {
        horizontal / vertical
    } else {
        horizontal
    }
}

/// Ratio of white (sclera) pixels between the left and right halves of the
/// eye polygon. Below 1.0 the visible sclera sits mostly on the right,
/// meaning the iris points left in mirrored coordinates.
///
/// Pixels outside the polygon are ignored; a pixel counts as white when its
/// gray value exceeds `white_threshold`.
pub fn gaze_ratio(eye: &[Point; 6], frame: &GrayImage, white_threshold: u8) -> f64 {
    let (frame_width, frame_height) = frame.dimensions();
    let (min_x, max_x, min_y, max_y) = bounds(eye);

    if min_x < 0 || min_y < 0 || max_x >= frame_width as i32 || max_y >= frame_height as i32 {
        return NEUTRAL_GAZE_RATIO;
    }

    let crop_width = max_x - min_x;
    if crop_width <= 1 {
        return NEUTRAL_GAZE_RATIO;
    }
    let half_width = crop_width / 2;

    let mut left_white: u32 = 0;
    let mut right_white: u32 = 0;

    for y in min_y..max_y {
        for x in min_x..max_x {
            if !point_in_polygon(x, y, eye) {
                continue;
            }
            if frame.get_pixel(x as u32, y as u32).0[0] > white_threshold {
                if x - min_x < half_width {
                    left_white += 1;
                } else {
                    right_white += 1;
                }
            }
        }
    }

    if left_white == 0 {
        NEUTRAL_GAZE_RATIO
    } else if right_white == 0 {
        LEFT_SATURATED_RATIO
    } else {
        f64::from(left_white) / f64::from(right_white)
    }
}

fn bounds(eye: &[Point; 6]) -> (i32, i32, i32, i32) {
    let mut min_x = eye[0].x;
    let mut max_x = eye[0].x;
    let mut min_y = eye[0].y;
    let mut max_y = eye[0].y;

    for point in &eye[1..] {
        min_x = min_x.min(point.x);
        max_x = max_x.max(point.x);
        min_y = min_y.min(point.y);
        max_y = max_y.max(point.y);
    }

    (min_x, max_x, min_y, max_y)
}

/// Even-odd ray casting. Vertex y values on opposite sides of the ray
/// guarantee the divisor is non-zero.
fn point_in_polygon(x: i32, y: i32, polygon: &[Point; 6]) -> bool {
    let px = f64::from(x);
    let py = f64::from(y);
    let mut inside = false;
    let mut j = polygon.len() - 1;

    for i in 0..polygon.len() {
        let xi = f64::from(polygon[i].x);
        let yi = f64::from(polygon[i].y);
        let xj = f64::from(polygon[j].x);
        let yj = f64::from(polygon[j].y);

        let crosses = (yi > py) != (yj > py);
        if crosses && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }

    inside
}
