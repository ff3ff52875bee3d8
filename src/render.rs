use crate::triangle::{Triangle, format_measure};
use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::{Rgba, RgbaImage, imageops};
use imageproc::drawing::{
    draw_antialiased_line_segment_mut, draw_hollow_circle_mut, draw_hollow_rect_mut,
    draw_polygon_mut, draw_text_mut, text_size,
};
use imageproc::pixelops::interpolate;
use imageproc::point::Point;
use imageproc::rect::Rect;
use std::path::Path;

pub const BACKGROUND_COLOR: Rgba<u8> = Rgba([23, 24, 38, 255]);
pub const BODY_COLOR: Rgba<u8> = Rgba([85, 99, 135, 255]);
pub const LABEL_COLOR: Rgba<u8> = Rgba([175, 176, 205, 255]);

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Extra room around the shape so labels can sit outside its bounding box.
pub const LABEL_MARGIN: u32 = 75;
const ADJACENT_LABEL_RISE: i64 = 35;
const HYPOTENUSE_LABEL_DIVISOR: f64 = 2.5;

const ANGLE_ARC_DIVISOR: f64 = 6.0;
const RIGHT_ANGLE_BOX_DIVISOR: f64 = 4.5;
const RIGHT_ANGLE_BOX_MAX: f64 = 30.0;

/// Longest leg drawn at one pixel per unit. Longer triangles are scaled down
/// to this size; labels keep the true lengths.
pub const MAX_IMAGE_SIDE: u32 = 4096;

/// Rasterizes a label string. The renderer only depends on this capability,
/// not on any particular font backend.
pub trait TextRasterizer {
    fn render_text(&self, value: &str, color: Rgba<u8>) -> RgbaImage;
}

/// Font handle used for labels. Loading it is the explicit initialization
/// step that has to happen before any label is drawn.
pub struct LabelFont {
    font: FontVec,
    scale: PxScale,
}

impl LabelFont {
    pub fn load(path: impl AsRef<Path>, size: f32) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read font file '{}'", path.display()))?;
        Self::from_bytes(bytes, size)
            .with_context(|| format!("Failed to parse font file '{}'", path.display()))
    }

    /// Ubuntu Light, as bundled with egui.
    pub fn embedded(size: f32) -> Result<Self> {
        Self::from_bytes(epaint_default_fonts::UBUNTU_LIGHT.to_vec(), size)
            .context("Failed to parse embedded label font")
    }

    pub fn from_bytes(bytes: Vec<u8>, size: f32) -> Result<Self> {
        let font = FontVec::try_from_vec(bytes)?;
        log::debug!("Loaded label font at {}px", size);
        Ok(Self {
            font,
            scale: PxScale::from(size),
        })
    }
}

impl TextRasterizer for LabelFont {
    fn render_text(&self, value: &str, color: Rgba<u8>) -> RgbaImage {
        let (width, height) = text_size(self.scale, &self.font, value);
        let mut image = RgbaImage::from_pixel(width.max(1), height.max(1), TRANSPARENT);
        draw_text_mut(&mut image, color, 0, 0, self.scale, &self.font, value);
        image
    }
}

/// Rasterized label for each measurement of a triangle.
pub struct Labels {
    pub opposite: RgbaImage,
    pub adjacent: RgbaImage,
    pub hypotenuse: RgbaImage,
    pub adjacent_angle: RgbaImage,
    pub opposite_angle: RgbaImage,
}

impl Labels {
    pub fn new(triangle: &Triangle, text: &impl TextRasterizer) -> Self {
        let sides = triangle.sides();
        let angles = triangle.angles();
        let label = |value: f64| text.render_text(&format_measure(value), LABEL_COLOR);
        Self {
            opposite: label(sides.opposite),
            adjacent: label(sides.adjacent),
            hypotenuse: label(sides.hypotenuse),
            // Each angle label sits in the corner facing its side.
            adjacent_angle: label(angles.opposite),
            opposite_angle: label(angles.adjacent),
        }
    }
}

pub struct RenderedTriangle {
    pub shape_image: RgbaImage,
    pub label_overlay: RgbaImage,
    pub labels: Labels,
}

/// Leg lengths as drawn, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
}

impl Frame {
    pub fn of(triangle: &Triangle) -> Self {
        let sides = triangle.sides();
        let longest = sides.adjacent.max(sides.opposite);
        let limit = f64::from(MAX_IMAGE_SIDE);
        let fit = |leg: f64| {
            if longest > limit {
                limit * (leg / longest)
            } else {
                leg
            }
        };
        Self {
            width: fit(sides.adjacent),
            height: fit(sides.opposite),
        }
    }

    fn extents(&self) -> (i32, i32) {
        (self.width as i32, self.height as i32)
    }

    /// A leg shorter than one pixel collapses the polygon onto a line.
    pub fn is_degenerate(&self) -> bool {
        let (width, height) = self.extents();
        width == 0 || height == 0
    }
}

/// Vertex positions in the shape image's local frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corners {
    pub right_angle: (i32, i32),
    pub opposite_angle: (i32, i32),
    pub adjacent_angle: (i32, i32),
}

impl Corners {
    pub fn of(frame: &Frame) -> Self {
        let (width, height) = frame.extents();
        Self {
            right_angle: (0, height),
            opposite_angle: (0, 0),
            adjacent_angle: (width, height),
        }
    }

    fn polygon(&self) -> [Point<i32>; 3] {
        [self.right_angle, self.opposite_angle, self.adjacent_angle]
            .map(|(x, y)| Point::new(x, y))
    }
}

pub fn render(triangle: &Triangle, text: &impl TextRasterizer) -> RenderedTriangle {
    let shape_image = draw_shape(triangle);
    let labels = Labels::new(triangle, text);
    let label_overlay = compose_labels(&labels, shape_image.dimensions());
    log::debug!(
        "Rendered triangle: shape {:?}, overlay {:?}",
        shape_image.dimensions(),
        label_overlay.dimensions()
    );
    RenderedTriangle {
        shape_image,
        label_overlay,
        labels,
    }
}

pub fn draw_shape(triangle: &Triangle) -> RgbaImage {
    let (width, height) = image_size(triangle);
    let mut image = RgbaImage::from_pixel(width, height, TRANSPARENT);
    let frame = Frame::of(triangle);
    let corners = Corners::of(&frame);

    if frame.is_degenerate() {
        log::warn!("Triangle is under a pixel thick, drawing markers only");
    } else {
        for (start, end) in [
            (corners.right_angle, corners.opposite_angle),
            (corners.opposite_angle, corners.adjacent_angle),
            (corners.adjacent_angle, corners.right_angle),
        ] {
            draw_antialiased_line_segment_mut(&mut image, start, end, BACKGROUND_COLOR, interpolate);
        }

        draw_polygon_mut(&mut image, &corners.polygon(), BODY_COLOR);
    }

    draw_hollow_circle_mut(
        &mut image,
        corners.adjacent_angle,
        (frame.width / ANGLE_ARC_DIVISOR) as i32,
        BACKGROUND_COLOR,
    );
    draw_hollow_circle_mut(
        &mut image,
        corners.opposite_angle,
        (frame.height / ANGLE_ARC_DIVISOR) as i32,
        BACKGROUND_COLOR,
    );

    let size = right_angle_box_size(triangle);
    if size > 0 {
        let (x, y) = corners.right_angle;
        let rect = Rect::at(x - 1, y - (size as i32 - 1)).of_size(size, size);
        draw_hollow_rect_mut(&mut image, rect, BACKGROUND_COLOR);
    }

    image
}

/// Composites the side labels into a buffer `LABEL_MARGIN` larger than the
/// shape on each axis. The angle labels are not placed.
pub fn compose_labels(labels: &Labels, shape_size: (u32, u32)) -> RgbaImage {
    let (width, height) = overlay_size(shape_size);
    let mut overlay = RgbaImage::from_pixel(width, height, TRANSPARENT);
    let (width, height) = (i64::from(width), i64::from(height));
    let centered = |label: &RgbaImage| width / 2 - i64::from(label.width()) / 2;

    imageops::overlay(&mut overlay, &labels.opposite, 0, height / 2);
    imageops::overlay(
        &mut overlay,
        &labels.adjacent,
        centered(&labels.adjacent),
        height - ADJACENT_LABEL_RISE,
    );
    imageops::overlay(
        &mut overlay,
        &labels.hypotenuse,
        centered(&labels.hypotenuse),
        (height as f64 / HYPOTENUSE_LABEL_DIVISOR) as i64,
    );

    overlay
}

/// Side length of the square drawn in the 90 degree corner.
pub fn right_angle_box_size(triangle: &Triangle) -> u32 {
    let frame = Frame::of(triangle);
    (frame.height / RIGHT_ANGLE_BOX_DIVISOR)
        .min(frame.width / RIGHT_ANGLE_BOX_DIVISOR)
        .min(RIGHT_ANGLE_BOX_MAX) as u32
}

pub fn image_size(triangle: &Triangle) -> (u32, u32) {
    let (width, height) = Frame::of(triangle).extents();
    (width.max(1) as u32, height.max(1) as u32)
}

pub fn overlay_size((width, height): (u32, u32)) -> (u32, u32) {
    (width + LABEL_MARGIN, height + LABEL_MARGIN)
}

/// Top-left position that centers an image of `size` on `canvas`.
pub fn centered_origin(canvas: (u32, u32), size: (u32, u32)) -> (f32, f32) {
    (
        canvas.0 as f32 / 2.0 - size.0 as f32 / 2.0,
        canvas.1 as f32 / 2.0 - size.1 as f32 / 2.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stands in for a font: a solid block sized by the string length.
    struct BlockText;

    impl TextRasterizer for BlockText {
        fn render_text(&self, value: &str, color: Rgba<u8>) -> RgbaImage {
            RgbaImage::from_pixel(value.len() as u32 * 8, 16, color)
        }
    }

    fn isosceles() -> Triangle {
        Triangle::solve(Some(400.0), Some(400.0), None).unwrap()
    }

    #[test]
    fn image_sizes_follow_legs() {
        let triangle = Triangle::solve(Some(300.0), None, Some(500.0)).unwrap();
        let rendered = render(&triangle, &BlockText);
        assert_eq!(rendered.shape_image.dimensions(), (400, 300));
        assert_eq!(rendered.label_overlay.dimensions(), (475, 375));
    }

    #[test]
    fn render_is_deterministic() {
        let triangle = isosceles();
        let first = render(&triangle, &BlockText);
        let second = render(&triangle, &BlockText);
        assert_eq!(first.shape_image.as_raw(), second.shape_image.as_raw());
        assert_eq!(first.label_overlay.as_raw(), second.label_overlay.as_raw());
    }

    #[test]
    fn fill_covers_triangle_interior_only() {
        let shape = draw_shape(&isosceles());
        assert_eq!(*shape.get_pixel(100, 300), BODY_COLOR);
        assert_eq!(*shape.get_pixel(300, 100), TRANSPARENT);
    }

    #[test]
    fn right_angle_box_is_outlined() {
        let shape = draw_shape(&isosceles());
        // 30px box in the bottom-left corner, offset one pixel left.
        assert_eq!(*shape.get_pixel(28, 390), BACKGROUND_COLOR);
        assert_eq!(*shape.get_pixel(10, 371), BACKGROUND_COLOR);
        assert_eq!(*shape.get_pixel(10, 390), BODY_COLOR);
    }

    #[test]
    fn right_angle_box_is_capped() {
        assert_eq!(right_angle_box_size(&isosceles()), 30);
        let small = Triangle::solve(Some(45.0), Some(90.0), None).unwrap();
        assert_eq!(right_angle_box_size(&small), 10);
        let tiny = Triangle::solve(Some(2.0), Some(3.0), None).unwrap();
        assert_eq!(right_angle_box_size(&tiny), 0);
        draw_shape(&tiny);
    }

    #[test]
    fn side_labels_are_composited() {
        let triangle = isosceles();
        let rendered = render(&triangle, &BlockText);
        let overlay = &rendered.label_overlay;
        // Opposite label "400" at the left edge, halfway down.
        assert_eq!(*overlay.get_pixel(0, 237), LABEL_COLOR);
        // Adjacent label centered, 35 above the bottom.
        assert_eq!(*overlay.get_pixel(237, 440), LABEL_COLOR);
        // Hypotenuse label "565.69" centered at height / 2.5.
        assert_eq!(*overlay.get_pixel(237, 190), LABEL_COLOR);
        assert_eq!(*overlay.get_pixel(400, 20), TRANSPARENT);
    }

    #[test]
    fn angle_labels_are_built() {
        let rendered = render(&isosceles(), &BlockText);
        assert_eq!(rendered.labels.adjacent_angle.width(), "45".len() as u32 * 8);
        assert_eq!(rendered.labels.opposite_angle.width(), "45".len() as u32 * 8);
    }

    #[test]
    fn sub_pixel_legs_render_without_fill() {
        let thin = Triangle::solve(Some(400.0), Some(0.5), None).unwrap();
        assert!(Frame::of(&thin).is_degenerate());
        let rendered = render(&thin, &BlockText);
        assert_eq!(rendered.shape_image.dimensions(), (1, 400));
        assert!(rendered.shape_image.pixels().all(|pixel| *pixel != BODY_COLOR));

        let speck = Triangle::solve(Some(0.5), Some(0.5), None).unwrap();
        let rendered = render(&speck, &BlockText);
        assert_eq!(rendered.shape_image.dimensions(), (1, 1));
        assert_eq!(rendered.label_overlay.dimensions(), (76, 76));
    }

    #[test]
    fn oversized_triangles_are_scaled_to_fit() {
        let huge = Triangle::solve(Some(1_000_000.0), Some(1_000_000.0), None).unwrap();
        let rendered = render(&huge, &BlockText);
        assert_eq!(rendered.shape_image.dimensions(), (4096, 4096));
        assert_eq!(rendered.label_overlay.dimensions(), (4171, 4171));
        assert_eq!(right_angle_box_size(&huge), 30);
        assert_eq!(*rendered.shape_image.get_pixel(1000, 3000), BODY_COLOR);
        // Labels still carry the true length.
        assert_eq!(rendered.labels.opposite.width(), "1000000".len() as u32 * 8);

        let long = Triangle::solve(Some(10_000.0), Some(20_000.0), None).unwrap();
        assert_eq!(image_size(&long), (4096, 2048));
    }

    #[test]
    fn angle_labels_hide_float_noise() {
        let triangle = Triangle::solve(Some(733.3), Some(12.7), None).unwrap();
        let labels = Labels::new(&triangle, &BlockText);
        // 90 - 89.01 is stored as 0.98999..., shown as "0.99".
        assert_eq!(labels.adjacent_angle.width(), "0.99".len() as u32 * 8);
    }

    #[test]
    fn embedded_font_draws_text() {
        let font = LabelFont::embedded(16.0).unwrap();
        let label = font.render_text("565.69", LABEL_COLOR);
        assert!(label.width() > 16 && label.height() > 4);
        assert!(label.pixels().any(|pixel| pixel.0[3] > 0));
    }

    #[test]
    fn centering() {
        assert_eq!(centered_origin((1200, 800), (400, 400)), (400.0, 200.0));
        assert_eq!(centered_origin((1200, 800), (475, 475)), (362.5, 162.5));
    }
}
