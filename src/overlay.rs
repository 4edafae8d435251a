//! Drawing of detected hands onto an image.

use std::convert::Infallible;

use embedded_graphics::{
    draw_target::DrawTarget,
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Rectangle},
};
use image::{Rgb, RgbImage};

use crate::hand::CONNECTIVITY;
use crate::landmark::{Hand, Landmark};

/// Styling of the hand overlay.
#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub connector_color: Rgb888,
    pub connector_width: u32,
    pub landmark_color: Rgb888,
    /// Diameter of the dot drawn on each landmark.
    pub landmark_size: u32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            connector_color: Rgb888::GREEN,
            connector_width: 5,
            landmark_color: Rgb888::RED,
            landmark_size: 5,
        }
    }
}

/// Draws the skeleton of every hand in `hands` onto `image`.
///
/// Landmarks are normalized, so they are scaled by the image dimensions. Anything outside the
/// image is clipped, and landmarks more than one image size away are pulled in to that distance.
pub fn draw_hands<'a>(image: &mut RgbImage, hands: impl IntoIterator<Item = &'a Hand>, style: &Style) {
    let mut target = Target(image);
    for hand in hands {
        draw_hand(&mut target, hand, style);
    }
}

fn draw_hand(target: &mut Target<'_>, hand: &Hand, style: &Style) {
    let size = target.bounding_box().size;
    // Anything outside the image is clipped, but far-away points overflow the line rasterizer.
    let to_point = |lm: &Landmark| {
        Point::new(
            (lm.x.clamp(-1.0, 2.0) * size.width as f32).round() as i32,
            (lm.y.clamp(-1.0, 2.0) * size.height as f32).round() as i32,
        )
    };

    let connector = PrimitiveStyle::with_stroke(style.connector_color, style.connector_width);
    for (a, b) in CONNECTIVITY {
        match Line::new(to_point(&hand[*a]), to_point(&hand[*b]))
            .into_styled(connector)
            .draw(target)
        {
            Ok(()) => {}
            Err(infallible) => match infallible {},
        }
    }

    let marker = PrimitiveStyle::with_fill(style.landmark_color);
    for (_, lm) in hand.iter() {
        match Circle::with_center(to_point(lm), style.landmark_size)
            .into_styled(marker)
            .draw(target)
        {
            Ok(()) => {}
            Err(infallible) => match infallible {},
        }
    }
}

struct Target<'a>(&'a mut RgbImage);

impl Dimensions for Target<'_> {
    fn bounding_box(&self) -> Rectangle {
        let (width, height) = self.0.dimensions();

        Rectangle {
            top_left: Point { x: 0, y: 0 },
            size: Size { width, height },
        }
    }
}

impl DrawTarget for Target<'_> {
    type Color = Rgb888;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = self.0.dimensions();
        for Pixel(pos, color) in pixels {
            if pos.x >= 0 && (pos.x as u32) < width && pos.y >= 0 && (pos.y as u32) < height {
                self.0.put_pixel(
                    pos.x as u32,
                    pos.y as u32,
                    Rgb([color.r(), color.g(), color.b()]),
                );
            }
        }

        Ok(())
    }
}
