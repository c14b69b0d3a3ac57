use image::{Rgba, RgbaImage};

use crate::{
    flow::flow_type::{Image, Value},
    nodes::node_description::ComputeError,
};

const DEFAULT_SEPIA_INTENSITY: i32 = 20;
const SEPIA_DEPTH: i32 = 20;

fn source_image(inputs: &[Value]) -> Result<&Image, ComputeError> {
    inputs
        .iter()
        .find_map(Value::as_image)
        .ok_or(ComputeError::MissingInput("Image"))
}

fn map_pixels(source: &Image, f: impl Fn(Rgba<u8>) -> Rgba<u8>) -> Image {
    let mut out = RgbaImage::new(source.width(), source.height());
    for (dst, src) in out.pixels_mut().zip(source.pixels().pixels()) {
        *dst = f(*src);
    }
    Image::new(out)
}

/// Scales the HSV value of every pixel by `factor`, saturating at full
/// brightness. Hue and saturation are preserved.
pub fn scale_brightness(source: &Image, factor: f32) -> Image {
    let factor = factor.max(0.0);
    map_pixels(source, |Rgba([r, g, b, a])| {
        let max = r.max(g).max(b) as f32;
        if max == 0.0 {
            return Rgba([r, g, b, a]);
        }
        let scale = (max * factor).min(255.0) / max;
        let channel = |c: u8| (c as f32 * scale).round().min(255.0) as u8;
        Rgba([channel(r), channel(g), channel(b), a])
    })
}

pub fn sepia(source: &Image, intensity: i32) -> Image {
    map_pixels(source, |Rgba([r, g, b, a])| {
        let grey = (r as i32 + g as i32 + b as i32) / 3;
        let r = (grey + SEPIA_DEPTH * 2).min(255);
        let g = (grey + SEPIA_DEPTH).min(255);
        let b = grey.saturating_sub(intensity).clamp(0, 255);
        Rgba([r as u8, g as u8, b as u8, a])
    })
}

pub fn invert(source: &Image) -> Image {
    map_pixels(source, |Rgba([r, g, b, a])| Rgba([255 - r, 255 - g, 255 - b, a]))
}

pub fn brightness(_content: &[Value], inputs: &[Value]) -> Result<Value, ComputeError> {
    let source = source_image(inputs)?;
    let factor = inputs.iter().find_map(Value::as_real).unwrap_or(1.0);
    if !factor.is_finite() {
        return Err(ComputeError::InvalidContent(format!(
            "brightness factor {} is not finite",
            factor
        )));
    }
    Ok(Value::Image(scale_brightness(source, factor)))
}

pub fn sepia_filter(_content: &[Value], inputs: &[Value]) -> Result<Value, ComputeError> {
    let source = source_image(inputs)?;
    let intensity = inputs
        .iter()
        .find_map(Value::as_int)
        .unwrap_or(DEFAULT_SEPIA_INTENSITY);
    Ok(Value::Image(sepia(source, intensity)))
}

pub fn invert_filter(_content: &[Value], inputs: &[Value]) -> Result<Value, ComputeError> {
    Ok(Value::Image(invert(source_image(inputs)?)))
}
