use anyhow::{anyhow, Result};
use glam::Vec3;

/// Converts a packed `0xRRGGBB` value into normalized RGB.
pub fn from_hex(hex: u32) -> Vec3 {
    let r = (hex >> 16) & 0xff;
    let g = (hex >> 8) & 0xff;
    let b = hex & 0xff;
    Vec3::new(r as f32, g as f32, b as f32) / 255.0
}

/// Parses `44aa88`, `#44aa88` or `0x44aa88`.
pub fn parse_hex(text: &str) -> Result<Vec3> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix('#')
        .or_else(|| trimmed.strip_prefix("0x"))
        .unwrap_or(trimmed);
    if digits.len() != 6 {
        return Err(anyhow!("color {text:?} must have six hex digits"));
    }
    let value =
        u32::from_str_radix(digits, 16).map_err(|err| anyhow!("invalid color {text:?}: {err}"))?;
    Ok(from_hex(value))
}

/// Hue, saturation and luminance in [0, 1] to normalized RGB.
pub fn from_hsl(hue: f32, saturation: f32, luminance: f32) -> Vec3 {
    let hue = hue.rem_euclid(1.0);
    let saturation = saturation.clamp(0.0, 1.0);
    let luminance = luminance.clamp(0.0, 1.0);

    if saturation == 0.0 {
        return Vec3::splat(luminance);
    }

    let high = if luminance <= 0.5 {
        luminance * (1.0 + saturation)
    } else {
        luminance + saturation - luminance * saturation
    };
    let low = 2.0 * luminance - high;

    Vec3::new(
        hue_to_channel(low, high, hue + 1.0 / 3.0),
        hue_to_channel(low, high, hue),
        hue_to_channel(low, high, hue - 1.0 / 3.0),
    )
}

fn hue_to_channel(low: f32, high: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        low + (high - low) * 6.0 * t
    } else if t < 0.5 {
        high
    } else if t < 2.0 / 3.0 {
        low + (high - low) * 6.0 * (2.0 / 3.0 - t)
    } else {
        low
    }
}
