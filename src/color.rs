use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

use crate::data::model::OTHER_PROVINCE;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.5);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

fn to_color32(rgb: Srgb) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

// ---------------------------------------------------------------------------
// Province colours
// ---------------------------------------------------------------------------

/// Maps province names to distinct colours; "Other" is always grey.
#[derive(Debug, Clone, Default)]
pub struct ProvinceColors {
    mapping: BTreeMap<String, Color32>,
}

impl ProvinceColors {
    pub fn new(provinces: &[String]) -> Self {
        let named: Vec<&String> = provinces.iter().filter(|p| *p != OTHER_PROVINCE).collect();
        let palette = generate_palette(named.len());
        let mapping = named
            .into_iter()
            .zip(palette)
            .map(|(p, c)| (p.clone(), c))
            .collect();
        ProvinceColors { mapping }
    }

    pub fn color_for(&self, province: &str) -> Color32 {
        self.mapping.get(province).copied().unwrap_or(Color32::GRAY)
    }
}

// ---------------------------------------------------------------------------
// Magnitude ramp
// ---------------------------------------------------------------------------

/// Orange-to-red stops, light to dark.
const OR_RD: [(u8, u8, u8); 5] = [
    (0xfd, 0xd4, 0x9e),
    (0xfc, 0x8d, 0x59),
    (0xef, 0x65, 0x48),
    (0xd7, 0x30, 0x1f),
    (0x7f, 0x00, 0x00),
];

/// Colour for `value` on an orange-red ramp spanning `[lo, hi]`.
pub fn magnitude_color(value: f64, lo: f64, hi: f64) -> Color32 {
    if !value.is_finite() {
        return Color32::GRAY;
    }
    let t = if hi > lo {
        ((value - lo) / (hi - lo)).clamp(0.0, 1.0) as f32
    } else {
        1.0
    };

    let scaled = t * (OR_RD.len() - 1) as f32;
    let i = (scaled.floor() as usize).min(OR_RD.len() - 2);
    let frac = scaled - i as f32;

    let stop = |(r, g, b): (u8, u8, u8)| -> LinSrgb {
        Srgb::new(r, g, b).into_format::<f32>().into_linear()
    };
    let mixed = stop(OR_RD[i]).mix(stop(OR_RD[i + 1]), frac);
    to_color32(Srgb::from_linear(mixed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_is_distinct() {
        let colors = generate_palette(6);
        assert_eq!(colors.len(), 6);
        for (i, a) in colors.iter().enumerate() {
            assert!(colors[i + 1..].iter().all(|b| a != b));
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn other_province_is_grey() {
        let colors = ProvinceColors::new(&["Bali".to_string(), OTHER_PROVINCE.to_string()]);
        assert_eq!(colors.color_for(OTHER_PROVINCE), Color32::GRAY);
        assert_ne!(colors.color_for("Bali"), Color32::GRAY);
    }

    #[test]
    fn ramp_endpoints() {
        assert_eq!(magnitude_color(3.0, 3.0, 7.0), Color32::from_rgb(0xfd, 0xd4, 0x9e));
        assert_eq!(magnitude_color(7.0, 3.0, 7.0), Color32::from_rgb(0x7f, 0x00, 0x00));
        assert_eq!(magnitude_color(99.0, 3.0, 7.0), Color32::from_rgb(0x7f, 0x00, 0x00));
        assert_eq!(magnitude_color(f64::NAN, 3.0, 7.0), Color32::GRAY);
    }
}
