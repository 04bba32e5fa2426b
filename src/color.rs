use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Categorical palette
// ---------------------------------------------------------------------------

/// `n` visually distinct colours with evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n).map(|i| hue_color(i as f32 / n as f32)).collect()
}

fn hue_color(fraction: f32) -> Color32 {
    let hsl = Hsl::new(fraction * 360.0, 0.65, 0.55);
    let rgb: Srgb = hsl.into_color();
    to_color32(rgb)
}

fn to_color32(rgb: Srgb) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

// ---------------------------------------------------------------------------
// Diverging scale for correlations
// ---------------------------------------------------------------------------

const COOL: (f32, f32, f32) = (0.230, 0.299, 0.754);
const NEUTRAL: (f32, f32, f32) = (0.865, 0.865, 0.865);
const WARM: (f32, f32, f32) = (0.706, 0.016, 0.150);

fn linear(c: (f32, f32, f32)) -> LinSrgb {
    Srgb::new(c.0, c.1, c.2).into_linear()
}

/// Blue → grey → red for a value in `[-1, 1]`; `None` is drawn grey-dark.
pub fn coolwarm(value: Option<f64>) -> Color32 {
    let Some(v) = value else {
        return Color32::DARK_GRAY;
    };
    let v = v.clamp(-1.0, 1.0) as f32;
    let mixed = if v < 0.0 {
        linear(NEUTRAL).mix(linear(COOL), -v)
    } else {
        linear(NEUTRAL).mix(linear(WARM), v)
    };
    to_color32(Srgb::from_linear(mixed))
}

/// Annotation colour readable on top of [`coolwarm`].
pub fn annotation_color(value: Option<f64>) -> Color32 {
    match value {
        Some(v) if v.abs() > 0.6 => Color32::WHITE,
        _ => Color32::BLACK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let p = generate_palette(4);
        assert_eq!(p.len(), 4);
        assert_ne!(p[0], p[2]);
    }

    #[test]
    fn coolwarm_ends() {
        let cold = coolwarm(Some(-1.0));
        let hot = coolwarm(Some(1.0));
        assert!(cold.b() > cold.r());
        assert!(hot.r() > hot.b());
        assert_eq!(coolwarm(None), Color32::DARK_GRAY);
        assert_eq!(coolwarm(Some(5.0)), hot);
    }
}
