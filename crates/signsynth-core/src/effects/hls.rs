//! RGB <-> HLS conversion for lightness-only edits.
//!
//! Hue is in degrees `[0, 360)`, lightness on the 8-bit `0..=255` scale and
//! saturation in `[0, 1]`. Lightness is `(max + min) / 2` of the RGB
//! channels, so a weather effect can scale it without touching hue or
//! saturation.

/// A colour in hue/lightness/saturation form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hls {
    pub hue: f32,
    pub lightness: f32,
    pub saturation: f32,
}

/// Lightness of an 8-bit RGB triple on the `0..=255` scale.
#[inline]
pub fn lightness(rgb: [u8; 3]) -> f32 {
    let max = rgb[0].max(rgb[1]).max(rgb[2]) as f32;
    let min = rgb[0].min(rgb[1]).min(rgb[2]) as f32;
    (max + min) / 2.0
}

/// Convert an 8-bit RGB triple to HLS.
pub fn rgb_to_hls(rgb: [u8; 3]) -> Hls {
    let r = rgb[0] as f32 / 255.0;
    let g = rgb[1] as f32 / 255.0;
    let b = rgb[2] as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return Hls {
            hue: 0.0,
            lightness: l * 255.0,
            saturation: 0.0,
        };
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    Hls {
        hue: h * 60.0,
        lightness: l * 255.0,
        saturation: s,
    }
}

/// Convert HLS back to an 8-bit RGB triple, clamping lightness and
/// saturation into range first.
pub fn hls_to_rgb(hls: Hls) -> [u8; 3] {
    let l = (hls.lightness / 255.0).clamp(0.0, 1.0);
    let s = hls.saturation.clamp(0.0, 1.0);

    if s == 0.0 {
        let v = to_u8(l);
        return [v, v, v];
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let h = hls.hue.rem_euclid(360.0) / 360.0;

    [
        to_u8(hue_to_channel(p, q, h + 1.0 / 3.0)),
        to_u8(hue_to_channel(p, q, h)),
        to_u8(hue_to_channel(p, q, h - 1.0 / 3.0)),
    ]
}

/// Apply `f` to the lightness of an RGB triple.
#[inline]
pub fn map_lightness(rgb: [u8; 3], f: impl FnOnce(f32) -> f32) -> [u8; 3] {
    let mut hls = rgb_to_hls(rgb);
    hls.lightness = f(hls.lightness).clamp(0.0, 255.0);
    hls_to_rgb(hls)
}

#[inline]
fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v * 255.0).clamp(0.0, 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_has_no_saturation() {
        let hls = rgb_to_hls([100, 100, 100]);
        assert_eq!(hls.saturation, 0.0);
        assert!((hls.lightness - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_primary_hues() {
        assert!((rgb_to_hls([255, 0, 0]).hue - 0.0).abs() < 1e-3);
        assert!((rgb_to_hls([0, 255, 0]).hue - 120.0).abs() < 1e-3);
        assert!((rgb_to_hls([0, 0, 255]).hue - 240.0).abs() < 1e-3);
    }

    #[test]
    fn test_lightness_matches_hls() {
        for rgb in [[12, 200, 99], [255, 255, 0], [3, 4, 5], [250, 10, 128]] {
            assert!((lightness(rgb) - rgb_to_hls(rgb).lightness).abs() < 1e-3);
        }
    }

    #[test]
    fn test_roundtrip_is_exact() {
        for r in (0..=255).step_by(15) {
            for g in (0..=255).step_by(17) {
                for b in (0..=255).step_by(51) {
                    let rgb = [r as u8, g as u8, b as u8];
                    assert_eq!(hls_to_rgb(rgb_to_hls(rgb)), rgb, "roundtrip of {:?}", rgb);
                }
            }
        }
    }

    #[test]
    fn test_map_lightness_identity() {
        let rgb = [40, 90, 200];
        assert_eq!(map_lightness(rgb, |l| l), rgb);
    }

    #[test]
    fn test_map_lightness_clamps() {
        assert_eq!(map_lightness([200, 200, 200], |l| l * 10.0), [255, 255, 255]);
        assert_eq!(map_lightness([200, 10, 10], |_| 0.0), [0, 0, 0]);
    }
}
