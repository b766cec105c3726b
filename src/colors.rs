use image::Rgb;
use palette::{FromColor, Hsl, Srgb};

/// Generates `n` evenly spaced hues, one per sequence position.
pub(crate) fn sequence_colors(n: usize, saturation: f32, lightness: f32) -> Vec<Rgb<u8>> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 * 360.0) / n as f32;
            let hsl = Hsl::new(hue, saturation, lightness);
            let srgb: Srgb<u8> = Srgb::<f32>::from_color(hsl).into_format();
            Rgb([srgb.red, srgb.green, srgb.blue])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_colors_works() {
        assert!(sequence_colors(0, 0.9, 0.5).is_empty());
        assert_eq!(sequence_colors(1, 0.9, 0.5), vec![Rgb([242, 13, 13])]);
        assert_eq!(
            sequence_colors(2, 0.9, 0.5),
            vec![Rgb([242, 13, 13]), Rgb([13, 242, 242])]
        );
        assert_eq!(
            sequence_colors(3, 0.9, 0.5),
            vec![Rgb([242, 13, 13]), Rgb([13, 242, 13]), Rgb([13, 13, 242])]
        );
    }

    #[test]
    fn sequence_colors_follow_lightness() {
        assert_eq!(sequence_colors(1, 0.0, 1.0), vec![Rgb([255, 255, 255])]);
        assert_eq!(sequence_colors(1, 0.9, 0.0), vec![Rgb([0, 0, 0])]);
    }

    #[test]
    fn sequence_colors_are_distinct() {
        let colors = sequence_colors(12, 0.9, 0.5);
        for (i, a) in colors.iter().enumerate() {
            assert!(colors[i + 1..].iter().all(|b| b != a), "repeated color {a:?}");
        }
    }
}
