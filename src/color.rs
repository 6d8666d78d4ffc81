/// An 8-bit-per-channel RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

pub const BLACK: Rgb = Rgb::new(0, 0, 0);

/// Hue cycle shared by both animations. Order matters and wraps.
pub const PALETTE: [Rgb; 6] = [
    Rgb::new(255, 0, 0),
    Rgb::new(255, 255, 0),
    Rgb::new(0, 255, 0),
    Rgb::new(0, 255, 255),
    Rgb::new(0, 0, 255),
    Rgb::new(255, 0, 255),
];

/// Palette entry at `index`, wrapping around the palette length.
pub const fn palette_color(index: usize) -> Rgb {
    PALETTE[index % PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_wraps_with_period_six() {
        for i in 0..24 {
            assert_eq!(palette_color(i), palette_color(i + 6));
        }
        assert_eq!(palette_color(6), Rgb::new(255, 0, 0));
    }

    #[test]
    fn palette_has_no_black() {
        assert!(PALETTE.iter().all(|c| *c != BLACK));
    }
}
