use serde::{Deserialize, Serialize};

/// Display colour; alpha is a global render setting, not per block.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED_ORANGE: Color = Color::rgb(255, 83, 73);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<[u8; 3]> for Color {
    fn from(v: [u8; 3]) -> Self {
        Color::rgb(v[0], v[1], v[2])
    }
}

impl From<Color> for [u8; 3] {
    fn from(c: Color) -> Self {
        [c.r, c.g, c.b]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        color: Color,
    }

    #[test]
    fn parses_from_rgb_array() {
        let h: Holder = toml::from_str("color = [33, 244, 255]").unwrap();
        assert_eq!(h.color, Color::rgb(33, 244, 255));
    }
}
