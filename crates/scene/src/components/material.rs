#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Blending {
    #[default]
    Normal,
    Additive,
}

/// Which faces of a closed mesh are drawn.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Side {
    #[default]
    Front,
    Back,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Surface {
    /// Samples the globe texture.
    Globe,
    /// Fresnel glow around the globe.
    Atmosphere,
    Solid { color: [f32; 3] },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    pub surface: Surface,
    pub opacity: f32,
    pub blending: Blending,
    pub side: Side,
}

impl Material {
    pub fn solid(color: [f32; 3]) -> Self {
        Self {
            surface: Surface::Solid { color },
            opacity: 1.0,
            blending: Blending::Normal,
            side: Side::Front,
        }
    }

    pub fn globe() -> Self {
        Self {
            surface: Surface::Globe,
            ..Self::solid([1.0, 1.0, 1.0])
        }
    }

    pub fn atmosphere() -> Self {
        Self {
            surface: Surface::Atmosphere,
            opacity: 1.0,
            blending: Blending::Additive,
            side: Side::Back,
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0 || self.blending == Blending::Additive
    }
}

/// Parse `#rrggbb` into linear-ish `[0, 1]` components.
pub fn parse_hex_color(s: &str) -> Option<[f32; 3]> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| {
        u8::from_str_radix(hex.get(i..i + 2)?, 16)
            .ok()
            .map(|v| v as f32 / 255.0)
    };
    Some([channel(0)?, channel(2)?, channel(4)?])
}
