//! Height-based vertex colouring.
//!
//! Each scheme is a list of gradient stops; colours between stops are
//! linearly interpolated.

/// Available color schemes for terrain rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorScheme {
    /// Grayscale ramp over the byte range, black at 0 and white at 255
    #[default]
    Monochrome,
    /// Natural terrain colors: blue (water) → green → brown → white (snow)
    Terrain,
    /// Scientific heatmap: blue (low) → cyan → green → yellow → red (high)
    Heatmap,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 3] = [
        ColorScheme::Monochrome,
        ColorScheme::Terrain,
        ColorScheme::Heatmap,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ColorScheme::Monochrome => "Monochrome",
            ColorScheme::Terrain => "Terrain",
            ColorScheme::Heatmap => "Heatmap",
        }
    }

    fn stops(self) -> &'static [(f32, [f32; 3])] {
        match self {
            ColorScheme::Monochrome => &MONOCHROME,
            ColorScheme::Terrain => &TERRAIN,
            ColorScheme::Heatmap => &HEATMAP,
        }
    }
}

const MONOCHROME: [(f32, [f32; 3]); 2] = [(0.0, [0.0, 0.0, 0.0]), (1.0, [1.0, 1.0, 1.0])];

const TERRAIN: [(f32, [f32; 3]); 5] = [
    (0.0, [0.0, 0.0, 0.8]),
    (0.3, [0.0, 0.5, 1.0]),
    (0.5, [0.2, 0.8, 0.4]),
    (0.8, [0.6, 0.4, 0.1]),
    (1.0, [1.0, 1.0, 1.0]),
];

const HEATMAP: [(f32, [f32; 3]); 5] = [
    (0.0, [0.0, 0.0, 1.0]),
    (0.25, [0.0, 1.0, 1.0]),
    (0.5, [0.0, 1.0, 0.0]),
    (0.75, [1.0, 1.0, 0.0]),
    (1.0, [1.0, 0.0, 0.0]),
];

/// Convert normalized height (0.0-1.0) to RGB color based on scheme.
pub fn height_to_color(t: f32, scheme: ColorScheme) -> [f32; 3] {
    let t = t.clamp(0.0, 1.0);
    let stops = scheme.stops();

    for pair in stops.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let s = (t - t0) / (t1 - t0);
            return [
                c0[0] + (c1[0] - c0[0]) * s,
                c0[1] + (c1[1] - c0[1]) * s,
                c0[2] + (c1[2] - c0[2]) * s,
            ];
        }
    }
    stops[stops.len() - 1].1
}
