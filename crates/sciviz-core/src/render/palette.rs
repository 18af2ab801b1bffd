//! Colours and continuous colour maps.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const SKY_BLUE: Rgb = Rgb(135, 206, 235);
pub const BLUE: Rgb = Rgb(31, 119, 180);
pub const ORANGE: Rgb = Rgb(255, 127, 14);
pub const RED: Rgb = Rgb(214, 39, 40);
pub const PURE_RED: Rgb = Rgb(255, 0, 0);
pub const PURE_BLUE: Rgb = Rgb(0, 0, 255);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Palette {
    Viridis,
    Blues,
    Reds,
    /// Diverging, blue for positive and red for negative values.
    SeismicReversed,
}

const VIRIDIS: &[Rgb] = &[
    Rgb(68, 1, 84),
    Rgb(59, 82, 139),
    Rgb(33, 145, 140),
    Rgb(94, 201, 98),
    Rgb(253, 231, 37),
];
const BLUES: &[Rgb] = &[Rgb(247, 251, 255), Rgb(107, 174, 214), Rgb(8, 48, 107)];
const REDS: &[Rgb] = &[Rgb(255, 245, 240), Rgb(251, 106, 74), Rgb(103, 0, 13)];
const SEISMIC_R: &[Rgb] = &[
    Rgb(127, 0, 0),
    Rgb(255, 0, 0),
    Rgb(255, 255, 255),
    Rgb(0, 0, 255),
    Rgb(0, 0, 76),
];

impl Palette {
    fn stops(self) -> &'static [Rgb] {
        match self {
            Palette::Viridis => VIRIDIS,
            Palette::Blues => BLUES,
            Palette::Reds => REDS,
            Palette::SeismicReversed => SEISMIC_R,
        }
    }

    /// Colour for `t` in [0, 1]; values outside are clamped, NaN maps to 0.
    pub fn at(self, t: f64) -> Rgb {
        let stops = self.stops();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let scaled = t * (stops.len() - 1) as f64;
        let lo = (scaled.floor() as usize).min(stops.len() - 1);
        let hi = (lo + 1).min(stops.len() - 1);
        let frac = scaled - lo as f64;
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        let (a, b) = (stops[lo], stops[hi]);
        Rgb(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
    }

    /// Colour for `value` normalized into `[lo, hi]`. Diverging palettes
    /// centre on zero.
    pub fn map(self, value: f64, lo: f64, hi: f64) -> Rgb {
        let (lo, hi) = match self {
            Palette::SeismicReversed => {
                let bound = lo.abs().max(hi.abs());
                (-bound, bound)
            }
            _ => (lo, hi),
        };
        let span = hi - lo;
        if span <= 0.0 || !span.is_finite() {
            return self.at(0.5);
        }
        self.at((value - lo) / span)
    }
}
