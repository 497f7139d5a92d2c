use image::Rgb;

/// Lower end of the colour scale.
pub const NDMI_MIN: f64 = -1.;
/// Upper end of the colour scale.
pub const NDMI_MAX: f64 = 1.;

/// A colour stop: position in [0, 1] mapped to an RGB colour.
#[derive(Debug, Clone, Copy)]
struct ColorStop {
    t: f64,
    color: [u8; 3],
}

impl ColorStop {
    const fn new(t: f64, r: u8, g: u8, b: u8) -> Self {
        Self {
            t,
            color: [r, g, b],
        }
    }
}

/// ColorBrewer RdYlGn, dry (red) to wet (green).
const RDYLGN_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 0xa5, 0x00, 0x26),
    ColorStop::new(0.1, 0xd7, 0x30, 0x27),
    ColorStop::new(0.2, 0xf4, 0x6d, 0x43),
    ColorStop::new(0.3, 0xfd, 0xae, 0x61),
    ColorStop::new(0.4, 0xfe, 0xe0, 0x8b),
    ColorStop::new(0.5, 0xff, 0xff, 0xbf),
    ColorStop::new(0.6, 0xd9, 0xef, 0x8b),
    ColorStop::new(0.7, 0xa6, 0xd9, 0x6a),
    ColorStop::new(0.8, 0x66, 0xbd, 0x63),
    ColorStop::new(0.9, 0x1a, 0x98, 0x50),
    ColorStop::new(1.0, 0x00, 0x68, 0x37),
];

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8
}

fn multi_stop(stops: &[ColorStop], t: f64) -> Rgb<u8> {
    let (first, last) = (stops[0], stops[stops.len() - 1]);
    if t <= first.t {
        return Rgb(first.color);
    }
    if t >= last.t {
        return Rgb(last.color);
    }
    for (lower, upper) in stops.iter().zip(&stops[1..]) {
        if t <= upper.t {
            let ratio = (t - lower.t) / (upper.t - lower.t);
            return Rgb([0, 1, 2].map(|channel| lerp(lower.color[channel], upper.color[channel], ratio)));
        }
    }
    Rgb(last.color)
}

/// RdYlGn evaluated at normalized position `t` in [0, 1], clamped.
pub fn rdylgn(t: f64) -> Rgb<u8> {
    multi_stop(RDYLGN_STOPS, t)
}

/// Colour of an index value on the fixed [-1, 1] scale, `None` for NaN.
pub fn ndmi_color(value: f64) -> Option<Rgb<u8>> {
    if value.is_nan() {
        return None;
    }
    Some(rdylgn((value - NDMI_MIN) / (NDMI_MAX - NDMI_MIN)))
}
