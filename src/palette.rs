/// Slice colors, repeated around the wheel.
const WHEEL_PALETTE: [&str; 12] = [
    "#FF6B7A", "#FFFFFF", "#89B5F5", "#F4AF5A", "#89B5F5", "#FF6B7A", "#FFFFFF", "#FF6B7A",
    "#F4AF5A", "#89B5F5", "#FFFFFF", "#FF6B7A",
];

pub fn slice_color(index: usize) -> &'static str {
    WHEEL_PALETTE[index % WHEEL_PALETTE.len()]
}

/// `#RRGGBB` to components; anything else is rejected.
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Label color readable on top of a slice color.
pub fn label_color(slice: &str) -> &'static str {
    match slice {
        "#FFFFFF" => "#E74C3C",
        "#89B5F5" => "#2E5090",
        _ => "#FFFFFF",
    }
}
