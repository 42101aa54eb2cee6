/// Pointing line wire format: 3-digit zero-padded azimuth (clamped
/// 0-360), comma, 2-digit zero-padded elevation magnitude with trailing
/// sign (clamped to +/-90), newline terminated. Angles are truncated,
/// not rounded.
pub fn format_pointing(azimuth_deg: f64, elevation_deg: f64) -> String {
    let azimuth = (azimuth_deg as i32).clamp(0, 360);
    let elevation = (elevation_deg as i32).clamp(-90, 90);
    let sign = if elevation >= 0 { '+' } else { '-' };
    format!("{:03},{:02}{}\n", azimuth, elevation.abs(), sign)
}

#[cfg(test)]
mod tests {
    use super::format_pointing;

    #[test]
    fn formats_truncated_angles() {
        assert_eq!(format_pointing(45.6, -7.2), "045,07-\n");
        assert_eq!(format_pointing(359.9, 89.9), "359,89+\n");
    }

    #[test]
    fn zero_elevation_is_positive() {
        assert_eq!(format_pointing(0.0, 0.0), "000,00+\n");
        assert_eq!(format_pointing(0.0, -0.4), "000,00+\n");
    }

    #[test]
    fn clamps_out_of_range_angles() {
        assert_eq!(format_pointing(400.0, 95.0), "360,90+\n");
        assert_eq!(format_pointing(-10.0, -95.0), "000,90-\n");
    }
}
