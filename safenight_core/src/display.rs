//! Text formatting for BAC estimates.

/// Format BAC with three decimals, e.g. `0.045%`
pub fn format_bac(bac: f64) -> String {
    format!("{:.3}%", bac)
}

/// Format minutes until sober: `Sober`, `45 min`, `2h`, `2h 5m`
pub fn format_time_to_sober(minutes: u32) -> String {
    if minutes == 0 {
        return "Sober".to_string();
    }
    if minutes < 60 {
        return format!("{} min", minutes);
    }

    let hours = minutes / 60;
    let remaining = minutes % 60;

    if remaining == 0 {
        format!("{}h", hours)
    } else {
        format!("{}h {}m", hours, remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bac() {
        assert_eq!(format_bac(0.0), "0.000%");
        assert_eq!(format_bac(0.040084), "0.040%");
        assert_eq!(format_bac(0.1257), "0.126%");
    }

    #[test]
    fn test_format_time_to_sober() {
        assert_eq!(format_time_to_sober(0), "Sober");
        assert_eq!(format_time_to_sober(45), "45 min");
        assert_eq!(format_time_to_sober(59), "59 min");
        assert_eq!(format_time_to_sober(120), "2h");
        assert_eq!(format_time_to_sober(125), "2h 5m");
        assert_eq!(format_time_to_sober(400), "6h 40m");
    }
}
