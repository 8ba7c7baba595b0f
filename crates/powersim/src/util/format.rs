/// Format a probability as a percentage
pub fn format_percentage(value: f64) -> String {
    if value.is_nan() {
        return "n/a".to_string();
    }
    format!("{:.2}%", value * 100.0)
}

/// Format a probability with a ± Monte Carlo standard error
pub fn format_power(power: f64, standard_error: f64) -> String {
    format!(
        "{} ± {}",
        format_percentage(power),
        format_percentage(standard_error)
    )
}

/// Format an elapsed duration compactly (e.g., 850ms, 12.4s, 3m05s)
pub fn format_duration(duration: std::time::Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1_000 {
        format!("{millis}ms")
    } else if millis < 60_000 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(0.8), "80.00%");
        assert_eq!(format_percentage(0.05123), "5.12%");
        assert_eq!(format_percentage(1.0), "100.00%");
        assert_eq!(format_percentage(f64::NAN), "n/a");
    }

    #[test]
    fn test_format_power() {
        assert_eq!(format_power(0.86, 0.0035), "86.00% ± 0.35%");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(850)), "850ms");
        assert_eq!(format_duration(Duration::from_millis(12_400)), "12.4s");
        assert_eq!(format_duration(Duration::from_secs(185)), "3m05s");
    }
}
