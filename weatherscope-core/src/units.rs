//! Temperature and humidity conversions.
//!
//! Results are not clamped: relative humidity may exceed 100 when a provider's
//! dew point reads slightly above its temperature.

pub fn fahrenheit_to_celsius(temp_f: f64) -> f64 {
    (temp_f - 32.0) * 5.0 / 9.0
}

/// Saturation vapor pressure in millibars (Magnus form) for a temperature in Celsius.
pub fn saturation_vapor_pressure(temp_c: f64) -> f64 {
    6.11 * 10f64.powf(7.5 * temp_c / (237.7 + temp_c))
}

/// Relative humidity, in percent, from a dew point and air temperature (both Fahrenheit).
pub fn relative_humidity_from_dew_point(dew_point_f: f64, temp_f: f64) -> f64 {
    saturation_vapor_pressure(fahrenheit_to_celsius(dew_point_f))
        / saturation_vapor_pressure(fahrenheit_to_celsius(temp_f))
        * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn freezing_and_boiling_points() {
        assert!(approx(fahrenheit_to_celsius(32.0), 0.0, 1e-12));
        assert!(approx(fahrenheit_to_celsius(212.0), 100.0, 1e-12));
        assert!(approx(fahrenheit_to_celsius(-40.0), -40.0, 1e-12));
    }

    #[test]
    fn vapor_pressure_at_zero_celsius() {
        assert!(approx(saturation_vapor_pressure(0.0), 6.11, 1e-12));
    }

    #[test]
    fn dew_point_equal_to_temperature_is_saturation() {
        for t in [-40.0, 0.0, 14.02, 43.11, 72.5, 104.0] {
            assert!(
                approx(relative_humidity_from_dew_point(t, t), 100.0, 1e-9),
                "t = {t}"
            );
        }
    }

    #[test]
    fn dry_winter_sample() {
        // dew point 14.02°F at 43.11°F
        let rh = relative_humidity_from_dew_point(14.02, 43.11);
        assert!(approx(rh, 30.0, 1.5), "rh = {rh}");
    }

    #[test]
    fn dew_point_above_temperature_is_not_clamped() {
        assert!(relative_humidity_from_dew_point(51.0, 50.0) > 100.0);
    }
}
