use std::fmt;

/// Fixed-point currency amount with 2 decimal places, stored in minor units (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Amount(i64);

impl Amount {
    const SCALE: i64 = 100;

    /// Smallest amount accepted before moving to the payment step.
    pub const MINIMUM: Amount = Amount(Self::SCALE);

    pub fn from_float(value: f64) -> Self {
        Amount((value * Self::SCALE as f64).round() as i64)
    }

    pub const fn from_minor_units(value: i64) -> Self {
        Amount(value)
    }

    pub const fn from_major_units(value: i64) -> Self {
        Amount(value * Self::SCALE)
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }

    /// Parse free-form input the way a browser number field is read:
    /// the leading numeric prefix is used and anything unparseable is zero.
    pub fn parse_lenient(input: &str) -> Self {
        let input = input.trim_start();
        let bytes = input.as_bytes();
        let digits = |from: usize| {
            bytes
                .get(from..)
                .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
        };

        let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
        let whole = digits(end);
        end += whole;
        let mut frac = 0;
        if bytes.get(end) == Some(&b'.') {
            frac = digits(end + 1);
            end += 1 + frac;
        }
        if whole + frac == 0 {
            return Amount::default();
        }
        // exponent only counts when digits follow it
        if matches!(bytes.get(end), Some(b'e' | b'E')) {
            let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
            let exponent = digits(end + 1 + sign);
            if exponent > 0 {
                end += 1 + sign + exponent;
            }
        }

        input[..end]
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Self::from_float)
            .unwrap_or_default()
    }

    /// Shortest decimal rendering, without currency symbol (`50`, `12.5`, `0.05`).
    pub fn to_query_value(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / Self::SCALE as u64;
        let frac = abs % Self::SCALE as u64;
        if frac == 0 {
            format!("{sign}{whole}")
        } else if frac % 10 == 0 {
            format!("{sign}{whole}.{}", frac / 10)
        } else {
            format!("{sign}{whole}.{frac:02}")
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / Self::SCALE as u64;
        let frac = abs % Self::SCALE as u64;
        write!(f, "{sign}{whole}.{frac:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_minor_units_preserves_value() {
        assert_eq!(Amount::from_minor_units(5000), Amount(5000));
        assert_eq!(Amount::from_minor_units(5000), Amount::from_major_units(50));
    }

    #[test]
    fn from_float_rounds_to_cents() {
        assert_eq!(Amount::from_float(12.5), Amount::from_minor_units(1250));
        assert_eq!(Amount::from_float(12.346), Amount::from_minor_units(1235));
        assert_eq!(Amount::from_float(0.004), Amount::from_minor_units(0));
    }

    #[test]
    fn display_always_has_two_decimals() {
        assert_eq!(Amount::from_minor_units(5000).to_string(), "50.00");
        assert_eq!(Amount::from_minor_units(1).to_string(), "0.01");
        assert_eq!(Amount::from_minor_units(-250).to_string(), "-2.50");
    }

    #[test]
    fn query_value_is_shortest_form() {
        assert_eq!(Amount::from_major_units(50).to_query_value(), "50");
        assert_eq!(Amount::from_minor_units(1250).to_query_value(), "12.5");
        assert_eq!(Amount::from_minor_units(1205).to_query_value(), "12.05");
        assert_eq!(Amount::from_minor_units(5).to_query_value(), "0.05");
        assert_eq!(Amount::from_minor_units(-150).to_query_value(), "-1.5");
    }

    #[test]
    fn parse_lenient_reads_numbers() {
        assert_eq!(Amount::parse_lenient("75"), Amount::from_major_units(75));
        assert_eq!(Amount::parse_lenient(" 12.50"), Amount::from_minor_units(1250));
        assert_eq!(Amount::parse_lenient(".5"), Amount::from_minor_units(50));
        assert_eq!(Amount::parse_lenient("-3"), Amount::from_major_units(-3));
    }

    #[test]
    fn parse_lenient_uses_leading_prefix() {
        assert_eq!(Amount::parse_lenient("12abc"), Amount::from_major_units(12));
        assert_eq!(Amount::parse_lenient("1.2.3"), Amount::from_minor_units(120));
        assert_eq!(Amount::parse_lenient("5."), Amount::from_major_units(5));
    }

    #[test]
    fn parse_lenient_reads_exponents() {
        assert_eq!(Amount::parse_lenient("1e3"), Amount::from_major_units(1000));
        assert_eq!(Amount::parse_lenient("2.5E-1"), Amount::from_minor_units(25));
        assert_eq!(Amount::parse_lenient("1e+2"), Amount::from_major_units(100));
        // a dangling exponent marker is not part of the number
        assert_eq!(Amount::parse_lenient("7e"), Amount::from_major_units(7));
        assert_eq!(Amount::parse_lenient("7e-x"), Amount::from_major_units(7));
        assert_eq!(Amount::parse_lenient("1e400"), Amount::default());
    }

    #[test]
    fn extreme_values_format_without_overflow() {
        let min = Amount::parse_lenient("-99999999999999999999999");
        assert_eq!(min, Amount::from_minor_units(i64::MIN));
        assert_eq!(min.to_string(), "-92233720368547758.08");
        assert_eq!(min.to_query_value(), "-92233720368547758.08");
        assert_eq!(
            Amount::from_minor_units(i64::MAX).to_string(),
            "92233720368547758.07"
        );
    }

    #[test]
    fn parse_lenient_falls_back_to_zero() {
        assert_eq!(Amount::parse_lenient(""), Amount::default());
        assert_eq!(Amount::parse_lenient("abc"), Amount::default());
        assert_eq!(Amount::parse_lenient("-"), Amount::default());
        assert_eq!(Amount::parse_lenient("."), Amount::default());
    }

    #[test]
    fn minimum_is_one_unit() {
        assert!(Amount::from_minor_units(99) < Amount::MINIMUM);
        assert!(Amount::from_major_units(1) >= Amount::MINIMUM);
    }
}
