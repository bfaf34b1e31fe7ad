//! Display strings for currency, percentages and EPS.
//!
//! All functions are pure; non-finite and unavailable values render as
//! [`NOT_AVAILABLE`].

pub const CURRENCY_PREFIX: &str = "₹";
pub const NOT_AVAILABLE: &str = "N/A";

pub const CRORE: f64 = 10_000_000.0;
pub const LAKH: f64 = 100_000.0;
pub const THOUSAND: f64 = 1_000.0;

/// Magnitude bucket used for currency amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Crore,
    Lakh,
    Thousand,
    None,
}

impl Unit {
    pub const fn divisor(self) -> f64 {
        match self {
            Self::Crore => CRORE,
            Self::Lakh => LAKH,
            Self::Thousand => THOUSAND,
            Self::None => 1.0,
        }
    }

    pub const fn label(self) -> Option<&'static str> {
        match self {
            Self::Crore => Some("Cr"),
            Self::Lakh => Some("L"),
            Self::Thousand => Some("K"),
            Self::None => None,
        }
    }

    pub fn for_value(value: f64) -> Self {
        let magnitude = value.abs();
        if magnitude >= CRORE {
            Self::Crore
        } else if magnitude >= LAKH {
            Self::Lakh
        } else if magnitude >= THOUSAND {
            Self::Thousand
        } else {
            Self::None
        }
    }
}

/// Scales `value` into its magnitude bucket.
pub fn scale(value: f64) -> (f64, Unit) {
    let unit = Unit::for_value(value);
    (value / unit.divisor(), unit)
}

/// `12345` → `₹12.35 K`, `123456789` → `₹12.35 Cr`, `999` → `₹999.00`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_owned();
    }
    let (scaled, unit) = scale(value);
    let amount = group_thousands(&format!("{scaled:.2}"));
    match unit.label() {
        Some(label) => format!("{CURRENCY_PREFIX}{amount} {label}"),
        None => format!("{CURRENCY_PREFIX}{amount}"),
    }
}

pub fn format_optional_currency(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_owned(), format_currency)
}

/// One decimal followed by `%`.
pub fn format_percent(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_owned();
    }
    format!("{value:.1}%")
}

pub fn format_optional_percent(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_owned(), format_percent)
}

/// Unscaled, two decimals.
pub fn format_eps(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_owned();
    }
    format!("{CURRENCY_PREFIX}{value:.2}")
}

/// Crore view used by bar-chart series.
pub fn to_crores(value: f64) -> f64 {
    value / CRORE
}

/// Inserts `,` every three digits of the integer part of a formatted decimal.
fn group_thousands(formatted: &str) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{fraction}")
    }
}
