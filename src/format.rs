//! Number formatting shared by notifications and templates.

pub fn fmt2(x: f64) -> String {
    format!("{:.2}", x)
}

/// Groups the integer part with commas: `68420.5` -> `68,420.50`.
/// Prices under 1 keep six decimals so small-cap assets stay readable.
pub fn fmt_price(x: f64) -> String {
    if !x.is_finite() {
        return "-".to_string();
    }
    if x.abs() < 1.0 {
        return format!("{:.6}", x);
    }

    let raw = format!("{:.2}", x.abs());
    let (int_part, frac) = raw.split_once('.').unwrap_or((raw.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if x < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac}")
}

pub fn fmt_usd(x: f64) -> String {
    format!("${}", fmt_price(x))
}

/// `1_350_000_000_000.0` -> `$1.35T`
pub fn fmt_compact_usd(x: f64) -> String {
    let abs = x.abs();
    let (value, unit) = if abs >= 1e12 {
        (x / 1e12, "T")
    } else if abs >= 1e9 {
        (x / 1e9, "B")
    } else if abs >= 1e6 {
        (x / 1e6, "M")
    } else {
        (x, "")
    };
    format!("${:.2}{}", value, unit)
}

pub fn fmt_pct(x: f64) -> String {
    let sign = if x > 0.0 { "+" } else { "" };
    format!("{sign}{:.2}%", x)
}
