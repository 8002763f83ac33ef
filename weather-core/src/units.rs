//! Small numeric and text helpers shared by the aggregation and report code.

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Celsius to Fahrenheit, rounded to two decimals.
pub fn to_fahrenheit(celsius: f64) -> f64 {
    round2(celsius * 9.0 / 5.0 + 32.0)
}

/// Fahrenheit twin of an optional Celsius value. Missing stays missing.
pub fn fahrenheit(celsius: Option<f64>) -> Option<f64> {
    celsius.map(to_fahrenheit)
}

/// Mean of the values, or `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Upper-case the first letter of every word and lower-case the rest,
/// where a word is any run of alphabetic characters.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;

    for ch in text.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }

    out
}
