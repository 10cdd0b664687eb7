/// Normalizes a scraped price string to a plain decimal number
///
/// Returns an empty string when the text is not a price: it contains any
/// letter ("call us", "12 990 руб."), has no digits, or leaves more than one
/// decimal point after cleaning. A trailing comma followed by one or two
/// digits is read as the decimal part.
///
/// ```
/// use catalog_sweep::extract::normalize_price;
///
/// assert_eq!(normalize_price("1 234,50 ₽"), "1234.50");
/// assert_eq!(normalize_price("12 990 ₽"), "12990");
/// assert_eq!(normalize_price("Price on request"), "");
/// ```
pub fn normalize_price(raw: &str) -> String {
    if raw.chars().any(char::is_alphabetic) {
        return String::new();
    }

    let body = raw.trim_end_matches(|c: char| !c.is_ascii_digit());
    let body = match body.rsplit_once(',') {
        Some((whole, fraction))
            if (1..=2).contains(&fraction.len())
                && fraction.chars().all(|c| c.is_ascii_digit()) =>
        {
            format!("{}.{}", whole, fraction)
        }
        _ => body.to_string(),
    };

    let cleaned: String = body
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let cleaned = cleaned.trim_matches('.');

    if !cleaned.chars().any(|c| c.is_ascii_digit()) || cleaned.matches('.').count() > 1 {
        return String::new();
    }
    cleaned.to_string()
}
