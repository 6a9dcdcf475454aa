//! Input masks applied while the user types, and the digit cleaning applied on
//! submission.

use super::script::InputFormat;

const PHONE_MAX_DIGITS: usize = 11;
const CURRENCY_MAX_DIGITS: usize = 13;

pub fn digits(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Progressive Brazilian phone mask: `(11`, `(11) 9999`, `(11) 9999-888`,
/// `(11) 99999-8888`.
pub fn format_phone(input: &str) -> String {
    let d: String = digits(input).chars().take(PHONE_MAX_DIGITS).collect();
    match d.len() {
        0 => String::new(),
        1..=2 => format!("({}", d),
        3..=6 => format!("({}) {}", &d[..2], &d[2..]),
        7..=10 => format!("({}) {}-{}", &d[..2], &d[2..6], &d[6..]),
        _ => format!("({}) {}-{}", &d[..2], &d[2..7], &d[7..]),
    }
}

/// Reads the digits as cents and renders them as reais: `R$ 1.234,56`.
pub fn format_currency(input: &str) -> String {
    let d = digits(input);
    let d = d.trim_start_matches('0');
    if d.is_empty() {
        return if input.chars().any(|c| c.is_ascii_digit()) {
            "R$ 0,00".to_string()
        } else {
            String::new()
        };
    }
    let d: String = d.chars().take(CURRENCY_MAX_DIGITS).collect();
    let padded = format!("{:0>3}", d);
    let (whole, cents) = padded.split_at(padded.len() - 2);

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("R$ {},{}", grouped, cents)
}

pub fn apply(format: InputFormat, input: &str) -> String {
    match format {
        InputFormat::None => input.to_string(),
        InputFormat::Phone => format_phone(input),
        InputFormat::Currency => format_currency(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_incrementally(text: &str, mask: fn(&str) -> String) -> Vec<String> {
        let mut shown = String::new();
        let mut steps = Vec::new();
        for c in text.chars() {
            shown.push(c);
            shown = mask(&shown);
            steps.push(shown.clone());
        }
        steps
    }

    #[test]
    fn phone_mask_grows_with_each_digit() {
        let steps = type_incrementally("11999998888", format_phone);
        assert_eq!(steps[0], "(1");
        assert_eq!(steps[1], "(11");
        assert_eq!(steps[2], "(11) 9");
        assert_eq!(steps[6], "(11) 9999-9");
        assert_eq!(steps[9], "(11) 9999-9888");
        assert_eq!(steps[10], "(11) 99999-8888");
        assert_eq!(digits(&steps[10]), "11999998888");
    }

    #[test]
    fn phone_mask_drops_extra_digits() {
        assert_eq!(format_phone("119999988887"), "(11) 99999-8888");
        assert_eq!(format_phone("abc"), "");
    }

    #[test]
    fn currency_reads_digits_as_cents() {
        assert_eq!(format_currency("5"), "R$ 0,05");
        assert_eq!(format_currency("30000"), "R$ 300,00");
        assert_eq!(format_currency("123456"), "R$ 1.234,56");
        assert_eq!(format_currency("123456789"), "R$ 1.234.567,89");
        assert_eq!(format_currency("000"), "R$ 0,00");
        assert_eq!(format_currency(""), "");
    }

    #[test]
    fn currency_mask_is_stable_under_incremental_typing() {
        let steps = type_incrementally("30000", format_currency);
        assert_eq!(steps.last().map(String::as_str), Some("R$ 300,00"));
        assert_eq!(digits(steps.last().unwrap()), "30000");
    }
}
