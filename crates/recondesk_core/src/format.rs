//! Display formatting helpers shared by managers and the CLI.

/// Formats a US phone number as `(AAA) BBB-CCCC`.
///
/// Only inputs with exactly ten digits (after dropping punctuation and
/// spaces) are reformatted; anything else is returned unchanged.
pub fn format_phone(input: &str) -> String {
    let digits = input
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>();
    if digits.len() != 10 {
        return input.to_string();
    }
    format!("({}) {}-{}", &digits[0..3], &digits[3..6], &digits[6..])
}
