//! Luhn (mod 10) checksum.

/// Returns `true` when `digits` is a non-empty string of ASCII digits whose
/// Luhn checksum holds.
///
/// Every second digit counting from the right is doubled (subtracting 9 when
/// the result exceeds 9) and the sum of all digits must be divisible by 10.
#[must_use]
pub fn luhn_check(digits: &str) -> bool {
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return false;
    }

    let sum: u32 = digits
        .bytes()
        .rev()
        .map(|byte| u32::from(byte - b'0'))
        .enumerate()
        .map(|(index, digit)| {
            if index % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();

    sum % 10 == 0
}
