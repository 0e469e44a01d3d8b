/// Shortest PAN accepted for storage.
pub const MIN_PAN_LEN: usize = 12;

/// Longest PAN accepted for storage.
pub const MAX_PAN_LEN: usize = 19;

/// Returns true if `pan` is 12-19 ASCII digits and passes the Luhn checksum.
///
/// Absent, short, long or non-numeric input is simply rejected.
pub fn is_valid_pan<'a>(pan: impl Into<Option<&'a str>>) -> bool {
    match pan.into() {
        Some(pan) if has_pan_format(pan) => luhn_checksum_ok(pan),
        _ => false,
    }
}

/// Length and character-class check only, without the checksum.
pub fn has_pan_format(pan: &str) -> bool {
    (MIN_PAN_LEN..=MAX_PAN_LEN).contains(&pan.len()) && pan.bytes().all(|b| b.is_ascii_digit())
}

fn luhn_checksum_ok(digits: &str) -> bool {
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let n = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = n * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                n
            }
        })
        .sum();

    sum % 10 == 0
}
