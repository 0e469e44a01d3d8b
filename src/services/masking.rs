/// Number of trailing characters left visible.
const VISIBLE_SUFFIX_LEN: usize = 4;

const MASK_CHAR: char = '*';

/// Returns the final four characters of `pan`, or the whole input if shorter.
pub fn last_four_digits<'a>(pan: impl Into<Option<&'a str>>) -> String {
    let Some(pan) = pan.into() else {
        return String::new();
    };

    let len = pan.chars().count();
    pan.chars()
        .skip(len.saturating_sub(VISIBLE_SUFFIX_LEN))
        .collect()
}

/// Masks every character except the final four with `*`.
///
/// The masked value has the same character length as the input. Inputs of
/// four characters or fewer are returned unchanged.
pub fn mask_pan<'a>(pan: impl Into<Option<&'a str>>) -> String {
    let Some(pan) = pan.into() else {
        return String::new();
    };

    let len = pan.chars().count();
    if len <= VISIBLE_SUFFIX_LEN {
        return pan.to_string();
    }

    let hidden = len - VISIBLE_SUFFIX_LEN;
    pan.chars()
        .enumerate()
        .map(|(i, c)| if i < hidden { MASK_CHAR } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_four_digits() {
        assert_eq!(last_four_digits("4111111111111111"), "1111");
        assert_eq!(last_four_digits("1234"), "1234");
        assert_eq!(last_four_digits("123"), "123");
        assert_eq!(last_four_digits(""), "");
        assert_eq!(last_four_digits(None::<&str>), "");
    }

    #[test]
    fn test_mask_pan() {
        assert_eq!(mask_pan("4111111111111111"), "************1111");
        assert_eq!(mask_pan("1234567890123456"), "************3456");
        assert_eq!(mask_pan("12345"), "*2345");
    }

    #[test]
    fn test_mask_short_input_unchanged() {
        assert_eq!(mask_pan("1234"), "1234");
        assert_eq!(mask_pan("123"), "123");
        assert_eq!(mask_pan(""), "");
        assert_eq!(mask_pan(None::<&str>), "");
    }

    #[test]
    fn test_mask_preserves_length() {
        for pan in ["378282246310005", "4222222222222", "0000000000000000000"] {
            let masked = mask_pan(pan);
            assert_eq!(masked.len(), pan.len());
            assert!(masked.ends_with(&pan[pan.len() - 4..]));
            assert!(masked[..pan.len() - 4].chars().all(|c| c == '*'));
        }
    }

    #[test]
    fn test_multibyte_input_is_counted_in_chars() {
        assert_eq!(last_four_digits("卡号1234"), "1234");
        assert_eq!(mask_pan("卡号12345"), "***2345");
        assert_eq!(mask_pan("éé"), "éé");
    }
}
