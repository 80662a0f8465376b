pub mod email_validator;
pub mod url_validator;

/// Base62 字母表（数字在前，与哈希编码的位序一致）
pub const BASE62_ALPHABET: &[u8; 62] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

pub fn generate_random_code(length: usize) -> String {
    use std::iter;

    // 随机选择字母和数字
    iter::repeat_with(|| BASE62_ALPHABET[rand::random_range(0..BASE62_ALPHABET.len())] as char)
        .take(length)
        .collect()
}

/// Encode `value` in base62, most significant digit first.
///
/// Zero encodes to the empty string; callers pad to the width they need.
pub fn encode_base62(mut value: u128) -> String {
    let mut digits = Vec::with_capacity(22);
    while value > 0 {
        digits.push(BASE62_ALPHABET[(value % 62) as usize]);
        value /= 62;
    }
    digits.reverse();
    // 字母表全部为 ASCII
    digits.into_iter().map(char::from).collect()
}

/// Whether `input` could be a short code typed at a prompt.
pub fn looks_like_short_code(input: &str) -> bool {
    (4..=64).contains(&input.len())
        && input
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_code_length_and_alphabet() {
        let code = generate_random_code(12);
        assert_eq!(code.len(), 12);
        assert!(code.bytes().all(|b| BASE62_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_encode_base62() {
        assert_eq!(encode_base62(0), "");
        assert_eq!(encode_base62(61), "z");
        assert_eq!(encode_base62(62), "10");
        assert_eq!(encode_base62(62 * 62 + 1), "101");
        assert_eq!(encode_base62(u128::MAX).len(), 22);
    }

    #[test]
    fn test_looks_like_short_code() {
        assert!(looks_like_short_code("aB3xY9z"));
        assert!(looks_like_short_code("Ab_-12"));
        assert!(!looks_like_short_code("abc"));
        assert!(!looks_like_short_code("create https://x.y"));
        assert!(!looks_like_short_code("a.b.c.d"));
    }
}
