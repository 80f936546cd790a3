//! Input checks shared by the registration, login and profile handlers.

/// A handle is 2 to 16 characters drawn from `[A-Za-z0-9_-]`.
pub fn is_valid_handle(handle: &str) -> bool {
    (2..=16).contains(&handle.len())
        && handle
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Structural address check: one `@`, a non-empty local part, and a dotted
/// domain without whitespace.
pub fn is_valid_email(address: &str) -> bool {
    let address = address.trim();
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !address.chars().any(|c| c.is_whitespace() || c.is_control())
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ab", true)]
    #[case("nick_g-2026", true)]
    #[case("SIXTEEN_chars_ok", true)]
    #[case("a", false)]
    #[case("seventeen_chars_x", false)]
    #[case("has space", false)]
    #[case("dot.ted", false)]
    #[case("émile", false)]
    #[case("", false)]
    fn test_handles(#[case] handle: &str, #[case] valid: bool) {
        assert_eq!(is_valid_handle(handle), valid, "handle {:?}", handle);
    }

    #[rstest]
    #[case("nick@showcash.io", true)]
    #[case("first.last+tag@mail.example.com", true)]
    #[case("  padded@showcash.io ", true)]
    #[case("no-at-sign", false)]
    #[case("@showcash.io", false)]
    #[case("nick@", false)]
    #[case("nick@localhost", false)]
    #[case("two@@showcash.io", false)]
    #[case("nick@show cash.io", false)]
    #[case("nick@.io", false)]
    fn test_emails(#[case] address: &str, #[case] valid: bool) {
        assert_eq!(is_valid_email(address), valid, "address {:?}", address);
    }
}
