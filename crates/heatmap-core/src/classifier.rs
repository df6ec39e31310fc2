//! Code classification.
//!
//! Operation codes are positional: the first four digits name the
//! functional family (e.g. `1010` "Drive away") and the rest refine it to a
//! specific sub-operation. A family's own summary row zeroes the refinement
//! digits, so a code with at least four trailing zeros is a parent.
//!
//! Codes shorter than four digits can never carry four trailing zeros and
//! are therefore never parents. An all-zero code of length four or more is
//! a parent under the same rule.

use crate::types::{OperationCode, Role};

/// Trailing zeros required for a code to be a parent.
pub const PARENT_TRAILING_ZEROS: usize = 4;

/// Leading digits that identify the functional family.
pub const FAMILY_PREFIX_LEN: usize = 4;

/// Shortest code that can be linked to a parent.
pub const MIN_LINKABLE_LEN: usize = 8;

fn is_numeric(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit())
}

/// Number of trailing `0` characters in `code`.
pub fn trailing_zeros(code: &str) -> usize {
    code.bytes().rev().take_while(|b| *b == b'0').count()
}

/// True iff `code` is all digits and ends in at least four zeros.
pub fn is_parent(code: &str) -> bool {
    is_numeric(code) && trailing_zeros(code) >= PARENT_TRAILING_ZEROS
}

/// Parent family code for a sub-operation: the first four digits followed
/// by `0000`. `None` for non-numeric codes and codes shorter than eight
/// digits.
pub fn parent_of(code: &str) -> Option<OperationCode> {
    if !is_numeric(code) || code.len() < MIN_LINKABLE_LEN {
        return None;
    }

    let family = &code[..FAMILY_PREFIX_LEN];
    OperationCode::parse(&format!("{}{}", family, "0".repeat(PARENT_TRAILING_ZEROS)))
}

/// Role implied by the code shape, or `None` if the code is not numeric.
pub fn classify(code: &str) -> Option<Role> {
    if !is_numeric(code) {
        None
    } else if is_parent(code) {
        Some(Role::Parent)
    } else {
        Some(Role::SubOperation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_parent() {
        assert!(is_parent("10100000"));
        assert!(is_parent("10000000"));
        assert!(!is_parent("10101300"));
        assert!(!is_parent("10071000"));
    }

    #[test]
    fn test_short_and_zero_codes() {
        assert!(!is_parent("000"));
        assert!(!is_parent("100"));
        assert!(is_parent("0000"));
        assert!(is_parent("00000000"));
        assert!(is_parent("10000"));
    }

    #[test]
    fn test_non_numeric_is_never_parent() {
        assert!(!is_parent("1010000a"));
        assert!(!is_parent("abc0000"));
        assert!(!is_parent(""));
        assert_eq!(classify("abc0000"), None);
    }

    #[test]
    fn test_parent_of() {
        assert_eq!(parent_of("10101300").unwrap().as_str(), "10100000");
        assert_eq!(parent_of("10071000").unwrap().as_str(), "10070000");
        assert_eq!(parent_of("1009840012").unwrap().as_str(), "10090000");
        assert_eq!(parent_of("101"), None);
        assert_eq!(parent_of("1010130"), None);
        assert_eq!(parent_of("1010x300"), None);
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("10100000"), Some(Role::Parent));
        assert_eq!(classify("10101300"), Some(Role::SubOperation));
        assert_eq!(classify("101"), Some(Role::SubOperation));
    }

    #[test]
    fn test_trailing_zeros() {
        assert_eq!(trailing_zeros("10100000"), 5);
        assert_eq!(trailing_zeros("10101300"), 2);
        assert_eq!(trailing_zeros("1"), 0);
        assert_eq!(trailing_zeros(""), 0);
    }
}
