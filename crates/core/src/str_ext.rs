//! Extension traits for `str` presence checks.
//!
//! JSON request fields arrive as `Option<String>`; an empty or
//! whitespace-only value counts as absent.

/// Extension trait for `str` to handle blank-as-none semantics.
pub trait StrExt {
    /// Returns `Some(self)` unless the string is empty or whitespace only.
    #[must_use]
    fn non_blank(&self) -> Option<&str>;
}

impl StrExt for str {
    #[inline]
    fn non_blank(&self) -> Option<&str> {
        (!self.trim().is_empty()).then_some(self)
    }
}

/// Extension trait for optional request fields.
pub trait OptionStrExt {
    /// Returns the inner value if present and not blank.
    #[must_use]
    fn present(&self) -> Option<&str>;
}

impl OptionStrExt for Option<String> {
    #[inline]
    fn present(&self) -> Option<&str> {
        self.as_deref().and_then(StrExt::non_blank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_are_absent() {
        assert_eq!("".non_blank(), None);
        assert_eq!("  \t".non_blank(), None);
        assert_eq!(" x ".non_blank(), Some(" x "));
    }

    #[test]
    fn option_presence() {
        assert_eq!(None::<String>.present(), None);
        assert_eq!(Some(String::new()).present(), None);
        assert_eq!(Some("rice".to_string()).present(), Some("rice"));
    }
}
