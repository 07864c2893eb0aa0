//! Adapter error classification.
//!
//! A cancel or replace that fails because the order is already gone is the
//! outcome the guardian wanted, so it is treated as success. Every other
//! failure is transient and retried on a later pass.

use crate::error::AdapterError;

/// Code and message phrase a venue uses for "no such order".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotFoundSignature {
    pub code: i64,
    /// Lowercase phrase searched for in the error message.
    pub phrase: &'static str,
}

impl NotFoundSignature {
    #[must_use]
    pub const fn new(code: i64, phrase: &'static str) -> Self {
        Self { code, phrase }
    }

    /// `true` if the code matches, or the message contains the phrase
    /// regardless of which code (if any) came with it.
    #[must_use]
    pub fn matches(&self, error: &AdapterError) -> bool {
        if error.code == Some(self.code) {
            return true;
        }
        !self.phrase.is_empty()
            && error
                .message
                .to_ascii_lowercase()
                .contains(&self.phrase.to_ascii_lowercase())
    }

    #[must_use]
    pub fn classify(&self, error: &AdapterError) -> ErrorClass {
        if self.matches(error) {
            ErrorClass::NotFound
        } else {
            ErrorClass::Transient
        }
    }
}

impl Default for NotFoundSignature {
    fn default() -> Self {
        Self::new(2020, "order with the provided digest")
    }
}

/// How the reconciliation loop reacts to an adapter failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The referenced order no longer exists; equivalent to a successful
    /// removal.
    NotFound,
    /// Anything else, including timeouts; retried on the next pass.
    Transient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_canonical_code() {
        let sig = NotFoundSignature::default();
        assert!(sig.matches(&AdapterError::with_code(2020, "whatever")));
        assert_eq!(
            sig.classify(&AdapterError::with_code(2020, "")),
            ErrorClass::NotFound
        );
    }

    #[test]
    fn matches_phrase_without_code() {
        let sig = NotFoundSignature::default();
        let err = AdapterError::message(
            "Order with the provided digest (0xabc) could not be found.",
        );
        assert!(sig.matches(&err));
    }

    #[test]
    fn matches_phrase_with_other_code() {
        let sig = NotFoundSignature::default();
        let err = AdapterError::with_code(
            -1,
            "ORDER WITH THE PROVIDED DIGEST (0x1) could not be found",
        );
        assert!(sig.matches(&err));
    }

    #[test]
    fn ignores_unrelated_errors() {
        let sig = NotFoundSignature::default();
        for err in [
            AdapterError::message("insufficient balance"),
            AdapterError::message("market could not be found"),
            AdapterError::with_code(-1021, "timestamp outside recv window"),
            AdapterError::with_code(429, "rate limited"),
            AdapterError::timeout("cancel_order", std::time::Duration::from_secs(2)),
        ] {
            assert!(!sig.matches(&err), "{err} must not be not-found");
            assert_eq!(sig.classify(&err), ErrorClass::Transient);
        }
    }

    #[test]
    fn custom_signature_uses_its_own_pair() {
        let sig = NotFoundSignature::new(-2011, "unknown order sent");
        assert!(sig.matches(&AdapterError::with_code(-2011, "x")));
        assert!(sig.matches(&AdapterError::message("Unknown order sent.")));
        assert!(!sig.matches(&AdapterError::with_code(2020, "x")));
    }
}
