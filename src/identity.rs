//! Identity Gate
//!
//! Format validation plus device-local dedup. Passing the gate claims the
//! identity's dedup slot immediately and irrevocably: an abandoned survey
//! does not return it. The check-then-append is a single atomic ledger
//! operation, so no await point can reopen a race window between two flows
//! on the same device.

use std::sync::Arc;
use tracing::debug;

use crate::error::{SurveyError, SurveyResult};
use crate::store::IdentityLedger;

pub const IDENTITY_LEN: usize = 12;

/// Proof that a raw identity string passed the gate. Carries the operator
/// inputs captured alongside the number; `identity_verified` is true when a
/// display name came off a scanned document.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    full_number: String,
    pub display_name: String,
    pub phone: String,
    pub identity_verified: bool,
}

impl VerifiedIdentity {
    /// The unmasked number. Only the ledger and the masking step see it;
    /// it never reaches a persisted record.
    pub fn full_number(&self) -> &str {
        &self.full_number
    }
}

/// Exact-length numeric format check.
pub fn validate_format(raw: &str) -> SurveyResult<()> {
    if raw.len() == IDENTITY_LEN && raw.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(SurveyError::InvalidFormat)
    }
}

pub struct IdentityGate {
    ledger: Arc<dyn IdentityLedger>,
}

impl IdentityGate {
    pub fn new(ledger: Arc<dyn IdentityLedger>) -> Self {
        Self { ledger }
    }

    /// Validate the number and claim its dedup slot.
    ///
    /// Once a number passes here, no other attempt with the same number on
    /// this device can pass again, whether or not the survey completes.
    pub async fn verify(
        &self,
        raw: &str,
        display_name: &str,
        phone: &str,
    ) -> SurveyResult<VerifiedIdentity> {
        validate_format(raw)?;

        if !self.ledger.claim(raw).await? {
            return Err(SurveyError::DuplicateIdentity);
        }

        let suffix = &raw[IDENTITY_LEN - 4..];
        debug!(%suffix, "identity gate passed");

        Ok(VerifiedIdentity {
            full_number: raw.to_string(),
            display_name: display_name.to_string(),
            phone: phone.to_string(),
            identity_verified: !display_name.is_empty(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    struct MemoryLedger {
        seen: Mutex<HashSet<String>>,
    }

    impl MemoryLedger {
        fn new() -> Self {
            Self {
                seen: Mutex::new(HashSet::new()),
            }
        }
    }

    #[async_trait]
    impl IdentityLedger for MemoryLedger {
        async fn claim(&self, number: &str) -> SurveyResult<bool> {
            Ok(self.seen.lock().unwrap().insert(number.to_string()))
        }

        async fn contains(&self, number: &str) -> SurveyResult<bool> {
            Ok(self.seen.lock().unwrap().contains(number))
        }
    }

    #[test]
    fn format_requires_exactly_twelve_digits() {
        assert!(validate_format("123456789012").is_ok());
        assert!(matches!(
            validate_format("12345678901"),
            Err(SurveyError::InvalidFormat)
        ));
        assert!(matches!(
            validate_format("1234567890123"),
            Err(SurveyError::InvalidFormat)
        ));
        assert!(matches!(
            validate_format("12345678901a"),
            Err(SurveyError::InvalidFormat)
        ));
    }

    #[tokio::test]
    async fn accepts_unseen_number_exactly_once() {
        let gate = IdentityGate::new(Arc::new(MemoryLedger::new()));

        let verified = gate.verify("123456789012", "Sunita Devi", "9876543210").await.unwrap();
        assert_eq!(verified.full_number(), "123456789012");
        assert!(verified.identity_verified);

        let second = gate.verify("123456789012", "Sunita Devi", "9876543210").await;
        assert!(matches!(second, Err(SurveyError::DuplicateIdentity)));
    }

    #[tokio::test]
    async fn blank_name_is_unverified() {
        let gate = IdentityGate::new(Arc::new(MemoryLedger::new()));
        let verified = gate.verify("999988887777", "", "").await.unwrap();
        assert!(!verified.identity_verified);
    }

    #[tokio::test]
    async fn rejected_format_consumes_no_slot() {
        let ledger = Arc::new(MemoryLedger::new());
        let gate = IdentityGate::new(ledger.clone());

        assert!(gate.verify("bad", "", "").await.is_err());
        assert!(!ledger.contains("bad").await.unwrap());
    }
}
