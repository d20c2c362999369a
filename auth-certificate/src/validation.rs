use crate::error::ValidationError;
use crate::Certificate;
use chrono::{DateTime, Utc};

/// Decide whether `cert` is acceptable proof of identity at `now`.
///
/// Checks run in a fixed order and the first failure wins:
/// 1. `now < not_before` is `NotYetValid`
/// 2. `now > not_after` is `Expired`
/// 3. thumbprint differs from `expected_thumbprint` (case-insensitive) is
///    `ThumbprintMismatch`
///
/// Both window bounds are inclusive. With no expected thumbprint, any
/// time-valid certificate is accepted.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate(
    cert: &Certificate,
    expected_thumbprint: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if now < cert.not_before {
        tracing::warn!(
            subject = %cert.subject,
            not_before = %cert.not_before,
            "Certificate not yet valid"
        );
        return Err(ValidationError::NotYetValid {
            not_before: cert.not_before,
        });
    }

    if now > cert.not_after {
        tracing::warn!(
            subject = %cert.subject,
            not_after = %cert.not_after,
            "Certificate expired"
        );
        return Err(ValidationError::Expired {
            not_after: cert.not_after,
        });
    }

    if let Some(expected) = expected_thumbprint {
        if !thumbprints_match(expected, &cert.thumbprint) {
            tracing::warn!(
                subject = %cert.subject,
                expected = %expected,
                actual = %cert.thumbprint,
                "Certificate thumbprint mismatch"
            );
            return Err(ValidationError::ThumbprintMismatch {
                expected: expected.to_string(),
                actual: cert.thumbprint.clone(),
            });
        }
    }

    tracing::debug!(
        subject = %cert.subject,
        thumbprint = %cert.thumbprint,
        "Certificate validated"
    );
    Ok(())
}

/// Case-insensitive thumbprint comparison. Surrounding whitespace is ignored.
pub fn thumbprints_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn fabricated(thumbprint: &str) -> Certificate {
        Certificate::from_parts(
            "CN=OAuthDemoClientCert".to_string(),
            thumbprint.to_string(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            Vec::new(),
            Vec::new(),
        )
        .unwrap()
    }

    fn mid_2024() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_accepts_matching_thumbprint_case_insensitive() {
        let cert = fabricated("AA:BB");
        assert!(validate(&cert, Some("aa:bb"), mid_2024()).is_ok());
        assert!(validate(&cert, Some("AA:BB"), mid_2024()).is_ok());
    }

    #[test]
    fn test_rejects_expired() {
        let cert = fabricated("AA:BB");
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let err = validate(&cert, Some("AA:BB"), now).unwrap_err();
        assert!(matches!(err, ValidationError::Expired { .. }));
    }

    #[test]
    fn test_rejects_not_yet_valid() {
        let cert = fabricated("AA:BB");
        let now = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
        let err = validate(&cert, Some("AA:BB"), now).unwrap_err();
        assert!(matches!(err, ValidationError::NotYetValid { .. }));
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let cert = fabricated("AA:BB");
        assert!(validate(&cert, None, cert.not_before).is_ok());
        assert!(validate(&cert, None, cert.not_after).is_ok());
        assert!(validate(&cert, None, cert.not_after + Duration::seconds(1)).is_err());
        assert!(validate(&cert, None, cert.not_before - Duration::seconds(1)).is_err());
    }

    #[test]
    fn test_rejects_thumbprint_mismatch() {
        let cert = fabricated("AA:BB");
        let err = validate(&cert, Some("CC:DD"), mid_2024()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ThumbprintMismatch {
                expected: "CC:DD".to_string(),
                actual: "AA:BB".to_string(),
            }
        );
    }

    #[test]
    fn test_time_checked_before_thumbprint() {
        let cert = fabricated("AA:BB");
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let err = validate(&cert, Some("CC:DD"), now).unwrap_err();
        assert!(matches!(err, ValidationError::Expired { .. }));
    }

    #[test]
    fn test_relaxed_mode_accepts_any_time_valid_certificate() {
        let cert = fabricated("AA:BB");
        assert!(validate(&cert, None, mid_2024()).is_ok());
    }

    #[test]
    fn test_generated_certificate_validates_against_its_thumbprint() {
        let cert = crate::testutil::client_certificate("OAuthDemoClientCert");
        let thumbprint = cert.thumbprint.to_lowercase();
        assert!(validate(&cert, Some(&thumbprint), Utc::now()).is_ok());
    }
}
