#![allow(clippy::unwrap_used, clippy::expect_used)]

use auth_certificate::{validate, CertLoadError, Certificate, ValidationError};
use chrono::{TimeZone, Utc};
use std::io::Write;
use std::path::PathBuf;

const SIGNING_THUMBPRINT: &str = "50CB563ED29BCED78C4A867F879FAEADA6203997";

fn testdata(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../testdata")
        .join(name)
}

#[test]
fn test_load_public_certificate_pem() {
    let cert = Certificate::load(testdata("signing-cert.pem")).unwrap();

    assert_eq!(cert.subject, "CN=OAuthDemo");
    assert_eq!(cert.thumbprint, SIGNING_THUMBPRINT);
    assert!(!cert.has_private_key());
}

#[test]
fn test_load_der_file() {
    let pem_cert = Certificate::load(testdata("signing-cert.pem")).unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&pem_cert.raw_bytes).unwrap();

    let der_cert = Certificate::load(file.path()).unwrap();
    assert_eq!(der_cert.thumbprint, pem_cert.thumbprint);
}

#[test]
fn test_load_missing_file() {
    let err = Certificate::load(testdata("does-not-exist.pem")).unwrap_err();
    assert!(matches!(err, CertLoadError::FileNotFound(_)));

    let err = Certificate::load_identity(testdata("does-not-exist.pem"), Some("x")).unwrap_err();
    assert!(matches!(err, CertLoadError::FileNotFound(_)));
}

#[test]
fn test_load_garbage_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"hello, not a certificate").unwrap();

    let err = Certificate::load(file.path()).unwrap_err();
    assert!(matches!(err, CertLoadError::MalformedEncoding(_)));
}

#[test]
fn test_load_encrypted_identity() {
    let identity =
        Certificate::load_identity(testdata("oauth-demo.pem"), Some("OAuthDemo2026!")).unwrap();

    assert_eq!(identity.thumbprint, SIGNING_THUMBPRINT);
    assert!(identity.has_private_key());
}

#[test]
fn test_load_identity_wrong_passphrase() {
    let err = Certificate::load_identity(testdata("oauth-demo.pem"), Some("Wrong2026!")).unwrap_err();
    assert!(matches!(err, CertLoadError::BadPassphrase));
}

#[test]
fn test_load_plain_identity_ignores_passphrase() {
    let identity = Certificate::load_identity(testdata("oauth-demo-plain.pem"), None).unwrap();
    assert_eq!(identity.thumbprint, SIGNING_THUMBPRINT);
    assert!(identity.has_private_key());
}

#[test]
fn test_load_identity_without_key() {
    let err = Certificate::load_identity(testdata("signing-cert.pem"), None).unwrap_err();
    assert!(matches!(err, CertLoadError::MissingPrivateKey));
}

#[test]
fn test_unauthorized_identity_is_a_different_certificate() {
    let unauthorized =
        Certificate::load_identity(testdata("unauthorized.pem"), Some("Unauthorized2026!")).unwrap();

    assert_eq!(unauthorized.subject, "CN=Unauthorized");
    assert_ne!(unauthorized.thumbprint, SIGNING_THUMBPRINT);

    let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let err = validate(&unauthorized, Some(SIGNING_THUMBPRINT), now).unwrap_err();
    assert!(matches!(err, ValidationError::ThumbprintMismatch { .. }));
}

#[test]
fn test_submitted_certificate_round_trips_through_base64() {
    let identity =
        Certificate::load_identity(testdata("oauth-demo.pem"), Some("OAuthDemo2026!")).unwrap();

    let received = Certificate::from_base64_der(&identity.to_base64_der()).unwrap();
    assert_eq!(received.thumbprint, identity.thumbprint);
    assert!(!received.has_private_key());

    let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    assert!(validate(&received, Some(&SIGNING_THUMBPRINT.to_lowercase()), now).is_ok());
}

#[test]
fn test_public_half_matches_unauthorized_identity() {
    let public = Certificate::load(testdata("unauthorized-cert.pem")).unwrap();
    let identity =
        Certificate::load_identity(testdata("unauthorized.pem"), Some("Unauthorized2026!")).unwrap();

    assert_eq!(public.subject, "CN=Unauthorized");
    assert_eq!(public.thumbprint, identity.thumbprint);
    assert!(!public.has_private_key());

    let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let err = validate(&public, Some(SIGNING_THUMBPRINT), now).unwrap_err();
    assert!(matches!(err, ValidationError::ThumbprintMismatch { .. }));
}

fn bundle(certificate: &str, key: &str) -> tempfile::NamedTempFile {
    let certificate = std::fs::read_to_string(testdata(certificate)).unwrap();
    let key = std::fs::read_to_string(testdata(key)).unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}{}", certificate, key).unwrap();
    file
}

#[test]
fn test_load_identity_from_separate_halves() {
    let file = bundle("unauthorized-cert.pem", "other-key.pem");

    let identity = Certificate::load_identity(file.path(), None).unwrap();
    assert_eq!(identity.subject, "CN=Unauthorized");
    assert!(identity.has_private_key());
}

#[test]
fn test_load_identity_with_foreign_key() {
    let file = bundle("signing-cert.pem", "other-key.pem");

    let err = Certificate::load_identity(file.path(), None).unwrap_err();
    assert!(matches!(err, CertLoadError::KeyMismatch));
}
