//! Writes a freshly generated identity bundle to disk.
//!
//! The bundle holds the certificate and its passphrase-encrypted private key,
//! ready for `certificate.path` in either service's configuration. The
//! thumbprint printed alongside is what the issuer pins.

use anyhow::{bail, Context};
use auth_certificate::generate::{generate_identity, GeneratedIdentity, IdentityParams};
use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One generation run
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub common_name: String,
    pub validity_days: i64,
    pub key_bits: usize,
    pub passphrase: String,
    /// Identity bundle destination
    pub output: PathBuf,
    /// Optional certificate-only copy
    pub public_output: Option<PathBuf>,
    /// Replace existing files
    pub force: bool,
}

/// Generate the identity and write the requested files.
///
/// # Errors
///
/// Fails if an output exists and `force` is off, if generation fails, or if
/// a file cannot be written.
pub fn run(request: &GenerateRequest, now: DateTime<Utc>) -> anyhow::Result<GeneratedIdentity> {
    let outputs = std::iter::once(&request.output).chain(request.public_output.as_ref());
    for path in outputs {
        if path.exists() && !request.force {
            bail!("{} already exists (pass --force to replace it)", path.display());
        }
    }

    let mut params = IdentityParams::starting_at(&request.common_name, now, request.validity_days)?;
    params.key_bits = request.key_bits;

    let generated = generate_identity(&params, &request.passphrase).context("Failed to generate identity")?;

    write_file(&request.output, &generated.bundle_pem, true)?;
    tracing::info!(path = %request.output.display(), "Wrote identity bundle");

    if let Some(path) = &request.public_output {
        write_file(path, &generated.certificate_pem, false)?;
        tracing::info!(path = %path.display(), "Wrote public certificate");
    }

    Ok(generated)
}

/// Lines printed after a successful run.
pub fn summary(generated: &GeneratedIdentity, output: &Path) -> Vec<String> {
    let cert = &generated.certificate;
    vec![
        "Certificate created:".to_string(),
        format!("Subject: {}", cert.subject),
        format!("Thumbprint: {}", cert.thumbprint),
        format!("Valid from: {} to {}", cert.not_before, cert.not_after),
        format!("Saved to: {}", output.display()),
    ]
}

fn write_file(path: &Path, contents: &str, secret: bool) -> anyhow::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    if secret {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    #[cfg(not(unix))]
    let _ = secret;

    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
