use clap::Parser;
use std::path::PathBuf;

use auth_certificate::generate::{DEFAULT_COMMON_NAME, DEFAULT_VALIDITY_DAYS, MIN_KEY_BITS};
use gen_cert::{run, summary, GenerateRequest};

/// Self-signed client identity generator
#[derive(Parser, Debug)]
#[command(name = "gen-cert")]
#[command(about = "Generates a self-signed client certificate and an encrypted PEM identity bundle")]
struct Args {
    /// Subject common name
    #[arg(long, default_value = DEFAULT_COMMON_NAME)]
    common_name: String,

    /// Days the certificate stays valid
    #[arg(long, default_value_t = DEFAULT_VALIDITY_DAYS)]
    days: i64,

    /// RSA key size in bits
    #[arg(long, default_value_t = MIN_KEY_BITS)]
    key_bits: usize,

    /// Passphrase protecting the private key
    #[arg(long, env = "GEN_CERT_PASSPHRASE", default_value = "OAuthDemo2026!", hide_default_value = true)]
    passphrase: String,

    /// Identity bundle path
    #[arg(short, long, default_value = "OAuthDemo.pem")]
    output: PathBuf,

    /// Also write the certificate alone to this path
    #[arg(long)]
    public_output: Option<PathBuf>,

    /// Replace existing files
    #[arg(long)]
    force: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    telemetry::init_tracing("gen_cert", args.verbose)?;

    let request = GenerateRequest {
        common_name: args.common_name,
        validity_days: args.days,
        key_bits: args.key_bits,
        passphrase: args.passphrase,
        output: args.output,
        public_output: args.public_output,
        force: args.force,
    };

    let generated = run(&request, chrono::Utc::now())?;
    for line in summary(&generated, &request.output) {
        println!("{}", line);
    }
    Ok(())
}
