// Copyright 2026 Contributors to the safetynet-rs project.
// SPDX-License-Identifier: Apache-2.0

use clap::{Parser, Subcommand};
use safetynet::attest::{AttestationProvider, HttpAttestationProvider, StaticAttestationProvider};
use safetynet::config::{Config, Overrides};
use safetynet::nonce::NonceGenerator;
use safetynet::token::AttestationToken;
use safetynet::verify::{GoogleSignatureVerifier, SignatureVerifier};
use safetynet::{SafetyNetHelper, VerificationResult};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

const NO_SOURCE: &str = "either --token or an attestation-url in the configuration is needed";

#[derive(Parser)]
#[command(author, version, about = "SafetyNet attestation checker")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Nonce,
    Decode(DecodeArgs),
    Verify(VerifyArgs),
    Check(CheckArgs),
}

#[derive(Debug, clap::Args)]
#[command(long_about = None,
    about = "Decode the claims-set of the supplied SafetyNet JWS, without \
    verifying its signature")]
struct DecodeArgs {
    #[arg(short, long, default_value = "token.jws")]
    token: PathBuf,
}

#[derive(Debug, clap::Args)]
#[command(long_about = None,
    about = "Have the signature of the supplied SafetyNet JWS verified by the \
    Android Device Verification API")]
struct VerifyArgs {
    #[arg(short, long, default_value = "token.jws")]
    token: PathBuf,

    #[arg(short, long, env = "SAFETYNET_API_KEY", hide_env_values = true)]
    api_key: String,

    #[arg(long)]
    verify_url: Option<Url>,
}

#[derive(Debug, clap::Args)]
#[command(long_about = None,
    about = "Run a full SafetyNet test, using either a previously obtained JWS \
    or the attestation relay from the configuration")]
struct CheckArgs {
    /// JWS obtained on the device; if absent, `attestation-url` is used
    #[arg(short, long)]
    token: Option<PathBuf>,

    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, env = "SAFETYNET_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(short, long)]
    package_name: Option<String>,

    /// DER-encoded APK signing certificate, may be repeated
    #[arg(long)]
    apk_cert: Vec<PathBuf>,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "safetynet=info,safetynet_check=info".into()),
        1 => tracing_subscriber::EnvFilter::new("debug"),
        _ => tracing_subscriber::EnvFilter::new("trace"),
    };

    let output = fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .init();

    let r = match cli.command {
        Command::Nonce => {
            nonce();
            Ok(true)
        }
        Command::Decode(args) => decode(&args).map(|_| true),
        Command::Verify(args) => verify(&args).await,
        Command::Check(args) => check(&args).await,
    };

    match r {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

fn read_token(path: &Path) -> Result<String, Box<dyn Error>> {
    let t = fs::read_to_string(path)?;
    Ok(t.trim().to_string())
}

fn nonce() {
    let n = NonceGenerator::new().generate();

    println!("{}", n.to_base64());
}

fn decode(args: &DecodeArgs) -> Result<(), Box<dyn Error>> {
    let t = AttestationToken::parse(&read_token(&args.token)?)?;

    match t.header() {
        Ok(h) => info!("alg: {:?}, x5c chain: {}", h.alg, t.chain_len()),
        Err(e) => debug!("{e}"),
    }

    let claims = t.claims()?;

    println!("{}", serde_json::to_string_pretty(&claims)?);

    Ok(())
}

async fn verify(args: &VerifyArgs) -> Result<bool, Box<dyn Error>> {
    let jws = read_token(&args.token)?;

    let verifier = match &args.verify_url {
        Some(u) => GoogleSignatureVerifier::with_endpoint(u.clone()),
        None => GoogleSignatureVerifier::new(),
    };

    let valid = verifier.verify(&args.api_key, &jws).await?;

    println!("isValidSignature: {valid}");

    Ok(valid)
}

fn load_config(args: &CheckArgs) -> Result<Config, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(p) => Config::from_file(p)?,
        None => Config::default(),
    };

    let mut apk_certificates = Vec::new();
    for p in args.apk_cert.iter() {
        apk_certificates.push(fs::read(p)?);
    }

    config.apply(Overrides {
        api_key: args.api_key.clone(),
        package_name: args.package_name.clone(),
        apk_certificates,
    });

    Ok(config)
}

async fn check(args: &CheckArgs) -> Result<bool, Box<dyn Error>> {
    let config = load_config(args)?;
    let verifier = GoogleSignatureVerifier::with_endpoint(config.verify_url.clone());

    let result = match (&args.token, config.attestation_url.clone()) {
        (Some(p), _) => {
            let provider = StaticAttestationProvider::new(read_token(p)?);
            run(config, provider, verifier).await
        }
        (None, Some(u)) => run(config, HttpAttestationProvider::new(u), verifier).await,
        (None, None) => return Err(NO_SOURCE.into()),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{result}");
    }

    Ok(result.is_success())
}

async fn run(
    config: Config,
    provider: impl AttestationProvider,
    verifier: impl SignatureVerifier,
) -> VerificationResult {
    SafetyNetHelper::new(config, provider, verifier).run().await
}
