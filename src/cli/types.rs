use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::{apply::ApplyArgs, check::CheckArgs, extract::ExtractArgs, land::LandArgs};

#[derive(Parser, Debug)]
#[command(name = "fleetprint")]
#[command(about = "Fingerprint repositories and converge them toward fleet-wide targets", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Hosting-service token, forwarded as a bearer header to the classifier
    #[arg(long, global = true, env = "FLEETPRINT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Load configuration from this file instead of .fleetprint/
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract fingerprints from one or more local checkouts
    Extract(ExtractArgs),
    /// Compare a checkout's fingerprints against target fingerprints
    Check(CheckArgs),
    /// Converge a checkout toward a target fingerprint
    Apply(ApplyArgs),
    /// Land a convergence branch on its base branch
    Land(LandArgs),
}
