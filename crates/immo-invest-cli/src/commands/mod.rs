pub mod analysis;
pub mod projection;
pub mod scoring;
pub mod valuation;

use clap::Args;

/// Arguments shared by every command that only takes a JSON document
#[derive(Args)]
pub struct InputArgs {
    /// Path to JSON input file (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}
