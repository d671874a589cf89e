//! Cleans up a channel list file: drops flagged lines, strips name
//! annotations, removes duplicates and shuffles.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use covercrawl_core::channel_list::{read_channel_list, tidy, write_channel_list};
use covercrawl_core::validate_channel_id;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

/// Tidy a channel list (one channel id per line, optional " - name" suffix).
#[derive(Parser, Debug)]
#[command(name = "tidy-channels")]
#[command(author, version, about)]
struct Args {
    /// Channel list to read
    #[arg(default_value = "channels.txt")]
    input: PathBuf,

    /// Where to write the result (defaults to rewriting the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Shuffle seed, for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Also drop ids that are not well-formed channel ids
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();

    let lines = read_channel_list(&args.input)?;
    let before = lines.len();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut channels = tidy(lines, &mut rng);
    if args.strict {
        channels.retain(|id| match validate_channel_id(id) {
            Ok(_) => true,
            Err(error) => {
                warn!(error = %error, "dropping malformed channel id");
                false
            }
        });
    }

    let output = args.output.as_ref().unwrap_or(&args.input);
    write_channel_list(output, &channels)?;
    info!(
        before,
        after = channels.len(),
        path = %output.display(),
        "channel list tidied"
    );
    Ok(())
}
