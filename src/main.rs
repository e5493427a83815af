use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};

use lfs::command::{Command, Output};
use lfs::LinkedFs;

/// Runs filesystem commands (one per line) against a fresh in-memory linked filesystem.
#[derive(Parser)]
struct Args {
    /// Script to run (stdin if omitted)
    script: Option<PathBuf>,
    /// Number of blocks, which is also the number of inodes
    #[arg(long, default_value_t = 1024)]
    num_blocks: usize,
    /// Block size in bytes
    #[arg(long, default_value_t = 512)]
    block_size: usize,
    /// Check the filesystem for consistency after the script
    #[arg(long)]
    check: bool,
    /// Stop at the first command that fails
    #[arg(long)]
    fail_fast: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let mut fs = LinkedFs::new(args.num_blocks, args.block_size)
        .context("unable to create filesystem")?;

    let input: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("unable to open script {path:?}"))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    let mut failures = 0;
    for (index, line) in input.lines().enumerate() {
        let line = line.context("reading script")?;

        match run_line(&mut fs, &line) {
            Ok(Output::None) => {}
            Ok(output) => println!("{output}"),
            Err(err) if args.fail_fast => bail!("line {}: {err}", index + 1),
            Err(err) => {
                eprintln!("line {}: {err}", index + 1);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        warn!("{failures} commands failed");
    }

    if args.check {
        fs.check_filesystem()
            .context("filesystem failed the consistency check")?;

        let usage = fs.usage();
        info!(
            "consistent: {}/{} blocks free, {}/{} inodes free",
            usage.free_blocks, usage.total_blocks, usage.free_inodes, usage.total_inodes
        );
    }

    Ok(())
}

fn run_line(fs: &mut LinkedFs, line: &str) -> lfs::Result<Output> {
    match Command::parse(line)? {
        Some(command) => command.execute(fs),
        None => Ok(Output::None),
    }
}
