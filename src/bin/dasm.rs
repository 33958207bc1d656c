use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;

use yaxpeax_arm32::listing::{parse_number, Image, Listing, ListingError};
use yaxpeax_arm32::Mode;

#[derive(Parser, Debug)]
#[command(name = "dasm")]
#[command(about = "disassembler for arm and thumb instructions", long_about = None)]
struct Args {
    /// address of the first instruction (hex with 0x, octal with a leading 0, or decimal)
    #[arg(value_parser = parse_number::<u32>)]
    address: u32,

    /// disassemble as arm instructions (the default)
    #[arg(short = 'a', long = "arm")]
    arm: bool,

    /// disassemble as thumb instructions
    #[arg(short = 't', long = "thumb", conflicts_with = "arm")]
    thumb: bool,

    /// how many instructions to disassemble
    #[arg(short, long, default_value = "1", value_parser = parse_number::<u32>)]
    count: u32,

    /// save the listing to this file instead of printing it
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// raw memory image to read instructions from
    #[arg(short, long)]
    image: PathBuf,

    /// address the first byte of the image is mapped at
    #[arg(short, long, default_value = "0", value_parser = parse_number::<u32>)]
    base: u32,

    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn setup_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        "off" => log::LevelFilter::Off,
        _ => log::LevelFilter::Warn,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_logging(&args);

    let mode = if args.thumb && !args.arm { Mode::Thumb } else { Mode::Arm };
    let image = Image::from_file(args.base, &args.image)
        .with_context(|| format!("failed to read image '{}'", args.image.display()))?;
    let listing = Listing::new(args.address, mode, args.count);

    match &args.file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("can not create file '{}'", path.display()))?;
            let mut out = BufWriter::new(file);
            match listing.write_to(&image, &mut out) {
                Ok(_) => {}
                Err(ListingError::Io(e)) => {
                    drop(out);
                    if let Err(rm) = fs::remove_file(path) {
                        log::warn!("could not remove '{}': {}", path.display(), rm);
                    }
                    bail!("failed to write file '{}': {}", path.display(), e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            listing.write_to(&image, &mut out)?;
        }
    }

    Ok(())
}
