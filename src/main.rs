use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use log::info;
use structopt::StructOpt;

use krz::artifacts::{self, MemSource};
use krz::{ImageSizeLimit, PackedImage};

mod cli;

fn pack(
    input_path: &Path,
    limit: ImageSizeLimit,
    mem_source: Option<MemSource>,
    out_dir: Option<&Path>,
) -> Result<(), anyhow::Error> {
    let raw = artifacts::read_image(input_path)
        .with_context(|| format!("Failed to read program '{}'", input_path.display()))?;

    let outputs = artifacts::build(&raw, limit, mem_source)
        .with_context(|| format!("Failed to pack program '{}'", input_path.display()))?;

    info!(
        "Payload SHA-256: {}",
        hex_string(&outputs.flash.payload_digest())
    );

    let paths = artifacts::write_artifacts(input_path, &outputs, out_dir)
        .with_context(|| "Failed to write artifacts")?;

    if let Some(mem) = paths.mem {
        println!("Memory file: {}", mem.display());
    }

    println!("Ready to flash: {}", paths.flash.display());

    Ok(())
}

fn bin2mem(input_path: &Path, out_dir: Option<&Path>) -> Result<(), anyhow::Error> {
    let raw = artifacts::read_image(input_path)
        .with_context(|| format!("Failed to read program '{}'", input_path.display()))?;

    let path = artifacts::write_mem_image(input_path, &raw, out_dir).with_context(|| {
        format!(
            "Failed to convert '{}' to a memory image",
            input_path.display()
        )
    })?;

    println!("Memory file: {}", path.display());

    Ok(())
}

fn inspect(input_path: &Path, limit: ImageSizeLimit) -> Result<(), anyhow::Error> {
    let file = File::open(input_path)
        .with_context(|| format!("Failed to open flash image '{}'", input_path.display()))?;

    let image = PackedImage::from_reader(BufReader::new(file), limit).with_context(|| {
        format!(
            "Failed to parse header of flash image '{}'",
            input_path.display()
        )
    })?;

    println!("Payload size: {} bytes", image.declared_len());
    println!("Words: {}", image.word_count());
    println!("Bootable: {}", if image.is_bootable() { "yes" } else { "no" });
    println!("Payload SHA-256: {}", hex_string(&image.payload_digest()));

    Ok(())
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn main() -> Result<(), anyhow::Error> {
    use cli::{Bin2MemOpts, Command, InspectOpts, PackOpts};

    // Timestamped logger, filtered through RUST_LOG
    pretty_env_logger::init_timed();

    // Parse the command-line arguments
    let opts = cli::Opts::from_args();

    match &opts.command {
        Command::Pack(PackOpts {
            filename,
            mem_source,
            no_mem,
            out_dir,
        }) => {
            let mem_source = if *no_mem { None } else { Some(*mem_source) };

            pack(filename, opts.limit, mem_source, out_dir.as_deref())?;
        }
        Command::Bin2Mem(Bin2MemOpts { filename, out_dir }) => {
            bin2mem(filename, out_dir.as_deref())?;
        }
        Command::Inspect(InspectOpts { filename }) => {
            inspect(filename, opts.limit)?;
        }
    }

    Ok(())
}
