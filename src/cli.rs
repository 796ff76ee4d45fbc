use std::path::PathBuf;

use structopt::StructOpt;

use krz::artifacts::MemSource;
use krz::ImageSizeLimit;

#[derive(StructOpt, Debug)]
pub enum Command {
    /// Pack a program binary into a flash image and a memory image
    Pack(PackOpts),
    /// Convert a program binary to a memory image
    #[structopt(name = "bin2mem")]
    Bin2Mem(Bin2MemOpts),
    /// Print the header of a flash image
    Inspect(InspectOpts),
}

#[derive(StructOpt, Debug)]
pub struct PackOpts {
    /// The program binary to pack
    #[structopt(required = true)]
    pub filename: PathBuf,
    /// Emit the memory image from the "raw" program or the "packed" flash image
    #[structopt(
        long = "mem-source",
        default_value = "raw",
        possible_values = &["raw", "packed"]
    )]
    pub mem_source: MemSource,
    /// Only write the flash image
    #[structopt(long = "no-mem")]
    pub no_mem: bool,
    /// Directory to write the artifacts to, instead of next to the input
    #[structopt(short = "o", long = "out-dir")]
    pub out_dir: Option<PathBuf>,
}

#[derive(StructOpt, Debug)]
pub struct Bin2MemOpts {
    /// The program binary to convert
    #[structopt(required = true)]
    pub filename: PathBuf,
    /// Directory to write the memory image to, instead of next to the input
    #[structopt(short = "o", long = "out-dir")]
    pub out_dir: Option<PathBuf>,
}

#[derive(StructOpt, Debug)]
pub struct InspectOpts {
    /// The flash image to inspect
    #[structopt(required = true)]
    pub filename: PathBuf,
}

#[derive(StructOpt, Debug)]
#[structopt(about = "Flash and simulation image packager for the KRZ RISC-V SoC")]
pub struct Opts {
    #[structopt(subcommand)]
    pub command: Command,

    /// The maximum program size in bytes, optionally suffixed with K
    #[structopt(
        env = "KRZ_MAX_PROG_SIZE",
        short = "l",
        long = "limit",
        default_value = "131072"
    )]
    pub limit: ImageSizeLimit,
}
