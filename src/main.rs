//! Thin CLI shim over the `tile2ee` library: parses flags into an
//! [`Options`], detects or reads the requested direction, and calls the
//! matching orchestrator. No business logic lives here.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use tile2ee::{convert, Direction, Options};

/// Converts Infinity Engine TIS/MOS tile graphics between the palette
/// (V1) and PVRZ atlas (V2) forms.
#[derive(Parser, Debug)]
#[command(name = "tile2ee", version, about)]
struct Cli {
    /// One or more TIS/MOS/MOSC files to convert.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output path. Only valid with a single input; defaults to
    /// swapping the input's V1/V2 form in place otherwise.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Octree quantizer quality for V2 -> V1 conversions, 0..=10.
    #[arg(long, default_value_t = Options::default().quality_v1)]
    quality_v1: u8,

    /// BCn encoder quality for V1 -> V2 conversions, 0..=9.
    #[arg(long, default_value_t = Options::default().quality_v2)]
    quality_v2: u8,

    /// Worker thread count; 0 autodetects from hardware concurrency.
    #[arg(long, default_value_t = Options::default().threads)]
    threads: usize,

    /// Bounded submit queue capacity for the tile pipeline.
    #[arg(long, default_value_t = Options::default().queue_capacity)]
    queue_capacity: usize,

    /// Do not reuse existing PVRZ sibling files; always overwrite.
    #[arg(long, default_value_t = Options::default().overwrite_pvrz)]
    overwrite_pvrz: bool,

    /// First PVRZ page index to assign for MOS output.
    #[arg(long, default_value_t = Options::default().mos_pvrz_start)]
    mos_pvrz_start: u32,

    /// First PVRZ page index to assign for TIS output.
    #[arg(long, default_value_t = Options::default().tis_pvrz_start)]
    tis_pvrz_start: u32,

    /// Wrap MOS V1 output in the MOSC zlib envelope.
    #[arg(long, default_value_t = Options::default().use_mosc)]
    use_mosc: bool,

    /// Stop at the first file that fails instead of continuing the batch.
    #[arg(long, default_value_t = Options::default().halt_on_error)]
    halt_on_error: bool,
}

impl From<&Cli> for Options {
    fn from(cli: &Cli) -> Self {
        Self {
            quality_v1: cli.quality_v1,
            quality_v2: cli.quality_v2,
            threads: cli.threads,
            queue_capacity: cli.queue_capacity,
            overwrite_pvrz: cli.overwrite_pvrz,
            mos_pvrz_start: cli.mos_pvrz_start,
            tis_pvrz_start: cli.tis_pvrz_start,
            use_mosc: cli.use_mosc,
            halt_on_error: cli.halt_on_error,
        }
    }
}

/// Swaps a TIS/MOS path's implied layout, used when `--output` is absent.
fn default_output_for(input: &PathBuf, direction: Direction) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let stem = stem.trim_end_matches("V1").trim_end_matches("V2");
    let suffix = match direction {
        Direction::TisV1ToV2 | Direction::MosV1ToV2 => "V2",
        Direction::TisV2ToV1 | Direction::MosV2ToV1 => "V1",
    };
    let ext = match direction {
        Direction::TisV1ToV2 | Direction::TisV2ToV1 => "tis",
        Direction::MosV1ToV2 | Direction::MosV2ToV1 => "mos",
    };
    input.with_file_name(format!("{stem}{suffix}.{ext}"))
}

fn convert_one(input: &PathBuf, output: Option<&PathBuf>, options: &Options) -> tile2ee::ConvertResult<()> {
    let data = std::fs::read(input).map_err(|_| tile2ee::ConvertError::NotFound(input.clone()))?;
    let direction = Direction::detect(&data)?;
    let resolved_output = match output {
        Some(path) => path.clone(),
        None => default_output_for(input, direction),
    };
    log::info!("{} -> {} ({direction:?})", input.display(), resolved_output.display());
    convert(input, &resolved_output, direction, options)
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if cli.output.is_some() && cli.inputs.len() > 1 {
        eprintln!("--output may only be used with a single input file");
        return ExitCode::FAILURE;
    }

    let options = Options::from(&cli);
    let mut had_error = false;

    for input in &cli.inputs {
        if let Err(err) = convert_one(input, cli.output.as_ref(), &options) {
            eprintln!("{}: {err}", input.display());
            had_error = true;
            if options.halt_on_error {
                break;
            }
        }
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
