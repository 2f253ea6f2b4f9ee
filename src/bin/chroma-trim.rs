use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use chroma_trim::{default_output_path, Engine, ProcessOptions, ProcessResult, DEFAULT_MIN_SIZE};

#[derive(Parser)]
#[command(
    name = "chroma-trim",
    about = "Strip green-screen backgrounds, trim to content and store as WebP",
    version,
    after_help = "Simple usage: chroma-trim <image.png>  (writes <image>_trimmed.webp)\n\n\
                  PNG files are keyed, trimmed and re-encoded as WebP.\n\
                  JPEG and WebP files are stored unchanged."
)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: {name}_trimmed.webp)
    #[arg(short, long)]
    output: Option<String>,

    /// Re-encode PNG files without removing the background
    #[arg(short, long)]
    keep_background: bool,

    /// Particle erosion threshold in pixels
    #[arg(short, long, default_value_t = DEFAULT_MIN_SIZE)]
    min_size: u32,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(opts: &ProcessOptions) {
    let default_level = if opts.verbose {
        "debug"
    } else if opts.quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let opts = ProcessOptions {
        remove_background: !cli.keep_background,
        min_size: cli.min_size,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };
    init_logging(&opts);

    let engine = match Engine::new(opts) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    let opts = engine.options();

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    if !opts.quiet {
        if opts.remove_background {
            eprintln!("Background removal enabled (min particle size: {})", opts.min_size);
        } else {
            eprintln!("Background removal disabled, converting only");
        }
        eprintln!();
    }

    let results = if input_path.is_dir() {
        let output_dir = if let Some(o) = &cli.output {
            PathBuf::from(o)
        } else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: chroma-trim <input_dir> -o <output_dir>");
            process::exit(1);
        };
        engine.process_directory(input_path, &output_dir)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path),
        };
        vec![engine.process_file(input_path, &output_path)]
    };

    let mut success_count = 0u32;
    let mut copy_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, opts);
        if !r.success {
            fail_count += 1;
        } else if r.stored_verbatim {
            copy_count += 1;
        } else {
            success_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if copy_count > 0 {
            eprint!(", Copied: {copy_count}");
        }
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    if opts.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if !result.success {
        eprintln!("[FAIL] {filename}: {}", result.message);
    } else if result.stored_verbatim {
        eprintln!("[COPY] {filename}");
    } else if let Some((w, h)) = result.dimensions {
        eprintln!("[OK] {filename} ({w}x{h})");
    } else {
        eprintln!("[OK] {filename}");
    }

    if opts.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
    if opts.verbose {
        if let Some(out) = &result.output {
            eprintln!("  => {}", out.display());
        }
    }
}
