use blocked_bloom::{
    BloomFilterStats, FilterConfigBuilder, Loader,
    common::{bits2hr, parse_mem},
    fp_rate, optimize,
};
use clap::{Parser, Subcommand};
use std::{fs::File, io::BufReader, path::PathBuf};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about = "Estimate and inspect blocked Bloom filter sizes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the filter size for a capacity and false positive rate
    Size {
        /// Expected number of distinct keys
        capacity: u64,

        /// Desired false positive rate (between 0 and 1)
        fpr: f64,

        /// Memory limit, e.g. "10MB" or "1.5GiB"
        #[arg(short, long)]
        max_memory: Option<String>,
    },

    /// Estimate the false positive rate of a given filter shape
    Fpr {
        /// Number of distinct keys inserted
        #[arg(short, long)]
        capacity: u64,

        /// Filter size in bits
        #[arg(short, long)]
        bits: u64,

        /// Number of hashes
        #[arg(short = 'k', long)]
        hashes: usize,
    },

    /// Print the header of a dumped filter
    Inspect {
        /// Path to the dump
        path: PathBuf,

        /// Also read the blocks and report fill statistics
        #[arg(short, long)]
        load: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Size {
            capacity,
            fpr,
            max_memory,
        } => {
            let mut builder = FilterConfigBuilder::default()
                .capacity(capacity)
                .false_positive_rate(fpr);
            if let Some(mem) = max_memory {
                builder = builder.max_bits(parse_mem(&mem)?.saturating_mul(8));
            }
            let config = builder.build()?;

            let (bits, hashes) = optimize(&config);
            let per_key = bits as f64 / capacity.max(1) as f64;

            println!("{bits} bits, {}", bits2hr(bits));
            println!("{per_key:.2} bits/{:.2} B per key", per_key / 8.0);
            println!("{hashes} hashes");
            println!(
                "{:.4} expected false positive rate",
                fp_rate(capacity, bits, hashes)
            );
        }

        Commands::Fpr {
            capacity,
            bits,
            hashes,
        } => {
            if bits == 0 || hashes == 0 {
                return Err("bits and hashes must be > 0".into());
            }
            println!("{:.6}", fp_rate(capacity, bits, hashes));
        }

        Commands::Inspect { path, load } => {
            let file = BufReader::new(File::open(&path)?);
            let mut loader = Loader::new(file)?;

            println!("Comment: {:?}", loader.comment());
            println!(
                "Size: {} bits ({}), {} blocks",
                loader.num_bits(),
                bits2hr(loader.num_bits()),
                loader.num_blocks()
            );
            println!("Hashes: {}", loader.num_hashes());

            if load {
                let filter = loader.load(None)?;
                let card = filter.cardinality();
                println!("Empty: {}", filter.is_empty());
                println!("Estimated cardinality: {card:.0}");
                if card.is_finite() {
                    println!(
                        "Estimated false positive rate: {:.6}",
                        filter.fp_rate(card.round() as u64)
                    );
                }
            }
        }
    }

    Ok(())
}
