use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    author = "Sam Dougan",
    version = "0.1.0",
    about = "A kmer-based probe/sequence matching engine",
    long_about = "Builds a kmer index from a probe library and either scans a target \
    sequence for probe covers, or generates a redundant tiling of candidate probes \
    from a sequence.",
    after_help = "\
EXAMPLES:
  Cover mode:
    probecover cover -p probes.fa -s target.fa -m 2 -l 80

  Candidate generation:
    probecover candidates -i genome.fa -k 100 --stride 50",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Args {
    #[arg(
        short = 't',
        long = "threads",
        default_value_t = 0,
        global = true,
        help = "Number of worker threads to use (0 = all available cores)"
    )]
    pub threads: usize,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Cover(CoverArgs),
    Candidates(CandidatesArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct CoverArgs {
    #[arg(short = 'p', long = "probes", help = "FASTA file of probes")]
    pub probes_fasta: String,

    #[arg(short = 's', long = "sequence", help = "FASTA file of target sequences")]
    pub sequence_fasta: String,

    #[arg(
        short = 'm',
        long = "mismatches",
        default_value_t = 0,
        help = "Mismatches tolerated within a cover"
    )]
    pub mismatches: usize,

    #[arg(
        short = 'l',
        long = "lcf_thres",
        default_value_t = 80,
        help = "Minimum length of a covering run"
    )]
    pub lcf_thres: usize,

    #[arg(
        long = "island",
        default_value_t = 0,
        help = "Required length of an exact-match island within a cover (0 = none)"
    )]
    pub island: usize,

    #[arg(
        long = "min_k",
        help = "Minimum kmer size for pigeonhole partitioning; omit to use randomized sampling"
    )]
    pub min_k: Option<usize>,

    #[arg(
        short = 'k',
        long = "kmer_size",
        help = "Explicit kmer size for randomized sampling (required if --min_k is omitted)"
    )]
    pub kmer_size: Option<usize>,

    #[arg(short = 'o', long = "output", help = "Write cover ranges to this file instead of stdout")]
    pub output: Option<String>,

    #[arg(
        long = "use_native_dict",
        action = clap::ArgAction::SetTrue,
        help = "Freeze the index as a native hash map instead of the packed layout"
    )]
    pub use_native_dict: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CandidatesArgs {
    #[arg(short = 'i', long = "input", help = "FASTA file to tile into candidate probes")]
    pub input_fasta: String,

    #[arg(
        short = 'k',
        long = "probe_length",
        default_value_t = 100,
        help = "Length of each candidate probe"
    )]
    pub probe_length: usize,

    #[arg(long = "stride", default_value_t = 50, help = "Stride between tiling windows")]
    pub probe_stride: usize,

    #[arg(
        long = "min_n_string_length",
        default_value_t = 2,
        help = "Minimum run of N's that rejects a window"
    )]
    pub min_n_string_length: usize,

    #[arg(
        long = "no_end_probe",
        action = clap::ArgAction::SetTrue,
        help = "Don't add a probe anchored to the sequence tail when the stride doesn't divide it evenly"
    )]
    pub no_end_probe: bool,

    #[arg(
        long = "legacy_mode",
        action = clap::ArgAction::SetTrue,
        help = "Replicate the historical single-N bug at certain window offsets"
    )]
    pub legacy_mode: bool,

    #[arg(short = 'o', long = "output", help = "Write candidate probes as FASTA to this file instead of stdout")]
    pub output: Option<String>,
}

pub fn parse_args() -> Args {
    let args = Args::try_parse();

    match args {
        Ok(args) => args,
        Err(e) => {
            e.exit();
        }
    }
}
