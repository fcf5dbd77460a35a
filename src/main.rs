mod cli;

use std::fs::File;
use std::io::{self, BufReader, Write};

use bio::io::fasta;
use log::info;
use probecover::{
    build_index, close_probe_finding_pool, find_probe_covers_in_sequence, make_candidate_probes,
    make_cover_fn, open_probe_finding_pool, CandidateParams, CoreError, Probe, Result,
    SharedKmerIndex,
};
use rand::SeedableRng;

use crate::cli::{parse_args, Args, CandidatesArgs, Commands, CoverArgs};

fn read_fasta_records(path: &str) -> Result<Vec<(String, String)>> {
    let file = File::open(path).map_err(CoreError::Io)?;
    let reader = fasta::Reader::new(BufReader::new(file));
    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| CoreError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        let seq = String::from_utf8_lossy(record.seq()).to_string();
        records.push((record.id().to_string(), seq));
    }
    Ok(records)
}

fn configure_thread_pool(threads: usize) {
    let n = if threads == 0 {
        info!("using all logical cores");
        num_cpus::get()
    } else {
        threads
    };
    rayon::ThreadPoolBuilder::new()
        .num_threads(n)
        .build_global()
        .expect("failed to build global rayon thread pool");
}

fn run(args: Args) -> Result<()> {
    configure_thread_pool(args.threads);
    match &args.command {
        Commands::Cover(cover_args) => run_cover_command(cover_args),
        Commands::Candidates(candidates_args) => run_candidates_command(candidates_args),
    }
}

fn run_cover_command(args: &CoverArgs) -> Result<()> {
    let probe_records = read_fasta_records(&args.probes_fasta)?;
    let probes: Vec<Probe> = probe_records
        .iter()
        .map(|(_, seq)| Probe::from_string(seq))
        .collect::<Result<_>>()?;
    info!("loaded {} probes from {}", probes.len(), args.probes_fasta);

    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5EED_5EED);
    let raw_index = build_index(
        &probes,
        args.mismatches,
        args.lcf_thres,
        args.min_k,
        args.kmer_size,
        true,
        &mut rng,
    )?;
    let index = SharedKmerIndex::freeze(raw_index, args.use_native_dict).into_arc();
    let cover_fn = make_cover_fn(args.mismatches, args.lcf_thres, args.island);
    open_probe_finding_pool(index, cover_fn, None, args.use_native_dict)?;

    let targets = read_fasta_records(&args.sequence_fasta)?;
    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path).map_err(CoreError::Io)?),
        None => Box::new(io::stdout()),
    };

    for (name, seq) in &targets {
        let covers = find_probe_covers_in_sequence(seq)?;
        for (probe, ranges) in covers {
            for range in ranges {
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}",
                    name,
                    range.start,
                    range.end,
                    probe.as_str()
                )
                .map_err(CoreError::Io)?;
            }
        }
    }

    close_probe_finding_pool()?;
    Ok(())
}

fn run_candidates_command(args: &CandidatesArgs) -> Result<()> {
    let params = CandidateParams {
        probe_length: args.probe_length,
        probe_stride: args.probe_stride,
        min_n_string_length: args.min_n_string_length,
        add_probe_for_end_bases: !args.no_end_probe,
        legacy_mode: args.legacy_mode,
    };

    let records = read_fasta_records(&args.input_fasta)?;
    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path).map_err(CoreError::Io)?),
        None => Box::new(io::stdout()),
    };

    let mut total = 0usize;
    for (name, seq) in &records {
        let probes = make_candidate_probes(seq, &params)?;
        for (i, probe) in probes.iter().enumerate() {
            writeln!(out, ">{name}_candidate_{i}\n{}", probe.as_str()).map_err(CoreError::Io)?;
        }
        total += probes.len();
    }
    info!("generated {total} candidate probes");

    Ok(())
}

fn main() {
    let args = parse_args();
    probecover::logging::set_up_logging();

    if let Err(e) = run(args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
