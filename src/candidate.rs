//! The candidate-probe producer: a sliding window over a sequence that
//! emits many, likely-redundant candidate probes, skipping windows with
//! long runs of `N` and instead adding probes that flank those runs.
//!
//! Faithfully reproduces a historical bug from the original Matlab-era
//! tool's "B adapter" probe, selectable via `legacy_mode` rather than
//! carried forward unconditionally: at certain windows, a probe
//! containing exactly one `N` was (incorrectly) treated as valid even
//! when `min_n_string_length` would otherwise reject it.

use regex::Regex;

use crate::error::Result;
use crate::probe::Probe;

/// Parameters for [`make_candidate_probes`].
#[derive(Debug, Clone)]
pub struct CandidateParams {
    pub probe_length: usize,
    pub probe_stride: usize,
    pub min_n_string_length: usize,
    pub add_probe_for_end_bases: bool,
    /// Replicates the original tool's single-`N` bug at windows where
    /// `start % probe_length == probe_stride`.
    pub legacy_mode: bool,
}

impl Default for CandidateParams {
    fn default() -> Self {
        CandidateParams {
            probe_length: 100,
            probe_stride: 50,
            min_n_string_length: 2,
            add_probe_for_end_bases: true,
            legacy_mode: false,
        }
    }
}

/// Slides a window of `probe_length` across `seq` in steps of
/// `probe_stride`, emitting one candidate probe per window that does not
/// contain a run of `min_n_string_length` or more `N`s. Windows that would
/// be rejected instead contribute a probe immediately to the left and to
/// the right of each rejected `N`-run (not recursively re-checked), and if
/// `add_probe_for_end_bases` is set and the stride does not evenly divide
/// the sequence, one more probe is anchored to the sequence's tail.
///
/// Duplicates across these sources are not deduplicated -- the producer is
/// deliberately redundant, leaving selection to downstream filtering.
pub fn make_candidate_probes(seq: &str, params: &CandidateParams) -> Result<Vec<Probe>> {
    if params.probe_length > seq.len() {
        return Err(crate::error::CoreError::InvalidProbe(format!(
            "probe_length {} exceeds sequence length {}",
            params.probe_length,
            seq.len()
        )));
    }

    let n_run_pattern = format!("N{{{},}}", params.min_n_string_length);
    let n_string_query = Regex::new(&n_run_pattern)
        .expect("min_n_string_length-derived regex is always well-formed");

    let mut candidates: Vec<String> = Vec::new();

    let add_probe_from_subsequence =
        |start: usize, end: usize, is_bug_location: bool, out: &mut Vec<String>| {
            let subseq = &seq[start..end];
            if params.legacy_mode && is_bug_location {
                if !subseq.contains('N') {
                    out.push(subseq.to_string());
                }
            } else if !n_string_query.is_match(subseq) {
                out.push(subseq.to_string());
            }
        };

    let mut start = 0usize;
    while start < seq.len() {
        if start + params.probe_length > seq.len() {
            break;
        }
        let is_bug_location = params.probe_length != 0
            && start % params.probe_length == params.probe_stride;
        add_probe_from_subsequence(
            start,
            start + params.probe_length,
            is_bug_location,
            &mut candidates,
        );
        start += params.probe_stride;
    }

    if params.probe_stride != 0
        && seq.len() % params.probe_stride != 0
        && params.add_probe_for_end_bases
    {
        add_probe_from_subsequence(
            seq.len() - params.probe_length,
            seq.len(),
            false,
            &mut candidates,
        );
    }

    for m in n_string_query.find_iter(seq) {
        if m.start() >= params.probe_length {
            add_probe_from_subsequence(m.start() - params.probe_length, m.start(), false, &mut candidates);
        }
        if m.end() + params.probe_length <= seq.len() {
            add_probe_from_subsequence(m.end(), m.end() + params.probe_length, false, &mut candidates);
        }
    }

    candidates
        .into_iter()
        .map(|s| Probe::from_string(&s))
        .collect()
}

/// Runs [`make_candidate_probes`] over every sequence in `seqs` and
/// concatenates the results.
pub fn make_candidate_probes_from_sequences(
    seqs: &[String],
    params: &CandidateParams,
) -> Result<Vec<Probe>> {
    let mut all = Vec::new();
    for seq in seqs {
        all.extend(make_candidate_probes(seq, params)?);
    }
    Ok(all)
}
