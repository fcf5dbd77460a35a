//! The cover predicate: the classic "longest subarray with at most `k` bad
//! elements" sliding window, run over the aligned overlap between a probe
//! and a sequence.

use crate::probe::bases_match;

/// Parameters controlling when a probe is considered to cover a sequence.
#[derive(Debug, Clone, Copy)]
pub struct CoverParams {
    pub mismatches: usize,
    pub lcf_thres: usize,
    pub island: usize,
}

/// A cover predicate bundled with its parameters, produced by
/// [`make_cover_fn`] and installed into a pool at open time rather than
/// baked in as a closure.
pub type CoverFn = CoverParams;

pub fn make_cover_fn(mismatches: usize, lcf_thres: usize, island: usize) -> CoverFn {
    CoverParams {
        mismatches,
        lcf_thres,
        island,
    }
}

/// Finds the longest run of `sequence`, aligned against `probe` at the
/// given `offset` (`sequence[i]` is compared against `probe[i - offset]`),
/// that stays within `params`' mismatch budget.
pub fn longest_cover(
    probe: &str,
    sequence: &str,
    offset: isize,
    params: &CoverParams,
) -> Option<(usize, usize)> {
    let probe: Vec<char> = probe.chars().collect();
    let sequence: Vec<char> = sequence.chars().collect();
    let l = probe.len() as isize;
    let n = sequence.len() as isize;

    let lo = offset.max(0);
    let hi = (offset + l).min(n);
    if hi <= lo {
        return None;
    }

    let mismatch_at = |j: isize| -> bool {
        let pi = (j - offset) as usize;
        !bases_match(probe[pi], sequence[j as usize])
    };

    let mut left = lo;
    let mut mismatch_count = 0usize;
    let mut best_len = 0isize;
    let mut best_start = lo;
    let mut j = lo;
    while j < hi {
        if mismatch_at(j) {
            mismatch_count += 1;
        }
        while mismatch_count > params.mismatches {
            if mismatch_at(left) {
                mismatch_count -= 1;
            }
            left += 1;
        }
        let cur_len = j - left + 1;
        if cur_len > best_len {
            best_len = cur_len;
            best_start = left;
        }
        j += 1;
    }

    if (best_len as usize) < params.lcf_thres {
        return None;
    }
    let best_end = best_start + best_len;

    if params.island > 0 && !has_exact_run(&mismatch_at, best_start, best_end, params.island) {
        return None;
    }

    Some((best_start as usize, best_end as usize))
}

fn has_exact_run(
    mismatch_at: &dyn Fn(isize) -> bool,
    start: isize,
    end: isize,
    island: usize,
) -> bool {
    let mut run = 0usize;
    for j in start..end {
        if mismatch_at(j) {
            run = 0;
        } else {
            run += 1;
            if run >= island {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEQ: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    #[test]
    fn test_make_cover_fn_matches_manual_params() {
        let cover_fn = make_cover_fn(1, 6, 4);
        assert_eq!(cover_fn.mismatches, 1);
        assert_eq!(cover_fn.lcf_thres, 6);
        assert_eq!(cover_fn.island, 4);
    }

    #[test]
    fn test_exact_match_at_zero_offset() {
        let params = CoverParams {
            mismatches: 0,
            lcf_thres: 6,
            island: 0,
        };
        // "GHIJKL" sits at offset 6 in both the probe and SEQ, so aligning
        // the probe at offset 0 finds an exact 6-char run there.
        let probe = "ZZZABCGHIJKLXYZ";
        let got = longest_cover(probe, SEQ, 0, &params);
        assert_eq!(got, Some((6, 12)));
    }

    #[test]
    fn test_no_match_when_run_too_short() {
        let params = CoverParams {
            mismatches: 0,
            lcf_thres: 10,
            island: 0,
        };
        let probe = "ZZZABCGHIJKLXYZ";
        assert_eq!(longest_cover(probe, SEQ, 0, &params), None);
    }

    #[test]
    fn test_match_with_mismatches() {
        let params = CoverParams {
            mismatches: 2,
            lcf_thres: 6,
            island: 0,
        };
        // Two mismatches inside the run ('X' for 'I', 'Y' for 'K') should
        // still be tolerated under a budget of 2.
        let probe = "ZZZABCGHXJYLXYZ";
        let got = longest_cover(probe, SEQ, 0, &params);
        assert_eq!(got, Some((6, 12)));
    }

    #[test]
    fn test_too_many_mismatches_fails() {
        let params = CoverParams {
            mismatches: 1,
            lcf_thres: 6,
            island: 0,
        };
        let probe = "ZZZABCGHXJYLXYZ";
        assert_eq!(longest_cover(probe, SEQ, 0, &params), None);
    }

    #[test]
    fn test_island_requirement_satisfied() {
        let params = CoverParams {
            mismatches: 1,
            lcf_thres: 6,
            island: 4,
        };
        // One mismatch ('X' for 'E') flanked by exact runs of 4 ("ABCD")
        // and 5 ("FGHIJ") against SEQ[0..10] = "ABCDEFGHIJ".
        let probe = "ABCDXFGHIJ";
        let got = longest_cover(probe, SEQ, 0, &params);
        assert_eq!(got, Some((0, 10)));
    }

    #[test]
    fn test_island_requirement_unsatisfied() {
        let params = CoverParams {
            mismatches: 2,
            lcf_thres: 6,
            island: 5,
        };
        // Two mismatches ('X' for 'D' and 'X' for 'H') against
        // SEQ[0..10] = "ABCDEFGHIJ" break every exact run below length 5.
        let probe = "ABCXEFGXIJ";
        assert_eq!(longest_cover(probe, SEQ, 0, &params), None);
    }

    #[test]
    fn test_probe_overhangs_sequence_start() {
        let params = CoverParams {
            mismatches: 0,
            lcf_thres: 4,
            island: 0,
        };
        // offset -3: probe[3..] aligns with SEQ[0..]; only the overlap
        // (probe[3..]) is considered.
        let probe = "XXXABCDEFG";
        let got = longest_cover(probe, SEQ, -3, &params);
        assert_eq!(got, Some((0, 7)));
    }

    #[test]
    fn test_probe_overhangs_sequence_end() {
        let params = CoverParams {
            mismatches: 0,
            lcf_thres: 4,
            island: 0,
        };
        let short_seq = "DEFG";
        let got = longest_cover("DEFGXXXX", short_seq, 0, &params);
        assert_eq!(got, Some((0, 4)));
    }

    #[test]
    fn test_n_never_matches() {
        let params = CoverParams {
            mismatches: 0,
            lcf_thres: 3,
            island: 0,
        };
        assert_eq!(longest_cover("ANA", "ANA", 0, &params), None);
    }

    #[test]
    fn test_no_overlap_returns_none() {
        let params = CoverParams {
            mismatches: 0,
            lcf_thres: 1,
            island: 0,
        };
        assert_eq!(longest_cover("ABC", "DEF", 100, &params), None);
    }
}
