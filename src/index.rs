//! Building a `k-mer -> probes` index from a probe library.
//!
//! Two builders produce the same [`KmerIndex`] shape: [`build_random_index`]
//! draws a fixed number of k-mers per probe at random, while
//! [`build_pigeonhole_index`] partitions each probe into disjoint blocks that
//! guarantee zero false negatives for a given mismatch budget.
//! [`build_index`] is the dispatcher that tries pigeonhole first and falls
//! back to the randomized builder.

use std::collections::{HashMap, HashSet};

use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use rand::Rng;

use crate::error::{CoreError, Result};
use crate::probe::Probe;

#[derive(Debug, Clone)]
pub enum Posting {
    Probes(HashSet<Probe>),
    ProbesWithPositions(HashSet<(Probe, u32)>),
}

impl Posting {
    fn new(include_positions: bool) -> Posting {
        if include_positions {
            Posting::ProbesWithPositions(HashSet::new())
        } else {
            Posting::Probes(HashSet::new())
        }
    }

    fn insert(&mut self, probe: &Probe, offset: u32) {
        match self {
            Posting::Probes(set) => {
                set.insert(probe.clone());
            }
            Posting::ProbesWithPositions(set) => {
                set.insert((probe.clone(), offset));
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct KmerIndex {
    k: usize,
    map: HashMap<String, Posting>,
}

impl KmerIndex {
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn get(&self, kmer: &str) -> Option<&Posting> {
        self.map.get(kmer)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Posting)> {
        self.map.iter()
    }
}

fn insert_probe_kmer(
    map: &mut HashMap<String, Posting>,
    kmer: &str,
    probe: &Probe,
    offset: u32,
    include_positions: bool,
) {
    map.entry(kmer.to_string())
        .or_insert_with(|| Posting::new(include_positions))
        .insert(probe, offset);
}

pub fn build_random_index(
    probes: &[Probe],
    k: usize,
    num_kmers_per_probe: usize,
    include_positions: bool,
    rng: &mut impl Rng,
) -> KmerIndex {
    let progress = index_progress_bar(probes.len());
    let mut map: HashMap<String, Posting> = HashMap::new();
    for probe in probes {
        if k == 0 || probe.len() < k {
            progress.inc(1);
            continue;
        }
        let max_offset = probe.len() - k;
        for _ in 0..num_kmers_per_probe {
            let offset = if max_offset == 0 {
                0
            } else {
                rng.gen_range(0..=max_offset)
            };
            let kmer = &probe.as_str()[offset..offset + k];
            insert_probe_kmer(&mut map, kmer, probe, offset as u32, include_positions);
        }
        progress.inc(1);
    }
    progress.finish_and_clear();
    KmerIndex { k, map }
}

fn index_progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::with_template("indexing probes {bar:40.cyan/blue} {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

/// By the pigeonhole principle, a probe matching a window with at most
/// `mismatches` mismatches must match at least one of its `mismatches + 1`
/// disjoint length-`k` blocks exactly, so this construction has zero false
/// negatives.
pub fn build_pigeonhole_index(
    probes: &[Probe],
    mismatches: usize,
    min_k: usize,
    include_positions: bool,
) -> Result<KmerIndex> {
    let shortest = probes.iter().map(|p| p.len()).min().unwrap_or(0);
    let k = shortest / (mismatches + 1);
    if k == 0 || k < min_k {
        return Err(CoreError::PigeonholeRequiresTooSmallKmerSize);
    }

    let progress = index_progress_bar(probes.len());
    let mut map: HashMap<String, Posting> = HashMap::new();
    for probe in probes {
        for block in 0..=mismatches {
            let offset = block * k;
            if offset + k > probe.len() {
                break;
            }
            let kmer = &probe.as_str()[offset..offset + k];
            insert_probe_kmer(&mut map, kmer, probe, offset as u32, include_positions);
        }
        progress.inc(1);
    }
    progress.finish_and_clear();
    Ok(KmerIndex { k, map })
}

fn choose_num_kmers_per_probe(k: usize, probe_len: usize) -> usize {
    const FALSE_NEGATIVE_BUDGET: f64 = 1e-7;
    if probe_len == 0 || k == 0 || k >= probe_len {
        return 1;
    }
    let miss_one_draw = 1.0 - (k as f64 / probe_len as f64);
    let n = (FALSE_NEGATIVE_BUDGET.ln() / miss_one_draw.ln()).ceil();
    n.max(1.0) as usize
}

pub fn build_index(
    probes: &[Probe],
    mismatches: usize,
    lcf_thres: usize,
    min_k: Option<usize>,
    k: Option<usize>,
    include_positions: bool,
    rng: &mut impl Rng,
) -> Result<KmerIndex> {
    debug!(
        "building k-mer index for {} probes (mismatches={mismatches}, lcf_thres={lcf_thres})",
        probes.len()
    );
    if let Some(min_k) = min_k {
        match build_pigeonhole_index(probes, mismatches, min_k, include_positions) {
            Ok(index) => return Ok(index),
            Err(CoreError::PigeonholeRequiresTooSmallKmerSize) => {
                debug!(
                    "pigeonhole partitioning needs k < min_k ({min_k}); \
                     falling back to the randomized builder"
                );
            }
            Err(e) => return Err(e),
        }
    }
    let k = k.ok_or_else(|| {
        CoreError::InvalidProbe("randomized index construction requires an explicit k".into())
    })?;
    let probe_len = probes.iter().map(|p| p.len()).min().unwrap_or(k);
    let n = choose_num_kmers_per_probe(k, probe_len);
    Ok(build_random_index(probes, k, n, include_positions, rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn p(s: &str) -> Probe {
        Probe::from_string(s).unwrap()
    }

    fn contains_probe(posting: &Posting, probe: &Probe) -> bool {
        match posting {
            Posting::Probes(set) => set.contains(probe),
            Posting::ProbesWithPositions(set) => set.iter().any(|(pr, _)| pr == probe),
        }
    }

    #[test]
    fn test_random_index_recovers_most_kmers() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let bases = ['A', 'T', 'C', 'G'];
        let probes: Vec<Probe> = (0..50)
            .map(|_| {
                let s: String = (0..100).map(|_| bases[rng.gen_range(0..4)]).collect();
                p(&s)
            })
            .collect();
        let k = 15;
        let n = 10;
        let index = build_random_index(&probes, k, n, false, &mut rng);
        for probe in &probes {
            let found = probe
                .construct_kmers(k)
                .into_iter()
                .filter(|kmer| {
                    index
                        .get(kmer)
                        .map(|posting| contains_probe(posting, probe))
                        .unwrap_or(false)
                })
                .count();
            assert!(found as f64 >= 0.8 * n as f64 - 2.0);
        }
    }

    #[test]
    fn test_random_index_shared_kmer() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let a = p("ABCDEFG");
        let b = p("XYZDEFH");
        let index = build_random_index(&[a.clone(), b.clone()], 3, 50, false, &mut rng);
        assert!(contains_probe(index.get("DEF").unwrap(), &a));
        assert!(contains_probe(index.get("DEF").unwrap(), &b));
        assert!(contains_probe(index.get("ABC").unwrap(), &a));
        assert!(!contains_probe(index.get("ABC").unwrap(), &b));
        assert!(index.get("XYZ").is_none() || !contains_probe(index.get("XYZ").unwrap(), &a));
        assert!(contains_probe(index.get("XYZ").unwrap(), &b));
    }

    #[test]
    fn test_random_index_positions() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let a = p("ABCDEFGABC");
        let b = p("XYZDEFHGHI");
        let index = build_random_index(&[a.clone(), b.clone()], 3, 50, true, &mut rng);
        let def = match index.get("DEF").unwrap() {
            Posting::ProbesWithPositions(set) => set.clone(),
            _ => panic!("expected positions"),
        };
        assert_eq!(def, HashSet::from([(a.clone(), 3), (b.clone(), 3)]));
        let abc = match index.get("ABC").unwrap() {
            Posting::ProbesWithPositions(set) => set.clone(),
            _ => panic!("expected positions"),
        };
        assert_eq!(abc, HashSet::from([(a.clone(), 0), (a.clone(), 7)]));
    }

    #[test]
    fn test_pigeonhole_no_mismatches() {
        let a = p("ABCDEFGHIJ");
        let b = p("ZYXWVUTSRQ");
        let index = build_pigeonhole_index(&[a.clone(), b.clone()], 0, 5, false).unwrap();
        assert!(contains_probe(index.get(a.as_str()).unwrap(), &a));
        assert!(contains_probe(index.get(b.as_str()).unwrap(), &b));
    }

    #[test]
    fn test_pigeonhole_too_small_k() {
        let a = p("ABCDEFGHIJ");
        let b = p("ZYXWVUTSRQ");
        assert!(matches!(
            build_pigeonhole_index(&[a.clone(), b.clone()], 1, 6, false),
            Err(CoreError::PigeonholeRequiresTooSmallKmerSize)
        ));
        assert!(matches!(
            build_pigeonhole_index(&[a, b], 3, 3, false),
            Err(CoreError::PigeonholeRequiresTooSmallKmerSize)
        ));
    }

    #[test]
    fn test_pigeonhole_one_mismatch() {
        let a = p("ABCDEFGHIJ");
        let b = p("ZYXWVUTSRQ");
        let index = build_pigeonhole_index(&[a.clone(), b.clone()], 1, 2, false).unwrap();
        assert_eq!(index.k(), 5);
        assert_eq!(index.len(), 4);
        assert!(contains_probe(index.get("ABCDE").unwrap(), &a));
        assert!(contains_probe(index.get("FGHIJ").unwrap(), &a));
        assert!(contains_probe(index.get("ZYXWV").unwrap(), &b));
        assert!(contains_probe(index.get("UTSRQ").unwrap(), &b));
    }

    #[test]
    fn test_pigeonhole_shared_kmer() {
        let a = p("ABCDEFGHIJ");
        let b = p("ZYXWVABCDE");
        let index = build_pigeonhole_index(&[a.clone(), b.clone()], 1, 2, false).unwrap();
        assert_eq!(index.len(), 3);
        assert!(contains_probe(index.get("ABCDE").unwrap(), &a));
        assert!(contains_probe(index.get("ABCDE").unwrap(), &b));
        assert!(contains_probe(index.get("FGHIJ").unwrap(), &a));
        assert!(contains_probe(index.get("ZYXWV").unwrap(), &b));
    }

    #[test]
    fn test_pigeonhole_positions() {
        let a = p("ABCDEFGH");
        let b = p("ZYXWVUAB");
        let index = build_pigeonhole_index(&[a.clone(), b.clone()], 3, 2, true).unwrap();
        assert_eq!(index.k(), 2);
        assert_eq!(index.len(), 7);
        let ab = match index.get("AB").unwrap() {
            Posting::ProbesWithPositions(set) => set.clone(),
            _ => panic!("expected positions"),
        };
        assert_eq!(ab, HashSet::from([(a.clone(), 0), (b.clone(), 6)]));
    }

    #[test]
    fn test_dispatcher_prefers_pigeonhole() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let a = p("GHIJXL");
        let b = p("BTUVWX");
        let c = p("ACEFHJ");
        let index = build_index(&[a, b, c], 1, 6, Some(3), Some(4), false, &mut rng).unwrap();
        assert_eq!(index.k(), 3);
    }

    #[test]
    fn test_dispatcher_falls_back_to_random() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let a = p("GHIJXL");
        let b = p("BTUVWX");
        let c = p("ACEFHJ");
        let index = build_index(&[a, b, c], 1, 6, Some(4), Some(4), false, &mut rng).unwrap();
        assert_eq!(index.k(), 4);
    }
}
