//! Fixed-length nucleotide sequences and the comparisons run against them.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use dashmap::DashMap;
use fxhash::FxHasher64;
use rand::Rng;

use crate::error::{CoreError, Result};

/// One base in a probe. `N` is an ambiguity code: it never compares equal to
/// anything, not even another `N`, when counting mismatches. Any other
/// alphabetic character is accepted and compared structurally — the engine
/// itself is alphabet-agnostic past that one special case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Base(char);

impl Base {
    fn from_char(c: char) -> Option<Base> {
        if c.is_alphabetic() {
            Some(Base(c))
        } else {
            None
        }
    }

    fn is_n(self) -> bool {
        self.0 == 'N' || self.0 == 'n'
    }

    fn complement(self) -> Base {
        let c = match self.0 {
            'A' => 'T',
            'T' => 'A',
            'C' => 'G',
            'G' => 'C',
            'a' => 't',
            't' => 'a',
            'c' => 'g',
            'g' => 'c',
            other => other,
        };
        Base(c)
    }

    fn matches(self, other: Base) -> bool {
        bases_match(self.0, other.0)
    }
}

pub(crate) fn bases_match(a: char, b: char) -> bool {
    let is_n = |c: char| c == 'N' || c == 'n';
    if is_n(a) || is_n(b) {
        false
    } else {
        a == b
    }
}

#[derive(Debug, Clone)]
pub struct Probe {
    bases: Arc<[Base]>,
    seq_str: Arc<str>,
    identifier: u64,
}

impl PartialEq for Probe {
    fn eq(&self, other: &Self) -> bool {
        self.bases == other.bases
    }
}

impl Eq for Probe {}

impl Hash for Probe {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Consistent with Eq: equal base vectors always produce equal
        // identifiers, so hashing the identifier alone cannot violate the
        // Hash/Eq contract.
        self.identifier.hash(state);
    }
}

fn compute_identifier(bases: &[Base]) -> u64 {
    let mut hasher = FxHasher64::default();
    bases.hash(&mut hasher);
    hasher.finish()
}

impl Probe {
    pub fn from_string(s: &str) -> Result<Probe> {
        let bases: Vec<Base> = s
            .chars()
            .map(Base::from_char)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                CoreError::InvalidProbe(format!("probe string is not all-alphabetic: {s:?}"))
            })?;
        Ok(Self::from_bases(bases))
    }

    fn from_bases(bases: Vec<Base>) -> Probe {
        let identifier = compute_identifier(&bases);
        let seq_str: String = bases.iter().map(|b| b.0).collect();
        Probe {
            bases: bases.into(),
            seq_str: seq_str.into(),
            identifier,
        }
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.seq_str
    }

    pub fn identifier(&self) -> u64 {
        self.identifier
    }

    pub fn mismatches(&self, other: &Probe) -> Result<usize> {
        if self.len() != other.len() {
            return Err(CoreError::InvalidProbe(format!(
                "mismatches requires equal-length probes ({} vs {})",
                self.len(),
                other.len()
            )));
        }
        Ok(self
            .bases
            .iter()
            .zip(other.bases.iter())
            .filter(|(a, b)| !a.matches(**b))
            .count())
    }

    pub fn mismatches_at_offset(&self, other: &Probe, d: isize) -> Result<usize> {
        let l = self.len();
        if l != other.len() {
            return Err(CoreError::InvalidProbe(format!(
                "mismatches_at_offset requires equal-length probes ({} vs {})",
                l,
                other.len()
            )));
        }
        if l == 0 || d.unsigned_abs() >= l {
            return Err(CoreError::InvalidProbe(format!(
                "offset {d} out of range for length {l}"
            )));
        }
        let l = l as isize;
        let lo = d.max(0);
        let hi = (l + d).min(l);
        let mut mismatches = 0usize;
        let mut i = lo;
        while i < hi {
            let a = self.bases[i as usize];
            let b = other.bases[(i - d) as usize];
            if !a.matches(b) {
                mismatches += 1;
            }
            i += 1;
        }
        Ok(mismatches)
    }

    pub fn min_mismatches_within_shift(&self, other: &Probe, s: usize) -> Result<usize> {
        if self.len() != other.len() {
            return Err(CoreError::InvalidProbe(format!(
                "min_mismatches_within_shift requires equal-length probes ({} vs {})",
                self.len(),
                other.len()
            )));
        }
        let l = self.len();
        let max_d = if l == 0 { 0 } else { l - 1 };
        let bound = s.min(max_d) as isize;
        let mut best = usize::MAX;
        for d in -bound..=bound {
            let m = self.mismatches_at_offset(other, d)?;
            if m < best {
                best = m;
            }
        }
        Ok(best)
    }

    pub fn reverse_complement(&self) -> Probe {
        let bases: Vec<Base> = self.bases.iter().rev().map(|b| b.complement()).collect();
        Self::from_bases(bases)
    }

    pub fn with_prepended_str(&self, s: &str) -> Result<Probe> {
        let prefix: Vec<Base> = s
            .chars()
            .map(Base::from_char)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| CoreError::InvalidProbe(format!("not all-alphabetic: {s:?}")))?;
        let mut bases = prefix;
        bases.extend_from_slice(&self.bases);
        Ok(Self::from_bases(bases))
    }

    pub fn with_appended_str(&self, s: &str) -> Result<Probe> {
        let suffix: Vec<Base> = s
            .chars()
            .map(Base::from_char)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| CoreError::InvalidProbe(format!("not all-alphabetic: {s:?}")))?;
        let mut bases: Vec<Base> = self.bases.to_vec();
        bases.extend(suffix);
        Ok(Self::from_bases(bases))
    }

    pub fn construct_kmers(&self, k: usize) -> Vec<String> {
        if k == 0 || k > self.len() {
            return Vec::new();
        }
        (0..=self.len() - k)
            .map(|i| self.seq_str[i..i + k].to_string())
            .collect()
    }

    fn kmer_at(&self, offset: usize, k: usize) -> &str {
        &self.seq_str[offset..offset + k]
    }

    /// `memo`, if given, caches `other`'s full k-mer set across calls.
    pub fn shares_some_kmers(
        &self,
        other: &Probe,
        k: usize,
        n: usize,
        memo: Option<&KmerMemo>,
        rng: &mut impl Rng,
    ) -> Option<String> {
        if k == 0 || k > self.len() || k > other.len() {
            return None;
        }
        let other_kmers = match memo {
            Some(memo) => memo.kmer_set(other, k),
            None => Arc::new(other.construct_kmers(k).into_iter().collect::<HashSet<_>>()),
        };
        let max_offset = self.len() - k;
        for _ in 0..n {
            let offset = rng.gen_range(0..=max_offset);
            let kmer = self.kmer_at(offset, k);
            if other_kmers.contains(kmer) {
                return Some(kmer.to_string());
            }
        }
        None
    }
}

#[derive(Debug, Default)]
pub struct KmerMemo {
    sets: DashMap<(u64, usize), Arc<HashSet<String>>>,
}

impl KmerMemo {
    pub fn new() -> Self {
        Self::default()
    }

    fn kmer_set(&self, probe: &Probe, k: usize) -> Arc<HashSet<String>> {
        self.sets
            .entry((probe.identifier(), k))
            .or_insert_with(|| Arc::new(probe.construct_kmers(k).into_iter().collect()))
            .clone()
    }
}
