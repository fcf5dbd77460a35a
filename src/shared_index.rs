//! A read-only k-mer index meant to be shared, unlocked, across worker
//! threads: built once from a [`KmerIndex`], then frozen. Two storage modes
//! back the same `get` interface -- a native hash map, or a packed layout
//! (interned probe ids + one contiguous `(probe_id, offset)` array + a
//! per-kmer slice descriptor) -- selected by the caller at freeze time.

use std::collections::HashMap;
use std::sync::Arc;

use crate::index::{KmerIndex, Posting};
use crate::probe::Probe;

#[derive(Debug, Clone, Copy)]
struct Slice {
    start: u32,
    len: u32,
}

#[derive(Debug, Clone)]
pub enum SharedPosting<'a> {
    Probes(Vec<&'a Probe>),
    ProbesWithPositions(Vec<(&'a Probe, u32)>),
}

enum Storage {
    Native(HashMap<String, Posting>),
    Packed {
        probes: Vec<Probe>,
        entries: Vec<(u32, u32)>,
        offsets: HashMap<String, Slice>,
        with_positions: bool,
    },
}

pub struct SharedKmerIndex {
    k: usize,
    storage: Storage,
}

impl SharedKmerIndex {
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn is_native(&self) -> bool {
        matches!(self.storage, Storage::Native(_))
    }

    pub fn freeze(index: KmerIndex, use_native_dict: bool) -> SharedKmerIndex {
        if use_native_dict {
            let map: HashMap<String, Posting> =
                index.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            return SharedKmerIndex {
                k: index.k(),
                storage: Storage::Native(map),
            };
        }

        let mut probe_ids: HashMap<Probe, u32> = HashMap::new();
        let mut probes: Vec<Probe> = Vec::new();
        let mut intern = |probe: &Probe| -> u32 {
            if let Some(&id) = probe_ids.get(probe) {
                return id;
            }
            let id = probes.len() as u32;
            probes.push(probe.clone());
            probe_ids.insert(probe.clone(), id);
            id
        };

        let with_positions = index
            .iter()
            .next()
            .map(|(_, posting)| matches!(posting, Posting::ProbesWithPositions(_)))
            .unwrap_or(false);

        let mut entries: Vec<(u32, u32)> = Vec::new();
        let mut offsets: HashMap<String, Slice> = HashMap::new();
        for (kmer, posting) in index.iter() {
            let start = entries.len() as u32;
            match posting {
                Posting::Probes(set) => {
                    for probe in set {
                        entries.push((intern(probe), 0));
                    }
                }
                Posting::ProbesWithPositions(set) => {
                    for (probe, offset) in set {
                        entries.push((intern(probe), *offset));
                    }
                }
            }
            let len = entries.len() as u32 - start;
            offsets.insert(kmer.clone(), Slice { start, len });
        }

        SharedKmerIndex {
            k: index.k(),
            storage: Storage::Packed {
                probes,
                entries,
                offsets,
                with_positions,
            },
        }
    }

    pub fn get(&self, kmer: &str) -> Option<SharedPosting<'_>> {
        match &self.storage {
            Storage::Native(map) => map.get(kmer).map(|posting| match posting {
                Posting::Probes(set) => SharedPosting::Probes(set.iter().collect()),
                Posting::ProbesWithPositions(set) => {
                    SharedPosting::ProbesWithPositions(set.iter().map(|(p, o)| (p, *o)).collect())
                }
            }),
            Storage::Packed {
                probes,
                entries,
                offsets,
                with_positions,
            } => {
                let slice = offsets.get(kmer)?;
                let range = slice.start as usize..(slice.start + slice.len) as usize;
                if *with_positions {
                    Some(SharedPosting::ProbesWithPositions(
                        entries[range]
                            .iter()
                            .map(|(id, offset)| (&probes[*id as usize], *offset))
                            .collect(),
                    ))
                } else {
                    Some(SharedPosting::Probes(
                        entries[range]
                            .iter()
                            .map(|(id, _)| &probes[*id as usize])
                            .collect(),
                    ))
                }
            }
        }
    }

    pub fn into_arc(self) -> Arc<SharedKmerIndex> {
        Arc::new(self)
    }
}
