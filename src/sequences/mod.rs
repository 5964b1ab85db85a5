use std::error::Error;
use std::fmt;

use anyhow::bail;
use bio::io::fasta::Record;
use hashbrown::HashSet;

use crate::io::DataError;
use crate::Result;

/// No sequences were given, nothing to compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyInputError;

impl fmt::Display for EmptyInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No sequences provided, at least one sequence is required")
    }
}
impl Error for EmptyInputError {}

/// Two sequences of one input differ in length, so they cannot be compared site by site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthMismatchError {
    pub id_a: String,
    pub len_a: usize,
    pub id_b: String,
    pub len_b: usize,
}

impl fmt::Display for LengthMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "All sequences must have the same length: {} has length {}, {} has length {}",
            self.id_a, self.len_a, self.id_b, self.len_b
        )
    }
}
impl Error for LengthMismatchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateIdError {
    pub id: String,
}

impl fmt::Display for DuplicateIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sequence id {} occurs more than once", self.id)
    }
}
impl Error for DuplicateIdError {}

/// Named sequences in input order.
///
/// Construction never fails; [`Sequences::validate`] checks the invariants needed for
/// pairwise comparison: at least one sequence, unique ids and a common length.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequences {
    pub(crate) s: Vec<Record>,
    pub(crate) aligned: bool,
    pub(crate) msa_len: usize,
}

impl Sequences {
    pub fn new(s: Vec<Record>) -> Sequences {
        let len = if s.is_empty() { 0 } else { symbol_len(s[0].seq()) };
        if s.iter().all(|rec| symbol_len(rec.seq()) == len) {
            Sequences {
                s,
                aligned: true,
                msa_len: len,
            }
        } else {
            Sequences {
                s,
                aligned: false,
                msa_len: 0,
            }
        }
    }

    /// Creates sequences from any collection of (name, sequence) pairs, keeping the
    /// iteration order of the collection.
    ///
    /// Names must be non-empty, sequences may hold any characters.
    ///
    /// # Example
    /// ```
    /// use std::collections::BTreeMap;
    /// use upgma::sequences::Sequences;
    ///
    /// let map = BTreeMap::from([("A", "AAAA"), ("B", "AAAC")]);
    /// let sequences = Sequences::from_map(map).unwrap();
    /// assert_eq!(sequences.len(), 2);
    /// assert_eq!(sequences.msa_len(), 4);
    /// ```
    pub fn from_map<I, K, V>(map: I) -> Result<Sequences>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut records = Vec::new();
        for (id, seq) in map {
            if id.as_ref().is_empty() {
                bail!(DataError {
                    message: String::from("Invalid sequence: expecting a non-empty id")
                });
            }
            records.push(Record::with_attrs(id.as_ref(), None, seq.as_ref().as_bytes()));
        }
        Ok(Sequences::new(records))
    }

    pub fn validate(&self) -> Result<()> {
        if self.s.is_empty() {
            bail!(EmptyInputError);
        }
        let mut ids = HashSet::with_capacity(self.s.len());
        for rec in &self.s {
            if !ids.insert(rec.id()) {
                bail!(DuplicateIdError {
                    id: rec.id().to_string()
                });
            }
        }
        if !self.aligned {
            let first = &self.s[0];
            let first_len = symbol_len(first.seq());
            let other = self
                .s
                .iter()
                .find(|rec| symbol_len(rec.seq()) != first_len)
                .unwrap_or(first);
            bail!(LengthMismatchError {
                id_a: first.id().to_string(),
                len_a: first_len,
                id_b: other.id().to_string(),
                len_b: symbol_len(other.seq()),
            });
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.s.iter()
    }

    pub fn len(&self) -> usize {
        self.s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.s.is_empty()
    }

    pub fn record(&self, idx: usize) -> &Record {
        &self.s[idx]
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Record> {
        self.s.iter().find(|r| r.id() == id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.s.iter().map(|rec| rec.id().to_string()).collect()
    }

    pub fn aligned(&self) -> bool {
        self.aligned
    }

    /// Common length in symbols, zero when the sequences are not aligned.
    pub fn msa_len(&self) -> usize {
        self.msa_len
    }
}

/// Symbols of a sequence: its characters when it is UTF-8 text, its raw bytes otherwise.
///
/// Raw bytes are shifted past `char::MAX` so they never equal a decoded character.
pub(crate) fn symbols(seq: &[u8]) -> Vec<u32> {
    match std::str::from_utf8(seq) {
        Ok(text) => text.chars().map(u32::from).collect(),
        Err(_) => seq
            .iter()
            .map(|&byte| u32::from(byte) + u32::from(char::MAX) + 1)
            .collect(),
    }
}

/// Number of symbols in a sequence, see [`symbols`].
pub(crate) fn symbol_len(seq: &[u8]) -> usize {
    if seq.is_ascii() {
        seq.len()
    } else {
        match std::str::from_utf8(seq) {
            Ok(text) => text.chars().count(),
            Err(_) => seq.len(),
        }
    }
}
