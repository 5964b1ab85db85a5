use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::bail;
use bio::io::fasta::{Reader, Record};
use log::info;

use crate::tree::Tree;
use crate::Result;

pub struct DataError {
    pub message: String,
}
impl fmt::Debug for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
impl Error for DataError {}

/// Reads sequences from a fasta file, returning a vector of fasta records.
/// Sequences are kept as they are in the file, symbols are compared case-sensitively later on.
///
/// # Arguments
/// * `path` - Path to the fasta file.
///
/// # Example
/// ```
/// use upgma::io::read_sequences;
/// use std::path::PathBuf;
/// let records = read_sequences(&PathBuf::from("./data/sequences_DNA_small.fasta")).unwrap();
/// # assert_eq!(records.len(), 4);
/// # for rec in records {
/// #    assert_eq!(rec.seq().len(), 8);
/// # }
/// ```
pub fn read_sequences(path: &Path) -> Result<Vec<Record>> {
    info!("Reading sequences from file {}", path.display());
    let reader = Reader::from_file(path)?;
    let mut sequences = Vec::new();

    for result in reader.records() {
        let rec = result?;
        if let Err(e) = rec.check() {
            bail!(DataError {
                message: e.to_string()
            });
        }
        sequences.push(rec);
    }
    if sequences.is_empty() {
        bail!(DataError {
            message: String::from("No sequences found in file")
        });
    }

    info!("Read {} sequences successfully", sequences.len());
    Ok(sequences)
}

/// Writes newick trees to the given file path, one tree per line.
/// Will return an error if the file already exists.
///
/// # Arguments
/// * `trees` - Vector of trees.
/// * `path` - Path to the newick file.
///
/// # Example
/// ```
/// # use std::fs::{self, remove_file};
/// use std::path::PathBuf;
///
/// use upgma::io::write_newick_to_file;
/// use upgma::sequences::Sequences;
/// use upgma::tree::{tree_builder::TreeBuilder, UPGMABuilder};
///
/// let sequences = Sequences::from_map([("A", "AAAA"), ("B", "AAAC")]).unwrap();
/// let tree = UPGMABuilder::new().build_tree(&sequences).unwrap();
/// let output_path = PathBuf::from("./data/doctest_tmp_output.newick");
/// write_newick_to_file(&[tree], output_path.clone()).unwrap();
/// # let file_content = fs::read_to_string(&output_path).unwrap();
/// # assert_eq!(file_content.trim(), "(A:0.5,B:0.5);");
/// # assert!(remove_file(output_path).is_ok());
/// ```
pub fn write_newick_to_file(trees: &[Tree], path: PathBuf) -> Result<()> {
    info!("Writing newick trees to file {}", path.display());
    if path.exists() {
        bail!(DataError {
            message: String::from("File already exists")
        });
    }
    let mut writer = File::create(path)?;
    for tree in trees {
        writer.write_all(tree.to_newick().as_bytes())?;
        writer.write_all(b"\n")?;
    }
    info!("Finished writing successfully");
    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage, coverage(off))]
mod tests;
