use rstest::*;

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use tempfile::tempdir;

use crate::io::{read_sequences, write_newick_to_file, DataError};
use crate::sequences::Sequences;
use crate::tree::{tree_builder::TreeBuilder, Tree, UPGMABuilder};

fn upgma_tree(input: &[(&str, &str)]) -> Tree {
    let sequences = Sequences::from_map(input.iter().copied()).unwrap();
    UPGMABuilder::new().build_tree(&sequences).unwrap()
}

#[test]
fn reading_correct_fasta() {
    let sequences = read_sequences(&PathBuf::from("./data/sequences_DNA_small.fasta")).unwrap();
    assert_eq!(sequences.len(), 4);
    for seq in sequences {
        assert_eq!(seq.seq().len(), 8);
    }

    let corr_lengths = [8, 6, 8];
    let sequences = read_sequences(&PathBuf::from("./data/sequences_DNA_unaligned.fasta")).unwrap();
    assert_eq!(sequences.len(), 3);
    for (i, seq) in sequences.into_iter().enumerate() {
        assert_eq!(seq.seq().len(), corr_lengths[i]);
    }
}

#[test]
fn reading_keeps_case_and_order() {
    let sequences = read_sequences(&PathBuf::from("./data/sequences_DNA_three.fasta")).unwrap();
    let ids: Vec<&str> = sequences.iter().map(|rec| rec.id()).collect();
    assert_eq!(ids, ["A", "B", "C"]);
    assert_eq!(sequences[1].seq(), b"AAAAACAAAA");
}

#[rstest]
#[case::empty_sequence_name("./data/sequences_garbage_empty_name.fasta", "Expecting id")]
#[case::garbage_sequence(
    "./data/sequences_garbage_non-ascii.fasta",
    "Non-ascii character found"
)]
#[case::empty_file("./data/sequences_empty.fasta", "No sequences found")]
fn reading_incorrect_fasta(#[case] input: &str, #[case] exp_error: &str) {
    let res = read_sequences(&PathBuf::from(input));
    assert!(res.is_err());
    let err = res.unwrap_err();
    assert!(err.downcast_ref::<DataError>().is_some());
    assert!(err.to_string().contains(exp_error));
}

#[test]
fn reading_nonexistent_fasta() {
    assert!(read_sequences(&PathBuf::from("./data/sequences_nonexistent.fasta")).is_err());
}

#[test]
fn test_write_newick_to_file() {
    let tree = upgma_tree(&[("A", "AAAA"), ("B", "AAAC"), ("C", "ACCC")]);
    let temp_dir = tempdir().unwrap();
    let output_path = temp_dir.path().join("output.newick");

    write_newick_to_file(&[tree], output_path.clone()).unwrap();

    let mut file_content = String::new();
    std::fs::File::open(output_path)
        .unwrap()
        .read_to_string(&mut file_content)
        .unwrap();
    assert_eq!(file_content.trim(), "((A:0.5,B:0.5):0.75,C:1.25);");
}

#[test]
fn test_write_multiple_newick_to_file() {
    let trees = vec![
        upgma_tree(&[("seq1", "ATCGATCG"), ("seq2", "TTCGATCG")]),
        upgma_tree(&[("A", "ATCG")]),
    ];

    let temp_dir = tempdir().unwrap();
    let output_path = temp_dir.path().join("output.newick");

    write_newick_to_file(&trees, output_path.clone()).unwrap();

    let mut file_content = String::new();
    std::fs::File::open(output_path)
        .unwrap()
        .read_to_string(&mut file_content)
        .unwrap();
    assert_eq!(file_content.trim(), "(seq1:0.5,seq2:0.5);\nA;");
}

#[test]
fn test_write_newick_to_file_bad_path() {
    let tree = upgma_tree(&[("A", "AAAA"), ("B", "AAAC")]);

    let temp_dir = tempdir().unwrap();
    let output_path = temp_dir
        .path()
        .join("nonexistent_folder")
        .join("output.newick");
    assert!(write_newick_to_file(&[tree], output_path).is_err());
}

#[test]
fn test_write_newick_to_existing_file() {
    let tree = upgma_tree(&[("A", "AAAA"), ("B", "AAAC")]);
    let temp_dir = tempdir().unwrap();
    let output_path = temp_dir.path().join("output.newick");
    File::create(&output_path).unwrap();
    let err = write_newick_to_file(&[tree], output_path).unwrap_err();
    assert_eq!(err.to_string(), "File already exists");
}

#[test]
fn fasta_to_newick() {
    let sequences = Sequences::new(
        read_sequences(&PathBuf::from("./data/sequences_DNA_five.fasta")).unwrap(),
    );
    let tree = UPGMABuilder::new().build_tree(&sequences).unwrap();
    assert_eq!(tree.leaves().len(), 5);
    assert!(tree.is_ultrametric(1e-9));

    let dir = tempdir().unwrap();
    let out_path = dir.path().join("five.newick");
    write_newick_to_file(&[tree.clone()], out_path.clone()).unwrap();
    let mut newick = String::new();
    File::open(out_path)
        .unwrap()
        .read_to_string(&mut newick)
        .unwrap();
    assert_eq!(newick.trim(), tree.to_newick());
    assert!(newick.starts_with("("));
}

#[test]
fn writing_quoted_labels() {
    let tree = upgma_tree(&[("seq 1", "AAAA"), ("seq'2", "AAAC")]);
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("quoted.newick");
    write_newick_to_file(&[tree], out_path.clone()).unwrap();
    let mut newick = String::new();
    File::open(out_path)
        .unwrap()
        .read_to_string(&mut newick)
        .unwrap();
    assert_eq!(newick, "('seq 1':0.5,'seq''2':0.5);\n");
}
