use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::Parser;
use log::LevelFilter;

use upgma::tree::NegativeBranchPolicy;

type Result<T> = std::result::Result<T, anyhow::Error>;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub(super) struct Cli {
    /// Sequence file in fasta format, all sequences of equal length
    #[arg(short, long, value_name = "SEQ_FILE")]
    pub(super) seq_file: PathBuf,

    /// Output tree file in newick format, defaults to <SEQ_FILE stem>_upgma.newick
    #[arg(short, long, value_name = "OUT_TREE")]
    pub(super) out_tree: Option<PathBuf>,

    /// Fail instead of clamping when a branch length comes out negative
    #[arg(long, default_value_t = false)]
    pub(super) strict: bool,

    /// Console logging level
    #[arg(long, value_name = "LEVEL", default_value_t = LevelFilter::Info)]
    pub(super) log_level: LevelFilter,
}

pub(super) struct ConfigBuilder {
    seq_file: PathBuf,
    out_tree: Option<PathBuf>,
    strict: bool,
    log_level: LevelFilter,
}

impl From<Cli> for ConfigBuilder {
    fn from(cli: Cli) -> Self {
        Self {
            seq_file: cli.seq_file,
            out_tree: cli.out_tree,
            strict: cli.strict,
            log_level: cli.log_level,
        }
    }
}

impl ConfigBuilder {
    pub(super) fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub(super) fn setup(self) -> Result<Config> {
        if !self.seq_file.is_file() {
            bail!("Sequence file {} does not exist", self.seq_file.display());
        }
        let out_tree = match self.out_tree {
            Some(out_tree) => out_tree,
            None => default_out_tree(&self.seq_file)?,
        };
        if out_tree.exists() {
            bail!("Output file {} already exists", out_tree.display());
        }
        Ok(Config {
            seq_file: self.seq_file,
            out_tree,
            negative_branches: if self.strict {
                NegativeBranchPolicy::Fail
            } else {
                NegativeBranchPolicy::Clamp
            },
        })
    }
}

fn default_out_tree(seq_file: &Path) -> Result<PathBuf> {
    let Some(stem) = seq_file.file_stem() else {
        bail!("Cannot derive an output name from {}", seq_file.display());
    };
    Ok(seq_file.with_file_name(format!("{}_upgma.newick", stem.to_string_lossy())))
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Config {
    pub(super) seq_file: PathBuf,
    pub(super) out_tree: PathBuf,
    pub(super) negative_branches: NegativeBranchPolicy,
}

impl Display for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Sequence file: {}", self.seq_file.display())?;
        writeln!(f, "Output tree: {}", self.out_tree.display())?;
        write!(f, "Negative branch lengths: {:?}", self.negative_branches)
    }
}
