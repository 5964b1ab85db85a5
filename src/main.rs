use anyhow::{anyhow, bail, Error};
use clap::Parser;
use ftail::Ftail;
use log::{debug, info};

use upgma::io::{read_sequences, write_newick_to_file};
use upgma::sequences::Sequences;
use upgma::tree::{tree_builder::TreeBuilder, UPGMABuilder};

mod cli;
use crate::cli::{Cli, ConfigBuilder};

type Result<T> = std::result::Result<T, Error>;

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            bail!("Unable to parse command line arguments: \n {}", error)
        }
    };
    let cfg_build: ConfigBuilder = cli.into();
    Ftail::new()
        .console(cfg_build.log_level())
        .init()
        .map_err(|e| anyhow!("Unable to set up logging: {:?}", e))?;
    info!("Successfully parsed the command line parameters");
    let cfg = cfg_build.setup()?;

    info!("UPGMA run started.");
    info!("{}", cfg);

    let sequences = Sequences::new(read_sequences(&cfg.seq_file)?);
    info!(
        "Read {} sequences from {}.",
        sequences.len(),
        cfg.seq_file.display()
    );

    let tree = UPGMABuilder::new()
        .negative_branches(cfg.negative_branches)
        .build_tree(&sequences)?;
    debug!("Final tree: {}", tree);

    info!("Putting resulting tree in {}", cfg.out_tree.display());
    write_newick_to_file(&[tree], cfg.out_tree)?;
    Ok(())
}
