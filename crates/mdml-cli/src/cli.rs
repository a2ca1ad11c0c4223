use super::commands;
use clap::{Parser, Subcommand};
use mdml_core::{ExportStyle, LabelAcceptance};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a feature table as PLUMED collective variables
    Plumed {
        #[arg(long)]
        table: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, value_enum, default_value = "sfa")]
        style: ExportStyle,
        /// SFA components to export; defaults to every `sfa-*` column
        #[arg(long)]
        components: Option<usize>,
    },
    /// Write per-residue weights from a PLUMED file into PDB B-factors
    Bfactor {
        #[arg(long)]
        plumed: PathBuf,
        #[arg(long)]
        pdb_in: PathBuf,
        #[arg(long)]
        pdb_out: PathBuf,
        /// Only count `meanfree_` labels
        #[arg(long)]
        meanfree_only: bool,
    },
    /// Print per-residue weights from a PLUMED file
    Residues {
        #[arg(long)]
        plumed: PathBuf,
        #[arg(long)]
        meanfree_only: bool,
    },
    /// Print a feature table
    Describe {
        #[arg(long)]
        table: PathBuf,
    },
}

fn acceptance(meanfree_only: bool) -> LabelAcceptance {
    if meanfree_only {
        LabelAcceptance::MeanFreeOnly
    } else {
        LabelAcceptance::AnyStyle
    }
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }

    pub fn execute(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Plumed {
                table,
                output,
                style,
                components,
            } => commands::plumed::execute(table, output, style, components),
            Commands::Bfactor {
                plumed,
                pdb_in,
                pdb_out,
                meanfree_only,
            } => commands::bfactor::execute(plumed, pdb_in, pdb_out, acceptance(meanfree_only)),
            Commands::Residues {
                plumed,
                meanfree_only,
            } => commands::residues::execute(plumed, acceptance(meanfree_only)),
            Commands::Describe { table } => commands::describe::execute(table),
        }
    }
}
