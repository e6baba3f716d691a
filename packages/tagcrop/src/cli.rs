//! Command line arguments backing the `tagcrop` event host binary.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
  name = "tagcrop",
  about = "Crops discount tags out of shelf photographs stored in a local blob root",
  version
)]
pub struct Args {
  /// JSON config file; unset fields keep their defaults
  #[arg(long, short = 'c', global = true, env = "TAGCROP_CONFIG")]
  pub config: Option<PathBuf>,

  /// Directory holding one sub-directory per container
  #[arg(long, global = true, env = "TAGCROP_ROOT", default_value = ".")]
  pub root: PathBuf,

  /// Recognizer program to run per image, overriding the config file
  #[arg(long, global = true, env = "TAGCROP_DETECTOR")]
  pub detector: Option<PathBuf>,

  /// Extra argument for the recognizer program (repeatable)
  #[arg(long = "detector-arg", global = true, allow_hyphen_values = true)]
  pub detector_args: Vec<String>,

  /// Print invocation reports as JSON
  #[arg(long, global = true)]
  pub json: bool,

  /// Log at debug level unless RUST_LOG says otherwise
  #[arg(long, short = 'v', global = true)]
  pub verbose: bool,

  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Print version information
  Version,
  /// Handle the upload event of one blob in the raw container
  Process {
    /// Blob name inside the raw container
    name: String,
  },
  /// Handle an upload event for every matching blob in the raw container
  Drain {
    /// Glob over blob names (`*`, `**`, `?`)
    #[arg(long, short = 'p', default_value = "**")]
    pattern: String,
  },
}
