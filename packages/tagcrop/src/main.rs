mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Commands};
use tagcrop::{init_tracing, AppConfig, DetectorConfig, ImagePipeline, InvocationReport, LocalBlobStore, TriggerHost};
use tracing::{error, info};

#[tokio::main]
async fn main() {
  let args = Args::parse();
  init_tracing(args.verbose);

  match run(args).await {
    Ok(true) => {}
    Ok(false) => std::process::exit(1),
    Err(e) => {
      error!("{:#}", e);
      eprintln!("Error: {:#}", e);
      std::process::exit(1);
    }
  }
}

/// Returns whether every invocation succeeded.
async fn run(args: Args) -> Result<bool> {
  let reports = match &args.command {
    Commands::Version => {
      println!("tagcrop {}", env!("CARGO_PKG_VERSION"));
      return Ok(true);
    }
    Commands::Process { name } => {
      let host = build_host(&args)?;
      vec![host.handle_blob(name).await]
    }
    Commands::Drain { pattern } => {
      let host = build_host(&args)?;
      host
        .drain(pattern)
        .await
        .context("failed to list the raw container")?
    }
  };

  print_reports(&reports, args.json)?;
  Ok(reports.iter().all(InvocationReport::succeeded))
}

fn load_config(args: &Args) -> Result<AppConfig> {
  let mut config = match &args.config {
    Some(path) => AppConfig::load(path)?,
    None => AppConfig::default(),
  };

  if let Some(program) = &args.detector {
    config.detector = Some(DetectorConfig {
      program: program.clone(),
      args: args.detector_args.clone(),
      max_parallel: config.detector.as_ref().map_or(1, |d| d.max_parallel),
    });
  }

  config.validate()?;
  Ok(config)
}

fn build_host(args: &Args) -> Result<Arc<TriggerHost>> {
  let config = load_config(args)?;
  let detector = config
    .detector
    .as_ref()
    .context("no text detector configured; set `detector` in the config file or pass --detector")?
    .build();

  info!(
    root = %args.root.display(),
    raw = %config.raw_container,
    processed = %config.processed_container,
    keywords = config.pipeline.keywords.len(),
    "text detector ready"
  );

  let pipeline = Arc::new(ImagePipeline::new(Arc::new(detector), config.pipeline.clone()));
  let store = Arc::new(LocalBlobStore::new(&args.root));
  let host = TriggerHost::new(pipeline, store, config.raw_container, config.processed_container)
    .with_max_concurrent_blobs(config.max_concurrent_blobs);
  Ok(Arc::new(host))
}

fn print_reports(reports: &[InvocationReport], json: bool) -> Result<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(reports)?);
    return Ok(());
  }

  for report in reports {
    println!(
      "{}: {:?}, {} crop(s) emitted, {} uploaded",
      report.blob,
      report.status,
      report.crops_emitted,
      report.uploaded.len()
    );
    for name in &report.uploaded {
      println!("  + {}", name);
    }
    for (name, reason) in &report.failed_uploads {
      println!("  ! {}: {}", name, reason);
    }
    if let Some(reason) = &report.error {
      println!("  error: {}", reason);
    }
  }
  Ok(())
}
