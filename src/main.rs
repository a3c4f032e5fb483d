use anyhow::{Context, Result};
use chrono::Local;
use confpipe::cli::commands::{InstantiateCommand, ShowCommand, TargetsCommand, TrainCommand};
use confpipe::cli::output::*;
use confpipe::cli::{Cli, Command};
use confpipe::config::{expand_sweeps, parse_overrides, Config, ConfigLoader, Override, RunDir};
use confpipe::data::Frame;
use confpipe::instantiate::{Registry, TargetKind};
use confpipe::pipeline::CompositePipeline;
use ndarray::Array1;
use serde::Serialize;
use serde_yaml::Value;
use std::path::Path;
use tracing::{error, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG wins over --verbose
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let builder = FmtSubscriber::builder().with_writer(std::io::stderr);
    let installed = if std::env::var_os("RUST_LOG").is_some() {
        tracing::subscriber::set_global_default(
            builder.with_env_filter(EnvFilter::from_default_env()).finish(),
        )
    } else {
        tracing::subscriber::set_global_default(builder.with_max_level(log_level).finish())
    };
    installed.context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Show(cmd) => show_config(&cli, cmd)?,
        Command::Instantiate(cmd) => instantiate_config(&cli, cmd)?,
        Command::Train(cmd) => train_pipeline(&cli, cmd)?,
        Command::Targets(cmd) => list_targets(cmd)?,
    }

    Ok(())
}

fn compose(cli: &Cli, overrides: &[Override]) -> Result<Config> {
    ConfigLoader::new(cli.config_dir.clone())
        .compose(&cli.config_name, overrides)
        .with_context(|| {
            format!(
                "Failed to compose '{}' from {}",
                cli.config_name,
                cli.config_dir.display()
            )
        })
}

fn select_node(config: &Config, path: Option<&str>) -> Result<Value> {
    match path {
        None => Ok(config.root().clone()),
        Some(path) => config
            .select(path)
            .cloned()
            .with_context(|| format!("No config node at '{}'", path)),
    }
}

fn show_config(cli: &Cli, cmd: &ShowCommand) -> Result<()> {
    if cli.multirun {
        eprintln!("{} --multirun has no effect on show", WARN);
    }
    let overrides = parse_overrides(&cmd.overrides).context("Invalid overrides")?;
    let mut config = compose(cli, &overrides)?;
    if cmd.resolve {
        config = config.resolve().context("Failed to resolve interpolations")?;
    }

    let node = select_node(&config, cmd.select.as_deref())?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&node)?);
    } else {
        print!("{}", serde_yaml::to_string(&node)?);
    }
    Ok(())
}

fn instantiate_config(cli: &Cli, cmd: &InstantiateCommand) -> Result<()> {
    let overrides = parse_overrides(&cmd.overrides).context("Invalid overrides")?;
    let config = compose(cli, &overrides)?
        .resolve()
        .context("Failed to resolve interpolations")?;
    let node = select_node(&config, cmd.select.as_deref())?;

    match Registry::with_builtins().instantiate(&node) {
        Ok(instance) => {
            println!("{} Instantiated {}", CHECK, style(instance.describe()).bold());
            print!("{}", serde_yaml::to_string(&instance.to_value())?);
            Ok(())
        }
        Err(e) => {
            println!("{} Instantiation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}

fn train_pipeline(cli: &Cli, cmd: &TrainCommand) -> Result<()> {
    let jobs = if cli.multirun {
        expand_sweeps(&cmd.overrides).context("Invalid sweep overrides")?
    } else {
        vec![parse_overrides(&cmd.overrides).context("Invalid overrides")?]
    };

    let frame = Frame::from_csv_path(&cmd.data)
        .with_context(|| format!("Failed to load {}", cmd.data.display()))?;
    let (features, labels) = frame
        .split_target(&cmd.target)
        .with_context(|| format!("Failed to extract target column '{}'", cmd.target))?;
    println!(
        "{} Loaded {} rows with {} feature columns from {}",
        INFO,
        style(features.n_rows()).cyan(),
        style(features.n_cols()).cyan(),
        style(cmd.data.display()).bold()
    );

    let registry = Registry::with_builtins();
    let started_at = Local::now();
    let base = Path::new(".");

    if !cli.multirun {
        let overrides = jobs.into_iter().next().unwrap_or_default();
        let run_dir = RunDir::single(base, started_at);
        match train_job(cli, cmd, &registry, &overrides, &features, &labels.y, &run_dir) {
            Ok(accuracy) => {
                println!(
                    "{} {} trained, training accuracy {}",
                    CHECK,
                    style(&cmd.node).bold(),
                    format_accuracy(accuracy)
                );
                println!("{}", format_run_dir(run_dir.path()));
                return Ok(());
            }
            Err(e) => {
                println!("{} {} {}", CROSS, style(&cmd.node).bold(), style("failed").red());
                println!("  {}", style(format!("{:#}", e)).red());
                std::process::exit(1);
            }
        }
    }

    println!(
        "{} Launching {} jobs",
        ROCKET,
        style(jobs.len()).bold()
    );
    let progress = create_progress_bar(jobs.len());
    let mut failures = 0;
    for (idx, overrides) in jobs.iter().enumerate() {
        let shown: Vec<String> = overrides.iter().map(ToString::to_string).collect();
        progress.set_message(shown.join(" "));

        let run_dir = RunDir::multirun(base, started_at, idx);
        match train_job(cli, cmd, &registry, overrides, &features, &labels.y, &run_dir) {
            Ok(accuracy) => progress.println(format_job_result(idx, &shown, accuracy)),
            Err(e) => {
                failures += 1;
                error!("Job {} failed: {:#}", idx, e);
                progress.println(format_job_failure(idx, &shown, &format!("{:#}", e)));
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    if failures > 0 {
        println!(
            "\n{} {} of {} jobs {}",
            CROSS,
            style(failures).red(),
            jobs.len(),
            style("failed").red()
        );
        std::process::exit(1);
    }
    println!("\n{} All {} jobs completed {}", CHECK, jobs.len(), style("successfully").green());
    Ok(())
}

fn train_job(
    cli: &Cli,
    cmd: &TrainCommand,
    registry: &Registry,
    overrides: &[Override],
    features: &Frame,
    y: &Array1<f64>,
    run_dir: &RunDir,
) -> Result<f64> {
    let config = compose(cli, overrides)?
        .resolve()
        .context("Failed to resolve interpolations")?;
    let node = config
        .select(&cmd.node)
        .with_context(|| format!("No config node at '{}'", cmd.node))?;

    let mut pipeline: CompositePipeline = registry
        .build(node)
        .with_context(|| format!("Failed to instantiate '{}'", cmd.node))?;
    pipeline.fit(features, y).context("Failed to fit pipeline")?;
    let accuracy = pipeline.score(features, y).context("Failed to score pipeline")?;

    run_dir.save(&config, overrides).context("Failed to save run directory")?;
    Ok(accuracy)
}

#[derive(Serialize)]
struct TargetEntry<'a> {
    target: &'a str,
    kind: TargetKind,
}

fn list_targets(cmd: &TargetsCommand) -> Result<()> {
    let registry = Registry::with_builtins();

    if cmd.json {
        let targets: Vec<TargetEntry<'_>> = registry
            .targets()
            .map(|(target, kind)| TargetEntry { target, kind })
            .collect();
        let data = serde_json::json!({ "targets": targets });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!("{} Registered targets:", INFO);
    for (name, kind) in registry.targets() {
        println!("{}", format_target(name, kind));
    }
    Ok(())
}
