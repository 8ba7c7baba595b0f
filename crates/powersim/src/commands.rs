//! Subcommand dispatch: resolve configuration, run the engine, build a report

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use color_eyre::eyre::{Result, WrapErr};
use powersim_core::{
    DesignParameters, PowerConfig, PowerError, Progress, estimate_power_seeded,
    find_sample_size_seeded, sweep_power,
};
use rand::RngCore;

use crate::cli::{Args, Command};
use crate::report::Report;
use crate::study::{DEFAULT_TARGET_POWER, SearchSection, StudyConfig};
use crate::util::format::{format_duration, format_percentage};

/// How often a running search or sweep reports its progress
const PROGRESS_LOG_INTERVAL: Duration = Duration::from_secs(2);

/// Run the parsed command line to completion
pub fn run(args: &Args) -> Result<Report> {
    let common = &args.common;
    let study = StudyConfig::resolve(common.config.as_deref())?;
    let config = study.power_config(common.sims, common.alpha, common.test.map(Into::into));
    let seed = resolve_seed(common.seed.or(study.seed));
    execute(&args.command, &study, config, seed)
}

fn resolve_seed(seed: Option<u64>) -> u64 {
    match seed {
        Some(seed) => seed,
        None => {
            let seed = rand::rng().next_u64();
            tracing::info!(seed, "no seed given, drew one at random");
            seed
        }
    }
}

/// Run one subcommand against an already resolved study and seed
pub fn execute(
    command: &Command,
    study: &StudyConfig,
    config: PowerConfig,
    seed: u64,
) -> Result<Report> {
    let started = Instant::now();
    let report = match command {
        Command::Estimate { effect_size, n } => {
            let design = DesignParameters::two_sample(*effect_size, *n);
            let estimate = estimate_power_seeded(&design, &config, seed)
                .wrap_err("power estimation failed")?;
            Report::Estimate {
                seed,
                config,
                effect_size: *effect_size,
                n: *n,
                estimate,
            }
        }
        Command::Search {
            target,
            effect_size,
            start_n,
            max_n,
            time_budget_secs,
        } => {
            let overrides = SearchSection {
                target_power: *target,
                effect_size: *effect_size,
                start_n: *start_n,
                max_n: *max_n,
                time_budget_secs: *time_budget_secs,
            };
            let search = study.search_config(&overrides)?;
            let progress = Progress::default();
            tracing::info!(
                effect_size = search.effect_size,
                target = search.target_power,
                start_n = search.start_n,
                max_n = search.max_n,
                "starting sample-size search"
            );

            let outcome = with_progress_log(&progress, "search", PROGRESS_LOG_INTERVAL, || {
                find_sample_size_seeded(&search, &config, seed, Some(&progress))
            });
            match outcome {
                Ok(curve) => Report::Search {
                    seed,
                    config,
                    converged: true,
                    sample_size: curve.final_point().map(|p| p.n),
                    divergence: None,
                    curve,
                },
                Err(err @ PowerError::SearchDivergence { .. }) => {
                    let divergence = err.to_string();
                    let curve = err.partial_curve().cloned().unwrap_or_default();
                    Report::Search {
                        seed,
                        config,
                        converged: false,
                        sample_size: None,
                        divergence: Some(divergence),
                        curve,
                    }
                }
                Err(err) => return Err(err).wrap_err("sample-size search failed"),
            }
        }
        Command::Sweep {
            sample_sizes,
            effect_sizes,
            target,
        } => {
            let (sample_sizes, effect_sizes) =
                study.sweep_axes(sample_sizes.as_deref(), effect_sizes.as_deref())?;
            let target_power = target
                .or(study.sweep.target_power)
                .unwrap_or(DEFAULT_TARGET_POWER);
            tracing::info!(
                rows = effect_sizes.len(),
                cols = sample_sizes.len(),
                "starting power sweep"
            );
            let progress = Progress::default();
            let surface = with_progress_log(&progress, "sweep", PROGRESS_LOG_INTERVAL, || {
                sweep_power(&sample_sizes, &effect_sizes, &config, seed, Some(&progress))
            })
            .wrap_err("power sweep failed")?;
            Report::sweep(seed, config, target_power, surface)
        }
    };

    tracing::info!(elapsed = %format_duration(started.elapsed()), "command finished");
    Ok(report)
}

/// Run `work` while a reporter thread logs `progress` every `interval`.
/// The reporter stops as soon as `work` returns or unwinds.
fn with_progress_log<T>(
    progress: &Progress,
    label: &str,
    interval: Duration,
    work: impl FnOnce() -> T,
) -> T {
    let (done_tx, done_rx) = mpsc::channel::<()>();
    thread::scope(|scope| {
        scope.spawn(move || {
            while let Err(RecvTimeoutError::Timeout) = done_rx.recv_timeout(interval) {
                log_progress(progress, label);
            }
        });
        let result = work();
        drop(done_tx);
        result
    })
}

fn log_progress(progress: &Progress, label: &str) {
    let completed = progress.completed();
    match progress.fraction() {
        Some(fraction) => tracing::info!(
            label,
            completed,
            total = progress.total(),
            percent = %format_percentage(fraction),
            "in progress"
        ),
        None => tracing::info!(label, completed, "in progress"),
    }
}
