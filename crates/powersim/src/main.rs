use std::io::Write;

use clap::Parser;
use color_eyre::eyre::{WrapErr, eyre};
use powersim::util::io::atomic_write;
use powersim::{Args, init_logging, run};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(args.common.log_file.as_deref(), &args.common.log_level)?;

    let report = run(&args)?;
    let rendered = report.render(args.common.format)?;

    match &args.common.output {
        Some(path) => {
            atomic_write(path, &rendered)
                .wrap_err_with(|| format!("failed to write report to {}", path.display()))?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }

    if report.is_diverged() {
        return Err(eyre!("sample-size search did not reach the target power"));
    }
    Ok(())
}
