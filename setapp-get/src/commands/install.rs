use super::{load_index, Outcome, Services};
use crate::cli::InstallArgs;
use anyhow::Result;
use setapp_lib::{
    resolve_all, InstallPipeline, InstallResult, InstallSummary, Orchestrator, RunMode,
};
use std::io::Write;

pub async fn execute(
    services: &Services,
    args: &InstallArgs,
    refresh: bool,
    out: &mut dyn Write,
) -> Result<Outcome> {
    if args.tokens.is_empty() {
        return Ok(Outcome::Usage);
    }

    let index = load_index(services, refresh).await?;
    let (targets, errors) = resolve_all(args.tokens.as_slice(), args.name, &index);
    for error in &errors {
        writeln!(out, "{}: {}", error.token(), error)?;
    }
    if targets.is_empty() {
        return Ok(Outcome::Usage);
    }

    let mode = if args.parallel {
        RunMode::Parallel {
            concurrency: args.jobs.or(services.config.concurrency),
        }
    } else {
        RunMode::Sequential
    };

    let pipeline = InstallPipeline::new(
        &services.config,
        services.capabilities.clone(),
        services.reporter.clone(),
    );
    let results = Orchestrator::new(pipeline).run(targets, mode).await;

    for result in &results {
        writeln!(out, "{}", describe(result))?;
    }
    writeln!(out, "{}", InstallSummary::from_results(&results))?;

    Ok(Outcome::Completed)
}

fn describe(result: &InstallResult) -> String {
    match &result.error {
        Some(e) => format!("{}: failed while {}: {}", result.name, e.stage(), e),
        None if result.skipped => format!("{}: already installed", result.name),
        None => format!("{}: installed", result.name),
    }
}
