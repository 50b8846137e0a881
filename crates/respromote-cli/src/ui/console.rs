//! Console reporter and run summary
//!
//! Progress goes to stderr so stdout only carries the summary (or the JSON
//! report), which keeps the tool usable in pipelines.

use crossterm::style::Stylize;
use respromote_core::{ArtifactOutcome, PromotionReport, Reporter, RuleAppOutcome};

/// Prints promoter diagnostics to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Reporter for ConsoleReporter {
    fn info(&self, msg: &str) {
        tracing::debug!("{msg}");
        if !self.quiet {
            eprintln!("  {msg}");
        }
    }

    fn warning(&self, msg: &str) {
        tracing::debug!("{msg}");
        eprintln!("  {} {msg}", "warning:".yellow().bold());
    }

    fn severe(&self, msg: &str) {
        tracing::debug!("{msg}");
        eprintln!("  {} {msg}", "error:".red().bold());
    }

    fn deployed(&self, resource: &str, executed: bool) {
        if self.quiet {
            return;
        }
        if executed {
            eprintln!("  {} {resource}", "deployed".green());
        } else {
            eprintln!("  {} {resource}", "would deploy".cyan());
        }
    }
}

/// The one-line summary printed at the end of a run.
pub fn summary_line(report: &PromotionReport) -> String {
    let count = report.deploy_count();
    if report.executed {
        format!("{count} artifact(s) deployed")
    } else {
        format!("dry run: {count} artifact(s) would be deployed")
    }
}

/// Print the per-artifact table (unless `quiet`) and the summary line.
pub fn print_summary(report: &PromotionReport, quiet: bool) {
    if !quiet && report.ruleapp_outcome != RuleAppOutcome::NotOnSource {
        println!();
        let version = report.version.as_deref().unwrap_or("?");
        println!(
            "  {} {}  {}",
            report.ruleapp.as_str().white().bold(),
            version.dark_grey(),
            ruleapp_label(report.ruleapp_outcome)
        );
        for record in report.libraries.iter().chain(&report.xoms) {
            println!("  {:<40}{}", record.uri, artifact_label(record.outcome));
        }
        println!();
    }
    println!("{}", summary_line(report));
}

fn ruleapp_label(outcome: RuleAppOutcome) -> String {
    match outcome {
        RuleAppOutcome::NotOnSource => "not on source".red().to_string(),
        RuleAppOutcome::AlreadyDeployed => "already deployed".dark_grey().to_string(),
        RuleAppOutcome::Deployed => "deployed".green().to_string(),
        RuleAppOutcome::Simulated => "would deploy".cyan().to_string(),
    }
}

fn artifact_label(outcome: ArtifactOutcome) -> String {
    match outcome {
        ArtifactOutcome::AlreadyDeployed => "already deployed".dark_grey().to_string(),
        ArtifactOutcome::Deployed => "deployed".green().to_string(),
        ArtifactOutcome::Simulated => "would deploy".cyan().to_string(),
        ArtifactOutcome::Redeployed => "redeployed".green().to_string(),
        ArtifactOutcome::RedeploySimulated => "would redeploy".cyan().to_string(),
    }
}
