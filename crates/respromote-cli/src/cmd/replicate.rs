//! Replicate command

use std::sync::Arc;

use anyhow::{Context, Result};
use respromote_core::{PromoteConfig, Promoter, Staging};

use crate::ReplicateArgs;
use crate::ui::{ConsoleReporter, print_summary};

/// Promote one RuleApp from the source server to the destination server
pub async fn replicate(mut config: PromoteConfig, args: ReplicateArgs, quiet: bool) -> Result<()> {
    if let Some(dir) = args.stage_dir {
        config.promotion.stage_dir = dir;
    }
    if args.skip_existing_xom {
        config.promotion.skip_existing_xom = true;
    }
    if args.create_stage_dir {
        Staging::ensure(&config.promotion.stage_dir).await?;
    }

    let reporter = Arc::new(ConsoleReporter::new(quiet || args.json));
    let promoter = Promoter::from_config(&config, reporter)?;

    if !args.execute && !quiet && !args.json {
        eprintln!("  Dry run: nothing will be deployed (use --execute)");
    }

    let report = promoter
        .replicate(&args.ruleapp, args.execute)
        .await
        .with_context(|| format!("Failed to replicate {}", args.ruleapp))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, quiet);
    }
    Ok(())
}
