//! Outcome of one promotion run.

use std::path::PathBuf;

use serde::Serialize;

/// What happened to the `RuleApp` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAppOutcome {
    /// The source has no such `RuleApp`; nothing else was done.
    NotOnSource,
    /// The destination already had this exact version.
    AlreadyDeployed,
    /// The archive was posted to the destination.
    Deployed,
    /// Dry run: the archive was staged but not posted.
    Simulated,
}

/// What happened to one library or XOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactOutcome {
    /// Present on the destination and left alone.
    AlreadyDeployed,
    /// Absent on the destination and posted.
    Deployed,
    /// Absent on the destination; dry run.
    Simulated,
    /// Present on the destination but posted again.
    Redeployed,
    /// Present on the destination; dry run would POST again.
    RedeploySimulated,
}

/// One library or XOM handled during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRecord {
    /// Managed URI as referenced by the `RuleApp` or library.
    pub uri: String,
    /// What happened to it.
    pub outcome: ArtifactOutcome,
}

/// Aggregate result of [`crate::Promoter::replicate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromotionReport {
    /// `RuleApp` name as requested.
    pub ruleapp: String,
    /// Highest version found on the source, if any.
    pub version: Option<String>,
    /// Whether POSTs were issued (`false` for a dry run).
    pub executed: bool,
    /// What happened to the `RuleApp`.
    pub ruleapp_outcome: RuleAppOutcome,
    /// Libraries in processing order.
    pub libraries: Vec<ArtifactRecord>,
    /// XOMs in processing order, library members included.
    pub xoms: Vec<ArtifactRecord>,
    /// Destination resources posted, or that would have been, in order.
    pub posts: Vec<String>,
    /// Files written to the staging directory, in order.
    pub staged: Vec<PathBuf>,
}

impl PromotionReport {
    /// An empty report for `ruleapp`.
    pub fn new(ruleapp: impl Into<String>, executed: bool) -> Self {
        Self {
            ruleapp: ruleapp.into(),
            version: None,
            executed,
            ruleapp_outcome: RuleAppOutcome::NotOnSource,
            libraries: Vec::new(),
            xoms: Vec::new(),
            posts: Vec::new(),
            staged: Vec::new(),
        }
    }

    /// Number of POSTs that actually left the process.
    pub fn post_count(&self) -> usize {
        if self.executed { self.posts.len() } else { 0 }
    }

    /// Number of artifacts deployed (or that a dry run would deploy).
    pub fn deploy_count(&self) -> usize {
        self.posts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_counts_no_posts() {
        let mut report = PromotionReport::new("loan", false);
        report.posts.push("/ruleapps".to_string());
        assert_eq!(report.post_count(), 0);
        assert_eq!(report.deploy_count(), 1);

        report.executed = true;
        assert_eq!(report.post_count(), 1);
    }

    #[test]
    fn test_serializes_outcomes_in_snake_case() {
        let mut report = PromotionReport::new("loan", true);
        report.ruleapp_outcome = RuleAppOutcome::AlreadyDeployed;
        report.xoms.push(ArtifactRecord {
            uri: "res://xomA/2".to_string(),
            outcome: ArtifactOutcome::RedeploySimulated,
        });

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["ruleapp_outcome"], "already_deployed");
        assert_eq!(json["xoms"][0]["outcome"], "redeploy_simulated");
    }
}
