//! The promotion pipeline.
//!
//! A run is strictly sequential:
//!
//! 1. Resolve the highest `RuleApp` version on the source.
//! 2. Probe the destination for that exact version; if absent, stage the
//!    archive and POST it.
//! 3. Enumerate the managed XOM URIs of every ruleset (deduplicated, in
//!    document order) and, for each one, promote the library or XOM it names.
//!
//! Step 2 only guards the `RuleApp` POST: the XOM phase runs even when the
//! `RuleApp` was already present. In a dry run every GET still happens and the
//! archives are staged, but no POST is issued.

use std::path::Path;

use respromote_schema::{LibraryDescriptor, ManagedUri, RuleAppDescriptor, SchemaError};

use crate::io::staging::Staging;
use crate::io::transport::Transport;
use crate::report::{ArtifactOutcome, ArtifactRecord, PromotionReport, RuleAppOutcome};
use crate::{PromoteConfig, PromoteError, Reporter};

/// Copies `RuleApps` and their XOM dependencies from one server to another.
#[derive(Debug)]
pub struct Promoter<R: Reporter> {
    source: Transport,
    destination: Transport,
    staging: Staging,
    reporter: R,
    skip_existing_xom: bool,
}

impl<R: Reporter> Promoter<R> {
    /// Create a promoter from its collaborators.
    pub fn new(source: Transport, destination: Transport, staging: Staging, reporter: R) -> Self {
        Self {
            source,
            destination,
            staging,
            reporter,
            skip_existing_xom: false,
        }
    }

    /// Build transports and staging from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PromoteError::Config`] if an endpoint is incomplete, or
    /// [`PromoteError::Client`] if an HTTP client cannot be built.
    pub fn from_config(config: &PromoteConfig, reporter: R) -> Result<Self, PromoteError> {
        let timeout = config.timeout();
        let source = Transport::new(&config.source_endpoint()?, timeout)?;
        let destination = Transport::new(&config.destination_endpoint()?, timeout)?;
        let staging = Staging::new(&config.promotion.stage_dir);
        Ok(Self::new(source, destination, staging, reporter)
            .skip_existing_xom(config.promotion.skip_existing_xom))
    }

    /// Skip XOMs already present on the destination instead of posting them
    /// again. Off by default.
    pub fn skip_existing_xom(mut self, skip: bool) -> Self {
        self.skip_existing_xom = skip;
        self
    }

    /// Promote the highest version of `ruleapp`. With `execute == false`
    /// nothing is posted.
    ///
    /// A `RuleApp` missing from the source is not an error: the report comes
    /// back with [`RuleAppOutcome::NotOnSource`].
    ///
    /// # Errors
    ///
    /// The first transport, protocol or storage failure ends the run. Earlier
    /// POSTs and staged files are not undone.
    pub async fn replicate(
        &self,
        ruleapp: &str,
        execute: bool,
    ) -> Result<PromotionReport, PromoteError> {
        let mut report = PromotionReport::new(ruleapp, execute);

        let resource = format!("/ruleapps/{ruleapp}/highest");
        let Some(document) = self.source.get_json(&resource).await? else {
            self.reporter
                .severe(&format!("RuleApp {ruleapp} is not deployed on source RES"));
            return Ok(report);
        };

        let descriptor = RuleAppDescriptor::from_json(document)
            .map_err(|e| PromoteError::protocol(self.source.url(&resource), e))?;
        let version = descriptor
            .version()
            .map_err(|e| PromoteError::protocol(self.source.url(&resource), e))?
            .to_string();
        self.reporter.info(&format!(
            "Found version {version} for {ruleapp} on source RES"
        ));
        report.version = Some(version.clone());

        report.ruleapp_outcome = self
            .replicate_ruleapp(ruleapp, &version, execute, &mut report)
            .await?;
        self.replicate_xoms(&descriptor, execute, &mut report)
            .await?;

        Ok(report)
    }

    async fn replicate_ruleapp(
        &self,
        ruleapp: &str,
        version: &str,
        execute: bool,
        report: &mut PromotionReport,
    ) -> Result<RuleAppOutcome, PromoteError> {
        let resource = format!("/ruleapps/{ruleapp}/{version}");
        if self.destination.get_json(&resource).await?.is_some() {
            self.reporter.warning(&format!(
                "RuleApp {ruleapp}/{version} is already deployed on destination RES"
            ));
            return Ok(RuleAppOutcome::AlreadyDeployed);
        }

        let archive = self.staging.stage(&format!("{ruleapp}_ruleapp.jar"))?;
        self.source
            .get_to_file(&format!("{resource}/archive"), &self.staging, &archive)
            .await?;
        report.staged.push(archive.clone());
        self.reporter.info(&format!(
            "Saved source RES archive to file {}",
            archive.display()
        ));

        self.deploy_archive("/ruleapps", &archive, execute, report)
            .await?;

        Ok(if execute {
            RuleAppOutcome::Deployed
        } else {
            RuleAppOutcome::Simulated
        })
    }

    async fn replicate_xoms(
        &self,
        descriptor: &RuleAppDescriptor,
        execute: bool,
        report: &mut PromotionReport,
    ) -> Result<(), PromoteError> {
        let uris = descriptor.managed_xom_uris().map_err(|e| {
            PromoteError::protocol(self.source.url(&format!("/ruleapps/{}", descriptor.id)), e)
        })?;
        for uri in &uris {
            self.reporter.info(&format!(
                "Found managed XOM entry used by source RuleApp: {uri}"
            ));
        }

        for uri in uris {
            let uri = ManagedUri::parse(uri);
            if uri.is_library() {
                self.replicate_library(&uri, execute, report).await?;
            } else {
                self.replicate_xom(&uri, execute, report).await?;
            }
        }

        Ok(())
    }

    /// Promote a library definition, then each of its member XOMs.
    ///
    /// A library already on the destination is skipped together with its
    /// members.
    async fn replicate_library(
        &self,
        uri: &ManagedUri,
        execute: bool,
        report: &mut PromotionReport,
    ) -> Result<(), PromoteError> {
        let resource = format!("/libraries/{}", uri_key(uri, ManagedUri::name_version)?);

        if self.destination.get_json(&resource).await?.is_some() {
            self.reporter.info(&format!(
                "Library {uri} is already deployed on the destination RES"
            ));
            report.libraries.push(ArtifactRecord {
                uri: uri.to_string(),
                outcome: ArtifactOutcome::AlreadyDeployed,
            });
            return Ok(());
        }

        let url = self.source.url(&resource);
        let document = self
            .source
            .get_json(&resource)
            .await?
            .ok_or_else(|| PromoteError::protocol(&url, "library descriptor is empty"))?;
        let library =
            LibraryDescriptor::from_json(document).map_err(|e| PromoteError::protocol(&url, e))?;

        let body = library.content_body();
        if execute {
            self.destination
                .post_text(&resource, &body, "text/plain")
                .await?;
        }
        self.record_post(&resource, execute, report);
        self.reporter.info(&format!(
            "Deploy library definition {resource} to {}",
            self.destination.base_url()
        ));
        report.libraries.push(ArtifactRecord {
            uri: uri.to_string(),
            outcome: if execute {
                ArtifactOutcome::Deployed
            } else {
                ArtifactOutcome::Simulated
            },
        });

        for member in &library.content {
            self.replicate_xom(&ManagedUri::Xom(member.clone()), execute, report)
                .await?;
        }

        Ok(())
    }

    /// Promote one XOM archive.
    ///
    /// The destination is checked, but unless `skip_existing_xom` is set a XOM
    /// that is already there is fetched and posted again.
    async fn replicate_xom(
        &self,
        uri: &ManagedUri,
        execute: bool,
        report: &mut PromotionReport,
    ) -> Result<(), PromoteError> {
        let name_version = uri_key(uri, ManagedUri::name_version)?;
        let name = uri_key(uri, ManagedUri::name)?;
        let resource = format!("/xoms/{name_version}");

        let present = self.destination.get_json(&resource).await?.is_some();
        if present {
            self.reporter.info(&format!(
                "XOM {uri} is already deployed on the destination RES"
            ));
            if self.skip_existing_xom {
                report.xoms.push(ArtifactRecord {
                    uri: uri.to_string(),
                    outcome: ArtifactOutcome::AlreadyDeployed,
                });
                return Ok(());
            }
        }

        let archive = self.staging.stage(name)?;
        self.source
            .get_to_file(&format!("{resource}/bytecode"), &self.staging, &archive)
            .await?;
        report.staged.push(archive.clone());
        self.reporter.info(&format!(
            "Saved source RES xom to file {}",
            archive.display()
        ));

        // The destination addresses XOM uploads by name only.
        self.deploy_archive(&format!("/xoms/{name}"), &archive, execute, report)
            .await?;

        let outcome = match (present, execute) {
            (false, true) => ArtifactOutcome::Deployed,
            (false, false) => ArtifactOutcome::Simulated,
            (true, true) => ArtifactOutcome::Redeployed,
            (true, false) => ArtifactOutcome::RedeploySimulated,
        };
        report.xoms.push(ArtifactRecord {
            uri: uri.to_string(),
            outcome,
        });

        Ok(())
    }

    /// POST a staged archive to the destination, or only record it in a dry run.
    async fn deploy_archive(
        &self,
        resource: &str,
        archive: &Path,
        execute: bool,
        report: &mut PromotionReport,
    ) -> Result<(), PromoteError> {
        if execute {
            let bytes = self.staging.read(archive).await?;
            self.destination.post_bytes(resource, bytes).await?;
        }
        self.record_post(resource, execute, report);
        self.reporter.info(&format!(
            "Deploy archive {} to {}{resource}",
            archive.display(),
            self.destination.base_url()
        ));
        Ok(())
    }

    fn record_post(&self, resource: &str, execute: bool, report: &mut PromotionReport) {
        report.posts.push(resource.to_string());
        self.reporter.deployed(resource, execute);
    }
}

fn uri_key<'a>(
    uri: &'a ManagedUri,
    key: fn(&'a ManagedUri) -> Result<&'a str, SchemaError>,
) -> Result<&'a str, PromoteError> {
    key(uri).map_err(|e| PromoteError::protocol(uri.as_str(), e))
}
