//! `totem run`
//!
//! Replays a script against a fresh service. Each step reports its outcome;
//! a failed step changes nothing and the replay moves on. The fact log, a
//! fact summary and the final state are printed as one JSON document, and the
//! encoded fact log can also be written to a file for `totem summarize`.

use crate::commands::check_config;
use crate::issuer::LocalArtifactIssuer;
use crate::script::{Script, Step};
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use totem_core::CallContext;
use totem_tribe::{
    encode_fact_log, ErrorKind, GovernanceConfig, GovernanceSnapshot, RecordedFact, TribeError,
    TribeFactDelta, TribeService,
};

/// Arguments for `totem run`.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Governance configuration file
    #[arg(long)]
    pub config: PathBuf,

    /// Script of `[[step]]` entries to replay
    #[arg(long)]
    pub script: PathBuf,

    /// Make artifact issuance fail for this URI (repeatable)
    #[arg(long = "fail-issuance-for", value_name = "URI")]
    pub fail_issuance_for: Vec<String>,

    /// Write the encoded fact log to this file
    #[arg(long = "facts-out", value_name = "PATH")]
    pub facts_out: Option<PathBuf>,
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepResult {
    /// Step applied
    Ok {
        /// What the step produced
        detail: String,
    },
    /// Step rejected; no state changed
    Failed {
        /// Failure kind
        kind: ErrorKind,
        /// Error message
        message: String,
    },
}

/// Step outcome with its position in the script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// 1-based step number
    pub index: usize,
    /// Operation name
    pub op: &'static str,
    /// Outcome
    pub result: StepResult,
}

/// Everything a replay produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Per-step outcomes
    pub steps: Vec<StepReport>,
    /// Fact log in append order
    pub facts: Vec<RecordedFact>,
    /// Counts over the fact log
    pub summary: TribeFactDelta,
    /// Final state
    pub snapshot: GovernanceSnapshot,
}

#[derive(Serialize)]
struct ReplayOutput<'a> {
    facts: &'a [RecordedFact],
    summary: &'a TribeFactDelta,
    snapshot: &'a GovernanceSnapshot,
}

/// Load the inputs, replay and print the results.
pub async fn run(args: RunArgs) -> Result<()> {
    let config = check_config::load(&args.config)?;
    let script = Script::load(&args.script)?;
    let issuer = LocalArtifactIssuer::new(args.fail_issuance_for);

    let report = execute(config, &script, issuer).await?;
    for step in &report.steps {
        match &step.result {
            StepResult::Ok { detail } => println!("step {} {}: ok {detail}", step.index, step.op),
            StepResult::Failed { kind, message } => {
                println!("step {} {}: failed [{kind:?}] {message}", step.index, step.op);
            }
        }
    }

    let output = ReplayOutput {
        facts: &report.facts,
        summary: &report.summary,
        snapshot: &report.snapshot,
    };
    let json = serde_json::to_string_pretty(&output).context("Failed to encode replay output")?;
    println!("{json}");

    if let Some(path) = &args.facts_out {
        write_fact_log(path, &report.facts)?;
        tracing::info!(path = %path.display(), facts = report.facts.len(), "Fact log written");
    }
    Ok(())
}

/// Persist `facts` in the encoded log format.
pub fn write_fact_log(path: &Path, facts: &[RecordedFact]) -> Result<()> {
    let bytes = encode_fact_log(facts).context("Failed to encode fact log")?;
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write fact log {}", path.display()))
}

/// Replay `script` against a new service.
pub async fn execute(
    config: GovernanceConfig,
    script: &Script,
    issuer: LocalArtifactIssuer,
) -> Result<RunReport> {
    let mut service = TribeService::new(config, issuer).context("Failed to start service")?;
    let mut steps = Vec::with_capacity(script.steps.len());

    for (offset, step) in script.steps.iter().enumerate() {
        let index = offset + 1;
        let result = match apply(&mut service, step).await {
            Ok(detail) => StepResult::Ok { detail },
            Err(err) => StepResult::Failed {
                kind: err.kind(),
                message: err.to_string(),
            },
        };
        tracing::debug!(index, op = step.op(), ?result, "Step replayed");
        steps.push(StepReport {
            index,
            op: step.op(),
            result,
        });
    }

    Ok(RunReport {
        steps,
        facts: service.facts().to_vec(),
        summary: service.fact_summary(),
        snapshot: service.snapshot(),
    })
}

async fn apply(
    service: &mut TribeService<LocalArtifactIssuer>,
    step: &Step,
) -> Result<String, TribeError> {
    let ctx = CallContext::new(step.caller());
    match step {
        Step::CreateTribe {
            name,
            leader,
            requires_approval,
            quorum_threshold,
            ..
        } => service
            .create_tribe(&ctx, name, *leader, *requires_approval, *quorum_threshold)
            .map(|tribe_id| tribe_id.to_string()),
        Step::RequestJoin { tribe_id, uri, .. } => service
            .request_to_join_tribe(&ctx, *tribe_id, uri)
            .await
            .map(|request_id| request_id.to_string()),
        Step::Approve { request_id, .. } => service
            .approve_join_request(&ctx, *request_id)
            .map(|outcome| format!("{outcome:?}")),
        Step::Reject { request_id, .. } => service
            .reject_join_request(&ctx, *request_id)
            .map(|()| format!("{request_id} rejected")),
        Step::AddMember {
            tribe_id, member, ..
        } => service
            .add_member_directly(&ctx, *tribe_id, *member)
            .map(|()| format!("{member} admitted to {tribe_id}")),
        Step::TransferAdmin { new_admin, .. } => service
            .transfer_admin(&ctx, *new_admin)
            .map(|()| format!("admin is now {new_admin}")),
    }
}
