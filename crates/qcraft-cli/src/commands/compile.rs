//! Compile command implementation.

use std::fs;

use anyhow::{Context, Result};
use console::style;
use qcraft_compile::SurfaceCodePreferences;
use qcraft_export::{ExportPolicy, ExportedJob};
use qcraft_orchestrator::{Orchestrator, RunOptions, WorkflowOutcome, WorkflowStatus};

use super::common::{load_circuit, load_config, load_device};

/// Arguments of the compile command.
pub struct CompileArgs<'a> {
    pub input: &'a str,
    pub device: &'a str,
    pub output: Option<&'a str>,
    pub config: Option<&'a str>,
    pub layout: Option<String>,
    pub distance: Option<u32>,
    pub export_policy: Option<ExportPolicy>,
    pub comments: Option<String>,
}

/// Execute the compile command.
pub fn execute(args: &CompileArgs<'_>) -> Result<()> {
    let mut config = load_config(args.config)?;
    if let Some(policy) = args.export_policy {
        config.privacy.export_policy = policy;
    }

    let circuit = load_circuit(args.input)?;
    let device = load_device(args.device)?;
    println!(
        "{} Compiling {} for {} ({} qubits)",
        style("→").cyan().bold(),
        style(args.input).green(),
        style(&device.device_name).yellow(),
        device.max_qubits
    );
    println!(
        "  Loaded: {} logical qubits, {} gates",
        circuit.num_qubits(),
        circuit.num_gates()
    );

    let orchestrator = Orchestrator::new(&config, device).context("Failed to set up workflow")?;
    let options = RunOptions {
        code: SurfaceCodePreferences {
            layout: args.layout.clone(),
            distance: args.distance,
        },
        comments: args.comments.clone(),
        ..RunOptions::default()
    };
    let outcome = orchestrator.run_workflow(&circuit, &options);
    print_outcome(&outcome);

    if let Some(path) = args.output {
        let json = serde_json::to_string_pretty(&outcome)?;
        fs::write(path, json).with_context(|| format!("Failed to write file: {path}"))?;
        println!("  Output: {}", style(path).green());
    }

    match outcome.status {
        WorkflowStatus::Completed => Ok(()),
        status => anyhow::bail!(
            "Workflow {} {}: {}",
            outcome.workflow_id,
            status,
            outcome.error.as_deref().unwrap_or("no error recorded")
        ),
    }
}

fn print_outcome(outcome: &WorkflowOutcome) {
    let ctx = &outcome.context;
    let marker = if outcome.status == WorkflowStatus::Completed {
        style("✓").green().bold()
    } else {
        style("✗").red().bold()
    };
    println!("{} Workflow {} {}", marker, outcome.workflow_id, outcome.status);
    println!("  Strategy: {}", style(ctx.strategy.selected).cyan());

    if let Some(code) = &ctx.code {
        println!(
            "  Code:     {} {} d={} ({} patch(es), {} qubits)",
            code.family,
            code.layout_type,
            code.distance,
            code.layout.num_patches(),
            code.layout.total_qubits()
        );
    }
    if let Some(mapping) = &ctx.mapping {
        println!(
            "  Mapping:  {} physical qubits, {} component(s){}",
            mapping.kpis.physical_qubits,
            mapping.kpis.connected_components,
            if mapping.kpis.has_overlap { ", overlapping" } else { "" }
        );
    }
    if let Some(co) = &ctx.co_optimization {
        println!(
            "  Co-opt:   d={} after {} candidates (LER {:.3e})",
            co.best.distance,
            co.evaluated,
            co.best.estimated_ler.unwrap_or_default()
        );
    }
    if let Some(ft) = &ctx.ft_circuit {
        println!(
            "  FT:       {} gates, {} protocol decision(s)",
            ft.circuit.num_gates(),
            ft.decisions.len()
        );
    }
    if let Some(plan) = &ctx.code_switching {
        for point in plan {
            println!(
                "    gate {} {} -> {}",
                point.gate_index,
                style(&point.gate).yellow(),
                point.protocol
            );
        }
    }
    if let Some(package) = &ctx.package {
        match &package.job {
            ExportedJob::Package(job) => println!(
                "  Package:  {} instructions for {}/{}",
                job.native_job.instructions.len(),
                job.provider,
                job.device
            ),
            ExportedJob::Blocked(blocked) => println!(
                "  Package:  {} by policy {}",
                style("blocked").red(),
                blocked.policy
            ),
        }
        if let Some(manifest) = &package.provenance {
            println!(
                "  Provenance: {}:{}",
                manifest.signature_alg,
                style(&manifest.signature[..16.min(manifest.signature.len())]).dim()
            );
        }
    }
    for degraded in &ctx.degraded {
        println!(
            "  {} {} degraded: {}",
            style("!").yellow().bold(),
            degraded.stage,
            degraded.error
        );
    }
    println!(
        "  Steps:    {}",
        outcome
            .steps
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
}
