//! Estimate command implementation.

use anyhow::Result;
use console::style;
use qcraft_compile::{CostEstimate, CostModel};

use super::common::{load_circuit, load_config, load_device};

/// Execute the estimate command.
pub fn execute(input: &str, device: &str, config: Option<&str>, json: bool) -> Result<()> {
    let config = load_config(config)?;
    let circuit = load_circuit(input)?;
    let device = load_device(device)?;

    let selection = CostModel::new(&device, &config.cost_model)?.select_strategy(&circuit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&selection)?);
        return Ok(());
    }

    println!(
        "{} Cost estimates for {} on {}:\n",
        style("→").cyan().bold(),
        style(input).green(),
        style(&device.device_name).yellow()
    );
    print_estimate("A (decompose, encode, map)", &selection.path_a);
    print_estimate("B (encode, synthesize, map)", &selection.path_b);
    println!(
        "\n{} Selected strategy {}",
        style("✓").green().bold(),
        style(selection.selected).cyan().bold()
    );
    Ok(())
}

fn print_estimate(label: &str, estimate: &CostEstimate) {
    let f = &estimate.circuit_features;
    println!("  Path {label}");
    println!("    expected error: {:.4e}", estimate.expected_error);
    println!("    latency:        {} ns", estimate.latency_ns);
    println!("    swaps:          {}", estimate.estimated_swaps);
    println!(
        "    features:       {} 1q, {} 2q, {} measure, depth {}",
        f.oneq, f.twoq, f.measure, f.depth
    );
}
