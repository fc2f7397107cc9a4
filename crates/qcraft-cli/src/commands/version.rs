//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - fault-tolerant quantum compilation",
        style("QCraft").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qcraft-ir            Circuit IR and device profiles");
    println!("  qcraft-codes         QEC code families, layouts and mapping");
    println!("  qcraft-compile       Cost model, discovery and fault-tolerant lowering");
    println!("  qcraft-export        Job packaging, export policy and provenance");
    println!("  qcraft-orchestrator  Workflow orchestration");
    println!("  qcraft-cli           Command-line interface");
    println!();
    println!("License: {}", style("Apache-2.0").dim());
}
