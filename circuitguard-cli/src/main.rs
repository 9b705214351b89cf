//! CircuitGuard CLI - panel compilation and continuity checks from the command line.

use anyhow::{anyhow, Context, Result};
use circuitguard::{
    parse_override, simulate_circuit, BuildResult, Circuit, CircuitGuardCore, CompileOptions,
    SimulationResult,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "circuitguard")]
#[command(about = "Electrical panel continuity checker", long_about = None)]
#[command(version)]
struct Cli {
    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a component list into a circuit
    Compile {
        /// Components JSON file ({"components": [...]} or an extracted array)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Name given to the compiled circuit
        #[arg(long, default_value = "Imported panel")]
        name: String,

        /// Write the circuit JSON here instead of stdout
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Check which receptors of a circuit are powered
    Simulate {
        /// Circuit JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Override a state, e.g. --set state-Q1=true
        #[arg(long = "set", value_name = "STATE=BOOL")]
        overrides: Vec<String>,

        /// Treat FILE as a component list and compile it first
        #[arg(long)]
        from_components: bool,

        /// Exit with error code if any receptor is unpowered
        #[arg(long)]
        fail_on_unpowered: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Print the structural fingerprint of a component list
    Fingerprint {
        /// Components JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Check a circuit file's invariants and print topology statistics
    Validate {
        /// Circuit JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Compile {
            file,
            name,
            output,
            format,
        } => handle_compile(&file, name, output.as_deref(), &format),
        Commands::Simulate {
            file,
            overrides,
            from_components,
            fail_on_unpowered,
            format,
        } => handle_simulate(&file, &overrides, from_components, fail_on_unpowered, &format),
        Commands::Fingerprint { file } => handle_fingerprint(&file),
        Commands::Validate { file, format } => handle_validate(&file, &format),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_compile(
    file: &Path,
    name: String,
    output: Option<&Path>,
    format: &OutputFormat,
) -> Result<i32> {
    let options = CompileOptions {
        name,
        ..CompileOptions::default()
    };
    let result = CircuitGuardCore::compile_file(file, &options)
        .with_context(|| format!("failed to compile {}", file.display()))?;

    if let OutputFormat::Json = format {
        if output.is_none() {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(if result.success { 0 } else { 1 });
        }
    }

    print_build_issues(&result);

    let Some(input) = result.circuit_input.filter(|_| result.success) else {
        eprintln!("Compilation failed.");
        return Ok(1);
    };
    let circuit = input.into_circuit();
    let json = serde_json::to_string_pretty(&circuit)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "Compiled {} receptors into {}",
                circuit.receptor_node_ids.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(0)
}

fn print_build_issues(result: &BuildResult) {
    for issue in &result.errors {
        let level = if issue.is_fatal() { "error" } else { "warning" };
        eprintln!("{}: {}", level, issue);
    }
}

fn handle_simulate(
    file: &Path,
    raw_overrides: &[String],
    from_components: bool,
    fail_on_unpowered: bool,
    format: &OutputFormat,
) -> Result<i32> {
    let overrides = raw_overrides
        .iter()
        .map(|raw| {
            parse_override(raw).ok_or_else(|| anyhow!("invalid override '{}', expected STATE=BOOL", raw))
        })
        .collect::<Result<HashMap<String, bool>>>()?;

    let circuit = load_for_simulation(file, from_components)?;
    let result = simulate_circuit(&circuit, Some(&overrides));

    match format {
        OutputFormat::Human => output_human(&result),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    if fail_on_unpowered && !result.all_powered() {
        return Ok(1);
    }
    Ok(0)
}

fn load_for_simulation(file: &Path, from_components: bool) -> Result<Circuit> {
    if !from_components {
        return CircuitGuardCore::load_circuit(file)
            .with_context(|| format!("failed to load circuit {}", file.display()));
    }
    let (circuit, warnings) = CircuitGuardCore::compile_to_circuit(file, &CompileOptions::default())
        .with_context(|| format!("failed to compile {}", file.display()))?;
    for warning in warnings {
        eprintln!("warning: {}", warning);
    }
    Ok(circuit)
}

fn output_human(result: &SimulationResult) {
    println!("\nCircuit: {}", result.circuit_name);
    println!("{}", "─".repeat(60));

    for receptor in &result.results {
        if receptor.is_powered {
            println!("  POWERED    {}", receptor.receptor_name);
            continue;
        }
        println!("  UNPOWERED  {}", receptor.receptor_name);
        match &receptor.cutoff_point {
            Some(cutoff) => println!("      Cutoff: {} ({})", cutoff.link_name, cutoff.reason),
            None => println!("      Cutoff: no path to this receptor"),
        }
    }

    let active: Vec<&str> = result
        .states
        .iter()
        .filter(|s| s.is_active)
        .map(|s| s.name.as_str())
        .collect();

    println!("\n  Summary:");
    println!("    Receptors: {}", result.results.len());
    println!("    Powered:   {}", result.powered_count());
    println!("    Unpowered: {}", result.unpowered().count());
    if !active.is_empty() {
        println!("    Active states: {}", active.join(", "));
    }
}

fn handle_fingerprint(file: &Path) -> Result<i32> {
    let fingerprint = CircuitGuardCore::fingerprint_file(file)
        .with_context(|| format!("failed to read components {}", file.display()))?;
    println!("{}", fingerprint);
    Ok(0)
}

fn handle_validate(file: &Path, format: &OutputFormat) -> Result<i32> {
    let circuit = CircuitGuardCore::load_circuit(file)
        .with_context(|| format!("invalid circuit {}", file.display()))?;
    let stats = circuit.stats();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Human => {
            println!("\nCircuit: {} ({})", circuit.name, circuit.id);
            println!("{}", "─".repeat(60));
            println!("  Nodes:     {}", stats.node_count);
            println!("  Links:     {}", stats.link_count);
            println!("  States:    {}", stats.state_count);
            println!("  Receptors: {}", stats.receptor_count);
            println!("  Connected groups: {}", stats.connected_groups);
            if !stats.isolated_node_ids.is_empty() {
                println!("  Not connected to source: {}", stats.isolated_node_ids.join(", "));
            }
            println!("\n  Circuit is valid");
        }
    }
    Ok(0)
}
