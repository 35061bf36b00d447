//! The Weld binding compiler CLI.
//!
//! - `weldc check <unit.json>` - Resolve a unit's binding expressions and
//!   print what the code generator receives
//!
//! Options:
//! - `--config` - Path to weld.toml (defaults to one next to the unit file)
//! - `--json` - Output the compiled unit and diagnostics as JSON
//! - `--no-color` - Disable colorized output
//!
//! Logging is controlled by the `WELD_LOG` environment variable
//! (`WELD_LOG=debug weldc check ...`).

mod config;
mod unit;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use weld_expr::diagnostics::DiagnosticOptions;
use weld_expr::CompiledUnit;

use crate::config::Config;
use crate::unit::UnitFile;

#[derive(Parser)]
#[command(name = "weldc", version, about = "The Weld binding compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and analyze the binding expressions of one unit
    Check {
        /// Path to the unit file (JSON)
        unit: PathBuf,

        /// Path to weld.toml
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output the compiled unit and diagnostics as JSON
        #[arg(long)]
        json: bool,

        /// Disable colorized output
        #[arg(long = "no-color")]
        no_color: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("WELD_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Commands::Check {
            unit,
            config,
            json,
            no_color,
        } => {
            if let Err(e) = check(&unit, config.as_deref(), json, no_color) {
                if json {
                    let msg = serde_json::json!({
                        "code": "C0001",
                        "severity": "error",
                        "message": e,
                        "file": unit.display().to_string(),
                        "spans": [],
                        "fix": null
                    });
                    eprintln!("{}", msg);
                } else {
                    eprintln!("error: {}", e);
                }
                process::exit(1);
            }
        }
    }
}

/// Run the pipeline: read unit and config -> declare and lower -> resolve ->
/// report.
fn check(
    unit_path: &Path,
    config_path: Option<&Path>,
    json: bool,
    no_color: bool,
) -> Result<(), String> {
    if !unit_path.is_file() {
        return Err(format!(
            "Unit file '{}' does not exist",
            unit_path.display()
        ));
    }
    let unit = UnitFile::from_file(unit_path)?;
    let config = match config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::discover(unit_path.parent().unwrap_or(Path::new(".")))?,
    };

    let diag_opts = DiagnosticOptions {
        color: config.diagnostics.color.unwrap_or(true) && !no_color && !json,
        json,
    };

    let mut pool = unit.build_pool(&config)?;
    let catalog = unit.catalog(&config);
    tracing::info!(
        bindings = pool.roots().len(),
        nodes = pool.len(),
        "lowered unit {}",
        unit_path.display()
    );

    let compiled = weld_expr::compile_unit(&mut pool, &catalog);

    if json {
        let out = serde_json::to_string_pretty(&compiled)
            .map_err(|e| format!("Failed to serialize output: {}", e))?;
        println!("{}", out);
    } else {
        print!("{}", render_text(&compiled));
    }

    let filename = unit
        .filename
        .clone()
        .unwrap_or_else(|| unit_path.display().to_string());
    for rendered in compiled.render_errors(&unit.source, &filename, &diag_opts) {
        if diag_opts.json {
            eprintln!("{}", rendered);
        } else {
            eprint!("{}", rendered);
        }
    }

    if compiled.has_errors() {
        return Err(format!(
            "{} binding expression(s) failed to resolve",
            compiled.errors.len()
        ));
    }
    Ok(())
}

/// Human-readable form of the code generator's view.
fn render_text(compiled: &CompiledUnit) -> String {
    let mut out = String::new();
    for binding in &compiled.bindings {
        out.push_str(&format!("binding {} : {}\n", binding.key, binding.ty));
        for dep in &binding.dependencies {
            out.push_str(&format!("  depends on {}\n", dep));
        }
    }
    for observer in &compiled.observers {
        let ty = observer
            .ty
            .as_ref()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "?".to_string());
        out.push_str(&format!(
            "observer {} : {} ({} binding(s))\n",
            observer.name,
            ty,
            observer.bindings.len()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use weld_expr::ty::TypeDesc;
    use weld_expr::{Observer, RootBinding};

    #[test]
    fn text_output() {
        let compiled = CompiledUnit {
            bindings: vec![RootBinding {
                key: "field(id(user).name)".into(),
                ty: TypeDesc::string(),
                dependencies: vec!["id(user)".into()],
                span: None,
            }],
            observers: vec![Observer {
                key: "id(user)".into(),
                name: "user".into(),
                ty: Some(TypeDesc::reference("com.example.User")),
                bindings: vec!["field(id(user).name)".into()],
            }],
            errors: vec![],
        };
        assert_eq!(
            render_text(&compiled),
            "binding field(id(user).name) : java.lang.String\n  depends on id(user)\nobserver user : com.example.User (1 binding(s))\n"
        );
    }
}
