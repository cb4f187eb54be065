//! Compose command - one-shot project composition.
//!
//! Runs the same pipeline the MAPCOMPOSITION service runs, against the
//! local filesystem, and prints the merge report.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::Args;
use console::style;

use mapcomposition::compose::{MergeOutcome, MergeReport};
use mapcomposition::config::ConfigFile;
use mapcomposition::legend::SwatchRenderer;
use mapcomposition::service::{
    ComposeParams, MapCompositionService, Method, ServiceRequest,
};

use crate::error::CliError;

/// Arguments for the compose command.
#[derive(Debug, Args)]
pub struct ComposeArgs {
    /// Destination project file
    #[arg(long)]
    pub project: PathBuf,

    /// Data source URI (repeat per layer, in draw order)
    #[arg(long = "source", required = true)]
    pub sources: Vec<String>,

    /// Display name per source (repeat, same order as --source)
    #[arg(long = "name")]
    pub names: Vec<String>,

    /// Discard any existing project and start fresh
    #[arg(long)]
    pub overwrite: bool,

    /// Delete companion .qml style files after composing
    #[arg(long)]
    pub remove_qml: bool,
}

/// Build the wire-grammar parameter map for a compose invocation.
fn request_params(args: &ComposeArgs) -> HashMap<String, String> {
    let mut params = HashMap::new();
    params.insert(
        "PROJECT".to_string(),
        args.project.display().to_string(),
    );
    params.insert("SOURCES".to_string(), args.sources.join(";"));
    if !args.names.is_empty() {
        params.insert("NAMES".to_string(), args.names.join(";"));
    }
    if args.overwrite {
        params.insert("OVERWRITE".to_string(), "true".to_string());
    }
    if args.remove_qml {
        params.insert("REMOVEQML".to_string(), "true".to_string());
    }
    params
}

fn print_report(report: &MergeReport) {
    for record in &report.records {
        let outcome = match record.outcome {
            MergeOutcome::Added => style("added   ").green(),
            MergeOutcome::Kept => style("kept    ").dim(),
            MergeOutcome::Replaced => style("replaced").yellow(),
        };
        println!("  {} {} ({})", outcome, record.name, record.id);
    }
    println!(
        "{} added, {} kept, {} replaced",
        report.added(),
        report.kept(),
        report.replaced()
    );
}

/// Run the compose command.
pub fn run(args: ComposeArgs) -> Result<(), CliError> {
    let config = ConfigFile::load().unwrap_or_default();

    let request = ServiceRequest::new(Method::Get, request_params(&args));
    let params =
        ComposeParams::from_request(&request).map_err(|e| CliError::Service(e.to_string()))?;

    let service = MapCompositionService::new()
        .with_wfs_precision(config.composition.wfs_precision)
        .with_renderer(Box::new(SwatchRenderer::new(config.composition.legend_size)));

    let report = service
        .compose(&params)
        .map_err(|e| CliError::Service(e.to_string()))?;

    println!("Composed {}", args.project.display());
    print_report(&report);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(project: PathBuf, sources: Vec<String>) -> ComposeArgs {
        ComposeArgs {
            project,
            sources,
            names: Vec::new(),
            overwrite: false,
            remove_qml: false,
        }
    }

    #[test]
    fn test_request_params_grammar() {
        let mut a = args(
            PathBuf::from("/tmp/p.json"),
            vec!["/data/a.shp".to_string(), "/data/b.shp".to_string()],
        );
        a.names = vec!["A".to_string(), "B".to_string()];
        a.overwrite = true;

        let params = request_params(&a);
        assert_eq!(params.get("SOURCES").unwrap(), "/data/a.shp;/data/b.shp");
        assert_eq!(params.get("NAMES").unwrap(), "A;B");
        assert_eq!(params.get("OVERWRITE").unwrap(), "true");
        assert!(!params.contains_key("REMOVEQML"));
    }

    #[test]
    fn test_compose_runs_pipeline() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("rivers.shp");
        std::fs::write(&source, "stub").unwrap();
        let project = dir.path().join("project.json");

        let a = args(
            project.clone(),
            vec![source.to_str().unwrap().to_string()],
        );
        run(a).unwrap();
        assert!(project.is_file());
    }

    #[test]
    fn test_compose_missing_source_fails() {
        let dir = TempDir::new().unwrap();
        let a = args(
            dir.path().join("project.json"),
            vec!["/nonexistent/rivers.shp".to_string()],
        );
        assert!(run(a).is_err());
    }
}
