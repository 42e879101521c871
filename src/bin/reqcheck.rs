//! Command-line entry point: load the three input documents, run the
//! consistency check and print the report.
//!
//! Exit status is 0 when the documentation matches the derivation and 1 on
//! any failure or setup error.

use anyhow::{Context, Result, anyhow, bail};
use reqcheck::{
    CatalogDerivation, CheckConfig, CoverageMap, EventManifest, Report, TaxonomyIndex,
    TypeHierarchyIndex, member_coverage, resolve_config_path, resolve_manifest_path,
    resolve_taxonomies_path, undocumented_members, verify,
};
use serde::Serialize;
use std::env;
use std::fmt;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

struct Cli {
    manifest: Option<PathBuf>,
    taxonomies: Option<PathBuf>,
    config: Option<PathBuf>,
    namespace: Option<String>,
    json: bool,
    coverage: bool,
}

impl Cli {
    fn parse() -> Result<Self> {
        let mut args = env::args_os();
        let _program = args.next();
        let mut cli = Cli {
            manifest: None,
            taxonomies: None,
            config: None,
            namespace: None,
            json: false,
            coverage: false,
        };

        while let Some(arg) = args.next() {
            let arg_str = arg
                .to_str()
                .ok_or_else(|| anyhow!("invalid UTF-8 in argument"))?;
            match arg_str {
                "--manifest" => cli.manifest = Some(next_path("--manifest", &mut args)?),
                "--taxonomies" => cli.taxonomies = Some(next_path("--taxonomies", &mut args)?),
                "--config" => cli.config = Some(next_path("--config", &mut args)?),
                "--namespace" => cli.namespace = Some(next_value("--namespace", &mut args)?),
                "--json" => cli.json = true,
                "--coverage" => cli.coverage = true,
                "--help" | "-h" => usage(0),
                other => bail!("unknown argument: {other}"),
            }
        }

        Ok(cli)
    }
}

fn next_value(flag: &str, args: &mut env::ArgsOs) -> Result<String> {
    let value = args
        .next()
        .ok_or_else(|| anyhow!("{flag} requires a value"))?
        .into_string()
        .map_err(|_| anyhow!("{flag} must be valid UTF-8"))?;
    if value.is_empty() {
        bail!("{flag} must not be empty");
    }
    Ok(value)
}

fn next_path(flag: &str, args: &mut env::ArgsOs) -> Result<PathBuf> {
    next_value(flag, args).map(PathBuf::from)
}

fn usage(code: i32) -> ! {
    eprintln!(
        "Usage: reqcheck [--manifest PATH] [--taxonomies PATH] [--config PATH] [--namespace NS] [--json] [--coverage]\n\nOptions:\n  --manifest PATH           Event manifest (or set REQCHECK_MANIFEST; default data/events.json).\n  --taxonomies PATH         Taxonomy catalog (or set REQCHECK_TAXONOMIES; default data/taxonomies.json).\n  --config PATH             Check configuration (or set REQCHECK_CONFIG; default data/reqcheck.json).\n  --namespace NS            Root namespace to check (or set REQCHECK_NAMESPACE; default from the manifest).\n  --json                    Emit the report as JSON.\n  --coverage                Also report members that are derived but never documented.\n  --help                    Show this help text."
    );
    std::process::exit(code);
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    report: &'a Report,
    #[serde(skip_serializing_if = "Option::is_none")]
    coverage: Option<&'a CoverageMap>,
}

/// Returns whether the run passed.
fn run() -> Result<bool> {
    let cli = Cli::parse()?;

    let manifest_path = resolve_manifest_path(cli.manifest.as_deref())?;
    let taxonomies_path = resolve_taxonomies_path(cli.taxonomies.as_deref())?;
    let config_path = resolve_config_path(cli.config.as_deref())?;

    let manifest = EventManifest::load(&manifest_path)?;
    let taxonomies = TaxonomyIndex::load(&taxonomies_path)?;
    let config = CheckConfig::load(&config_path)?;

    let namespace = cli
        .namespace
        .or_else(|| env::var("REQCHECK_NAMESPACE").ok().filter(|ns| !ns.is_empty()))
        .unwrap_or_else(|| manifest.namespace.clone());
    let hierarchy = TypeHierarchyIndex::discover(&manifest, &namespace)
        .with_context(|| format!("discovering event types in {}", manifest_path.display()))?;
    info!(namespace = %namespace, types = hierarchy.len(), "universe discovered");

    let derivation = CatalogDerivation::new(&hierarchy, &taxonomies)?;
    let report = verify(&hierarchy, &taxonomies, &config, &derivation)?;
    let coverage = if cli.coverage {
        Some(member_coverage(&hierarchy, &taxonomies, &derivation)?)
    } else {
        None
    };

    if cli.json {
        let output = JsonOutput {
            report: &report,
            coverage: coverage.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let mut text = report.render();
        if let Some(coverage) = &coverage {
            render_coverage(coverage, &mut text)?;
        }
        print!("{text}");
    }

    Ok(report.passed())
}

fn render_coverage(coverage: &CoverageMap, out: &mut impl fmt::Write) -> fmt::Result {
    let gaps = undocumented_members(coverage);
    for (taxonomy, member) in &gaps {
        writeln!(out, "UNCOVERED [{taxonomy}] {member} is derived but never documented")?;
    }
    let total: usize = coverage.values().map(|members| members.len()).sum();
    writeln!(
        out,
        "coverage: {} of {total} member(s) derived but undocumented",
        gaps.len()
    )
}
