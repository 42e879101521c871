//! End-to-end verification run over a discovered universe.

use crate::checker::ConsistencyChecker;
use crate::config::CheckConfig;
use crate::coverage::{CoverageMap, build_member_coverage_map};
use crate::doc_references::DocumentationExtractor;
use crate::events::TypeHierarchyIndex;
use crate::registry::{DerivationOracle, RequirementRegistry};
use crate::report::Report;
use crate::taxonomy::TaxonomyIndex;
use anyhow::Result;
use tracing::info;

/// Extract documentation, derive requirements and check them against each
/// other.
///
/// Errors only for setup defects: a stale configuration, a bad reference
/// pattern or a failing derivation. Drift is reported in the returned
/// `Report`.
pub fn verify(
    hierarchy: &TypeHierarchyIndex,
    taxonomies: &TaxonomyIndex,
    config: &CheckConfig,
    oracle: &dyn DerivationOracle,
) -> Result<Report> {
    config.ensure_valid(hierarchy, taxonomies)?;
    let config = config.clone().with_annotated_optionals(hierarchy);

    let extractor = DocumentationExtractor::new(taxonomies)?;
    let extraction = extractor.extract_all(hierarchy);
    info!(
        documented = extraction.documented.len(),
        undocumented = extraction.undocumented.len(),
        unresolved = extraction.resolution_errors.len(),
        "documentation extracted"
    );

    let registry = RequirementRegistry::new(oracle, taxonomies);
    let checker = ConsistencyChecker::new(hierarchy, &registry, &config);
    let report = Report::from_results(checker.run(&extraction)?);
    info!(
        passed = report.passed(),
        failures = report.failures.len(),
        "consistency check finished"
    );
    Ok(report)
}

/// Member coverage for the universe; see [`build_member_coverage_map`].
pub fn member_coverage(
    hierarchy: &TypeHierarchyIndex,
    taxonomies: &TaxonomyIndex,
    oracle: &dyn DerivationOracle,
) -> Result<CoverageMap> {
    let extraction = DocumentationExtractor::new(taxonomies)?.extract_all(hierarchy);
    let registry = RequirementRegistry::new(oracle, taxonomies);
    Ok(build_member_coverage_map(
        hierarchy,
        taxonomies,
        &registry,
        &extraction.documented,
    )?)
}
