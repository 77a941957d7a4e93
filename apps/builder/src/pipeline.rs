//! Build orchestration: fetch and parse every source, reconcile, persist.

use anyhow::Context;
use chrono::Utc;
use clap::ValueEnum;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use fundlens_core::bulk::{
    read_archive_entry, ArchivePeriod, BulkArchiveSource, CachePolicy, CachedArchiveSource,
    FetchMode, FsArchiveCache, HttpArchiveSource,
};
use fundlens_core::funds::{
    normalize_registry, Fund, FundRegistry, FundRepositoryTrait,
};
use fundlens_core::ingest::{
    CustodyXmlParser, NormalizedFiling, RegulatorCsvParser, RegulatorTableKind,
    SourceTag, StatementTextParser,
};
use fundlens_core::reconcile::{
    consolidate, partition_regulator_filings, ConsolidatedRepositoryTrait, ConsolidationInput,
};
use fundlens_core::sectors::{SectorAssignment, SectorClassifier};
use fundlens_storage_sqlite::consolidated::ConsolidatedRepository;
use fundlens_storage_sqlite::funds::FundRepository;

use crate::config::Config;

const BULK_SOURCE_NAME: &str = "regulator";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BuildMode {
    /// Reuse fresh cached archives, fetch the rest
    Incremental,
    /// Refetch every archive, ignoring cache freshness
    Full,
    /// Cached data only, no network (CI)
    Ci,
}

impl BuildMode {
    fn fetch_mode(self) -> FetchMode {
        match self {
            BuildMode::Incremental => FetchMode::CacheThenFetch,
            BuildMode::Full => FetchMode::ForceRefetch,
            BuildMode::Ci => FetchMode::CacheOnly,
        }
    }
}

#[derive(Debug, Default)]
pub struct BuildSummary {
    pub funds: usize,
    pub rows: usize,
    pub custody_filings: usize,
    pub regulator_filings: usize,
    pub on_demand_filings: usize,
}

pub async fn run_build(
    config: &Config,
    mode: BuildMode,
    months: usize,
) -> anyhow::Result<BuildSummary> {
    let now = Utc::now();
    let today = now.date_naive();

    let pool = fundlens_storage_sqlite::init(&config.database_path)
        .with_context(|| format!("opening database {}", config.database_path))?;
    let fund_repository = FundRepository::new(pool.clone());
    let consolidated_repository = ConsolidatedRepository::new(pool);

    // 1. Fund registry
    let funds = load_registry(&config.registry_file)?;
    let registry = FundRegistry::new(funds.clone());
    tracing::info!("Loaded registry: {} funds", registry.len());

    // 2. Sector lookup table
    let classifier = load_classifier(&config.sector_table_file);

    // 3. Direct custody feed: XML documents plus extracted statements
    let mut custody = parse_custody_documents(&config.custody_dir);
    custody.extend(parse_statements(&config.statements_dir));
    tracing::info!("Parsed {} custody filings", custody.len());

    // 4. Regulator bulk archives through the cache
    let source = CachedArchiveSource::new(
        Arc::new(HttpArchiveSource::new(config.bulk_base_url.clone())),
        Arc::new(FsArchiveCache::new(config.data_dir.join("cache"))),
        CachePolicy::default(),
        BULK_SOURCE_NAME,
        mode.fetch_mode(),
        now,
    );
    let periods = ArchivePeriod::trailing(today, months);
    let bulk_filings = ingest_bulk_periods(&source, &periods).await;
    tracing::info!("Parsed {} regulator filings", bulk_filings.len());

    // 5. Restrict bulk data to the registry plus single-level
    //    fund-of-fund references
    let (regulator, on_demand) = partition_regulator_filings(bulk_filings, &registry, &custody);

    let mut summary = BuildSummary {
        funds: funds.len(),
        custody_filings: custody.len(),
        regulator_filings: regulator.len(),
        on_demand_filings: on_demand.len(),
        rows: 0,
    };

    // 6. Reconcile and persist both artifacts
    let records = consolidate(
        ConsolidationInput {
            custody,
            regulator,
            on_demand,
        },
        &registry,
        &classifier,
        today,
    );
    summary.rows = records.len();

    fund_repository
        .replace_all(funds)
        .await
        .context("persisting fund registry")?;
    consolidated_repository
        .replace_all(records)
        .await
        .context("persisting consolidated snapshot")?;

    Ok(summary)
}

pub fn print_status(config: &Config) -> anyhow::Result<()> {
    let pool = fundlens_storage_sqlite::init(&config.database_path)?;
    let fund_repository = FundRepository::new(pool.clone());
    let consolidated_repository = ConsolidatedRepository::new(pool);

    let funds = fund_repository.load_all()?.len();
    let rows = consolidated_repository.count()?;
    println!("database: {}", config.database_path);
    println!("funds:    {}", funds);
    println!("rows:     {}", rows);
    Ok(())
}

fn load_registry(path: &Path) -> anyhow::Result<Vec<Fund>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading fund registry {}", path.display()))?;
    let entries: Vec<Fund> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing fund registry {}", path.display()))?;
    Ok(normalize_registry(entries))
}

fn load_classifier(path: &Path) -> SectorClassifier {
    match fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str::<Vec<SectorAssignment>>(&raw) {
            Ok(assignments) => {
                tracing::info!("Loaded {} sector assignments", assignments.len());
                SectorClassifier::new(assignments)
            }
            Err(e) => {
                tracing::warn!("Unparseable sector table {}: {}", path.display(), e);
                SectorClassifier::empty()
            }
        },
        Err(_) => {
            tracing::warn!(
                "No sector table at {}; equities will classify as Other",
                path.display()
            );
            SectorClassifier::empty()
        }
    }
}

/// Reads every file in a drop directory, newest path order not guaranteed;
/// per-document failures skip that document only.
fn read_documents(dir: &Path, extension: &str) -> Vec<(String, String)> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Cannot read {}: {}; skipping source", dir.display(), e);
            return Vec::new();
        }
    };

    let mut documents = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        match fs::read_to_string(&path) {
            Ok(content) => documents.push((path.display().to_string(), content)),
            Err(e) => tracing::warn!("Skipping unreadable {}: {}", path.display(), e),
        }
    }
    documents.sort();
    documents
}

fn parse_custody_documents(dir: &Path) -> Vec<NormalizedFiling> {
    let parser = CustodyXmlParser::new();
    read_documents(dir, "xml")
        .iter()
        .filter_map(|(_, content)| parser.parse(content))
        .collect()
}

fn parse_statements(dir: &Path) -> Vec<NormalizedFiling> {
    let parser = StatementTextParser::new();
    read_documents(dir, "txt")
        .iter()
        .filter_map(|(_, content)| parser.parse(content))
        .collect()
}

/// Fetches and parses every requested period. A month that cannot be
/// fetched or read is skipped; the build proceeds on what is available.
async fn ingest_bulk_periods(
    source: &CachedArchiveSource,
    periods: &[ArchivePeriod],
) -> Vec<NormalizedFiling> {
    let parser = RegulatorCsvParser::new();
    let mut filings = Vec::new();

    for period in periods {
        let archive = match source.fetch_archive(period).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Skipping period {}: {}", period, e);
                continue;
            }
        };

        let net_assets = match read_archive_entry(
            &archive,
            RegulatorTableKind::NetAssets.file_fragment(),
        ) {
            Ok(Some(bytes)) => parser.parse_net_assets(&bytes).unwrap_or_else(|e| {
                tracing::warn!("Unreadable net-assets table for {}: {}", period, e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Skipping corrupt archive {}: {}", period, e);
                continue;
            }
        };

        let mut positions = Vec::new();
        for kind in RegulatorTableKind::POSITION_KINDS {
            match read_archive_entry(&archive, kind.file_fragment()) {
                Ok(Some(bytes)) => match parser.parse_positions(kind, &bytes) {
                    Ok(mut rows) => positions.append(&mut rows),
                    Err(e) => tracing::warn!(
                        "Unreadable {} table for {}: {}",
                        kind.file_fragment(),
                        period,
                        e
                    ),
                },
                Ok(None) => {}
                Err(e) => tracing::warn!("Archive entry error for {}: {}", period, e),
            }
        }

        filings.extend(parser.build_filings(positions, &net_assets, SourceTag::Regulator));
    }

    filings
}
