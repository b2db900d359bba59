use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::time::Instant;

// Import from fieldrow-core
use fieldrow_core::config::DEFAULT_MAX_REPEAT;
use fieldrow_core::extractor::StepProfiler;
use fieldrow_core::schema::{LabelSchema, SchemaSpec};
use fieldrow_core::sink::{CsvSink, RowSink};
use fieldrow_core::storage::{
    calculate_config_hash, calculate_text_hash, FileStorage, NoOpStorage, RowCacheKey,
    RowCacheValue, RowStorage,
};
use fieldrow_core::{ExtractionConfig, FieldExtractor, PlainTextSource, TextSource};

#[derive(Parser)]
#[command(name = "fieldrow")]
#[command(about = "Rule-driven field extraction from sectioned assessment text")]
struct Args {
    /// Plain-text documents to extract from (one output row each)
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Path to the rule file (YAML). Labels without a rule fall back to
    /// default single-line matching on the label text.
    #[arg(short, long, default_value = "label_map.yml")]
    rules: String,

    /// Path to a custom schema file (YAML). If not specified, uses the
    /// built-in assessment schema.
    #[arg(short, long)]
    schema: Option<String>,

    /// Output CSV path. Rows are upserted by input file stem, so re-running
    /// on a corrected document replaces its row.
    #[arg(short, long, default_value = "output.csv")]
    output: String,

    /// Upper bound on wildcard rule expansion
    #[arg(long, default_value_t = DEFAULT_MAX_REPEAT)]
    max_repeat: usize,

    /// Skip cache and force fresh extraction (useful for rule authoring)
    #[arg(long)]
    skip_cache: bool,

    /// Cache directory for extracted rows
    #[arg(long, default_value = ".fieldrow_cache")]
    cache_dir: String,

    /// Enable detailed profiling of extraction steps
    #[arg(long)]
    profile: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("🦀 Fieldrow Field Extractor");

    // Load schema (column order for every output row)
    let schema = load_schema(&args)?;
    println!("🗂️  Schema: {} labels", schema.len());

    // Load rules; a missing file degrades to default rules per label
    let config =
        ExtractionConfig::load_with_fallback(Some(Path::new(&args.rules)))?.with_max_repeat(args.max_repeat);
    if Path::new(&args.rules).exists() {
        println!("📋 Loaded rules from: {}", args.rules);
    }

    let config_hash = calculate_config_hash(&config)?;
    let extractor = FieldExtractor::new(schema.clone(), &config);
    println!("🔍 {} concrete rules after wildcard expansion", extractor.rules().len());

    // Create storage based on cache settings
    let storage: Box<dyn RowStorage> = if args.skip_cache {
        Box::new(NoOpStorage::new())
    } else {
        Box::new(FileStorage::new(&args.cache_dir)?)
    };

    let source = PlainTextSource::new();
    let mut sink = CsvSink::new(Path::new(&args.output), schema);
    let mut failed = 0usize;

    for input in &args.inputs {
        let path = Path::new(input);
        if !path.exists() {
            eprintln!("⚠️  Input not found, skipping: {}", input);
            failed += 1;
            continue;
        }

        println!("📄 Processing: {}", input);
        match process_document(path, &source, &extractor, &config_hash, storage.as_ref(), args.profile) {
            Ok(row) => {
                let identity = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or(input)
                    .to_string();
                sink.upsert(&identity, row);
            }
            Err(e) => {
                eprintln!("❌ Extraction failed for {}: {e}", input);
                failed += 1;
            }
        }
    }

    if sink.is_empty() {
        eprintln!("❌ No documents were extracted");
        std::process::exit(1);
    }

    sink.write()?;
    println!("✅ Wrote {} rows to: {}", sink.len(), args.output);

    if failed > 0 {
        eprintln!("⚠️  {} input(s) failed or were skipped", failed);
        std::process::exit(1);
    }

    Ok(())
}

fn load_schema(args: &Args) -> Result<LabelSchema> {
    let spec = match &args.schema {
        Some(path) => {
            println!("🗂️  Loading schema from: {}", path);
            SchemaSpec::load_from_file(Path::new(path))?
        }
        None => SchemaSpec::assessment(),
    };
    Ok(spec.build()?)
}

fn process_document(
    path: &Path,
    source: &PlainTextSource,
    extractor: &FieldExtractor,
    config_hash: &str,
    storage: &dyn RowStorage,
    profile: bool,
) -> Result<fieldrow_core::ExtractionRow> {
    let text = source.load_text(path)?;
    let cache_key = RowCacheKey::new(calculate_text_hash(&text), config_hash.to_string());

    if let Some(cached) = storage.get_row(&cache_key)? {
        println!(
            "📦 Cache hit (extracted {}, {}ms)",
            cached.created_at.format("%Y-%m-%d %H:%M UTC"),
            cached.extraction_time_ms
        );
        return Ok(cached.row);
    }

    let mut profiler = StepProfiler::new(profile);
    let start = Instant::now();
    let row = extractor.extract_with_profiler(&text, &mut profiler);
    let elapsed_ms = start.elapsed().as_millis() as u64;
    profiler.print_summary();

    storage.store_row(&cache_key, &RowCacheValue::new(row.clone(), elapsed_ms))?;
    Ok(row)
}
