//! Datamart CLI for customs-declaration processing.
//!
//! Usage:
//!     datamart company 'ООО "Ромашка"'
//!     datamart classify "Кран шаровой Ду50" --lexicon tags.csv
//!     datamart brand --aliases dict_brand.csv --manufacturer "Zetkama"
//!     datamart attributes "Затвор межфланцевый DN200 PN16"
//!     datamart vocab --input records.jsonl --lexicon tags.csv --limit 50
//!     datamart tag задвижка approved --lexicon tags.csv
//!     datamart run --input records.jsonl --output out.jsonl --lexicon tags.csv --aliases dict_brand.csv

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tradeflow_attributes::{AttributeExtractor, AttributeTables};
use tradeflow_brand::BrandMatcher;
use tradeflow_classify::{harvest_vocabulary, Classifier};
use tradeflow_company::CompanyNormalizer;
use tradeflow_explain::{explain_classification, explain_negations, summarize_outcome};
use tradeflow_features::{DictionaryAnalyzer, Lemmatizer};
use tradeflow_model::{fields, TermTag};
use tradeflow_pipeline::{PipelineConfig, RecordProcessor};
use tradeflow_store::{
    load_brand_aliases, load_lemma_dictionary, read_records, retag, write_records,
    CsvLexiconStore, LexiconStore,
};

#[derive(Parser)]
#[command(name = "datamart")]
#[command(about = "Normalize, classify and enrich customs declarations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pipeline configuration (JSON); missing keys keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Lemmatization list (lemma<TAB>form); Snowball stems are used without it
    #[arg(long, global = true)]
    lemmas: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum TagArg {
    Approved,
    Rejected,
    /// Remove the word from the lexicon
    None,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a company name into legal form and name
    Company {
        name: String,

        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Classify a product description against the tagging store
    Classify {
        text: String,

        /// Tagging store (word,tag CSV)
        #[arg(short, long)]
        lexicon: PathBuf,

        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Assign a brand from individual field values
    Brand {
        /// Brand dictionary (brand,aliases CSV)
        #[arg(short, long)]
        aliases: PathBuf,

        #[arg(long)]
        brand: Option<String>,

        #[arg(long)]
        manufacturer: Option<String>,

        #[arg(long)]
        exporter: Option<String>,

        #[arg(long)]
        details: Option<String>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Extract technical attributes from a description
    Attributes {
        text: String,

        /// Attribute dictionaries (JSON)
        #[arg(long)]
        tables: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// List the most frequent lemmas of the product texts for tagging
    Vocab {
        /// Records (JSON lines)
        #[arg(short, long)]
        input: PathBuf,

        /// Tagging store (word,tag CSV)
        #[arg(short, long)]
        lexicon: PathBuf,

        /// Maximum lemmas shown
        #[arg(long, default_value = "50")]
        limit: usize,

        /// Example texts kept per lemma
        #[arg(long, default_value = "3")]
        contexts: usize,

        /// Hide lemmas that are already tagged
        #[arg(long)]
        untagged: bool,

        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Tag a word in the tagging store, or remove its tag
    Tag {
        word: String,

        #[arg(value_enum)]
        tag: TagArg,

        /// Tagging store (word,tag CSV)
        #[arg(short, long)]
        lexicon: PathBuf,
    },

    /// Process a batch of records
    Run {
        /// Records (JSON lines)
        #[arg(short, long)]
        input: PathBuf,

        /// Processed records (JSON lines)
        #[arg(short, long)]
        output: PathBuf,

        /// Tagging store (word,tag CSV)
        #[arg(short, long)]
        lexicon: PathBuf,

        /// Brand dictionary (brand,aliases CSV)
        #[arg(short, long)]
        aliases: PathBuf,

        /// Attribute dictionaries (JSON)
        #[arg(long)]
        attributes: Option<PathBuf>,

        /// Print a summary line for every record
        #[arg(long)]
        explain: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let directive = if cli.verbose {
        "tradeflow=debug"
    } else {
        "tradeflow=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .init();

    let config: PipelineConfig = match &cli.config {
        Some(path) => load_json(path)?,
        None => PipelineConfig::default(),
    };

    let lemmas = cli.lemmas.as_deref();
    match cli.command {
        Commands::Company { name, format } => run_company(&config, &name, format),
        Commands::Classify {
            text,
            lexicon,
            format,
        } => run_classify(&config, lemmas, &text, &lexicon, format),
        Commands::Brand {
            aliases,
            brand,
            manufacturer,
            exporter,
            details,
            format,
        } => {
            let values = [
                (fields::PROD_BRAND, brand),
                (fields::PROD_MAN, manufacturer),
                (fields::EXPORTER_NAME, exporter),
                (fields::PROD_DETAILS, details),
            ];
            run_brand(&config, &aliases, &values, format)
        }
        Commands::Attributes {
            text,
            tables,
            format,
        } => run_attributes(&text, tables.as_deref(), format),
        Commands::Vocab {
            input,
            lexicon,
            limit,
            contexts,
            untagged,
            format,
        } => run_vocab(
            &config, lemmas, &input, &lexicon, limit, contexts, untagged, format,
        ),
        Commands::Tag { word, tag, lexicon } => run_tag(&word, tag, &lexicon),
        Commands::Run {
            input,
            output,
            lexicon,
            aliases,
            attributes,
            explain,
        } => run_batch(
            config,
            lemmas,
            &input,
            &output,
            &lexicon,
            &aliases,
            attributes.as_deref(),
            explain,
        ),
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn load_tables(path: Option<&Path>) -> Result<AttributeTables> {
    match path {
        Some(path) => load_json(path),
        None => Ok(AttributeTables::default()),
    }
}

fn load_lemmatizer(path: Option<&Path>) -> Result<Lemmatizer> {
    match path {
        Some(path) => {
            let analyzer = DictionaryAnalyzer::new(load_lemma_dictionary(path)?);
            tracing::debug!(forms = analyzer.len(), "dictionary lemmatizer");
            Ok(Lemmatizer::new(analyzer))
        }
        None => Ok(Lemmatizer::default()),
    }
}

fn run_company(config: &PipelineConfig, name: &str, format: Format) -> Result<()> {
    let normalizer = CompanyNormalizer::new(config.company.clone())?;
    let result = normalizer.normalize(Some(name));
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Format::Text => {
            println!("Legal form: {}", result.legal_form.as_deref().unwrap_or("-"));
            println!("Name:       {}", result.name.as_deref().unwrap_or("-"));
        }
    }
    Ok(())
}

fn run_classify(
    config: &PipelineConfig,
    lemmas: Option<&Path>,
    text: &str,
    lexicon: &Path,
    format: Format,
) -> Result<()> {
    let lexicon = CsvLexiconStore::new(lexicon).load()?;
    let classifier =
        Classifier::new(&lexicon, load_lemmatizer(lemmas)?, config.classifier.clone())?;
    let result = classifier.classify(Some(text));

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Format::Text => {
            let explanation = explain_classification(&result);
            println!("{}: {}", result.label, explanation.summary);
            println!("   {}", explanation.detail);
            if let Some(negations) = explain_negations(&result) {
                println!("   {}", negations.summary);
                for item in &negations.evidence {
                    println!("     {} ({})", item.value, item.context.as_deref().unwrap_or("-"));
                }
            }
        }
    }
    Ok(())
}

fn run_brand(
    config: &PipelineConfig,
    aliases: &Path,
    values: &[(&str, Option<String>)],
    format: Format,
) -> Result<()> {
    let index = load_brand_aliases(aliases)?;
    let matcher = BrandMatcher::new(&index, config.brand.clone())?;
    let fields: Vec<(&str, Option<&str>)> =
        values.iter().map(|(name, v)| (*name, v.as_deref())).collect();
    let result = matcher.assign_fields(&fields);

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Format::Text => {
            println!("Brand:      {}", result.brand);
            if !result.candidates.is_empty() {
                let candidates: Vec<_> = result.candidates.iter().map(String::as_str).collect();
                println!("Candidates: {}", candidates.join(", "));
                println!("Fields:     {}", result.evidence_fields.join(", "));
            }
        }
    }
    Ok(())
}

fn run_attributes(text: &str, tables: Option<&Path>, format: Format) -> Result<()> {
    let extractor = AttributeExtractor::new(&load_tables(tables)?)?;
    let result = extractor.extract(Some(text));

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Format::Text => {
            let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
            println!("DN:       {}", show(&result.nominal_diameter));
            println!("PN:       {}", show(&result.nominal_pressure));
            println!("Material: {}", show(&result.material));
            println!("Subtype:  {}", show(&result.product_subtype));
            println!("Seal:     {}", show(&result.seal_type));
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_vocab(
    config: &PipelineConfig,
    lemmas: Option<&Path>,
    input: &Path,
    lexicon: &Path,
    limit: usize,
    contexts: usize,
    untagged: bool,
    format: Format,
) -> Result<()> {
    let lexicon = CsvLexiconStore::new(lexicon).load()?;
    let records = read_records(input)?;

    let mut texts = Vec::with_capacity(records.len());
    for record in &records {
        match record.text(&config.text_field) {
            Ok(Some(text)) => texts.push(text),
            Ok(None) => {}
            Err(error) => tracing::warn!(%error, "record skipped"),
        }
    }

    let entries: Vec<_> = harvest_vocabulary(
        texts.iter().map(String::as_str),
        &load_lemmatizer(lemmas)?,
        &lexicon,
        contexts,
    )
    .into_iter()
    .filter(|e| !untagged || e.tag.is_none())
    .take(limit)
    .collect();

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        Format::Text => {
            for (i, entry) in entries.iter().enumerate() {
                let tag = entry.tag.map(|t| t.as_str()).unwrap_or("untagged");
                println!(
                    "{}. {} ({}) x{} [{}]",
                    i + 1,
                    entry.form,
                    entry.lemma,
                    entry.count,
                    tag
                );
                for context in &entry.contexts {
                    println!("     {}", context);
                }
            }
        }
    }
    Ok(())
}

fn run_tag(word: &str, tag: TagArg, lexicon: &Path) -> Result<()> {
    let tag = match tag {
        TagArg::Approved => Some(TermTag::Approved),
        TagArg::Rejected => Some(TermTag::Rejected),
        TagArg::None => None,
    };
    let store = CsvLexiconStore::new(lexicon);
    let previous = retag(&store, word, tag)?;

    let show = |t: Option<TermTag>| t.map(|t| t.as_str()).unwrap_or("untagged");
    println!("{}: {} -> {} ({})", word, show(previous), show(tag), store.path().display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_batch(
    config: PipelineConfig,
    lemmas: Option<&Path>,
    input: &Path,
    output: &Path,
    lexicon: &Path,
    aliases: &Path,
    attributes: Option<&Path>,
    explain: bool,
) -> Result<()> {
    let lexicon = CsvLexiconStore::new(lexicon).load()?;
    let index = load_brand_aliases(aliases)?;
    let tables = load_tables(attributes)?;
    let processor =
        RecordProcessor::with_lemmatizer(config, load_lemmatizer(lemmas)?, &lexicon, &index, &tables)?;

    let records = read_records(input)?;
    let (processed, summary) = processor.run_with(records, |record, outcome| {
        if explain {
            let decl = record.text(fields::DECL_NUMBER).ok().flatten().unwrap_or_default();
            println!("{}: {}", decl, summarize_outcome(outcome));
        }
    });
    write_records(output, &processed)?;

    println!("{}", summary);
    Ok(())
}
