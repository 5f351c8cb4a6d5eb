//! Extract command - run one document through its configured strategy.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, ValueEnum};
use console::style;
use tracing::warn;

use docint_core::models::config::ExtractionStrategy;
use docint_core::{
    build_vectorizer, BureauReport, FieldValue, HashVectorizer, ParameterCatalog, RunCoordinator,
    SalesRecord, TextVectorizer,
};

use super::load_config;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Document file (.pdf or .txt)
    #[arg(required = true)]
    input: PathBuf,

    /// Document type
    #[arg(short, long, value_enum, default_value = "bureau")]
    kind: Kind,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Parameter catalog (CSV)
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    /// Credit-bureau report
    Bureau,
    /// GSTR-3B filing; the file stem is the period label
    Gst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(catalog) = args.catalog {
        config.inputs.catalog_path = catalog;
    }

    if !args.input.exists() {
        anyhow::bail!("File not found: {}", args.input.display());
    }

    // Anchor extraction never consults the vectorizer
    let needs_model = match args.kind {
        Kind::Bureau => config.extraction.bureau_strategy == ExtractionStrategy::Semantic,
        Kind::Gst => config.extraction.gst_strategy == ExtractionStrategy::Semantic,
    };
    let vectorizer: Arc<dyn TextVectorizer> = if needs_model {
        build_vectorizer(&config.vectorizer)?
    } else {
        Arc::new(HashVectorizer::new(config.vectorizer.hash_dimension))
    };

    let coordinator = RunCoordinator::new(config, vectorizer);

    let output = match args.kind {
        Kind::Bureau => {
            let catalog = coordinator.load_catalog()?;
            let report = coordinator.extract_bureau_document(&args.input, &catalog)?;
            format_bureau(&report, args.format)?
        }
        Kind::Gst => {
            // Only an absent catalog falls back to the anchor rule
            let catalog_path = &coordinator.config().inputs.catalog_path;
            let catalog = if catalog_path.exists() {
                coordinator.load_catalog()?
            } else {
                warn!(
                    "Catalog {} not found, using the anchor rule",
                    catalog_path.display()
                );
                ParameterCatalog::default()
            };
            let record = coordinator.extract_gst_document(&args.input, &catalog)?;
            format_sales(&record, args.format)?
        }
    };

    print!("{}", output);
    Ok(())
}

fn value_string(value: &FieldValue) -> String {
    match value {
        FieldValue::Number(n) => n.to_string(),
        FieldValue::Boolean(b) => b.to_string(),
        FieldValue::Absent => String::new(),
    }
}

fn format_bureau(report: &BureauReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(report)?)),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            wtr.write_record(["parameter_key", "value", "source", "confidence"])?;
            for (key, result) in report.iter() {
                wtr.write_record([
                    key.as_str(),
                    value_string(&result.value).as_str(),
                    result.source.as_str(),
                    format!("{:.2}", result.confidence).as_str(),
                ])?;
            }
            Ok(String::from_utf8(wtr.into_inner()?)?)
        }
        OutputFormat::Text => {
            let mut out = String::new();
            for (key, result) in report.iter() {
                let line = if result.is_found() {
                    format!(
                        "{} {:<30} {:<12} {:.2}  {}\n",
                        style("✓").green(),
                        key,
                        value_string(&result.value),
                        result.confidence,
                        style(&result.source).dim()
                    )
                } else {
                    format!("{} {:<30} {}\n", style("✗").red(), key, style("not found").dim())
                };
                out.push_str(&line);
            }
            Ok(out)
        }
    }
}

fn format_sales(record: &SalesRecord, format: OutputFormat) -> anyhow::Result<String> {
    let sales = record.sales.map(|s| s.to_string()).unwrap_or_default();
    match format {
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(record)?)),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            wtr.write_record(["month", "sales", "source", "confidence"])?;
            wtr.write_record([
                record.month.as_str(),
                sales.as_str(),
                record.source.as_str(),
                format!("{:.2}", record.confidence).as_str(),
            ])?;
            Ok(String::from_utf8(wtr.into_inner()?)?)
        }
        OutputFormat::Text => Ok(if record.sales.is_some() {
            format!(
                "{} {:<16} {:<14} {:.2}  {}\n",
                style("✓").green(),
                record.month,
                sales,
                record.confidence,
                style(&record.source).dim()
            )
        } else {
            format!("{} {:<16} {}\n", style("✗").red(), record.month, style("not found").dim())
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docint_core::ExtractionResult;

    #[test]
    fn test_bureau_csv() {
        let mut report = BureauReport::new();
        report.insert(
            "bureau_score",
            ExtractionResult::found(FieldValue::Number(742), "Score Section (page 1)", 0.71),
        );
        report.insert("wilful_default", ExtractionResult::not_found());

        let csv = format_bureau(&report, OutputFormat::Csv).unwrap();
        assert_eq!(
            csv,
            "parameter_key,value,source,confidence\n\
             bureau_score,742,Score Section (page 1),0.71\n\
             wilful_default,,not_found,0.00\n"
        );
    }

    #[test]
    fn test_sales_csv_without_value() {
        let record = SalesRecord::from_result("May 2024", ExtractionResult::absent("Not Found"));
        let csv = format_sales(&record, OutputFormat::Csv).unwrap();
        assert_eq!(csv, "month,sales,source,confidence\nMay 2024,,Not Found,0.00\n");
    }
}
