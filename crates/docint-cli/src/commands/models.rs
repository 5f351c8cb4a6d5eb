//! Models command - download and manage the sentence encoder.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use futures_util::StreamExt;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Arguments for the models command.
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    command: ModelsCommand,
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// List the encoder files
    List,

    /// Download the encoder
    Download(DownloadArgs),

    /// Check encoder status
    Status(StatusArgs),

    /// Remove the downloaded encoder
    Clean(StatusArgs),
}

#[derive(Args)]
struct DownloadArgs {
    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force re-download even if files exist
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct StatusArgs {
    /// Encoder directory
    #[arg(short, long)]
    dir: Option<PathBuf>,
}

/// A file of the encoder with its download URL.
struct ModelFile {
    filename: &'static str,
    size_bytes: u64,
    description: &'static str,
    url: &'static str,
}

const ENCODER_NAME: &str = "all-MiniLM-L6-v2";

const ENCODER_FILES: [ModelFile; 2] = [
    ModelFile {
        filename: "model.onnx",
        size_bytes: 90_400_000,
        description: "MiniLM-L6 sentence encoder (ONNX)",
        url: "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/onnx/model.onnx",
    },
    ModelFile {
        filename: "tokenizer.json",
        size_bytes: 466_000,
        description: "Hugging Face tokenizer (uncased WordPiece)",
        url: "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/tokenizer.json",
    },
];

/// Where `models download` puts the encoder.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docint")
        .join("models")
        .join(ENCODER_NAME)
}

pub async fn run(args: ModelsArgs) -> anyhow::Result<()> {
    match args.command {
        ModelsCommand::List => list_models(),
        ModelsCommand::Download(download_args) => download_models(download_args).await,
        ModelsCommand::Status(status_args) => check_status(status_args).map(|_| ()),
        ModelsCommand::Clean(clean_args) => clean_models(clean_args),
    }
}

fn list_models() -> anyhow::Result<()> {
    let total: u64 = ENCODER_FILES.iter().map(|f| f.size_bytes).sum();

    println!("{}", style("Sentence Encoder").bold());
    println!();
    println!(
        "{} {}",
        style(format!("▸ {}", ENCODER_NAME)).bold().cyan(),
        format_size(total)
    );
    for file in &ENCODER_FILES {
        println!(
            "    {:<20} {:>10}  {}",
            file.filename,
            format_size(file.size_bytes),
            file.description
        );
    }
    println!();
    println!("Commands:");
    println!("  docint models download    Download the encoder (~90MB)");
    println!("  docint models status      Check downloaded files");

    Ok(())
}

async fn download_models(args: DownloadArgs) -> anyhow::Result<()> {
    let output_dir = args.output.unwrap_or_else(default_model_dir);
    fs::create_dir_all(&output_dir)?;

    println!(
        "{} Downloading {} to {}",
        style("ℹ").blue(),
        style(ENCODER_NAME).cyan().bold(),
        output_dir.display()
    );
    println!();

    let client = reqwest::Client::builder()
        .user_agent(concat!("docint-cli/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let multi_progress = MultiProgress::new();
    let mut success_count = 0;
    let mut skip_count = 0;
    let mut error_count = 0;

    for file in &ENCODER_FILES {
        let path = output_dir.join(file.filename);

        if path.exists() && !args.force {
            let size = fs::metadata(&path)?.len();
            if size > file.size_bytes / 2 {
                println!(
                    "  {} {} (already exists, {})",
                    style("✓").green(),
                    file.filename,
                    format_size(size)
                );
                skip_count += 1;
                continue;
            }
        }

        let pb = multi_progress.add(ProgressBar::new(file.size_bytes));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} {msg:<30} [{bar:25.cyan/blue}] {bytes}/{total_bytes}")?
                .progress_chars("=>-"),
        );
        pb.set_message(file.filename.to_string());

        match download_file(&client, file.url, &path, &pb).await {
            Ok(()) => {
                pb.finish_with_message(format!("{} {}", style("✓").green(), file.filename));
                success_count += 1;
            }
            Err(e) => {
                pb.finish_with_message(format!("{} {} - {}", style("✗").red(), file.filename, e));
                error_count += 1;
            }
        }
    }

    println!();
    if error_count == 0 {
        println!("{} Encoder downloaded successfully!", style("✓").green().bold());
        if skip_count > 0 {
            println!("   {} downloaded, {} already present", success_count, skip_count);
        }
    } else {
        println!("{} Download completed with errors", style("⚠").yellow().bold());
        println!(
            "   {} downloaded, {} skipped, {} failed",
            success_count, skip_count, error_count
        );
        println!("Retry with: docint models download --force");
    }

    println!();
    check_status(StatusArgs {
        dir: Some(output_dir),
    })?;

    if error_count > 0 {
        anyhow::bail!("{} files failed to download", error_count);
    }
    Ok(())
}

async fn download_file(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
    pb: &ProgressBar,
) -> anyhow::Result<()> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("HTTP {}", response.status());
    }

    if let Some(content_length) = response.content_length() {
        pb.set_length(content_length);
    }

    // Stream into a temp file, rename when complete
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    file.flush()?;
    drop(file);

    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Print the state of each encoder file; returns whether all are present.
fn check_status(args: StatusArgs) -> anyhow::Result<bool> {
    let model_dir = args.dir.unwrap_or_else(default_model_dir);

    println!("{}", style("Encoder Status").bold());
    println!(
        "{} {}",
        style(format!("▸ {}", ENCODER_NAME)).bold(),
        model_dir.display()
    );

    let mut all_present = true;
    let mut total_size: u64 = 0;

    for file in &ENCODER_FILES {
        let path = model_dir.join(file.filename);
        let (status, size_str) = if path.exists() {
            let size = fs::metadata(&path)?.len();
            total_size += size;

            if size > file.size_bytes / 2 {
                (style("✓").green(), format_size(size))
            } else {
                all_present = false;
                (style("⚠").yellow(), format!("{} (incomplete?)", format_size(size)))
            }
        } else {
            all_present = false;
            (style("✗").red(), "missing".to_string())
        };

        println!("    {} {:<25} {:>10}", status, file.filename, size_str);
    }

    if all_present {
        println!("    {} Ready ({} total)", style("✓").green(), format_size(total_size));
    } else {
        println!(
            "    {} Run 'docint models download' to download",
            style("⚠").yellow()
        );
    }

    Ok(all_present)
}

fn clean_models(args: StatusArgs) -> anyhow::Result<()> {
    let model_dir = args.dir.unwrap_or_else(default_model_dir);

    if !model_dir.exists() {
        println!("{} No model files to remove.", style("ℹ").blue());
        return Ok(());
    }

    let mut removed = 0;
    let mut freed: u64 = 0;

    for file in &ENCODER_FILES {
        let path = model_dir.join(file.filename);
        if path.exists() {
            freed += fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            fs::remove_file(&path)?;
            removed += 1;
            println!("  {} Removed {}", style("✓").green(), file.filename);
        }
    }

    // Leftovers of interrupted downloads
    for entry in fs::read_dir(&model_dir)?.flatten() {
        let path = entry.path();
        if path.extension().map(|e| e == "tmp").unwrap_or(false) {
            fs::remove_file(&path)?;
        }
    }

    if removed > 0 {
        println!();
        println!(
            "{} Removed {} files, freed {}",
            style("✓").green(),
            removed,
            format_size(freed)
        );
    } else {
        println!("{} No model files to remove.", style("ℹ").blue());
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1}GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.1}MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.1}KB", bytes as f64 / 1_000.0)
    } else {
        format!("{}B", bytes)
    }
}
