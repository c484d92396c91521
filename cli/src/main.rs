//! docmark CLI - DOCX and Markdown conversion tool

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use docmark::convert::{Confirm, ConversionReport};
use docmark::{
    convert_batch, load_style_config_with_warnings, write_sample_config, ConvertOptions,
    ConverterRegistry, Direction, Docmark, FileSafety, Format, JsonFormat, RenderOptions,
    SafetyConfig, StyleConfig, Warning,
};

#[derive(Parser)]
#[command(name = "docmark")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Convert between DOCX and Markdown with round-trip formatting", long_about = None)]
struct Cli {
    /// Input file (.docx or .md)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output file (defaults to the input name with the other extension)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Conversion direction, inferred from the input when omitted
    #[arg(long, value_name = "docx2md|md2docx")]
    direction: Option<Direction>,

    /// Style configuration file (.json, .yaml, .yml, .toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Overwrite without asking and skip the collision check
    #[arg(short, long)]
    force: bool,

    /// Do not back up an existing output
    #[arg(long)]
    no_backup: bool,

    /// Skip the collision check
    #[arg(long)]
    no_hash_check: bool,

    /// Leave the metadata trailer out of generated Markdown
    #[arg(long)]
    no_metadata: bool,

    /// Write a sample style configuration and exit
    #[arg(long, value_name = "FILE")]
    create_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert many files in parallel
    Batch {
        /// Input files
        #[arg(value_name = "INPUTS", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        out_dir: PathBuf,

        /// Style configuration file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Overwrite existing outputs
        #[arg(short, long)]
        force: bool,
    },

    /// Show block statistics
    Info {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Dump blocks and metadata as JSON
    Inspect {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show version information
    Version,
}

/// Asks on the terminal before an existing file is replaced.
struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm_overwrite(&self, path: &Path) -> bool {
        eprint!(
            "{} File '{}' exists. Overwrite? [y/N]: ",
            "?".yellow().bold(),
            path.display()
        );
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Batch {
            ref inputs,
            ref out_dir,
            ref config,
            force,
        }) => cmd_batch(inputs, out_dir, config.as_deref(), force),
        Some(Commands::Info { ref input, json }) => cmd_info(input, json),
        Some(Commands::Inspect { ref input, compact }) => cmd_inspect(input, compact),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            if let Some(path) = cli.create_config.as_deref() {
                cmd_create_config(path)
            } else if let Some(input) = cli.input.as_deref() {
                cmd_convert(&cli, input)
            } else {
                println!("{}", "Usage: docmark <INPUT> [OUTPUT]".yellow());
                println!("       docmark --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_style(config: Option<&Path>) -> Result<StyleConfig, Box<dyn std::error::Error>> {
    let (style, mut warnings) = match config {
        Some(path) => load_style_config_with_warnings(path)?,
        None => (StyleConfig::default(), Vec::new()),
    };
    warnings.extend(style.validate());
    for warning in &warnings {
        print_warning(warning);
    }
    Ok(style)
}

fn safety_config(cli: &Cli) -> SafetyConfig {
    let mut config = SafetyConfig::new();
    if cli.force {
        config = config.forced();
    }
    if cli.no_hash_check {
        config = config.with_hash_check(false);
    }
    config.with_backup(!cli.no_backup)
}

/// Output path when none is given: same stem, other format's extension.
fn default_output(input: &Path, direction: Direction) -> PathBuf {
    let extension = match direction {
        Direction::DocxToMarkdown => Format::Markdown.extension(),
        Direction::MarkdownToDocx => Format::Docx.extension(),
    };
    input.with_extension(extension)
}

fn cmd_convert(cli: &Cli, input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let direction = match cli.direction {
        Some(direction) => direction,
        None => input
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Direction::from_extension)
            .map(Ok)
            .unwrap_or_else(|| {
                docmark::detect_format_from_path(input).map(Direction::from_source)
            })?,
    };
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output(input, direction));
    log::debug!("{:?}: {} -> {}", direction, input.display(), output.display());

    let options = ConvertOptions::new()
        .with_style(load_style(cli.config.as_deref())?)
        .with_render_options(RenderOptions::new().with_metadata(!cli.no_metadata));
    let safety = FileSafety::new(safety_config(cli)).with_confirm(TerminalConfirm);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Converting {}...", input.display()));

    let registry = ConverterRegistry::with_defaults();
    let result = registry.convert_file_as(direction, input, &output, &options, &safety);
    pb.finish_and_clear();

    print_report(&result?);
    Ok(())
}

fn cmd_create_config(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        return Err(format!("{} already exists", path.display()).into());
    }
    write_sample_config(path)?;
    println!("{} {}", "Created".green().bold(), path.display());
    Ok(())
}

fn cmd_batch(
    inputs: &[PathBuf],
    out_dir: &Path,
    config: Option<&Path>,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(out_dir)?;

    let options = ConvertOptions::new().with_style(load_style(config)?);
    let safety = if force {
        FileSafety::new(SafetyConfig::new().forced())
    } else {
        // No prompts from worker threads: existing outputs are refused.
        FileSafety::new(SafetyConfig::new())
    };

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let registry = ConverterRegistry::with_defaults();
    let results = convert_batch(&registry, inputs, out_dir, &options, &safety, |_| pb.inc(1));
    pb.finish_with_message("Done!");

    let mut failed = 0;
    println!();
    for (input, result) in &results {
        match result {
            Ok(report) => println!(
                "  {} {} -> {}",
                "✓".green(),
                input.display(),
                report.output.display()
            ),
            Err(e) => {
                failed += 1;
                println!("  {} {}: {}", "✗".red(), input.display(), e);
            }
        }
    }

    println!(
        "\n{} {} converted, {} failed",
        "Batch:".bold(),
        results.len() - failed,
        failed
    );
    if failed > 0 {
        return Err(format!("{} of {} conversions failed", failed, results.len()).into());
    }
    Ok(())
}

fn cmd_info(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let result = Docmark::new().open(input)?;
    let stats = result.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), result.format);

    let properties = &result.document.properties;
    if let Some(ref title) = properties.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = properties.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref created) = properties.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = properties.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Blocks".bold(), stats.block_count);
    println!("{}: {}", "Headings".bold(), stats.heading_count);
    println!("{}: {}", "Paragraphs".bold(), stats.paragraph_count);
    println!("{}: {}", "List items".bold(), stats.list_item_count);
    println!(
        "{}: {} ({} rows)",
        "Tables".bold(),
        stats.table_count,
        stats.table_row_count
    );
    println!("{}: {}", "Code blocks".bold(), stats.code_block_count);
    println!("{}: {}", "Links".bold(), stats.link_count);
    println!("{}: {}", "Words".bold(), stats.word_count);
    println!("{}: {}", "Characters".bold(), stats.char_count);

    for warning in result.warnings() {
        print_warning(warning);
    }

    Ok(())
}

fn cmd_inspect(input: &Path, compact: bool) -> Result<(), Box<dyn std::error::Error>> {
    let result = Docmark::new().open(input)?;
    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    println!("{}", result.to_json(format)?);
    Ok(())
}

fn print_report(report: &ConversionReport) {
    println!(
        "{} {} -> {}",
        "Converted".green().bold(),
        report.input.display(),
        report.output.display()
    );
    println!("  {} {}...", "Source hash:".dimmed(), &report.input_hash[..16]);
    println!("  {} {}...", "Output hash:".dimmed(), &report.output_hash[..16]);
    if let Some(ref backup) = report.backup {
        println!("  {} {}", "Backup:".dimmed(), backup.display());
    }
    println!(
        "  {} {} blocks, {} words",
        "Content:".dimmed(),
        report.stats.block_count,
        report.stats.word_count
    );
    for warning in &report.warnings {
        print_warning(warning);
    }
}

fn print_warning(warning: &Warning) {
    eprintln!("{}: {}", "Warning".yellow().bold(), warning);
}

fn cmd_version() {
    println!("{} {}", "docmark".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("DOCX and Markdown conversion tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/docmark".dimmed());
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output(Path::new("notes.md"), Direction::MarkdownToDocx),
            PathBuf::from("notes.docx")
        );
        assert_eq!(
            default_output(Path::new("dir/report.docx"), Direction::DocxToMarkdown),
            PathBuf::from("dir/report.md")
        );
    }

    #[test]
    fn test_parse_convert_flags() {
        let cli = Cli::try_parse_from([
            "docmark",
            "in.docx",
            "out.md",
            "--direction",
            "docx2md",
            "--no-backup",
            "--force",
        ])
        .unwrap();
        assert_eq!(cli.direction, Some(Direction::DocxToMarkdown));
        let config = safety_config(&cli);
        assert!(!config.create_backup);
        assert!(!config.check_hash);
        assert!(!config.require_confirmation);
    }

    #[test]
    fn test_create_config_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("style.yaml");
        cmd_create_config(&path).unwrap();
        let (_, warnings) = load_style_config_with_warnings(&path).unwrap();
        assert!(warnings.is_empty());
        assert!(cmd_create_config(&path).is_err());
    }

    #[test]
    fn test_parse_batch() {
        let cli = Cli::try_parse_from(["docmark", "batch", "a.md", "b.md", "--out-dir", "out"])
            .unwrap();
        match cli.command {
            Some(Commands::Batch { inputs, out_dir, .. }) => {
                assert_eq!(inputs.len(), 2);
                assert_eq!(out_dir, PathBuf::from("out"));
            }
            _ => panic!("expected batch"),
        }
    }
}
