//! scanmark CLI - assemble layout-model detections into documents

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use scanmark::{
    assemble_file_with_options, CleanupPreset, Document, ElementKind, JsonFormat, PageSelection,
    ParseOptions, RenderOptions,
};

#[derive(Parser)]
#[command(name = "scanmark")]
#[command(version)]
#[command(about = "Assemble layout-model detections into Markdown, text, and JSON", long_about = None)]
struct Cli {
    /// Detection dump (JSON)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Text cleanup preset
    #[arg(long, value_enum)]
    cleanup: Option<CleanupLevel>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a dump into Markdown (with images), text and JSON
    Assemble {
        /// Detection dump (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Text cleanup preset
        #[arg(long, value_enum)]
        cleanup: Option<CleanupLevel>,

        /// Skip detections that cannot be typed instead of failing
        #[arg(long)]
        lenient: bool,

        /// Page selection, 0-indexed (e.g., "0-9", "0,2,4")
        #[arg(long)]
        pages: Option<String>,

        /// Print rendering statistics
        #[arg(long)]
        stats: bool,
    },

    /// Render a dump to Markdown
    #[command(alias = "md")]
    Markdown {
        /// Detection dump (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Directory to write image files into
        #[arg(long, value_name = "DIR")]
        images: Option<PathBuf>,

        /// Prefix for image paths in the Markdown
        #[arg(long, default_value = "")]
        image_prefix: String,

        /// Text cleanup preset
        #[arg(long, value_enum)]
        cleanup: Option<CleanupLevel>,

        /// Heading level for titles (1-6)
        #[arg(long, default_value = "2")]
        title_level: u8,

        /// Escape Markdown characters in recognized text
        #[arg(long)]
        escape: bool,

        /// Page selection, 0-indexed (e.g., "0-9", "0,2,4")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Render a dump to plain text
    Text {
        /// Detection dump (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Text cleanup preset
        #[arg(long, value_enum)]
        cleanup: Option<CleanupLevel>,

        /// Page selection, 0-indexed (e.g., "0-9", "0,2,4")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Render the assembled document as JSON
    Json {
        /// Detection dump (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Print each page's elements in reading order
    Order {
        /// Detection dump (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Page selection, 0-indexed (e.g., "0-9", "0,2,4")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Show document information
    Info {
        /// Detection dump (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum CleanupLevel {
    /// Minimal cleanup (Unicode normalization only)
    Minimal,
    /// Standard cleanup (default)
    Standard,
    /// Aggressive cleanup (also joins lines)
    Aggressive,
}

impl From<CleanupLevel> for CleanupPreset {
    fn from(level: CleanupLevel) -> Self {
        match level {
            CleanupLevel::Minimal => CleanupPreset::Minimal,
            CleanupLevel::Standard => CleanupPreset::Standard,
            CleanupLevel::Aggressive => CleanupPreset::Aggressive,
        }
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Assemble {
            input,
            output,
            cleanup,
            lenient,
            pages,
            stats,
        }) => cmd_assemble(&input, output.as_deref(), cleanup, lenient, pages.as_deref(), stats),
        Some(Commands::Markdown {
            input,
            output,
            images,
            image_prefix,
            cleanup,
            title_level,
            escape,
            pages,
        }) => {
            let mut options = RenderOptions::new()
                .with_image_prefix(image_prefix)
                .with_title_heading(title_level)
                .with_escaping(escape);
            if let Some(dir) = images {
                options = options.with_image_dir(dir);
            }
            if let Some(level) = cleanup {
                options = options.with_cleanup_preset(level.into());
            }
            cmd_markdown(&input, output.as_deref(), options, pages.as_deref())
        }
        Some(Commands::Text {
            input,
            output,
            cleanup,
            pages,
        }) => cmd_text(&input, output.as_deref(), cleanup, pages.as_deref()),
        Some(Commands::Json {
            input,
            output,
            compact,
        }) => cmd_json(&input, output.as_deref(), compact),
        Some(Commands::Order { input, pages }) => cmd_order(&input, pages.as_deref()),
        Some(Commands::Info { input, json }) => cmd_info(&input, json),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: assemble if input is provided
            if let Some(input) = cli.input {
                cmd_assemble(&input, cli.output.as_deref(), cli.cleanup, true, None, false)
            } else {
                println!("{}", "Usage: scanmark <FILE> [OUTPUT]".yellow());
                println!("       scanmark --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn parse_pages(pages: Option<&str>) -> Result<PageSelection, String> {
    match pages {
        Some(p) => PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e)),
        None => Ok(PageSelection::All),
    }
}

fn write_or_print(output: Option<&Path>, content: &str) -> CliResult {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_assemble(
    input: &Path,
    output: Option<&Path>,
    cleanup: Option<CleanupLevel>,
    lenient: bool,
    pages: Option<&str>,
    show_stats: bool,
) -> CliResult {
    let output_dir = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_output", stem))
    });
    let page_selection = parse_pages(pages)?;

    let pb = ProgressBar::new(4);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Assembling detections...");
    let mut options = ParseOptions::new().with_pages(page_selection.clone());
    if lenient {
        options = options.lenient();
    }
    let doc = assemble_file_with_options(input, &options)?;
    log::debug!(
        "assembled {} elements on {} pages",
        doc.element_count(),
        doc.page_count()
    );
    pb.inc(1);

    let mut render_options = RenderOptions::new()
        .with_image_dir(output_dir.join("images"))
        .with_image_prefix("images/")
        .with_pages(page_selection);
    if let Some(level) = cleanup {
        render_options = render_options.with_cleanup_preset(level.into());
    }

    pb.set_message("Writing Markdown and images...");
    let result = scanmark::render::write_markdown(&doc, &output_dir, &render_options)?;
    pb.inc(1);

    pb.set_message("Generating text...");
    let text = scanmark::render::to_text(&doc, &render_options)?;
    fs::write(output_dir.join("extract.txt"), &text)?;
    pb.inc(1);

    pb.set_message("Generating JSON...");
    let json = scanmark::render::to_json(&doc, JsonFormat::Pretty)?;
    fs::write(output_dir.join("content.json"), &json)?;
    pb.inc(1);

    pb.finish_with_message("Done!");

    println!("\n{}", "Output files:".green().bold());
    println!("  {} {}", "├─".dimmed(), render_options.file_name);
    println!("  {} extract.txt", "├─".dimmed());
    println!("  {} content.json", "├─".dimmed());
    println!("  {} images/ ({} files)", "└─".dimmed(), result.images.len());

    if show_stats {
        let stats = &result.stats;
        println!("\n{}", "Rendering Statistics".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        println!("{}: {}", "Pages".bold(), stats.page_count);
        println!("{}: {}", "Elements".bold(), stats.element_count());
        println!("{}: {}", "Empty placeholders".bold(), stats.empty_count);
        println!("{}: {}", "Embedded equations".bold(), stats.swallowed_equations);
        println!("{}: {}", "Words".bold(), stats.word_count);
    }

    Ok(())
}

fn cmd_markdown(
    input: &Path,
    output: Option<&Path>,
    options: RenderOptions,
    pages: Option<&str>,
) -> CliResult {
    let page_selection = parse_pages(pages)?;
    let parse_options = ParseOptions::new().with_pages(page_selection.clone());
    let doc = assemble_file_with_options(input, &parse_options)?;

    let options = options.with_pages(page_selection);
    let markdown = scanmark::render::to_markdown(&doc, &options)?;
    write_or_print(output, &markdown)
}

fn cmd_text(
    input: &Path,
    output: Option<&Path>,
    cleanup: Option<CleanupLevel>,
    pages: Option<&str>,
) -> CliResult {
    let page_selection = parse_pages(pages)?;
    let options = ParseOptions::new().lenient().with_pages(page_selection);
    let doc = assemble_file_with_options(input, &options)?;

    let mut render_options = RenderOptions::new();
    if let Some(level) = cleanup {
        render_options = render_options.with_cleanup_preset(level.into());
    }

    let text = scanmark::render::to_text(&doc, &render_options)?;
    write_or_print(output, &text)
}

fn cmd_json(input: &Path, output: Option<&Path>, compact: bool) -> CliResult {
    let doc = scanmark::assemble_file(input)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = scanmark::render::to_json(&doc, format)?;
    write_or_print(output, &json)
}

fn cmd_order(input: &Path, pages: Option<&str>) -> CliResult {
    let options = ParseOptions::new().lenient().with_pages(parse_pages(pages)?);
    let doc = assemble_file_with_options(input, &options)?;

    for page in doc.page_numbers() {
        println!("{} {}", "Page".cyan().bold(), page);
        for (i, element) in doc.get_ordered_elements(page).into_iter().enumerate() {
            let b = &element.bbox;
            let mut line = format!(
                "  {:>3}. {:<8} [{:.3}, {:.3}, {:.3}, {:.3}]",
                i + 1,
                element.kind().to_string(),
                b.x_min(),
                b.y_min(),
                b.x_max(),
                b.y_max()
            );
            if element.has_equation_inside() {
                line.push_str(&format!(" {}", "+equation".dimmed()));
            }
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_info(input: &Path, as_json: bool) -> CliResult {
    let options = ParseOptions::new().lenient();
    let doc = assemble_file_with_options(input, &options)?;
    let result = scanmark::render::to_markdown_with_stats(&doc, &RenderOptions::default())?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&result.stats)?);
        return Ok(());
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Pages".bold(), doc.page_count());
    println!("{}: {}", "Elements".bold(), doc.element_count());
    print_kind_counts(&doc);

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Words".bold(), result.stats.word_count);
    println!("{}: {}", "Characters".bold(), result.stats.char_count);
    println!("{}: {}", "Empty placeholders".bold(), result.stats.empty_count);
    println!(
        "{}: {}",
        "Embedded equations".bold(),
        result.stats.swallowed_equations
    );

    Ok(())
}

fn print_kind_counts(doc: &Document) {
    for kind in ElementKind::ALL {
        let count = doc.count_kind(kind);
        if count > 0 {
            println!("  {} {}: {}", "·".dimmed(), kind, count);
        }
    }
}

fn cmd_version() {
    println!("{} {}", "scanmark".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Layout detection assembly tool");
    println!();
    println!("License: MIT");
}
