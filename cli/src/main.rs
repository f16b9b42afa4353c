//! bicp CLI - press communiqué rendering tool

use std::collections::HashSet;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use bicp_render::assets::list_logos;
use bicp_render::tenant::{structures_for, COUNTIES};
use bicp_render::{
    AccreditationRecord, Bicp, BulkItem, ContentRecord, JsonFormat, OutputFormat, PressReview,
    RenderOptions, RenderOutput, RenderSettings, Tenant, Variant,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "bicp")]
#[command(author = "bicp contributors")]
#[command(version)]
#[command(about = "Render press communiqués to PDF and DOCX", long_about = None)]
struct Cli {
    #[command(flatten)]
    env: EnvArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Where assets and templates live.
#[derive(Args)]
struct EnvArgs {
    /// Directory holding logos (`sigle/`) and fonts (`fonts/`)
    #[arg(long, global = true, env = "BICP_ASSET_DIR", value_name = "DIR")]
    asset_dir: Option<PathBuf>,

    /// Base URL relative asset references resolve against
    #[arg(long, global = true, env = "BICP_ASSET_BASE_URL", value_name = "URL")]
    asset_base_url: Option<String>,

    /// Directory of fillable PDF templates
    #[arg(long, global = true, env = "BICP_TEMPLATE_DIR", value_name = "DIR")]
    template_dir: Option<PathBuf>,

    /// Do not draw the tricolor bar above the footer
    #[arg(long, global = true)]
    no_accent_bar: bool,
}

/// A record and the settings it is rendered with.
#[derive(Args)]
struct RecordArgs {
    /// Record JSON file
    #[arg(value_name = "RECORD")]
    record: PathBuf,

    /// Tenant settings JSON file (defaults when omitted)
    #[arg(short, long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Render the public variant
    #[arg(long)]
    public: bool,

    /// Output file (suggested name in the current directory if not specified)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

/// A press office document and the settings it is rendered with.
#[derive(Args)]
struct PressArgs {
    /// Document JSON file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Tenant settings JSON file (defaults when omitted)
    #[arg(short, long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Output file (suggested name in the current directory if not specified)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a record as PDF
    Pdf(RecordArgs),

    /// Render a record as DOCX
    Docx(RecordArgs),

    /// Render many records: one combined PDF or a ZIP of DOCX files
    Bulk {
        /// JSON array of bulk items
        #[arg(value_name = "ITEMS")]
        items: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "pdf")]
        format: BulkFormat,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Render a journalist accreditation as PDF
    Accreditation(PressArgs),

    /// Render a press review as PDF
    Review(PressArgs),

    /// Dump the document model of a record as JSON
    Inspect {
        #[command(flatten)]
        args: RecordArgs,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Fill a template with sample values
    Preview {
        /// Template key, e.g. "bicp.pdf"
        #[arg(value_name = "KEY")]
        key: String,

        /// Tenant settings JSON file
        #[arg(short, long, value_name = "FILE")]
        settings: Option<PathBuf>,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List available templates
    Templates,

    /// List available logos
    Logos,

    /// List counties and their structures
    Tenants {
        /// Only show this county code
        #[arg(value_name = "COUNTY")]
        county: Option<String>,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum BulkFormat {
    /// One PDF, a new page per document
    Pdf,
    /// A ZIP archive of DOCX files
    Docx,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let env = &cli.env;

    let result = match &cli.command {
        Commands::Pdf(args) => cmd_render(env, args, OutputFormat::Pdf),
        Commands::Docx(args) => cmd_render(env, args, OutputFormat::Docx),
        Commands::Bulk {
            items,
            format,
            output,
        } => cmd_bulk(env, items, *format, output.as_deref()),
        Commands::Accreditation(args) => cmd_accreditation(env, args),
        Commands::Review(args) => cmd_review(env, args),
        Commands::Inspect { args, compact } => cmd_inspect(env, args, *compact),
        Commands::Preview {
            key,
            settings,
            output,
        } => cmd_preview(env, key, settings.as_deref(), output.as_deref()),
        Commands::Templates => cmd_templates(env),
        Commands::Logos => cmd_logos(env),
        Commands::Tenants { county } => {
            cmd_tenants(county.as_deref());
            Ok(())
        }
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn pipeline(env: &EnvArgs) -> Bicp {
    let mut options = RenderOptions::new().with_accent_bar(!env.no_accent_bar);
    if let Some(dir) = &env.asset_dir {
        options = options.with_asset_dir(dir);
    }
    if let Some(url) = &env.asset_base_url {
        options = options.with_asset_base_url(url);
    }

    debug!(
        "Assets: dir {:?}, base URL {:?}; templates: {:?}",
        env.asset_dir, env.asset_base_url, env.template_dir
    );
    let mut bicp = Bicp::new().with_options(options);
    if let Some(dir) = &env.template_dir {
        bicp = bicp.with_template_dir(dir);
    }
    bicp
}

fn read_record(path: &Path) -> Result<ContentRecord, Box<dyn std::error::Error>> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|e| format!("Invalid record {}: {}", path.display(), e).into())
}

fn read_settings(path: Option<&Path>) -> Result<RenderSettings, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let data = fs::read_to_string(path)?;
            serde_json::from_str(&data)
                .map_err(|e| format!("Invalid settings {}: {}", path.display(), e).into())
        }
        None => Ok(RenderSettings::default()),
    }
}

fn load(args: &RecordArgs) -> Result<(ContentRecord, RenderSettings), Box<dyn std::error::Error>> {
    let record = read_record(&args.record)?;
    let mut settings = read_settings(args.settings.as_deref())?;
    if args.public {
        settings.variant = Variant::Public;
    }
    Ok((record, settings))
}

fn save(output: &RenderOutput, path: Option<&Path>) -> CliResult {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(
            output
                .filename
                .clone()
                .unwrap_or_else(|| format!("document.{}", output.extension())),
        ),
    };
    fs::write(&path, &output.bytes)?;
    println!("{} {}", "Saved to".green(), path.display());
    Ok(())
}

fn cmd_render(env: &EnvArgs, args: &RecordArgs, format: OutputFormat) -> CliResult {
    let (record, settings) = load(args)?;
    let output = pipeline(env).render(&record, &settings, format)?;

    if let Some(template) = &output.stats.template {
        println!("{}: {}", "Template".bold(), template);
    }
    println!(
        "{}: {}, {}: {}",
        "Pages".bold(),
        output.stats.pages,
        "Paragraphs".bold(),
        output.stats.paragraphs
    );
    save(&output, args.output.as_deref())
}

fn cmd_accreditation(env: &EnvArgs, args: &PressArgs) -> CliResult {
    let data = fs::read_to_string(&args.input)?;
    let record: AccreditationRecord = serde_json::from_str(&data)
        .map_err(|e| format!("Invalid accreditation {}: {}", args.input.display(), e))?;
    let settings = read_settings(args.settings.as_deref())?;
    let output = pipeline(env).render_accreditation(&record, &settings)?;
    save(&output, args.output.as_deref())
}

fn cmd_review(env: &EnvArgs, args: &PressArgs) -> CliResult {
    let data = fs::read_to_string(&args.input)?;
    let review: PressReview = serde_json::from_str(&data)
        .map_err(|e| format!("Invalid press review {}: {}", args.input.display(), e))?;
    let settings = read_settings(args.settings.as_deref())?;
    let output = pipeline(env).render_press_review(&review, &settings)?;
    println!("{}: {}, {}: {}", "Pages".bold(), output.stats.pages, "Items".bold(), review.items.len());
    save(&output, args.output.as_deref())
}

fn cmd_inspect(env: &EnvArgs, args: &RecordArgs, compact: bool) -> CliResult {
    let (record, settings) = load(args)?;
    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = pipeline(env).inspect(&record, &settings, format)?;

    if let Some(path) = &args.output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }
    Ok(())
}

/// Make `name` unique among `used` by numbering repeats before the extension.
fn unique_name(name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{}", ext)),
        None => (name, String::new()),
    };
    let mut n = 2;
    loop {
        let candidate = format!("{}-{}{}", stem, n, ext);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

fn cmd_bulk(env: &EnvArgs, items_path: &Path, format: BulkFormat, output: Option<&Path>) -> CliResult {
    let data = fs::read_to_string(items_path)?;
    let items: Vec<BulkItem> = serde_json::from_str(&data)
        .map_err(|e| format!("Invalid bulk items {}: {}", items_path.display(), e))?;
    let bicp = pipeline(env);

    match format {
        BulkFormat::Pdf => {
            let bulk = bicp.render_bulk_pdf(&items)?;
            for skipped in &bulk.skipped {
                println!("{} item {}: {}", "Skipped".yellow(), skipped.index, skipped.reason);
            }
            println!(
                "{}: {}, {}: {}",
                "Documents".bold(),
                bulk.output.stats.documents,
                "Pages".bold(),
                bulk.output.stats.pages
            );
            save(&bulk.output, output)
        }
        BulkFormat::Docx => {
            let pb = ProgressBar::new(items.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                    .progress_chars("#>-"),
            );

            let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
            let opt = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            let mut used = HashSet::new();
            let mut skipped = 0;

            for (index, item) in items.iter().enumerate() {
                pb.set_message(item.record.document_number.clone());
                match bicp.render_docx(&item.record, &item.effective_settings()) {
                    Ok(doc) => {
                        let name = doc
                            .filename
                            .clone()
                            .unwrap_or_else(|| format!("document-{}.docx", index + 1));
                        zip.start_file(unique_name(&name, &mut used), opt)?;
                        zip.write_all(&doc.bytes)?;
                    }
                    Err(e) => {
                        pb.println(format!("{} item {}: {}", "Skipped".yellow(), index, e));
                        skipped += 1;
                    }
                }
                pb.inc(1);
            }
            pb.finish_with_message("Done!");

            let bytes = zip.finish()?.into_inner();
            let path = output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("BICP_bulk.zip"));
            fs::write(&path, bytes)?;
            println!(
                "{} {} ({} documents, {} skipped)",
                "Saved to".green(),
                path.display(),
                used.len(),
                skipped
            );
            Ok(())
        }
    }
}

fn cmd_preview(env: &EnvArgs, key: &str, settings: Option<&Path>, output: Option<&Path>) -> CliResult {
    let settings = read_settings(settings)?;
    let bytes = pipeline(env).preview_template(key, &settings)?;
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(format!("preview-{}", key)));
    fs::write(&path, bytes)?;
    println!("{} {}", "Saved to".green(), path.display());
    Ok(())
}

fn cmd_templates(env: &EnvArgs) -> CliResult {
    if env.template_dir.is_none() {
        return Err("No template directory (set --template-dir or BICP_TEMPLATE_DIR)".into());
    }
    let keys = pipeline(env).list_templates()?;
    println!("{}", "Templates".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for key in &keys {
        println!("  {}", key);
    }
    println!("\n{} templates", keys.len());
    Ok(())
}

fn cmd_logos(env: &EnvArgs) -> CliResult {
    let dir = env
        .asset_dir
        .as_ref()
        .ok_or("No asset directory (set --asset-dir or BICP_ASSET_DIR)")?
        .join("sigle");
    let logos = list_logos(&dir)?;
    println!("{}", "Logos".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for logo in &logos {
        println!("  {}", logo);
    }
    println!("\n{} logos", logos.len());
    Ok(())
}

fn cmd_tenants(filter: Option<&str>) {
    for county in COUNTIES {
        if let Some(code) = filter {
            if !county.code.eq_ignore_ascii_case(code.trim()) {
                continue;
            }
        }
        let structures: Vec<String> = structures_for(county.code)
            .into_iter()
            .filter_map(|s| Tenant::new(county.code, s).structure_display())
            .collect();
        println!(
            "{} {}: {}",
            county.code.bold(),
            county.name,
            structures.join(", ").dimmed()
        );
    }
}

fn cmd_version() {
    println!("{} {}", "bicp".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Press communiqué rendering tool");
    println!();
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_name() {
        let mut used = HashSet::new();
        assert_eq!(unique_name("a.docx", &mut used), "a.docx");
        assert_eq!(unique_name("a.docx", &mut used), "a-2.docx");
        assert_eq!(unique_name("a.docx", &mut used), "a-3.docx");
        assert_eq!(unique_name("b", &mut used), "b");
        assert_eq!(unique_name("b", &mut used), "b-2");
    }

    #[test]
    fn test_read_settings_defaults() {
        assert_eq!(read_settings(None).unwrap(), RenderSettings::default());
    }

    #[test]
    fn test_read_record_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        fs::write(&path, r#"{"documentNumber":"7","title":"Test","bodyPlainText":"x"}"#).unwrap();
        let record = read_record(&path).unwrap();
        assert_eq!(record.document_number, "7");
        assert_eq!(record.body_plain_text, "x");
    }

    #[test]
    fn test_parse_press_commands() {
        let cli = Cli::try_parse_from(["bicp", "review", "review.json", "-o", "out.pdf"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Review(ref args) if args.output.as_deref() == Some(Path::new("out.pdf"))
        ));

        let cli = Cli::try_parse_from(["bicp", "accreditation", "a.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Accreditation(ref args) if args.settings.is_none()));
    }
}
