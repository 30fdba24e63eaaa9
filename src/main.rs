// papertrail: Generate subscription invoices as printable PDFs

mod config;
mod dates;
mod error;
mod layout;
mod logo;
mod metrics;
mod model;
mod money;
mod plan;
mod render;
mod validate;

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::dates::format_display_date;
use crate::error::AppError;
use crate::layout::compose;
use crate::logo::load_logo;
use crate::model::{InvoiceInput, LogoAttachment};
use crate::money::format_inr;
use crate::plan::PlanKey;
use crate::render::render;
use crate::validate::validate;

// ============================================================================
// Data Structures
// ============================================================================

/// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Generate subscription invoices as printable PDFs")]
struct Args {
    /// Business name (defaults to the config profile)
    #[arg(short, long)]
    business_name: Option<String>,

    /// Contact person (defaults to the config profile)
    #[arg(short, long)]
    contact_person: Option<String>,

    /// Business phone number, at least 10 digits (defaults to the config profile)
    #[arg(short, long = "phone")]
    phone_number: Option<String>,

    /// Invoice number, e.g. "#84-SUP-2025"
    #[arg(short, long)]
    invoice_number: String,

    /// Customer name
    #[arg(long)]
    customer_name: String,

    /// Customer phone
    #[arg(long)]
    customer_phone: String,

    /// Plan length in months: 1, 3, 6 or 12
    #[arg(long, default_value = "3")]
    plan: PlanKey,

    /// Invoice date (YYYY-MM-DD format, defaults to today)
    #[arg(short, long)]
    date: Option<String>,

    /// Logo image (file path or URL, under 2MB) shown top-right
    #[arg(long)]
    logo: Option<String>,

    /// Output filename (defaults to {business}_Invoice_{number}.pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Business profile (TOML, defaults to ./papertrail.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the composed page as JSON instead of writing a PDF
    #[arg(long)]
    emit_layout: bool,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    // Parse date
    let issue_date = parse_date(&args.date)?;

    let input = InvoiceInput {
        business_name: require(args.business_name, &config.business.name, "business name")?,
        contact_person: require(args.contact_person, &config.business.contact_person, "contact person")?,
        phone_number: require(args.phone_number, &config.business.phone_number, "phone number")?,
        invoice_number: args.invoice_number,
        customer_name: args.customer_name,
        customer_phone: args.customer_phone,
        plan: args.plan,
        issue_date,
        logo: None,
    };

    validate(&input)?;

    // Only fetch the logo once the form is valid; an oversize file is dropped with a warning
    let logo = attach_logo(args.logo.as_deref().or(config.business.logo.as_deref()))?;
    let input = InvoiceInput { logo, ..input };

    let document = compose(&input, Local::now().date_naive())?;
    debug!(stem = %document.file_stem, logo = document.has_logo(), "invoice composed");

    if args.emit_layout {
        serde_json::to_writer_pretty(std::io::stdout().lock(), &document)?;
        println!();
        return Ok(());
    }

    let bytes = render(&document, &config.font_choice())?;

    // Determine output filename
    let output_file = match args.output {
        Some(path) => path,
        None => {
            std::fs::create_dir_all(&config.output.dir)?;
            config.output.dir.join(format!("{}.pdf", document.file_stem))
        }
    };
    std::fs::write(&output_file, &bytes)?;
    debug!(path = %output_file.display(), size = bytes.len(), "wrote invoice");

    println!("✓ Generated: {}", output_file.display());
    println!("  Invoice: {}", input.invoice_number);
    println!("  Plan: {} ({})", document.plan.label, format_inr(document.plan.price));
    println!(
        "  Period: {} to {}",
        format_display_date(&document.start_date),
        format_display_date(&document.end_date)
    );

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parse_date(date_str: &Option<String>) -> Result<NaiveDate, AppError> {
    match date_str {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| AppError::DateError(s.clone())),
        None => Ok(Local::now().date_naive()),
    }
}

fn attach_logo(source: Option<&str>) -> Result<Option<LogoAttachment>, AppError> {
    match source {
        Some(s) => match load_logo(s) {
            Ok(logo) => Ok(Some(logo)),
            Err(e @ AppError::AttachmentTooLarge { .. }) => {
                debug!(source = s, "logo rejected");
                eprintln!("Warning: {} Continuing without a logo.", e);
                Ok(None)
            }
            Err(e) => Err(e),
        },
        None => Ok(None),
    }
}

/// Command-line value first, then the profile.
fn require(
    cli: Option<String>,
    profile: &Option<String>,
    name: &'static str,
) -> Result<String, AppError> {
    cli.or_else(|| profile.clone())
        .ok_or(AppError::MissingField(name))
}
