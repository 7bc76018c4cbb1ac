mod collate;
mod config;
mod export;
mod filter;
mod normalize;
mod record;
mod sort;
mod store;
mod ui;
mod vcard;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use time::OffsetDateTime;

use config::Config;
use filter::{FilterCriteria, Selection};
use record::ContactRecord;
use sort::{SortDirection, SortKey};
use store::RecordStore;
use ui::app::{App, LOAD_ERROR_TEXT};

#[derive(Parser, Debug)]
#[command(name = "dafkesher")]
struct Cli {
    /// Configuration file path (defaults to the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data file path (overrides the configured `data_path`)
    #[arg(long)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search the directory and print matches (tab-separated)
    Query(QueryArgs),
    /// Export a pluga/misgeret selection as a single vCard file
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Search term (matches name, role, pluga, misgeret, phone)
    query: String,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Pluga (group) to export
    #[arg(long)]
    group: String,

    /// Misgeret (subgroup) to export
    #[arg(long)]
    subgroup: String,

    /// Additional free-text filter applied before export
    #[arg(long)]
    query: Option<String>,

    /// Output directory (overrides the configured `export_dir`)
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = config::load(cli.config.as_deref())?;
    if let Some(data) = cli.data {
        config.data_path = data;
    }

    match cli.command {
        Some(Command::Query(args)) => handle_query(args, &config),
        Some(Command::Export(args)) => handle_export(args, &config),
        None => run_viewer(config),
    }
}

fn run_viewer(config: Config) -> Result<()> {
    if let Some(path) = &config.config_path {
        println!("Loaded configuration from {}", path.display());
    }

    // A failed load still starts the viewer; it renders the error panel
    // instead of a grid.
    let load = RecordStore::load(&config.data_path);
    if let Ok(store) = &load {
        if store.is_empty() {
            eprintln!(
                "warning: {} contains no records",
                config.data_path.display()
            );
        }
    }

    let mut app = App::new(config, load);
    app.run()
}

fn load_store(config: &Config) -> Result<RecordStore> {
    RecordStore::load(&config.data_path)
        .with_context(|| format!("{}: {}", LOAD_ERROR_TEXT, config.data_path.display()))
}

fn handle_query(args: QueryArgs, config: &Config) -> Result<()> {
    let store = load_store(config)?;
    let criteria = FilterCriteria {
        query: args.query.clone(),
        ..Default::default()
    };
    let view = filter::filter(store.records(), &criteria, config.search_includes_phone_links);

    if view.is_empty() {
        println!("No matches for \"{}\"", args.query);
    } else {
        println!(
            "Found {} contact(s) matching \"{}\"",
            view.len(),
            args.query
        );
    }

    // name<TAB>role<TAB>pluga/misgeret<TAB>phone
    for index in view {
        let record = &store.records()[index];
        println!(
            "{} {}\t{}\t{}/{}\t{}",
            record.first_name,
            record.last_name,
            record.role,
            record.group,
            record.subgroup,
            record.mobile_display
        );
    }

    Ok(())
}

fn handle_export(args: ExportArgs, config: &Config) -> Result<()> {
    let store = load_store(config)?;
    let criteria = FilterCriteria {
        group: Selection::only(&args.group),
        subgroup: Selection::only(&args.subgroup),
        query: args.query.unwrap_or_default(),
    };
    let mut view = filter::filter(store.records(), &criteria, config.search_includes_phone_links);
    sort::sort(
        store.records(),
        &mut view,
        SortKey::LastName,
        SortDirection::Ascending,
    );

    // Same enablement rule as the interactive export: a concrete pluga and
    // misgeret that actually matched something.
    if !filter::export_enabled(&criteria, view.len()) {
        bail!(
            "no records match pluga \"{}\" and misgeret \"{}\"",
            args.group,
            args.subgroup
        );
    }

    let records: Vec<&ContactRecord> = view.iter().map(|&index| &store.records()[index]).collect();
    let content = vcard::to_vcard_batch(records.iter().copied());
    let stem = export::batch_stem(
        &args.group,
        &args.subgroup,
        OffsetDateTime::now_utc().date(),
    );
    let dir = args.out.unwrap_or_else(|| config.export_dir.clone());
    let path = export::save_vcard(&dir, &format!("{stem}.vcf"), &content)?;

    println!("Exported {} contact(s) to {}", records.len(), path.display());
    Ok(())
}
