//! EduHub CLI - online-learning database on markdown and git

use clap::{Parser, Subcommand};
use eduhub::features::{archive, geo, search};
use eduhub::reports::{self, Report, DEFAULT_RECOMMENDATIONS};
use eduhub::schema::catalog::ENTITY_COLLECTIONS;
use eduhub::{export, seed, views, Database};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eduhub")]
#[command(about = "Schema, repositories and analytics for an online-learning database", long_about = None)]
struct Cli {
    /// Database directory (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    database: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new EduHub database
    Init,

    /// Install the collection validators (drops existing data)
    Setup,

    /// Reset the collections and load the sample dataset
    Seed,

    /// Run a report, or list reports when no name is given
    Report {
        name: Option<String>,

        /// Also write the report as HTML and JSON under the views directory
        #[arg(long)]
        render: bool,
    },

    /// Render every report to the views directory
    Render,

    /// Render a course outline with its lessons
    Outline { course_id: String },

    /// Ranked search over course titles and descriptions
    Search {
        #[arg(required = true)]
        terms: Vec<String>,
    },

    /// Published courses near a point
    #[command(allow_negative_numbers = true)]
    Near {
        longitude: f64,
        latitude: f64,

        /// Search radius in kilometres
        #[arg(long, default_value_t = 50.0)]
        km: f64,
    },

    /// Courses taken by students of a course
    Recommend {
        /// Part of the target course title
        title: String,

        #[arg(long, default_value_t = DEFAULT_RECOMMENDATIONS)]
        limit: usize,
    },

    /// Move enrollments older than N days to the archive
    Archive {
        #[arg(long)]
        days: i64,
    },

    /// Dump all collections to a JSON file
    Export { file: PathBuf },

    /// Upsert documents from a JSON dump
    Import { file: PathBuf },

    /// Show database status
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => init_database(&cli.database).await,
        Commands::Setup => setup(&cli.database).await,
        Commands::Seed => seed_database(&cli.database).await,
        Commands::Report { name, render } => run_report(&cli.database, name.as_deref(), render).await,
        Commands::Render => render_views(&cli.database).await,
        Commands::Outline { course_id } => render_outline(&cli.database, &course_id).await,
        Commands::Search { terms } => search_courses(&cli.database, &terms.join(" ")).await,
        Commands::Near { longitude, latitude, km } => near(&cli.database, longitude, latitude, km).await,
        Commands::Recommend { title, limit } => recommend(&cli.database, &title, limit).await,
        Commands::Archive { days } => archive_enrollments(&cli.database, days).await,
        Commands::Export { file } => export_database(&cli.database, &file).await,
        Commands::Import { file } => import_database(&cli.database, &file).await,
        Commands::Status => show_status(&cli.database).await,
    };

    if let Err(e) = &result {
        tracing::error!("{}", e);
        if let Some(hint) = e.downcast_ref::<eduhub::Error>().and_then(|e| e.suggestion()) {
            eprintln!("Hint: {}", hint);
        }
    }
    result
}

fn print_rows<T: serde::Serialize>(rows: &[T]) -> anyhow::Result<()> {
    if rows.is_empty() {
        println!("(0 rows)");
        return Ok(());
    }
    for row in rows {
        println!("{}", serde_json::to_string(row)?);
    }
    println!("({} row(s))", rows.len());
    Ok(())
}

async fn init_database(path: &Path) -> anyhow::Result<()> {
    println!("Initializing EduHub database at {:?}...", path);

    let db = Database::open(path).await?;

    tokio::fs::create_dir_all(path.join("collections")).await?;
    tokio::fs::create_dir_all(path.join(&db.config.views_dir)).await?;
    tokio::fs::create_dir_all(path.join(".eduhub/schemas")).await?;
    tokio::fs::create_dir_all(path.join(".eduhub/templates")).await?;
    db.config.save(path)?;

    println!("Database initialized successfully!");
    println!();
    println!("Directory structure:");
    println!("  collections/        - Entity collections");
    println!("  {}/              - Rendered reports and outlines", db.config.views_dir);
    println!("  .eduhub/schemas/    - Collection validators");
    println!("  .eduhub/templates/  - HTML template overrides");
    println!();
    println!("Get started:");
    println!("  eduhub setup");
    println!("  eduhub seed");
    println!("  eduhub report enrollments-per-course");

    Ok(())
}

async fn setup(path: &Path) -> anyhow::Result<()> {
    let mut db = Database::open(path).await?;
    db.apply_validators().await?;
    println!("Applied validators to {} collections.", db.schemas().count());
    Ok(())
}

async fn seed_database(path: &Path) -> anyhow::Result<()> {
    let mut db = Database::open(path).await?;
    db.apply_validators().await?;
    let summary = seed::seed(&db).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn run_report(path: &Path, name: Option<&str>, render: bool) -> anyhow::Result<()> {
    let Some(name) = name else {
        println!("Reports:");
        for report in Report::ALL {
            println!("  {:<30} {}", report.name(), report.title());
        }
        println!("  {:<30} {}", "(eduhub recommend)", "Course recommendations");
        return Ok(());
    };

    let report: Report = name.parse()?;
    let db = Database::open(path).await?;

    if render {
        let view = views::render_report(&db, report).await?;
        println!("Wrote {} rows to {:?}", view.rows, view.html);
    } else {
        print_rows(&report.run(&db).await?)?;
    }
    Ok(())
}

async fn render_views(path: &Path) -> anyhow::Result<()> {
    let db = Database::open(path).await?;
    println!("Rendering report views...");
    let rendered = views::render_all_reports(&db).await?;
    println!("Rendered {} of {} reports.", rendered.len(), Report::ALL.len());
    Ok(())
}

async fn render_outline(path: &Path, course_id: &str) -> anyhow::Result<()> {
    let db = Database::open(path).await?;
    let view = views::render_course_outline(&db, course_id).await?;
    println!("Wrote outline of '{}' ({} lessons) to {:?}", view.name, view.rows, view.html);
    Ok(())
}

async fn search_courses(path: &Path, query: &str) -> anyhow::Result<()> {
    let db = Database::open(path).await?;
    print_rows(&search::search_courses(&db, query).await?)
}

async fn near(path: &Path, longitude: f64, latitude: f64, km: f64) -> anyhow::Result<()> {
    let db = Database::open(path).await?;
    print_rows(&geo::courses_near(&db, longitude, latitude, km).await?)
}

async fn recommend(path: &Path, title: &str, limit: usize) -> anyhow::Result<()> {
    let db = Database::open(path).await?;
    print_rows(&reports::recommendations(&db, title, limit).await?)
}

async fn archive_enrollments(path: &Path, days: i64) -> anyhow::Result<()> {
    let db = Database::open(path).await?;
    let report = archive::archive_older_than_days(&db, days).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn export_database(path: &Path, file: &Path) -> anyhow::Result<()> {
    let db = Database::open(path).await?;
    let counts = export::export_to_file(&db, file).await?;
    for (collection, count) in &counts {
        println!("  {}: {} documents", collection, count);
    }
    Ok(())
}

async fn import_database(path: &Path, file: &Path) -> anyhow::Result<()> {
    let db = Database::open(path).await?;
    let counts = export::import_from_file(&db, file).await?;
    for (collection, count) in &counts {
        println!("  {}: {} documents", collection, count);
    }
    Ok(())
}

async fn show_status(path: &Path) -> anyhow::Result<()> {
    let db = Database::open(path).await?;

    println!("EduHub Database Status");
    println!("======================");
    println!("Path: {:?}", db.root);
    println!("Commits: {}", db.git.commit_count()?);
    println!();

    println!("Collections:");
    let archive = db.config.archive_collection.clone();
    for name in ENTITY_COLLECTIONS.iter().copied().chain(std::iter::once(archive.as_str())) {
        let collection = db.collection(name)?;
        if !collection.exists().await {
            println!("  {:<24} (missing, run `eduhub setup`)", name);
            continue;
        }
        let validated = if db.schema(name).is_some() { "" } else { " (no validator)" };
        println!("  {:<24} {} documents{}", name, collection.count().await?, validated);
    }

    // Git status
    if db.git.has_changes()? {
        println!("\nUncommitted changes detected.");
    } else {
        println!("\nNo uncommitted changes.");
    }

    Ok(())
}
