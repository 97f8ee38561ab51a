//! Lectio CLI - daily readings, translations and homily
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments, rendering results and handling top-level errors.

use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use lectio::config::Provider;
use lectio::feed::FeedSource;
use lectio::reading::{ReadingSection, SanitizedInput};
use lectio::{Config, DailyReadingService, OutputRecord};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lectio")]
#[command(
    author,
    version,
    about = "Daily Mass readings with translation and homily",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's readings, saint and homily
    Today {
        /// Target language, e.g. English, Spanish, Italian, German
        #[arg(short, long, default_value = "English")]
        language: String,
        /// Calendar date (YYYY-MM-DD) instead of today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Print the record as JSON
        #[arg(long)]
        json: bool,
        /// Use the offline demo generator
        #[arg(long)]
        demo: bool,
    },
    /// Show the sanitized feed without calling the model
    Feed {
        /// Calendar date (YYYY-MM-DD) instead of today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print the prompt that would be sent to the model
    Prompt {
        #[arg(short, long, default_value = "English")]
        language: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Generate shell completions
    Completions {
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Today {
            language,
            date,
            json,
            demo,
        }) => today(&language, date, json, demo).await?,
        Some(Commands::Feed { date }) => {
            let service = service(true)?;
            let date = date.unwrap_or_else(today_date);
            let feed = service.feed().fetch(date).await?;
            let input = SanitizedInput::from_feed(&feed);

            println!("\n=== {} ===\n", input.feast_day.bold());
            print_section(
                "First Reading",
                &input.first_reading.reference,
                &input.first_reading.text,
            );
            print_section("Responsorial Psalm", &input.psalm.reference, &input.psalm.text);
            print_section("Gospel", &input.gospel.reference, &input.gospel.text);
            if let Some(copyright) = &input.copyright {
                println!("{}", copyright.dimmed());
            }
        }
        Some(Commands::Prompt { language, date }) => {
            let service = service(true)?;
            let prompt = service
                .preview_prompt(&language, date.unwrap_or_else(today_date))
                .await?;
            println!("{prompt}");
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "lectio", &mut std::io::stdout());
        }
        None => today("English", None, false, false).await?,
    }

    Ok(())
}

async fn today(
    language: &str,
    date: Option<NaiveDate>,
    json: bool,
    demo: bool,
) -> anyhow::Result<()> {
    let service = service(demo)?;
    let date = date.unwrap_or_else(today_date);

    if !json {
        eprintln!("Preparing readings for {date} in {language}...");
    }
    let record = service.get_daily_reading_on(language, date).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        render(&record);
    }
    Ok(())
}

/// Build the service; `demo` forces the offline generator.
fn service(demo: bool) -> anyhow::Result<DailyReadingService> {
    let mut config = Config::load()?;
    if demo {
        config.generator.provider = Provider::Demo;
    }
    Ok(DailyReadingService::from_config(&config)?)
}

fn today_date() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lectio=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn render(record: &OutputRecord) {
    println!("\n=== {} ===", record.feast.bold());
    println!("{}\n", record.date.dimmed());

    println!("🕯️  {}", record.saint_of_the_day.name.bold());
    println!("  {}\n", record.saint_of_the_day.biography);

    print_reading("First Reading", &record.first_reading);
    print_reading("Responsorial Psalm", &record.responsorial_psalm);
    print_reading("Gospel", &record.gospel);

    println!("📖 {}", "Homily".bold());
    for paragraph in record.homily.lines().filter(|l| !l.trim().is_empty()) {
        println!("  {paragraph}");
    }
    println!();

    if let Some(copyright) = &record.copyright {
        println!("{}", copyright.dimmed());
    }
}

fn print_reading(title: &str, section: &ReadingSection) {
    print_section(title, &section.reference, &section.text);
}

fn print_section(title: &str, reference: &str, text: &str) {
    println!("📜 {} ({})", title.bold(), reference.italic());
    for paragraph in text.lines() {
        println!("  {paragraph}");
    }
    println!();
}
