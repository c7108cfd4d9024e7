use clap::{Parser, Subcommand};
use laec_scraper::storage::{EventStorage, JsonFileStorage};
use laec_scraper::{constants, extractors, fetcher, logging, pipeline};
use tracing::warn;

#[derive(Parser)]
#[command(name = "laec_scraper")]
#[command(about = "LA Events Calendar film screening scraper")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every venue and write the aggregated events file
    Run {
        /// Specific venues to scrape (comma-separated). Available: vista, new_beverly, vidiots, academy_museum, american_cinematheque
        #[arg(long)]
        venues: Option<String>,
        /// Output file for the aggregated event list
        #[arg(long, default_value = "events.json")]
        output: String,
    },
    /// List the supported venue keys
    ListVenues,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { venues, output } => {
            let venue_keys: Vec<String> = match venues {
                Some(list) => list.split(',').map(|s| s.trim().to_string()).collect(),
                None => constants::supported_venues()
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            };

            let mut venue_extractors = Vec::new();
            for key in &venue_keys {
                match extractors::create_extractor(key) {
                    Some(extractor) => venue_extractors.push(extractor),
                    None => {
                        warn!("Unknown venue specified");
                        println!("⚠️  Unknown venue: {}", key);
                    }
                }
            }

            let aggregator = pipeline::Aggregator::new(venue_extractors);
            let source = fetcher::HttpPageSource::new();

            println!("🔄 Scraping {} venues...", aggregator.venue_count());
            let result = pipeline::run(&aggregator, &source).await;

            println!("\n📊 Pipeline results:");
            println!("   Total extracted: {}", result.total_extracted);
            println!("   Duplicates removed: {}", result.duplicates_removed);
            println!("   Past events filtered: {}", result.past_filtered);
            println!("   Upcoming events: {}", result.events.len());

            let storage = JsonFileStorage::new(&output);
            storage.save_events(&result.events).await?;
            println!("✅ Events saved to {}", output);
        }
        Commands::ListVenues => {
            for key in constants::supported_venues() {
                println!("{}", key);
            }
        }
    }
    Ok(())
}
