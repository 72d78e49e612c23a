use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Override the base directory holding config.yaml and the model cache
    #[clap(long)]
    pub base_path: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the search API as a service.
    Daemon {},

    /// Search the archive
    Search {
        /// Search query text
        query: String,

        /// Maximum number of results
        #[clap(short = 'k', long)]
        top_k: Option<usize>,

        /// Exact collection year
        #[clap(long)]
        year: Option<i64>,

        /// Inclusive lower bound on collection year (requires --year-to)
        #[clap(long)]
        year_from: Option<i64>,

        /// Inclusive upper bound on collection year (requires --year-from)
        #[clap(long)]
        year_to: Option<i64>,

        /// Designer name
        #[clap(short, long)]
        designer: Option<String>,

        /// Collection category (e.g. "Ready-to-Wear", "Couture")
        #[clap(short, long)]
        category: Option<String>,

        /// Season (e.g. "Spring", "Fall")
        #[clap(short, long)]
        season: Option<String>,

        /// Show city (e.g. "Paris", "Milan", "New York")
        #[clap(long)]
        city: Option<String>,

        /// Minimum aesthetic score
        #[clap(long)]
        min_aesthetic: Option<f64>,

        /// Gender preference: womens, mens or both
        #[clap(short, long)]
        gender: Option<String>,
    },

    /// Query index statistics
    Stats {},
}
