use clap::Subcommand;

use chorus::{Category, Strategy};

#[derive(Subcommand)]
pub enum Commands {
    /// Ask the configured models and print the coordinated answer
    Ask {
        prompt: String,

        /// Reduction strategy: best, consensus, parallel, sequential
        #[arg(short, long, conflicts_with_all = ["stream", "model"])]
        strategy: Option<Strategy>,

        /// Number of models to query
        #[arg(short = 'n', long, conflicts_with_all = ["stream", "model"])]
        models: Option<usize>,

        /// Per-provider timeout in seconds
        #[arg(short, long, conflicts_with_all = ["stream", "model"])]
        timeout: Option<f64>,

        /// Stream the top-ranked model's answer as it arrives
        #[arg(long)]
        stream: bool,

        /// Ask one specific model instead of coordinating
        #[arg(short, long)]
        model: Option<String>,

        /// System prompt prepended to the conversation
        #[arg(long)]
        system: Option<String>,
    },

    /// Show the category a prompt classifies as and the models that would answer it
    Classify {
        text: String,

        #[arg(short = 'n', long, default_value = "3")]
        models: usize,
    },

    /// List registered models
    Models {
        #[arg(short, long)]
        category: Option<Category>,
    },
}
