use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use chorus::{
    fitness_label, select, Container, ContainerConfig, ConversationTurn, CoordinatorOptions,
    StreamObserver, Strategy,
};

mod cli;

use cli::Commands;

#[derive(Parser)]
#[command(name = "chorus")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON provider catalog (defaults to providers detected from *_API_KEY variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Serve every built-in model from offline mocks
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Prints streamed chunks to stdout as they arrive.
#[derive(Default)]
struct StdoutObserver {
    error: Option<String>,
}

impl StreamObserver for StdoutObserver {
    fn on_chunk(&mut self, chunk: &str) {
        print!("{chunk}");
        let _ = std::io::stdout().flush();
    }

    fn on_complete(&mut self) {
        println!();
    }

    fn on_error(&mut self, error: &str) {
        self.error = Some(error.to_string());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let container = Container::new(ContainerConfig {
        config_path: cli.config.clone(),
        mock_providers: cli.mock,
    })?;

    match cli.command {
        Commands::Ask {
            prompt,
            strategy,
            models,
            timeout,
            stream,
            model,
            system,
        } => {
            let mut history = Vec::new();
            if let Some(system) = system {
                history.push(ConversationTurn::system(system));
            }
            history.push(ConversationTurn::user(prompt));

            let use_case = container.coordinate_use_case();

            if stream {
                let mut observer = StdoutObserver::default();
                match model.as_deref() {
                    Some(model_id) => use_case.stream_with(&history, model_id, &mut observer).await,
                    None => use_case.coordinate_streaming(&history, &mut observer).await,
                }
                if let Some(error) = observer.error {
                    bail!("stream failed: {error}");
                }
                return Ok(());
            }

            if let Some(model_id) = model {
                let answer = use_case.respond_with(&history, &model_id).await?;
                println!("{answer}");
                return Ok(());
            }

            let options = apply_overrides(container.options().clone(), strategy, models, timeout)?;

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.set_message(format!(
                "Asking {} models ({})...",
                options.min_models(),
                options.strategy()
            ));
            spinner.enable_steady_tick(Duration::from_millis(100));

            let answer = use_case.coordinate(&history, &options).await;
            spinner.finish_and_clear();

            println!("{answer}");
        }

        Commands::Classify { text, models } => {
            let history = vec![ConversationTurn::user(text)];
            let (category, selected) = container.coordinate_use_case().plan(&history, models);

            println!("Category: {category}");
            if selected.is_empty() {
                println!("No models registered.");
            } else {
                println!("Selected models:");
                for (i, descriptor) in selected.iter().enumerate() {
                    println!(
                        "  {}. {} [{}] {} ({})",
                        i + 1,
                        descriptor.id(),
                        descriptor.category(),
                        descriptor.strength(),
                        fitness_label(descriptor, category)
                    );
                }
            }
        }

        Commands::Models { category } => {
            let registry = container.registry();
            let listed = match category {
                Some(category) => select(category, registry.len(), registry.descriptors()),
                None => registry.descriptors().to_vec(),
            };

            if listed.is_empty() {
                println!("No models registered.");
            } else {
                println!("Registered models:\n");
                for descriptor in listed {
                    println!("  {} ({})", descriptor.id(), descriptor.adapter().name());
                    println!("    Category: {}", descriptor.category());
                    println!("    Strength: {}", descriptor.strength());
                    if let Some(category) = category {
                        println!("    Fit:      {}", fitness_label(&descriptor, category));
                    }
                    println!();
                }
            }
        }
    }

    Ok(())
}

fn apply_overrides(
    mut options: CoordinatorOptions,
    strategy: Option<Strategy>,
    models: Option<usize>,
    timeout: Option<f64>,
) -> Result<CoordinatorOptions> {
    if let Some(strategy) = strategy {
        options = options.with_strategy(strategy);
    }
    if let Some(models) = models {
        options = options.with_min_models(models);
    }
    if let Some(secs) = timeout {
        if !secs.is_finite() || secs <= 0.0 {
            bail!("--timeout must be a positive number of seconds");
        }
        options = options.with_timeout(Duration::from_secs_f64(secs));
    }
    Ok(options)
}
