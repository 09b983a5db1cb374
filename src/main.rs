mod format;
mod index;
mod publish;
mod site;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "blog_publisher", about = "Format markdown articles and publish them to the blog index")]
struct Cli {
    /// Project root holding index.html, assets/ and markdown_format/
    #[arg(long, global = true, env = "BLOG_ROOT", default_value = ".")]
    root: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Format an incoming article, publish it, add it to the index and archive the original
    Publish {
        /// Markdown file name inside the incoming articles directory
        filename: String,
        /// Card image path (default: assets/images/articles/<name>.jpg)
        #[arg(long)]
        image: Option<String>,
    },
    /// Add an already formatted post to the index
    Add {
        /// Path of the post, relative to the project root
        markdown_file: String,
        /// Card image path (default: the site's default blog image)
        #[arg(long)]
        image: Option<String>,
    },
    /// Format a markdown file without publishing it
    Format {
        input: PathBuf,
        /// Write here instead of formatting in place
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let today = chrono::Local::now().date_naive();

    let result = match cli.command {
        Commands::Publish { filename, image } => {
            let site = site::Site::load(&cli.root)?;
            let published = publish::publish(&site, &filename, image.as_deref(), today)
                .with_context(|| format!("Error processing markdown file {}", filename))?;
            println!(
                "Successfully processed and moved markdown file to: {}",
                published.destination.display()
            );
            print_index_update(&published.index);
            println!("Original archived at: {}", published.archived.display());
            Ok(())
        }
        Commands::Add { markdown_file, image } => {
            let site = site::Site::load(&cli.root)?;
            let update = publish::add(&site, &markdown_file, image.as_deref(), today)
                .with_context(|| format!("Error adding blog post {}", markdown_file))?;
            print_index_update(&update);
            Ok(())
        }
        Commands::Format { input, output } => {
            let written = publish::format_file(&input, output.as_deref())
                .with_context(|| format!("Error formatting {}", input.display()))?;
            println!("Formatted markdown written to: {}", written.display());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

fn print_index_update(update: &publish::IndexUpdate) {
    if update.inserted {
        println!(
            "Added \"{}\" ({}) to the index.",
            update.card.title,
            update.card.data_date()
        );
    } else {
        println!("Article {} already exists in the index.", update.card.href);
    }
}
