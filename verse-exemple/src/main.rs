use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};
use verse_core::{Exhaustion, ModelStore};

#[derive(Parser, Debug)]
#[command(name = "verse-exemple", about = "Print Markov verses from every configured model")]
#[command(version)]
struct Cli {
    /// TOML file describing the models and their corpus
    #[arg(short, long, env = "VERSES_CONFIG", default_value = "./verses.toml")]
    config: PathBuf,

    /// Lines to print per model
    #[arg(short, long, default_value_t = 10)]
    lines: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Build every configured model once; missing books are reported, not fatal
    let (store, report) = ModelStore::from_config_file(&cli.config)?;
    for failure in report.failures() {
        warn!("{failure}");
    }
    info!("Startup took {}ms", report.elapsed.as_millis());

    for name in store.model_names() {
        println!("== {name}");

        // Generate with the defaults from the config file
        match store.generate_default(&name, cli.lines) {
            Ok(verse) => {
                for line in verse.lines() {
                    println!("{line}");
                }
                match verse.exhaustion() {
                    Some(Exhaustion::Duplicates { accepted }) => {
                        warn!("{name}: {accepted} duplicate line(s) kept after the retry budget ran out")
                    }
                    Some(Exhaustion::Length { produced, requested }) => {
                        warn!("{name}: only {produced} of {requested} line(s) could reach the minimum length")
                    }
                    None => (),
                }
            }
            Err(e) => warn!("{name}: {e}"),
        }
        println!();
    }

    Ok(())
}
