//! OmniScore CLI - compile a score file to a JSON or YAML timeline

use clap::{Parser, ValueEnum};
use omniscore::{compile_with_options, CompileOptions, Compilation};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use tracing::Level;

#[derive(Parser)]
#[command(name = "omniscore")]
#[command(about = "Compile OmniScore notation into a timeline of note events", long_about = None)]
struct Cli {
    /// Input .omni file (reads stdin when omitted)
    input: Option<PathBuf>,

    /// Write the output here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: Format,

    /// Fail on the first diagnostic
    #[arg(long)]
    strict: bool,

    /// YAML file with compile options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Compile an embedded demo score instead of a file
    #[arg(long, conflicts_with = "input")]
    demo: Option<String>,

    /// List the embedded demo scores and exit
    #[arg(long)]
    list_demos: bool,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
    /// Diagnostics and a per-instrument event count
    Summary,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    if cli.list_demos {
        for name in omniscore_scores::list_scores() {
            println!("{}", name);
        }
        return;
    }

    let mut options = match &cli.config {
        Some(path) => match CompileOptions::from_yaml_file(path) {
            Ok(options) => options,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        None => CompileOptions::default(),
    };
    if cli.strict {
        options.strict = true;
    }

    let source = match read_source(&cli) {
        Ok(source) => source,
        Err(message) => {
            eprintln!("Error: {}", message);
            process::exit(1);
        }
    };

    let compilation = match compile_with_options(&source, &options) {
        Ok(compilation) => compilation,
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            process::exit(1);
        }
    };

    let rendered = match render(&compilation, cli.format) {
        Ok(text) => text,
        Err(message) => {
            eprintln!("Error: {}", message);
            process::exit(1);
        }
    };

    match &cli.output {
        Some(path) => {
            if let Err(e) = fs::write(path, &rendered) {
                eprintln!("Error writing to '{}': {}", path.display(), e);
                process::exit(1);
            }
            eprintln!(
                "Wrote {} events to {}",
                compilation.score.timeline.len(),
                path.display()
            );
        }
        None => println!("{}", rendered),
    }
}

fn read_source(cli: &Cli) -> Result<String, String> {
    if let Some(name) = &cli.demo {
        return omniscore_scores::get_score(name)
            .map(|score| score.content)
            .ok_or_else(|| format!("no demo score named '{}' (see --list-demos)", name));
    }

    match &cli.input {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("cannot read '{}': {}", path.display(), e)),
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .map_err(|e| format!("cannot read stdin: {}", e))?;
            Ok(source)
        }
    }
}

fn render(compilation: &Compilation, format: Format) -> Result<String, String> {
    match format {
        Format::Json => {
            serde_json::to_string_pretty(&compilation.score).map_err(|e| e.to_string())
        }
        Format::Yaml => serde_yaml::to_string(&compilation.score).map_err(|e| e.to_string()),
        Format::Summary => Ok(summary(compilation)),
    }
}

fn summary(compilation: &Compilation) -> String {
    let score = &compilation.score;
    let mut lines = Vec::new();

    let title = if score.meta.title.is_empty() {
        "(untitled)"
    } else {
        score.meta.title.as_str()
    };
    lines.push(format!(
        "{} - {} bpm, {}, key {}",
        title, score.meta.tempo, score.meta.time_signature, score.meta.key
    ));
    lines.push(format!(
        "{} events, {} ticks ({:.2}s)",
        score.timeline.len(),
        score.duration_ticks,
        score.tick_to_seconds(score.duration_ticks)
    ));

    for instrument in &score.instruments {
        let count = score
            .timeline
            .iter()
            .filter(|e| e.instrument_id == instrument.id)
            .count();
        lines.push(format!(
            "  {:<8} {:<20} {:>5} events",
            instrument.id, instrument.label, count
        ));
    }

    for diagnostic in &compilation.diagnostics {
        lines.push(diagnostic.to_string());
    }

    lines.join("\n")
}
