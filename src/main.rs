use clap::{ArgAction, Parser};
use formula1_scanner::{
    ArtworkOutcome, DEFAULT_FALLBACK_YEAR, EpisodeRecord, ProgressEvent, ScanRequest, Scanner,
    ScannerConfig, list_directory,
};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Identify Formula 1 broadcast recordings and print the episodes a media
/// library would see.
#[derive(Debug, Parser)]
#[command(name = "formula1_scanner", version, about)]
struct Cli {
    /// Directory to scan
    directory: PathBuf,

    /// Library root file names are matched against [default: parent of DIRECTORY]
    #[arg(long)]
    root: Option<PathBuf>,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Do not fetch artwork
    #[arg(long)]
    no_art: bool,

    /// Year for files without a recognizable year
    #[arg(long, default_value_t = DEFAULT_FALLBACK_YEAR)]
    fallback_year: u32,

    /// Skip TLS certificate validation for artwork requests
    #[arg(long)]
    insecure_tls: bool,

    /// Do not cache event listings on disk
    #[arg(long)]
    no_cache: bool,

    /// Print the records as JSON
    #[arg(long)]
    json: bool,

    /// Append log output to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn scanner_config(&self) -> ScannerConfig {
        let mut config = ScannerConfig {
            download_art: !self.no_art,
            fallback_year: self.fallback_year,
            ..ScannerConfig::default()
        };
        config.artwork.accept_invalid_certs = self.insecure_tls;
        if self.no_cache {
            config.artwork.cache_ttl = None;
        }
        config
    }
}

fn init_logging(verbose: u8, log_file: Option<&Path>) -> io::Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("formula1_scanner={}", level)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(io::stderr).init(),
    }

    Ok(())
}

/// Handles progress events and prints formatted output to stdout
fn handle_progress_event(event: ProgressEvent, quiet: bool) {
    if quiet {
        return;
    }

    match event {
        ProgressEvent::Started { directory } => {
            println!("Scanning {} for F1 recordings...", directory.display());
        }
        ProgressEvent::ScanningDirectory {
            directory,
            file_count,
        } => {
            println!("\n{} ({} video file(s))", directory.display(), file_count);
        }
        ProgressEvent::ProcessingFile { index, total, path } => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            println!("[{}/{}] {}", index + 1, total, name);
        }
        ProgressEvent::ConventionMatched { convention, .. } => {
            println!("  Convention: {}", convention);
        }
        ProgressEvent::RecordCreated {
            title,
            season,
            episode,
        } => {
            println!("  Episode: S{:02}E{:02} - {}", season, episode, title);
        }
        ProgressEvent::FileSkipped { reason, .. } => {
            println!("  Skipped: {}", reason);
        }
        ProgressEvent::Artwork { target, outcome } => {
            let status = match outcome {
                ArtworkOutcome::AlreadyPresent => "present".to_string(),
                ArtworkOutcome::Downloaded { url } => format!("downloaded from {}", url),
                ArtworkOutcome::Placeholder { .. } => "placeholder".to_string(),
                ArtworkOutcome::NotFound => "not found".to_string(),
            };
            println!("  Artwork {}: {}", target.display(), status);
        }
        ProgressEvent::Complete { record_count } => {
            println!("\nScan complete! Found {} episode(s).", record_count);
        }
    }
}

fn print_records(media: &[EpisodeRecord]) {
    println!("\n=== Episodes ===\n");

    if media.is_empty() {
        println!("No episodes found.");
        return;
    }

    for (index, record) in media.iter().enumerate() {
        println!("Episode #{}", index + 1);
        println!("  Title: {}", record.title);
        println!(
            "  Year {}, Season {}, Episode {}",
            record.year, record.season, record.episode
        );
        println!("  Description: {}", record.description);
        for part in &record.parts {
            println!("  Part: {}", part.display());
        }
        println!();
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("Error: Unable to open log file: {}", e);
        process::exit(1);
    }

    let directory = cli.directory.as_path();

    if !directory.exists() {
        eprintln!("Error: Directory does not exist: {}", directory.display());
        process::exit(1);
    }

    if !directory.is_dir() {
        eprintln!("Error: Path is not a directory: {}", directory.display());
        process::exit(1);
    }

    let listing = match list_directory(directory) {
        Ok(listing) => listing,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let scanner = match Scanner::new(cli.scanner_config()) {
        Ok(scanner) => scanner,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let root = cli
        .root
        .clone()
        .or_else(|| directory.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| directory.to_path_buf());
    let subdirs = if cli.recursive {
        listing.subdirs
    } else {
        Vec::new()
    };
    let request = ScanRequest::new(directory, listing.files)
        .with_subdirs(subdirs)
        .with_root(root);

    let mut media = Vec::new();
    let quiet = cli.json;
    if let Err(e) = scanner.scan(request, &mut media, |event| {
        handle_progress_event(event, quiet)
    }) {
        eprintln!("\nError during scan: {}", e);
        process::exit(1);
    }

    if cli.json {
        match serde_json::to_string_pretty(&media) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: Unable to serialize records: {}", e);
                process::exit(1);
            }
        }
    } else {
        print_records(&media);
    }
}
