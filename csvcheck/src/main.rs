//! csvcheck CLI - Validate a CSV file against JSON Schema rules
//!
//! ```bash
//! csvcheck people.csv rules.json              # report every violation
//! csvcheck -a -d people.csv rules.json        # typed cells, one error per row
//! csvcheck -q people.csv rules.yaml           # pass/fail only
//! csvcheck --format json people.csv rules.json
//! ```
//!
//! Exit code is 0 when the file passes, 1 otherwise.

use clap::{Parser, ValueEnum};
use colored::Colorize;
use csvcheck::logs::LOG_BROADCASTER;
use csvcheck::{
    check_files, CheckOptions, FailureKind, Outcome, ReadOptions, SchemaFormat, SchemaOptions,
    ValidateOptions,
};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "csvcheck", version)]
#[command(about = "Validate a CSV file against a set of rules defined with JSON Schema.", long_about = None)]
struct Cli {
    /// CSV file to validate
    csv_file: PathBuf,

    /// JSON Schema rules file (.json, or .yaml/.yml)
    rules_file: PathBuf,

    /// Move to the next line as soon as an error is encountered
    #[arg(short, long, env = "CSVCHECK_ABORT_EARLY")]
    abort_early: bool,

    /// Convert data into the appropriate type according to their format
    #[arg(short, long, env = "CSVCHECK_DYNAMIC_TYPING")]
    dynamic_typing: bool,

    /// Encoding of the files ("auto" to detect)
    #[arg(short, long, default_value = "utf8", env = "CSVCHECK_ENCODING")]
    encoding: String,

    /// Hide the list of errors encountered
    #[arg(short, long, env = "CSVCHECK_QUIET")]
    quiet: bool,

    /// Ignore empty lines in the CSV file
    #[arg(short, long, env = "CSVCHECK_SKIP_EMPTY_LINES")]
    skip_empty_lines: bool,

    /// CSV delimiter (auto-detect if not specified)
    #[arg(long, env = "CSVCHECK_DELIMITER")]
    delimiter: Option<char>,

    /// Number of validation workers
    #[arg(short, long, default_value = "1", env = "CSVCHECK_JOBS")]
    jobs: usize,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Show pipeline progress on stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> CheckOptions {
        CheckOptions {
            read: ReadOptions {
                dynamic_typing: self.dynamic_typing,
                encoding: self.encoding.clone(),
                skip_empty_lines: self.skip_empty_lines,
                delimiter: self.delimiter,
            },
            schema: SchemaOptions {
                encoding: self.encoding.clone(),
                format: SchemaFormat::from_path(&self.rules_file),
            },
            validate: ValidateOptions {
                abort_early: self.abort_early,
                jobs: self.jobs,
            },
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    LOG_BROADCASTER.set_echo(cli.verbose);

    let outcome = match check_files(&cli.csv_file, &cli.rules_file, &cli.options()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            std::process::exit(1);
        }
    };

    let result = match cli.format {
        OutputFormat::Text => {
            print_text(&cli.csv_file, &outcome, cli.quiet);
            Ok(())
        }
        OutputFormat::Json => outcome.to_json_pretty().map(|json| println!("{}", json)),
    };

    if let Err(e) = result {
        eprintln!("{}", e.to_string().red());
        std::process::exit(1);
    }

    std::process::exit(outcome.exit_code());
}

fn print_text(csv_file: &Path, outcome: &Outcome, quiet: bool) {
    match outcome {
        Outcome::Success => {
            println!(
                "{}",
                format!("File \"{}\" passes validation checks.", csv_file.display()).green()
            );
            return;
        }
        Outcome::ParseFailed { failures } => {
            // An unreadable input is reported even in quiet mode
            for failure in failures.iter().filter(|f| !quiet || f.kind == FailureKind::Io) {
                eprintln!("{}", failure.to_string().red());
            }
        }
        Outcome::ValidationFailed { violations } => {
            if !quiet {
                for violation in violations {
                    eprintln!("{}", violation.to_string().red());
                }
            }
        }
    }

    eprintln!(
        "{}",
        format!("File \"{}\" fails validation checks.", csv_file.display()).red()
    );
}
