//! Command line driver: read a grammar, emit the parser it describes.

use clap::Parser;
use peg_pt::generator::{GeneratorConfig, ParserGenerator};
use peg_pt::metagrammar::parse_grammar;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "peg-pt", about = "Generate a packrat recursive descent parser from a PEG.")]
struct Args {
    /// Grammar description file.
    #[arg(short = 'g', long = "grammar")]
    grammar: PathBuf,

    /// Destination for the emitted parser source (default stdout).
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Print nothing but errors.
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Print analysis details; repeat for more.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit default-value bodies, ignoring { action } clauses.
    #[arg(long = "skip-actions")]
    skip_actions: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let source = match std::fs::read_to_string(&args.grammar) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("peg-pt: cannot read {}: {}", args.grammar.display(), err);
            return ExitCode::from(2);
        }
    };

    let grammar = match parse_grammar(&source, Some(&args.grammar)) {
        Ok(grammar) => grammar,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::from(1);
        }
    };

    if args.verbose > 0 && !args.quiet {
        eprintln!("{}", grammar);
    }

    let config = GeneratorConfig {
        skip_actions: args.skip_actions,
        ..GeneratorConfig::default()
    };
    let generator = match ParserGenerator::new(grammar, config) {
        Ok(generator) => generator,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::from(1);
        }
    };

    if args.verbose > 1 && !args.quiet {
        eprintln!("keywords: {:?}", generator.keywords());
        eprintln!("soft keywords: {:?}", generator.soft_keywords());
        for rule in generator.grammar().iter() {
            if rule.left_recursive {
                let role = if rule.leader { "leader" } else { "member" };
                eprintln!("left recursive ({}): {}", role, rule.name);
            }
        }
    }

    let emitted = match generator.emit_rust() {
        Ok(emitted) => emitted,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::from(1);
        }
    };

    match &args.output {
        Some(path) => {
            if let Err(err) = std::fs::write(path, emitted) {
                eprintln!("peg-pt: cannot write {}: {}", path.display(), err);
                return ExitCode::from(2);
            }
            if !args.quiet {
                eprintln!("wrote {}", path.display());
            }
        }
        None => {
            if std::io::stdout().write_all(emitted.as_bytes()).is_err() {
                return ExitCode::from(2);
            }
        }
    }
    ExitCode::SUCCESS
}
