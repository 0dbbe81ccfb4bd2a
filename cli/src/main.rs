#![warn(clippy::pedantic)]
#![warn(unused_crate_dependencies)]
use std::path::{Path, PathBuf};

use anyhow::{Context, Error};
use cfg_toolkit::{
    CykParser, GeneratorConfig, Grammar, GrammarError, GrammarKind, LayoutConfig, TreeNode,
    is_cnf, layout_tree, load_grammar, render_tree_fancy, render_tree_text, save_grammar, to_cnf,
};
use clap::{Parser, Subcommand, ValueEnum};
use colored::{Color, Colorize};
use tracing::{Level, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// More log output on stderr, repeat for more detail
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    subcommand: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a grammar file in readable form
    Show { grammar: PathBuf },
    /// Convert a grammar to Chomsky Normal Form
    Cnf {
        grammar: PathBuf,
        /// Print the result as JSON instead of text
        #[arg(short, long)]
        json: bool,
        /// Also save the result to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check whether a string belongs to the language, and show its derivation
    Parse {
        grammar: PathBuf,
        /// Characters, or whitespace separated words when a terminal is longer than one character
        input: String,
        #[arg(short, long, value_enum, default_value_t = TreeFormat::Text)]
        tree: TreeFormat,
    },
    /// List the shortest strings of the language
    Generate {
        grammar: PathBuf,
        #[arg(short, long, default_value_t = GeneratorConfig::default().limit)]
        limit: usize,
        /// Give up after this many sentential forms
        #[arg(long, default_value_t = GeneratorConfig::default().max_steps)]
        max_steps: usize,
    },
    /// Build a grammar from the command line
    New {
        #[arg(short, long, value_delimiter = ',', required = true)]
        nonterminals: Vec<String>,
        #[arg(short, long, value_delimiter = ',', required = true)]
        terminals: Vec<String>,
        #[arg(short, long)]
        start: String,
        /// A production such as `S -> a S b | ε`, may be repeated
        #[arg(short, long = "production", required = true)]
        productions: Vec<String>,
        /// Mark the grammar as regular (type 3)
        #[arg(long)]
        regular: bool,
        /// Write the grammar here instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TreeFormat {
    Text,
    Fancy,
    Json,
    Layout,
    None,
}

fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.subcommand {
        Commands::Show { grammar } => show(&grammar),
        Commands::Cnf {
            grammar,
            json,
            output,
        } => cnf(&grammar, json, output.as_deref()),
        Commands::Parse {
            grammar,
            input,
            tree,
        } => parse(&grammar, &input, tree),
        Commands::Generate {
            grammar,
            limit,
            max_steps,
        } => generate(&grammar, GeneratorConfig { limit, max_steps }),
        Commands::New {
            nonterminals,
            terminals,
            start,
            productions,
            regular,
            output,
        } => {
            let kind = if regular {
                GrammarKind::Regular
            } else {
                GrammarKind::ContextFree
            };
            let g = Grammar::from_text(nonterminals, terminals, &productions, &start, kind)
                .map_err(explain)?;
            warn_dangling(&g);
            match output {
                Some(path) => {
                    save_grammar(&g, &path)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("{} {}", "Saved".color(Color::Green), path.display());
                }
                None => println!("{}", g.to_json()?),
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints the annotated source of a format error before handing it on.
fn explain(e: GrammarError) -> Error {
    if let Some(report) = e.report() {
        eprint!("{report}");
    }
    Error::new(e)
}

fn load(path: &Path) -> Result<Grammar, Error> {
    let g = load_grammar(path)
        .map_err(explain)
        .with_context(|| format!("loading {}", path.display()))?;
    info!(path = %path.display(), rules = g.production_count(), "loaded grammar");
    Ok(g)
}

fn warn_dangling(g: &Grammar) {
    if let Some((left, symbol)) = g.dangling_reference() {
        eprintln!(
            "{} `{symbol}` in a production of `{left}` is neither a terminal nor a non-terminal",
            "Warning:".color(Color::Yellow)
        );
    }
}

fn show(path: &Path) -> Result<(), Error> {
    let g = load(path)?;
    warn_dangling(&g);
    println!("{g}");
    println!("type = {}", g.kind);
    Ok(())
}

fn cnf(path: &Path, json: bool, output: Option<&Path>) -> Result<(), Error> {
    let g = load(path)?;
    let normal = to_cnf(&g);
    debug_assert!(is_cnf(&normal));
    if json {
        println!("{}", normal.to_json()?);
    } else {
        println!("{normal}");
    }
    if let Some(output) = output {
        save_grammar(&normal, output).with_context(|| format!("writing {}", output.display()))?;
        eprintln!("{} {}", "Saved".color(Color::Green), output.display());
    }
    Ok(())
}

fn parse(path: &Path, input: &str, format: TreeFormat) -> Result<(), Error> {
    let g = load(path)?;
    let tokens = g.tokenize_input(input);
    let result = CykParser::new(&g).parse(&tokens);

    if !result.accepted {
        println!("{}", "rejected".color(Color::Red).bold());
        return Ok(());
    }
    println!("{}", "accepted".color(Color::Green).bold());

    let Some(tree) = result.tree else {
        return Ok(());
    };
    match format {
        TreeFormat::Text => print!("{}", render_tree_text(&tree)),
        TreeFormat::Fancy => println!("{}", render_tree_fancy(&tree)),
        TreeFormat::Json => println!("{}", serde_json::to_string(&tree)?),
        TreeFormat::Layout => {
            let layout = layout_tree(&TreeNode::from(&tree), &LayoutConfig::default());
            println!("{}", serde_json::to_string_pretty(&layout)?);
        }
        TreeFormat::None => {}
    }
    Ok(())
}

fn generate(path: &Path, config: GeneratorConfig) -> Result<(), Error> {
    let g = load(path)?;
    let words = config.generate(&g);
    if words.len() < config.limit {
        eprintln!(
            "{} found {} of {} requested strings",
            "Note:".color(Color::Yellow),
            words.len(),
            config.limit
        );
    }
    for word in words {
        if word.is_empty() {
            println!("ε");
        } else {
            println!("{word}");
        }
    }
    Ok(())
}
