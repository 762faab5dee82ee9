//! CLI module - Command-line interface definitions and handlers

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::query::QueryRequest;
use crate::commands::search::SearchScope;
use crate::core::render::{OutputFormat, RenderConfig};
use crate::tree::line::DEFAULT_TAB_WIDTH;
use crate::tree::{BuildOptions, ConflictPolicy, NormalizeOptions};

/// shconf - turn indented device configuration dumps into queryable trees.
#[derive(Parser, Debug)]
#[command(name = "shconf")]
#[command(
    author,
    version,
    about,
    long_about = r#"shconf rebuilds the hierarchy of indented configuration text (for example
`show running-config` captures) and lets you query it with path expressions.

Each command prints a ResultSet in the selected format (default: jsonl).

Output formats:
- jsonl: one JSON object per line (best for piping into tools)
- json: a single JSON array
- yaml: a YAML sequence
- raw: plain text (re-indented trees, bare query values)

Examples:
    shconf tree shrun.txt
    shconf query shrun.txt --xpath '/interface[FastEthernet*]/duplex'
    shconf query shrun.txt --xpath '//duplex' --context partial
    shconf split show_all.txt
    shconf search shrun.txt '^interface' --all
"#
)]
pub struct Cli {
    /// Output format (jsonl/json/yaml/raw).
    #[arg(
        long,
        global = true,
        default_value = "jsonl",
        env = "SHCONF_FORMAT",
        value_name = "FORMAT",
        long_help = "Select the output format for ResultSet.\n\n\
Supported values:\n\
- jsonl (default)\n\
- json\n\
- yaml\n\
- raw"
    )]
    pub format: String,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(
        long,
        global = true,
        long_help = "Pretty-print JSON and JSONL output with indentation for human readability.\n\n\
Has no effect on yaml/raw formats."
    )]
    pub pretty: bool,

    /// Columns counted for each leading tab.
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_TAB_WIDTH,
        env = "SHCONF_TAB_WIDTH",
        value_name = "N",
        long_help = "Columns counted for each leading tab when measuring indentation.\n\n\
The same width is used for the whole input."
    )]
    pub tab_width: usize,

    /// Quiet mode (errors only on stderr).
    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        long_help = "Only log errors to stderr. Results are still printed to stdout.\n\
RUST_LOG, when set, takes precedence."
    )]
    pub quiet: bool,

    /// Verbose mode (debug logging on stderr).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Log builder, normalizer and query progress to stderr.\n\
RUST_LOG, when set, takes precedence."
    )]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log filter for the selected verbosity
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "shconf=debug"
        } else if self.quiet {
            "shconf=error"
        } else {
            "shconf=warn"
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the tree of a configuration dump.
    #[command(
        long_about = "Read FILE, rebuild its hierarchy from indentation and emit it.\n\n\
By default keys are single tokens (`interface: {FastEthernet0/0: {...}}`).\n\
With --legacy every key is a whole line (`interface FastEthernet0/0: {...}`).\n\n\
Examples:\n\
  shconf tree shrun.txt\n\
  shconf tree show_all.txt --section running --format yaml\n\
  shconf tree shrun.txt --leaf-depth 2\n"
    )]
    Tree {
        /// Input file.
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Only use this section of a multi-command capture.
        #[arg(
            long,
            value_name = "NAME",
            long_help = "Split FILE at show-command headers first and only use the named\n\
section (for example: running, version, ip_interface_brief)."
        )]
        section: Option<String>,

        /// Keep whole lines as keys.
        #[arg(long)]
        legacy: bool,

        /// Cap on key levels taken from a childless line.
        #[arg(
            long,
            value_name = "N",
            long_help = "Cap on key levels taken from a childless line; the remaining tokens\n\
are kept together as the value. With 2, `ip address 1.1.1.1 255.0.0.0`\n\
becomes `ip: {address: \"1.1.1.1 255.0.0.0\"}`."
        )]
        leaf_depth: Option<usize>,

        /// What to keep when one key is both a value and a branch.
        #[arg(
            long,
            default_value = "richer",
            value_name = "POLICY",
            long_help = "What to keep when one key would be both a value and a branch:\n\
- richer (default): branch beats value beats bare key; later wins a tie\n\
- first: keep what was seen first\n\
- last: keep what was seen last\n\n\
Every conflict is reported under meta.anomalies."
        )]
        conflict: String,
    },

    /// Evaluate a path expression against one or more inputs.
    #[command(
        long_about = "Evaluate --xpath against each FILE and emit one result per file.\n\n\
FILE may be a configuration dump or a `.json` tree written by `shconf tree --format json`\n\
(the `data` field). A miss is reported as success=false, not as a failure.\n\n\
Path expressions:\n\
  /hostname                        exact key\n\
  /interface/*/duplex              every key at a level\n\
  /interface[fast*]/duplex         glob on the level below interface (case-insensitive)\n\
  //duplex                         search from every depth\n\n\
Examples:\n\
  shconf query shrun.txt --xpath /hostname\n\
  shconf query a.txt b.txt --xpath '//duplex' --context full\n"
    )]
    Query {
        /// Input files.
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Path expression.
        #[arg(long, value_name = "EXPR")]
        xpath: String,

        /// How much surrounding tree to return (none/partial/full).
        #[arg(
            long,
            default_value = "none",
            value_name = "MODE",
            long_help = "How much of the tree around each match to return:\n\
- none (default): the matched value\n\
- partial: nested from the last wildcard or predicate down to the value\n\
- full: nested from the root down to the value"
        )]
        context: String,

        /// Only use this section of a multi-command capture.
        #[arg(long, value_name = "NAME")]
        section: Option<String>,

        /// Cap on key levels taken from a childless line.
        #[arg(long, value_name = "N")]
        leaf_depth: Option<usize>,
    },

    /// List the sections of a multi-command capture.
    #[command(
        long_about = "Split FILE at show-command prompt lines (default pattern: `.*#sh.*`) and\n\
emit one item per recognised command with its line count.\n\n\
Examples:\n\
  shconf split show_all.txt\n\
  shconf split show_all.txt --format raw\n"
    )]
    Split {
        /// Input file.
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Regex for header lines, matched against the lowercased line.
        #[arg(long, value_name = "REGEX")]
        pattern: Option<String>,
    },

    /// Find line-keyed tree keys by regex.
    #[command(
        long_about = "Build the line-keyed tree of FILE and emit keys matching PATTERN.\n\
Patterns match from the start of the key.\n\n\
Examples:\n\
  shconf search shrun.txt interface\n\
  shconf search shrun.txt 'interface Fast' --all\n\
  shconf search shrun.txt 'ip address' --level 1\n"
    )]
    Search {
        /// Input file.
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Regex matched at the start of each key.
        #[arg(value_name = "PATTERN")]
        pattern: String,

        /// Emit every top-level match instead of the first.
        #[arg(long, conflicts_with = "level")]
        all: bool,

        /// Search up to N levels below the top.
        #[arg(long, value_name = "N")]
        level: Option<usize>,

        /// Only use this section of a multi-command capture.
        #[arg(long, value_name = "NAME")]
        section: Option<String>,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let format: OutputFormat = cli.format.parse().map_err(|e: String| anyhow!(e))?;
    let render_config = RenderConfig::with_pretty(format, cli.pretty);
    let build = BuildOptions::with_tab_width(cli.tab_width);

    match cli.command {
        Commands::Tree {
            file,
            section,
            legacy,
            leaf_depth,
            conflict,
        } => {
            let normalize = NormalizeOptions {
                conflict: conflict.parse::<ConflictPolicy>().map_err(|e| anyhow!(e))?,
                leaf_depth,
            };
            crate::commands::tree::run_tree(
                &file,
                section.as_deref(),
                legacy,
                &build,
                &normalize,
                render_config,
            )
        }

        Commands::Query {
            files,
            xpath,
            context,
            section,
            leaf_depth,
        } => {
            let normalize = NormalizeOptions {
                leaf_depth,
                ..Default::default()
            };
            let request = QueryRequest {
                xpath: &xpath,
                context: &context,
                section: section.as_deref(),
                build: &build,
                normalize: &normalize,
            };
            crate::commands::query::run_query(&files, &request, render_config)
        }

        Commands::Split { file, pattern } => {
            crate::commands::split::run_split(&file, pattern.as_deref(), render_config)
        }

        Commands::Search {
            file,
            pattern,
            all,
            level,
            section,
        } => {
            let scope = match (all, level) {
                (true, _) => SearchScope::All,
                (false, Some(level)) => SearchScope::Level(level),
                (false, None) => SearchScope::First,
            };
            crate::commands::search::run_search(
                &file,
                &pattern,
                scope,
                section.as_deref(),
                &build,
                render_config,
            )
        }
    }
}
