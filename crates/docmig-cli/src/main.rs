//! `docmig` command-line driver

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use docmig_catalog::RuleCatalog;
use docmig_context::ContextScope;
use docmig_engine::{
    dangling_references, discover, BatchReport, DocumentStatus, MigrateConfig, Migrator,
    OutputTarget,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("docmig")
        .version(docmig_engine::VERSION)
        .about("Versioned document migration with reference rewriting")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log per-rule activity"),
        )
        .subcommand(
            Command::new("migrate")
                .about("Migrate every document under a directory")
                .arg(root_arg())
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML run configuration"),
                )
                .arg(rules_arg())
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write results under this directory instead of in place"),
                )
                .arg(
                    Arg::new("scope")
                        .long("scope")
                        .value_parser(["batch", "document"])
                        .help("Which documents' path changes a document sees"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Migrate and report without writing"),
                )
                .arg(
                    Arg::new("sequential")
                        .long("sequential")
                        .action(ArgAction::SetTrue)
                        .help("Process documents one at a time"),
                )
                .arg(ext_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the report as JSON"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Report parse failures and dangling references")
                .arg(root_arg())
                .arg(ext_arg()),
        )
        .subcommand(
            Command::new("rules")
                .about("List the rule catalog")
                .arg(rules_arg()),
        )
}

fn root_arg() -> Arg {
    Arg::new("root")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Directory holding the documents")
}

fn rules_arg() -> Arg {
    Arg::new("rules")
        .long("rules")
        .value_parser(value_parser!(PathBuf))
        .help("Rule set file (default: builtin rules)")
}

fn ext_arg() -> Arg {
    Arg::new("ext")
        .long("ext")
        .action(ArgAction::Append)
        .help("Document extension, repeatable")
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    let outcome = match matches.subcommand() {
        Some(("migrate", args)) => migrate(args),
        Some(("check", args)) => check(args),
        Some(("rules", args)) => rules(args),
        _ => Ok(true),
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn extensions(args: &ArgMatches) -> Option<Vec<String>> {
    args.get_many::<String>("ext")
        .map(|values| values.map(|v| v.trim_start_matches('.').to_string()).collect())
}

fn root(args: &ArgMatches) -> Result<&PathBuf> {
    args.get_one::<PathBuf>("root").context("missing root directory")
}

fn build_config(args: &ArgMatches) -> Result<MigrateConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => MigrateConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => MigrateConfig::new(),
    };

    if let Some(rules) = args.get_one::<PathBuf>("rules") {
        config = config.with_rules(rules.clone());
    }
    if let Some(dir) = args.get_one::<PathBuf>("out") {
        config = config.with_output(OutputTarget::Mirror { dir: dir.clone() });
    }
    if let Some(scope) = args
        .get_one::<String>("scope")
        .and_then(|s| ContextScope::from_name(s))
    {
        config = config.with_scope(scope);
    }
    if args.get_flag("dry-run") {
        config = config.with_dry_run(true);
    }
    if args.get_flag("sequential") {
        config = config.with_parallel(false);
    }
    if let Some(ext) = extensions(args) {
        config = config.with_extensions(ext);
    }
    Ok(config)
}

fn migrate(args: &ArgMatches) -> Result<bool> {
    let root = root(args)?;
    let config = build_config(args)?;
    tracing::debug!(?config, "configuration");
    let migrator = Migrator::from_config(&config).context("loading rule set")?;
    let report = migrator
        .migrate_directory(&config, root)
        .with_context(|| format!("migrating {}", root.display()))?;

    if args.get_flag("json") {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("encoding report")?
        );
    } else {
        print_report(&report);
    }
    Ok(!report.has_failures())
}

fn print_report(report: &BatchReport) {
    for doc in &report.documents {
        let status = match doc.status {
            DocumentStatus::Migrated => "migrated",
            DocumentStatus::Unchanged => "unchanged",
            DocumentStatus::Failed => "FAILED",
        };
        println!(
            "{status:<10} {} (rules {}, refs {})",
            doc.id, doc.rules_applied, doc.refs_rewritten
        );
        for warning in &doc.warnings {
            println!("           warning: {warning}");
        }
        if let Some(error) = &doc.error {
            println!("           {error}");
        }
    }
    let t = report.totals;
    println!(
        "{} documents: {} migrated, {} unchanged, {} failed; {} context entries",
        t.documents, t.migrated, t.unchanged, t.failed, report.context_entries
    );
}

fn check(args: &ArgMatches) -> Result<bool> {
    let root = root(args)?;
    let mut config = MigrateConfig::new();
    if let Some(ext) = extensions(args) {
        config = config.with_extensions(ext);
    }

    let mut clean = true;
    let files = discover(&config, root).with_context(|| format!("scanning {}", root.display()))?;
    for rel in &files {
        clean &= check_file(&root.join(rel), rel);
    }
    println!(
        "{} documents checked{}",
        files.len(),
        if clean { ", no problems" } else { "" }
    );
    Ok(clean)
}

fn check_file(path: &Path, rel: &Path) -> bool {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            println!("{}: unreadable: {err}", rel.display());
            return false;
        }
    };
    let doc = match docmig_tree::parse_document(text.trim_start_matches('\u{feff}')) {
        Ok(doc) => doc,
        Err(err) => {
            println!("{}: parse error: {err}", rel.display());
            return false;
        }
    };

    let dangling = dangling_references(&doc);
    for d in &dangling {
        println!("{}: {} -> {} (dangling)", rel.display(), d.node_path, d.target);
    }
    dangling.is_empty()
}

fn rules(args: &ArgMatches) -> Result<bool> {
    let catalog = match args.get_one::<PathBuf>("rules") {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            RuleCatalog::from_toml(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => RuleCatalog::builtin().context("builtin rule set")?,
    };

    for entry in catalog.entries() {
        let version = entry
            .target_version()
            .map_or_else(|| "-".to_string(), |v| v.to_string());
        println!(
            "{:<40} {:>3}  {:<22} {}",
            entry.type_tag(),
            version,
            entry.rule().name(),
            entry.rule().describe()
        );
    }
    Ok(true)
}
