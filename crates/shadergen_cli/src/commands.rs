// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command parsing and execution.

use crate::settings::{GeneratorSettings, SettingsError, SETTINGS_FILE_NAME};
use shadergen_graph::{
    find_documents, is_graph_document, read_document, render_guide, write_document, BuildError,
    Encoding, LegacyToonFormula, PersistError,
};
use std::path::{Path, PathBuf};

/// A parsed command line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Generate the legacy toon graph
    Build(BuildArgs),
    /// Validate existing graph documents
    Check(Vec<PathBuf>),
    /// Print the recipe of a graph
    Guide(Option<PathBuf>),
    /// Write a default settings file
    Init,
    /// Print usage
    Help,
}

/// Options of the `build` command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildArgs {
    /// Output path override
    pub out: Option<PathBuf>,
    /// Encoding override
    pub format: Option<Encoding>,
    /// Explicit settings file
    pub config: Option<PathBuf>,
}

/// Error from a command
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Bad command line
    #[error("{0}")]
    Usage(String),

    /// Settings could not be loaded
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Graph assembly failed
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Writing or reading a graph failed
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// Some checked documents are broken
    #[error("Found {0} broken graph documents")]
    Broken(usize),
}

/// Print usage
pub fn print_usage() {
    println!("Usage: shadergen <command> [options]");
    println!();
    println!("Commands:");
    println!("  build [--out <path>] [--format ron|json] [--config <path>]");
    println!("                    Generate the legacy toon shader graph");
    println!("  check <path>...   Validate graph files (directories are scanned");
    println!("                    for *.shadergraph files)");
    println!("  guide [<path>]    Print the conversion recipe of a graph file,");
    println!("                    or of the built-in legacy formula");
    println!("  init              Write default settings to {SETTINGS_FILE_NAME}");
    println!("  help              Show this help message");
}

fn value_of<'a>(flag: &str, iter: &mut impl Iterator<Item = &'a String>) -> Result<&'a String, CliError> {
    iter.next()
        .ok_or_else(|| CliError::Usage(format!("Missing value for {flag}")))
}

/// Parse arguments (without the program name)
pub fn parse(args: &[String]) -> Result<Command, CliError> {
    let Some((command, rest)) = args.split_first() else {
        return Ok(Command::Help);
    };

    match command.as_str() {
        "build" => {
            let mut build = BuildArgs::default();
            let mut iter = rest.iter();
            while let Some(arg) = iter.next() {
                match arg.as_str() {
                    "--out" | "-o" => build.out = Some(PathBuf::from(value_of(arg, &mut iter)?)),
                    "--format" | "-f" => {
                        let name = value_of(arg, &mut iter)?;
                        let encoding = Encoding::from_name(name)
                            .ok_or_else(|| CliError::Usage(format!("Unknown format: {name}")))?;
                        build.format = Some(encoding);
                    }
                    "--config" | "-c" => {
                        build.config = Some(PathBuf::from(value_of(arg, &mut iter)?));
                    }
                    other => return Err(CliError::Usage(format!("Unknown option: {other}"))),
                }
            }
            Ok(Command::Build(build))
        }
        "check" => {
            if rest.is_empty() {
                return Err(CliError::Usage("Please specify at least one path".to_string()));
            }
            Ok(Command::Check(rest.iter().map(PathBuf::from).collect()))
        }
        "guide" => match rest {
            [] => Ok(Command::Guide(None)),
            [path] => Ok(Command::Guide(Some(PathBuf::from(path)))),
            _ => Err(CliError::Usage("guide takes at most one path".to_string())),
        },
        "init" => Ok(Command::Init),
        "help" | "--help" | "-h" => Ok(Command::Help),
        other => Err(CliError::Usage(format!("Unknown command: {other}"))),
    }
}

/// Run a command relative to the working directory `cwd`
pub fn run(command: Command, cwd: &Path) -> Result<(), CliError> {
    match command {
        Command::Build(args) => build(&args, cwd).map(|path| {
            println!("{}", path.display());
        }),
        Command::Check(paths) => check(&paths),
        Command::Guide(path) => {
            let doc = match path {
                Some(path) => read_document(&path)?,
                None => LegacyToonFormula::default().build()?,
            };
            print!("{}", render_guide(&doc));
            Ok(())
        }
        Command::Init => init(cwd).map(|path| {
            println!("{}", path.display());
        }),
        Command::Help => {
            print_usage();
            Ok(())
        }
    }
}

/// Write default settings into `cwd`, keeping an existing file
pub fn init(cwd: &Path) -> Result<PathBuf, CliError> {
    let path = cwd.join(SETTINGS_FILE_NAME);
    if path.exists() {
        return Err(CliError::Usage(format!("{} already exists", path.display())));
    }
    GeneratorSettings::default().save(&path)?;
    tracing::info!("Wrote default settings to {}", path.display());
    Ok(path)
}

/// Generate and write the legacy graph, returning the written path
pub fn build(args: &BuildArgs, cwd: &Path) -> Result<PathBuf, CliError> {
    let mut settings = GeneratorSettings::resolve(args.config.as_deref(), cwd)?;
    if let Some(out) = &args.out {
        settings.output_path.clone_from(out);
    }
    if let Some(format) = args.format {
        settings.encoding = format;
    }

    let formula = LegacyToonFormula {
        layout: settings.layout,
        ..LegacyToonFormula::default()
    };
    let doc = formula.build()?;

    let path = if settings.output_path.is_absolute() {
        settings.output_path.clone()
    } else {
        cwd.join(&settings.output_path)
    };
    let hook = |written: &Path| {
        tracing::info!("Import requested for {}", written.display());
    };
    write_document(&doc, &path, settings.encoding, Some(&hook))?;
    Ok(path)
}

/// Validate every graph document under the given paths
pub fn check(paths: &[PathBuf]) -> Result<(), CliError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(find_documents(path, is_graph_document));
        } else {
            files.push(path.clone());
        }
    }

    tracing::info!("Scanning {} graph documents", files.len());
    let mut broken = 0;
    for file in &files {
        match read_document(file) {
            Ok(doc) => tracing::info!(nodes = doc.node_count(), "OK {}", file.display()),
            Err(err) => {
                tracing::warn!("[BROKEN] {}\n  Reason: {err}", file.display());
                broken += 1;
            }
        }
    }

    if broken == 0 {
        tracing::info!("No broken graph documents found");
        Ok(())
    } else {
        Err(CliError::Broken(broken))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_parse_build_options() {
        let command = parse(&args(&["build", "--out", "a.shadergraph", "--format", "json"])).unwrap();
        assert_eq!(
            command,
            Command::Build(BuildArgs {
                out: Some(PathBuf::from("a.shadergraph")),
                format: Some(Encoding::Json),
                config: None,
            })
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse(&args(&["build", "--format", "xml"])), Err(CliError::Usage(_))));
        assert!(matches!(parse(&args(&["build", "--out"])), Err(CliError::Usage(_))));
        assert!(matches!(parse(&args(&["check"])), Err(CliError::Usage(_))));
        assert!(matches!(parse(&args(&["frobnicate"])), Err(CliError::Usage(_))));
        assert_eq!(parse(&[]).unwrap(), Command::Help);
        assert_eq!(parse(&args(&["guide"])).unwrap(), Command::Guide(None));
    }

    #[test]
    fn test_build_then_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = build(&BuildArgs::default(), dir.path()).unwrap();
        assert!(path.starts_with(dir.path()));
        assert!(path.ends_with("Assets/Shaders/HDRP/ToonBasic_HDRP.shadergraph"));
        check(&[dir.path().to_path_buf()]).unwrap();
    }

    #[test]
    fn test_build_respects_local_settings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE_NAME),
            "(output_path: \"graphs/toon.shadergraph\", encoding: Json)",
        )
        .unwrap();
        let path = build(&BuildArgs::default(), dir.path()).unwrap();
        assert_eq!(path, dir.path().join("graphs/toon.shadergraph"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with('{'));
    }

    #[test]
    fn test_init_writes_loadable_settings_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = init(dir.path()).unwrap();
        assert_eq!(
            GeneratorSettings::load(&path).unwrap(),
            GeneratorSettings::default()
        );
        assert!(matches!(init(dir.path()), Err(CliError::Usage(_))));
    }

    #[test]
    fn test_check_reports_broken_documents() {
        let dir = tempfile::tempdir().unwrap();
        build(&BuildArgs::default(), dir.path()).unwrap();
        std::fs::write(dir.path().join("broken.shadergraph"), "(version: 3)").unwrap();
        assert!(matches!(check(&[dir.path().to_path_buf()]), Err(CliError::Broken(1))));
    }
}
