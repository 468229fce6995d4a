use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use photovault::{Config, Vault};

#[derive(Debug, PartialEq)]
enum Command {
    Ingest { file: PathBuf, name: Option<String> },
    List,
    Delete { id: i64 },
}

#[derive(Debug, PartialEq)]
struct Args {
    config_path: Option<PathBuf>,
    command: Command,
}

fn parse_args() -> Result<Args> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    for arg in &args {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("photovault {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            _ => {}
        }
    }

    match parse_args_from(&args)? {
        Some(parsed) => Ok(parsed),
        None => {
            print_help();
            std::process::exit(1);
        }
    }
}

/// Parse flags and positionals in any order: the first positional is the
/// command, the second its argument, so `ingest --name X file` and
/// `--name X ingest file` read the same.
fn parse_args_from(args: &[String]) -> Result<Option<Args>> {
    let mut config_path = None;
    let mut name = None;
    let mut positionals: Vec<&str> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    bail!("--config requires a path argument");
                }
            }
            "--name" | "-n" => {
                if i + 1 < args.len() {
                    name = Some(args[i + 1].clone());
                    i += 1;
                } else {
                    bail!("--name requires a value");
                }
            }
            flag if flag.starts_with('-') => {
                bail!("unknown argument: {flag}");
            }
            positional => {
                positionals.push(positional);
            }
        }
        i += 1;
    }

    let command = match positionals.as_slice() {
        [] => return Ok(None),
        ["ingest", file] => Command::Ingest {
            file: PathBuf::from(file),
            name,
        },
        ["ingest"] => bail!("ingest requires a file argument"),
        ["list"] => Command::List,
        ["delete", id] => Command::Delete {
            id: id.parse().with_context(|| format!("invalid id: {id}"))?,
        },
        ["delete"] => bail!("delete requires an id argument"),
        [command, ..] if matches!(*command, "ingest" | "list" | "delete") => {
            bail!("too many arguments for {command}")
        }
        [other, ..] => bail!("unknown command: {other}"),
    };

    Ok(Some(Args {
        config_path,
        command,
    }))
}

fn print_help() {
    println!(
        r#"photovault - deduplicating photo storage

USAGE:
    photovault [OPTIONS] <COMMAND>

COMMANDS:
    ingest PATH         Store a photo and its thumbnail
    list                Show all stored photos
    delete ID           Remove a stored photo

OPTIONS:
    --name, -n NAME     Display name for ingest (defaults to the filename)
    --config, -c PATH   Path to config file
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    PHOTOVAULT_LOG      Log level (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/photovault/config.toml"#
    );
}

/// Declared MIME for files arriving from disk rather than a form post.
fn guess_mime(path: &Path) -> String {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg".to_string(),
        Some(ext) => format!("image/{ext}"),
        None => "application/octet-stream".to_string(),
    }
}

fn main() -> Result<()> {
    let args = parse_args()?;

    let config = match &args.config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Journald on Linux, rolling file under config.log_dir otherwise; the
    // guard keeps the file writer alive until exit
    let _log_guard = photovault::logging::init(&config).ok();

    let vault = Vault::open(&config)?;

    match args.command {
        Command::Ingest { file, name } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let display_name = name.unwrap_or_else(|| filename.clone());
            let mime = guess_mime(&file);

            match vault.ingest(&display_name, &bytes, &mime, &filename) {
                Ok(artifact) => {
                    println!(
                        "stored {} as {} (id {})",
                        filename, artifact.stored_name, artifact.id
                    );
                }
                Err(e) => {
                    eprintln!("{}", e.user_message());
                    std::process::exit(1);
                }
            }
        }
        Command::List => {
            for artifact in vault.list()? {
                println!(
                    "{:>5}  {:<30}  {:>10} B  {}  {}",
                    artifact.id,
                    artifact.display_name,
                    artifact.size_bytes,
                    artifact.uploaded_at,
                    if artifact.camera_model.is_empty() {
                        "-"
                    } else {
                        artifact.camera_model.as_str()
                    },
                );
            }
        }
        Command::Delete { id } => match vault.delete(id) {
            Ok(()) => println!("deleted artifact {id}"),
            Err(e) => {
                eprintln!("{}", e.user_message());
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(tokens: &[&str]) -> Result<Option<Args>> {
        let owned: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        parse_args_from(&owned)
    }

    #[test]
    fn flags_bind_regardless_of_position() {
        let before = parse(&["--name", "X", "ingest", "file.png"])
            .unwrap()
            .unwrap();
        let after = parse(&["ingest", "--name", "X", "file.png"])
            .unwrap()
            .unwrap();
        let expected = Command::Ingest {
            file: PathBuf::from("file.png"),
            name: Some("X".to_string()),
        };
        assert_eq!(before.command, expected);
        assert_eq!(after.command, expected);
    }

    #[test]
    fn ingest_without_name_defaults_to_none() {
        let args = parse(&["ingest", "photo.jpg"]).unwrap().unwrap();
        assert_eq!(
            args.command,
            Command::Ingest {
                file: PathBuf::from("photo.jpg"),
                name: None,
            }
        );
    }

    #[test]
    fn delete_parses_numeric_id() {
        let args = parse(&["delete", "42"]).unwrap().unwrap();
        assert_eq!(args.command, Command::Delete { id: 42 });
        assert!(parse(&["delete", "notanumber"]).is_err());
        assert!(parse(&["delete"]).is_err());
    }

    #[test]
    fn config_flag_is_captured() {
        let args = parse(&["-c", "/tmp/pv.toml", "list"]).unwrap().unwrap();
        assert_eq!(args.config_path, Some(PathBuf::from("/tmp/pv.toml")));
        assert_eq!(args.command, Command::List);
    }

    #[test]
    fn rejects_unknown_input() {
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["frobnicate"]).is_err());
        assert!(parse(&["list", "extra"]).is_err());
        assert!(parse(&["ingest"]).is_err());
        assert!(parse(&[]).unwrap().is_none());
    }
}
