//! yamlify command-line tool for checking, formatting, and transcoding
//! block-style YAML documents.
//!
//! Usage: yamlify [OPTIONS] [FILE|DIR]
//!
//! Reads standard input when no path (or `-`) is given. A directory input
//! processes every file with the chosen extension, in file name order.
//! Documents are decoded into their untyped [`Node`] tree.

use clap::{Parser, ValueEnum};
use libyamlify::{emit, list_files, parser, Node, DEFAULT_EXTENSION};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod transcode;

use transcode::Value;

#[derive(Parser, Debug)]
#[command(name = "yamlify", version, about = "Check and transcode block-style YAML documents")]
struct Cli {
    /// Input file or directory (`-` for stdin)
    input: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Canonical)]
    to: Format,

    /// Type scalars that read as booleans, integers, or floats
    #[arg(long)]
    infer: bool,

    /// Check that the input is well formed (exit 0 if valid, 1 if invalid)
    #[arg(long)]
    check: bool,

    /// Write output next to the input file with the format's extension
    #[arg(short, long, conflicts_with = "output")]
    write: bool,

    /// Write output to the given file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// File extension selected in directory mode
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    extension: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Re-emit with two-space indentation
    Canonical,
    /// Print the intermediate tree
    Debug,
    Yaml,
    Toml,
    Cbor,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Canonical | Format::Yaml => "yaml",
            Format::Debug => "txt",
            Format::Toml => "toml",
            Format::Cbor => "cbor",
        }
    }
}

enum Output {
    Text(String),
    Binary(Vec<u8>),
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let input_path = cli.input.as_deref().filter(|p| *p != Path::new("-"));

    if let Some(path) = input_path {
        if path.is_dir() {
            if cli.output.is_some() {
                eprintln!("Error: --output cannot be used with directory input");
                process::exit(1);
            }
            process::exit(process_directory(path, &cli));
        }
    }

    let decoded = match input_path {
        Some(path) => parser::<Node>().parse_file(path),
        None => {
            let mut buffer = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buffer) {
                eprintln!("Error reading stdin: {}", e);
                process::exit(1);
            }
            parser::<Node>().parse_object_str(&buffer)
        }
    };

    process::exit(process_input(decoded, input_path, cli.output.as_deref(), &cli));
}

fn process_directory(dir: &Path, cli: &Cli) -> i32 {
    let files = match list_files(dir, &cli.extension) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error reading directory {}: {}", dir.display(), e);
            return 1;
        }
    };
    debug!(dir = %dir.display(), count = files.len(), "processing directory");

    let documents = parser::<Node>();
    let mut had_errors = false;
    for path in files {
        if process_input(documents.parse_file(&path), Some(&path), None, cli) != 0 {
            had_errors = true;
        }
    }

    if had_errors {
        1
    } else {
        0
    }
}

fn process_input(
    decoded: libyamlify::Result<Node>,
    input_file: Option<&Path>,
    output_file: Option<&Path>,
    cli: &Cli,
) -> i32 {
    let node = match decoded {
        Ok(node) => node,
        Err(e) => {
            match input_file {
                Some(path) => eprintln!("{}: {}", path.display(), e),
                None => eprintln!("Parse error: {}", e),
            }
            return 1;
        }
    };

    if cli.check {
        match input_file {
            Some(path) => println!("{}: ok", path.display()),
            None => println!("ok"),
        }
        return 0;
    }

    let encoded = match cli.to {
        Format::Canonical => Ok(Output::Text(emit(&node))),
        Format::Debug => Ok(Output::Text(format!("{:#?}\n", node))),
        Format::Yaml => transcode::yaml::encode(&Value::from_node(&node, cli.infer)).map(Output::Text),
        Format::Toml => transcode::toml::encode(&Value::from_node(&node, cli.infer)).map(Output::Text),
        Format::Cbor => transcode::cbor::encode(&Value::from_node(&node, cli.infer)).map(Output::Binary),
    };

    match encoded {
        Ok(output) => write_output(&output, output_file, cli.write, input_file, cli.to),
        Err(e) => {
            match input_file {
                Some(path) => eprintln!("{}: {}", path.display(), e),
                None => eprintln!("{}", e),
            }
            1
        }
    }
}

fn write_output(
    output: &Output,
    output_file: Option<&Path>,
    write_back: bool,
    input_file: Option<&Path>,
    format: Format,
) -> i32 {
    let bytes = match output {
        Output::Text(text) => text.as_bytes(),
        Output::Binary(bytes) => bytes.as_slice(),
    };

    let target = if let Some(path) = output_file {
        path.to_path_buf()
    } else if write_back {
        match input_file {
            Some(input_path) => input_path.with_extension(format.extension()),
            None => {
                eprintln!("Error: --write requires an input file");
                return 1;
            }
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        if let Err(e) = handle.write_all(bytes) {
            eprintln!("Error writing to stdout: {}", e);
            return 1;
        }
        return 0;
    };

    if let Err(e) = fs::write(&target, bytes) {
        eprintln!("Error writing {}: {}", target.display(), e);
        return 1;
    }
    debug!(path = %target.display(), "wrote output");
    0
}
