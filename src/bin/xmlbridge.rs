//! Command-line front end for name checks, URI checks, and tree conversion.
//!
//! Subcommands:
//!
//! - `names`: reports Name/NCName/QName/NMTOKEN/custom-id validity
//! - `uri`: validates absolute URIs and prints their components
//! - `convert`: renders a JSON parsed tree as XML
//! - `roundtrip`: reads XML, converts it to a tree, and renders it again

use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use xmlbridge::convert::{to_target_tree, ConvertOptions};
use xmlbridge::parsed::ParsedObject;
use xmlbridge::reader::{self, ReadOptions};
use xmlbridge::serial::{serialize_with_options, SerializeOptions};
use xmlbridge::uri::Uri;
use xmlbridge::util::{
    is_valid_custom_id, is_valid_name_token, is_valid_ncname, is_valid_qname, is_valid_xml_name,
};
use xmlbridge::Document;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// xmlbridge -- validate XML names and URIs, and convert parsed XML trees.
#[derive(Parser, Debug)]
#[command(name = "xmlbridge", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report which name productions each argument satisfies.
    Names {
        /// Candidate names.
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Validate absolute URIs and print their components.
    Uri {
        /// Candidate URIs.
        #[arg(required = true)]
        uris: Vec<String>,
    },

    /// Convert a JSON parsed tree (use `-` for stdin) to XML.
    Convert {
        /// Input file.
        file: String,

        /// Pretty-print (indent) the output.
        #[arg(long)]
        indent: bool,
    },

    /// Read XML (use `-` for stdin), convert it to a tree, and print it.
    Roundtrip {
        /// Input file.
        file: String,

        /// Pretty-print (indent) the output.
        #[arg(long)]
        indent: bool,

        /// Remove blank (whitespace-only) text nodes.
        #[arg(long)]
        noblanks: bool,
    },
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

const EXIT_SUCCESS: u8 = 0;
const EXIT_INVALID: u8 = 1;
const EXIT_IO_ERROR: u8 = 2;

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let exit = match &cli.command {
        Command::Names { names } => check_names(names),
        Command::Uri { uris } => check_uris(uris),
        Command::Convert { file, indent } => convert_json(file, *indent),
        Command::Roundtrip {
            file,
            indent,
            noblanks,
        } => roundtrip(file, *indent, *noblanks),
    };
    ExitCode::from(exit)
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

fn check_names(names: &[String]) -> u8 {
    let mut exit = EXIT_SUCCESS;
    for name in names {
        let valid = is_valid_xml_name(name);
        println!(
            "{name}: name={} ncname={} qname={} nmtoken={} custom-id={}",
            yes_no(valid),
            yes_no(is_valid_ncname(name)),
            yes_no(is_valid_qname(name)),
            yes_no(is_valid_name_token(name)),
            yes_no(is_valid_custom_id(name)),
        );
        if !valid {
            exit = EXIT_INVALID;
        }
    }
    exit
}

fn check_uris(uris: &[String]) -> u8 {
    let mut exit = EXIT_SUCCESS;
    for text in uris {
        match Uri::parse(text) {
            Ok(uri) => {
                println!("{text}: {}", uri.kind());
                println!("  scheme: {}", uri.scheme());
                if let Some(authority) = uri.authority() {
                    println!("  authority: {authority}");
                }
                println!("  path: {}", uri.path());
                if let Some(query) = uri.query() {
                    println!("  query: {query}");
                }
                if let Some(fragment) = uri.fragment() {
                    println!("  fragment: {fragment}");
                }
            }
            Err(e) => {
                eprintln!("{text}: {e}");
                exit = EXIT_INVALID;
            }
        }
    }
    exit
}

fn read_input(filename: &str) -> io::Result<Vec<u8>> {
    if filename == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(filename)
    }
}

fn write_output(filename: &str, doc: &Document, indent: bool) -> u8 {
    let options = SerializeOptions::default().indent(indent);
    let xml = serialize_with_options(doc, &options);
    if let Err(e) = io::stdout().write_all(xml.as_bytes()) {
        eprintln!("{filename}: failed to write output: {e}");
        return EXIT_IO_ERROR;
    }
    EXIT_SUCCESS
}

fn convert_json(filename: &str, indent: bool) -> u8 {
    let input = match read_input(filename) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{filename}: failed to read: {e}");
            return EXIT_IO_ERROR;
        }
    };
    let Ok(text) = std::str::from_utf8(&input) else {
        eprintln!("{filename}: input is not valid UTF-8");
        return EXIT_INVALID;
    };
    let doc = ParsedObject::from_json_str(text)
        .and_then(|parsed| to_target_tree(&parsed, &ConvertOptions::default()));
    match doc {
        Ok(doc) => write_output(filename, &doc, indent),
        Err(e) => {
            eprintln!("{filename}: {e}");
            EXIT_INVALID
        }
    }
}

fn roundtrip(filename: &str, indent: bool, noblanks: bool) -> u8 {
    let input = match read_input(filename) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{filename}: failed to read: {e}");
            return EXIT_IO_ERROR;
        }
    };
    let options = ReadOptions::default().no_blanks(noblanks);
    let doc = reader::parse_bytes(&input, &options)
        .map_err(xmlbridge::Error::from)
        .and_then(|parsed| {
            to_target_tree(&parsed, &ConvertOptions::default()).map_err(xmlbridge::Error::from)
        });
    match doc {
        Ok(doc) => write_output(filename, &doc, indent),
        Err(e) => {
            eprintln!("{filename}: {e}");
            EXIT_INVALID
        }
    }
}
