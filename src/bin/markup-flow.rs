//! Lay out markup text from a file or stdin and print the lines.
//!
//! Usage:
//!   markup-flow [--width W] [--font-size S] [--family NAME] [--align left|center|right] [--json] [FILE]

use std::io::Read;
use std::process::ExitCode;

use markup_flow::{FontSet, HorizontalAlignment, Paragraph, ParagraphConfig};

struct Args {
    config: ParagraphConfig,
    json: bool,
    input: Option<String>,
}

fn usage() {
    eprintln!("Usage: markup-flow [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Reads markup from FILE, or stdin when no file is given.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --width <W>              Width budget (default: 500)");
    eprintln!("  --font-size <S>          Base font size (default: 12)");
    eprintln!("  --family <NAME>          Font family for all four faces (default: Helvetica)");
    eprintln!("  --align <left|center|right>  Alignment recorded in the output (default: left)");
    eprintln!("  --json                   Print the layout as JSON");
}

fn parse_number(flag: &str, value: Option<&String>) -> Result<f32, String> {
    let value = value.ok_or_else(|| format!("{} expects a value", flag))?;
    value
        .parse::<f32>()
        .map_err(|_| format!("{} expects a number, got {:?}", flag, value))
}

fn parse_args(args: &[String]) -> Result<Option<Args>, String> {
    let mut config = ParagraphConfig::default();
    let mut json = false;
    let mut input = None;
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--width" => {
                i += 1;
                config.width = parse_number("--width", args.get(i))?;
            }
            "--font-size" => {
                i += 1;
                config.font_size = parse_number("--font-size", args.get(i))?;
            }
            "--family" => {
                i += 1;
                let family = args.get(i).ok_or("--family expects a value")?;
                config.fonts = FontSet::new(family);
            }
            "--align" => {
                i += 1;
                let name = args.get(i).ok_or("--align expects a value")?;
                config.align = HorizontalAlignment::from_name(name)
                    .ok_or_else(|| format!("unknown alignment: {}", name))?;
            }
            "--json" => json = true,
            "--help" | "-h" => return Ok(None),
            other if other.starts_with("--") => return Err(format!("unknown option: {}", other)),
            other => {
                if input.is_some() {
                    return Err(format!("unexpected argument: {}", other));
                }
                input = Some(other.to_string());
            }
        }
        i += 1;
    }

    Ok(Some(Args {
        config,
        json,
        input,
    }))
}

fn read_input(path: Option<&str>) -> std::io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn main() -> ExitCode {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(Some(args)) => args,
        Ok(None) => {
            usage();
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("error: {}", message);
            usage();
            return ExitCode::from(2);
        }
    };

    let text = match read_input(args.input.as_deref()) {
        Ok(text) => text,
        Err(err) => {
            eprintln!(
                "error: failed to read {}: {}",
                args.input.as_deref().unwrap_or("stdin"),
                err
            );
            return ExitCode::FAILURE;
        }
    };

    let align = args.config.align;
    let width = args.config.width;
    let paragraph = Paragraph::new(text, args.config);
    let laid_out = match paragraph.layout() {
        Ok(laid_out) => laid_out,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        let doc = serde_json::json!({
            "width": width,
            "align": align,
            "max_line_width": laid_out.max_line_width(),
            "lines": laid_out.lines,
        });
        match serde_json::to_string_pretty(&doc) {
            Ok(out) => println!("{}", out),
            Err(err) => {
                eprintln!("error: failed to encode JSON: {}", err);
                return ExitCode::FAILURE;
            }
        }
    } else {
        for line in &laid_out.lines {
            println!("{:>8.2}  {}", line.width, line.text);
        }
    }
    ExitCode::SUCCESS
}
