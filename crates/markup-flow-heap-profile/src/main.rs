//! DHAT heap profiler for markup-flow.
//!
//! Profiles allocation patterns of the layout pipeline:
//! tokenize -> break lines -> render.
//!
//! Usage:
//!   cargo run -p markup-flow-heap-profile --release -- [OPTIONS] [MARKUP_FILES...]
//!
//! Writes dhat-<phase>[-<file>].json into the output directory (default: target/memory).
//! Open in https://nnethercote.github.io/dh_view/dh_view.html

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use embedded_graphics::mock_display::MockDisplay;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use markup_flow::{tokenize, DefaultWrapFunction, Paragraph, ParagraphConfig};
use markup_flow_embedded_graphics::{
    with_embedded_text_measurer, EgParagraphRenderer, EgRenderConfig,
};

const DEFAULT_CORPUS_DIR: &str = "tests/fixtures/markup";
const LAYOUT_WIDTHS: &[f32] = &[120.0, 240.0, 480.0];
const FONT_SIZE: f32 = 12.0;
/// MockDisplay is fixed at 64x64; render one narrow column into it.
const RENDER_WIDTH: f32 = 60.0;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Tokenize,
    Layout,
    Render,
    Full,
}

impl Phase {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "tokenize" => Some(Self::Tokenize),
            "layout" => Some(Self::Layout),
            "render" => Some(Self::Render),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Tokenize => "tokenize",
            Self::Layout => "layout",
            Self::Render => "render",
            Self::Full => "full",
        }
    }
}

struct Options {
    phase: Phase,
    out_dir: PathBuf,
    iterations: usize,
    aggregate: bool,
    // Set on child processes that profile exactly one file.
    single_file: bool,
    files: Vec<PathBuf>,
}

fn layout_all_widths(text: &str) -> Result<usize, String> {
    let mut lines = 0usize;
    for &width in LAYOUT_WIDTHS {
        let paragraph = Paragraph::new(text, ParagraphConfig::for_width(width, FONT_SIZE));
        lines += paragraph.layout().map_err(|e| e.to_string())?.line_count();
    }
    Ok(lines)
}

fn render_first_lines(text: &str) -> Result<(), String> {
    let paragraph = with_embedded_text_measurer(Paragraph::new(
        text,
        ParagraphConfig::for_width(RENDER_WIDTH, FONT_SIZE),
    ));
    let laid_out = paragraph.layout().map_err(|e| e.to_string())?;
    let renderer = EgParagraphRenderer::new(EgRenderConfig::default());
    let mut display: MockDisplay<BinaryColor> = MockDisplay::new();
    display.set_allow_overdraw(true);
    display.set_allow_out_of_bounds_drawing(true);
    renderer
        .render_layout(&paragraph, &laid_out, &mut display, Point::zero())
        .map_err(|e| e.to_string())?;
    Ok(())
}

fn profile_text(text: &str, phase: Phase, iterations: usize) -> Result<(), String> {
    for _ in 0..iterations {
        match phase {
            Phase::Tokenize => {
                let tokens = tokenize(text, &DefaultWrapFunction);
                std::hint::black_box(tokens.len());
            }
            Phase::Layout => {
                std::hint::black_box(layout_all_widths(text)?);
            }
            Phase::Render => render_first_lines(text)?,
            Phase::Full => {
                std::hint::black_box(tokenize(text, &DefaultWrapFunction).len());
                std::hint::black_box(layout_all_widths(text)?);
                render_first_lines(text)?;
            }
        }
    }
    Ok(())
}

fn profile_file(path: &Path, phase: Phase, iterations: usize) -> Result<(), String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("read {}: {}", path.display(), e))?;
    profile_text(&text, phase, iterations).map_err(|e| format!("{}: {}", path.display(), e))
}

fn short_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

fn default_files() -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(DEFAULT_CORPUS_DIR) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("txt"))
        .collect();
    files.sort();
    files
}

fn usage() {
    eprintln!("Usage: heap-profile [OPTIONS] [MARKUP_FILES...]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --phase <tokenize|layout|render|full>  Pipeline phase to profile (default: layout)");
    eprintln!("  --out-dir <DIR>        Output directory for dhat JSON (default: target/memory)");
    eprintln!("  --iterations <N>       Repetitions per file (default: 1)");
    eprintln!("  --aggregate            Single profile for all files (default: per-file)");
    eprintln!();
    eprintln!("Each file gets its own DHAT profile in a separate process unless --aggregate");
    eprintln!("is given. Without files, profiles the .txt files in {}.", DEFAULT_CORPUS_DIR);
}

fn parse_args(args: &[String]) -> Result<Option<Options>, String> {
    let mut options = Options {
        phase: Phase::Layout,
        out_dir: PathBuf::from("target/memory"),
        iterations: 1,
        aggregate: false,
        single_file: false,
        files: Vec::new(),
    };
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--phase" => {
                i += 1;
                let name = args.get(i).ok_or("--phase expects a value")?;
                options.phase =
                    Phase::from_name(name).ok_or_else(|| format!("unknown phase: {}", name))?;
            }
            "--out-dir" => {
                i += 1;
                options.out_dir = PathBuf::from(args.get(i).ok_or("--out-dir expects a value")?);
            }
            "--iterations" => {
                i += 1;
                let value = args.get(i).ok_or("--iterations expects a value")?;
                options.iterations = value
                    .parse()
                    .map_err(|_| format!("--iterations expects a count, got {:?}", value))?;
            }
            "--aggregate" => options.aggregate = true,
            "--single-file" => options.single_file = true,
            "--help" | "-h" => return Ok(None),
            other => options.files.push(PathBuf::from(other)),
        }
        i += 1;
    }
    Ok(Some(options))
}

fn run_children(options: &Options) -> Result<(), String> {
    let self_exe =
        std::env::current_exe().map_err(|e| format!("cannot locate own executable: {}", e))?;
    let phase_name = options.phase.name();
    eprintln!(
        "heap-profile: phase={}, files={} (per-file), out={}",
        phase_name,
        options.files.len(),
        options.out_dir.display()
    );

    let mut failed = 0usize;
    for file in &options.files {
        eprintln!(
            "  profiling: {} -> dhat-{}-{}.json",
            file.display(),
            phase_name,
            short_name(file)
        );
        let status = Command::new(&self_exe)
            .arg("--single-file")
            .arg("--phase")
            .arg(phase_name)
            .arg("--iterations")
            .arg(options.iterations.to_string())
            .arg("--out-dir")
            .arg(&options.out_dir)
            .arg(file)
            .status();
        match status {
            Ok(s) if s.success() => {}
            Ok(s) => {
                eprintln!("    FAILED (exit {})", s.code().unwrap_or(-1));
                failed += 1;
            }
            Err(e) => {
                eprintln!("    FAILED to spawn: {}", e);
                failed += 1;
            }
        }
    }

    eprintln!();
    eprintln!("Open profiles from {} in https://nnethercote.github.io/dh_view/dh_view.html", options.out_dir.display());
    if failed > 0 {
        return Err(format!("{} of {} files failed", failed, options.files.len()));
    }
    Ok(())
}

fn run(mut options: Options) -> Result<(), String> {
    if options.files.is_empty() {
        options.files = default_files();
    }
    if options.files.is_empty() {
        return Err(format!(
            "no markup files given and none found in {}",
            DEFAULT_CORPUS_DIR
        ));
    }
    std::fs::create_dir_all(&options.out_dir)
        .map_err(|e| format!("create {}: {}", options.out_dir.display(), e))?;
    let phase_name = options.phase.name();

    if options.single_file {
        let [file] = options.files.as_slice() else {
            return Err("--single-file expects exactly one file".to_string());
        };
        let json_path = options
            .out_dir
            .join(format!("dhat-{}-{}.json", phase_name, short_name(file)));
        let _profiler = dhat::Profiler::builder().file_name(json_path).build();
        return profile_file(file, options.phase, options.iterations);
    }

    if options.aggregate {
        let json_path = options.out_dir.join(format!("dhat-{}.json", phase_name));
        eprintln!(
            "heap-profile: phase={}, files={} (aggregate), out={}",
            phase_name,
            options.files.len(),
            options.out_dir.display()
        );
        let _profiler = dhat::Profiler::builder()
            .file_name(json_path.clone())
            .build();
        for file in &options.files {
            eprintln!("  profiling: {}", file.display());
            profile_file(file, options.phase, options.iterations)?;
        }
        eprintln!("Done. Profile written to {}", json_path.display());
        return Ok(());
    }

    run_children(&options)
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(Some(options)) => options,
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
    match run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}
