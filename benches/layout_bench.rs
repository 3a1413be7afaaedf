use std::alloc::{GlobalAlloc, Layout, System};
use std::hint::black_box;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use markup_flow::{tokenize, DefaultWrapFunction, Paragraph, ParagraphConfig};
use markup_flow_embedded_graphics::{
    with_embedded_text_measurer, EgParagraphRenderer, EgRenderConfig,
};

const WIDTHS: &[f32] = &[240.0, 480.0];
const FONT_SIZE: f32 = 12.0;

const PROSE: &str = "It was the best of times, it was the worst of times, it was \
the age of wisdom, it was the age of foolishness, it was the epoch of belief, it \
was the epoch of incredulity, it was the season of Light, it was the season of \
Darkness, it was the spring of hope, it was the winter of despair. ";

const MARKUP: &str = "<p>The <b>quick</b> brown fox <i>jumps</i> over the lazy \
dog.</p> <ul><li>first bullet with a few words</li><li>second bullet that runs \
long enough to wrap onto another line</li></ul> <ol><li>one</li><li>two</li>\
<li>three</li></ol> Trailing text after the lists.<br>";

const LONG_WORDS: &str = "Antidisestablishmentarianism \
Floccinaucinihilipilification Supercalifragilisticexpialidocious ";

static LIVE_BYTES: AtomicUsize = AtomicUsize::new(0);
static PEAK_BYTES: AtomicUsize = AtomicUsize::new(0);

struct TrackingAllocator;

#[global_allocator]
static GLOBAL_ALLOCATOR: TrackingAllocator = TrackingAllocator;

fn on_alloc(bytes: usize) {
    let live = LIVE_BYTES.fetch_add(bytes, Ordering::Relaxed) + bytes;
    PEAK_BYTES.fetch_max(live, Ordering::Relaxed);
}

fn on_dealloc(bytes: usize) {
    let _ = LIVE_BYTES.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |live| {
        Some(live.saturating_sub(bytes))
    });
}

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            on_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        on_dealloc(layout.size());
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            on_alloc(layout.size());
        }
        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            on_dealloc(layout.size());
            on_alloc(new_size);
        }
        new_ptr
    }
}

/// Draw target that only counts pixels; keeps render timing free of
/// framebuffer cost.
struct CountingDisplay {
    size: Size,
    pixels: usize,
}

impl OriginDimensions for CountingDisplay {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for CountingDisplay {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.pixels += pixels.into_iter().count();
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
struct Summary<T> {
    min: T,
    median: T,
    p90: T,
    max: T,
}

fn summarize<T: Copy + Ord>(samples: &mut [T]) -> Summary<T> {
    samples.sort_unstable();
    let at = |q: f64| samples[((samples.len() - 1) as f64 * q).round() as usize];
    Summary {
        min: samples[0],
        median: at(0.5),
        p90: at(0.9),
        max: samples[samples.len() - 1],
    }
}

struct CaseResult {
    input: &'static str,
    case: String,
    iterations: usize,
    time_ns: Summary<u128>,
    peak_heap: Summary<usize>,
}

struct Runner {
    warmup: usize,
    iterations: usize,
    results: Vec<CaseResult>,
}

impl Runner {
    fn run<F>(&mut self, input: &'static str, case: String, mut op: F)
    where
        F: FnMut() -> usize,
    {
        for _ in 0..self.warmup {
            black_box(op());
        }
        let mut times = Vec::with_capacity(self.iterations);
        let mut peaks = Vec::with_capacity(self.iterations);
        for _ in 0..self.iterations {
            let baseline = LIVE_BYTES.load(Ordering::Relaxed);
            PEAK_BYTES.store(baseline, Ordering::Relaxed);
            let start = Instant::now();
            black_box(op());
            times.push(start.elapsed().as_nanos());
            peaks.push(PEAK_BYTES.load(Ordering::Relaxed).saturating_sub(baseline));
        }
        self.results.push(CaseResult {
            input,
            case,
            iterations: self.iterations,
            time_ns: summarize(&mut times),
            peak_heap: summarize(&mut peaks),
        });
    }
}

fn repeated(unit: &str, copies: usize) -> String {
    unit.repeat(copies)
}

fn main() {
    let quick = std::env::args().any(|arg| arg == "--quick");
    let copies = if quick { 8 } else { 64 };
    let mut runner = Runner {
        warmup: if quick { 1 } else { 3 },
        iterations: if quick { 5 } else { 25 },
        results: Vec::new(),
    };

    println!("# markup-flow layout benchmark");
    println!(
        "# mode={} warmup={} iterations={} copies={}",
        if quick { "quick" } else { "full" },
        runner.warmup,
        runner.iterations,
        copies
    );

    let inputs: [(&'static str, String); 3] = [
        ("prose", repeated(PROSE, copies)),
        ("markup", repeated(MARKUP, copies)),
        ("long_words", repeated(LONG_WORDS, copies)),
    ];

    for (name, text) in &inputs {
        let name = *name;
        runner.run(name, "tokenize".to_string(), || {
            tokenize(text, &DefaultWrapFunction).len()
        });

        for &width in WIDTHS {
            let heuristic = Paragraph::new(text.as_str(), ParagraphConfig::for_width(width, FONT_SIZE));
            runner.run(name, format!("layout_heuristic_w{}", width), || {
                heuristic.layout().map(|l| l.line_count()).unwrap_or(0)
            });

            let mono = with_embedded_text_measurer(Paragraph::new(
                text.as_str(),
                ParagraphConfig::for_width(width, FONT_SIZE),
            ));
            runner.run(name, format!("layout_mono_w{}", width), || {
                mono.layout().map(|l| l.line_count()).unwrap_or(0)
            });

            let renderer = EgParagraphRenderer::new(EgRenderConfig::default());
            runner.run(name, format!("layout_render_mono_w{}", width), || {
                let mut display = CountingDisplay {
                    size: Size::new(width as u32, 100_000),
                    pixels: 0,
                };
                match renderer.render(&mono, &mut display, Point::zero()) {
                    Ok(_) => display.pixels,
                    Err(_) => 0,
                }
            });
        }
    }

    println!(
        "input,case,iterations,min_ns,median_ns,p90_ns,max_ns,min_peak_heap_bytes,median_peak_heap_bytes,p90_peak_heap_bytes,max_peak_heap_bytes"
    );
    for r in &runner.results {
        println!(
            "{},{},{},{},{},{},{},{},{},{},{}",
            r.input,
            r.case,
            r.iterations,
            r.time_ns.min,
            r.time_ns.median,
            r.time_ns.p90,
            r.time_ns.max,
            r.peak_heap.min,
            r.peak_heap.median,
            r.peak_heap.p90,
            r.peak_heap.max
        );
    }
}
