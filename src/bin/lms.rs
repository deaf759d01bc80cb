use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use lms_automation::{
    Aspect, CodecFormat, Frame, GapPolicy, LedsCodec, LmsConfig, Pattern, PatternCodec,
    create_codec_with, detect_format, frames_digest, simulate_with,
};

#[derive(Parser, Debug)]
#[command(name = "lms", version, about = "Inspect, convert and preview LED matrix patterns")]
struct Cli {
    /// JSON settings file (simulation bound, inference hints, HEX options).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print metadata, timing and the automation queue summary.
    Inspect(InspectArgs),
    /// Re-encode a pattern in another format.
    Convert(ConvertArgs),
    /// Simulate the stored automation queue and write one PNG per frame.
    Preview(PreviewArgs),
}

#[derive(Parser, Debug)]
struct InputArgs {
    /// Input pattern file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Input format; detected from the extension and content when omitted.
    #[arg(long)]
    from: Option<CodecFormat>,

    /// Matrix shape hint for headerless payloads, e.g. `16x8`.
    #[arg(long)]
    aspect: Option<Aspect>,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    #[command(flatten)]
    input: InputArgs,
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output file.
    #[arg(long)]
    out: PathBuf,

    /// Output format; taken from the output extension when omitted.
    #[arg(long)]
    to: Option<CodecFormat>,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output directory for `frame_NNNNN.png` files.
    #[arg(long)]
    out: PathBuf,

    /// Override the configured preview frame bound.
    #[arg(long)]
    max_frames: Option<u64>,

    /// `duplicate_last` or `drop`.
    #[arg(long)]
    gap_policy: Option<GapPolicy>,

    /// Output pixels per LED.
    #[arg(long, default_value_t = 8)]
    scale: u32,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => LmsConfig::load(path)?,
        None => LmsConfig::default(),
    };
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(&cfg, args),
        Command::Convert(args) => cmd_convert(&cfg, args),
        Command::Preview(args) => cmd_preview(cfg, args),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lms_automation=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_pattern(cfg: &LmsConfig, input: &InputArgs) -> anyhow::Result<(CodecFormat, Pattern)> {
    let path = &input.in_path;
    let bytes = std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?;
    let format = input
        .from
        .unwrap_or_else(|| detect_format(&bytes, path.file_name().and_then(|n| n.to_str())));

    let mut hint = cfg.inference.clone();
    if let Some(a) = input.aspect {
        hint.aspect = Some(a);
    }
    let decoded = create_codec_with(format, &cfg.hex)
        .decode(&bytes, &hint)
        .with_context(|| format!("decode '{}' as {format}", path.display()))?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("pattern");
    let pattern = decoded
        .into_pattern(stem)
        .with_context(|| format!("load pattern from '{}'", path.display()))?;
    Ok((format, pattern))
}

fn cmd_inspect(cfg: &LmsConfig, args: InspectArgs) -> anyhow::Result<()> {
    let (format, p) = read_pattern(cfg, &args.input)?;
    let m = &p.metadata;
    println!("name:        {}", p.name);
    println!("format:      {format}");
    println!("size:        {}x{} ({} LEDs)", m.width, m.height, m.led_count());
    println!("frames:      {}", m.frame_count);
    println!("duration:    {} ms", p.duration_ms());
    println!("color order: {}", m.color_order.as_str());
    println!("wiring:      {}", m.wiring.as_str());
    println!("data in:     {}", m.data_in_corner.as_str());
    println!("digest:      {:016x}", frames_digest(&p.frames));
    match &p.lms_pattern_instructions {
        Some(seq) => {
            let summary = serde_json::to_string_pretty(&seq.summarize())
                .context("serialize sequence summary")?;
            println!("sequence:    {summary}");
            for (i, item) in seq.iter().enumerate() {
                let (src, code, layer2, mask, repeat) = item.to_legacy_tuple();
                println!(
                    "  {:>3}. {src} {code} layer2={layer2} mask={mask} repeat={repeat} gap={}",
                    i + 1,
                    item.instruction.gap()
                );
            }
        }
        None => println!("sequence:    none"),
    }
    Ok(())
}

fn cmd_convert(cfg: &LmsConfig, args: ConvertArgs) -> anyhow::Result<()> {
    let (_, pattern) = read_pattern(cfg, &args.input)?;
    let target = match args.to {
        Some(f) => f,
        None => args
            .out
            .extension()
            .and_then(|e| e.to_str())
            .and_then(CodecFormat::from_extension)
            .with_context(|| {
                format!("cannot tell output format from '{}'; pass --to", args.out.display())
            })?,
    };
    let codec: Box<dyn PatternCodec> = match target {
        CodecFormat::Leds => Box::new(LedsCodec::with_name(pattern.name.clone())),
        other => create_codec_with(other, &cfg.hex),
    };
    let bytes = codec
        .encode(
            &pattern.metadata,
            pattern.lms_pattern_instructions.as_ref(),
            Some(&pattern.frames),
        )
        .with_context(|| format!("encode as {target}"))?;
    ensure_parent(&args.out)?;
    std::fs::write(&args.out, bytes).with_context(|| format!("write '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_preview(mut cfg: LmsConfig, args: PreviewArgs) -> anyhow::Result<()> {
    if let Some(n) = args.max_frames {
        cfg.simulation.max_frames = n;
    }
    if let Some(g) = args.gap_policy {
        cfg.simulation.gap_policy = g;
    }
    if args.scale == 0 {
        anyhow::bail!("--scale must be > 0");
    }
    let (_, pattern) = read_pattern(&cfg, &args.input)?;
    let seq = pattern
        .lms_pattern_instructions
        .as_ref()
        .context("pattern has no automation queue to preview")?;
    let frames = simulate_with(&pattern, seq, &cfg.simulation)?;

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;
    let (w, h) = (pattern.metadata.width, pattern.metadata.height);
    for (i, frame) in frames.iter().enumerate() {
        let path = args.out.join(format!("frame_{i:05}.png"));
        let buf = upscale(frame, w, args.scale);
        image::save_buffer_with_format(
            &path,
            &buf,
            w * args.scale,
            h * args.scale,
            image::ColorType::Rgb8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
    }
    eprintln!("wrote {} frames to {}", frames.len(), args.out.display());
    Ok(())
}

/// Nearest-neighbour RGB8 buffer with `scale`x`scale` pixels per LED.
fn upscale(frame: &Frame, width: u32, scale: u32) -> Vec<u8> {
    let (width, scale) = (width as usize, scale as usize);
    let mut out = Vec::with_capacity(frame.pixels.len() * scale * scale * 3);
    for row in frame.pixels.chunks(width) {
        let mut line = Vec::with_capacity(width * scale * 3);
        for px in row {
            for _ in 0..scale {
                line.extend_from_slice(&[px.r, px.g, px.b]);
            }
        }
        for _ in 0..scale {
            out.extend_from_slice(&line);
        }
    }
    out
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}
