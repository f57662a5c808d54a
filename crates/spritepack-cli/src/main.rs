use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::{ArgAction, Args, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use image::ImageReader;
use serde::Deserialize;
use spritepack_core::prelude::*;
use spritepack_core::to_json_hash;
use tracing::{error, info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "spritepack",
    about = "Rebuild sprite atlases incrementally",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack images into an atlas, keeping sprites of the existing atlas that are not re-supplied
    Rebuild(RebuildArgs),
    /// Write one sprite of a saved atlas to a PNG
    Extract(ExtractArgs),
    /// Print the sprite table and occupancy of a saved atlas
    Inspect(AtlasArgs),
}

#[derive(Args, Debug, Clone)]
struct AtlasArgs {
    /// Directory holding the atlas
    #[arg(short = 'd', long, default_value = "out", help_heading = "Atlas")]
    out_dir: PathBuf,
    /// Atlas base name (files are name.png/.json)
    #[arg(short, long, default_value = "atlas", help_heading = "Atlas")]
    name: String,
}

impl AtlasArgs {
    fn png_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}.png", self.name))
    }
    fn json_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}.json", self.name))
    }
}

#[derive(Parser, Debug, Clone)]
struct RebuildArgs {
    // Input/Output
    /// Input files or directories
    #[arg(required = true, help_heading = "Input/Output")]
    inputs: Vec<PathBuf>,
    #[command(flatten)]
    atlas: AtlasArgs,
    /// YAML config file path (CLI options override it)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,
    /// Ignore the existing atlas and pack only the inputs
    #[arg(long, default_value_t = false, help_heading = "Input/Output")]
    fresh: bool,

    // Layout
    /// Padding between sprites (0..=10)
    #[arg(long, help_heading = "Layout")]
    padding: Option<u32>,
    /// Maximum atlas width/height
    #[arg(long, help_heading = "Layout")]
    max_size: Option<u32>,
    /// Keep the atlas square
    #[arg(long, help_heading = "Layout")]
    force_square: Option<bool>,
    /// Start from the previous atlas size instead of the smallest guess
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    reuse_size: bool,
    /// MaxRects heuristic: baf|bssf|blsf|bl|cp
    #[arg(long, help_heading = "Layout")]
    heuristic: Option<String>,

    // Atlas settings
    /// Pixels per unit stored with the atlas
    #[arg(long, help_heading = "Settings")]
    pixels_per_unit: Option<f32>,
    /// Filter mode stored with the atlas: point|bilinear|trilinear
    #[arg(long, help_heading = "Settings")]
    filter_mode: Option<String>,

    // Export
    /// Also write a TexturePacker-style JSON hash to this file
    #[arg(long, help_heading = "Export")]
    json_hash: Option<PathBuf>,
    /// Print the merged configuration and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: rebuild and report but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct ExtractArgs {
    #[command(flatten)]
    atlas: AtlasArgs,
    /// Sprite name
    #[arg(long)]
    sprite: String,
    /// Output PNG path (defaults to <sprite>.png)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Rebuild(args) => run_rebuild(args, cli.progress && !cli.quiet),
        Commands::Extract(args) => run_extract(args),
        Commands::Inspect(args) => run_inspect(args),
    }
}

fn run_rebuild(cli: &RebuildArgs, show_progress: bool) -> anyhow::Result<()> {
    let existing = if cli.fresh {
        None
    } else {
        load_atlas(&cli.atlas)?
    };

    let cfg = build_config(cli, existing.as_ref())?;
    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let mut paths = Vec::new();
    for input in &cli.inputs {
        paths.extend(gather_paths(input, &cli.include, &cli.exclude)?);
    }
    let sources = load_sources(&paths, show_progress);
    info!(count = sources.len(), "loaded source images");

    let rebuilder = AtlasRebuilder::new(cfg)?;
    let RebuildOutput { outcome, report } = rebuilder
        .rebuild(existing.as_ref(), sources)
        .context("rebuild failed, atlas left unchanged")?;

    for w in &report.warnings {
        warn!("{}", w);
    }
    info!(
        replaced = report.replaced.len(),
        added = report.added.len(),
        preserved = report.preserved.len(),
        dropped = report.dropped.len(),
        attempts = report.attempts,
        "rebuild report"
    );

    match outcome {
        RebuildOutcome::Deleted(_) => {
            info!(name = %cli.atlas.name, "no sprites left, deleting atlas");
            if !cli.dry_run {
                remove_if_exists(&cli.atlas.png_path())?;
                remove_if_exists(&cli.atlas.json_path())?;
            }
        }
        RebuildOutcome::Success(atlas) => {
            let stats = atlas.stats();
            info!(
                sprites = stats.num_sprites,
                width = stats.width,
                height = stats.height,
                occupancy = %format!("{:.2}%", stats.occupancy * 100.0),
                "stats"
            );
            if !cli.dry_run {
                save_atlas(&cli.atlas, &atlas)?;
                if let Some(path) = &cli.json_hash {
                    let json = serde_json::to_string_pretty(&to_json_hash(&atlas))?;
                    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
                    info!(?path, "json hash written");
                }
            }
        }
    }
    Ok(())
}

fn run_extract(args: &ExtractArgs) -> anyhow::Result<()> {
    let atlas = load_atlas(&args.atlas)?
        .ok_or_else(|| anyhow!("no atlas at {}", args.atlas.json_path().display()))?;
    let sprite = atlas
        .sprite(&args.sprite)
        .ok_or_else(|| anyhow!("sprite '{}' not found in atlas", args.sprite))?;
    let pixels = extract_region(atlas.texture(), sprite.rect)
        .ok_or_else(|| anyhow!("sprite '{}' has an empty region", args.sprite))?;
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}.png", args.sprite)));
    pixels
        .to_rgba_image()
        .save(&path)
        .with_context(|| format!("write {}", path.display()))?;
    info!(?path, w = pixels.width(), h = pixels.height(), "sprite extracted");
    Ok(())
}

fn run_inspect(args: &AtlasArgs) -> anyhow::Result<()> {
    let atlas =
        load_atlas(args)?.ok_or_else(|| anyhow!("no atlas at {}", args.json_path().display()))?;
    for s in &atlas.sprites {
        println!(
            "{:<32} {:>5},{:<5} {:>5}x{:<5} {}",
            s.name,
            s.rect.x,
            s.rect.y,
            s.rect.w,
            s.rect.h,
            s.guid.as_deref().unwrap_or("-")
        );
    }
    println!("{}", atlas.stats().summary());
    Ok(())
}

/// Loads `name.json` + `name.png`; `Ok(None)` when no sprite table exists.
fn load_atlas(args: &AtlasArgs) -> anyhow::Result<Option<Atlas>> {
    let json_path = args.json_path();
    if !json_path.is_file() {
        return Ok(None);
    }
    let text = fs::read_to_string(&json_path)
        .with_context(|| format!("read {}", json_path.display()))?;
    let table = SpriteTable::from_json_str(&text)
        .with_context(|| format!("parse {}", json_path.display()))?;

    let png_path = args.png_path();
    let texture = if table.width == 0 || table.height == 0 {
        PixelBuffer::empty()
    } else {
        let img = ImageReader::open(&png_path)
            .with_context(|| format!("open {}", png_path.display()))?
            .with_guessed_format()?
            .decode()
            .with_context(|| format!("decode {}", png_path.display()))?;
        PixelBuffer::from_rgba_image(&img.to_rgba8())
    };
    let atlas = table.into_atlas(texture)?;
    info!(?json_path, sprites = atlas.sprites.len(), "loaded existing atlas");
    Ok(Some(atlas))
}

fn save_atlas(args: &AtlasArgs, atlas: &Atlas) -> anyhow::Result<()> {
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create out_dir {}", args.out_dir.display()))?;
    let png_path = args.png_path();
    atlas
        .texture()
        .to_rgba_image()
        .save(&png_path)
        .with_context(|| format!("write {}", png_path.display()))?;
    let json_path = args.json_path();
    let json = SpriteTable::from_atlas(atlas).to_json_string()?;
    fs::write(&json_path, json).with_context(|| format!("write {}", json_path.display()))?;
    info!(?png_path, ?json_path, "atlas written");
    Ok(())
}

fn remove_if_exists(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("remove {}", path.display()))?;
        info!(?path, "removed");
    }
    Ok(())
}

/// Defaults, then the existing atlas settings, then the YAML file, then CLI flags.
fn build_config(cli: &RebuildArgs, existing: Option<&Atlas>) -> anyhow::Result<RebuildConfig> {
    let mut cfg = RebuildConfig::default();
    if let Some(atlas) = existing {
        cfg.settings = atlas.settings;
    }
    if let Some(path) = &cli.config {
        let file = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)?;
        cfg = y.into_rebuild_config(cfg)?;
    }
    if let Some(v) = cli.padding {
        cfg.settings.padding = v;
    }
    if let Some(v) = cli.max_size {
        cfg.max_size = v;
    }
    if let Some(v) = cli.force_square {
        cfg.settings.force_square = v;
    }
    if cli.reuse_size {
        cfg.reuse_size_hint = true;
    }
    if let Some(v) = &cli.heuristic {
        cfg.heuristic = parse_heuristic(v)?;
    }
    if let Some(v) = cli.pixels_per_unit {
        cfg.settings.pixels_per_unit = v;
    }
    if let Some(v) = &cli.filter_mode {
        cfg.settings.filter_mode = parse_filter_mode(v)?;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn parse_heuristic(s: &str) -> anyhow::Result<MaxRectsHeuristic> {
    s.parse().map_err(|_| anyhow!("unknown heuristic: {}", s))
}

fn parse_filter_mode(s: &str) -> anyhow::Result<FilterMode> {
    s.parse().map_err(|_| anyhow!("unknown filter mode: {}", s))
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    let inc_set = build_globset(include)?;
    let exc_set = build_globset(exclude)?;
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        for entry in WalkDir::new(path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }
    Ok(list)
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat)?);
    }
    Ok(Some(b.build()?))
}

fn should_skip(p: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if let Some(ex) = exclude {
        if ex.is_match(&s) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(&s) {
            return true;
        }
    }
    false
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp" | "tga" | "gif")
    )
}

/// Decodes every path into a source sprite named after the file stem.
/// Undecodable files are logged and kept as sprites without pixels.
fn load_sources(paths: &[PathBuf], progress: bool) -> Vec<SourceSprite> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = progress.then(|| {
        let b = ProgressBar::new(paths.len() as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        ) {
            b.set_style(style);
        }
        b
    });
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let name = p
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        if let Some(b) = &bar {
            b.set_message(name.clone());
        }
        let image = match load_image(p) {
            Ok(img) => Some(img),
            Err(e) => {
                error!(?p, error = %e, "skip image");
                None
            }
        };
        list.push(SourceSprite {
            name,
            guid: None,
            image,
        });
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    list
}

fn load_image(p: &Path) -> anyhow::Result<PixelBuffer> {
    let img = ImageReader::open(p)?.with_guessed_format()?.decode()?;
    Ok(PixelBuffer::from_rgba_image(&img.to_rgba8()))
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    padding: Option<u32>,
    pixels_per_unit: Option<f32>,
    filter_mode: Option<String>,
    force_square: Option<bool>,
    max_size: Option<u32>,
    heuristic: Option<String>,
    reuse_size_hint: Option<bool>,
}

impl YamlConfig {
    fn into_rebuild_config(self, mut cfg: RebuildConfig) -> anyhow::Result<RebuildConfig> {
        if let Some(v) = self.padding {
            cfg.settings.padding = v;
        }
        if let Some(v) = self.pixels_per_unit {
            cfg.settings.pixels_per_unit = v;
        }
        if let Some(v) = self.filter_mode {
            cfg.settings.filter_mode = parse_filter_mode(&v)?;
        }
        if let Some(v) = self.force_square {
            cfg.settings.force_square = v;
        }
        if let Some(v) = self.max_size {
            cfg.max_size = v;
        }
        if let Some(v) = self.heuristic {
            cfg.heuristic = parse_heuristic(&v)?;
        }
        if let Some(v) = self.reuse_size_hint {
            cfg.reuse_size_hint = v;
        }
        Ok(cfg)
    }
}
