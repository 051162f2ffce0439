use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use simplelog::{Config, LevelFilter, WriteLogger};

use manga_reader::enumerate::{DroppedEntry, FsEntry};
use manga_reader::i18n::Language;
use manga_reader::render::{Block, FrameSurface, SurfaceLayout};
use manga_reader::resource::BlobStore;
use manga_reader::settings::Theme;
use manga_reader::{Reader, ViewMode, settings};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// One page at a time
    Single,
    /// All pages in one column
    Vertical,
}

impl From<ModeArg> for ViewMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Single => ViewMode::Single,
            ModeArg::Vertical => ViewMode::Vertical,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ThemeArg {
    Dark,
    Light,
}

impl From<ThemeArg> for Theme {
    fn from(theme: ThemeArg) -> Self {
        match theme {
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Light => Theme::Light,
        }
    }
}

/// Load a PDF, a CBZ/ZIP archive, or a set of images and render its pages.
#[derive(Parser, Debug)]
#[command(name = "manga-reader")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Files and folders to load, as if dropped together
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Reading mode (defaults to the saved preference)
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// 1-based page to open in single mode
    #[arg(long)]
    page: Option<usize>,

    /// Laid-out container width in pixels
    #[arg(long, default_value_t = 1080.0)]
    width: f32,

    /// Horizontal padding on each side of the container
    #[arg(long, default_value_t = 0.0)]
    padding: f32,

    /// Viewport width, used when the container has no usable width
    #[arg(long)]
    viewport_width: Option<f32>,

    /// Device pixel ratio for document rasters
    #[arg(long, default_value_t = 1.0)]
    dpr: f32,

    /// Interface language: en or th
    #[arg(long)]
    language: Option<String>,

    /// Color theme (defaults to the saved preference)
    #[arg(long, value_enum)]
    theme: Option<ThemeArg>,

    /// Gaps and page tags between pages in vertical mode
    #[arg(long, conflicts_with = "no_spacing")]
    spacing: bool,

    /// Compact vertical layout without gaps or page tags
    #[arg(long)]
    no_spacing: bool,

    /// Write the rendered blocks into this directory
    #[arg(long)]
    out: Option<PathBuf>,

    /// Save mode, language, theme and spacing as the new defaults
    #[arg(long)]
    remember: bool,

    #[arg(long, default_value = "manga-reader.log")]
    log_file: PathBuf,

    /// Log at info level instead of debug
    #[arg(long)]
    quiet_log: bool,
}

fn main() -> Result<()> {
    better_panic::install();
    let args = Args::parse();

    let level = if args.quiet_log {
        LevelFilter::Info
    } else {
        LevelFilter::Debug
    };
    WriteLogger::init(
        level,
        Config::default(),
        File::create(&args.log_file)
            .with_context(|| format!("cannot create log file {}", args.log_file.display()))?,
    )?;
    info!("Starting manga-reader");

    settings::load_settings();
    let prefs = Preferences::resolve(&args);
    if args.remember {
        prefs.remember();
    }

    let layout = SurfaceLayout {
        container_width: Some(args.width),
        padding_left: args.padding,
        padding_right: args.padding,
        viewport_width: args.viewport_width,
        device_pixel_ratio: args.dpr,
    };
    let mut reader = Reader::new(FrameSurface::new(layout))
        .with_language(prefs.language)
        .with_mode(prefs.mode)
        .with_vertical_spacing(prefs.spacing);

    let entries = args
        .inputs
        .iter()
        .map(|path| FsEntry::new(path).map(|entry| Box::new(entry) as Box<dyn DroppedEntry>))
        .collect::<manga_reader::Result<Vec<_>>>();
    let entries = match entries {
        Ok(entries) => entries,
        Err(err) => {
            reader.report_failure(&err.to_string());
            eprintln!("{}", reader.status());
            return Err(err.into());
        }
    };

    let summary = match reader.accept_drop(entries) {
        Ok(summary) => summary,
        Err(err) => {
            eprintln!("{}", reader.status());
            return Err(anyhow!(err).context("load failed"));
        }
    };

    if let Some(page) = args.page.filter(|&p| p > 1) {
        let delta = isize::try_from(page - 1).context("page number too large")?;
        match reader.step_page(delta) {
            Ok(true) => {}
            Ok(false) => warn!("page {page} is out of range, staying on page 1"),
            Err(err) => warn!("page {page} failed to render: {err}"),
        }
    }

    let pager = reader.pager();
    println!("{}", reader.status());
    println!(
        "{} ({} source, {} mode, {} theme)",
        pager.indicator,
        summary.kind.as_str(),
        reader.state().mode().as_str(),
        prefs.theme.as_str()
    );

    if let Some(out) = &args.out {
        let written = export_blocks(reader.surface().blocks(), reader.blob_store(), out)?;
        println!("wrote {written} files to {}", out.display());
    }

    info!("Shutting down manga-reader");
    Ok(())
}

/// Preferences for this run: flags first, then the saved settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Preferences {
    mode: ViewMode,
    language: Language,
    theme: Theme,
    spacing: bool,
}

impl Preferences {
    fn resolve(args: &Args) -> Self {
        let spacing = if args.spacing {
            true
        } else if args.no_spacing {
            false
        } else {
            settings::is_vertical_spacing_shown()
        };
        Self {
            mode: args.mode.map(ViewMode::from).unwrap_or_else(settings::get_mode),
            language: args
                .language
                .as_deref()
                .map(Language::from_code)
                .unwrap_or_else(settings::get_language),
            theme: args.theme.map(Theme::from).unwrap_or_else(settings::get_theme),
            spacing,
        }
    }

    fn remember(&self) {
        settings::set_mode(self.mode);
        settings::set_language(self.language);
        settings::set_theme(self.theme);
        settings::set_vertical_spacing_shown(self.spacing);
    }
}

fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}

fn export_blocks(blocks: &[Block], store: &BlobStore, out: &Path) -> Result<usize> {
    fs::create_dir_all(out).with_context(|| format!("cannot create {}", out.display()))?;

    let mut written = 0;
    for (index, block) in blocks.iter().enumerate() {
        let number = index + 1;
        match block {
            Block::Raster { bitmap, .. } => {
                let image =
                    image::RgbImage::from_raw(bitmap.width, bitmap.height, bitmap.pixels.clone())
                        .ok_or_else(|| anyhow!("raster {number} has a short pixel buffer"))?;
                let path = out.join(format!("page-{number:04}.png"));
                image
                    .save(&path)
                    .with_context(|| format!("cannot write {}", path.display()))?;
            }
            Block::Image { handle, .. } | Block::Embed { handle, .. } => {
                let blob = store
                    .get(handle)
                    .ok_or_else(|| anyhow!("block {number} refers to a revoked handle"))?;
                let stem = if matches!(block, Block::Embed { .. }) {
                    "document".to_string()
                } else {
                    format!("page-{number:04}")
                };
                let path = out.join(format!("{stem}.{}", extension_for_mime(&blob.mime)));
                fs::write(&path, &blob.bytes)
                    .with_context(|| format!("cannot write {}", path.display()))?;
            }
            Block::Placeholder { message } => {
                println!("{message}");
                continue;
            }
        }
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(flags: &[&str]) -> Args {
        let argv = ["manga-reader", "vol1.cbz"].iter().chain(flags);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flags_override_saved_preferences() {
        let prefs = Preferences::resolve(&parse(&[
            "--mode",
            "vertical",
            "--theme",
            "light",
            "--language",
            "th",
        ]));
        assert_eq!(prefs.mode, ViewMode::Vertical);
        assert_eq!(prefs.theme, Theme::Light);
        assert_eq!(prefs.language, Language::Th);
    }

    #[test]
    fn test_missing_flags_read_settings() {
        let prefs = Preferences::resolve(&parse(&[]));
        assert_eq!(prefs.mode, settings::get_mode());
        assert_eq!(prefs.theme, settings::get_theme());
        assert_eq!(prefs.spacing, settings::is_vertical_spacing_shown());
    }

    #[test]
    fn test_spacing_can_be_turned_back_on() {
        assert!(Preferences::resolve(&parse(&["--spacing"])).spacing);
        assert!(!Preferences::resolve(&parse(&["--no-spacing"])).spacing);
        let both = ["manga-reader", "vol1.cbz", "--spacing", "--no-spacing"];
        assert!(Args::try_parse_from(both).is_err());
    }
}
