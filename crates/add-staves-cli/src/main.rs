use std::fs;
use std::path::{Path, PathBuf};

use add_staves_core::config::{A4_HEIGHT, A4_WIDTH, Grouping, MAX_STAVES, StaffPosition};
use add_staves_core::{LayoutConfig, lay_out_into};
use anyhow::Context;
use clap::{ArgAction, Parser};
use lopdf::Document;
use serde::Deserialize;
use tracing::{info, warn};

mod pdf;

use pdf::{PdfWriter, StaffCatalog};

/// Add analytical staves to a score.
///
/// Every page of SCORE is treated as one system; blank staves are added next
/// to it and the systems are packed onto DIN A4 pages. Use an external tool
/// (e.g. briss) to crop the score into systems first.
#[derive(Parser, Debug, Clone)]
#[command(name = "add-staves", version, author)]
struct Cli {
    // Input/Output
    /// Path to the cropped score
    #[arg(help_heading = "Input/Output")]
    score: PathBuf,
    /// Output file [default: <score>-analysis.pdf]
    #[arg(short, long, help_heading = "Input/Output")]
    output: Option<PathBuf>,
    /// Overwrite the default output file if it exists
    #[arg(short, long, default_value_t = false, help_heading = "Input/Output")]
    force: bool,
    /// Directory holding the empty staff pages (empty-0.pdf ... empty-6.pdf)
    /// [default: staves/ next to the executable, drawn when missing]
    #[arg(long, help_heading = "Input/Output")]
    staves_dir: Option<PathBuf>,
    /// YAML config file path (overrides layout options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,

    // Page Layout
    /// Groups of systems combined on one page, space- or comma-separated ("4 5").
    /// An empty string puts every system on a single page
    #[arg(short = 'c', long = "combining", help_heading = "Page Layout")]
    combining: Option<String>,
    /// Number of staves to add (0..6)
    #[arg(short, long, default_value_t = 2, help_heading = "Page Layout")]
    staves: u8,
    /// Put the analysis staves above the system
    #[arg(short, long, default_value_t = false, help_heading = "Page Layout")]
    above: bool,
    /// Leave space at the bottom of each page
    #[arg(long, default_value_t = false, help_heading = "Page Layout")]
    ragged: bool,
    /// Leave space at the bottom of the last page
    #[arg(long, default_value_t = true, action = ArgAction::Set, help_heading = "Page Layout")]
    ragged_last: bool,
    /// Shift the analysis staves horizontally
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true, help_heading = "Page Layout")]
    shift: f64,

    // Page Dimensions
    /// Spacing between the score system and its analysis staff
    #[arg(long, default_value_t = 20.0, help_heading = "Page Dimensions")]
    inner_spacing: f64,
    /// Spacing between two systems
    #[arg(long, default_value_t = 30.0, help_heading = "Page Dimensions")]
    outer_spacing: f64,
    /// Margin at the top of the page
    #[arg(long, default_value_t = 30.0, help_heading = "Page Dimensions")]
    top_margin: f64,
    /// Margin at the bottom of the page
    #[arg(long, default_value_t = 40.0, help_heading = "Page Dimensions")]
    bottom_margin: f64,
    /// Margin at the left side of the page
    #[arg(long, default_value_t = 20.0, help_heading = "Page Dimensions")]
    left_margin: f64,
    /// Total height of a page (defaults to DIN A4)
    #[arg(long, default_value_t = A4_HEIGHT, help_heading = "Page Dimensions")]
    page_height: f64,
    /// Total width of a page (defaults to DIN A4)
    #[arg(long, default_value_t = A4_WIDTH, help_heading = "Page Dimensions")]
    page_width: f64,

    // Behaviour
    /// Drop the first analysis staff of the first page
    #[arg(long, default_value_t = false, help_heading = "Behaviour")]
    drop_first: bool,
    /// Drop the last analysis staff of the last page
    #[arg(long, default_value_t = false, help_heading = "Behaviour")]
    drop_last: bool,
    /// Compute the layout but do not write the PDF
    #[arg(long, default_value_t = false, help_heading = "Behaviour")]
    dry_run: bool,

    // Export
    /// Export the computed placements (JSON) to this file
    #[arg(long, help_heading = "Export")]
    layout_json: Option<PathBuf>,
    /// Export layout stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,

    // Logging
    /// Show a progress bar while importing pages
    #[arg(long, default_value_t = true, action = ArgAction::Set, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(short, long, default_value_t = false, help_heading = "Logging/UX")]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    run(&cli, cli.progress && !cli.quiet)
}

fn run(cli: &Cli, show_progress: bool) -> anyhow::Result<()> {
    let base = base_config(cli)?;
    let cfg = if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)?;
        y.into_layout_config(base)?
    } else {
        base
    };

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let output = output_path(cli)?;

    let score = Document::load(&cli.score)
        .with_context(|| format!("read score {}", cli.score.display()))?;
    let catalog = match &cli.staves_dir {
        Some(dir) => StaffCatalog::new(dir),
        None => StaffCatalog::bundled(),
    };
    let staff = catalog.load(cfg.staves)?;

    let mut writer = PdfWriter::new();
    let systems = import_score_with_progress(&mut writer, score, show_progress)?;
    let staff = writer.import_staff(staff)?;
    info!(systems = systems.len(), staves = cfg.staves, "loaded score");

    let layout = lay_out_into(systems, staff, &cfg, &mut writer)?;
    let stats = layout.stats();
    info!(
        pages = stats.num_pages,
        systems = stats.num_systems,
        dropped = stats.num_dropped,
        overfull = stats.num_overfull,
        "layout"
    );
    if stats.num_overfull > 0 {
        warn!(
            pages = stats.num_overfull,
            tallest = stats.max_page_height,
            "some pages are taller than the page height"
        );
    }

    if !cli.dry_run {
        writer.save(&output)?;
        info!(?output, pages = stats.num_pages, "score written");
    }

    if let Some(path) = &cli.layout_json {
        let value = add_staves_core::to_json(&layout);
        fs::write(path, serde_json::to_string_pretty(&value)?)
            .with_context(|| format!("write {}", path.display()))?;
        info!(?path, "layout exported");
    }

    if let Some(path) = &cli.export_stats {
        fs::write(path, serde_json::to_string_pretty(&stats)?)
            .with_context(|| format!("write {}", path.display()))?;
        info!(?path, "stats exported");
    } else if cli.dry_run {
        println!("{}", stats.summary());
    }
    Ok(())
}

fn base_config(cli: &Cli) -> anyhow::Result<LayoutConfig> {
    let grouping = match &cli.combining {
        Some(text) => text.parse::<Grouping>()?,
        None => Grouping::Auto,
    };
    Ok(LayoutConfig {
        inner_spacing: cli.inner_spacing,
        outer_spacing: cli.outer_spacing,
        top_margin: cli.top_margin,
        bottom_margin: cli.bottom_margin,
        left_margin: cli.left_margin,
        page_height: cli.page_height,
        page_width: cli.page_width,
        ragged: cli.ragged,
        ragged_last: cli.ragged_last,
        shift: cli.shift,
        drop_first: cli.drop_first,
        drop_last: cli.drop_last,
        staff_position: if cli.above {
            StaffPosition::Above
        } else {
            StaffPosition::Below
        },
        staves: clamp_staves(cli.staves),
        grouping,
    })
}

fn clamp_staves(staves: u8) -> u8 {
    if staves > MAX_STAVES {
        warn!(requested = staves, used = MAX_STAVES, "too many staves requested");
    }
    staves.min(MAX_STAVES)
}

/// A dry run writes no PDF, so an existing default output is not in the way.
fn output_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    resolve_output(&cli.score, cli.output.as_deref(), cli.force || cli.dry_run)
}

/// Explicit output paths are used as given. The default path sits next to the
/// score and is only overwritten with `force`.
fn resolve_output(score: &Path, output: Option<&Path>, force: bool) -> anyhow::Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.to_path_buf());
    }
    let stem = score
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("score path {} has no file name", score.display()))?;
    let path = score.with_file_name(format!("{}-analysis.pdf", stem));
    if path.exists() && !force {
        anyhow::bail!(
            "a file at the default path '{}' already exists; pass --output or --force",
            path.display()
        );
    }
    Ok(path)
}

fn import_score_with_progress(
    writer: &mut PdfWriter,
    score: Document,
    progress: bool,
) -> anyhow::Result<Vec<add_staves_core::Block<lopdf::ObjectId>>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(score.get_pages().len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} importing {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        b.set_message("score pages");
        Some(b)
    } else {
        None
    };
    let systems = writer.import_score(score, || {
        if let Some(b) = &bar {
            b.inc(1);
        }
    });
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    systems
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
    inner_spacing: Option<f64>,
    outer_spacing: Option<f64>,
    top_margin: Option<f64>,
    bottom_margin: Option<f64>,
    left_margin: Option<f64>,
    page_height: Option<f64>,
    page_width: Option<f64>,
    ragged: Option<bool>,
    ragged_last: Option<bool>,
    shift: Option<f64>,
    drop_first: Option<bool>,
    drop_last: Option<bool>,
    staff_position: Option<String>,
    staves: Option<u8>,
    /// Same text form as `--combining`.
    combining: Option<String>,
}

impl YamlConfig {
    fn into_layout_config(self, mut cfg: LayoutConfig) -> anyhow::Result<LayoutConfig> {
        if let Some(v) = self.inner_spacing {
            cfg.inner_spacing = v;
        }
        if let Some(v) = self.outer_spacing {
            cfg.outer_spacing = v;
        }
        if let Some(v) = self.top_margin {
            cfg.top_margin = v;
        }
        if let Some(v) = self.bottom_margin {
            cfg.bottom_margin = v;
        }
        if let Some(v) = self.left_margin {
            cfg.left_margin = v;
        }
        if let Some(v) = self.page_height {
            cfg.page_height = v;
        }
        if let Some(v) = self.page_width {
            cfg.page_width = v;
        }
        if let Some(v) = self.ragged {
            cfg.ragged = v;
        }
        if let Some(v) = self.ragged_last {
            cfg.ragged_last = v;
        }
        if let Some(v) = self.shift {
            cfg.shift = v;
        }
        if let Some(v) = self.drop_first {
            cfg.drop_first = v;
        }
        if let Some(v) = self.drop_last {
            cfg.drop_last = v;
        }
        if let Some(v) = self.staff_position {
            cfg.staff_position = v
                .parse()
                .map_err(|_| anyhow::anyhow!("unknown staff_position '{}' (above|below)", v))?;
        }
        if let Some(v) = self.staves {
            cfg.staves = clamp_staves(v);
        }
        if let Some(v) = self.combining {
            cfg.grouping = v.parse()?;
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_sits_next_to_score() {
        let score = std::env::temp_dir().join("add-staves-no-such-dir/etude.pdf");
        let out = resolve_output(&score, None, false).expect("default path");
        assert_eq!(out.file_name().and_then(|s| s.to_str()), Some("etude-analysis.pdf"));
        assert_eq!(out.parent(), score.parent());
    }

    #[test]
    fn explicit_output_is_used_verbatim() {
        let out = resolve_output(Path::new("a.pdf"), Some(Path::new("b/c.pdf")), false)
            .expect("explicit path");
        assert_eq!(out, PathBuf::from("b/c.pdf"));
    }

    #[test]
    fn dry_run_ignores_existing_default_output() {
        let dir = std::env::temp_dir().join(format!("add-staves-dry-run-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("temp dir");
        fs::write(dir.join("etude-analysis.pdf"), b"%PDF-1.5").expect("existing output");
        let score = dir.join("etude.pdf");
        let score_arg = score.to_str().expect("utf-8 path");

        let cli = Cli::parse_from(["add-staves", score_arg]);
        assert!(output_path(&cli).is_err());
        let cli = Cli::parse_from(["add-staves", score_arg, "--dry-run"]);
        let out = output_path(&cli).expect("dry run path");
        assert_eq!(out, dir.join("etude-analysis.pdf"));

        fs::remove_dir_all(&dir).expect("cleanup");
    }

    #[test]
    fn yaml_overrides_cli_values() {
        let base = LayoutConfig::default();
        let y: YamlConfig = serde_yaml::from_str(
            "outer_spacing: 12\nstaff_position: above\ncombining: \"4 5\"\nstaves: 9\n",
        )
        .expect("yaml");
        let cfg = y.into_layout_config(base).expect("merge");
        assert_eq!(cfg.outer_spacing, 12.0);
        assert_eq!(cfg.staff_position, StaffPosition::Above);
        assert_eq!(cfg.grouping, Grouping::Groups(vec![4, 5]));
        assert_eq!(cfg.staves, MAX_STAVES);
        assert_eq!(cfg.inner_spacing, 20.0);
    }

    #[test]
    fn staves_are_clamped_and_combining_parsed() {
        let cli = Cli::parse_from(["add-staves", "score.pdf", "-s", "8", "-c", "3,4", "--above"]);
        let cfg = base_config(&cli).expect("config");
        assert_eq!(cfg.staves, MAX_STAVES);
        assert_eq!(cfg.grouping, Grouping::Groups(vec![3, 4]));
        assert_eq!(cfg.staff_position, StaffPosition::Above);
        assert!(cfg.ragged_last);
    }

    #[test]
    fn empty_combining_means_single_page() {
        let cli = Cli::parse_from(["add-staves", "score.pdf", "--combining", ""]);
        let cfg = base_config(&cli).expect("config");
        assert_eq!(cfg.grouping, Grouping::SinglePage);
    }
}
