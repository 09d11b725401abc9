use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use via_cleaner::clean::{run_clean, CancelFlag, CandidateSelection};
use via_cleaner::settings::{parse_threshold, CleanerSettings, SettingsUpdate};
use via_cleaner::{load_board, save_board};

/// Remove vias that violate clearance rules from a board document
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Board document (JSON) exported by the host editor
    board: PathBuf,

    /// Settings file; defaults are used when it does not exist
    #[arg(short, long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Minimum clearance to copper of other nets, in mm
    #[arg(long, value_name = "MM", value_parser = parse_threshold)]
    clearance: Option<f64>,

    /// Minimum clearance to the board edge, in mm
    #[arg(long, value_name = "MM", value_parser = parse_threshold)]
    edge_clearance: Option<f64>,

    /// Minimum clearance to zones of other nets, in mm
    #[arg(long, value_name = "MM", value_parser = parse_threshold)]
    zone_clearance: Option<f64>,

    #[arg(long)]
    no_components: bool,
    #[arg(long)]
    no_nets: bool,
    #[arg(long)]
    no_board_edge: bool,
    #[arg(long)]
    no_zones: bool,
    #[arg(long)]
    no_outside_board: bool,

    /// Check every via instead of only the selected ones
    #[arg(long)]
    all_vias: bool,

    /// Write the JSON report here
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Write the board without the removed vias here
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Persist the effective settings back to the settings file
    #[arg(long, requires = "settings")]
    save_settings: bool,
}

impl Args {
    fn overrides(&self) -> SettingsUpdate {
        let off = |flag: bool| if flag { Some(false) } else { None };
        SettingsUpdate {
            min_clearance_mm: self.clearance,
            board_edge_clearance_mm: self.edge_clearance,
            zone_clearance_mm: self.zone_clearance,
            check_components: off(self.no_components),
            check_nets: off(self.no_nets),
            check_board_edge: off(self.no_board_edge),
            check_zones: off(self.no_zones),
            check_outside_board: off(self.no_outside_board),
            cell_size_mm: None,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let base = match &args.settings {
        Some(path) => CleanerSettings::load_or_default(path),
        None => CleanerSettings::default(),
    };
    let settings = args.overrides().apply(&base);
    settings.validate()?;

    if args.save_settings {
        if let Some(path) = &args.settings {
            settings.save(path)?;
            log::info!("Settings saved to {}", path.display());
        }
    }

    let mut board = load_board(&args.board)?;
    let selection = if args.all_vias {
        CandidateSelection::All
    } else {
        CandidateSelection::Selected
    };

    let report = run_clean(&board, &settings, selection, &CancelFlag::new())?;
    for warning in &report.warnings {
        log::warn!("{}", warning);
    }
    println!("{}", report.summary());

    if let Some(path) = &args.report {
        let text = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        log::info!("Report written to {}", path.display());
    }

    if let Some(path) = &args.output {
        let removed = board.remove_vias(&report.removed_ids());
        save_board(&board, path)?;
        log::info!("Board with {} vias removed written to {}", removed, path.display());
    }

    Ok(())
}
