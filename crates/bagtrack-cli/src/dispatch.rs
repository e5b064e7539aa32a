use anyhow::{Result, bail};
use bagtrack_app::{App, Applied, OddsRow, Session};
use bagtrack_core::mutator::QueueAdjustment;
use bagtrack_core::persistence::StorageUsage;
use bagtrack_core::prefs::PreferenceChange;
use bagtrack_core::probability::ProbabilityQuery;
use bagtrack_core::ratio::DerivedRatios;
use bagtrack_core::state::{BagState, SlotMark};
use comfy_table::{Cell, ContentArrangement, Table};

use crate::cli::{Cli, Command, PrefsArgs, QueueAction, Switch};

const GRID_COLUMNS: usize = 10;

pub fn run_with_deps(cli: Cli, app: &App<'_>) -> Result<()> {
    let mut session = app.open();
    if let Some(notice) = session.startup_notice() {
        eprintln!("warning: stored state was discarded, starting fresh: {notice}");
    }

    match cli.command {
        Command::Status => {
            print_status(&session);
            Ok(())
        }
        Command::Toggle { slot } => {
            let applied = session.toggle_slot(slot)?;
            println!("slot {slot}: {}", mark_label(applied.value));
            finish(&session, &applied);
            Ok(())
        }
        Command::Bags { delta } => {
            let applied = session.change_bag_count(delta)?;
            println!("bags: {}", applied.value);
            finish(&session, &applied);
            Ok(())
        }
        Command::Chases { delta } => {
            let applied = session.change_chase_count(delta)?;
            println!("chases: {}", applied.value);
            finish(&session, &applied);
            Ok(())
        }
        Command::Queue { action } => {
            let adjustment = match action {
                QueueAction::Add => QueueAdjustment::Reserve,
                QueueAction::Release => QueueAdjustment::Release,
            };
            let applied = session.change_queue(adjustment);
            println!("queue: {}", applied.value);
            finish(&session, &applied);
            Ok(())
        }
        Command::Odds { drawn, wanted } => {
            run_odds_command(&session, drawn.zip(wanted));
            Ok(())
        }
        Command::Prefs(args) => run_prefs_command(&mut session, args),
        Command::Storage => {
            let usage = session.storage_usage()?;
            print_storage_usage(&usage);
            Ok(())
        }
        Command::Reset { yes } => run_reset_command(&mut session, yes),
    }
}

fn run_odds_command(session: &Session<'_>, query: Option<(u32, u32)>) {
    let population = session.population();
    println!(
        "{} bags left, {} chases left",
        population.bags, population.chases
    );

    let rows = match query {
        Some((drawn, wanted)) => vec![session.odds(ProbabilityQuery::new(drawn, wanted))],
        None => session.canonical_odds(),
    };
    print_odds(&rows);
}

fn run_prefs_command(session: &mut Session<'_>, args: PrefsArgs) -> Result<()> {
    let change = PreferenceChange {
        mark_size: args.mark_size,
        font_size_level: args.font,
        stats_font_size_level: args.stats_font,
        shimmer_level: args.shimmer,
        use_stone_style: args.stone.map(|value| value == Switch::On),
    };

    let preferences = if change.is_empty() {
        *session.state().preferences()
    } else {
        let applied = session.change_preferences(change);
        warn_if_unsaved(&applied);
        applied.value
    };

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Preference", "Value"]);
    table.add_row(vec![Cell::new("mark size"), Cell::new(preferences.mark_size)]);
    table.add_row(vec![
        Cell::new("font size level"),
        Cell::new(preferences.font_size_level),
    ]);
    table.add_row(vec![
        Cell::new("stats font size level"),
        Cell::new(preferences.stats_font_size_level),
    ]);
    table.add_row(vec![
        Cell::new("shimmer level"),
        Cell::new(preferences.shimmer_level),
    ]);
    table.add_row(vec![
        Cell::new("stone style"),
        Cell::new(if preferences.use_stone_style { "on" } else { "off" }),
    ]);
    println!("{table}");
    Ok(())
}

fn run_reset_command(session: &mut Session<'_>, confirmed: bool) -> Result<()> {
    if !confirmed {
        bail!("reset clears every sold slot, chase and stored image; rerun with --yes to confirm");
    }

    let report = session.reset_to_defaults();
    for failure in &report.failures {
        eprintln!("warning: could not clear {failure}");
    }
    println!(
        "reset to {} bags and {} chases",
        session.state().bag_count(),
        session.state().chase_count()
    );
    Ok(())
}

fn finish<T>(session: &Session<'_>, applied: &Applied<T>) {
    warn_if_unsaved(applied);
    print_summary(session.state(), &applied.ratios);
}

fn warn_if_unsaved<T>(applied: &Applied<T>) {
    if let Some(error) = &applied.save_warning {
        eprintln!("warning: change applied but not saved: {error}");
    }
}

fn mark_label(mark: SlotMark) -> &'static str {
    match mark {
        SlotMark::Open => "open",
        SlotMark::Sold => "sold",
        SlotMark::Chase => "chase",
    }
}

fn print_status(session: &Session<'_>) {
    let state = session.state();
    let flash = session.active_flash();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let numbers: Vec<u32> = state.numbers().collect();
    for row in numbers.chunks(GRID_COLUMNS) {
        table.add_row(row.iter().map(|slot| {
            let mark = match state.mark_of(*slot) {
                SlotMark::Open => "",
                SlotMark::Sold => " x",
                SlotMark::Chase => " C",
            };
            let flashed = if flash == Some(*slot) { "*" } else { "" };
            Cell::new(format!("{slot}{mark}{flashed}"))
        }));
    }

    println!("{table}");
    print_summary(state, &session.derived_ratios());
}

fn print_summary(state: &BagState, ratios: &DerivedRatios) {
    println!(
        "Chases: {} left of {}",
        ratios.remaining_chases,
        state.chase_count()
    );
    println!(
        "Bags: {} left (queue {})",
        ratios.remaining_bags,
        state.queue_count()
    );
    println!("Hit ratio: {}%", ratios.hit_ratio_label());
    if ratios.cooked {
        println!("Cooked: every chase has been pulled");
    }
}

fn print_odds(rows: &[OddsRow]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Chases", "Bags drawn", "Probability"]);

    for row in rows {
        table.add_row(vec![
            Cell::new(row.query.chases_wanted),
            Cell::new(row.query.bags_drawn),
            Cell::new(format!("{}%", row.label)),
        ]);
    }

    println!("{table}");
}

fn print_storage_usage(usage: &StorageUsage) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Key", "Bytes"]);

    for entry in &usage.breakdown {
        table.add_row(vec![Cell::new(entry.key.as_str()), Cell::new(entry.bytes)]);
    }

    println!("{table}");
    println!(
        "{} of {} bytes used, {} remaining",
        usage.total_bytes,
        usage.budget_bytes,
        usage.remaining_bytes()
    );
    if usage.near_limit() {
        println!("Storage is nearly full: new images will only be kept for this session");
    }
}
