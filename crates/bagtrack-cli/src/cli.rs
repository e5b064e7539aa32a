use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "bagtrack")]
#[command(bin_name = "bagtrack")]
#[command(version)]
#[command(about = "Track sold bags, revealed chases and the live hit ratio of a bag break")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[arg(long, global = true, help = "Write a diagnostics log file for this run")]
    pub diagnostics: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Show the grid, remaining counts and hit ratio")]
    Status,
    #[command(about = "Cycle a slot: open -> sold -> chase -> open")]
    Toggle { slot: u32 },
    #[command(about = "Add or remove bags (negative to remove)")]
    Bags {
        #[arg(allow_negative_numbers = true)]
        delta: i32,
    },
    #[command(about = "Add or remove chases (negative to remove)")]
    Chases {
        #[arg(allow_negative_numbers = true)]
        delta: i32,
    },
    #[command(about = "Reserve a bag for a queued buyer or release a reservation")]
    Queue {
        #[arg(value_enum)]
        action: QueueAction,
    },
    #[command(about = "Odds of pulling chases from the remaining bags")]
    Odds {
        #[arg(long, requires = "wanted", help = "Number of bags to draw")]
        drawn: Option<u32>,
        #[arg(long, requires = "drawn", help = "Exact number of chases wanted")]
        wanted: Option<u32>,
    },
    #[command(about = "Adjust display preferences")]
    Prefs(PrefsArgs),
    #[command(about = "Show storage usage against the budget")]
    Storage,
    #[command(about = "Clear all tracked state and feature data")]
    Reset {
        #[arg(long, help = "Confirm the reset")]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QueueAction {
    Add,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

#[derive(Debug, Args)]
pub struct PrefsArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub mark_size: Option<i32>,
    #[arg(long, allow_negative_numbers = true)]
    pub font: Option<i32>,
    #[arg(long, allow_negative_numbers = true)]
    pub stats_font: Option<i32>,
    #[arg(long, allow_negative_numbers = true)]
    pub shimmer: Option<i32>,
    #[arg(long, value_enum)]
    pub stone: Option<Switch>,
}
