//! CLI for bellsim: correlation estimates rebuilt from detection counts.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bellsim")]
#[command(about = "bellsim: rebuild cos(2Δφ) from two-channel detection counts")]
#[command(version = bellsim_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the correlation at one pair of angles and show the
    /// intermediate squared amplitudes and signs.
    Estimate {
        /// Channel 1 angle in degrees
        #[arg(long, allow_hyphen_values = true)]
        phi1_deg: f64,

        /// Channel 2 angle in degrees
        #[arg(long, allow_hyphen_values = true)]
        phi2_deg: f64,

        #[command(flatten)]
        run: commands::RunArgs,

        /// Print the full estimate as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sweep φ1 through 0..=2π in π/16 steps at a fixed offset Δφ.
    Sweep {
        /// Fixed offset φ2 − φ1 in degrees
        #[arg(long, allow_hyphen_values = true)]
        delta_deg: f64,

        #[command(flatten)]
        run: commands::RunArgs,

        /// Write the sweep report as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Rotate both channels together and print raw and smoothed estimates
    /// per display tick.
    Track {
        /// Fixed offset φ2 − φ1 in degrees
        #[arg(long, allow_hyphen_values = true)]
        delta_deg: f64,

        /// Number of ticks to run
        #[arg(long, default_value = "90")]
        ticks: u64,

        /// Display ticks per second
        #[arg(long, default_value = "30")]
        tick_rate: f64,

        /// Low-pass cutoff in Hz
        #[arg(long, default_value = "1.0")]
        cutoff: f64,

        /// Angular speed in radians per second
        #[arg(long, default_value = "1.0", allow_hyphen_values = true)]
        speed: f64,

        #[command(flatten)]
        run: commands::RunArgs,
    },

    /// Run the statistical battery on one sampled frequency table
    Check {
        /// Channel 1 angle in degrees
        #[arg(long, allow_hyphen_values = true)]
        phi1_deg: f64,

        /// Channel 2 angle in degrees
        #[arg(long, allow_hyphen_values = true)]
        phi2_deg: f64,

        #[command(flatten)]
        run: commands::RunArgs,

        /// Write results as JSON
        #[arg(long)]
        output: Option<String>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Estimate {
            phi1_deg,
            phi2_deg,
            run,
            json,
        } => commands::estimate::run(phi1_deg, phi2_deg, &run, json),
        Commands::Sweep {
            delta_deg,
            run,
            output,
        } => commands::sweep::run(delta_deg, &run, output.as_deref()),
        Commands::Track {
            delta_deg,
            ticks,
            tick_rate,
            cutoff,
            speed,
            run,
        } => commands::track::run(commands::track::TrackCommandConfig {
            delta_deg,
            ticks,
            tick_rate,
            cutoff,
            speed,
            run: &run,
        }),
        Commands::Check {
            phi1_deg,
            phi2_deg,
            run,
            output,
        } => commands::check::run(phi1_deg, phi2_deg, &run, output.as_deref()),
    }
}
