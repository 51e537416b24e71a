//! CLI argument parsing for the school-bus-planner binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::{OverflowPolicy, RunOptions, SequencingStrategy};

#[derive(Parser)]
#[command(name = "school-bus-planner", about = "Plan capacity-constrained school bus routes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Plan routes for a run input file
    Plan(PlanArgs),
    /// Resolve one address with the configured geocoder
    Geocode {
        address: String,
    },
}

/// Flags override the `options` block of the input file
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Run input JSON
    #[arg(long, short)]
    pub input: PathBuf,

    /// CSV of stops (address,seats_needed), replacing the stops in the input file
    #[arg(long)]
    pub stops: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub strategy: Option<SequencingStrategy>,

    /// Minutes spent at every stop
    #[arg(long)]
    pub dwell: Option<u32>,

    /// Also plan the afternoon run from dismissal
    #[arg(long)]
    pub include_return: bool,

    /// Do not mirror the morning order on the return run
    #[arg(long)]
    pub no_reverse_return: bool,

    /// Without mirroring, drop off north to south instead of nearest first
    #[arg(long)]
    pub prioritize_direction: bool,

    #[arg(long, value_enum)]
    pub overflow: Option<OverflowPolicy>,

    /// Write the result here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl PlanArgs {
    pub fn apply_to(&self, options: &mut RunOptions) {
        if let Some(strategy) = self.strategy {
            options.strategy = strategy;
        }
        if let Some(dwell) = self.dwell {
            options.dwell_minutes = dwell;
        }
        if self.include_return {
            options.include_return = true;
        }
        if self.no_reverse_return {
            options.reverse_return_order = false;
        }
        if self.prioritize_direction {
            options.prioritize_direction = true;
        }
        if let Some(policy) = self.overflow {
            options.overflow_policy = policy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_plan_command_parses() {
        let cli = Cli::parse_from([
            "school-bus-planner",
            "plan",
            "--input",
            "run.json",
            "--strategy",
            "minimize-ride-time",
            "--dwell",
            "2",
        ]);

        let Command::Plan(args) = cli.command else {
            panic!("expected plan");
        };
        assert_eq!(args.input, PathBuf::from("run.json"));
        assert_eq!(args.strategy, Some(SequencingStrategy::MinimizeRideTime));
        assert_eq!(args.dwell, Some(2));
        assert!(args.output.is_none());
    }

    #[test]
    fn test_cli_geocode_command_parses() {
        let cli = Cli::parse_from(["school-bus-planner", "geocode", "1 School Rd"]);
        assert!(matches!(cli.command, Command::Geocode { address } if address == "1 School Rd"));
    }

    #[test]
    fn test_cli_requires_input_for_plan() {
        assert!(Cli::try_parse_from(["school-bus-planner", "plan"]).is_err());
    }

    #[test]
    fn test_flags_override_file_options() {
        let cli = Cli::parse_from([
            "school-bus-planner",
            "plan",
            "-i",
            "run.json",
            "--include-return",
            "--no-reverse-return",
            "--prioritize-direction",
            "--overflow",
            "fail",
        ]);
        let Command::Plan(args) = cli.command else {
            panic!("expected plan");
        };

        let mut options = RunOptions {
            dwell_minutes: 3,
            ..Default::default()
        };
        args.apply_to(&mut options);

        assert!(options.include_return);
        assert!(!options.reverse_return_order);
        assert!(options.prioritize_direction);
        assert_eq!(options.overflow_policy, OverflowPolicy::Fail);
        // Untouched when the flag is absent
        assert_eq!(options.dwell_minutes, 3);
        assert_eq!(options.strategy, SequencingStrategy::DistanceFromSchool);
    }
}
