pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "rental",
    about = "Vehicle rental operator CLI",
    long_about = "Operate the rental database: migrations, demo fleet, config inspection, sessions, and offline booking quotes.",
    after_help = "Examples:\n  rental migrate\n  rental seed\n  rental session --user ana\n  rental quote --vehicle veh-bmw-x5 --start 2030-06-01 --end 2030-06-04"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo fleet (idempotent) and verify it")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Issue a bearer session token for a user")]
    Session {
        #[arg(long, help = "User id the session belongs to")]
        user: String,
    },
    #[command(about = "Price a booking against the stored catalog without submitting it")]
    Quote {
        #[arg(long, help = "Vehicle id to book")]
        vehicle: String,
        #[arg(long, default_value = "cli-operator", help = "User id the quote is for")]
        user: String,
        #[arg(long, help = "Start date (YYYY-MM-DD)")]
        start: String,
        #[arg(long, help = "End date (YYYY-MM-DD)")]
        end: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Session { user } => commands::session::run(&user),
        Command::Quote { vehicle, user, start, end } => {
            commands::quote::run(commands::quote::QuoteArgs {
                vehicle: &vehicle,
                user: &user,
                start: &start,
                end: &end,
            })
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
