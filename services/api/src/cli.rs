use crate::demo::{
    run_budget, run_calendar, run_demo, run_redeem, BudgetArgs, CalendarArgs, DemoArgs, RedeemArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use cougar_cash::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Cougar Cash",
    about = "Run and inspect the Cougar Cash school rewards economy from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the points each day in a date range is worth
    Calendar(CalendarArgs),
    /// Scan a voucher, pass, or order code against the saved school snapshot
    Redeem(RedeemArgs),
    /// Show an admin's award budget for the current month
    Budget(BudgetArgs),
    /// Run a scripted walkthrough against an in-memory school
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Calendar(args) => run_calendar(args),
        Command::Redeem(args) => run_redeem(args),
        Command::Budget(args) => run_budget(args),
        Command::Demo(args) => run_demo(args),
    }
}
