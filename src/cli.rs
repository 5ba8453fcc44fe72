use crate::console::{
    run_ages_report, run_contingency_report, run_education_report, run_nationality_report,
    run_no_quiz_report, AgesArgs, ContingencyArgs, EducationArgs, NationalityArgs, NoQuizArgs,
};
use crate::server;
use applicant_insights::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Applicant Insights",
    about = "Serve and print demographic and quiz-experiment summaries of the applicant collection",
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
    /// Print one report table to stdout, optionally exporting CSV
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// Applicants per nationality, with country names and ISO3 codes
    Nationality(NationalityArgs),
    /// Age distribution of applicants
    Ages(AgesArgs),
    /// Applicants per education level, in attainment order
    Education(EducationArgs),
    /// Quiz-incomplete applicants per day
    NoQuiz(NoQuizArgs),
    /// Experiment group by quiz completion crosstab
    Contingency(ContingencyArgs),
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
        Command::Report { command } => match command {
            ReportCommand::Nationality(args) => run_nationality_report(args).await,
            ReportCommand::Ages(args) => run_ages_report(args).await,
            ReportCommand::Education(args) => run_education_report(args).await,
            ReportCommand::NoQuiz(args) => run_no_quiz_report(args).await,
            ReportCommand::Contingency(args) => run_contingency_report(args).await,
        },
    }
}
