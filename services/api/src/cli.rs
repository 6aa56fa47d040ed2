use crate::commands::{run_evaluate, run_score, run_train, EvaluateArgs, ScoreArgs, TrainArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use wlb::config::{AppConfig, TelemetryConfig};
use wlb::error::AppError;
use wlb::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "wlb",
    about = "Train, serve, and batch-score work-life-balance models",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the prediction API (default command)
    Serve(ServeArgs),
    #[command(flatten)]
    Offline(OfflineCommand),
}

/// Commands that work on files only and never read the server settings.
#[derive(Subcommand, Debug)]
enum OfflineCommand {
    /// Score a CSV of survey records and write WLB scores and risk tiers
    Score(ScoreArgs),
    /// Fit a random forest artifact from a labeled CSV
    Train(TrainArgs),
    /// Report accuracy, precision, recall, F1, and ROC-AUC for an artifact
    Evaluate(EvaluateArgs),
}

impl OfflineCommand {
    fn run(self) -> Result<(), AppError> {
        match self {
            OfflineCommand::Score(args) => run_score(args),
            OfflineCommand::Train(args) => run_train(args),
            OfflineCommand::Evaluate(args) => run_evaluate(args),
        }
    }
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
        Command::Serve(args) => {
            let config = AppConfig::load()?;
            telemetry::init(&config.telemetry)?;
            server::run(config, args).await
        }
        Command::Offline(command) => {
            telemetry::init(&TelemetryConfig::from_env())?;
            command.run()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_flags_use_underscored_weight_names() {
        let cli = Cli::try_parse_from([
            "wlb",
            "score",
            "--model",
            "model.json",
            "--input",
            "survey.csv",
            "--composite",
            "--w_model",
            "0.7",
            "--w_meet",
            "0.1",
        ])
        .expect("score args parse");

        let Some(Command::Offline(OfflineCommand::Score(args))) = cli.command else {
            panic!("expected score command");
        };
        assert!(args.composite);
        assert_eq!(args.w_model, 0.7);
        assert_eq!(args.w_features, 0.5);
        assert_eq!(args.w_meet, 0.1);
        assert_eq!(args.out.to_str(), Some("predictions_wlb.csv"));
        assert_eq!(args.drop_target, "Attrition");
    }

    #[test]
    fn score_requires_model_and_input() {
        assert!(Cli::try_parse_from(["wlb", "score", "--input", "survey.csv"]).is_err());
    }

    #[test]
    fn train_target_and_wellbeing_conflict() {
        let result = Cli::try_parse_from([
            "wlb",
            "train",
            "--data",
            "train.csv",
            "--target",
            "Attrition",
            "--wellbeing",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn file_commands_parse_as_offline() {
        for args in [
            vec!["wlb", "evaluate", "--model", "m.json", "--data", "d.csv"],
            vec!["wlb", "train", "--data", "d.csv"],
        ] {
            let cli = Cli::try_parse_from(args).expect("parse");
            assert!(matches!(cli.command, Some(Command::Offline(_))));
        }
        let cli = Cli::try_parse_from(["wlb", "serve", "--port", "9000"]).expect("parse");
        assert!(matches!(cli.command, Some(Command::Serve(ServeArgs { port: Some(9000), .. }))));
    }

    #[test]
    fn no_subcommand_defaults_to_serve() {
        let cli = Cli::try_parse_from(["wlb"]).expect("parse");
        assert!(cli.command.is_none());
    }
}
