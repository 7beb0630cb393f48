use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use payment_predictor_cli::commands::predict::{run_prediction, Selection};
use payment_predictor_cli::commands::prep::run_prep;
use payment_predictor_cli::commands::train::run_training;
use payment_predictor_cli::input::{PredictCommandConfig, PrepCommandConfig, TrainCommandConfig};

fn config_arg(help: &'static str) -> Arg {
    Arg::new("config")
        .help(help)
        .required(false)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn output_dir_arg(help: &'static str) -> Arg {
    Arg::new("output_dir")
        .short('o')
        .long("output_dir")
        .value_parser(clap::builder::NonEmptyStringValueParser::new())
        .help(help)
        .value_hint(ValueHint::DirPath)
}

fn prediction_args(cmd: Command) -> Command {
    cmd.arg(config_arg("Path to prediction configuration file"))
        .arg(
            Arg::new("model_file")
                .short('m')
                .long("model")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help("Path to the trained model file (*.json). Overrides the configuration file.")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("scaler_file")
                .short('s')
                .long("scaler")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help("Path to the fitted scaler file (*.json). Overrides the configuration file.")
                .value_hint(ValueHint::FilePath),
        )
        .arg(output_dir_arg(
            "Folder the dated prediction folder is created in. Overrides the configuration file.",
        ))
        .arg(
            Arg::new("report_interval")
                .long("report-interval")
                .value_parser(clap::value_parser!(usize))
                .help("Log a progress line every N customers.")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .help("Score customers on all cores.")
                .action(ArgAction::SetTrue),
        )
}

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(
            env_logger::Env::default()
                .filter_or("PAYMENT_PREDICTOR_LOG", "error,payment_predictor=info"),
        )
        .init();

    let matches = Command::new("payment-predictor")
        .version(clap::crate_version!())
        .about("Next-payment prediction for loan customers")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("prep")
                .about("Clean a raw transaction log and build the feature and target tables")
                .arg(
                    Arg::new("raw_data")
                        .help("Path to the raw transaction log (*.csv)")
                        .required(true)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help("Path to preparation configuration file")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(output_dir_arg("Folder the prepared tables are written to.")),
        )
        .subcommand(
            Command::new("train")
                .about("Fit the feature scaler and the classifier")
                .arg(config_arg("Path to training configuration file"))
                .arg(
                    Arg::new("features_file")
                        .short('f')
                        .long("features")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Path to the feature table. Overrides the configuration file.")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("target_file")
                        .short('t')
                        .long("target")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Path to the target table. Overrides the configuration file.")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(output_dir_arg(
                    "Folder the model and scaler are written to. Overrides the configuration file.",
                ))
                .arg(
                    Arg::new("model_type")
                        .long("model-type")
                        .help("Override the model type from the JSON config.")
                        .value_parser(["gbdt"])
                        .value_hint(ValueHint::Other),
                ),
        )
        .subcommand(prediction_args(
            Command::new("predict")
                .about("Predict the next payment of one customer")
                .arg(
                    Arg::new("acctrefno")
                        .help("Account reference number of the customer")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                ),
        ))
        .subcommand(prediction_args(
            Command::new("predict-all").about("Predict the next payment of every customer"),
        ))
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("prep", sub_m)) => handle_prep(sub_m),
        Some(("train", sub_m)) => handle_train(sub_m),
        Some(("predict", sub_m)) => {
            let acctrefno: i64 = *sub_m
                .get_one("acctrefno")
                .expect("acctrefno is a required argument");
            handle_predict(sub_m, Selection::One(acctrefno))
        }
        Some(("predict-all", sub_m)) => handle_predict(sub_m, Selection::All),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

/// Without a config file, print the default one so it can be saved and edited.
fn print_template<T: serde::Serialize>(template: &T) -> Result<()> {
    log::warn!("No config file provided; printing a template configuration.");
    println!("{}", serde_json::to_string_pretty(template)?);
    Ok(())
}

fn handle_prep(matches: &ArgMatches) -> Result<()> {
    let config_path: Option<&PathBuf> = matches.get_one("config");
    let params = PrepCommandConfig::from_arguments(config_path, matches)?;
    log::info!("[PaymentPredictor::Prep] Preparing {}", params.raw_data);

    match run_prep(&params) {
        Ok(out) => {
            log::info!("Prepared tables written to {}", out.display());
            Ok(())
        }
        Err(e) => {
            log::error!("Preparation failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let Some(config_path) = matches.get_one::<PathBuf>("config") else {
        return print_template(&TrainCommandConfig::default());
    };
    log::info!("[PaymentPredictor::Train] Training from config: {:?}", config_path);

    let params = TrainCommandConfig::from_arguments(config_path, matches)?;
    match run_training(&params) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_predict(matches: &ArgMatches, selection: Selection) -> Result<()> {
    let Some(config_path) = matches.get_one::<PathBuf>("config") else {
        return print_template(&PredictCommandConfig::default());
    };
    log::info!("[PaymentPredictor::Predict] Predicting with config: {:?}", config_path);

    let params = PredictCommandConfig::from_arguments(config_path, matches)?;
    match run_prediction(&params, selection) {
        Ok((outcome, dir)) => {
            log::info!(
                "{} result(s) and {} error(s) written to {}",
                outcome.results.len(),
                outcome.errors.len(),
                dir.display()
            );
            Ok(())
        }
        Err(e) => {
            log::error!("Prediction failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
