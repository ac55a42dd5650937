//! Command-line trainer for sigmoid-net models.
//!
//! ```text
//! sigmoid-net train   --images train-images.idx3-ubyte --labels train-labels.idx1-ubyte --model nn
//! sigmoid-net eval    --images t10k-images.idx3-ubyte  --labels t10k-labels.idx1-ubyte  --model nn
//! sigmoid-net predict --model nn --input 0,0.5,1,...
//! sigmoid-net inspect --model nn
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sigmoid_net::{
    evaluate, train_loop, Dataset, IdxDataset, Matrix, Network, NetworkSpec, NnError, Result, TrainConfig,
    TrainingProgress,
};

#[derive(Parser)]
#[command(name = "sigmoid-net")]
#[command(about = "Train and run a sigmoid multilayer perceptron", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log filter, e.g. `info` or `sigmoid_net=debug`
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Train on an IDX image/label pair, resuming from the model file if present
    Train {
        #[arg(long)]
        images: PathBuf,

        #[arg(long)]
        labels: PathBuf,

        /// Network spec (JSON); defaults to the MNIST layout
        #[arg(long)]
        config: Option<PathBuf>,

        /// Model file to resume from and save to
        #[arg(short, long, default_value = "nn")]
        model: PathBuf,

        /// Total epochs to reach; overrides the network config
        #[arg(short, long)]
        epochs: Option<u32>,

        /// Learning rate; overrides the network config
        #[arg(long)]
        learn_rate: Option<f32>,
    },

    /// Report mean error and accuracy on an IDX image/label pair
    Eval {
        #[arg(long)]
        images: PathBuf,

        #[arg(long)]
        labels: PathBuf,

        #[arg(short, long, default_value = "nn")]
        model: PathBuf,
    },

    /// Run one comma-separated input vector through a model
    Predict {
        #[arg(short, long, default_value = "nn")]
        model: PathBuf,

        /// Comma-separated input values
        #[arg(short, long)]
        input: String,
    },

    /// Print a model's layout and training progress
    Inspect {
        #[arg(short, long, default_value = "nn")]
        model: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let result = match cli.command {
        Commands::Train { images, labels, config, model, epochs, learn_rate } => {
            run_train(&images, &labels, config.as_deref(), &model, epochs, learn_rate)
        }
        Commands::Eval { images, labels, model } => run_eval(&images, &labels, &model),
        Commands::Predict { model, input } => run_predict(&model, &input),
        Commands::Inspect { model } => run_inspect(&model),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_train(
    images: &Path,
    labels: &Path,
    config: Option<&Path>,
    model: &Path,
    epochs: Option<u32>,
    learn_rate: Option<f32>,
) -> Result<()> {
    let spec = match config {
        Some(path) => NetworkSpec::load_json(path)?,
        None => NetworkSpec::mnist(),
    };
    let dataset = IdxDataset::open(images, labels, spec.output_labels.len())?;
    info!(samples = dataset.count(), "dataset loaded");

    let mut network = spec.build()?;
    let mut progress = TrainingProgress::new();
    if model.exists() {
        progress = network.load(model)?;
        info!(
            model = %model.display(),
            trained = progress.trained,
            data_index = progress.data_index,
            "resuming"
        );
    }
    network.set_learn_rate(learn_rate.unwrap_or(spec.learn_rate));

    let mut train_config = TrainConfig::new(epochs.unwrap_or(spec.epochs));
    train_config.checkpoint = Some(model.to_path_buf());

    let report = train_loop(&mut network, &dataset, &mut progress, &train_config)?;
    network.save(model, &progress)?;

    info!(
        samples = report.samples,
        epochs = report.epochs_completed,
        trained = progress.trained,
        model = %model.display(),
        "training finished"
    );
    if let Some(last) = report.last_epoch {
        info!(epoch = last.epoch, mean_error = last.mean_error, "last epoch");
    }
    Ok(())
}

fn run_eval(images: &Path, labels: &Path, model: &Path) -> Result<()> {
    let (mut network, _) = Network::open(model)?;
    let dataset = IdxDataset::open(images, labels, network.output_size())?;
    let eval = evaluate(&mut network, &dataset)?;
    info!(
        samples = eval.samples,
        correct = eval.correct,
        accuracy = eval.accuracy(),
        mean_error = eval.mean_error,
        "evaluation"
    );
    Ok(())
}

fn run_predict(model: &Path, input: &str) -> Result<()> {
    let (mut network, _) = Network::open(model)?;
    let values = parse_input(input)?;
    let prediction = network.predict(&Matrix::row_vector(values))?;
    println!("{} ({:.4})", prediction.label, prediction.confidence);
    Ok(())
}

fn run_inspect(model: &Path) -> Result<()> {
    let (network, progress) = Network::open(model)?;
    println!("model:      {}", model.display());
    println!("topology:   {:?}", network.topology());
    println!("parameters: {}", network.parameter_count());
    println!("trained:    {} epochs", progress.trained);
    println!("cursor:     {}", progress.data_index);
    Ok(())
}

fn parse_input(input: &str) -> Result<Vec<f32>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f32>()
                .map_err(|e| NnError::Dataset(format!("bad input value {:?}: {}", s, e)))
        })
        .collect()
}
