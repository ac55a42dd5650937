//! sigmoid-net studio
//!
//! A JSON control surface for one network: inspect its layers and recent
//! error, train in the background, step through test samples, predict from
//! a drawn image and save or load the model file.
//!
//! Run with:
//!   cargo run --bin studio --release -- \
//!       --train-images train-images.idx3-ubyte --train-labels train-labels.idx1-ubyte \
//!       --test-images t10k-images.idx3-ubyte --test-labels t10k-labels.idx1-ubyte
//! Then `curl http://127.0.0.1:7878/` lists the endpoints.

mod handlers;
mod routes;
mod state;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tiny_http::Server;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sigmoid_net::{Dataset, IdxDataset, NetworkSpec, Result, TrainingProgress};

use state::StudioState;

#[derive(Parser)]
#[command(name = "studio", about = "HTTP control surface for a sigmoid-net model")]
struct Args {
    #[arg(long, default_value = "127.0.0.1:7878")]
    addr: String,

    /// Model file; loaded at startup when it exists
    #[arg(short, long, default_value = "nn")]
    model: PathBuf,

    /// Network spec (JSON); defaults to the MNIST layout
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, requires = "train_labels")]
    train_images: Option<PathBuf>,

    #[arg(long, requires = "train_images")]
    train_labels: Option<PathBuf>,

    #[arg(long, requires = "test_labels")]
    test_images: Option<PathBuf>,

    #[arg(long, requires = "test_images")]
    test_labels: Option<PathBuf>,

    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let studio = match build_state(&args) {
        Ok(studio) => studio,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let server = match Server::http(&args.addr) {
        Ok(server) => server,
        Err(e) => {
            error!(addr = %args.addr, "failed to bind: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(addr = %args.addr, "studio listening");

    let shared_state = Arc::new(Mutex::new(studio));

    // One thread per request so a slow handler does not stall the rest.
    for request in server.incoming_requests() {
        let state_clone = Arc::clone(&shared_state);
        std::thread::spawn(move || {
            routes::dispatch(request, state_clone);
        });
    }
    ExitCode::SUCCESS
}

fn build_state(args: &Args) -> Result<StudioState> {
    let spec = match &args.config {
        Some(path) => NetworkSpec::load_json(path)?,
        None => NetworkSpec::mnist(),
    };
    let mut network = spec.build()?;
    let mut progress = TrainingProgress::new();
    if args.model.exists() {
        progress = network.load(&args.model)?;
        info!(model = %args.model.display(), trained = progress.trained, "model loaded");
    }

    let mut studio = StudioState::new(network, progress, spec.epochs, args.model.clone());
    let n_classes = spec.output_labels.len();

    if let (Some(images), Some(labels)) = (&args.train_images, &args.train_labels) {
        let ds = IdxDataset::open(images, labels, n_classes)?;
        info!(samples = ds.count(), "training set loaded");
        studio.train_set = Some(Box::new(ds));
    }
    if let (Some(images), Some(labels)) = (&args.test_images, &args.test_labels) {
        let ds = IdxDataset::open(images, labels, n_classes)?;
        info!(samples = ds.count(), "test set loaded");
        studio.test_set = Some(Box::new(ds));
    }
    Ok(studio)
}
