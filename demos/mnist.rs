/// MNIST digit classification with the default layout.
///
/// Architecture: 784 → 20 → 10 → 10, sigmoid throughout
/// Training:     per-sample SGD, lr = 0.01, 3 epochs
///
/// Run with:
///   cargo run --example mnist --release
///
/// Data files must be present at demos/mnist_data/ (IDX binary format).
/// Progress is checkpointed to `nn` after each epoch, so an interrupted run
/// picks up where it stopped.
use std::path::Path;
use std::sync::mpsc;

use sigmoid_net::{evaluate, train_loop, Dataset, IdxDataset, NetworkSpec, TrainConfig, TrainingProgress};

const DATA_DIR: &str = "demos/mnist_data";
const MODEL: &str = "nn";

fn main() -> sigmoid_net::Result<()> {
    tracing_subscriber::fmt().init();

    let spec = NetworkSpec::mnist();
    let dir = Path::new(DATA_DIR);
    let train = IdxDataset::open(dir.join("train-images.idx3-ubyte"), dir.join("train-labels.idx1-ubyte"), 10)?;
    let test = IdxDataset::open(dir.join("t10k-images.idx3-ubyte"), dir.join("t10k-labels.idx1-ubyte"), 10)?;
    println!("Loaded {} training and {} test images", train.count(), test.count());

    let mut network = spec.build()?;
    let mut progress = TrainingProgress::new();
    if Path::new(MODEL).exists() {
        progress = network.load(MODEL)?;
        println!("Resuming at epoch {}, sample {}", progress.trained, progress.data_index);
    }

    let (tx, rx) = mpsc::channel();
    let mut config = TrainConfig::new(spec.epochs);
    config.checkpoint = Some(MODEL.into());
    config.progress_tx = Some(tx);

    let report = std::thread::scope(|s| {
        let printer = s.spawn(move || {
            for stats in rx {
                println!(
                    "Epoch {}/{}: mean error = {:.6} ({} samples, {} ms)",
                    stats.epoch, stats.total_epochs, stats.mean_error, stats.samples, stats.elapsed_ms
                );
            }
        });
        let report = train_loop(&mut network, &train, &mut progress, &config);
        drop(config);
        let _ = printer.join();
        report
    })?;
    println!("Trained {} samples this run", report.samples);

    let eval = evaluate(&mut network, &test)?;
    println!(
        "Test accuracy: {:.2}% ({}/{}), mean error {:.6}",
        eval.accuracy() * 100.0,
        eval.correct,
        eval.samples,
        eval.mean_error
    );
    Ok(())
}
