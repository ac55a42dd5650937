use sigmoid_net::network::numeric_labels;
use sigmoid_net::{train_step, InMemoryDataset, Matrix, Network, TrainingProgress};

fn main() -> sigmoid_net::Result<()> {
    let mut network = Network::new(&[2, 4, 2], numeric_labels(2))?;
    network.set_learn_rate(0.5);

    let inputs = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
    // One-hot: class 1 when the inputs differ.
    let outputs = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 1.0], vec![1.0, 0.0]];
    let dataset = InMemoryDataset::new(inputs.clone(), outputs)?;

    let mut progress = TrainingProgress::new();
    let mut epoch_error = 0.0;
    while progress.trained < 5000 {
        let outcome = train_step(&mut network, &dataset, &mut progress)?;
        epoch_error += outcome.error;
        if outcome.epoch_completed {
            if progress.trained % 500 == 0 {
                println!("Epoch {}: error = {:.6}", progress.trained, epoch_error / 4.0);
            }
            epoch_error = 0.0;
        }
    }

    for input in inputs {
        let prediction = network.predict(&Matrix::row_vector(input.clone()))?;
        println!("Input: {:?} -> {} ({:.4})", input, prediction.label, prediction.confidence);
    }
    Ok(())
}
