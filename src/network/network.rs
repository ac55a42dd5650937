use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::activation::sigmoid::sigmoid_derivative;
use crate::error::{NnError, Result};
use crate::layers::dense::Layer;
use crate::loss::mse::MseLoss;
use crate::math::matrix::Matrix;
use crate::network::codec;
use crate::optim::sgd::Sgd;
use crate::train::progress::TrainingProgress;

/// Initial weights are drawn uniformly from `[-WEIGHT_RANGE, WEIGHT_RANGE)`.
const WEIGHT_RANGE: f32 = 0.5;

/// The network's best guess for the current output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub index: usize,
    pub label: String,
    pub confidence: f32,
}

/// A sigmoid multilayer perceptron, input layer first.
///
/// Every adjacent pair satisfies
/// `layers[i].weights.shape() == (layers[i].size(), layers[i + 1].size())`
/// and the output labels line up with the last layer. Both are checked
/// whenever a network is assembled, including on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawNetwork")]
pub struct Network {
    layers: Vec<Layer>,
    optimizer: Sgd,
    output_labels: Vec<String>,
}

#[derive(Deserialize)]
struct RawNetwork {
    layers: Vec<Layer>,
    optimizer: Sgd,
    output_labels: Vec<String>,
}

impl TryFrom<RawNetwork> for Network {
    type Error = NnError;

    fn try_from(raw: RawNetwork) -> Result<Network> {
        Network::from_layers(raw.layers, raw.output_labels, raw.optimizer.learning_rate)
    }
}

impl Network {
    /// Builds a network from neuron counts per layer, with weights drawn
    /// from the thread-local RNG.
    pub fn new(topology: &[usize], output_labels: Vec<String>) -> Result<Network> {
        Network::with_rng(topology, output_labels, &mut rand::thread_rng())
    }

    /// Like [`Network::new`] but draws the initial weights from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(
        topology: &[usize],
        output_labels: Vec<String>,
        rng: &mut R,
    ) -> Result<Network> {
        let (&first, rest) = topology
            .split_first()
            .ok_or_else(|| NnError::InvalidDimension("topology needs at least one layer".into()))?;
        if let Some(pos) = topology.iter().position(|&n| n == 0) {
            return Err(NnError::InvalidDimension(format!("layer {} has no neurons", pos)));
        }
        let neurons = *topology.last().unwrap_or(&first);
        if output_labels.len() != neurons {
            return Err(NnError::LabelCountMismatch { labels: output_labels.len(), neurons });
        }

        let mut layers = Vec::with_capacity(topology.len());
        layers.push(Layer::new(first));
        for &count in rest {
            let next = match layers.last_mut() {
                Some(prev) => prev.derive_next(count),
                None => Layer::new(count),
            };
            layers.push(next);
        }
        for layer in &mut layers {
            if !layer.weights.is_empty() {
                layer.weights.randomize_with(rng, -WEIGHT_RANGE, WEIGHT_RANGE)?;
            }
        }

        Ok(Network { layers, optimizer: Sgd::default(), output_labels })
    }

    /// Assembles a network from ready-made layers, checking the chain.
    pub fn from_layers(layers: Vec<Layer>, output_labels: Vec<String>, learn_rate: f32) -> Result<Network> {
        check_chain(&layers)?;
        let neurons = layers.last().map(Layer::size).unwrap_or(0);
        if output_labels.len() != neurons {
            return Err(NnError::LabelCountMismatch { labels: output_labels.len(), neurons });
        }
        Ok(Network { layers, optimizer: Sgd::new(learn_rate), output_labels })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Activations of the output layer after the last forward pass.
    pub fn outputs(&self) -> &Matrix {
        &self.output_layer().outputs
    }

    fn output_layer(&self) -> &Layer {
        // `check_chain` guarantees at least one layer.
        &self.layers[self.layers.len() - 1]
    }

    pub fn output_labels(&self) -> &[String] {
        &self.output_labels
    }

    pub fn set_output_labels(&mut self, labels: Vec<String>) -> Result<()> {
        let neurons = self.output_layer().size();
        if labels.len() != neurons {
            return Err(NnError::LabelCountMismatch { labels: labels.len(), neurons });
        }
        self.output_labels = labels;
        Ok(())
    }

    pub fn learn_rate(&self) -> f32 {
        self.optimizer.learning_rate
    }

    pub fn set_learn_rate(&mut self, learn_rate: f32) {
        self.optimizer.learning_rate = learn_rate;
    }

    /// Neuron count per layer.
    pub fn topology(&self) -> Vec<usize> {
        self.layers.iter().map(Layer::size).collect()
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].size()
    }

    pub fn output_size(&self) -> usize {
        self.output_layer().size()
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    /// Runs the input through every layer, leaving all activations in place,
    /// and returns the output layer's activations.
    pub fn forward(&mut self, input: &Matrix) -> Result<&Matrix> {
        let first = &mut self.layers[0];
        if input.shape() != first.outputs.shape() {
            return Err(NnError::shape_mismatch("forward", first.outputs.shape(), input.shape()));
        }
        first.outputs.data_mut().copy_from_slice(input.data());

        for i in 1..self.layers.len() {
            let (head, tail) = self.layers.split_at_mut(i);
            Layer::forward(&mut tail[0], &head[i - 1])?;
        }
        Ok(self.outputs())
    }

    /// One step of gradient descent towards `expected`, using the
    /// activations left by the preceding [`Network::forward`].
    pub fn backprop(&mut self, expected: &Matrix) -> Result<()> {
        let last = self.layers.len() - 1;
        let mut delta = MseLoss::derivative(&self.layers[last].outputs, expected)?;

        for i in (1..=last).rev() {
            let (head, tail) = self.layers.split_at_mut(i);
            let prev = &mut head[i - 1];
            let curr = &mut tail[0];

            self.optimizer.step(&mut curr.biased, &delta)?;
            let weights_grad = prev.outputs.transpose().matmul(&delta)?;
            self.optimizer.step(&mut prev.weights, &weights_grad)?;

            // Propagated through the weights as just updated.
            let slope = prev.outputs.map(sigmoid_derivative);
            let mut next = delta.matmul(&prev.weights.transpose())?;
            next.hadamard_inplace(&slope)?;
            delta = next;
        }
        Ok(())
    }

    /// Label and activation of the strongest output neuron.
    pub fn prediction(&self) -> Option<Prediction> {
        let outputs = self.outputs();
        let index = outputs.argmax()?;
        Some(Prediction {
            index,
            label: self.output_labels[index].clone(),
            confidence: outputs.data()[index],
        })
    }

    /// Forward pass followed by [`Network::prediction`].
    pub fn predict(&mut self, input: &Matrix) -> Result<Prediction> {
        self.forward(input)?;
        self.prediction()
            .ok_or_else(|| NnError::InvalidDimension("output layer is empty".into()))
    }

    /// Writes the binary model file.
    ///
    /// The model is encoded in memory, written to a sibling `.tmp` file and
    /// renamed over `path`, so a failed save leaves the previous file intact.
    pub fn save<P: AsRef<Path>>(&self, path: P, progress: &TrainingProgress) -> Result<()> {
        let path = path.as_ref();
        let mut bytes = Vec::new();
        codec::write_model(&mut bytes, &self.layers, progress)?;

        let temp_path = temp_sibling(path);
        std::fs::write(&temp_path, &bytes)?;
        if let Err(e) = std::fs::rename(&temp_path, path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }
        debug!(path = %path.display(), trained = progress.trained, data_index = progress.data_index, "model saved");
        Ok(())
    }

    /// Replaces every layer with the contents of a binary model file and
    /// returns the stored training progress.
    ///
    /// Labels are not part of the file: the current ones are kept when they
    /// still fit the loaded output layer, otherwise they become `"0".."n-1"`.
    /// On error `self` is left untouched.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<TrainingProgress> {
        let path = path.as_ref();
        let (layers, progress) = read_file(path)?;
        let neurons = layers.last().map(Layer::size).unwrap_or(0);

        let labels = if self.output_labels.len() == neurons {
            self.output_labels.clone()
        } else {
            warn!(
                path = %path.display(),
                labels = self.output_labels.len(),
                neurons,
                "loaded output layer does not match current labels, using numeric labels"
            );
            numeric_labels(neurons)
        };

        *self = assemble(layers, labels, self.learn_rate())?;
        debug!(path = %path.display(), topology = ?self.topology(), "model loaded");
        Ok(progress)
    }

    /// Loads a model file into a new network with numeric labels and the
    /// default learning rate.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<(Network, TrainingProgress)> {
        let (layers, progress) = read_file(path.as_ref())?;
        let neurons = layers.last().map(Layer::size).unwrap_or(0);
        let network = assemble(layers, numeric_labels(neurons), Sgd::default().learning_rate)?;
        Ok((network, progress))
    }

    /// Serializes the network to a pretty-printed JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a network written by [`Network::save_json`].
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Network> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// `nn` -> `nn.tmp`, in the same directory so the rename stays on one
/// filesystem.
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_else(|| OsString::from("model"));
    name.push(".tmp");
    path.with_file_name(name)
}

fn read_file(path: &Path) -> Result<(Vec<Layer>, TrainingProgress)> {
    let mut reader = BufReader::new(File::open(path)?);
    codec::read_model(&mut reader)
}

/// `from_layers` for data that came off disk: any inconsistency means the
/// file is bad.
fn assemble(layers: Vec<Layer>, labels: Vec<String>, learn_rate: f32) -> Result<Network> {
    Network::from_layers(layers, labels, learn_rate).map_err(|e| match e {
        NnError::CorruptModel(_) => e,
        other => NnError::corrupt(other.to_string()),
    })
}

/// `"0"`, `"1"`, ... one per output neuron.
pub fn numeric_labels(count: usize) -> Vec<String> {
    (0..count).map(|i| i.to_string()).collect()
}

fn check_chain(layers: &[Layer]) -> Result<()> {
    if layers.is_empty() {
        return Err(NnError::InvalidDimension("network needs at least one layer".into()));
    }
    for (i, layer) in layers.iter().enumerate() {
        if layer.outputs.rows() != 1 || layer.biased.shape() != layer.outputs.shape() {
            return Err(NnError::shape_mismatch("layer biases", layer.outputs.shape(), layer.biased.shape()));
        }
        if let Some(next) = layers.get(i + 1) {
            let bridge = (layer.size(), next.size());
            if layer.weights.shape() != bridge {
                return Err(NnError::shape_mismatch("layer chain", bridge, layer.weights.shape()));
            }
        }
    }
    Ok(())
}
