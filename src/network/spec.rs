use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::network::network::Network;

fn default_learn_rate() -> f32 {
    0.01
}

fn default_epochs() -> u32 {
    3
}

/// A serializable description of a network and how long to train it.
///
/// `NetworkSpec` is kept separate from the trained weights so that an
/// architecture can be stored before training starts.
///
/// ```json
/// {
///   "name": "mnist",
///   "topology": [784, 20, 10, 10],
///   "output_labels": ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"],
///   "learn_rate": 0.01,
///   "epochs": 3
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name, also used as the default model file stem.
    pub name: String,
    /// Neuron count per layer, input first.
    pub topology: Vec<usize>,
    /// One label per output neuron.
    pub output_labels: Vec<String>,
    #[serde(default = "default_learn_rate")]
    pub learn_rate: f32,
    /// Number of full passes over the training set.
    #[serde(default = "default_epochs")]
    pub epochs: u32,
}

impl NetworkSpec {
    /// Digit classifier for 28x28 MNIST images.
    pub fn mnist() -> NetworkSpec {
        NetworkSpec {
            name: "mnist".into(),
            topology: vec![784, 20, 10, 10],
            output_labels: (0..10).map(|d| d.to_string()).collect(),
            learn_rate: default_learn_rate(),
            epochs: default_epochs(),
        }
    }

    /// Builds a freshly initialized network from this spec.
    pub fn build(&self) -> Result<Network> {
        let mut network = Network::new(&self.topology, self.output_labels.clone())?;
        network.set_learn_rate(self.learn_rate);
        Ok(network)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<NetworkSpec> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl Default for NetworkSpec {
    fn default() -> Self {
        NetworkSpec::mnist()
    }
}
