use std::fs;

use rand::rngs::StdRng;
use rand::SeedableRng;

use sigmoid_net::network::numeric_labels;
use sigmoid_net::{Matrix, Network, NetworkSpec, NnError, TrainingProgress};

fn seeded(topology: &[usize], seed: u64) -> Network {
    let labels = numeric_labels(*topology.last().unwrap());
    Network::with_rng(topology, labels, &mut StdRng::seed_from_u64(seed)).unwrap()
}

fn word(v: i32) -> [u8; 4] {
    v.to_ne_bytes()
}

#[test]
fn save_and_load_reproduce_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nn");

    let mut original = seeded(&[4, 3, 2], 11);
    let progress = TrainingProgress { trained: 2, data_index: 17 };
    original.save(&path, &progress).unwrap();

    let mut restored = seeded(&[4, 3, 2], 99);
    let loaded = restored.load(&path).unwrap();
    assert_eq!(loaded, progress);

    let input = Matrix::row_vector(vec![0.3, 0.1, 0.9, 0.5]);
    let a = original.forward(&input).unwrap().clone();
    let b = restored.forward(&input).unwrap().clone();
    assert_eq!(a, b);
}

#[test]
fn failed_save_keeps_previous_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nn");
    let net = seeded(&[3, 2], 6);
    let good = TrainingProgress { trained: 1, data_index: 4 };
    net.save(&path, &good).unwrap();
    assert!(!dir.path().join("nn.tmp").exists());

    let unencodable = TrainingProgress { trained: 1, data_index: i32::MAX as usize + 1 };
    assert!(matches!(net.save(&path, &unencodable), Err(NnError::InvalidDimension(_))));

    let (_, saved) = Network::open(&path).unwrap();
    assert_eq!(saved, good);
}

#[test]
fn file_is_counters_then_matrices() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nn");
    seeded(&[2, 1], 5).save(&path, &TrainingProgress { trained: 1, data_index: 3 }).unwrap();

    let bytes = fs::read(&path).unwrap();
    // 3 counters, biased 1x2 + weights 2x1, biased 1x1 + weights 0x0
    assert_eq!(bytes.len(), 4 * (3 + (2 + 2) + (2 + 2) + (2 + 1) + 2));
    assert_eq!(&bytes[0..4], &word(1));
    assert_eq!(&bytes[4..8], &word(3));
    assert_eq!(&bytes[8..12], &word(2));
}

#[test]
fn load_replaces_topology() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nn");
    seeded(&[3, 5, 4], 1).save(&path, &TrainingProgress::new()).unwrap();

    let mut net = NetworkSpec::mnist().build().unwrap();
    net.load(&path).unwrap();
    assert_eq!(net.topology(), vec![3, 5, 4]);
    // The MNIST labels no longer fit four outputs.
    assert_eq!(net.output_labels(), &numeric_labels(4)[..]);
}

#[test]
fn load_keeps_labels_that_still_fit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nn");
    seeded(&[2, 2], 1).save(&path, &TrainingProgress::new()).unwrap();

    let mut net = seeded(&[2, 2], 2);
    net.set_output_labels(vec!["no".into(), "yes".into()]).unwrap();
    net.load(&path).unwrap();
    assert_eq!(net.output_labels(), &["no".to_string(), "yes".to_string()][..]);
}

#[test]
fn broken_chain_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nn");

    let mut bytes = Vec::new();
    for v in [0, 0, 2] {
        bytes.extend_from_slice(&word(v));
    }
    // layer 0: biases 1x2, weights 3x2 where 2x2 is required
    bytes.extend_from_slice(&word(1));
    bytes.extend_from_slice(&word(2));
    bytes.extend_from_slice(&[0u8; 8]);
    bytes.extend_from_slice(&word(3));
    bytes.extend_from_slice(&word(2));
    bytes.extend_from_slice(&[0u8; 24]);
    // layer 1: biases 1x2, weights 0x0
    bytes.extend_from_slice(&word(1));
    bytes.extend_from_slice(&word(2));
    bytes.extend_from_slice(&[0u8; 8]);
    bytes.extend_from_slice(&word(0));
    bytes.extend_from_slice(&word(0));
    fs::write(&path, bytes).unwrap();

    let mut net = seeded(&[2, 2], 3);
    let before = net.layers().to_vec();
    assert!(matches!(net.load(&path), Err(NnError::CorruptModel(_))));
    assert_eq!(net.layers(), &before[..]);
    assert!(matches!(Network::open(&path), Err(NnError::CorruptModel(_))));
}

#[test]
fn truncated_file_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nn");
    seeded(&[4, 3, 2], 4).save(&path, &TrainingProgress::new()).unwrap();

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 6]).unwrap();
    assert!(matches!(Network::open(&path), Err(NnError::CorruptModel(_))));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut net = seeded(&[2, 2], 1);
    assert!(matches!(net.load(dir.path().join("absent")), Err(NnError::Io(_))));
}

#[test]
fn json_snapshot_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nn.json");
    let net = seeded(&[3, 2], 8);
    net.save_json(&path).unwrap();

    let back = Network::load_json(&path).unwrap();
    assert_eq!(back.layers(), net.layers());
    assert_eq!(back.output_labels(), net.output_labels());
}
