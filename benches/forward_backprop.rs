use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use sigmoid_net::network::numeric_labels;
use sigmoid_net::{Matrix, Network};

fn mnist_network() -> Network {
    let mut rng = StdRng::seed_from_u64(0);
    Network::with_rng(&[784, 20, 10, 10], numeric_labels(10), &mut rng).unwrap()
}

fn forward_bench(c: &mut Criterion) {
    let mut network = mnist_network();
    let input = Matrix::row_vector(vec![0.1; 784]);

    c.bench_function("forward_784_20_10_10", |b| {
        b.iter(|| {
            let out = network.forward(black_box(&input)).unwrap();
            black_box(out.sum());
        })
    });
}

fn train_sample_bench(c: &mut Criterion) {
    let mut network = mnist_network();
    let input = Matrix::row_vector(vec![0.1; 784]);
    let mut expected = Matrix::zeros(1, 10);
    expected.set(0, 3, 1.0).unwrap();

    c.bench_function("forward_backprop_784_20_10_10", |b| {
        b.iter(|| {
            network.forward(black_box(&input)).unwrap();
            network.backprop(black_box(&expected)).unwrap();
        })
    });
}

fn matmul_bench(c: &mut Criterion) {
    let a = Matrix::new(1, 784, 0.5).unwrap();
    let w = Matrix::new(784, 20, 0.01).unwrap();

    c.bench_function("matmul_1x784_784x20", |b| {
        b.iter(|| black_box(a.matmul(black_box(&w)).unwrap()))
    });
}

criterion_group!(benches, forward_bench, train_sample_bench, matmul_bench);
criterion_main!(benches);
