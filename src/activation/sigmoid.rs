//! The logistic activation. It is the only activation the network uses, so
//! there is no activation enum to dispatch on.

/// `1 / (1 + e^-x)`
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Sigmoid derivative expressed through the activation itself: for
/// `a = sigmoid(z)`, `d/dz sigmoid(z) = a * (1 - a)`.
pub fn sigmoid_derivative(a: f32) -> f32 {
    a * (1.0 - a)
}
