use serde::Serialize;

use sigmoid_net::{Layer, Prediction};

use crate::routes::{ok, query_param, HttpResponse};
use crate::state::{lock, Mode, SharedState, StudioState};

#[derive(Serialize)]
struct ProgressView {
    mode: Mode,
    trained: u32,
    epochs: u32,
    data_index: usize,
    count: usize,
    fraction: f32,
    last_error: Option<f32>,
}

impl ProgressView {
    fn of(st: &StudioState) -> Self {
        let count = st.train_count();
        ProgressView {
            mode: st.mode,
            trained: st.progress.trained,
            epochs: st.epochs,
            data_index: st.progress.data_index,
            count,
            fraction: st.progress.fraction(count),
            last_error: st.history.last(),
        }
    }
}

#[derive(Serialize)]
struct HistoryView {
    values: Vec<f32>,
    min: Option<f32>,
    max: Option<f32>,
}

#[derive(Serialize)]
struct NetworkView<'a> {
    topology: Vec<usize>,
    output_labels: &'a [String],
    learn_rate: f32,
    parameters: usize,
    progress: ProgressView,
    prediction: Option<Prediction>,
    history: HistoryView,
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    layers: Option<&'a [Layer]>,
}

/// GET /network: everything the viewer draws: topology, activations,
/// weights and the recent error graph. `?weights=0` leaves out the layers.
pub fn handle_network(query: &str, state: &SharedState) -> HttpResponse {
    let include_layers = !matches!(query_param(query, "weights"), Some("0") | Some("false"));
    let st = lock(state);

    let view = NetworkView {
        topology: st.network.topology(),
        output_labels: st.network.output_labels(),
        learn_rate: st.network.learn_rate(),
        parameters: st.network.parameter_count(),
        progress: ProgressView::of(&st),
        prediction: st.network.prediction(),
        history: HistoryView {
            values: st.history.iter().collect(),
            min: st.history.min(),
            max: st.history.max(),
        },
        message: st.message.as_deref(),
        layers: include_layers.then(|| st.network.layers()),
    };
    ok(&view)
}

/// GET /progress
pub fn handle_progress(state: &SharedState) -> HttpResponse {
    let st = lock(state);
    ok(&ProgressView::of(&st))
}
