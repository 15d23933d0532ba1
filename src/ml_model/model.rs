use std::fmt;
use std::str::FromStr;

use burn::{
    config::Config,
    module::Module,
    nn::{
        gru::{Gru, GruConfig},
        Dropout, DropoutConfig, Linear, LinearConfig, Lstm, LstmConfig,
    },
    tensor::{activation, backend::Backend, Tensor},
};

use crate::error::ForecastError;

/// The closed set of supported recurrent architectures. Anything else is
/// rejected when the configuration is parsed, before any model is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    SimpleRnn,
    Lstm,
    Gru,
}

impl Architecture {
    pub const ALL: [Architecture; 3] =
        [Architecture::SimpleRnn, Architecture::Lstm, Architecture::Gru];

    /// Directory-friendly name for artifacts.
    pub fn key(&self) -> &'static str {
        match self {
            Architecture::SimpleRnn => "simple_rnn",
            Architecture::Lstm => "lstm",
            Architecture::Gru => "gru",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Architecture::SimpleRnn => write!(f, "SimpleRNN"),
            Architecture::Lstm => write!(f, "LSTM"),
            Architecture::Gru => write!(f, "GRU"),
        }
    }
}

impl FromStr for Architecture {
    type Err = ForecastError;

    fn from_str(tag: &str) -> Result<Architecture, ForecastError> {
        match tag {
            "SimpleRNN" => Ok(Architecture::SimpleRnn),
            "LSTM" => Ok(Architecture::Lstm),
            "GRU" => Ok(Architecture::Gru),
            other => Err(ForecastError::UnsupportedArchitecture(other.to_string())),
        }
    }
}

/// Shared shape contract of every forecaster: a batch of scaled windows
/// `[batch, time_steps, FEATURES]` in, one flattened forecast
/// `[batch, FEATURES * future_steps]` out.
pub trait Forecast<B: Backend> {
    fn forward(&self, windows: Tensor<B, 3>) -> Tensor<B, 2>;
}

#[derive(Config, Debug)]
pub struct ModelConfig {
    #[config(default = 4)]
    pub num_features: usize,
    #[config(default = 150)]
    pub hidden_size: usize,
    #[config(default = 0.2)]
    pub dropout: f64,
    #[config(default = 1)]
    pub future_steps: usize,
}

impl ModelConfig {
    pub fn output_width(&self) -> usize {
        self.num_features * self.future_steps
    }

    pub fn init_simple_rnn<B: Backend>(&self, device: &B::Device) -> SimpleRnnForecaster<B> {
        SimpleRnnForecaster {
            rnn1: SimpleRnnConfig::new(self.num_features, self.hidden_size).init(device),
            rnn2: SimpleRnnConfig::new(self.hidden_size, self.hidden_size).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            output: LinearConfig::new(self.hidden_size, self.output_width())
                .with_bias(true)
                .init(device),
        }
    }

    pub fn init_lstm<B: Backend>(&self, device: &B::Device) -> LstmForecaster<B> {
        LstmForecaster {
            rnn1: LstmConfig::new(self.num_features, self.hidden_size, true).init(device),
            rnn2: LstmConfig::new(self.hidden_size, self.hidden_size, true).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            output: LinearConfig::new(self.hidden_size, self.output_width())
                .with_bias(true)
                .init(device),
        }
    }

    pub fn init_gru<B: Backend>(&self, device: &B::Device) -> GruForecaster<B> {
        GruForecaster {
            rnn1: GruConfig::new(self.num_features, self.hidden_size, true).init(device),
            rnn2: GruConfig::new(self.hidden_size, self.hidden_size, true).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            output: LinearConfig::new(self.hidden_size, self.output_width())
                .with_bias(true)
                .init(device),
        }
    }
}

/// Hidden state of the last time step, `[batch, hidden]`.
fn last_step<B: Backend>(sequence: Tensor<B, 3>) -> Tensor<B, 2> {
    let [batch, steps, hidden] = sequence.dims();
    sequence
        .slice([0..batch, steps - 1..steps])
        .reshape([batch, hidden])
}

/// A single tanh recurrence, h_t = tanh(W_ih x_t + b + W_hh h_{t-1}).
/// burn ships Lstm and Gru but no plain Elman cell, so this one is built
/// from the same pieces its gated siblings use.
#[derive(Config, Debug)]
pub struct SimpleRnnConfig {
    pub d_input: usize,
    pub d_hidden: usize,
    #[config(default = true)]
    pub bias: bool,
}

impl SimpleRnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SimpleRnn<B> {
        SimpleRnn {
            input: LinearConfig::new(self.d_input, self.d_hidden)
                .with_bias(self.bias)
                .init(device),
            recurrent: LinearConfig::new(self.d_hidden, self.d_hidden)
                .with_bias(false)
                .init(device),
            d_hidden: self.d_hidden,
        }
    }
}

#[derive(Module, Debug)]
pub struct SimpleRnn<B: Backend> {
    input: Linear<B>,
    recurrent: Linear<B>,
    d_hidden: usize,
}

impl<B: Backend> SimpleRnn<B> {
    /// Runs the recurrence over `[batch, steps, features]` and returns the
    /// hidden state at every step, `[batch, steps, hidden]`.
    pub fn forward(&self, input: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, steps, features] = input.dims();
        let device = input.device();

        let mut hidden = Tensor::zeros([batch, self.d_hidden], &device);
        let mut states = Vec::with_capacity(steps);

        for step in 0..steps {
            let x_t = input
                .clone()
                .slice([0..batch, step..step + 1])
                .reshape([batch, features]);

            hidden = activation::tanh(self.input.forward(x_t) + self.recurrent.forward(hidden));
            states.push(hidden.clone().reshape([batch, 1, self.d_hidden]));
        }

        Tensor::cat(states, 1)
    }
}

#[derive(Module, Debug)]
pub struct SimpleRnnForecaster<B: Backend> {
    rnn1: SimpleRnn<B>,
    rnn2: SimpleRnn<B>,
    dropout: Dropout,
    output: Linear<B>,
}

impl<B: Backend> Forecast<B> for SimpleRnnForecaster<B> {
    fn forward(&self, windows: Tensor<B, 3>) -> Tensor<B, 2> {
        let sequence = self.rnn1.forward(windows);
        let sequence = self.rnn2.forward(sequence);
        let last = self.dropout.forward(last_step(sequence));
        self.output.forward(last)
    }
}

#[derive(Module, Debug)]
pub struct LstmForecaster<B: Backend> {
    rnn1: Lstm<B>,
    rnn2: Lstm<B>,
    dropout: Dropout,
    output: Linear<B>,
}

impl<B: Backend> Forecast<B> for LstmForecaster<B> {
    fn forward(&self, windows: Tensor<B, 3>) -> Tensor<B, 2> {
        let (sequence, _) = self.rnn1.forward(windows, None);
        let (sequence, _) = self.rnn2.forward(sequence, None);
        let last = self.dropout.forward(last_step(sequence));
        self.output.forward(last)
    }
}

#[derive(Module, Debug)]
pub struct GruForecaster<B: Backend> {
    rnn1: Gru<B>,
    rnn2: Gru<B>,
    dropout: Dropout,
    output: Linear<B>,
}

impl<B: Backend> Forecast<B> for GruForecaster<B> {
    fn forward(&self, windows: Tensor<B, 3>) -> Tensor<B, 2> {
        let sequence = self.rnn1.forward(windows, None);
        let sequence = self.rnn2.forward(sequence, None);
        let last = self.dropout.forward(last_step(sequence));
        self.output.forward(last)
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::ndarray::{NdArray, NdArrayDevice};

    use super::*;
    use crate::price_data::FEATURES;

    type B = NdArray;

    fn windows(batch: usize, steps: usize) -> Tensor<B, 3> {
        Tensor::zeros([batch, steps, FEATURES], &NdArrayDevice::default())
    }

    #[test]
    fn lstm_forecaster_outputs_one_value_per_feature_per_step() {
        let config = ModelConfig::new().with_hidden_size(150).with_future_steps(1);
        let model = config.init_lstm::<B>(&NdArrayDevice::default());

        let output = model.forward(windows(2, 15));
        assert_eq!(output.dims(), [2, 4]);
    }

    #[test]
    fn gru_forecaster_matches_the_output_contract() {
        let config = ModelConfig::new().with_hidden_size(32).with_future_steps(3);
        let model = config.init_gru::<B>(&NdArrayDevice::default());

        let output = model.forward(windows(4, 10));
        assert_eq!(output.dims(), [4, FEATURES * 3]);
    }

    #[test]
    fn simple_rnn_forecaster_matches_the_output_contract() {
        let config = ModelConfig::new().with_hidden_size(16);
        let model = config.init_simple_rnn::<B>(&NdArrayDevice::default());

        let output = model.forward(windows(3, 8));
        assert_eq!(output.dims(), [3, 4]);
    }

    #[test]
    fn simple_rnn_layer_returns_every_hidden_state() {
        let layer = SimpleRnnConfig::new(FEATURES, 12).init::<B>(&NdArrayDevice::default());

        let sequence = layer.forward(windows(2, 6));
        assert_eq!(sequence.dims(), [2, 6, 12]);
    }

    #[test]
    fn architecture_tags_round_trip() {
        for architecture in Architecture::ALL {
            let tag = architecture.to_string();
            assert_eq!(tag.parse::<Architecture>().unwrap(), architecture);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = "Transformer".parse::<Architecture>().unwrap_err();
        match err {
            ForecastError::UnsupportedArchitecture(tag) => assert_eq!(tag, "Transformer"),
            other => panic!("expected UnsupportedArchitecture, got {other:?}"),
        }
    }
}
