use burn::{
    data::dataloader::batcher::Batcher,
    tensor::{backend::Backend, Data, Shape, Tensor},
};

use crate::price_data::FEATURES;

use super::data_loader::WindowSample;

#[derive(Clone)]
pub struct WindowBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> WindowBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

#[derive(Clone, Debug)]
pub struct WindowBatch<B: Backend> {
    /// `[batch, time_steps, FEATURES]`
    pub inputs: Tensor<B, 3>,
    /// `[batch, FEATURES * future_steps]`
    pub targets: Tensor<B, 2>,
}

impl<B: Backend> Batcher<WindowSample, WindowBatch<B>> for WindowBatcher<B> {
    fn batch(&self, items: Vec<WindowSample>) -> WindowBatch<B> {
        let inputs = items
            .iter()
            .map(|item| {
                let time_steps = item.input.len();
                let flat: Vec<f64> = item
                    .input
                    .iter()
                    .flat_map(|row| row.iter().copied())
                    .collect();
                let data = Data::new(flat, Shape::new([time_steps * FEATURES]));
                Tensor::<B, 1>::from_data(data.convert(), &self.device)
                    .reshape([1, time_steps, FEATURES])
            })
            .collect();

        let targets = items
            .iter()
            .map(|item| {
                let width = item.target.len();
                let data = Data::new(item.target.clone(), Shape::new([width]));
                Tensor::<B, 1>::from_data(data.convert(), &self.device).reshape([1, width])
            })
            .collect();

        let inputs = Tensor::cat(inputs, 0);
        let targets = Tensor::cat(targets, 0);

        WindowBatch { inputs, targets }
    }
}
