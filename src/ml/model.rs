use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
        Relu,
    },
    prelude::*,
    tensor::activation::log_softmax,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::batcher::DigitBatch;
use crate::domain::{IMAGE_SIDE, NUM_CLASSES};

const KERNEL: usize = 3;
const POOL: usize = 2;

#[derive(Config, Debug)]
pub struct DigitCnnConfig {
    #[config(default = 10)]
    pub num_classes:    usize,
    #[config(default = 32)]
    pub conv1_channels: usize,
    #[config(default = 64)]
    pub conv2_channels: usize,
    #[config(default = 128)]
    pub hidden:         usize,
    #[config(default = 0.25)]
    pub conv_dropout:   f64,
    #[config(default = 0.5)]
    pub dense_dropout:  f64,
}

impl From<&TrainConfig> for DigitCnnConfig {
    fn from(cfg: &TrainConfig) -> Self {
        DigitCnnConfig::new()
            .with_num_classes(NUM_CLASSES)
            .with_hidden(cfg.hidden)
            .with_conv_dropout(cfg.conv_dropout)
            .with_dense_dropout(cfg.dense_dropout)
    }
}

impl DigitCnnConfig {
    /// Side length after two valid 3×3 convolutions and a 2×2 pool: 28 → 26 → 24 → 12
    pub fn pooled_side(&self) -> usize {
        (IMAGE_SIDE - 2 * (KERNEL - 1)) / POOL
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> DigitCnn<B> {
        let conv1 = Conv2dConfig::new([1, self.conv1_channels], [KERNEL, KERNEL]).init(device);
        let conv2 = Conv2dConfig::new([self.conv1_channels, self.conv2_channels], [KERNEL, KERNEL])
            .init(device);
        let pool = MaxPool2dConfig::new([POOL, POOL]).with_strides([POOL, POOL]).init();

        let flattened = self.conv2_channels * self.pooled_side() * self.pooled_side();
        let fc1 = LinearConfig::new(flattened, self.hidden).init(device);
        let fc2 = LinearConfig::new(self.hidden, self.num_classes).init(device);

        DigitCnn {
            conv1, conv2, pool,
            conv_dropout:  DropoutConfig::new(self.conv_dropout).init(),
            fc1,
            dense_dropout: DropoutConfig::new(self.dense_dropout).init(),
            fc2,
            activation: Relu::new(),
        }
    }
}

/// conv(32) → conv(64) → maxpool → dropout → flatten → dense(128) → dropout → dense(10)
#[derive(Module, Debug)]
pub struct DigitCnn<B: Backend> {
    pub conv1:         Conv2d<B>,
    pub conv2:         Conv2d<B>,
    pub pool:          MaxPool2d,
    pub conv_dropout:  Dropout,
    pub fc1:           Linear<B>,
    pub dense_dropout: Dropout,
    pub fc2:           Linear<B>,
    pub activation:    Relu,
}

pub struct DigitOutput<B: Backend> {
    pub loss:   Tensor<B, 1>,
    pub logits: Tensor<B, 2>,
    pub labels: Tensor<B, 1, Int>,
}

impl<B: Backend> DigitCnn<B> {
    /// images: [batch, 1, 28, 28] → logits: [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.conv1.forward(images));
        let x = self.activation.forward(self.conv2.forward(x));
        let x = self.conv_dropout.forward(self.pool.forward(x));

        let x = x.flatten::<2>(1, 3);
        let x = self.activation.forward(self.fc1.forward(x));
        let x = self.dense_dropout.forward(x);
        self.fc2.forward(x)
    }

    pub fn forward_loss(&self, batch: DigitBatch<B>) -> DigitOutput<B> {
        let logits = self.forward(batch.images);
        let loss   = categorical_cross_entropy(logits.clone(), batch.targets);
        DigitOutput { loss, logits, labels: batch.labels }
    }
}

/// Mean over the batch of `-Σ_c y_c · log softmax(z)_c` against one-hot targets.
pub fn categorical_cross_entropy<B: Backend>(
    logits:  Tensor<B, 2>,
    targets: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let log_probs = log_softmax(logits, 1);
    (log_probs * targets).sum_dim(1).neg().mean()
}

/// Number of rows whose argmax matches the label.
pub fn count_correct<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> usize {
    // argmax(1) returns [batch, 1]; flatten before comparing with [batch]
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    predicted
        .equal(labels)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}
