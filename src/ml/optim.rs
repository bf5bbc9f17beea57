// ============================================================
// Layer 5: Adadelta Optimiser
// ============================================================
// Burn ships SGD, Adam, AdamW, AdaGrad and RMSProp but not
// Adadelta, so it is plugged in through Burn's SimpleOptimizer
// extension point. The OptimizerAdaptor then handles parameter
// traversal, missing gradients and state records for us.
//
// Per parameter θ with gradient g (Zeiler, 2012):
//
//   E[g²]  = ρ·E[g²]  + (1-ρ)·g²
//   Δ      = g · √(E[Δ²] + ε) / √(E[g²] + ε)
//   θ      = θ - lr·Δ
//   E[Δ²]  = ρ·E[Δ²]  + (1-ρ)·Δ²
//
// Both running averages start at zero.
//
// Reference: Zeiler (2012) ADADELTA: An Adaptive Learning Rate Method
//            Burn Book §5 (Custom optimisers)

use burn::{
    grad_clipping::GradientClippingConfig,
    module::AutodiffModule,
    optim::{adaptor::OptimizerAdaptor, SimpleOptimizer},
    prelude::*,
    record::Record,
    tensor::backend::AutodiffBackend,
    LearningRate,
};

/// Adadelta configuration.
#[derive(Config)]
pub struct AdadeltaConfig {
    /// Decay rate of both running averages.
    #[config(default = 0.95)]
    pub rho: f32,
    /// Keeps the square roots away from zero.
    #[config(default = 1e-7)]
    pub epsilon: f32,
    /// [Gradient Clipping](GradientClippingConfig) config.
    pub grad_clipping: Option<GradientClippingConfig>,
}

#[derive(Clone, Debug)]
pub struct Adadelta {
    rho:     f32,
    epsilon: f32,
}

/// Running averages kept per parameter tensor.
#[derive(Record, Clone)]
pub struct AdadeltaState<B: Backend, const D: usize> {
    /// E[g²]
    pub square_avg: Tensor<B, D>,
    /// E[Δ²]
    pub delta_avg:  Tensor<B, D>,
}

impl<B: Backend> SimpleOptimizer<B> for Adadelta {
    type State<const D: usize> = AdadeltaState<B, D>;

    fn step<const D: usize>(
        &self,
        lr:     LearningRate,
        tensor: Tensor<B, D>,
        grad:   Tensor<B, D>,
        state:  Option<Self::State<D>>,
    ) -> (Tensor<B, D>, Option<Self::State<D>>) {
        let (square_avg, delta_avg) = match state {
            Some(state) => (state.square_avg, state.delta_avg),
            None        => (grad.zeros_like(), grad.zeros_like()),
        };
        let decay = 1.0 - self.rho;

        let square_avg = square_avg
            .mul_scalar(self.rho)
            .add(grad.clone().powf_scalar(2.0).mul_scalar(decay));

        let rms_grad  = square_avg.clone().add_scalar(self.epsilon).sqrt();
        let rms_delta = delta_avg.clone().add_scalar(self.epsilon).sqrt();
        let delta     = rms_delta.div(rms_grad).mul(grad);

        let delta_avg = delta_avg
            .mul_scalar(self.rho)
            .add(delta.clone().powf_scalar(2.0).mul_scalar(decay));

        let state = AdadeltaState { square_avg, delta_avg };
        (tensor - delta.mul_scalar(lr), Some(state))
    }

    fn to_device<const D: usize>(mut state: Self::State<D>, device: &B::Device) -> Self::State<D> {
        state.square_avg = state.square_avg.to_device(device);
        state.delta_avg  = state.delta_avg.to_device(device);
        state
    }
}

impl AdadeltaConfig {
    /// Build an optimiser usable with `Optimizer::step(lr, module, grads)`.
    pub fn init<B: AutodiffBackend, M: AutodiffModule<B>>(
        &self,
    ) -> OptimizerAdaptor<Adadelta, M, B> {
        let optim = Adadelta { rho: self.rho, epsilon: self.epsilon };

        let mut optim = OptimizerAdaptor::from(optim);
        if let Some(config) = &self.grad_clipping {
            optim = optim.with_grad_clipping(config.init());
        }
        optim
    }
}
