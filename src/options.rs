//! Scalar option groups of a configuration profile.

use std::fmt::Display;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::architecture::{DiscriminatorKind, GeneratorKind, Role};
use crate::optimizer::OptimizerOptions;

/// Errors in scalar options which are not tied to a single architecture or optimizer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionError {
    #[error("`{key}` must be positive")]
    NotPositive { key: &'static str },
    #[error("Noise injection is enabled, but `generator_noise_dim` is 0")]
    NoiseDim,
    #[error(
        "Discriminator is conditioned on linguistic features, but no linguistic options are set"
    )]
    MissingLinguisticOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubphoneFeatures {
    Full,
    CoarseCoding,
}

impl Display for SubphoneFeatures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => f.write_str("full"),
            Self::CoarseCoding => f.write_str("coarse_coding"),
        }
    }
}

/// Interpolation used to fill unvoiced regions of continuous F0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum F0InterpolationKind {
    Linear,
    Nearest,
    Zero,
    Slinear,
    Quadratic,
    Cubic,
}

impl Display for F0InterpolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Linear => "linear",
            Self::Nearest => "nearest",
            Self::Zero => "zero",
            Self::Slinear => "slinear",
            Self::Quadratic => "quadratic",
            Self::Cubic => "cubic",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinguisticOptions {
    pub use_phone_alignment: bool,
    pub subphone_features: Option<SubphoneFeatures>,
    pub add_frame_features: bool,
    /// HTS-style question set, read by the linguistic feature extractor.
    pub question_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcousticOptions {
    /// Mel-cepstrum order; the mgc stream has `order + 1` static features.
    pub order: usize,
    /// Frame period in milliseconds.
    pub frame_period: usize,
    pub f0_interpolation_kind: Option<F0InterpolationKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorOptions {
    pub kind: GeneratorKind,
    pub add_noise: bool,
    pub noise_dim: usize,
    pub optimizer: OptimizerOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscriminatorOptions {
    pub kind: DiscriminatorKind,
    /// Feed linguistic features to the discriminator together with the adversarial streams.
    pub linguistic_condition: bool,
    pub optimizer: OptimizerOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleOptions {
    pub nepoch: usize,
    pub lr_decay_schedule: bool,
    pub lr_decay_epoch: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLoaderOptions {
    pub batch_size: usize,
    pub num_workers: usize,
    pub pin_memory: bool,
    /// Number of utterances kept in memory.
    pub cache_size: usize,
}

/// Every setting of a profile except the stream layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarOptions {
    pub linguistic: Option<LinguisticOptions>,
    pub acoustic: Option<AcousticOptions>,
    pub generator: GeneratorOptions,
    pub discriminator: DiscriminatorOptions,
    pub schedule: ScheduleOptions,
    pub data_loader: DataLoaderOptions,
}

impl ScalarOptions {
    /// Check the options which do not depend on the stream layout.
    pub(crate) fn validate(&self) -> Result<(), crate::ProfileError> {
        self.generator.kind.validate()?;
        self.discriminator.kind.validate()?;
        self.generator.optimizer.validate(Role::Generator)?;
        self.discriminator.optimizer.validate(Role::Discriminator)?;

        if self.generator.add_noise && self.generator.noise_dim == 0 {
            return Err(OptionError::NoiseDim.into());
        }
        if self.discriminator.linguistic_condition && self.linguistic.is_none() {
            return Err(OptionError::MissingLinguisticOptions.into());
        }
        if let Some(ref acoustic) = self.acoustic {
            if acoustic.frame_period == 0 {
                return Err(OptionError::NotPositive {
                    key: "frame_period",
                }
                .into());
            }
        }
        if self.schedule.nepoch == 0 {
            return Err(OptionError::NotPositive { key: "nepoch" }.into());
        }
        if self.schedule.lr_decay_schedule && self.schedule.lr_decay_epoch == 0 {
            return Err(OptionError::NotPositive {
                key: "lr_decay_epoch",
            }
            .into());
        }
        if self.data_loader.batch_size == 0 {
            return Err(OptionError::NotPositive { key: "batch_size" }.into());
        }
        Ok(())
    }
}
