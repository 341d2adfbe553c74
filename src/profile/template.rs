use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use crate::architecture::{DiscriminatorKind, GeneratorKind, HighwayParams, MlpParams, RnnParams};
use crate::optimizer::OptimizerOptions;
use crate::options::{
    AcousticOptions, DataLoaderOptions, DiscriminatorOptions, F0InterpolationKind,
    GeneratorOptions, LinguisticOptions, ScalarOptions, ScheduleOptions, SubphoneFeatures,
};
use crate::stream::StreamSchema;
use crate::window::build_window_set;

use super::{ConfigurationProfile, ProfileError, build_profile};

/// Tasks with a built-in hyperparameter template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// Voice conversion.
    Vc,
    /// Phoneme duration model for TTS.
    TtsDuration,
    /// Acoustic model for TTS.
    TtsAcoustic,
}

impl Task {
    /// Profile name recorded in the built profile.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Vc => "vc",
            Self::TtsDuration => "duration",
            Self::TtsAcoustic => "acoustic",
        }
    }

    /// Stream layout and options of the built-in template, not yet validated.
    pub fn template(&self) -> Result<(StreamSchema, ScalarOptions), ProfileError> {
        match self {
            Self::Vc => vc(),
            Self::TtsDuration => tts_duration(),
            Self::TtsAcoustic => tts_acoustic(),
        }
    }

    pub fn build(&self) -> Result<ConfigurationProfile, ProfileError> {
        let (schema, options) = self.template()?;
        build_profile(self.name(), schema, options)
    }
}

impl Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Task {
    type Err = ProfileError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vc" => Ok(Self::Vc),
            "tts_duration" | "duration" => Ok(Self::TtsDuration),
            "tts_acoustic" | "acoustic" => Ok(Self::TtsAcoustic),
            _ => Err(ProfileError::UnknownTask(s.to_string())),
        }
    }
}

/// Question set shipped with the recipe data.
pub fn default_question_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("nnmnkwii_gallery")
        .join("data")
        .join("questions-radio_dnn_416.hed")
}

fn delta_windows() -> Vec<(usize, usize, Vec<f64>)> {
    vec![
        (0, 0, vec![1.0]),
        (1, 1, vec![-0.5, 0.0, 0.5]),
        (1, 1, vec![1.0, -2.0, 1.0]),
    ]
}

fn data_loader(batch_size: usize) -> DataLoaderOptions {
    DataLoaderOptions {
        batch_size,
        num_workers: 1,
        pin_memory: true,
        cache_size: 1200,
    }
}

fn mlp_discriminator(in_dim: Option<usize>) -> DiscriminatorKind {
    DiscriminatorKind::Mlp(MlpParams {
        in_dim,
        out_dim: Some(1),
        num_hidden: 2,
        hidden_dim: 256,
        dropout: 0.5,
        last_sigmoid: true,
    })
}

fn vc() -> Result<(StreamSchema, ScalarOptions), ProfileError> {
    let acoustic = AcousticOptions {
        order: 59,
        frame_period: 5,
        f0_interpolation_kind: None,
    };

    // 0th coefficient is already dropped by feature extraction
    let schema = StreamSchema::from_arrays(
        &[acoustic.order],
        &[true],
        &[true],
        build_window_set(delta_windows())?,
        false,
    )?;

    let options = ScalarOptions {
        linguistic: None,
        generator: GeneratorOptions {
            kind: GeneratorKind::In2OutHighway(HighwayParams {
                in_dim: None,
                out_dim: None,
                num_hidden: 3,
                hidden_dim: 512,
                static_dim: acoustic.order,
                dropout: 0.5,
            }),
            add_noise: false,
            noise_dim: 200,
            optimizer: OptimizerOptions::adagrad(0.01, 0.0),
        },
        discriminator: DiscriminatorOptions {
            kind: mlp_discriminator(Some(acoustic.order * 3)),
            linguistic_condition: false,
            optimizer: OptimizerOptions::adagrad(0.01, 0.0),
        },
        schedule: ScheduleOptions {
            nepoch: 200,
            lr_decay_schedule: false,
            lr_decay_epoch: 10,
        },
        data_loader: data_loader(20),
        acoustic: Some(acoustic),
    };

    Ok((schema, options))
}

fn tts_duration() -> Result<(StreamSchema, ScalarOptions), ProfileError> {
    let schema = StreamSchema::from_arrays(
        &[5],
        &[false],
        &[true],
        build_window_set(vec![(0, 0, vec![1.0])])?,
        false,
    )?;

    let options = ScalarOptions {
        linguistic: Some(LinguisticOptions {
            use_phone_alignment: false,
            subphone_features: None,
            add_frame_features: false,
            question_path: default_question_path(),
        }),
        acoustic: None,
        generator: GeneratorOptions {
            kind: GeneratorKind::LstmRnn(RnnParams {
                in_dim: None,
                out_dim: None,
                num_hidden: 3,
                hidden_dim: 512,
                bidirectional: true,
                dropout: 0.5,
                last_sigmoid: false,
            }),
            add_noise: false,
            noise_dim: 200,
            optimizer: OptimizerOptions::adagrad(0.01, 1e-5),
        },
        discriminator: DiscriminatorOptions {
            kind: mlp_discriminator(None),
            linguistic_condition: false,
            optimizer: OptimizerOptions::adagrad(0.01, 1e-5),
        },
        schedule: ScheduleOptions {
            nepoch: 200,
            lr_decay_schedule: false,
            lr_decay_epoch: 25,
        },
        data_loader: data_loader(32),
    };

    Ok((schema, options))
}

fn tts_acoustic() -> Result<(StreamSchema, ScalarOptions), ProfileError> {
    let acoustic = AcousticOptions {
        order: 24,
        frame_period: 5,
        f0_interpolation_kind: Some(F0InterpolationKind::Slinear),
    };

    // (mgc, lf0, vuv, bap)
    let mgc = acoustic.order + 1;
    let schema = StreamSchema::from_arrays(
        &[mgc, 1, 1, 1],
        &[true, true, false, true],
        &[true, false, false, false],
        build_window_set(delta_windows())?,
        // power coefficient says little about natural vs. generated frames
        true,
    )?;

    let options = ScalarOptions {
        linguistic: Some(LinguisticOptions {
            use_phone_alignment: false,
            subphone_features: Some(SubphoneFeatures::Full),
            add_frame_features: true,
            question_path: default_question_path(),
        }),
        generator: GeneratorOptions {
            kind: GeneratorKind::Mlp(MlpParams {
                in_dim: None,
                out_dim: None,
                num_hidden: 3,
                hidden_dim: 512,
                dropout: 0.5,
                last_sigmoid: false,
            }),
            add_noise: false,
            noise_dim: 200,
            optimizer: OptimizerOptions::adagrad(0.01, 1e-5),
        },
        discriminator: DiscriminatorOptions {
            kind: mlp_discriminator(Some(mgc * 3 - 1)),
            linguistic_condition: false,
            optimizer: OptimizerOptions::adagrad(0.01, 1e-5),
        },
        schedule: ScheduleOptions {
            nepoch: 200,
            lr_decay_schedule: false,
            lr_decay_epoch: 25,
        },
        data_loader: data_loader(26),
        acoustic: Some(acoustic),
    };

    Ok((schema, options))
}
