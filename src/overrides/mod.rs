//! Override settings of an existing profile from text.
//!
//! The text holds one `key=value` entry per line, using the keys shown by
//! [`crate::debug::format_debug`]:
//!
//! ```text
//! # shorter run with a larger batch
//! nepoch=50
//! batch_size=64
//! optimizer_g=Adam
//! optimizer_g_lr=0.001
//! adversarial_streams=true,true,false,false
//! windows=0 0 1.0;1 1 -0.5 0.0 0.5
//! ```
//!
//! - Lists are comma-separated.
//! - Booleans are `true`, `false`, `1` or `0`.
//! - Optimizer parameters use the `optimizer_{g,d}_{lr,weight_decay}` keys.
//! - `windows` takes `;`-separated `left right coefficients...` rows.
//!
//! The architecture of either network cannot be changed this way. When a stream
//! setting is overridden, the widths each network declares are derived again from
//! the new streams; `generator_out_dim` and `discriminator_in_dim` set them explicitly.

use std::path::PathBuf;

use serde::Deserialize;

use crate::optimizer::{OptimizerKind, OptimizerOptions};
use crate::options::{F0InterpolationKind, SubphoneFeatures};
use crate::profile::{ConfigurationProfile, ProfileError, build_profile};
use crate::stream::{DeclaredSizes, StreamSchema, validate};
use crate::window::Windows;

mod de;
mod error;
mod window;

pub use de::from_str;
pub use error::DeserializeError;
pub use window::parse_window_rows;

/// Settings to replace; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Overrides {
    pub use_phone_alignment: Option<bool>,
    pub subphone_features: Option<SubphoneFeatures>,
    pub add_frame_features: Option<bool>,
    pub question_path: Option<PathBuf>,

    pub order: Option<usize>,
    pub frame_period: Option<usize>,
    pub f0_interpolation_kind: Option<F0InterpolationKind>,

    #[serde(deserialize_with = "window::deserialize_windows")]
    pub windows: Option<Windows>,
    pub stream_sizes: Option<Vec<usize>>,
    pub has_dynamic_features: Option<Vec<bool>>,
    pub adversarial_streams: Option<Vec<bool>>,
    pub mask_0th_mgc_for_adv_loss: Option<bool>,

    pub generator_out_dim: Option<usize>,
    pub generator_add_noise: Option<bool>,
    pub generator_noise_dim: Option<usize>,
    pub optimizer_g: Option<OptimizerKind>,
    pub optimizer_g_lr: Option<f64>,
    pub optimizer_g_weight_decay: Option<f64>,

    pub discriminator_in_dim: Option<usize>,
    pub discriminator_linguistic_condition: Option<bool>,
    pub optimizer_d: Option<OptimizerKind>,
    pub optimizer_d_lr: Option<f64>,
    pub optimizer_d_weight_decay: Option<f64>,

    pub nepoch: Option<usize>,
    pub lr_decay_schedule: Option<bool>,
    pub lr_decay_epoch: Option<usize>,

    pub batch_size: Option<usize>,
    pub num_workers: Option<usize>,
    pub pin_memory: Option<bool>,
    pub cache_size: Option<usize>,
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn set_optimizer(
    optimizer: &mut OptimizerOptions,
    kind: Option<OptimizerKind>,
    lr: Option<f64>,
    weight_decay: Option<f64>,
) {
    set(&mut optimizer.kind, kind);
    set(&mut optimizer.lr, lr);
    set(&mut optimizer.weight_decay, weight_decay);
}

impl Overrides {
    /// Build a new profile from `profile` with these settings replaced.
    ///
    /// The result goes through [`build_profile`] again; `profile` itself is left as is.
    pub fn apply(
        self,
        profile: &ConfigurationProfile,
    ) -> Result<ConfigurationProfile, ProfileError> {
        let unsupported = |key| ProfileError::UnsupportedOverride {
            profile: profile.name().to_string(),
            key,
        };

        let mut options = profile.options().clone();

        match options.linguistic.as_mut() {
            Some(linguistic) => {
                set(&mut linguistic.use_phone_alignment, self.use_phone_alignment);
                set(
                    &mut linguistic.subphone_features,
                    self.subphone_features.map(Some),
                );
                set(&mut linguistic.add_frame_features, self.add_frame_features);
                set(&mut linguistic.question_path, self.question_path);
            }
            None => {
                if let Some((key, _)) = [
                    ("use_phone_alignment", self.use_phone_alignment.is_some()),
                    ("subphone_features", self.subphone_features.is_some()),
                    ("add_frame_features", self.add_frame_features.is_some()),
                    ("question_path", self.question_path.is_some()),
                ]
                .into_iter()
                .find(|(_, requested)| *requested)
                {
                    return Err(unsupported(key));
                }
            }
        }

        match options.acoustic.as_mut() {
            Some(acoustic) => {
                set(&mut acoustic.order, self.order);
                set(&mut acoustic.frame_period, self.frame_period);
                set(
                    &mut acoustic.f0_interpolation_kind,
                    self.f0_interpolation_kind.map(Some),
                );
            }
            None => {
                if let Some((key, _)) = [
                    ("order", self.order.is_some()),
                    ("frame_period", self.frame_period.is_some()),
                    ("f0_interpolation_kind", self.f0_interpolation_kind.is_some()),
                ]
                .into_iter()
                .find(|(_, requested)| *requested)
                {
                    return Err(unsupported(key));
                }
            }
        }

        set(&mut options.generator.add_noise, self.generator_add_noise);
        set(&mut options.generator.noise_dim, self.generator_noise_dim);
        set_optimizer(
            &mut options.generator.optimizer,
            self.optimizer_g,
            self.optimizer_g_lr,
            self.optimizer_g_weight_decay,
        );

        set(
            &mut options.discriminator.linguistic_condition,
            self.discriminator_linguistic_condition,
        );
        set_optimizer(
            &mut options.discriminator.optimizer,
            self.optimizer_d,
            self.optimizer_d_lr,
            self.optimizer_d_weight_decay,
        );

        set(&mut options.schedule.nepoch, self.nepoch);
        set(&mut options.schedule.lr_decay_schedule, self.lr_decay_schedule);
        set(&mut options.schedule.lr_decay_epoch, self.lr_decay_epoch);

        set(&mut options.data_loader.batch_size, self.batch_size);
        set(&mut options.data_loader.num_workers, self.num_workers);
        set(&mut options.data_loader.pin_memory, self.pin_memory);
        set(&mut options.data_loader.cache_size, self.cache_size);

        let streams_changed = self.windows.is_some()
            || self.stream_sizes.is_some()
            || self.has_dynamic_features.is_some()
            || self.adversarial_streams.is_some()
            || self.mask_0th_mgc_for_adv_loss.is_some();

        let current = profile.schema().schema();
        let schema = StreamSchema::from_arrays(
            &self.stream_sizes.unwrap_or_else(|| current.stream_sizes()),
            &self
                .has_dynamic_features
                .unwrap_or_else(|| current.has_dynamic_features()),
            &self
                .adversarial_streams
                .unwrap_or_else(|| current.adversarial_streams()),
            self.windows.unwrap_or_else(|| current.windows().clone()),
            self.mask_0th_mgc_for_adv_loss
                .unwrap_or(current.mask_0th_for_adversarial()),
        )?;

        let generator = &mut options.generator.kind;
        let discriminator = &mut options.discriminator.kind;
        if streams_changed {
            let derived = validate(&schema, DeclaredSizes::default())?;
            if generator.out_dim().is_some() {
                generator.set_out_dim(Some(derived.total_size()));
            }
            if generator.static_dim().is_some() {
                generator.set_static_dim(derived.static_sizes().iter().sum());
            }
            if discriminator.in_dim().is_some() {
                discriminator.set_in_dim(Some(derived.adversarial_size()));
            }
        }
        if let Some(out_dim) = self.generator_out_dim {
            generator.set_out_dim(Some(out_dim));
        }
        if let Some(in_dim) = self.discriminator_in_dim {
            discriminator.set_in_dim(Some(in_dim));
        }

        tracing::debug!(
            profile = profile.name(),
            streams_changed,
            "Applying hyperparameter overrides"
        );

        build_profile(profile.name(), schema, options)
    }
}

#[cfg(test)]
mod tests {
    use crate::debug::format_debug;
    use crate::optimizer::OptimizerKind;
    use crate::options::SubphoneFeatures;
    use crate::profile::{ProfileError, Task};
    use crate::stream::SchemaError;

    use super::{DeserializeError, Overrides, from_str};

    #[test]
    fn scalar() {
        let base = Task::TtsAcoustic.build().unwrap();
        let profile = base
            .with_overrides(concat!(
                "nepoch=50\n",
                "batch_size=64\n",
                "optimizer_g=Adam\n",
                "optimizer_g_lr=0.001\n",
                "optimizer_d=RMSprop\n",
                "subphone_features=coarse_coding\n",
            ))
            .unwrap();

        assert_eq!(profile.schedule().nepoch, 50);
        assert_eq!(profile.data_loader().batch_size, 64);
        assert_eq!(profile.generator().optimizer.kind, OptimizerKind::Adam);
        assert_eq!(profile.discriminator().optimizer.kind, OptimizerKind::RmsProp);
        approx::assert_relative_eq!(profile.generator().optimizer.lr, 0.001);
        approx::assert_relative_eq!(profile.generator().optimizer.weight_decay, 1e-5);
        assert_eq!(
            profile.linguistic().unwrap().subphone_features,
            Some(SubphoneFeatures::CoarseCoding)
        );

        // the source profile is untouched
        assert_eq!(base, Task::TtsAcoustic.build().unwrap());
    }

    #[test]
    fn order_independent() {
        let base = Task::TtsDuration.build().unwrap();
        let a = base
            .with_overrides("batch_size=16\nnum_workers=4\npin_memory=false")
            .unwrap();
        let b = base
            .with_overrides("pin_memory=0\nnum_workers=4\nbatch_size=16")
            .unwrap();
        assert_eq!(format_debug(&a), format_debug(&b));
        assert_ne!(format_debug(&a), format_debug(&base));
    }

    #[test]
    fn documented_example() {
        let base = Task::TtsAcoustic.build().unwrap();
        let profile = base
            .with_overrides(concat!(
                "# shorter run with a larger batch\n",
                "nepoch=50\n",
                "batch_size=64\n",
                "optimizer_g=Adam\n",
                "optimizer_g_lr=0.001\n",
                "adversarial_streams=true,true,false,false\n",
                "windows=0 0 1.0;1 1 -0.5 0.0 0.5\n",
            ))
            .unwrap();
        assert_eq!(profile.total_size(), 25 * 2 + 2 + 1 + 2);
        assert_eq!(profile.adversarial_size(), 50 + 2 - 1);
        assert_eq!(profile.discriminator().kind.in_dim(), Some(51));
        assert!(!profile.discriminator().linguistic_condition);
    }

    #[test]
    fn streams() {
        let base = Task::TtsAcoustic.build().unwrap();
        let profile = base
            .with_overrides("adversarial_streams=true,true,false,false")
            .unwrap();
        assert_eq!(profile.adversarial_size(), 74 + 3);
        assert_eq!(profile.discriminator().kind.in_dim(), Some(77));

        let static_only = base.with_overrides("windows=0 0 1.0").unwrap();
        assert_eq!(static_only.total_size(), 28);
        assert_eq!(static_only.adversarial_size(), 24);

        let vc = Task::Vc.build().unwrap();
        let two_windows = vc.with_overrides("windows=0 0 1.0;1 1 -0.5 0.0 0.5").unwrap();
        assert_eq!(two_windows.total_size(), 118);
        assert_eq!(two_windows.discriminator().kind.in_dim(), Some(118));

        let wider = vc.with_overrides("stream_sizes=60").unwrap();
        assert_eq!(wider.total_size(), 180);
        assert_eq!(wider.generator().kind.static_dim(), Some(60));
    }

    #[test]
    fn revalidated() {
        let base = Task::TtsAcoustic.build().unwrap();
        assert_eq!(
            base.with_overrides("stream_sizes=25,1,1"),
            Err(ProfileError::Schema(SchemaError::LengthMismatch {
                stream_sizes: 3,
                has_dynamic_features: 4,
                adversarial_streams: 4,
            }))
        );
        assert_eq!(
            base.with_overrides(
                "adversarial_streams=true,true,false,false\ndiscriminator_in_dim=74"
            ),
            Err(ProfileError::Schema(SchemaError::AdversarialSizeMismatch {
                declared: Some(74),
                computed: 77,
            }))
        );
        assert_eq!(
            base.with_overrides("generator_out_dim=80"),
            Err(ProfileError::Schema(SchemaError::TotalSizeMismatch {
                declared: 80,
                computed: 82,
            }))
        );
    }

    #[test]
    fn overflow() {
        let vc = Task::Vc.build().unwrap();
        assert_eq!(
            vc.with_overrides("batch_size=99999999999999999999999"),
            Err(ProfileError::Deserialize(DeserializeError::ExpectedInteger(
                "99999999999999999999999".to_string()
            )))
        );
        assert_eq!(
            vc.with_overrides("stream_sizes=9223372036854775807"),
            Err(ProfileError::Schema(SchemaError::SizeOverflow { stream: 0 }))
        );
        let err = vc
            .with_overrides("windows=0 0 1.0;18446744073709551615 0 1.0")
            .unwrap_err();
        let ProfileError::Deserialize(DeserializeError::Message(message)) = err else {
            panic!("unexpected error: {err}");
        };
        assert!(message.contains("Window #1"), "{message}");
    }

    #[test]
    fn bad_windows() {
        let base = Task::Vc.build().unwrap();
        let err = base
            .with_overrides("windows=0 0 1.0;1 1 -0.5 0.5")
            .unwrap_err();
        let ProfileError::Deserialize(DeserializeError::Message(message)) = err else {
            panic!("unexpected error: {err}");
        };
        assert!(message.contains("Window #1"), "{message}");
    }

    #[test]
    fn unsupported() {
        let vc = Task::Vc.build().unwrap();
        assert_eq!(
            vc.with_overrides("question_path=/tmp/questions.hed"),
            Err(ProfileError::UnsupportedOverride {
                profile: "vc".to_string(),
                key: "question_path",
            })
        );

        let duration = Task::TtsDuration.build().unwrap();
        assert_eq!(
            duration.with_overrides("order=39"),
            Err(ProfileError::UnsupportedOverride {
                profile: "duration".to_string(),
                key: "order",
            })
        );
    }

    #[test]
    fn unknown_key() {
        let err = from_str::<Overrides>("generator=MLP").unwrap_err();
        assert!(matches!(err, DeserializeError::Message(_)), "{err}");
    }

    #[test]
    fn empty() {
        assert_eq!(from_str::<Overrides>("").unwrap(), Overrides::default());
        let vc = Task::Vc.build().unwrap();
        assert_eq!(vc.with_overrides("\n").unwrap(), vc);
    }
}
