//! Hyperparameter profiles for adversarially trained voice conversion and TTS models.
//!
//! A profile ties together the layout of the acoustic feature streams, the delta
//! windows applied to them, and the generator/discriminator settings. Every width
//! that can be derived from the streams is checked against the declared
//! architectures when the profile is built.
//!
//! ```
//! use gantts_hparams::Task;
//!
//! let profile = Task::TtsAcoustic.build()?;
//! assert_eq!(profile.total_size(), 82);
//! assert_eq!(profile.adversarial_size(), 74);
//! # Ok::<(), gantts_hparams::ProfileError>(())
//! ```

pub mod architecture;
pub mod debug;
pub mod optimizer;
pub mod options;
#[cfg(feature = "overrides")]
pub mod overrides;
pub mod profile;
pub mod stream;
pub mod window;

pub use debug::format_debug;
pub use profile::{ConfigurationProfile, ProfileError, Task, build_profile};
pub use stream::{StreamSchema, ValidatedSchema, validate};
pub use window::{Windows, build_window_set};
