//! Validated, immutable configuration bundle for one task.

use std::fmt::Display;

use crate::architecture::ArchitectureError;
use crate::optimizer::OptimizerError;
use crate::options::{
    AcousticOptions, DataLoaderOptions, DiscriminatorOptions, GeneratorOptions, LinguisticOptions,
    OptionError, ScalarOptions, ScheduleOptions,
};
use crate::stream::{DeclaredSizes, SchemaError, StreamSchema, ValidatedSchema, validate};
use crate::window::{WindowError, Windows};

mod template;

pub use template::{Task, default_question_path};

/// Errors while assembling a [`ConfigurationProfile`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("Invalid window table: {0}")]
    Window(#[from] WindowError),
    #[error("Invalid stream schema: {0}")]
    Schema(#[from] SchemaError),
    #[error("Invalid architecture: {0}")]
    Architecture(#[from] ArchitectureError),
    #[error("Invalid optimizer: {0}")]
    Optimizer(#[from] OptimizerError),
    #[error("Invalid option: {0}")]
    Option(#[from] OptionError),

    #[error("Unknown task {0}")]
    UnknownTask(String),

    #[cfg(feature = "overrides")]
    #[error("Failed to parse overrides: {0}")]
    Deserialize(#[from] crate::overrides::DeserializeError),
    #[cfg(feature = "overrides")]
    #[error("Profile {profile} has no `{key}` setting to override")]
    UnsupportedOverride { profile: String, key: &'static str },
}

/// Fully validated hyperparameters for one task.
///
/// A profile is never modified after [`build_profile`] returns it;
/// derive a new one to change a setting.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationProfile {
    name: String,
    schema: ValidatedSchema,
    options: ScalarOptions,
}

impl ConfigurationProfile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &ValidatedSchema {
        &self.schema
    }
    pub fn windows(&self) -> &Windows {
        self.schema.windows()
    }
    /// Generator output width.
    pub fn total_size(&self) -> usize {
        self.schema.total_size()
    }
    /// Discriminator input width, without linguistic conditioning.
    pub fn adversarial_size(&self) -> usize {
        self.schema.adversarial_size()
    }

    pub fn options(&self) -> &ScalarOptions {
        &self.options
    }
    pub fn linguistic(&self) -> Option<&LinguisticOptions> {
        self.options.linguistic.as_ref()
    }
    pub fn acoustic(&self) -> Option<&AcousticOptions> {
        self.options.acoustic.as_ref()
    }
    pub fn generator(&self) -> &GeneratorOptions {
        &self.options.generator
    }
    pub fn discriminator(&self) -> &DiscriminatorOptions {
        &self.options.discriminator
    }
    pub fn schedule(&self) -> &ScheduleOptions {
        &self.options.schedule
    }
    pub fn data_loader(&self) -> &DataLoaderOptions {
        &self.options.data_loader
    }

    /// Build a new profile from this one with the settings in `text` replaced.
    ///
    /// See [`crate::overrides`] for the format.
    #[cfg(feature = "overrides")]
    pub fn with_overrides(&self, text: &str) -> Result<Self, ProfileError> {
        let overrides: crate::overrides::Overrides = crate::overrides::from_str(text)?;
        overrides.apply(self)
    }
}

impl Display for ConfigurationProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&crate::debug::format_debug(self))
    }
}

/// Validate `stream_schema` and `scalar_options` together and bundle them.
pub fn build_profile(
    name: impl Into<String>,
    stream_schema: StreamSchema,
    scalar_options: ScalarOptions,
) -> Result<ConfigurationProfile, ProfileError> {
    let name = name.into();

    let generator = &scalar_options.generator.kind;
    let discriminator = &scalar_options.discriminator;

    // The conditioned discriminator also sees linguistic features, whose width is
    // only known to the feature extractor.
    let discriminator_in_dim = if discriminator.linguistic_condition {
        if let Some(in_dim) = discriminator.kind.in_dim() {
            tracing::warn!(
                profile = %name,
                in_dim,
                "Discriminator is conditioned on linguistic features; declared input width is not checked"
            );
        }
        None
    } else {
        discriminator.kind.in_dim()
    };

    let schema = validate(
        &stream_schema,
        DeclaredSizes {
            generator_out_dim: generator.out_dim(),
            discriminator_in_dim,
        },
    )?;

    scalar_options.validate()?;

    if let Some(declared) = generator.static_dim() {
        let expected: usize = schema.static_sizes().iter().sum();
        if declared != expected {
            return Err(ArchitectureError::StaticDimMismatch { declared, expected }.into());
        }
    }

    tracing::debug!(
        profile = %name,
        generator = generator.name(),
        discriminator = discriminator.kind.name(),
        total_size = schema.total_size(),
        adversarial_size = schema.adversarial_size(),
        "Built configuration profile"
    );

    Ok(ConfigurationProfile {
        name,
        schema,
        options: scalar_options,
    })
}
