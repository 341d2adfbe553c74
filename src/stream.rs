//! Multi-stream feature layout and its consistency checks.
//!
//! A frame of acoustic features is the concatenation of several streams
//! (e.g. mgc, lf0, vuv, bap). Each stream has a static width and optionally
//! carries dynamic features derived through the shared [`Windows`].

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::window::Windows;

/// Errors in a stream layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The per-stream arrays differ in length.
    #[error(
        "Stream arrays differ in length: {stream_sizes} sizes, {has_dynamic_features} dynamic flags, {adversarial_streams} adversarial flags"
    )]
    LengthMismatch {
        stream_sizes: usize,
        has_dynamic_features: usize,
        adversarial_streams: usize,
    },
    /// The schema has no stream.
    #[error("At least one stream is required")]
    Empty,
    /// A stream has zero width.
    #[error("Stream #{index} has non-positive size {size}")]
    NonPositiveStreamSize { index: usize, size: usize },
    /// The feature width differs from the generator's declared output width.
    #[error("Generator declares output width {declared}, but streams sum up to {computed}")]
    TotalSizeMismatch { declared: usize, computed: usize },
    /// The adversarial width is negative or differs from the declared discriminator input.
    #[error(
        "Discriminator declares input width {declared:?}, but adversarial streams sum up to {computed}"
    )]
    AdversarialSizeMismatch {
        declared: Option<usize>,
        computed: isize,
    },
    /// Masking was requested, but the first adversarial stream has no static scalar.
    #[error("0th-coefficient masking requires stream #{stream} to have a static scalar")]
    InvalidMaskingRequest { stream: usize },
    /// The feature width does not fit in memory.
    #[error("Stream #{stream} overflows the feature width")]
    SizeOverflow { stream: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Width of the static component only.
    pub static_size: usize,
    pub has_dynamic_features: bool,
    /// Included in the discriminator input.
    pub is_adversarial: bool,
}

impl StreamDescriptor {
    pub fn new(static_size: usize, has_dynamic_features: bool, is_adversarial: bool) -> Self {
        Self {
            static_size,
            has_dynamic_features,
            is_adversarial,
        }
    }

    /// Width of this stream including dynamic features, or `None` on overflow.
    pub fn effective_size(&self, windows: &Windows) -> Option<usize> {
        if self.has_dynamic_features {
            self.static_size.checked_mul(windows.size())
        } else {
            Some(self.static_size)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSchema {
    streams: Vec<StreamDescriptor>,
    windows: Windows,
    mask_0th_for_adversarial: bool,
}

impl StreamSchema {
    pub fn new(
        streams: Vec<StreamDescriptor>,
        windows: Windows,
        mask_0th_for_adversarial: bool,
    ) -> Self {
        Self {
            streams,
            windows,
            mask_0th_for_adversarial,
        }
    }

    /// Build a schema from the per-stream parallel arrays used in configuration files.
    pub fn from_arrays(
        stream_sizes: &[usize],
        has_dynamic_features: &[bool],
        adversarial_streams: &[bool],
        windows: Windows,
        mask_0th_for_adversarial: bool,
    ) -> Result<Self, SchemaError> {
        if stream_sizes.len() != has_dynamic_features.len()
            || stream_sizes.len() != adversarial_streams.len()
        {
            return Err(SchemaError::LengthMismatch {
                stream_sizes: stream_sizes.len(),
                has_dynamic_features: has_dynamic_features.len(),
                adversarial_streams: adversarial_streams.len(),
            });
        }

        let streams = stream_sizes
            .iter()
            .zip(has_dynamic_features)
            .zip(adversarial_streams)
            .map(|((&size, &dynamic), &adversarial)| {
                StreamDescriptor::new(size, dynamic, adversarial)
            })
            .collect();

        Ok(Self::new(streams, windows, mask_0th_for_adversarial))
    }

    pub fn streams(&self) -> &[StreamDescriptor] {
        &self.streams
    }
    pub fn windows(&self) -> &Windows {
        &self.windows
    }
    pub fn mask_0th_for_adversarial(&self) -> bool {
        self.mask_0th_for_adversarial
    }

    pub fn stream_sizes(&self) -> Vec<usize> {
        self.streams.iter().map(|s| s.static_size).collect()
    }
    pub fn has_dynamic_features(&self) -> Vec<bool> {
        self.streams.iter().map(|s| s.has_dynamic_features).collect()
    }
    pub fn adversarial_streams(&self) -> Vec<bool> {
        self.streams.iter().map(|s| s.is_adversarial).collect()
    }
}

/// Widths declared by the models that consume the features.
///
/// `None` means the width is taken from the schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeclaredSizes {
    pub generator_out_dim: Option<usize>,
    pub discriminator_in_dim: Option<usize>,
}

/// A [`StreamSchema`] which passed [`validate`], with its derived widths.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSchema {
    schema: StreamSchema,
    effective_sizes: Vec<usize>,
    total_size: usize,
    adversarial_size: usize,
}

impl ValidatedSchema {
    pub fn schema(&self) -> &StreamSchema {
        &self.schema
    }
    pub fn windows(&self) -> &Windows {
        &self.schema.windows
    }
    pub fn effective_sizes(&self) -> &[usize] {
        &self.effective_sizes
    }
    /// Width of a full feature frame.
    pub fn total_size(&self) -> usize {
        self.total_size
    }
    /// Width of the discriminator input built from adversarial streams.
    pub fn adversarial_size(&self) -> usize {
        self.adversarial_size
    }

    /// Static width of each stream.
    pub fn static_sizes(&self) -> Vec<usize> {
        self.schema.stream_sizes()
    }

    /// Column range of each stream in a full feature frame.
    pub fn stream_ranges(&self) -> Vec<Range<usize>> {
        let mut start = 0;
        self.effective_sizes
            .iter()
            .map(|size| {
                let range = start..start + size;
                start += size;
                range
            })
            .collect()
    }

    /// Columns of a full feature frame that form the adversarial sub-vector, in order.
    ///
    /// With masking, the first column of the first adversarial stream is left out.
    pub fn adversarial_indices(&self) -> Vec<usize> {
        let mut indices = self
            .schema
            .streams
            .iter()
            .zip(self.stream_ranges())
            .filter(|(stream, _)| stream.is_adversarial)
            .flat_map(|(_, range)| range);
        if self.schema.mask_0th_for_adversarial {
            indices.next();
        }
        indices.collect()
    }
}

/// Check a stream layout against the declared model widths.
///
/// Checks are done in order and the first failing one is reported.
pub fn validate(
    schema: &StreamSchema,
    declared: DeclaredSizes,
) -> Result<ValidatedSchema, SchemaError> {
    if schema.streams.is_empty() {
        return Err(SchemaError::Empty);
    }

    if let Some((index, stream)) = schema
        .streams
        .iter()
        .enumerate()
        .find(|(_, s)| s.static_size == 0)
    {
        return Err(SchemaError::NonPositiveStreamSize {
            index,
            size: stream.static_size,
        });
    }

    // The total width must stay within `isize`.
    let mut effective_sizes = Vec::with_capacity(schema.streams.len());
    let mut total_size: usize = 0;
    for (stream, descriptor) in schema.streams.iter().enumerate() {
        let overflow = SchemaError::SizeOverflow { stream };
        let size = descriptor
            .effective_size(&schema.windows)
            .ok_or(overflow.clone())?;
        total_size = total_size
            .checked_add(size)
            .filter(|&total| isize::try_from(total).is_ok())
            .ok_or(overflow)?;
        effective_sizes.push(size);
    }

    if let Some(declared) = declared.generator_out_dim {
        if declared != total_size {
            return Err(SchemaError::TotalSizeMismatch {
                declared,
                computed: total_size,
            });
        }
    }

    let adversarial_sum: usize = schema
        .streams
        .iter()
        .zip(&effective_sizes)
        .filter(|(s, _)| s.is_adversarial)
        .map(|(_, size)| size)
        .sum();
    let adversarial_size =
        adversarial_sum as isize - isize::from(schema.mask_0th_for_adversarial);
    let adversarial_size = match (
        usize::try_from(adversarial_size),
        declared.discriminator_in_dim,
    ) {
        (Ok(computed), None) => computed,
        (Ok(computed), Some(declared)) if computed == declared => computed,
        (_, declared) => {
            return Err(SchemaError::AdversarialSizeMismatch {
                declared,
                computed: adversarial_size,
            });
        }
    };

    check_masking(schema)?;

    Ok(ValidatedSchema {
        schema: schema.clone(),
        effective_sizes,
        total_size,
        adversarial_size,
    })
}

/// The masked scalar must exist in the first adversarial stream.
fn check_masking(schema: &StreamSchema) -> Result<(), SchemaError> {
    if !schema.mask_0th_for_adversarial {
        return Ok(());
    }
    match schema.streams.iter().position(|s| s.is_adversarial) {
        Some(stream) if schema.streams[stream].static_size == 0 => {
            Err(SchemaError::InvalidMaskingRequest { stream })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use crate::window::{Windows, build_window_set};

    use super::{
        DeclaredSizes, SchemaError, StreamDescriptor, StreamSchema, check_masking, validate,
    };

    fn acoustic_schema(static_sizes: &[usize]) -> StreamSchema {
        StreamSchema::from_arrays(
            static_sizes,
            &[true, true, false, true],
            &[true, false, false, false],
            Windows::standard_delta(),
            true,
        )
        .unwrap()
    }

    #[test]
    fn effective_size() {
        let three = Windows::standard_delta();
        let dynamic = StreamDescriptor::new(25, true, false);
        let plain = StreamDescriptor::new(25, false, false);
        assert_eq!(dynamic.effective_size(&three), Some(75));
        assert_eq!(plain.effective_size(&three), Some(25));
        assert_eq!(plain.effective_size(&Windows::static_only()), Some(25));
        assert_eq!(
            StreamDescriptor::new(usize::MAX / 2, true, false).effective_size(&three),
            None
        );
    }

    #[test]
    fn voice_conversion() {
        let schema = StreamSchema::from_arrays(
            &[59],
            &[true],
            &[true],
            Windows::standard_delta(),
            false,
        )
        .unwrap();
        let validated = validate(
            &schema,
            DeclaredSizes {
                generator_out_dim: Some(177),
                discriminator_in_dim: Some(177),
            },
        )
        .unwrap();
        assert_eq!(validated.total_size(), 177);
        assert_eq!(validated.adversarial_size(), 177);
        assert_eq!(validated.effective_sizes(), &[177]);
    }

    #[test]
    fn acoustic_adversarial_size() {
        let validated =
            validate(&acoustic_schema(&[75, 3, 1, 3]), DeclaredSizes::default()).unwrap();
        assert_eq!(validated.adversarial_size(), 75 * 3 - 1);
        assert_eq!(validated.total_size(), 225 + 9 + 1 + 9);
        assert_eq!(validated.effective_sizes(), &[225, 9, 1, 9]);
    }

    #[test]
    fn layout() {
        let validated =
            validate(&acoustic_schema(&[25, 1, 1, 1]), DeclaredSizes::default()).unwrap();
        assert_eq!(validated.total_size(), 82);
        assert_eq!(validated.adversarial_size(), 74);
        assert_eq!(
            validated.stream_ranges(),
            vec![0..75, 75..78, 78..79, 79..82]
        );
        let indices = validated.adversarial_indices();
        assert_eq!(indices.len(), validated.adversarial_size());
        assert_eq!(indices.first(), Some(&1));
        assert_eq!(indices.last(), Some(&74));
        assert_eq!(validated.static_sizes(), vec![25, 1, 1, 1]);
    }

    #[test]
    fn idempotent() {
        let declared = DeclaredSizes {
            generator_out_dim: Some(82),
            discriminator_in_dim: Some(74),
        };
        let first = validate(&acoustic_schema(&[25, 1, 1, 1]), declared).unwrap();
        let second = validate(first.schema(), declared).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn length_mismatch() {
        for (sizes, dynamic, adversarial) in [
            (&[1, 2][..], &[true][..], &[true, true][..]),
            (&[1][..], &[true, false][..], &[true][..]),
            (&[0, 0, 0][..], &[true][..], &[][..]),
        ] {
            let err = StreamSchema::from_arrays(
                sizes,
                dynamic,
                adversarial,
                Windows::standard_delta(),
                false,
            )
            .unwrap_err();
            assert!(matches!(err, SchemaError::LengthMismatch { .. }), "{err}");
        }
    }

    #[test]
    fn adversarial_length_mismatch() {
        assert_eq!(
            StreamSchema::from_arrays(
                &[1, 2],
                &[true, true],
                &[true],
                Windows::standard_delta(),
                false,
            ),
            Err(SchemaError::LengthMismatch {
                stream_sizes: 2,
                has_dynamic_features: 2,
                adversarial_streams: 1,
            })
        );
    }

    #[test]
    fn zero_size() {
        assert_eq!(
            validate(&acoustic_schema(&[25, 1, 0, 1]), DeclaredSizes::default()),
            Err(SchemaError::NonPositiveStreamSize { index: 2, size: 0 })
        );
    }

    #[test]
    fn empty() {
        let schema = StreamSchema::new(vec![], Windows::standard_delta(), false);
        assert_eq!(
            validate(&schema, DeclaredSizes::default()),
            Err(SchemaError::Empty)
        );
    }

    #[test]
    fn total_mismatch() {
        let declared = DeclaredSizes {
            generator_out_dim: Some(75 + 3 + 1 + 3),
            discriminator_in_dim: None,
        };
        assert_eq!(
            validate(&acoustic_schema(&[75, 3, 1, 3]), declared),
            Err(SchemaError::TotalSizeMismatch {
                declared: 82,
                computed: 244,
            })
        );
    }

    #[test]
    fn adversarial_mismatch() {
        let declared = DeclaredSizes {
            generator_out_dim: None,
            discriminator_in_dim: Some(24),
        };
        assert_eq!(
            validate(&acoustic_schema(&[25, 1, 1, 1]), declared),
            Err(SchemaError::AdversarialSizeMismatch {
                declared: Some(24),
                computed: 74,
            })
        );
    }

    #[test]
    fn negative_adversarial_size() {
        let schema = StreamSchema::from_arrays(
            &[5],
            &[false],
            &[false],
            Windows::static_only(),
            true,
        )
        .unwrap();
        assert_eq!(
            validate(&schema, DeclaredSizes::default()),
            Err(SchemaError::AdversarialSizeMismatch {
                declared: None,
                computed: -1,
            })
        );
    }

    #[test]
    fn mask_first_adversarial_stream() {
        let schema = StreamSchema::from_arrays(
            &[25, 1],
            &[true, true],
            &[false, true],
            Windows::standard_delta(),
            true,
        )
        .unwrap();
        let validated = validate(&schema, DeclaredSizes::default()).unwrap();
        assert_eq!(validated.adversarial_size(), 2);
        assert_eq!(validated.adversarial_indices(), vec![76, 77]);
    }

    #[test]
    fn mask_without_static_scalar() {
        let schema = StreamSchema::new(
            vec![
                StreamDescriptor::new(25, true, false),
                StreamDescriptor::new(0, true, true),
            ],
            Windows::standard_delta(),
            true,
        );
        assert_eq!(
            check_masking(&schema),
            Err(SchemaError::InvalidMaskingRequest { stream: 1 })
        );
        // reported as a zero-width stream first
        assert_eq!(
            validate(&schema, DeclaredSizes::default()),
            Err(SchemaError::NonPositiveStreamSize { index: 1, size: 0 })
        );
    }

    #[test]
    fn overflow() {
        let huge = StreamSchema::from_arrays(
            &[isize::MAX as usize],
            &[true],
            &[true],
            Windows::standard_delta(),
            false,
        )
        .unwrap();
        assert_eq!(
            validate(&huge, DeclaredSizes::default()),
            Err(SchemaError::SizeOverflow { stream: 0 })
        );

        let sum = StreamSchema::from_arrays(
            &[1, isize::MAX as usize],
            &[false, false],
            &[true, false],
            Windows::standard_delta(),
            false,
        )
        .unwrap();
        assert_eq!(
            validate(&sum, DeclaredSizes::default()),
            Err(SchemaError::SizeOverflow { stream: 1 })
        );
    }

    #[test]
    fn static_duration() {
        let windows = build_window_set(vec![(0, 0, vec![1.0])]).unwrap();
        let schema = StreamSchema::from_arrays(&[5], &[false], &[true], windows, false).unwrap();
        let validated = validate(&schema, DeclaredSizes::default()).unwrap();
        assert_eq!(validated.total_size(), 5);
        assert_eq!(validated.adversarial_size(), 5);
        assert_eq!(validated.adversarial_indices(), vec![0, 1, 2, 3, 4]);
    }
}
