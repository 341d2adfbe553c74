//! Human-readable dump of a profile.

use std::collections::BTreeMap;

use crate::architecture::format_params;
use crate::profile::ConfigurationProfile;

/// Every setting of `profile` as strings, keyed by its hyperparameter name.
pub fn values(profile: &ConfigurationProfile) -> BTreeMap<&'static str, String> {
    let schema = profile.schema().schema();
    let generator = profile.generator();
    let discriminator = profile.discriminator();
    let schedule = profile.schedule();
    let data_loader = profile.data_loader();

    let mut values = BTreeMap::from([
        ("name", profile.name().to_string()),
        ("windows", schema.windows().to_string()),
        ("stream_sizes", format!("{:?}", schema.stream_sizes())),
        (
            "has_dynamic_features",
            format!("{:?}", schema.has_dynamic_features()),
        ),
        (
            "adversarial_streams",
            format!("{:?}", schema.adversarial_streams()),
        ),
        (
            "mask_0th_mgc_for_adv_loss",
            schema.mask_0th_for_adversarial().to_string(),
        ),
        ("generator", generator.kind.name().to_string()),
        ("generator_params", format_params(&generator.kind.params())),
        ("generator_add_noise", generator.add_noise.to_string()),
        ("generator_noise_dim", generator.noise_dim.to_string()),
        ("optimizer_g", generator.optimizer.kind.to_string()),
        ("optimizer_g_params", generator.optimizer.params()),
        ("discriminator", discriminator.kind.name().to_string()),
        (
            "discriminator_params",
            format_params(&discriminator.kind.params()),
        ),
        (
            "discriminator_linguistic_condition",
            discriminator.linguistic_condition.to_string(),
        ),
        ("optimizer_d", discriminator.optimizer.kind.to_string()),
        ("optimizer_d_params", discriminator.optimizer.params()),
        ("nepoch", schedule.nepoch.to_string()),
        ("lr_decay_schedule", schedule.lr_decay_schedule.to_string()),
        ("lr_decay_epoch", schedule.lr_decay_epoch.to_string()),
        ("batch_size", data_loader.batch_size.to_string()),
        ("num_workers", data_loader.num_workers.to_string()),
        ("pin_memory", data_loader.pin_memory.to_string()),
        ("cache_size", data_loader.cache_size.to_string()),
    ]);

    if let Some(linguistic) = profile.linguistic() {
        values.insert(
            "use_phone_alignment",
            linguistic.use_phone_alignment.to_string(),
        );
        values.insert(
            "subphone_features",
            linguistic
                .subphone_features
                .map_or_else(|| "None".to_string(), |s| s.to_string()),
        );
        values.insert(
            "add_frame_features",
            linguistic.add_frame_features.to_string(),
        );
        values.insert(
            "question_path",
            linguistic.question_path.display().to_string(),
        );
    }

    if let Some(acoustic) = profile.acoustic() {
        values.insert("order", acoustic.order.to_string());
        values.insert("frame_period", acoustic.frame_period.to_string());
        if let Some(kind) = acoustic.f0_interpolation_kind {
            values.insert("f0_interpolation_kind", kind.to_string());
        }
    }

    values
}

/// `Hyperparameters:` followed by one `  key: value` line per setting, sorted by key.
pub fn format_debug(profile: &ConfigurationProfile) -> String {
    let lines = values(profile)
        .into_iter()
        .map(|(key, value)| format!("  {}: {}", key, value))
        .collect::<Vec<_>>();
    format!("Hyperparameters:\n{}", lines.join("\n"))
}
