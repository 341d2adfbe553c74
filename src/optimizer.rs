//! Optimizer selection for the generator and the discriminator.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::architecture::Role;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptimizerError {
    #[error("{role} learning rate must be a positive finite number, got {lr}")]
    InvalidLearningRate { role: Role, lr: f64 },
    #[error("{role} weight decay must be a non-negative finite number, got {weight_decay}")]
    InvalidWeightDecay { role: Role, weight_decay: f64 },
}

/// Optimizers known to the training scripts, by their torch class name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptimizerKind {
    Adagrad,
    Adadelta,
    Adam,
    #[serde(rename = "RMSprop")]
    RmsProp,
    #[serde(rename = "SGD")]
    Sgd,
}

impl OptimizerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adagrad => "Adagrad",
            Self::Adadelta => "Adadelta",
            Self::Adam => "Adam",
            Self::RmsProp => "RMSprop",
            Self::Sgd => "SGD",
        }
    }
}

impl Display for OptimizerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerOptions {
    pub kind: OptimizerKind,
    pub lr: f64,
    pub weight_decay: f64,
}

impl OptimizerOptions {
    pub fn adagrad(lr: f64, weight_decay: f64) -> Self {
        Self {
            kind: OptimizerKind::Adagrad,
            lr,
            weight_decay,
        }
    }

    pub fn validate(&self, role: Role) -> Result<(), OptimizerError> {
        if !self.lr.is_finite() || self.lr <= 0.0 {
            return Err(OptimizerError::InvalidLearningRate { role, lr: self.lr });
        }
        if !self.weight_decay.is_finite() || self.weight_decay < 0.0 {
            return Err(OptimizerError::InvalidWeightDecay {
                role,
                weight_decay: self.weight_decay,
            });
        }
        Ok(())
    }

    /// `{lr: .., weight_decay: ..}`, as shown in debug output.
    pub fn params(&self) -> String {
        format!("{{lr: {}, weight_decay: {}}}", self.lr, self.weight_decay)
    }
}

#[cfg(test)]
mod tests {
    use crate::architecture::Role;

    use super::{OptimizerError, OptimizerKind, OptimizerOptions};

    #[test]
    fn torch_names() {
        let names: Vec<String> = [
            OptimizerKind::Adagrad,
            OptimizerKind::Adadelta,
            OptimizerKind::Adam,
            OptimizerKind::RmsProp,
            OptimizerKind::Sgd,
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        assert_eq!(names, ["Adagrad", "Adadelta", "Adam", "RMSprop", "SGD"]);
    }

    #[test]
    fn learning_rate() {
        OptimizerOptions::adagrad(0.01, 0.0)
            .validate(Role::Generator)
            .unwrap();
        for lr in [0.0, -0.01, f64::NAN, f64::INFINITY] {
            let err = OptimizerOptions::adagrad(lr, 0.0)
                .validate(Role::Generator)
                .unwrap_err();
            assert!(matches!(err, OptimizerError::InvalidLearningRate { .. }));
        }
    }

    #[test]
    fn weight_decay() {
        assert_eq!(
            OptimizerOptions::adagrad(0.01, -1e-5).validate(Role::Discriminator),
            Err(OptimizerError::InvalidWeightDecay {
                role: Role::Discriminator,
                weight_decay: -1e-5,
            })
        );
    }

    #[test]
    fn params() {
        let options = OptimizerOptions::adagrad(0.01, 1e-5);
        approx::assert_relative_eq!(options.lr, 0.01);
        assert_eq!(options.params(), "{lr: 0.01, weight_decay: 0.00001}");
    }
}
