//! Generator and discriminator architecture selection.
//!
//! Each architecture carries its own parameter record, so a name can never
//! be paired with parameters of another network.

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Which side of the adversarial pair a setting belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Generator,
    Discriminator,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generator => f.write_str("generator"),
            Self::Discriminator => f.write_str("discriminator"),
        }
    }
}

/// Errors in architecture parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArchitectureError {
    #[error("{role} needs at least one hidden layer")]
    NoHiddenLayer { role: Role },
    #[error("{role} hidden layer width must be positive")]
    ZeroHiddenDim { role: Role },
    #[error("{role} dropout must be in [0, 1), got {dropout}")]
    InvalidDropout { role: Role, dropout: f64 },
    /// In2Out networks map features to features of the same width.
    #[error("{role} input width {in_dim} differs from output width {out_dim}")]
    InOutMismatch {
        role: Role,
        in_dim: usize,
        out_dim: usize,
    },
    #[error("static_dim is {declared}, but streams have {expected} static features")]
    StaticDimMismatch { declared: usize, expected: usize },
    #[error("discriminator must output a single score, got out_dim={out_dim}")]
    DiscriminatorOutput { out_dim: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpParams {
    pub in_dim: Option<usize>,
    pub out_dim: Option<usize>,
    pub num_hidden: usize,
    pub hidden_dim: usize,
    pub dropout: f64,
    pub last_sigmoid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RnnParams {
    pub in_dim: Option<usize>,
    pub out_dim: Option<usize>,
    pub num_hidden: usize,
    pub hidden_dim: usize,
    pub bidirectional: bool,
    pub dropout: f64,
    pub last_sigmoid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighwayParams {
    pub in_dim: Option<usize>,
    pub out_dim: Option<usize>,
    pub num_hidden: usize,
    pub hidden_dim: usize,
    /// Leading static features the network adds its residual to.
    pub static_dim: usize,
    pub dropout: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RnnHighwayParams {
    pub in_dim: Option<usize>,
    pub out_dim: Option<usize>,
    pub num_hidden: usize,
    pub hidden_dim: usize,
    pub bidirectional: bool,
    pub static_dim: usize,
    pub dropout: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "params")]
pub enum GeneratorKind {
    #[serde(rename = "In2OutHighwayNet")]
    In2OutHighway(HighwayParams),
    #[serde(rename = "In2OutRNNHighwayNet")]
    In2OutRnnHighway(RnnHighwayParams),
    #[serde(rename = "LSTMRNN")]
    LstmRnn(RnnParams),
    #[serde(rename = "MLP")]
    Mlp(MlpParams),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "params")]
pub enum DiscriminatorKind {
    #[serde(rename = "MLP")]
    Mlp(MlpParams),
    #[serde(rename = "LSTMRNN")]
    LstmRnn(RnnParams),
}

impl GeneratorKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::In2OutHighway(_) => "In2OutHighwayNet",
            Self::In2OutRnnHighway(_) => "In2OutRNNHighwayNet",
            Self::LstmRnn(_) => "LSTMRNN",
            Self::Mlp(_) => "MLP",
        }
    }

    pub fn in_dim(&self) -> Option<usize> {
        self.shape().in_dim
    }
    /// Declared output width; must match the full feature width.
    pub fn out_dim(&self) -> Option<usize> {
        self.shape().out_dim
    }
    /// Static width for networks with a residual on static features.
    pub fn static_dim(&self) -> Option<usize> {
        match self {
            Self::In2OutHighway(p) => Some(p.static_dim),
            Self::In2OutRnnHighway(p) => Some(p.static_dim),
            Self::LstmRnn(_) | Self::Mlp(_) => None,
        }
    }

    /// Replace the declared output width; a declared In2Out input width follows it.
    pub fn set_out_dim(&mut self, out_dim: Option<usize>) {
        match self {
            Self::In2OutHighway(HighwayParams { in_dim, out_dim: o, .. })
            | Self::In2OutRnnHighway(RnnHighwayParams { in_dim, out_dim: o, .. }) => {
                if in_dim.is_some() {
                    *in_dim = out_dim;
                }
                *o = out_dim;
            }
            Self::LstmRnn(p) => p.out_dim = out_dim,
            Self::Mlp(p) => p.out_dim = out_dim,
        }
    }

    /// Replace the static width; no-op for networks without one.
    pub fn set_static_dim(&mut self, static_dim: usize) {
        match self {
            Self::In2OutHighway(p) => p.static_dim = static_dim,
            Self::In2OutRnnHighway(p) => p.static_dim = static_dim,
            Self::LstmRnn(_) | Self::Mlp(_) => (),
        }
    }

    /// Check the parameters which do not depend on the stream layout.
    pub fn validate(&self) -> Result<(), ArchitectureError> {
        let shape = self.shape();
        shape.validate(Role::Generator)?;

        if let (Self::In2OutHighway(_) | Self::In2OutRnnHighway(_), Some(in_dim), Some(out_dim)) =
            (self, shape.in_dim, shape.out_dim)
        {
            if in_dim != out_dim {
                return Err(ArchitectureError::InOutMismatch {
                    role: Role::Generator,
                    in_dim,
                    out_dim,
                });
            }
        }
        Ok(())
    }

    pub fn params(&self) -> BTreeMap<&'static str, String> {
        match self {
            Self::In2OutHighway(p) => {
                let mut entries = shape_entries(&p.into());
                entries.insert("static_dim", p.static_dim.to_string());
                entries
            }
            Self::In2OutRnnHighway(p) => {
                let mut entries = shape_entries(&p.into());
                entries.insert("static_dim", p.static_dim.to_string());
                entries.insert("bidirectional", p.bidirectional.to_string());
                entries
            }
            Self::LstmRnn(p) => rnn_entries(p),
            Self::Mlp(p) => mlp_entries(p),
        }
    }

    fn shape(&self) -> Shape {
        match self {
            Self::In2OutHighway(p) => p.into(),
            Self::In2OutRnnHighway(p) => p.into(),
            Self::LstmRnn(p) => p.into(),
            Self::Mlp(p) => p.into(),
        }
    }
}

impl DiscriminatorKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mlp(_) => "MLP",
            Self::LstmRnn(_) => "LSTMRNN",
        }
    }

    /// Declared input width; must match the adversarial feature width.
    pub fn in_dim(&self) -> Option<usize> {
        self.shape().in_dim
    }
    pub fn out_dim(&self) -> Option<usize> {
        self.shape().out_dim
    }

    pub fn set_in_dim(&mut self, in_dim: Option<usize>) {
        match self {
            Self::Mlp(p) => p.in_dim = in_dim,
            Self::LstmRnn(p) => p.in_dim = in_dim,
        }
    }

    pub fn validate(&self) -> Result<(), ArchitectureError> {
        let shape = self.shape();
        shape.validate(Role::Discriminator)?;
        match shape.out_dim {
            Some(out_dim) if out_dim != 1 => {
                Err(ArchitectureError::DiscriminatorOutput { out_dim })
            }
            _ => Ok(()),
        }
    }

    pub fn params(&self) -> BTreeMap<&'static str, String> {
        match self {
            Self::Mlp(p) => mlp_entries(p),
            Self::LstmRnn(p) => rnn_entries(p),
        }
    }

    fn shape(&self) -> Shape {
        match self {
            Self::Mlp(p) => p.into(),
            Self::LstmRnn(p) => p.into(),
        }
    }
}

/// Fields shared by every architecture.
struct Shape {
    in_dim: Option<usize>,
    out_dim: Option<usize>,
    num_hidden: usize,
    hidden_dim: usize,
    dropout: f64,
}

impl Shape {
    fn validate(&self, role: Role) -> Result<(), ArchitectureError> {
        if self.num_hidden == 0 {
            return Err(ArchitectureError::NoHiddenLayer { role });
        }
        if self.hidden_dim == 0 {
            return Err(ArchitectureError::ZeroHiddenDim { role });
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ArchitectureError::InvalidDropout {
                role,
                dropout: self.dropout,
            });
        }
        Ok(())
    }
}

macro_rules! impl_shape {
    ($($t:ty),*) => {
        $(
            impl From<&$t> for Shape {
                fn from(p: &$t) -> Self {
                    Self {
                        in_dim: p.in_dim,
                        out_dim: p.out_dim,
                        num_hidden: p.num_hidden,
                        hidden_dim: p.hidden_dim,
                        dropout: p.dropout,
                    }
                }
            }
        )*
    };
}
impl_shape!(MlpParams, RnnParams, HighwayParams, RnnHighwayParams);

fn fmt_dim(dim: Option<usize>) -> String {
    dim.map_or_else(|| "None".to_string(), |d| d.to_string())
}

fn shape_entries(shape: &Shape) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        ("in_dim", fmt_dim(shape.in_dim)),
        ("out_dim", fmt_dim(shape.out_dim)),
        ("num_hidden", shape.num_hidden.to_string()),
        ("hidden_dim", shape.hidden_dim.to_string()),
        ("dropout", shape.dropout.to_string()),
    ])
}

fn mlp_entries(p: &MlpParams) -> BTreeMap<&'static str, String> {
    let mut entries = shape_entries(&p.into());
    entries.insert("last_sigmoid", p.last_sigmoid.to_string());
    entries
}

fn rnn_entries(p: &RnnParams) -> BTreeMap<&'static str, String> {
    let mut entries = shape_entries(&p.into());
    entries.insert("bidirectional", p.bidirectional.to_string());
    entries.insert("last_sigmoid", p.last_sigmoid.to_string());
    entries
}

/// Render parameter entries as `{key: value, ...}` in key order.
pub(crate) fn format_params(entries: &BTreeMap<&'static str, String>) -> String {
    let body = entries
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{}}}", body)
}
