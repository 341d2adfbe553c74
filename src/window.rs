//! Delta windows used to derive dynamic features from a static stream.

use serde::{Deserialize, Serialize};

/// Errors while building a [`Windows`] table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    /// The number of coefficients does not match `left + right + 1`.
    #[error("Window #{index} has {actual} coefficients; expected {expected}")]
    InvalidWindowCoefficients {
        index: usize,
        expected: usize,
        actual: usize,
    },
    /// The context widths of a window overflow its length.
    #[error("Window #{index} has too wide a context")]
    ContextOverflow { index: usize },
    /// No window was defined.
    #[error("At least one window is required")]
    Empty,
    /// The first window is not the identity window `(0, 0, [1.0])`.
    #[error("The first window must be the static window (0, 0, [1.0])")]
    StaticWindowExpected,
}

/// Literal window definition: `(left_context, right_context, coefficients)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowDefinition {
    pub left: usize,
    pub right: usize,
    pub coefficients: Vec<f64>,
}

impl WindowDefinition {
    pub fn new(left: usize, right: usize, coefficients: Vec<f64>) -> Self {
        Self {
            left,
            right,
            coefficients,
        }
    }
}

impl From<(usize, usize, Vec<f64>)> for WindowDefinition {
    fn from((left, right, coefficients): (usize, usize, Vec<f64>)) -> Self {
        Self::new(left, right, coefficients)
    }
}

/// Ordered set of windows shared by every dynamic stream.
///
/// The order fixes the column layout of a dynamic stream: the static block
/// comes first, followed by one block per non-identity window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<WindowDefinition>", into = "Vec<WindowDefinition>")]
pub struct Windows {
    windows: Vec<Window>,
}

impl Windows {
    pub fn iter(&self) -> impl '_ + Iterator<Item = &Window> {
        self.windows.iter()
    }
    pub fn size(&self) -> usize {
        self.windows.len()
    }
    /// Largest context on either side of any window.
    pub fn max_width(&self) -> usize {
        self.windows
            .iter()
            .map(|w| w.left_width().max(w.right_width()))
            .max()
            .unwrap_or(0)
    }
    /// Static window plus velocity and acceleration windows.
    pub fn standard_delta() -> Self {
        Self {
            windows: vec![
                Window::new(0, 0, vec![1.0]),
                Window::new(1, 1, vec![-0.5, 0.0, 0.5]),
                Window::new(1, 1, vec![1.0, -2.0, 1.0]),
            ],
        }
    }
    /// Only the static window.
    pub fn static_only() -> Self {
        Self {
            windows: vec![Window::new(0, 0, vec![1.0])],
        }
    }
}

impl TryFrom<Vec<WindowDefinition>> for Windows {
    type Error = WindowError;
    fn try_from(value: Vec<WindowDefinition>) -> Result<Self, Self::Error> {
        build_window_set(value)
    }
}

impl From<Windows> for Vec<WindowDefinition> {
    fn from(value: Windows) -> Self {
        value
            .windows
            .into_iter()
            .map(|w| WindowDefinition::new(w.left, w.right, w.coefficients.into_vec()))
            .collect()
    }
}

impl std::fmt::Display for Windows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[")?;
        for (i, window) in self.windows.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", window)?;
        }
        f.write_str("]")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    left: usize,
    right: usize,
    coefficients: Box<[f64]>,
}

impl Window {
    fn new(left: usize, right: usize, coefficients: Vec<f64>) -> Self {
        Self {
            left,
            right,
            coefficients: coefficients.into(),
        }
    }

    /// Iterate over `(frame offset, coefficient)` pairs, from the leftmost frame.
    pub fn iter(&self) -> impl '_ + Iterator<Item = (isize, f64)> {
        let left = self.left as isize;
        self.coefficients
            .iter()
            .enumerate()
            .map(move |(idx, coef)| (idx as isize - left, *coef))
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.coefficients.len()
    }
    #[inline]
    pub fn left_width(&self) -> usize {
        self.left
    }
    #[inline]
    pub fn right_width(&self) -> usize {
        self.right
    }

    fn is_identity(&self) -> bool {
        self.left == 0 && self.right == 0 && self.coefficients[0] == 1.0
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {:?})", self.left, self.right, self.coefficients)
    }
}

/// Build a [`Windows`] table from literal definitions, keeping their order.
pub fn build_window_set<I, D>(definitions: I) -> Result<Windows, WindowError>
where
    I: IntoIterator<Item = D>,
    D: Into<WindowDefinition>,
{
    let mut windows = Vec::new();
    for (index, definition) in definitions.into_iter().enumerate() {
        let WindowDefinition {
            left,
            right,
            coefficients,
        } = definition.into();

        let expected = left
            .checked_add(right)
            .and_then(|width| width.checked_add(1))
            .ok_or(WindowError::ContextOverflow { index })?;
        if coefficients.len() != expected {
            return Err(WindowError::InvalidWindowCoefficients {
                index,
                expected,
                actual: coefficients.len(),
            });
        }
        windows.push(Window::new(left, right, coefficients));
    }

    match windows.first() {
        None => Err(WindowError::Empty),
        Some(first) if !first.is_identity() => Err(WindowError::StaticWindowExpected),
        Some(_) => Ok(Windows { windows }),
    }
}
