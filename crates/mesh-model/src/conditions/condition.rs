use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::geometry::point::float_key;
use crate::observe::Subscribers;

/// Kind of physical constraint applied along an edge.
///
/// Each kind has a short solver code, as written in boundary-condition
/// tables, and a fixed number of numeric parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BoundaryConditionType {
    #[default]
    None,
    Flux,
    Wall,
    Insulated,
    Symmetry,
    Periodic,
    AxisymmetricBoundary,
    DirichletVelocity,
    DirichletTemperatureScalar,
    Internal,
    Outflow,
    Convection,
}

impl BoundaryConditionType {
    pub const ALL: [BoundaryConditionType; 12] = [
        BoundaryConditionType::None,
        BoundaryConditionType::Flux,
        BoundaryConditionType::Wall,
        BoundaryConditionType::Insulated,
        BoundaryConditionType::Symmetry,
        BoundaryConditionType::Periodic,
        BoundaryConditionType::AxisymmetricBoundary,
        BoundaryConditionType::DirichletVelocity,
        BoundaryConditionType::DirichletTemperatureScalar,
        BoundaryConditionType::Internal,
        BoundaryConditionType::Outflow,
        BoundaryConditionType::Convection,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            BoundaryConditionType::None => "",
            BoundaryConditionType::Flux => "f",
            BoundaryConditionType::Wall => "W",
            BoundaryConditionType::Insulated => "I",
            BoundaryConditionType::Symmetry => "SYM",
            BoundaryConditionType::Periodic => "P",
            BoundaryConditionType::AxisymmetricBoundary => "A",
            BoundaryConditionType::DirichletVelocity => "v",
            BoundaryConditionType::DirichletTemperatureScalar => "t",
            BoundaryConditionType::Internal => "E",
            BoundaryConditionType::Outflow => "O",
            BoundaryConditionType::Convection => "C",
        }
    }

    /// Look a kind up by its solver code. Codes are case-sensitive.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code.trim())
    }

    /// Number of numeric parameters a condition of this kind carries.
    pub fn parameter_count(&self) -> usize {
        match self {
            BoundaryConditionType::None
            | BoundaryConditionType::Wall
            | BoundaryConditionType::Insulated
            | BoundaryConditionType::Symmetry
            | BoundaryConditionType::AxisymmetricBoundary
            | BoundaryConditionType::Outflow => 0,
            BoundaryConditionType::Flux | BoundaryConditionType::DirichletTemperatureScalar => 1,
            // Neighbouring element and edge.
            BoundaryConditionType::Periodic | BoundaryConditionType::Internal => 2,
            // Film coefficient and ambient temperature.
            BoundaryConditionType::Convection => 2,
            BoundaryConditionType::DirichletVelocity => 3,
        }
    }
}

/// A typed, parameterised constraint attached to one edge of one polygon.
///
/// `BoundaryCondition::default()` is the canonical unset condition; every
/// default instance equals every other.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoundaryCondition {
    kind: BoundaryConditionType,
    values: Vec<f64>,
    #[serde(skip)]
    pub(crate) subscribers: Subscribers,
}

impl BoundaryCondition {
    /// A condition of `kind` with all parameters zero.
    pub fn new(kind: BoundaryConditionType) -> Self {
        Self {
            kind,
            values: vec![0.0; kind.parameter_count()],
            subscribers: Subscribers::default(),
        }
    }

    /// A condition of `kind` with explicit parameters, or `None` if the
    /// count does not match the kind.
    pub fn with_values(kind: BoundaryConditionType, values: Vec<f64>) -> Option<Self> {
        let mut condition = Self::new(kind);
        if values.len() != kind.parameter_count() {
            return None;
        }
        condition.values = values;
        Some(condition)
    }

    pub fn kind(&self) -> BoundaryConditionType {
        self.kind
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Change the kind, resizing the parameter list to fit it. Existing
    /// parameters are kept where they still fit; new ones start at zero.
    pub fn set_kind(&mut self, kind: BoundaryConditionType) -> bool {
        if self.kind == kind {
            return false;
        }
        self.kind = kind;
        self.values.resize(kind.parameter_count(), 0.0);
        true
    }

    /// Replace the parameters. Rejected unless `values` has exactly the
    /// count the current kind requires.
    pub fn set_values(&mut self, values: &[f64]) -> bool {
        if values.len() != self.kind.parameter_count() || self.values == values {
            return false;
        }
        self.values = values.to_vec();
        true
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn assign(&mut self, other: &BoundaryCondition) -> bool {
        if self == other {
            return false;
        }
        self.kind = other.kind;
        self.values = other.values.clone();
        true
    }
}

impl PartialEq for BoundaryCondition {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.values == other.values
    }
}

impl Hash for BoundaryCondition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        for v in &self.values {
            float_key(*v).hash(state);
        }
    }
}
