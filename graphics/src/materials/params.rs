//! Material parameter types.
//!
//! Parameters are keyed by [`Alias`], a semantic tag naming the shader
//! binding slot a value feeds, with a typed [`ParamValue`]. The scene's
//! aggregation pass collects parameters from the node chain into these
//! sets; the backend maps aliases to actual bindings.

use std::fmt;

/// Well-known parameter slot names.
///
/// Standard fixed-function-style slots plus extensibility via
/// [`Custom`](Self::Custom).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Alias {
    // -- Transform --
    /// Full model transform, column-major.
    ModelMatrix,

    // -- Surface color --
    /// Ambient color `[r, g, b, a]`.
    AmbientColor,
    /// Diffuse color `[r, g, b, a]`.
    DiffuseColor,
    /// Specular color `[r, g, b, a]`.
    SpecularColor,
    /// Emissive color `[r, g, b, a]`.
    EmissiveColor,
    /// Opacity (0.0 transparent, 1.0 opaque).
    Opacity,
    /// Specular exponent.
    Shininess,

    // -- Extension --
    /// Custom slot for non-standard semantics.
    Custom(String),
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelMatrix => write!(f, "ModelMatrix"),
            Self::AmbientColor => write!(f, "AmbientColor"),
            Self::DiffuseColor => write!(f, "DiffuseColor"),
            Self::SpecularColor => write!(f, "SpecularColor"),
            Self::EmissiveColor => write!(f, "EmissiveColor"),
            Self::Opacity => write!(f, "Opacity"),
            Self::Shininess => write!(f, "Shininess"),
            Self::Custom(name) => write!(f, "Custom({name})"),
        }
    }
}

/// A typed parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Single float (opacity, shininess).
    Float(f32),
    /// Signed integer.
    Int(i32),
    /// 3-component vector.
    Vec3([f32; 3]),
    /// 4-component vector (colors).
    Vec4([f32; 4]),
    /// 4x4 matrix, column-major (transforms).
    Mat4([f32; 16]),
}

impl ParamValue {
    /// Get the float value, if this is a float.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the integer value, if this is an integer.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the vec3 value, if this is a vec3.
    pub fn as_vec3(&self) -> Option<[f32; 3]> {
        match self {
            Self::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the vec4 value, if this is a vec4.
    pub fn as_vec4(&self) -> Option<[f32; 4]> {
        match self {
            Self::Vec4(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the matrix value, if this is a matrix.
    pub fn as_mat4(&self) -> Option<[f32; 16]> {
        match self {
            Self::Mat4(v) => Some(*v),
            _ => None,
        }
    }
}

/// An ordered set of parameters with replace-on-set semantics.
///
/// Used for material node values, group-level constants, and per-command
/// constants. Entries keep first-set order, which makes binding traces
/// deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamSet {
    entries: Vec<(Alias, ParamValue)>,
}

impl ParamSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a parameter, replacing any existing value under the same alias.
    pub fn set(&mut self, alias: Alias, value: ParamValue) {
        if let Some(entry) = self.entries.iter_mut().find(|(a, _)| *a == alias) {
            entry.1 = value;
        } else {
            self.entries.push((alias, value));
        }
    }

    /// Find a value by alias.
    pub fn get(&self, alias: &Alias) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(a, _)| a == alias)
            .map(|(_, v)| v)
    }

    /// Whether the set holds a value for `alias`.
    pub fn contains(&self, alias: &Alias) -> bool {
        self.entries.iter().any(|(a, _)| a == alias)
    }

    /// Get a float value by alias.
    pub fn get_float(&self, alias: &Alias) -> Option<f32> {
        self.get(alias)?.as_float()
    }

    /// Get a vec3 value by alias.
    pub fn get_vec3(&self, alias: &Alias) -> Option<[f32; 3]> {
        self.get(alias)?.as_vec3()
    }

    /// Get a vec4 value by alias.
    pub fn get_vec4(&self, alias: &Alias) -> Option<[f32; 4]> {
        self.get(alias)?.as_vec4()
    }

    /// Get a matrix value by alias.
    pub fn get_mat4(&self, alias: &Alias) -> Option<[f32; 16]> {
        self.get(alias)?.as_mat4()
    }

    /// Iterate entries in first-set order.
    pub fn iter(&self) -> impl Iterator<Item = &(Alias, ParamValue)> {
        self.entries.iter()
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry, keeping the allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
