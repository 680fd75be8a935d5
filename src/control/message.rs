//! Addressed control messages with typed arguments

use std::fmt;

/// Typed message argument
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Int(i32),
    Long(i64),
    Float(f32),
    String(String),
}

impl Argument {
    /// Integer view. Floats are truncated; strings must parse.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Argument::Int(v) => Some(i64::from(*v)),
            Argument::Long(v) => Some(*v),
            Argument::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            Argument::Float(_) => None,
            Argument::String(s) => s.trim().parse().ok(),
        }
    }

    /// Float view. Non-finite values are rejected.
    pub fn as_f32(&self) -> Option<f32> {
        let value = match self {
            Argument::Int(v) => *v as f32,
            Argument::Long(v) => *v as f32,
            Argument::Float(v) => *v,
            Argument::String(s) => s.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Boolean view: non-zero numbers, or "true"/"false"/"1"/"0"/"on"/"off"
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Argument::Int(v) => Some(*v != 0),
            Argument::Long(v) => Some(*v != 0),
            Argument::Float(v) => Some(*v != 0.0),
            Argument::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => Some(true),
                "false" | "0" | "off" | "no" => Some(false),
                _ => None,
            },
        }
    }

    /// String view; numbers are rendered in decimal
    pub fn to_text(&self) -> String {
        match self {
            Argument::Int(v) => v.to_string(),
            Argument::Long(v) => v.to_string(),
            Argument::Float(v) => v.to_string(),
            Argument::String(s) => s.clone(),
        }
    }

    /// Type name for log messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Argument::Int(_) => "int",
            Argument::Long(_) => "int64",
            Argument::Float(_) => "float",
            Argument::String(_) => "string",
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other.to_text()),
        }
    }
}

/// One inbound or outbound control message
#[derive(Debug, Clone, PartialEq)]
pub struct ControlMessage {
    pub address: String,
    pub args: Vec<Argument>,
}

impl ControlMessage {
    pub fn new(address: impl Into<String>, args: Vec<Argument>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }

    /// Message without arguments
    pub fn bare(address: impl Into<String>) -> Self {
        Self::new(address, Vec::new())
    }
}

impl fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
