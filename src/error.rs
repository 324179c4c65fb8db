use std::{
    error::Error,
    fmt::{Display, Formatter},
};

/// Result type for operations that combine several kinds of errors.
pub type FireGroupsResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// The ways a [Detection](crate::Detection) can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    NonFiniteLatitude,
    NonFiniteLongitude,
    LatitudeOutOfRange,
    LongitudeOutOfRange,
    NonFinitePower,
    NegativePower,
}

impl ValidationErrorKind {
    fn as_str(self) -> &'static str {
        use ValidationErrorKind::*;

        match self {
            NonFiniteLatitude => "latitude is not finite",
            NonFiniteLongitude => "longitude is not finite",
            LatitudeOutOfRange => "latitude outside of -90 to 90",
            LongitudeOutOfRange => "longitude outside of -180 to 180",
            NonFinitePower => "radiative power is not finite",
            NegativePower => "radiative power is negative",
        }
    }
}

/// A detection was rejected before clustering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    /// The offending value.
    pub value: f64,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "invalid detection, {}: {}", self.kind.as_str(), self.value)
    }
}

impl Error for ValidationError {}

#[derive(Debug, Clone, Copy)]
pub struct ConfigError {
    pub msg: &'static str,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.msg)
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, Copy)]
pub struct BoundaryError {
    pub msg: &'static str,
}

impl Display for BoundaryError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.msg)
    }
}

impl Error for BoundaryError {}
