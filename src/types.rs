use serde::{Deserialize, Serialize};

/// Sentinel used for "no windspeed / no radiance" in candidate pairs
pub const NO_RESULT: f64 = -1.0;

/// AATSR channels for which k-distribution tables exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// 3.7 µm
    Ir37,
    /// 1.6 µm
    Ir16,
}

impl Channel {
    /// Resolve the numeric channel code used by the k-distribution tables (37 or 16)
    pub fn from_code(code: u32) -> FlintResult<Self> {
        match code {
            37 => Ok(Channel::Ir37),
            16 => Ok(Channel::Ir16),
            _ => Err(FlintError::InvalidChannel { channel: code }),
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            Channel::Ir37 => 37,
            Channel::Ir16 => 16,
        }
    }

    /// Number of spectral sub-intervals (coefficient rows) of the channel
    pub fn spectral_intervals(&self) -> usize {
        match self {
            Channel::Ir37 => 45,
            Channel::Ir16 => 54,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Ir37 => write!(f, "3.7um"),
            Channel::Ir16 => write!(f, "1.6um"),
        }
    }
}

/// Gas term of a k-distribution set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GasTerm {
    /// "A": dry air term
    Dry,
    /// "H": water vapour term
    WaterVapour,
}

impl std::str::FromStr for GasTerm {
    type Err = FlintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(GasTerm::Dry),
            "H" => Ok(GasTerm::WaterVapour),
            _ => Err(FlintError::InvalidGasTerm { term: s.to_string() }),
        }
    }
}

impl std::fmt::Display for GasTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GasTerm::Dry => write!(f, "A"),
            GasTerm::WaterVapour => write!(f, "H"),
        }
    }
}

/// Per-pixel inputs of the retrieval, taken from a MERIS/AATSR collocation product.
/// Angles are in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelObservation {
    // Flags
    pub meris_invalid: bool,
    pub aatsr_land: bool,
    pub aatsr_cloudy: bool,
    pub aatsr_sunglint: bool,

    // MERIS geometry
    pub meris_sun_zenith: f64,
    pub meris_view_zenith: f64,
    pub meris_sun_azimuth: f64,
    pub meris_view_azimuth: f64,

    // AATSR nadir geometry
    pub aatsr_sun_elevation: f64,
    pub aatsr_view_elevation: f64,
    pub aatsr_sun_azimuth: f64,
    pub aatsr_view_azimuth: f64,

    // MERIS radiances (bands 14 and 15)
    pub meris_radiance_14: f64,
    pub meris_radiance_15: f64,

    // AATSR nadir measurements
    pub aatsr_bt_37: f64,           // K
    pub aatsr_bt_11: f64,           // K
    pub aatsr_bt_12: f64,           // K
    pub aatsr_reflectance_16: f64,  // %

    // ECMWF wind components (m/s)
    pub zonal_wind: f64,
    pub meridional_wind: f64,
}

impl PixelObservation {
    /// Magnitude of the ECMWF wind vector
    pub fn field_windspeed(&self) -> f64 {
        self.zonal_wind.hypot(self.meridional_wind)
    }
}

/// A (windspeed, normalized radiance) pair. `(-1, -1)` marks "no result".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindRadiance {
    pub windspeed: f64,  // m/s
    pub radiance: f64,   // 1/sr
}

impl WindRadiance {
    pub const NONE: WindRadiance = WindRadiance {
        windspeed: NO_RESULT,
        radiance: NO_RESULT,
    };

    pub fn new(windspeed: f64, radiance: f64) -> Self {
        Self { windspeed, radiance }
    }

    pub fn is_valid(&self) -> bool {
        self.windspeed != NO_RESULT
    }
}

impl Default for WindRadiance {
    fn default() -> Self {
        Self::NONE
    }
}

/// Up to two LUT solutions of the geometric conversion.
///
/// In the monotone case only the first slot can be populated; in the bimodal
/// case each slot belongs to one branch of the LUT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LutCandidates(pub [WindRadiance; 2]);

impl LutCandidates {
    pub fn first(&self) -> WindRadiance {
        self.0[0]
    }

    pub fn second(&self) -> WindRadiance {
        self.0[1]
    }

    /// Number of populated candidates (0, 1 or 2)
    pub fn windspeeds_found(&self) -> usize {
        self.0.iter().filter(|c| c.is_valid()).count()
    }
}

/// Final outcome of the retrieval for one pixel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RetrievalResult {
    Retrieved(WindRadiance),
    /// Pixel excluded by the validity predicate
    NotUseful,
    /// Additional cloud test fired (only when enabled)
    CloudMasked,
    /// No LUT branch within tolerance
    NoSolution,
}

impl RetrievalResult {
    /// Final pair, or the sentinel pair when nothing was retrieved
    pub fn pair(&self) -> WindRadiance {
        match self {
            RetrievalResult::Retrieved(pair) => *pair,
            _ => WindRadiance::NONE,
        }
    }

    pub fn is_retrieved(&self) -> bool {
        matches!(self, RetrievalResult::Retrieved(_))
    }
}

impl Default for RetrievalResult {
    fn default() -> Self {
        RetrievalResult::NotUseful
    }
}

/// How the water vapour feature vector is checked against the trained range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeCheck {
    /// A feature enables the surrogate when it is >= both of its limits
    Legacy,
    /// The surrogate is applied only when every feature lies inside its limits
    Bounded,
}

/// Tunable constants of the retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlintParams {
    /// Water vapour column used when the surrogate is not applied
    pub standard_water_vapour: f64,
    /// Valid (lower, upper) range per water vapour surrogate feature
    pub water_vapour_limits: [(f64, f64); 5],
    pub water_vapour_range_check: RangeCheck,
    /// Water vapour column the H coefficients are normalized to
    pub water_vapour_reference: f64,
    /// 11/12 µm to 3.7 µm thermal extrapolation: c0 + c1*bt11 + c2*(bt11 - bt12)
    pub thermal_coefficients: [f64; 3],
    pub lut_size: usize,
    pub lut_windspeed_min: f64,
    pub lut_windspeed_max: f64,
    /// Real refractive index of water at 3.7 µm
    pub refractive_index_37: f64,
    /// Real refractive index of water at 0.88 µm (MERIS)
    pub refractive_index_088: f64,
    /// Minimum 3.7 µm brightness temperature of a useful pixel (K)
    pub min_bt_37: f64,
    pub additional_cloud_mask: bool,
    pub cloud_specular_divisor: f64,
    pub cloud_tolerance: f64,
    pub correct_view_azimuth: bool,
    /// Second-order difference ratios outside this window mark a discontinuity
    pub discontinuity_ratio_min: f64,
    pub discontinuity_ratio_max: f64,
}

impl Default for FlintParams {
    fn default() -> Self {
        Self {
            standard_water_vapour: 2.8,
            water_vapour_limits: [
                (3.75e-2, 1.84e1),
                (-6.33e-1, 6.31e-1),
                (7.73e-1, 1.00),
                (1.60e-1, 9.26e-1),
                (-6.98e-1, 7.62),
            ],
            water_vapour_range_check: RangeCheck::Legacy,
            water_vapour_reference: 2.7872,
            thermal_coefficients: [4.91348, 0.978489, 1.37919],
            lut_size: 151,
            lut_windspeed_min: 1.0,
            lut_windspeed_max: 14.0,
            refractive_index_37: 1.37,
            refractive_index_088: 1.33,
            min_bt_37: 270.0,
            additional_cloud_mask: false,
            cloud_specular_divisor: 0.79,
            cloud_tolerance: 2.0,
            correct_view_azimuth: true,
            discontinuity_ratio_min: 0.1,
            discontinuity_ratio_max: 10.0,
        }
    }
}

impl FlintParams {
    /// Check the parameters for internal consistency
    pub fn validate(&self) -> FlintResult<()> {
        if self.lut_size < 2 {
            return Err(FlintError::InvalidParameter(format!(
                "lut_size must be at least 2, got {}",
                self.lut_size
            )));
        }
        if !(self.lut_windspeed_min < self.lut_windspeed_max) {
            return Err(FlintError::InvalidParameter(format!(
                "LUT windspeed range [{}, {}] is empty",
                self.lut_windspeed_min, self.lut_windspeed_max
            )));
        }
        if self.lut_windspeed_min <= 0.0 {
            return Err(FlintError::InvalidParameter(
                "LUT windspeeds must be positive".to_string(),
            ));
        }
        if self.water_vapour_reference <= 0.0 {
            return Err(FlintError::InvalidParameter(
                "water_vapour_reference must be positive".to_string(),
            ));
        }
        if self.cloud_specular_divisor == 0.0 {
            return Err(FlintError::InvalidParameter(
                "cloud_specular_divisor must not be zero".to_string(),
            ));
        }
        if !(self.discontinuity_ratio_min < self.discontinuity_ratio_max) {
            return Err(FlintError::InvalidParameter(format!(
                "discontinuity ratio window [{}, {}] is empty",
                self.discontinuity_ratio_min, self.discontinuity_ratio_max
            )));
        }
        Ok(())
    }
}

/// Error types for glint processing
#[derive(Debug, thiserror::Error)]
pub enum FlintError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported channel {channel}: must be 37 or 16")]
    InvalidChannel { channel: u32 },

    #[error("Unsupported gas term '{term}': must be 'A' or 'H'")]
    InvalidGasTerm { term: String },

    #[error("Invalid table: {0}")]
    TableShape(String),

    #[error("Neural surrogate error: {0}")]
    Surrogate(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Failed to parse auxdata file {file} (line {line}): {message}")]
    AuxData {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Processing cancelled")]
    Cancelled,
}

/// Result type for glint processing
pub type FlintResult<T> = Result<T, FlintError>;
