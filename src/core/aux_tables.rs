use crate::types::{Channel, FlintError, FlintResult, GasTerm};
use ndarray::{Array1, Array2};

/// Number of vertical layers (coefficient columns) of every k-distribution table
pub const K_DISTRIBUTION_LAYERS: usize = 8;

/// AATSR 3.7 µm spectral response: (wavelength in µm, response), ascending in wavelength
#[derive(Debug, Clone)]
pub struct SpectralResponseTable {
    wavelength: Array1<f64>,
    response: Array1<f64>,
}

impl SpectralResponseTable {
    pub fn new(wavelength: Vec<f64>, response: Vec<f64>) -> FlintResult<Self> {
        check_columns("spectral response", wavelength.len(), response.len(), 3)?;
        check_order("spectral response", &wavelength, Order::Ascending)?;
        Ok(Self {
            wavelength: Array1::from(wavelength),
            response: Array1::from(response),
        })
    }

    pub fn wavelength(&self) -> &[f64] {
        slice_of(&self.wavelength)
    }

    pub fn response(&self) -> &[f64] {
        slice_of(&self.response)
    }

    pub fn len(&self) -> usize {
        self.wavelength.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelength.is_empty()
    }
}

/// Solar reference spectrum: (x in nm, solar irradiance), descending in x
#[derive(Debug, Clone)]
pub struct SolarReferenceTable {
    x: Array1<f64>,
    y: Array1<f64>,
}

impl SolarReferenceTable {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> FlintResult<Self> {
        check_columns("solar reference", x.len(), y.len(), 2)?;
        check_order("solar reference", &x, Order::Descending)?;
        Ok(Self {
            x: Array1::from(x),
            y: Array1::from(y),
        })
    }

    pub fn x(&self) -> &[f64] {
        slice_of(&self.x)
    }

    pub fn y(&self) -> &[f64] {
        slice_of(&self.y)
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// 3.7 µm brightness temperature (K) to radiance, ascending in temperature
#[derive(Debug, Clone)]
pub struct TempRadianceTable {
    temperature: Array1<f64>,
    radiance: Array1<f64>,
}

impl TempRadianceTable {
    pub fn new(temperature: Vec<f64>, radiance: Vec<f64>) -> FlintResult<Self> {
        check_columns("temperature/radiance", temperature.len(), radiance.len(), 2)?;
        check_order("temperature/radiance", &temperature, Order::Ascending)?;
        Ok(Self {
            temperature: Array1::from(temperature),
            radiance: Array1::from(radiance),
        })
    }

    pub fn temperature(&self) -> &[f64] {
        slice_of(&self.temperature)
    }

    pub fn radiance(&self) -> &[f64] {
        slice_of(&self.radiance)
    }

    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }
}

/// One gas term of a k-distribution set.
///
/// `coefficients` is indexed (spectral interval, layer); `weights` has one
/// entry per spectral interval.
#[derive(Debug, Clone)]
pub struct KDistributionTerm {
    pub coefficients: Array2<f64>,
    pub weights: Array1<f64>,
}

impl KDistributionTerm {
    pub fn new(coefficients: Array2<f64>, weights: Array1<f64>) -> Self {
        Self { coefficients, weights }
    }

    pub fn spectral_intervals(&self) -> usize {
        self.coefficients.nrows()
    }

    pub fn layers(&self) -> usize {
        self.coefficients.ncols()
    }
}

/// Dry air ("A") and water vapour ("H") terms of one channel
#[derive(Debug, Clone)]
pub struct KDistributionSet {
    channel: Channel,
    dry: KDistributionTerm,
    water_vapour: KDistributionTerm,
}

impl KDistributionSet {
    pub fn new(
        channel: Channel,
        dry: KDistributionTerm,
        water_vapour: KDistributionTerm,
    ) -> FlintResult<Self> {
        for (term, table) in [(GasTerm::Dry, &dry), (GasTerm::WaterVapour, &water_vapour)] {
            let rows = channel.spectral_intervals();
            if table.coefficients.dim() != (rows, K_DISTRIBUTION_LAYERS) {
                return Err(FlintError::TableShape(format!(
                    "{} {} coefficients must be {}x{}, got {}x{}",
                    channel,
                    term,
                    rows,
                    K_DISTRIBUTION_LAYERS,
                    table.coefficients.nrows(),
                    table.coefficients.ncols()
                )));
            }
            if table.weights.len() != rows {
                return Err(FlintError::TableShape(format!(
                    "{} {} weights must have {} rows, got {}",
                    channel,
                    term,
                    rows,
                    table.weights.len()
                )));
            }
        }

        Ok(Self {
            channel,
            dry,
            water_vapour,
        })
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn term(&self, term: GasTerm) -> &KDistributionTerm {
        match term {
            GasTerm::Dry => &self.dry,
            GasTerm::WaterVapour => &self.water_vapour,
        }
    }

    pub fn dry(&self) -> &KDistributionTerm {
        &self.dry
    }

    pub fn water_vapour(&self) -> &KDistributionTerm {
        &self.water_vapour
    }
}

/// All auxiliary tables of the retrieval, loaded once and shared read-only
#[derive(Debug, Clone)]
pub struct AuxTables {
    spectral_response: SpectralResponseTable,
    solar_reference: SolarReferenceTable,
    temp_radiance: TempRadianceTable,
    k_distribution_37: KDistributionSet,
    k_distribution_16: KDistributionSet,
}

impl AuxTables {
    pub fn new(
        spectral_response: SpectralResponseTable,
        solar_reference: SolarReferenceTable,
        temp_radiance: TempRadianceTable,
        k_distribution_37: KDistributionSet,
        k_distribution_16: KDistributionSet,
    ) -> FlintResult<Self> {
        if k_distribution_37.channel() != Channel::Ir37 {
            return Err(FlintError::TableShape(format!(
                "3.7um k-distribution slot holds a {} set",
                k_distribution_37.channel()
            )));
        }
        if k_distribution_16.channel() != Channel::Ir16 {
            return Err(FlintError::TableShape(format!(
                "1.6um k-distribution slot holds a {} set",
                k_distribution_16.channel()
            )));
        }

        log::debug!(
            "Aux tables: {} spectral response rows, {} solar reference rows, {} BT/radiance rows",
            spectral_response.len(),
            solar_reference.len(),
            temp_radiance.len()
        );

        Ok(Self {
            spectral_response,
            solar_reference,
            temp_radiance,
            k_distribution_37,
            k_distribution_16,
        })
    }

    pub fn spectral_response(&self) -> &SpectralResponseTable {
        &self.spectral_response
    }

    pub fn solar_reference(&self) -> &SolarReferenceTable {
        &self.solar_reference
    }

    pub fn temp_radiance(&self) -> &TempRadianceTable {
        &self.temp_radiance
    }

    pub fn k_distribution_set(&self, channel: Channel) -> &KDistributionSet {
        match channel {
            Channel::Ir37 => &self.k_distribution_37,
            Channel::Ir16 => &self.k_distribution_16,
        }
    }

    /// Coefficient/weight lookup by raw selectors (channel 37 or 16, term "A" or "H")
    pub fn k_distribution(&self, channel: u32, term: &str) -> FlintResult<&KDistributionTerm> {
        let channel = Channel::from_code(channel)?;
        let term: GasTerm = term.parse()?;
        Ok(self.k_distribution_set(channel).term(term))
    }
}

enum Order {
    Ascending,
    Descending,
}

fn check_columns(table: &str, x_len: usize, y_len: usize, min_rows: usize) -> FlintResult<()> {
    if x_len != y_len {
        return Err(FlintError::TableShape(format!(
            "{} table columns differ in length ({} vs {})",
            table, x_len, y_len
        )));
    }
    if x_len < min_rows {
        return Err(FlintError::TableShape(format!(
            "{} table needs at least {} rows, got {}",
            table, min_rows, x_len
        )));
    }
    Ok(())
}

fn check_order(table: &str, values: &[f64], order: Order) -> FlintResult<()> {
    let sorted = values.windows(2).all(|w| match order {
        Order::Ascending => w[0] <= w[1],
        Order::Descending => w[0] >= w[1],
    });
    if !sorted {
        let direction = match order {
            Order::Ascending => "ascending",
            Order::Descending => "descending",
        };
        return Err(FlintError::TableShape(format!(
            "{} table key column is not sorted {}",
            table, direction
        )));
    }
    Ok(())
}

// Arrays built from a Vec are always contiguous
fn slice_of(array: &Array1<f64>) -> &[f64] {
    array.as_slice().unwrap_or(&[])
}

#[cfg(test)]
pub(crate) mod test_tables {
    //! Synthetic tables with simple closed-form contents

    use super::*;

    pub fn k_term(channel: Channel, coefficient: f64, weight: f64) -> KDistributionTerm {
        let rows = channel.spectral_intervals();
        KDistributionTerm::new(
            Array2::from_elem((rows, K_DISTRIBUTION_LAYERS), coefficient),
            Array1::from_elem(rows, weight),
        )
    }

    /// Flat response over 3.0..=4.0 µm, constant solar spectrum of 1.5,
    /// linear BT table radiance = 0.01 * (T - 250).
    pub fn synthetic() -> AuxTables {
        let wavelength: Vec<f64> = (0..101).map(|i| 3.0 + i as f64 * 0.01).collect();
        let response = vec![1.0; wavelength.len()];
        let spectral = SpectralResponseTable::new(wavelength, response).unwrap();

        let x: Vec<f64> = (0..50).map(|i| 5000.0 - i as f64 * 100.0).collect();
        let y = vec![1.5; x.len()];
        let solar = SolarReferenceTable::new(x, y).unwrap();

        let temperature: Vec<f64> = (0..81).map(|i| 250.0 + i as f64).collect();
        let radiance: Vec<f64> = temperature.iter().map(|t| 0.01 * (t - 250.0)).collect();
        let temp_rad = TempRadianceTable::new(temperature, radiance).unwrap();

        let weight_37 = 1.0 / Channel::Ir37.spectral_intervals() as f64;
        let weight_16 = 1.0 / Channel::Ir16.spectral_intervals() as f64;
        let k37 = KDistributionSet::new(
            Channel::Ir37,
            k_term(Channel::Ir37, 0.01, weight_37),
            k_term(Channel::Ir37, 0.02, weight_37),
        )
        .unwrap();
        let k16 = KDistributionSet::new(
            Channel::Ir16,
            k_term(Channel::Ir16, 0.005, weight_16),
            k_term(Channel::Ir16, 0.001, weight_16),
        )
        .unwrap();

        AuxTables::new(spectral, solar, temp_rad, k37, k16).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_tables::*;
    use super::*;

    #[test]
    fn test_table_validation() {
        assert!(TempRadianceTable::new(vec![260.0, 270.0], vec![0.1]).is_err());
        assert!(TempRadianceTable::new(vec![270.0, 260.0], vec![0.1, 0.2]).is_err());
        assert!(SolarReferenceTable::new(vec![1.0, 2.0], vec![0.1, 0.2]).is_err());
        assert!(SpectralResponseTable::new(vec![3.0, 3.1], vec![1.0, 1.0]).is_err());
    }

    #[test]
    fn test_k_distribution_shape() {
        let good = k_term(Channel::Ir37, 0.1, 0.1);
        let wrong_rows = k_term(Channel::Ir16, 0.1, 0.1);
        assert!(KDistributionSet::new(Channel::Ir37, good.clone(), good.clone()).is_ok());
        assert!(KDistributionSet::new(Channel::Ir37, good.clone(), wrong_rows).is_err());

        let mismatched = KDistributionTerm::new(
            Array2::zeros((45, K_DISTRIBUTION_LAYERS)),
            Array1::zeros(44),
        );
        match KDistributionSet::new(Channel::Ir37, good, mismatched) {
            Err(FlintError::TableShape(msg)) => assert!(msg.contains("weights")),
            other => panic!("expected TableShape, got {:?}", other),
        }
    }

    #[test]
    fn test_selector_lookup() {
        let tables = synthetic();
        let term = tables.k_distribution(37, "h").unwrap();
        assert_eq!(term.spectral_intervals(), 45);
        assert_eq!(term.layers(), 8);
        assert_eq!(term.coefficients[[0, 0]], 0.02);

        let term = tables.k_distribution(16, "A").unwrap();
        assert_eq!(term.spectral_intervals(), 54);

        let set = tables.k_distribution_set(Channel::Ir16);
        assert_eq!(set.dry().coefficients[[0, 0]], 0.005);
        assert_eq!(set.water_vapour().coefficients[[0, 0]], 0.001);
        assert!(std::ptr::eq(set.dry(), set.term(GasTerm::Dry)));
        assert!(std::ptr::eq(set.water_vapour(), set.term(GasTerm::WaterVapour)));

        assert!(matches!(
            tables.k_distribution(11, "A"),
            Err(FlintError::InvalidChannel { channel: 11 })
        ));
        assert!(matches!(
            tables.k_distribution(37, "O3"),
            Err(FlintError::InvalidGasTerm { .. })
        ));
    }
}
