use crate::core::aux_tables::{
    AuxTables, KDistributionSet, KDistributionTerm, SolarReferenceTable, SpectralResponseTable,
    TempRadianceTable, K_DISTRIBUTION_LAYERS,
};
use crate::types::{Channel, FlintError, FlintResult, GasTerm};
use ndarray::{Array1, Array2};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub const SPECTRAL_RESPONSE_37_FILE: &str = "aatsr_ir37.dat";
pub const SPECTRAL_RESPONSE_37_ROWS: usize = 255;
pub const SPECTRAL_RESPONSE_37_HEADER_LINES: usize = 3;

pub const SOLAR_REFERENCE_FILE: &str = "cahalan.d";
pub const SOLAR_REFERENCE_ROWS: usize = 2496;

pub const TEMP_RADIANCE_FILE: &str = "temp_to_rad_36.d";
pub const TEMP_RADIANCE_ROWS: usize = 200;

/// File name of a k-distribution coefficient (`weights == false`) or weight table
pub fn k_distribution_file(channel: Channel, term: GasTerm, weights: bool) -> String {
    let (band, set) = match channel {
        Channel::Ir37 => ("03700.00", 5),
        Channel::Ir16 => ("01600.00", 4),
    };
    let gas = match term {
        GasTerm::Dry => "and",
        GasTerm::WaterVapour => "h2o",
    };
    let kind = if weights { "weight" } else { "koeff" };
    format!("ck_flex_cd_AATSR_sfp1000_{}.{}.{}.ck.{}.d", band, gas, set, kind)
}

/// Readers for the whitespace-delimited auxiliary text tables
pub struct AuxDataReader;

impl AuxDataReader {
    /// Load every table from a directory holding the auxiliary files
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> FlintResult<AuxTables> {
        let dir = dir.as_ref();
        log::info!("Loading auxiliary tables from {}", dir.display());

        let spectral = Self::read_spectral_response(dir.join(SPECTRAL_RESPONSE_37_FILE))?;
        let solar = Self::read_solar_reference(dir.join(SOLAR_REFERENCE_FILE))?;
        let temp_rad = Self::read_temp_radiance(dir.join(TEMP_RADIANCE_FILE))?;
        let k_37 = Self::read_k_distribution_set(dir, Channel::Ir37)?;
        let k_16 = Self::read_k_distribution_set(dir, Channel::Ir16)?;

        AuxTables::new(spectral, solar, temp_rad, k_37, k_16)
    }

    /// AATSR 3.7 µm spectral response: 3 header lines, then (wavelength, response)
    /// rows each starting with one blank.
    pub fn read_spectral_response<P: AsRef<Path>>(path: P) -> FlintResult<SpectralResponseTable> {
        let (name, lines) = open_lines(path.as_ref())?;
        let rows = parse_rows(
            &name,
            lines,
            SPECTRAL_RESPONSE_37_HEADER_LINES,
            SPECTRAL_RESPONSE_37_ROWS,
            2,
            |line| line.get(1..).unwrap_or(""),
        )?;
        let (wavelength, response) = split_columns(rows);
        SpectralResponseTable::new(wavelength, response)
    }

    pub fn read_solar_reference<P: AsRef<Path>>(path: P) -> FlintResult<SolarReferenceTable> {
        let (name, lines) = open_lines(path.as_ref())?;
        let rows = parse_rows(&name, lines, 0, SOLAR_REFERENCE_ROWS, 2, |l| l)?;
        let (x, y) = split_columns(rows);
        SolarReferenceTable::new(x, y)
    }

    pub fn read_temp_radiance<P: AsRef<Path>>(path: P) -> FlintResult<TempRadianceTable> {
        let (name, lines) = open_lines(path.as_ref())?;
        let rows = parse_rows(&name, lines, 0, TEMP_RADIANCE_ROWS, 2, |l| l)?;
        let (temperature, radiance) = split_columns(rows);
        TempRadianceTable::new(temperature, radiance)
    }

    /// Coefficient matrix (spectral interval, layer)
    pub fn read_k_coefficients<P: AsRef<Path>>(path: P, rows: usize) -> FlintResult<Array2<f64>> {
        let (name, lines) = open_lines(path.as_ref())?;
        let values = parse_rows(&name, lines, 0, rows, K_DISTRIBUTION_LAYERS, |l| l)?;
        let flat: Vec<f64> = values.into_iter().flatten().collect();
        Array2::from_shape_vec((rows, K_DISTRIBUTION_LAYERS), flat)
            .map_err(|e| FlintError::TableShape(format!("{}: {}", name, e)))
    }

    /// Weight vector: the first value of every row
    pub fn read_k_weights<P: AsRef<Path>>(path: P, rows: usize) -> FlintResult<Array1<f64>> {
        let (name, lines) = open_lines(path.as_ref())?;
        let values = parse_rows(&name, lines, 0, rows, 1, |l| l)?;
        Ok(values.into_iter().map(|row| row[0]).collect())
    }

    pub fn read_k_distribution_set(dir: &Path, channel: Channel) -> FlintResult<KDistributionSet> {
        let rows = channel.spectral_intervals();
        let read_term = |term: GasTerm| -> FlintResult<KDistributionTerm> {
            let coefficients =
                Self::read_k_coefficients(dir.join(k_distribution_file(channel, term, false)), rows)?;
            let weights = Self::read_k_weights(dir.join(k_distribution_file(channel, term, true)), rows)?;
            Ok(KDistributionTerm::new(coefficients, weights))
        };
        KDistributionSet::new(channel, read_term(GasTerm::Dry)?, read_term(GasTerm::WaterVapour)?)
    }
}

fn open_lines(path: &Path) -> FlintResult<(String, std::io::Lines<BufReader<File>>)> {
    log::debug!("Reading auxiliary table {}", path.display());
    let file = File::open(path)?;
    Ok((path.display().to_string(), BufReader::new(file).lines()))
}

/// Parse `rows` data lines after `header` skipped lines, taking the first
/// `columns` numbers of each line. Extra lines and extra numbers are ignored.
fn parse_rows<R, F>(
    name: &str,
    lines: std::io::Lines<R>,
    header: usize,
    rows: usize,
    columns: usize,
    prepare: F,
) -> FlintResult<Vec<Vec<f64>>>
where
    R: BufRead,
    F: Fn(&str) -> &str,
{
    let mut values = Vec::with_capacity(rows);
    for (index, line) in lines.enumerate().skip(header) {
        if values.len() == rows {
            break;
        }
        let line = line?;
        let line_number = index + 1;

        let row = prepare(&line)
            .split_whitespace()
            .take(columns)
            .map(|token| {
                token.parse::<f64>().map_err(|e| FlintError::AuxData {
                    file: name.to_string(),
                    line: line_number,
                    message: format!("'{}': {}", token, e),
                })
            })
            .collect::<FlintResult<Vec<f64>>>()?;

        if row.len() < columns {
            return Err(FlintError::AuxData {
                file: name.to_string(),
                line: line_number,
                message: format!("expected {} values, found {}", columns, row.len()),
            });
        }
        values.push(row);
    }

    if values.len() < rows {
        return Err(FlintError::AuxData {
            file: name.to_string(),
            line: header + values.len(),
            message: format!("expected {} data rows, found {}", rows, values.len()),
        });
    }
    Ok(values)
}

fn split_columns(rows: Vec<Vec<f64>>) -> (Vec<f64>, Vec<f64>) {
    rows.into_iter().map(|row| (row[0], row[1])).unzip()
}
