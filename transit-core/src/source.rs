//! # Light Curve Source Module
//!
//! Reads raw time/flux columns from disk and turns them into a
//! [`TimeSeries`] plus the content hash that keys its catalog.
//!
//! ## Supported Formats
//! - **CSV**: two columns `time,flux`; a header line and `#` comments are allowed
//! - **FITS** (feature `fits`): `TIME` and `PDCSAP_FLUX` columns of the
//!   `LIGHTCURVE` extension, as distributed by the Kepler archive

use crate::error::{Result, TransitError};
use crate::series::{TimeSeries, kepler_id_from_name};
use log::info;
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Chunk size used while hashing source files.
const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Time and flux columns exactly as read, before any filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLightCurve {
    pub time: Vec<f64>,
    pub flux: Vec<f64>,
}

/// Something that can produce a raw light curve from a file.
pub trait LightCurveSource {
    fn path(&self) -> &Path;
    fn read(&self) -> Result<RawLightCurve>;
}

/// A light curve ready for the session: the series plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub series: TimeSeries,
    /// Lowercase hex SHA-1 of the source file contents.
    pub hash: String,
    pub path: PathBuf,
}

/// Loads plain `time,flux` text files.
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl LightCurveSource for CsvSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<RawLightCurve> {
        let reader = csv_reader_builder().from_path(&self.path)?;
        read_csv_records(reader)
    }
}

/// Reader settings shared by file and in-memory CSV input.
///
/// Headers are detected by hand (see [`read_csv_records`]), `#` starts a
/// comment line, and short rows are let through so they can be reported
/// with their line number.
fn csv_reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(b',')
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .trim(csv::Trim::All);
    builder
}

/// Parses `time,flux` rows from text.
///
/// Lines starting with `#` and blank lines are skipped. A first row whose
/// time column is not a number is taken as the header. Empty or unparsable
/// cells read as NaN and get filtered with the other non-finite samples.
pub fn parse_csv(text: &str) -> Result<RawLightCurve> {
    let reader = csv_reader_builder().from_reader(text.as_bytes());
    read_csv_records(reader)
}

fn read_csv_records<R: Read>(mut reader: csv::Reader<R>) -> Result<RawLightCurve> {
    let mut curve = RawLightCurve::default();

    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let (Some(time), Some(flux)) = (record.get(0), record.get(1)) else {
            return Err(TransitError::invalid(format!(
                "line {line}: expected `time,flux`, got {} column(s)",
                record.len()
            )));
        };

        let time = time.parse::<f64>();
        if row == 0 && time.is_err() {
            // header
            continue;
        }
        curve.time.push(time.unwrap_or(f64::NAN));
        curve.flux.push(flux.parse().unwrap_or(f64::NAN));
    }

    Ok(curve)
}

/// Loads Kepler `.fits` light curves.
#[cfg(feature = "fits")]
pub struct FitsSource {
    path: PathBuf,
}

#[cfg(feature = "fits")]
impl FitsSource {
    /// Extension holding the light curve table.
    pub const EXTENSION: &'static str = "LIGHTCURVE";
    pub const TIME_COLUMN: &'static str = "TIME";
    pub const FLUX_COLUMN: &'static str = "PDCSAP_FLUX";

    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[cfg(feature = "fits")]
impl LightCurveSource for FitsSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<RawLightCurve> {
        use fitsio::FitsFile;

        let fits_err = |e: fitsio::errors::Error| TransitError::Fits(e.to_string());

        let mut fptr = FitsFile::open(&self.path).map_err(fits_err)?;
        let hdu = fptr.hdu(Self::EXTENSION).map_err(fits_err)?;
        let time: Vec<f64> = hdu.read_col(&mut fptr, Self::TIME_COLUMN).map_err(fits_err)?;
        let flux: Vec<f64> = hdu.read_col(&mut fptr, Self::FLUX_COLUMN).map_err(fits_err)?;

        Ok(RawLightCurve { time, flux })
    }
}

/// Picks a source from the file extension.
///
/// `.fits`/`.fit` need the `fits` feature; everything else is read as CSV.
pub fn source_for_path<P: AsRef<Path>>(path: P) -> Result<Box<dyn LightCurveSource>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        #[cfg(feature = "fits")]
        Some("fits" | "fit") => Ok(Box::new(FitsSource::new(path))),
        #[cfg(not(feature = "fits"))]
        Some("fits" | "fit") => Err(TransitError::invalid(format!(
            "{} is a FITS file; rebuild with the `fits` feature to read it",
            path.display()
        ))),
        _ => Ok(Box::new(CsvSource::new(path))),
    }
}

/// Reads a source and builds the session-ready series.
///
/// The identifier is the Kepler ID found in the file name, or empty.
pub fn load_series(source: &dyn LightCurveSource) -> Result<LoadedSeries> {
    let path = source.path();
    let raw = source.read()?;

    let identifier = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(kepler_id_from_name)
        .unwrap_or_default();
    let series = TimeSeries::new(raw.time, raw.flux, identifier)?;
    let hash = content_hash(path)?;

    info!(
        "Loaded {} samples from {} (hash {})",
        series.len(),
        path.display(),
        hash
    );

    Ok(LoadedSeries {
        series,
        hash,
        path: path.to_path_buf(),
    })
}

/// Lowercase hex SHA-1 over the full byte content of a file.
pub fn content_hash<P: AsRef<Path>>(path: P) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha1::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}
