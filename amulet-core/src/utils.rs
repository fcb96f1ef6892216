use std::ffi::OsStr;
use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;

///
/// Check whether a path points to a gzip'd file, judging by its extension.
///
pub fn is_gzipped(path: &Path) -> bool {
    path.extension() == Some(OsStr::new("gz"))
}

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let file: Box<dyn Read> = match is_gzipped(path) {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    let reader = BufReader::new(file);

    Ok(reader)
}

///
/// Return the first token of a line split on tabs or commas, trimmed.
///
/// Returns `None` for blank lines.
///
pub fn first_field(line: &str) -> Option<&str> {
    let field = line.split(['\t', ',']).next()?.trim();
    if field.is_empty() { None } else { Some(field) }
}

///
/// Render a float the way the report files expect: whole numbers keep a
/// trailing `.0` and very small or very large magnitudes switch to scientific
/// notation with a two-digit exponent (`40.0`, `12.25`, `1e-05`).
///
pub fn format_float(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0.0".to_string();
    }

    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return scientific;
    };

    if !(-4..16).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.abs());
    }

    let plain = value.to_string();
    if plain.contains('.') {
        plain
    } else {
        format!("{plain}.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[rstest]
    fn test_reads_plain_and_gzipped_files() {
        let dir = tempdir().unwrap();

        let plain = dir.path().join("chroms.txt");
        std::fs::write(&plain, "chr1\nchr2\n").unwrap();

        let gz = dir.path().join("chroms.txt.gz");
        let mut encoder = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        encoder.write_all(b"chr1\nchr2\n").unwrap();
        encoder.finish().unwrap();

        for path in [plain, gz] {
            let lines: Vec<String> = get_dynamic_reader(&path)
                .unwrap()
                .lines()
                .map(|l| l.unwrap())
                .collect();
            assert_eq!(lines, vec!["chr1".to_string(), "chr2".to_string()]);
        }
    }

    #[rstest]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let res = get_dynamic_reader(&dir.path().join("nope.txt"));
        assert_eq!(res.is_err(), true);
    }

    #[rstest]
    #[case("chr1\t248956422", Some("chr1"))]
    #[case("chr2,242193529", Some("chr2"))]
    #[case("chrX", Some("chrX"))]
    #[case("  chrY  ", Some("chrY"))]
    #[case("", None)]
    #[case("\t100", None)]
    fn test_first_field(#[case] line: &str, #[case] expected: Option<&str>) {
        assert_eq!(first_field(line), expected);
    }

    #[rstest]
    #[case(40.0, "40.0")]
    #[case(12.25, "12.25")]
    #[case(0.0, "0.0")]
    #[case(-3.0, "-3.0")]
    #[case(0.0001, "0.0001")]
    #[case(0.00001, "1e-05")]
    #[case(1.5e-7, "1.5e-07")]
    #[case(1e16, "1e+16")]
    #[case(1e15, "1000000000000000.0")]
    #[case(100.0 / 3.0, "33.333333333333336")]
    #[case(f64::NAN, "NaN")]
    fn test_format_float(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_float(value), expected);
    }
}
