// mod.rs - Output formatters module

pub mod display;
pub mod tree;

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::core::DistanceMatrix;
use crate::error::{PhyloError, Result};

pub use display::truncate_for_display;
pub use tree::{write_json, write_newick};

/// Matrix formats accepted by `write_matrix`
pub const MATRIX_FORMATS: [&str; 4] = ["tsv", "csv", "phylip", "nexus"];

/// Ensure parent directory exists before creating file
pub(crate) fn ensure_parent_dir(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    Ok(())
}

pub(crate) fn create_output(file_path: &Path) -> Result<BufWriter<File>> {
    ensure_parent_dir(file_path)?;
    let file = File::create(file_path).map_err(|e| {
        PhyloError::Config(format!("Failed to create output file '{}': {}", file_path.display(), e))
    })?;
    Ok(BufWriter::new(file))
}

fn timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn format_distance(d: f64) -> String {
    format!("{:.6}", d)
}

fn csv_error(e: csv::Error) -> PhyloError {
    PhyloError::Io(std::io::Error::other(e))
}

/// Delimited square matrix (TSV/CSV) with a commented provenance header.
///
/// Names containing the separator, quotes or newlines are quoted.
pub fn render_delimited<W: Write>(
    writer: &mut W,
    matrix: &DistanceMatrix,
    separator: u8,
    command_line: &str,
) -> Result<()> {
    writeln!(writer, "# Command: {}", command_line)?;
    writeln!(writer, "# Generated: {}", timestamp())?;
    writeln!(writer, "# seqphylo v{}", env!("CARGO_PKG_VERSION"))?;

    let mut table = csv::WriterBuilder::new()
        .delimiter(separator)
        .from_writer(writer);

    let mut header = vec!["Sequence".to_string()];
    header.extend(matrix.names().iter().cloned());
    table.write_record(&header).map_err(csv_error)?;

    for (name, row) in matrix.names().iter().zip(matrix.rows()) {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(name.clone());
        record.extend(row.iter().map(|&d| format_distance(d)));
        table.write_record(&record).map_err(csv_error)?;
    }
    table.flush()?;
    Ok(())
}

/// Relaxed PHYLIP lower triangle: names are padded to 10 columns but never cut,
/// and always followed by whitespace. Provenance goes after the matrix.
/// NEXUS DISTANCES block, lower triangle without diagonal
pub fn render_nexus<W: Write>(writer: &mut W, matrix: &DistanceMatrix, command_line: &str) -> Result<()> {
    writeln!(writer, "#NEXUS")?;
    writeln!(writer, "[Command: {}]", command_line)?;
    writeln!(writer, "[Generated: {}]", timestamp())?;
    writeln!(writer, "[seqphylo v{}]", env!("CARGO_PKG_VERSION"))?;
    writeln!(writer, "BEGIN DISTANCES;")?;
    writeln!(writer, "    DIMENSIONS NTAX={};", matrix.len())?;
    writeln!(writer, "    FORMAT LABELS LOWER NODIAGONAL;")?;
    writeln!(writer, "    MATRIX")?;

    for (i, name) in matrix.names().iter().enumerate() {
        write!(writer, "        {}", name)?;
        for j in 0..i {
            write!(writer, " {}", format_distance(matrix.get(i, j)))?;
        }
        writeln!(writer)?;
    }

    writeln!(writer, "    ;")?;
    writeln!(writer, "END;")?;
    Ok(())
}

/// Write distance matrix in the specified format
pub fn write_matrix(file_path: &Path, format: &str, matrix: &DistanceMatrix, command_line: &str) -> Result<()> {
    let format = format.to_lowercase();
    if !MATRIX_FORMATS.contains(&format.as_str()) {
        return Err(PhyloError::Config(format!(
            "Unsupported output format: {}. Use: {}",
            format,
            MATRIX_FORMATS.join(", ")
        )));
    }

    let mut writer = create_output(file_path)?;
    match format.as_str() {
        "tsv" => render_delimited(&mut writer, matrix, b'\t', command_line)?,
        "csv" => render_delimited(&mut writer, matrix, b',', command_line)?,
        "phylip" => render_phylip(&mut writer, matrix, command_line)?,
        _ => render_nexus(&mut writer, matrix, command_line)?,
    }
    writer.flush()?;
    info!(path = %file_path.display(), format = %format, "distance matrix written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> DistanceMatrix {
        DistanceMatrix::new(
            vec!["S1".to_string(), "S2".to_string(), "S3".to_string()],
            vec![vec![0.0, 0.25, 1.0], vec![0.25, 0.0, 0.875], vec![1.0, 0.875, 0.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_tsv_layout() {
        let mut buffer = Vec::new();
        render_delimited(&mut buffer, &matrix(), b'\t', "seqphylo --input x.fasta").unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "# Command: seqphylo --input x.fasta");
        assert_eq!(lines[3], "Sequence\tS1\tS2\tS3");
        assert_eq!(lines[4], "S1\t0.000000\t0.250000\t1.000000");
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn test_csv_quotes_names_with_separators() {
        let dm = DistanceMatrix::new(
            vec!["a,1".to_string(), "b".to_string()],
            vec![vec![0.0, 0.5], vec![0.5, 0.0]],
        )
        .unwrap();
        let mut buffer = Vec::new();
        render_delimited(&mut buffer, &dm, b',', "cmd").unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[3], "Sequence,\"a,1\",b");
        assert_eq!(lines[4], "\"a,1\",0.000000,0.500000");
    }

    #[test]
    fn test_phylip_keeps_long_names_separated() {
        let dm = DistanceMatrix::new(
            vec!["sequence_0001".to_string(), "s2".to_string()],
            vec![vec![0.0, 0.5], vec![0.5, 0.0]],
        )
        .unwrap();
        let mut buffer = Vec::new();
        render_phylip(&mut buffer, &dm, "cmd").unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().nth(1).unwrap(), "sequence_0001  0.000000");
    }

    #[test]
    fn test_phylip_lower_triangle() {
        let mut buffer = Vec::new();
        render_phylip(&mut buffer, &matrix(), "cmd").unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "    3");
        assert_eq!(lines[2], "S2          0.250000  0.000000");
    }

    #[test]
    fn test_nexus_block() {
        let mut buffer = Vec::new();
        render_nexus(&mut buffer, &matrix(), "cmd").unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("#NEXUS"));
        assert!(text.contains("DIMENSIONS NTAX=3;"));
        assert!(text.contains("        S3 1.000000 0.875000"));
        assert!(text.trim_end().ends_with("END;"));
    }

    #[test]
    fn test_write_matrix_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.csv");
        write_matrix(&path, "CSV", &matrix(), "cmd").unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Sequence,S1,S2,S3"));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xyz");
        assert!(matches!(write_matrix(&path, "xml", &matrix(), "cmd"), Err(PhyloError::Config(_))));
        assert!(!path.exists());
    }
}
