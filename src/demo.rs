//! Synthetic exam and report data.
//!
//! Exam scores are uniform integers in `[60, 100)`. Each report score is the
//! exam score divided by 20 plus Gaussian noise (SD 0.2), rounded to one
//! decimal, so every subject carries a strong own-subject signal.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::WriterBuilder;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::info;

use crate::analyzers::types::{RawTable, StudentRow, TableSource};
use crate::subjects::SubjectSet;

pub const DEFAULT_STUDENTS: usize = 30;
pub const DEFAULT_SEED: u64 = 42;
const NOISE_SD: f64 = 0.2;

/// Generated exam and report tables for the same students.
#[derive(Debug, Clone)]
pub struct DemoData {
    pub exam: RawTable,
    pub report: RawTable,
}

/// Generates `students` students for every subject of `subjects`.
pub fn generate(subjects: &SubjectSet, students: usize, seed: u64) -> Result<DemoData> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, NOISE_SD)?;
    let k = subjects.len();

    let ids: Vec<String> = (1..=students).map(|i| format!("OGR{i:03}")).collect();

    let exam_scores: Vec<Vec<f64>> = ids
        .iter()
        .map(|_| (0..k).map(|_| rng.gen_range(60..100) as f64).collect())
        .collect();

    let report_scores: Vec<Vec<f64>> = exam_scores
        .iter()
        .map(|row| {
            row.iter()
                .map(|x| round1(x / 20.0 + noise.sample(&mut rng)))
                .collect()
        })
        .collect();

    let build = |source, scores: &[Vec<f64>]| {
        let rows = ids
            .iter()
            .zip(scores)
            .map(|(id, s)| StudentRow::complete(id.clone(), s))
            .collect();
        RawTable::new(source, subjects, rows)
    };

    Ok(DemoData {
        exam: build(TableSource::Exam, &exam_scores)?,
        report: build(TableSource::Report, &report_scores)?,
    })
}

/// Writes the demo tables as `exam_demo.csv` and `report_demo.csv` under `dir`.
///
/// Both use `;` as delimiter; the report file uses comma decimals.
pub fn write_demo_files(
    data: &DemoData,
    subjects: &SubjectSet,
    dir: impl AsRef<Path>,
) -> Result<(PathBuf, PathBuf)> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let exam_path = dir.join("exam_demo.csv");
    let report_path = dir.join("report_demo.csv");

    write_table(&data.exam, subjects, &exam_path, |v| format!("{v}"))?;
    write_table(&data.report, subjects, &report_path, |v| {
        format!("{v:.1}").replace('.', ",")
    })?;

    info!(dir = %dir.display(), "Demo data written");
    Ok((exam_path, report_path))
}

fn write_table(
    table: &RawTable,
    subjects: &SubjectSet,
    path: &Path,
    format: impl Fn(f64) -> String,
) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = WriterBuilder::new().delimiter(b';').from_writer(file);

    let mut header = vec![subjects.id_column().to_string()];
    header.extend(subjects.iter().map(|s| match table.source() {
        TableSource::Exam => s.exam_column.clone(),
        TableSource::Report => s.report_column.clone(),
    }));
    writer.write_record(&header)?;

    for row in table.rows() {
        let mut record = vec![row.id.clone()];
        record.extend(row.scores.iter().map(|v| v.map(&format).unwrap_or_default()));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::read_table;

    #[test]
    fn test_generate_shape() {
        let subjects = SubjectSet::default();
        let data = generate(&subjects, 30, DEFAULT_SEED).unwrap();

        assert_eq!(data.exam.len(), 30);
        assert_eq!(data.report.len(), 30);
        assert_eq!(data.exam.rows()[0].id, "OGR001");
        assert_eq!(data.report.rows()[29].id, "OGR030");

        for row in data.exam.rows() {
            for v in row.scores.iter().flatten() {
                assert!((60.0..100.0).contains(v));
                assert_eq!(v.fract(), 0.0);
            }
        }
    }

    #[test]
    fn test_report_tracks_exam() {
        let subjects = SubjectSet::default();
        let data = generate(&subjects, 30, 7).unwrap();

        for (e, r) in data.exam.rows().iter().zip(data.report.rows()) {
            for (x, y) in e.scores.iter().flatten().zip(r.scores.iter().flatten()) {
                // 6 SD of noise plus rounding
                assert!((y - x / 20.0).abs() < 1.3);
            }
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let subjects = SubjectSet::default();
        let a = generate(&subjects, 10, 3).unwrap();
        let b = generate(&subjects, 10, 3).unwrap();
        assert_eq!(a.report.rows(), b.report.rows());
    }

    #[test]
    fn test_written_files_load_back() {
        let subjects = SubjectSet::default();
        let data = generate(&subjects, 5, 11).unwrap();
        let dir = std::env::temp_dir().join("exam_report_rater_demo_test");
        let (exam_path, report_path) = write_demo_files(&data, &subjects, &dir).unwrap();

        let report_text = fs::read_to_string(&report_path).unwrap();
        assert!(report_text.starts_with("RUMUZ;TURKCE;MAT;FEN;SOSYAL;DIN"));
        assert!(report_text.contains(','));

        let exam = read_table(
            File::open(&exam_path).unwrap(),
            TableSource::Exam,
            &subjects,
            b';',
        )
        .unwrap();
        assert_eq!(exam.rows(), data.exam.rows());

        let report = read_table(
            File::open(&report_path).unwrap(),
            TableSource::Report,
            &subjects,
            b';',
        )
        .unwrap();
        assert_eq!(report.rows(), data.report.rows());

        fs::remove_dir_all(&dir).unwrap();
    }
}
