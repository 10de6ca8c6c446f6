//! File-system report sink.
//!
//! Writes the model comparison table as CSV at the report root and every
//! chart's underlying data as JSON under `graphs/`, one file per chart.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::{ConfusionMatrix, RocCurve};
use crate::ports::{CandidateScore, ExplorationReport, LearningCurve, ReportError, Reporter};

pub const COMPARISON_FILE: &str = "model_comparison_results.csv";
const GRAPHS_DIR: &str = "graphs";
const COMPARISON_HEADER: &str = "Model,Accuracy,Precision,Recall,F1 Score";

fn slug(name: &str) -> String {
    name.replace(' ', "_")
}

#[derive(Serialize)]
struct ConfusionChart<'a> {
    model: &'a str,
    /// `[[tn, fp], [fn, tp]]`
    matrix: [[usize; 2]; 2],
}

#[derive(Serialize)]
struct RocChart<'a> {
    model: &'a str,
    #[serde(flatten)]
    curve: &'a RocCurve,
}

#[derive(Serialize)]
struct LearningChart<'a> {
    title: &'a str,
    #[serde(flatten)]
    curve: &'a LearningCurve,
}

/// Reporter writing under a root directory, created on demand.
#[derive(Debug, Clone)]
pub struct FileReporter {
    root: PathBuf,
}

impl FileReporter {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write_chart<T: Serialize>(&self, name: &str, value: &T) -> Result<(), ReportError> {
        let dir = self.root.join(GRAPHS_DIR);
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{name}.json"));
        fs::write(&path, serde_json::to_vec_pretty(value)?)?;
        tracing::debug!("Wrote chart data {:?}", path);
        Ok(())
    }
}

impl Reporter for FileReporter {
    fn record_exploration(&self, report: &ExplorationReport) -> Result<(), ReportError> {
        #[derive(Serialize)]
        struct Correlation<'a> {
            columns: &'a [String],
            matrix: &'a [Vec<f64>],
        }

        self.write_chart(
            "relation_matrix",
            &Correlation {
                columns: &report.columns,
                matrix: &report.correlation,
            },
        )?;
        self.write_chart("eda_target_distribution", &report.target_distribution)?;
        self.write_chart("eda_age_distribution", &report.age_histogram)?;
        self.write_chart("feature_target_correlation", &report.target_correlation)
    }

    fn record_confusion_matrix(
        &self,
        model: &str,
        matrix: &ConfusionMatrix,
    ) -> Result<(), ReportError> {
        self.write_chart(
            &format!("confusion_matrix_{}", slug(model)),
            &ConfusionChart {
                model,
                matrix: matrix.rows(),
            },
        )
    }

    fn record_roc_curve(&self, model: &str, curve: &RocCurve) -> Result<(), ReportError> {
        self.write_chart(
            &format!("predicted_vs_actual_roc_{}", slug(model)),
            &RocChart { model, curve },
        )
    }

    fn record_comparison(&self, rows: &[CandidateScore]) -> Result<(), ReportError> {
        fs::create_dir_all(&self.root)?;
        let mut csv = String::from(COMPARISON_HEADER);
        csv.push('\n');
        for row in rows {
            let s = &row.scores;
            csv.push_str(&format!(
                "{},{},{},{},{}\n",
                row.model, s.accuracy, s.precision, s.recall, s.f1
            ));
        }
        let path = self.root.join(COMPARISON_FILE);
        fs::write(&path, csv)?;
        tracing::info!("Model comparison written to {:?}", path);

        self.write_chart("model_comparison", &rows)
    }

    fn record_learning_curve(
        &self,
        title: &str,
        curve: &LearningCurve,
    ) -> Result<(), ReportError> {
        self.write_chart(
            &format!("learning_curve_{}", slug(title)),
            &LearningChart { title, curve },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ClassificationScores;
    use tempfile::tempdir;

    #[test]
    fn test_comparison_csv_layout() {
        let temp = tempdir().expect("tempdir");
        let reporter = FileReporter::new(temp.path().join("reports"));
        let rows = vec![CandidateScore {
            model: "Random Forest".into(),
            scores: ClassificationScores {
                accuracy: 0.9,
                precision: 0.875,
                recall: 1.0,
                f1: 0.5,
            },
        }];
        reporter.record_comparison(&rows).expect("write");

        let csv = fs::read_to_string(reporter.root().join(COMPARISON_FILE)).expect("read");
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Model,Accuracy,Precision,Recall,F1 Score"));
        assert_eq!(lines.next(), Some("Random Forest,0.9,0.875,1,0.5"));
        assert!(reporter.root().join("graphs/model_comparison.json").exists());
    }

    #[test]
    fn test_per_model_charts_use_slugged_names() {
        let temp = tempdir().expect("tempdir");
        let reporter = FileReporter::new(temp.path());
        let cm = ConfusionMatrix::from_labels(&[0, 1, 1], &[0, 1, 0]);
        reporter
            .record_confusion_matrix("Gradient Boosting", &cm)
            .expect("write");

        let path = temp.path().join("graphs/confusion_matrix_Gradient_Boosting.json");
        let json: serde_json::Value =
            serde_json::from_slice(&fs::read(path).expect("read")).expect("json");
        assert_eq!(json["matrix"], serde_json::json!([[1, 0], [1, 1]]));

        let roc = crate::domain::metrics::roc_curve(&[0.2, 0.7, 0.4], &[0, 1, 1]);
        reporter.record_roc_curve("Gradient Boosting", &roc).expect("write");
        let path = temp.path().join("graphs/predicted_vs_actual_roc_Gradient_Boosting.json");
        let json: serde_json::Value =
            serde_json::from_slice(&fs::read(path).expect("read")).expect("json");
        assert_eq!(json["auc"], serde_json::json!(1.0));
    }

    #[test]
    fn test_exploration_files() {
        let temp = tempdir().expect("tempdir");
        let reporter = FileReporter::new(temp.path());
        reporter
            .record_exploration(&ExplorationReport::default())
            .expect("write");
        for name in [
            "relation_matrix",
            "eda_target_distribution",
            "eda_age_distribution",
            "feature_target_correlation",
        ] {
            assert!(temp.path().join(GRAPHS_DIR).join(format!("{name}.json")).exists());
        }
    }

    #[test]
    fn test_unwritable_root_is_an_error() {
        let temp = tempdir().expect("tempdir");
        let blocker = temp.path().join("file");
        fs::write(&blocker, b"x").expect("write");
        let reporter = FileReporter::new(&blocker);
        assert!(reporter
            .record_learning_curve("Final Model", &LearningCurve::default())
            .is_err());
    }
}
