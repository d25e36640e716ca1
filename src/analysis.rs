use crate::cluster::{ClusterAssignment, KMeans};
use crate::config::AnalysisConfig;
use crate::dataset::FeatureTable;
use crate::decomposition::{ExplainedVariance, PCA};
use crate::error::{Error, Result};
use crate::metrics::pairwise_distances;
use crate::preprocessing::StandardScaler;
use crate::Matrix;

/// Runs standardization, PCA, component selection and k-means over a
/// feature table, keeping every intermediate result.
#[derive(Clone, Debug)]
pub struct Analysis {
    config: AnalysisConfig,
}

/// Everything an [`Analysis`] run produced. Row order matches the input table.
#[derive(Clone, Debug)]
pub struct AnalysisReport {
    pub columns: Vec<String>,
    pub scaler: StandardScaler,
    pub standardized: Matrix,
    pub pca: PCA,
    pub variance: ExplainedVariance,
    pub retained_components: usize,
    pub kmeans: KMeans,
    pub assignment: ClusterAssignment,
}

impl Analysis {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn run(&self, table: &FeatureTable) -> Result<AnalysisReport> {
        let config = &self.config;
        log::info!(
            "Analysing {} rows x {} columns",
            table.n_rows(),
            table.n_columns()
        );

        let mut scaler = StandardScaler::new()
            .zero_variance_tol(config.zero_variance_tol)
            .column_names(table.columns());
        let standardized = scaler.fit_transform(table.values())?;

        let mut pca = PCA::new()
            .max_sweeps(config.pca.max_sweeps)
            .tolerance(config.pca.tolerance)
            .orthogonality_tol(config.pca.orthogonality_tol);
        pca.fit(&standardized)?;
        let variance = pca.variance()?;

        let retained_components = self.retained_components(&variance)?;
        log::info!(
            "Retaining {} of {} components ({:.1}% of variance)",
            retained_components,
            variance.len(),
            100.0 * variance.cumulative()[retained_components - 1]
        );

        let reduced = pca.truncated(retained_components)?;
        let mut kmeans = KMeans::new(config.clusters)
            .seed(config.seed)
            .max_iter(config.kmeans.max_iter)
            .empty_cluster(config.kmeans.empty_cluster);
        let labels = kmeans.fit_predict(&reduced)?;

        let assignment = ClusterAssignment::new(table.row_keys().to_vec(), labels, config.clusters)?;
        log::info!("Cluster sizes: {:?}", assignment.cluster_sizes());

        Ok(AnalysisReport {
            columns: table.columns().to_vec(),
            scaler,
            standardized,
            pca,
            variance,
            retained_components,
            kmeans,
            assignment,
        })
    }

    fn retained_components(&self, variance: &ExplainedVariance) -> Result<usize> {
        let available = variance.len();

        match (self.config.components, self.config.variance_threshold) {
            (Some(k), _) if k > available => Err(Error::InvalidParameter(format!(
                "{k} components requested but the table has only {available} columns"
            ))),
            (Some(k), _) => Ok(k),
            (None, Some(threshold)) => variance.components_for_threshold(threshold),
            (None, None) => Err(Error::InvalidParameter(
                "no component count or variance threshold configured".to_string(),
            )),
        }
    }
}

impl AnalysisReport {
    /// Projected coordinates on the retained components.
    pub fn reduced(&self) -> Result<Matrix> {
        self.pca.truncated(self.retained_components)
    }

    /// Euclidean distances between the fitted cluster centroids, `K × K`.
    pub fn centroid_distances(&self) -> Result<Matrix> {
        let centroids = self.kmeans.centroids().ok_or(Error::NotFitted("KMeans"))?;
        Ok(pairwise_distances(centroids))
    }

    /// The `n` columns with the largest absolute weight on `component`,
    /// strongest first.
    pub fn top_loadings(&self, component: usize, n: usize) -> Result<Vec<(&str, f64)>> {
        let loadings = self.pca.loadings(component).ok_or_else(|| {
            Error::InvalidParameter(format!(
                "component {component} does not exist ({} components)",
                self.columns.len()
            ))
        })?;

        let mut weighted: Vec<(&str, f64)> = self
            .columns
            .iter()
            .map(String::as_str)
            .zip(loadings.iter().copied())
            .collect();
        weighted.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        weighted.truncate(n);
        Ok(weighted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Axis};

    fn nutrient_table() -> FeatureTable {
        let keys = ["spinach", "kale", "broccoli", "beef", "pork", "chicken"];
        let columns = ["protein", "fat", "fiber", "vitamin_c"];
        let values = array![
            [2.9, 0.4, 2.2, 28.1],
            [4.3, 0.9, 3.6, 120.0],
            [2.8, 0.4, 2.6, 89.2],
            [26.1, 15.0, 0.0, 0.0],
            [27.3, 14.0, 0.0, 0.6],
            [31.0, 3.6, 0.0, 0.0]
        ];

        FeatureTable::new(
            keys.iter().map(|s| s.to_string()).collect(),
            columns.iter().map(|s| s.to_string()).collect(),
            values,
        )
        .unwrap()
    }

    #[test]
    fn test_pipeline_separates_vegetables_from_meat() {
        let analysis = Analysis::new(AnalysisConfig::with_components(2, 2).seed(5)).unwrap();
        let report = analysis.run(&nutrient_table()).unwrap();

        let a = &report.assignment;
        assert_eq!(a.len(), 6);
        assert_eq!(a.label_of("spinach"), a.label_of("kale"));
        assert_eq!(a.label_of("spinach"), a.label_of("broccoli"));
        assert_eq!(a.label_of("beef"), a.label_of("chicken"));
        assert_ne!(a.label_of("kale"), a.label_of("pork"));
        assert_eq!(report.reduced().unwrap().shape(), &[6, 2]);
    }

    #[test]
    fn test_standardized_matrix_in_report() {
        let report = Analysis::new(AnalysisConfig::with_components(1, 2))
            .unwrap()
            .run(&nutrient_table())
            .unwrap();

        for column in report.standardized.axis_iter(Axis(1)) {
            assert_abs_diff_eq!(column.mean().unwrap(), 0.0, epsilon = 1e-9);
            assert_abs_diff_eq!(column.std(1.0), 1.0, epsilon = 1e-9);
        }
        assert_eq!(report.retained_components, 1);
    }

    #[test]
    fn test_variance_threshold_selects_components() {
        let config = AnalysisConfig::with_variance_threshold(0.999_999, 2);
        let report = Analysis::new(config).unwrap().run(&nutrient_table()).unwrap();

        let expected = report.variance.components_for_threshold(0.999_999).unwrap();
        assert_eq!(report.retained_components, expected);
        assert!(report.variance.cumulative()[expected - 1] >= 0.999_999);
    }

    #[test]
    fn test_top_loadings() {
        let report = Analysis::new(AnalysisConfig::with_components(2, 2))
            .unwrap()
            .run(&nutrient_table())
            .unwrap();

        let top = report.top_loadings(0, 2).unwrap();
        assert_eq!(top.len(), 2);
        assert!(top[0].1.abs() >= top[1].1.abs());
        assert!(report.top_loadings(4, 2).is_err());
    }

    #[test]
    fn test_centroid_distances() {
        let report = Analysis::new(AnalysisConfig::with_components(2, 2).seed(5))
            .unwrap()
            .run(&nutrient_table())
            .unwrap();

        let distances = report.centroid_distances().unwrap();
        assert_eq!(distances.shape(), &[2, 2]);
        assert_eq!(distances[[0, 0]], 0.0);
        assert_eq!(distances[[0, 1]], distances[[1, 0]]);
        assert!(distances[[0, 1]] > 1.0);
    }

    #[test]
    fn test_runs_are_bit_identical() {
        let analysis = Analysis::new(AnalysisConfig::with_components(3, 3).seed(17)).unwrap();
        let table = nutrient_table();

        let first = analysis.run(&table).unwrap();
        let second = analysis.run(&table).unwrap();

        assert_eq!(first.pca.projected(), second.pca.projected());
        assert_eq!(first.assignment, second.assignment);
        assert_eq!(first.kmeans.centroids(), second.kmeans.centroids());
    }

    #[test]
    fn test_degenerate_column_is_named() {
        let table = FeatureTable::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec!["protein".into(), "water".into()],
            array![[1.0, 9.0], [2.0, 9.0], [4.0, 9.0]],
        )
        .unwrap();

        let result = Analysis::new(AnalysisConfig::with_components(1, 2))
            .unwrap()
            .run(&table);
        match result {
            Err(Error::DegenerateColumn { column, .. }) => assert_eq!(column, "water"),
            other => panic!("expected DegenerateColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_more_clusters_than_rows() {
        let table = FeatureTable::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec!["protein".into(), "fat".into()],
            array![[1.0, 9.0], [2.0, 4.0], [4.0, 7.0]],
        )
        .unwrap();

        let result = Analysis::new(AnalysisConfig::with_components(2, 5))
            .unwrap()
            .run(&table);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_too_many_components() {
        let result = Analysis::new(AnalysisConfig::with_components(5, 2))
            .unwrap()
            .run(&nutrient_table());
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }
}
