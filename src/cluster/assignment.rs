use crate::error::{Error, Result};
use std::collections::HashMap;

/// Cluster labels keyed by row identity, in the original row order.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterAssignment {
    keys: Vec<String>,
    labels: Vec<usize>,
    n_clusters: usize,
    index: HashMap<String, usize>,
}

impl ClusterAssignment {
    pub fn new(keys: Vec<String>, labels: Vec<usize>, n_clusters: usize) -> Result<Self> {
        if keys.len() != labels.len() {
            return Err(Error::InvalidParameter(format!(
                "{} row keys supplied for {} labels",
                keys.len(),
                labels.len()
            )));
        }
        if let Some(&bad) = labels.iter().find(|&&l| l >= n_clusters) {
            return Err(Error::InvalidParameter(format!(
                "label {bad} is outside [0, {n_clusters})"
            )));
        }

        let mut index = HashMap::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            if index.insert(key.clone(), i).is_some() {
                return Err(Error::InvalidParameter(format!("duplicate row key '{key}'")));
            }
        }

        Ok(Self { keys, labels, n_clusters, index })
    }

    pub fn label_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).map(|&i| self.labels[i])
    }

    /// Keys carrying `label`, in row order.
    pub fn members(&self, label: usize) -> Vec<&str> {
        self.iter()
            .filter(|&(_, l)| l == label)
            .map(|(key, _)| key)
            .collect()
    }

    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.keys.iter().map(String::as_str).zip(self.labels.iter().copied())
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
