use eigencluster::{Analysis, AnalysisConfig, FeatureTable, Matrix};
use ndarray::array;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Nutrient PCA and clustering ===\n");

    let items = [
        "spinach", "kale", "broccoli", "lentils", "chickpeas", "almonds", "walnuts", "beef",
        "chicken", "salmon", "cheddar", "milk", "apple", "banana", "white rice", "oats",
    ];
    let columns = ["energy_kcal", "protein_g", "fat_g", "carbs_g", "fiber_g", "sugar_g", "sodium_mg"];
    // Per 100 g.
    let values: Matrix = array![
        [23.0, 2.9, 0.4, 3.6, 2.2, 0.4, 79.0],
        [49.0, 4.3, 0.9, 8.8, 3.6, 2.3, 38.0],
        [34.0, 2.8, 0.4, 6.6, 2.6, 1.7, 33.0],
        [116.0, 9.0, 0.4, 20.1, 7.9, 1.8, 2.0],
        [164.0, 8.9, 2.6, 27.4, 7.6, 4.8, 7.0],
        [579.0, 21.2, 49.9, 21.6, 12.5, 4.4, 1.0],
        [654.0, 15.2, 65.2, 13.7, 6.7, 2.6, 2.0],
        [250.0, 26.1, 15.0, 0.0, 0.0, 0.0, 72.0],
        [165.0, 31.0, 3.6, 0.0, 0.0, 0.0, 74.0],
        [208.0, 20.4, 13.4, 0.0, 0.0, 0.0, 59.0],
        [403.0, 24.9, 33.1, 1.3, 0.0, 0.5, 621.0],
        [61.0, 3.2, 3.3, 4.8, 0.0, 5.1, 43.0],
        [52.0, 0.3, 0.2, 13.8, 2.4, 10.4, 1.0],
        [89.0, 1.1, 0.3, 22.8, 2.6, 12.2, 1.0],
        [130.0, 2.7, 0.3, 28.2, 0.4, 0.1, 1.0],
        [389.0, 16.9, 6.9, 66.3, 10.6, 0.0, 2.0]
    ];

    let table = FeatureTable::new(
        items.iter().map(|s| s.to_string()).collect(),
        columns.iter().map(|s| s.to_string()).collect(),
        values,
    )?;
    println!("Table: {} items x {} nutrients\n", table.n_rows(), table.n_columns());

    let config = AnalysisConfig::with_variance_threshold(0.85, 4).seed(42);
    let report = Analysis::new(config)?.run(&table)?;

    println!("{:<6} {:>12} {:>12} {:>12}", "PC", "eigenvalue", "ratio", "cumulative");
    println!("{}", "-".repeat(45));
    let eigenvalues = report.pca.explained_variance().ok_or("PCA not fitted")?;
    for (i, ((value, ratio), cumulative)) in eigenvalues
        .iter()
        .zip(report.variance.ratio())
        .zip(report.variance.cumulative())
        .enumerate()
    {
        println!("{:<6} {:>12.4} {:>12.4} {:>12.4}", format!("PC{}", i + 1), value, ratio, cumulative);
    }
    println!(
        "\nRetained {} components for >= 85% of the variance",
        report.retained_components
    );

    for component in 0..report.retained_components {
        let top = report.top_loadings(component, 3)?;
        let described: Vec<String> = top.iter().map(|(name, w)| format!("{name} ({w:+.2})")).collect();
        println!("PC{} driven by: {}", component + 1, described.join(", "));
    }

    println!("\n=== Clusters ===");
    for label in 0..report.assignment.n_clusters() {
        println!("Cluster {}: {}", label, report.assignment.members(label).join(", "));
    }
    let distances = report.centroid_distances()?;
    println!("\nCentroid distances:\n{distances:.3}");
    if let Some(inertia) = report.kmeans.inertia() {
        println!("\nInertia: {inertia:.4}");
    }

    Ok(())
}
