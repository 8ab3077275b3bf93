//! Shared pipeline: load, reshape, filter, compose, render
//!
//! One pass per process start. Every stage is a pure function of its
//! inputs; the result is an immutable [`DashboardModel`] the HTTP layer
//! serves unchanged for the lifetime of the process.

use crate::config::DashboardConfig;
use crate::figure::svg::{self, RenderOptions};
use crate::figure::Composer;
use crate::telec::boundaries::{self, OutlineSet};
use crate::telec::error::Result;
use crate::telec::grid::CorrelationGrid;
use crate::telec::loader;

/// One rendered sub-figure
#[derive(Debug, Clone)]
pub struct RenderedFigure {
    pub title: String,
    pub svg: String,
}

/// One dashboard page, fully rendered
#[derive(Debug, Clone)]
pub struct RenderedView {
    pub name: String,
    pub route: String,
    pub title: String,
    pub figures: Vec<RenderedFigure>,
}

/// Everything the HTTP layer needs, produced once at startup
#[derive(Debug, Clone)]
pub struct DashboardModel {
    pub views: Vec<RenderedView>,
}

/// Run the whole pipeline once
pub async fn build(config: &DashboardConfig) -> Result<DashboardModel> {
    println!("[1/4] Loading tables...");
    let correlation = loader::load_correlation_table(&config.correlation_path())?;
    println!(
        "  ✓ correlation: {} rows, {} value columns",
        correlation.rows.len(),
        correlation.value_columns.len()
    );
    let nonstat = loader::load_nonstationarity_table(&config.nonstationarity_path())?;
    println!("  ✓ non-stationarity: {} rows", nonstat.rows.len());

    println!("[2/4] Reshaping the correlation grid...");
    let grid = CorrelationGrid::reshape(&correlation, config.duplicate_policy)?;
    println!(
        "  ✓ grid: {} × {} cells",
        grid.rlon_axis.len(),
        grid.rlat_axis.len()
    );

    println!("[3/4] Resolving reference outlines...");
    let countries = if config.boundaries.enabled {
        let set = boundaries::resolve(
            config.boundaries.local_path.as_deref(),
            &config.boundaries.url,
        )
        .await;
        if set.is_empty() {
            println!("  outlines unavailable, maps render without them");
        } else {
            println!("  ✓ {} outline rings", set.len());
        }
        set
    } else {
        println!("  outlines disabled by configuration");
        OutlineSet::empty()
    };

    println!("[4/4] Composing figures...");
    let composer = Composer::new(
        &grid,
        &nonstat,
        &countries,
        config.pole.rotated_pole(),
        config.window,
        &config.figure,
    )?;
    let opts = RenderOptions::from(&config.figure);

    let mut views = Vec::new();
    let mut figure_id = 0usize;
    for view in &config.views {
        let composed = composer.compose_view(view)?;
        let mut figures = Vec::new();
        for figure in &composed {
            figures.push(RenderedFigure {
                title: figure.title.clone(),
                svg: svg::render_figure(figure, figure_id, &opts),
            });
            figure_id += 1;
        }
        println!("  ✓ view '{}': {} figure(s)", view.name, figures.len());

        views.push(RenderedView {
            name: view.name.clone(),
            route: view.route.clone(),
            title: view.title.clone(),
            figures,
        });
    }

    Ok(DashboardModel { views })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telec::error::TelecError;
    use std::io::Write;

    const CORR_CSV: &str = "rlon;rlat;pearson_xcorr_sig_lag0_aft\n\
                            0.0;0.0;5\n\
                            0.11;0.0;12\n\
                            0.0;0.11;1\n";

    const NONSTAT_CSV: &str =
        "rlon;rlat;lon;lat;nonstat_mk_orig;nonstat_mk_orig_BH;nonstat_mk_HR;nonstat_mk_HR_BH\n\
         0.1;0.0;-5.9;40.5;1;0;1;1\n\
         0.2;0.0;-5.8;40.5;2;1;2;0\n";

    fn config_with_fixture_data() -> (DashboardConfig, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DashboardConfig::default();
        config.data_dir = dir.path().to_path_buf();
        // no network in tests
        config.boundaries.enabled = false;

        let mut corr = std::fs::File::create(config.correlation_path()).unwrap();
        corr.write_all(CORR_CSV.as_bytes()).unwrap();
        let mut nonstat = std::fs::File::create(config.nonstationarity_path()).unwrap();
        nonstat.write_all(NONSTAT_CSV.as_bytes()).unwrap();

        (config, dir)
    }

    #[tokio::test]
    async fn pipeline_builds_the_default_views() {
        let (config, _dir) = config_with_fixture_data();
        let model = build(&config).await.unwrap();

        assert_eq!(model.views.len(), 2);
        // one active correlation panel, four test-variant panels
        assert_eq!(model.views[0].figures.len(), 1);
        assert_eq!(model.views[1].figures.len(), 4);
        assert!(model.views[0].figures[0].svg.starts_with("<svg"));
    }

    #[tokio::test]
    async fn missing_input_file_aborts_startup() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DashboardConfig::default();
        config.data_dir = dir.path().to_path_buf();
        config.boundaries.enabled = false;

        let err = build(&config).await.unwrap_err();
        assert!(matches!(err, TelecError::Io { .. }));
    }

    #[tokio::test]
    async fn unknown_configured_column_aborts_composition() {
        let (mut config, _dir) = config_with_fixture_data();
        config.views[0].panels[0].layers[1].column = Some("pearson_missing".to_string());

        let err = build(&config).await.unwrap_err();
        assert!(matches!(err, TelecError::MissingColumn { .. }));
    }
}
