//! HTTP presentation layer
//!
//! Pages are rendered once from the immutable [`DashboardModel`] and served
//! read-only; a request never touches the data pipeline. One route per
//! configured view, plus `/health`.

use crate::config::DashboardConfig;
use crate::pipeline::DashboardModel;
use crate::telec::error::{Result, TelecError};
use axum::{extract::Extension, response::Html, routing::get, Router};
use std::sync::Arc;
use tracing::info;

const ABOUT_TEXT: &str = "Teleconnection patterns and non-stationarity diagnostics for annual \
maximum precipitation over Spain, precomputed offline and rendered here from the published \
result tables.";

const CORRELATION_NOTES: &str = "Cells show which of the four large-scale climate indices \
(NAO, EA, EAWR, SCA) have a statistically significant Pearson cross-correlation with local \
annual maximum precipitation. The code is a bitmask: 1 = NAO, 2 = EA, 4 = EAWR, 8 = SCA; \
combinations add up, so e.g. 5 means NAO and EAWR together. Cells without a significant \
correlation are left blank. Hover a cell to inspect its attributes.";

const NONSTAT_NOTES: &str = "Points mark series where a Mann-Kendall style test reported a \
non-stationarity signal: 1 = change point, 2 = trend, 3 = both. The four panels show the \
original test, the Hamed-Rao variance-corrected variant, and each with the \
Benjamini-Hochberg false-discovery correction. Locations with no signal draw no point.";

const PROVENANCE: &str = "Country outlines: Natural Earth, 1:50m cultural vectors (public \
domain). Statistics: precomputed teleconnection and non-stationarity tables on the rotated \
0.11\u{00b0} grid.";

/// Build the router over a fully rendered model
pub fn router(model: Arc<DashboardModel>) -> Router {
    let mut router = Router::new().route("/health", get(health));

    for index in 0..model.views.len() {
        let route = model.views[index].route.clone();
        router = router.route(
            &route,
            get(move |Extension(model): Extension<Arc<DashboardModel>>| async move {
                Html(view_page(&model, index))
            }),
        );
    }

    router.layer(Extension(model))
}

/// Bind and serve until the process is stopped
pub async fn serve(config: &DashboardConfig, model: DashboardModel) -> Result<()> {
    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TelecError::Other(format!("bind {addr}: {e}")))?;

    println!("✓ Dashboard listening on http://{addr}/");
    info!(%addr, "dashboard up");

    axum::serve(listener, router(Arc::new(model)))
        .await
        .map_err(|e| TelecError::Other(format!("serve: {e}")))
}

async fn health() -> &'static str {
    "ok"
}

/// Render one view as a complete HTML page
fn view_page(model: &DashboardModel, index: usize) -> String {
    let view = &model.views[index];

    let nav = model
        .views
        .iter()
        .map(|v| {
            let class = if v.route == view.route { " class=\"active\"" } else { "" };
            format!("<a href=\"{}\"{class}>{}</a>", v.route, escape(&v.title))
        })
        .collect::<Vec<_>>()
        .join("\n      ");

    let figures = if view.figures.is_empty() {
        "<p class=\"empty\">No layers enabled for this view.</p>".to_string()
    } else {
        view.figures
            .iter()
            .map(|figure| format!("<section class=\"panel\">{}</section>", figure.svg))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let notes = match view.name.as_str() {
        "nonstationarity" => NONSTAT_NOTES,
        _ => CORRELATION_NOTES,
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <style>
    body {{ margin: 0; font-family: sans-serif; color: #222; display: flex; }}
    aside {{ width: 220px; min-height: 100vh; background: #f0f2f6; padding: 18px; }}
    aside h2 {{ font-size: 15px; margin-top: 0; }}
    aside p, footer p {{ font-size: 12px; line-height: 1.5; color: #444; }}
    nav a {{ display: block; font-size: 13px; margin: 4px 0; color: #0a58a3; text-decoration: none; }}
    nav a.active {{ font-weight: bold; }}
    main {{ padding: 18px 28px; flex: 1; }}
    h1 {{ color: #0a58a3; font-size: 22px; }}
    .figures {{ display: grid; grid-template-columns: repeat(2, minmax(0, 1fr)); gap: 18px; }}
    .panel {{ overflow-x: auto; }}
    .empty {{ color: #777; }}
    footer {{ border-top: 1px solid #ddd; margin-top: 24px; }}
  </style>
</head>
<body>
  <aside>
    <h2>About</h2>
    <p>{about}</p>
    <nav>
      {nav}
    </nav>
  </aside>
  <main>
    <h1>{title}</h1>
    <div class="figures">
{figures}
    </div>
    <footer>
      <p>{notes}</p>
      <p>{provenance}</p>
    </footer>
  </main>
</body>
</html>
"#,
        title = escape(&view.title),
        about = ABOUT_TEXT,
        nav = nav,
        figures = figures,
        notes = notes,
        provenance = PROVENANCE,
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{RenderedFigure, RenderedView};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn model() -> DashboardModel {
        DashboardModel {
            views: vec![
                RenderedView {
                    name: "correlations".to_string(),
                    route: "/".to_string(),
                    title: "Significant correlations".to_string(),
                    figures: vec![RenderedFigure {
                        title: "Lag-0".to_string(),
                        svg: "<svg data-figure=\"lag0\"></svg>".to_string(),
                    }],
                },
                RenderedView {
                    name: "nonstationarity".to_string(),
                    route: "/nonstationarity".to_string(),
                    title: "Non-stationarity tests".to_string(),
                    figures: vec![],
                },
            ],
        }
    }

    #[test]
    fn pages_embed_the_figures_and_cross_link() {
        let model = model();
        let page = view_page(&model, 0);
        assert!(page.contains("data-figure=\"lag0\""));
        assert!(page.contains("href=\"/nonstationarity\""));
        assert!(page.contains("class=\"figures\""));

        // a view with nothing enabled still renders a page
        let empty = view_page(&model, 1);
        assert!(empty.contains("No layers enabled"));
    }

    #[tokio::test]
    async fn routes_respond_with_ok() {
        let app = router(Arc::new(model()));

        for uri in ["/", "/nonstationarity", "/health"] {
            let response = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let app = router(Arc::new(model()));
        let response = app
            .oneshot(Request::get("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
