use rasciigraph::{plot, Config};

const CHART_HEIGHT: u32 = 10;
const CHART_CAPTION: &str = "values in order of appearance";

/// ASCII line chart of a reply's numeric tokens against their position
/// index.
pub fn render(series: &[f64]) -> String {
    plot(
        series.to_vec(),
        Config::default()
            .with_height(CHART_HEIGHT)
            .with_caption(CHART_CAPTION.to_string()),
    )
}
