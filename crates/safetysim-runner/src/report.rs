//! Renders finished simulation results: JSON dumps, a Markdown summary and PNG charts.

use std::fs;
use std::panic::UnwindSafe;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use safetysim_core::AppInfo;
use safetysim_core::belief::{BeliefRun, Observation};
use safetysim_core::scaling::ScalingRun;
use serde::Serialize;
use thiserror::Error;

const PURPLE: RGBColor = RGBColor(128, 0, 128);
const DARK_GREEN: RGBColor = RGBColor(0, 128, 0);
const CHART_SIZE: (u32, u32) = (1000, 600);

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode results: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to render plot: {0}")]
    Plot(String),
}

fn plot_error(err: impl std::fmt::Display) -> ReportError {
    ReportError::Plot(err.to_string())
}

#[derive(Serialize)]
struct ResultEnvelope<'a, T> {
    run_id: &'a str,
    seed: u64,
    version: &'static str,
    result: &'a T,
}

/// Writes `result` as pretty JSON tagged with the run identity.
pub fn write_json<T: Serialize>(
    path: impl AsRef<Path>,
    run_id: &str,
    seed: u64,
    result: &T,
) -> Result<(), ReportError> {
    let envelope = ResultEnvelope {
        run_id,
        seed,
        version: AppInfo::version(),
        result,
    };
    let mut body = serde_json::to_string_pretty(&envelope)?;
    body.push('\n');
    fs::write(path.as_ref(), body).map_err(|source| ReportError::Io {
        context: "writing results JSON",
        source,
    })
}

/// Markdown digest of whichever pipelines ran.
pub fn write_markdown(
    path: impl AsRef<Path>,
    run_id: &str,
    seed: u64,
    belief: Option<&BeliefRun>,
    scaling: Option<&ScalingRun>,
) -> Result<(), ReportError> {
    let mut rows = String::new();
    rows.push_str("# Simulation Summary\n\n");
    rows.push_str(&format!("Run `{run_id}` (seed {seed})\n\n"));

    if let Some(run) = belief {
        let trace = &run.trace;
        rows.push_str("## Bayesian detection\n\n");
        rows.push_str("| Metric | Value |\n");
        rows.push_str("|--------|-------|\n");
        rows.push_str(&format!("| True hypothesis | {} |\n", run.true_hypothesis));
        rows.push_str(&format!("| Steps | {} |\n", trace.steps()));
        rows.push_str(&format!(
            "| Suspicious observations | {} |\n",
            trace.suspicious_count()
        ));
        rows.push_str(&format!("| Prior | {:.3} |\n", trace.prior()));
        rows.push_str(&format!("| Shutdown threshold | {:.3} |\n", run.threshold));
        rows.push_str(&format!(
            "| Likelihood ratio (suspicious / normal) | {:.2} / {:.3} |\n",
            run.likelihood.likelihood_ratio(Observation::Suspicious),
            run.likelihood.likelihood_ratio(Observation::Normal)
        ));
        let detection = match run.detection {
            Some(step) => format!("step {step}"),
            None => "no detection within horizon".to_string(),
        };
        rows.push_str(&format!("| Detection | {detection} |\n"));
        rows.push_str(&format!("| Final belief | {:.6} |\n\n", trace.final_belief()));
    }

    if let Some(run) = scaling {
        let regulated = &run.regulated;
        let idx = regulated.cap_index;
        let last = run.grid.len() - 1;
        let spread = run.aggregate.spread();
        rows.push_str("## Compute cap\n\n");
        rows.push_str("| Metric | Value |\n");
        rows.push_str("|--------|-------|\n");
        rows.push_str(&format!(
            "| Monte Carlo samples | {} |\n",
            run.alphas.samples
        ));
        rows.push_str(&format!(
            "| Alpha mean [min, max] | {:.5} [{:.5}, {:.5}] |\n",
            run.alphas.mean, run.alphas.min, run.alphas.max
        ));
        rows.push_str(&format!(
            "| Band | p{} – p{} |\n",
            run.aggregate.band.lower, run.aggregate.band.upper
        ));
        rows.push_str(&format!("| Compute cap | {:.2e} FLOPS |\n", regulated.cap));
        rows.push_str(&format!(
            "| Cap index | {idx} ({:.3e} FLOPS) |\n",
            run.grid.values()[idx]
        ));
        rows.push_str(&format!(
            "| Loss at cap | {:.4} |\n",
            regulated.frozen_loss()
        ));
        rows.push_str(&format!(
            "| Uncapped median loss at {:.0e} FLOPS | {:.4} [{:.4}, {:.4}] |\n",
            run.grid.max(),
            run.aggregate.median[last],
            run.aggregate.lower[last],
            run.aggregate.upper[last]
        ));
        rows.push_str(&format!(
            "| Band width at cap / max | {:.4} / {:.4} |\n",
            spread[idx], spread[last]
        ));
        rows.push_str(&format!(
            "| Capability overhang | {:.4} |\n\n",
            regulated.overhang()
        ));
    }

    fs::write(path.as_ref(), rows).map_err(|source| ReportError::Io {
        context: "writing summary markdown",
        source,
    })
}

/// Runs a plotters closure with the panic hook silenced.
///
/// plotters panics instead of erroring when no font backend is compiled in.
fn render_guarded<F>(render: F) -> Result<PathBuf, ReportError>
where
    F: FnOnce() -> Result<PathBuf, ReportError> + UnwindSafe,
{
    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(|_| {}));
    let attempt = std::panic::catch_unwind(render);
    std::panic::set_hook(prev_hook);

    match attempt {
        Ok(result) => result,
        Err(_) => Err(ReportError::Plot(
            "plotters panicked while rendering (missing font support?)".into(),
        )),
    }
}

fn ensure_dir(dir: &Path) -> Result<(), ReportError> {
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir).map_err(|source| ReportError::Io {
            context: "creating plots directory",
            source,
        })?;
    }
    Ok(())
}

/// Belief trajectory with the shutdown threshold and the detection point.
pub fn render_belief_plot(run: &BeliefRun, dir: impl AsRef<Path>) -> Result<PathBuf, ReportError> {
    let dir = dir.as_ref();
    ensure_dir(dir)?;

    let output_path = dir.join("belief.png");
    let beliefs = run.trace.beliefs().to_vec();
    let threshold = run.threshold;
    let detection = run.detection;

    render_guarded(move || {
        let root = BitMapBackend::new(&output_path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;

        let x_max = beliefs.len().saturating_sub(1).max(1) as f64;
        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .caption(
                "Bayesian detection of misaligned AI agents",
                ("sans-serif", 22),
            )
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 50)
            .build_cartesian_2d(0f64..x_max, 0f64..1.1f64)
            .map_err(plot_error)?;

        chart
            .configure_mesh()
            .x_desc("Training steps (observations)")
            .y_desc("Probability of misalignment (belief)")
            .draw()
            .map_err(plot_error)?;

        let points: Vec<(f64, f64)> = beliefs
            .iter()
            .enumerate()
            .map(|(step, belief)| (step as f64, *belief))
            .collect();
        chart
            .draw_series(std::iter::once(PathElement::new(
                points,
                PURPLE.stroke_width(3),
            )))
            .map_err(plot_error)?
            .label("P(agent is hacking)")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &PURPLE));

        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(0.0, threshold), (x_max, threshold)],
                RED.stroke_width(2),
            )))
            .map_err(plot_error)?
            .label(format!("Safety shutdown threshold ({:.0}%)", threshold * 100.0))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

        if let Some(step) = detection {
            let marker = (step as f64, beliefs[step]);
            chart
                .draw_series(std::iter::once(
                    EmptyElement::at(marker)
                        + Circle::new((0, 0), 6, BLACK.filled())
                        + Text::new(
                            format!("Misalignment detected (step {step})"),
                            (12, 18),
                            ("sans-serif", 16).into_font(),
                        ),
                ))
                .map_err(plot_error)?;
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(plot_error)?;

        drop(chart);
        root.present().map_err(plot_error)?;
        drop(root);

        Ok(output_path)
    })
}

/// Median, percentile band, regulated curve and cap line on a log compute axis.
pub fn render_scaling_plot(
    run: &ScalingRun,
    dir: impl AsRef<Path>,
) -> Result<PathBuf, ReportError> {
    let dir = dir.as_ref();
    ensure_dir(dir)?;

    let output_path = dir.join("scaling.png");
    let grid = run.grid.values().to_vec();
    let median = run.aggregate.median.clone();
    let lower = run.aggregate.lower.clone();
    let upper = run.aggregate.upper.clone();
    let regulated = run.regulated.values.clone();
    let cap = run.regulated.cap;
    let band_label = format!(
        "p{}–p{} band (scaling uncertainty)",
        run.aggregate.band.lower, run.aggregate.band.upper
    );

    render_guarded(move || {
        let root = BitMapBackend::new(&output_path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;

        let x_min = grid[0];
        let x_max = grid[grid.len() - 1];
        let y_min = lower.iter().copied().fold(f64::INFINITY, f64::min);
        let y_max = upper.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let margin = ((y_max - y_min).abs() * 0.05).max(0.01);
        let (y_lo, y_hi) = (y_min - margin, y_max + margin);

        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .caption(
                "Impact of hardware caps on AI model capabilities",
                ("sans-serif", 22),
            )
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 50)
            .build_cartesian_2d((x_min..x_max).log_scale(), y_lo..y_hi)
            .map_err(plot_error)?;

        chart
            .configure_mesh()
            .x_desc("Compute budget (FLOPS)")
            .y_desc("Model loss (lower is smarter)")
            .x_label_formatter(&|x| format!("{x:.0e}"))
            .draw()
            .map_err(plot_error)?;

        let band: Vec<(f64, f64)> = grid
            .iter()
            .copied()
            .zip(upper.iter().copied())
            .chain(grid.iter().copied().zip(lower.iter().copied()).rev())
            .collect();
        chart
            .draw_series(std::iter::once(Polygon::new(band, RED.mix(0.15).filled())))
            .map_err(plot_error)?
            .label(band_label)
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], RED.mix(0.15).filled()));

        let series = |values: &[f64]| -> Vec<(f64, f64)> {
            grid.iter().copied().zip(values.iter().copied()).collect()
        };

        chart
            .draw_series(std::iter::once(PathElement::new(
                series(&median),
                RED.stroke_width(2),
            )))
            .map_err(plot_error)?
            .label("Median uncapped training")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

        chart
            .draw_series(std::iter::once(PathElement::new(
                series(&regulated),
                DARK_GREEN.stroke_width(3),
            )))
            .map_err(plot_error)?
            .label("Regulated training (compliance cap)")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &DARK_GREEN));

        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(cap, y_lo), (cap, y_hi)],
                BLACK.stroke_width(1),
            )))
            .map_err(plot_error)?
            .label(format!("Compute cap ({cap:.0e} FLOPS)"))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLACK));

        let overhang_anchor = (x_max, regulated[regulated.len() - 1]);
        chart
            .draw_series(std::iter::once(
                EmptyElement::at(overhang_anchor)
                    + Text::new(
                        "Capability overhang",
                        (-170, -20),
                        ("sans-serif", 16).into_font(),
                    ),
            ))
            .map_err(plot_error)?;

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(plot_error)?;

        drop(chart);
        root.present().map_err(plot_error)?;
        drop(root);

        Ok(output_path)
    })
}
