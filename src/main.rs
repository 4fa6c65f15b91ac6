use analytics::{
    CloseField, PanelFilter, PerformanceEngine, ReturnOptions, RobustVolEstimator,
    correlation_matrix, cumulative_nav, drawdown_panel, latest_periods, monthly_return_calendar,
    returns, to_wide_prices_with, zscore_panel,
};
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use configuration::{Config, init_tracing, load_config};
use core_types::{Frequency, Panel, ResamplePeriod, ReturnKind};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::output::ValueStyle;

mod loader;
mod output;

/// The main entry point for the index analytics dashboard.
fn main() -> Result<()> {
    // A missing .env file is fine; it only carries optional overrides.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = load_config(Some(&cli.config)).context("Failed to load configuration")?;
    let _log_guard = init_tracing(&config.logging)?;

    run(cli, &config)
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Performance analytics for a panel of market indices.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path of a TOML configuration file; skipped when it does not exist.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Long-format price CSV; overrides `data.prices_path`.
    #[arg(long, global = true)]
    prices: Option<PathBuf>,

    #[command(flatten)]
    filter: FilterArgs,

    /// Emit JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Keep only indices of this type.
    #[arg(long, global = true)]
    index_type: Option<String>,

    /// Keep only indices of this category.
    #[arg(long, global = true)]
    category: Option<String>,

    /// Keep only this symbol; repeat for several.
    #[arg(long = "symbol", global = true)]
    symbols: Vec<String>,

    /// First date to include (format: YYYY-MM-DD).
    #[arg(long, global = true)]
    from: Option<NaiveDate>,

    /// Last date to include (format: YYYY-MM-DD).
    #[arg(long, global = true)]
    to: Option<NaiveDate>,
}

impl FilterArgs {
    fn to_filter(&self) -> PanelFilter {
        PanelFilter {
            index_type: self.index_type.clone(),
            index_category: self.category.clone(),
            symbols: self.symbols.clone(),
            start: self.from,
            end: self.to,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the wide table of closing prices.
    Prices(RowsArgs),
    /// Show log or simple returns, optionally resampled to a calendar period.
    Returns(ReturnsArgs),
    /// Show annualized performance statistics per index.
    Stats(StatsArgs),
    /// Show the blended fast/slow volatility estimate.
    Vol(VolArgs),
    /// Show the drawdown from the running peak.
    Drawdown(RowsArgs),
    /// Show NAV curves rebased to a common starting level.
    Nav(NavArgs),
    /// Show pairwise return correlations.
    Correlation(CorrelationArgs),
    /// Show compounded monthly returns by year.
    Calendar,
    /// Rank indices by their most recent returns.
    Movers(MoversArgs),
}

#[derive(Args)]
struct RowsArgs {
    /// Show only the last N rows.
    #[arg(long)]
    last: Option<usize>,
}

#[derive(Args)]
struct ReturnsArgs {
    /// "log" or "simple"; defaults to `analytics.return_kind`.
    #[arg(long)]
    kind: Option<ReturnKind>,

    /// Calendar period: W-FRI, ME, QE or YE.
    #[arg(long)]
    resample: Option<ResamplePeriod>,

    /// Keep rows where every return is missing.
    #[arg(long)]
    keep_na: bool,

    #[command(flatten)]
    rows: RowsArgs,
}

#[derive(Args)]
struct StatsArgs {
    /// natural, week, month or year; defaults to `analytics.frequency`.
    #[arg(long)]
    frequency: Option<Frequency>,

    /// Return kind the statistics are computed on; defaults to simple.
    #[arg(long)]
    kind: Option<ReturnKind>,
}

#[derive(Args)]
struct VolArgs {
    /// Report per-period volatility instead of annualizing.
    #[arg(long)]
    no_annualize: bool,

    #[command(flatten)]
    rows: RowsArgs,
}

#[derive(Args)]
struct NavArgs {
    /// Starting NAV level; defaults to `analytics.nav_base`.
    #[arg(long)]
    base: Option<f64>,

    #[command(flatten)]
    rows: RowsArgs,
}

#[derive(Args)]
struct CorrelationArgs {
    /// Correlate returns resampled to this calendar period.
    #[arg(long)]
    resample: Option<ResamplePeriod>,

    /// Use every pair's common dates instead of only dates where all indices trade.
    #[arg(long)]
    pairwise: bool,
}

#[derive(Args)]
struct MoversArgs {
    /// Number of recent periods; defaults to `analytics.latest_periods`.
    #[arg(long)]
    periods: Option<usize>,

    /// Rank returns resampled to this calendar period.
    #[arg(long)]
    resample: Option<ResamplePeriod>,

    /// Rank log returns scaled by their robust volatility instead of raw returns.
    #[arg(long)]
    zscore: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

/// Loaded and filtered inputs shared by every command.
struct Session<'a> {
    config: &'a Config,
    prices: Panel,
    json: bool,
}

impl Session<'_> {
    fn returns(&self, kind: ReturnKind, resample: Option<ResamplePeriod>) -> Result<Panel> {
        let options = ReturnOptions {
            kind,
            resample,
            drop_na: true,
        };
        Ok(returns(&self.prices, &options)?)
    }
}

fn run(cli: Cli, config: &Config) -> Result<()> {
    let Some(path) = cli.prices.as_ref().or(config.data.prices_path.as_ref()) else {
        bail!("No price file given: pass --prices or set data.prices_path");
    };

    let records = loader::load_price_csv(path, config.data.has_headers)?;
    let records = cli.filter.to_filter().apply(&records);
    let field = CloseField::from_column(&config.data.close_column);
    let prices = to_wide_prices_with(&records, &field)?;
    if prices.is_empty() {
        warn!("No prices left after filtering");
    }
    info!(
        symbols = prices.n_cols(),
        dates = prices.n_rows(),
        "Built price panel"
    );

    let session = Session {
        config,
        prices,
        json: cli.json,
    };

    match cli.command {
        Commands::Prices(args) => handle_prices(&session, args),
        Commands::Returns(args) => handle_returns(&session, args),
        Commands::Stats(args) => handle_stats(&session, args),
        Commands::Vol(args) => handle_vol(&session, args),
        Commands::Drawdown(args) => handle_drawdown(&session, args),
        Commands::Nav(args) => handle_nav(&session, args),
        Commands::Correlation(args) => handle_correlation(&session, args),
        Commands::Calendar => handle_calendar(&session),
        Commands::Movers(args) => handle_movers(&session, args),
    }
}

fn last_rows(panel: Panel, rows: &RowsArgs) -> Panel {
    match rows.last {
        Some(n) => panel.tail(n),
        None => panel,
    }
}

fn handle_prices(session: &Session, args: RowsArgs) -> Result<()> {
    let prices = last_rows(session.prices.clone(), &args);
    output::print_panel(&prices, ValueStyle::Level, session.json)
}

fn handle_returns(session: &Session, args: ReturnsArgs) -> Result<()> {
    let analytics = &session.config.analytics;
    let options = ReturnOptions {
        kind: args.kind.unwrap_or(analytics.return_kind),
        resample: args.resample.or(analytics.resample),
        drop_na: !args.keep_na,
    };
    let panel = returns(&session.prices, &options)?;
    output::print_panel(&last_rows(panel, &args.rows), ValueStyle::Percent, session.json)
}

fn handle_stats(session: &Session, args: StatsArgs) -> Result<()> {
    let analytics = &session.config.analytics;
    let frequency = args.frequency.unwrap_or(analytics.frequency);
    let panel = session.returns(args.kind.unwrap_or(ReturnKind::Simple), None)?;
    let stats = PerformanceEngine::new(frequency).calculate_instruments(&panel)?;
    output::print_statistics(&stats, session.json)
}

fn handle_vol(session: &Session, args: VolArgs) -> Result<()> {
    let panel = session.returns(ReturnKind::Simple, None)?;
    let vol = RobustVolEstimator::default().estimate_panel(&panel, !args.no_annualize)?;
    output::print_panel(&last_rows(vol, &args.rows), ValueStyle::Percent, session.json)
}

fn handle_drawdown(session: &Session, args: RowsArgs) -> Result<()> {
    let panel = session.returns(ReturnKind::Simple, None)?;
    let drawdown = drawdown_panel(&panel)?;
    output::print_panel(&last_rows(drawdown, &args), ValueStyle::Percent, session.json)
}

fn handle_nav(session: &Session, args: NavArgs) -> Result<()> {
    let base = args.base.unwrap_or(session.config.analytics.nav_base);
    let nav = cumulative_nav(&session.prices, base)?;
    output::print_panel(&last_rows(nav, &args.rows), ValueStyle::Level, session.json)
}

fn handle_correlation(session: &Session, args: CorrelationArgs) -> Result<()> {
    let resample = args.resample.or(session.config.analytics.resample);
    let mut panel = session.returns(ReturnKind::Simple, resample)?;
    if !args.pairwise {
        panel = panel.drop_incomplete_rows();
    }
    output::print_correlation(&correlation_matrix(&panel), session.json)
}

fn handle_calendar(session: &Session) -> Result<()> {
    let panel = session.returns(ReturnKind::Log, None)?;
    output::print_calendar(&monthly_return_calendar(&panel), session.json)
}

fn handle_movers(session: &Session, args: MoversArgs) -> Result<()> {
    let analytics = &session.config.analytics;
    let periods = args.periods.unwrap_or(analytics.latest_periods);
    if periods == 0 {
        bail!("--periods must be at least 1");
    }

    let resample = args.resample.or(analytics.resample);
    let (panel, style) = if args.zscore {
        let log = session.returns(ReturnKind::Log, resample)?;
        (zscore_panel(&log)?, ValueStyle::Level)
    } else {
        (session.returns(analytics.return_kind, resample)?, ValueStyle::Percent)
    };
    output::print_movers(&latest_periods(&panel, periods), style, session.json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_filters_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "index360",
            "stats",
            "--frequency",
            "month",
            "--symbol",
            "SPX",
            "--symbol",
            "NDX",
            "--from",
            "2020-01-01",
        ])
        .unwrap();

        let filter = cli.filter.to_filter();
        assert_eq!(filter.symbols, vec!["SPX", "NDX"]);
        assert_eq!(filter.start, NaiveDate::from_ymd_opt(2020, 1, 1));
        match cli.command {
            Commands::Stats(args) => assert_eq!(args.frequency, Some(Frequency::Month)),
            _ => panic!("expected the stats command"),
        }
    }

    #[test]
    fn vol_annualizes_unless_asked_not_to() {
        let cli = Cli::try_parse_from(["index360", "vol"]).unwrap();
        match cli.command {
            Commands::Vol(args) => assert!(!args.no_annualize),
            _ => panic!("expected the vol command"),
        }
        let cli = Cli::try_parse_from(["index360", "vol", "--no-annualize"]).unwrap();
        assert!(matches!(cli.command, Commands::Vol(VolArgs { no_annualize: true, .. })));
    }

    #[test]
    fn movers_accepts_pandas_period_codes() {
        let cli = Cli::try_parse_from(["index360", "movers", "--zscore", "--resample", "W-FRI"]).unwrap();
        match cli.command {
            Commands::Movers(args) => {
                assert!(args.zscore);
                assert_eq!(args.resample, Some(ResamplePeriod::WeekEndingFriday));
            }
            _ => panic!("expected the movers command"),
        }
        assert!(Cli::try_parse_from(["index360", "movers", "--resample", "fortnight"]).is_err());
    }
}
