use clap::{Parser, ValueEnum};
use risk_ensemble_core::core_types::{Celsius, Degrees, Hectopascals, MetersPerSecond, Millimeters, Percent};
use risk_ensemble_core::{
    Enrichment, EnsembleConfig, EnsembleCoordinator, EnsembleResult, ModelKind, Observation, RiskCategory,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Named observation presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// Desert summer (Dubai climatology)
    Desert,
    /// Antarctic winter (McMurdo climatology)
    Polar,
    /// Mild mid-latitude summer (London climatology)
    Temperate,
}

impl Scenario {
    fn observation(self) -> Observation {
        match self {
            Scenario::Desert => Observation::at(25.2, 55.27)
                .with_temperatures(42.0, 28.0)
                .with_humidity(35.0)
                .with_precipitation(0.1)
                .with_wind_speed(8.0)
                .with_pressure(1015.0),
            Scenario::Polar => Observation::at(-77.8, 166.7)
                .with_temperatures(-25.0, -35.0)
                .with_humidity(60.0)
                .with_precipitation(0.5)
                .with_wind_speed(30.0)
                .with_pressure(980.0),
            Scenario::Temperate => Observation::at(51.5, -0.13)
                .with_temperatures(23.0, 14.0)
                .with_humidity(70.0)
                .with_precipitation(1.8)
                .with_wind_speed(4.0)
                .with_pressure(1016.0),
        }
    }
}

/// Extreme-weather risk ensemble demo
#[derive(Parser, Debug)]
#[command(name = "risk-demo")]
#[command(about = "Multi-model extreme-weather risk ensemble demo", long_about = None)]
struct Args {
    /// Observation preset; individual flags override its fields
    #[arg(short, long, value_enum, default_value_t = Scenario::Desert)]
    scenario: Scenario,

    /// Target date as MM-DD
    #[arg(short, long, default_value = "07-15")]
    date: String,

    /// Year the estimate is for
    #[arg(short, long)]
    year: Option<i32>,

    /// Latitude in degrees (positive north)
    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude in degrees (positive east)
    #[arg(long, allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Daily maximum temperature in °C
    #[arg(long, allow_negative_numbers = true)]
    temp_max: Option<f64>,

    /// Daily minimum temperature in °C
    #[arg(long, allow_negative_numbers = true)]
    temp_min: Option<f64>,

    /// Relative humidity in %
    #[arg(long)]
    humidity: Option<f64>,

    /// Precipitation in mm/day
    #[arg(long)]
    precipitation: Option<f64>,

    /// Wind speed in m/s
    #[arg(short, long)]
    wind_speed: Option<f64>,

    /// Surface pressure in hPa
    #[arg(long)]
    pressure: Option<f64>,

    /// Ensemble configuration (JSON); missing fields take defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enrichment bundle (JSON) with realtime/forecast/seasonal/climate snippets
    #[arg(short, long)]
    enrichment: Option<PathBuf>,

    /// Train the full-size regression model instead of the compact one
    #[arg(long)]
    full: bool,

    /// Disable one or more models
    #[arg(long, value_delimiter = ',')]
    without: Vec<String>,

    /// Print the result as JSON
    #[arg(short, long)]
    json: bool,

    /// Run validation scenarios instead of a single prediction
    #[arg(long)]
    validate: bool,
}

impl Args {
    fn observation(&self) -> Observation {
        let mut obs = self.scenario.observation();
        if let Some(v) = self.lat {
            obs.latitude = Some(Degrees::new(v));
        }
        if let Some(v) = self.lon {
            obs.longitude = Some(Degrees::new(v));
        }
        if let Some(v) = self.temp_max {
            obs.temp_max = Some(Celsius::new(v));
        }
        if let Some(v) = self.temp_min {
            obs.temp_min = Some(Celsius::new(v));
        }
        if let Some(v) = self.humidity {
            obs.humidity = Some(Percent::new(v));
        }
        if let Some(v) = self.precipitation {
            obs.precipitation = Some(Millimeters::new(v));
        }
        if let Some(v) = self.wind_speed {
            obs.wind_speed = Some(MetersPerSecond::new(v));
        }
        if let Some(v) = self.pressure {
            obs.pressure = Some(Hectopascals::new(v));
        }
        obs
    }

    fn ensemble_config(&self) -> Result<EnsembleConfig, String> {
        let mut config = match &self.config {
            Some(path) => read_json::<EnsembleConfig>(path)?,
            None if self.full => EnsembleConfig::default(),
            None => EnsembleConfig::compact(),
        };
        for name in &self.without {
            let kind = ModelKind::ALL
                .into_iter()
                .find(|k| k.name() == name.trim().to_lowercase())
                .ok_or_else(|| format!("unknown model '{}'", name))?;
            config = config.without(kind);
        }
        Ok(config)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("cannot parse {}: {}", path.display(), e))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let config = args.ensemble_config()?;
    let coordinator = EnsembleCoordinator::new(&config).map_err(|e| format!("invalid configuration: {}", e))?;

    if args.validate {
        return if run_validation_tests(&coordinator) {
            Ok(())
        } else {
            Err("validation failed".to_string())
        };
    }

    let observation = args.observation();
    observation
        .validate()
        .map_err(|e| format!("invalid observation: {}", e))?;
    let enrichment = args.enrichment.as_deref().map(read_json::<Enrichment>).transpose()?;

    info!(scenario = ?args.scenario, date = %args.date, "Running ensemble");
    let result = coordinator.predict(&observation, &args.date, enrichment, args.year);

    if args.json {
        let text = serde_json::to_string_pretty(&result).map_err(|e| e.to_string())?;
        println!("{}", text);
    } else {
        print_report(&result);
    }
    Ok(())
}

fn print_report(result: &EnsembleResult) {
    println!("=== Extreme-Weather Risk Ensemble ===\n");
    println!("Date: {}  Year: {}  Method: {}\n", result.date, result.target_year, result.ensemble_method);

    println!("Category            | Risk(%) | Models");
    println!("--------------------|---------|--------------------------------------------");
    for category in RiskCategory::ALL {
        let per_model: Vec<String> = result
            .model_breakdown
            .iter()
            .map(|(kind, output)| format!("{}={:.1}", kind, output.predictions.get(category)))
            .collect();
        println!(
            "{:19} | {:7.1} | {}",
            category.display_name(),
            result.predictions.get(category),
            per_model.join(" ")
        );
    }

    let m = &result.confidence_metrics;
    println!("\nConfidence: {:.1}% ({} uncertainty)", m.overall_confidence, m.uncertainty_level);
    println!(
        "  data quality {:.1} | agreement {:.1} | reliability {:.1}",
        m.data_quality_score, m.statistical_confidence, m.model_reliability
    );

    if let Some(t) = &result.temporal_analysis {
        println!(
            "Horizons: short-term {:.1} | seasonal {:.1} | climate {:.1} | consistency {:.1}",
            t.short_term_reliability, t.seasonal_reliability, t.climate_reliability, t.cross_horizon_consistency
        );
    }

    for (kind, output) in &result.model_breakdown {
        if output.is_fallback() {
            println!("  ! {} model used its fallback", kind);
        }
    }

    println!("\n{}", result.summary);
}

fn run_validation_tests(coordinator: &EnsembleCoordinator) -> bool {
    println!("\n=== Running Validation Tests ===\n");
    let mut passed = true;

    println!("Test 1: Desert summer");
    let desert = coordinator.predict(&Scenario::Desert.observation(), "07-15", None, None);
    println!(
        "  Heat: {:.1}%  Cold: {:.1}%",
        desert.predictions.extreme_heat, desert.predictions.extreme_cold
    );
    if desert.predictions.extreme_heat > desert.predictions.extreme_cold + 30.0 {
        println!("  ✓ PASS: Heat dominates");
    } else {
        println!("  ✗ FAIL: Expected heat well above cold");
        passed = false;
    }

    println!("\nTest 2: Polar winter");
    let polar = coordinator.predict(&Scenario::Polar.observation(), "07-15", None, None);
    println!(
        "  Heat: {:.1}%  Cold: {:.1}%",
        polar.predictions.extreme_heat, polar.predictions.extreme_cold
    );
    if polar.predictions.extreme_cold > polar.predictions.extreme_heat + 30.0 {
        println!("  ✓ PASS: Cold dominates");
    } else {
        println!("  ✗ FAIL: Expected cold well above heat");
        passed = false;
    }

    println!("\nTest 3: Determinism");
    let again = coordinator.predict(&Scenario::Desert.observation(), "07-15", None, None);
    if again == desert {
        println!("  ✓ PASS: Identical inputs give identical results");
    } else {
        println!("  ✗ FAIL: Results differ between runs");
        passed = false;
    }

    println!("\nTest 4: Weight normalisation");
    let normalised = desert.adaptive_weights.values().all(|w| (w.values().sum::<f64>() - 1.0).abs() < 1e-9);
    if normalised {
        println!("  ✓ PASS: Adaptive weights sum to 1 per category");
    } else {
        println!("  ✗ FAIL: Adaptive weights are not normalised");
        passed = false;
    }

    passed
}
