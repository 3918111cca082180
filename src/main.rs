// Interactive driver.
//
// - Option [1] loads `report_request.json` (and `report_config.json` when
//   present) and prints what was found.
// - Option [2] builds the PDF and the workbook, writes both to the
//   working directory and previews the analytics summary.
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use water_report::loader::{load_config, load_request};
use water_report::util::format_int;
use water_report::{
    output, AnalyticsSummary, PdfReportBuilder, ReportConfig, ReportRequest, WorkbookBuilder,
};

const REQUEST_PATH: &str = "report_request.json";
const CONFIG_PATH: &str = "report_config.json";

// Loaded once, reused for every generation in the session.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState::default()));

#[derive(Default)]
struct AppState {
    request: Option<ReportRequest>,
    config: ReportConfig,
}

/// Read one trimmed line after the shared "Enter choice:" prompt.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Returns `true` for `Y`, `false` for `N`; asks again otherwise.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: read the request and optional config.
///
/// Both are stored in `APP_STATE` only when the request parses, so a
/// failed load keeps whatever was loaded before.
fn handle_load() {
    let config = match load_config(CONFIG_PATH) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to read {}: {}\n", CONFIG_PATH, e);
            return;
        }
    };
    match load_request(REQUEST_PATH) {
        Ok((request, report)) => {
            println!(
                "Loaded request: {} consumption records, {} chart points.",
                format_int(report.consumption_records),
                format_int(report.chart_points)
            );
            println!(
                "Entities: {} building groups, {} buildings, {} apartments.",
                format_int(report.building_groups),
                format_int(report.buildings),
                format_int(report.apartments)
            );
            if report.invalid_dates > 0 {
                println!(
                    "Note: {} records have unparseable dates and will show as \"Invalid Date\".",
                    format_int(report.invalid_dates)
                );
            }
            println!();
            match APP_STATE.lock() {
                Ok(mut state) => {
                    state.request = Some(request);
                    state.config = config;
                }
                Err(e) => error!("state lock poisoned: {}", e),
            }
        }
        Err(e) => eprintln!("Failed to load {}: {}\n", REQUEST_PATH, e),
    }
}

/// Handle option [2]: build both artifacts and preview the summary.
///
/// A failure in one artifact is reported and does not stop the other.
fn handle_generate() {
    let loaded = APP_STATE
        .lock()
        .ok()
        .and_then(|state| state.request.clone().map(|r| (r, state.config.clone())));
    let Some((request, config)) = loaded else {
        println!("Error: No request loaded. Please load {} first (option 1).\n", REQUEST_PATH);
        return;
    };

    println!("Generating reports...\n");

    let pdf = PdfReportBuilder::new(config.clone()).build(&request);
    let xlsx = WorkbookBuilder::new(config).build(&request);
    for artifact in [pdf, xlsx] {
        match artifact.and_then(|a| output::write_artifact(".", &a)) {
            Ok(path) => println!("Saved {}", path.display()),
            Err(e) => eprintln!("Report error: {}", e),
        }
    }

    let summary = AnalyticsSummary::compute(&request);
    println!("\nAnalytics Summary\n");
    println!("{}\n", output::preview_table(&summary));
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "water_report=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    loop {
        println!("Water Consumption Reports:");
        println!("[1] Load the request");
        println!("[2] Generate Reports\n");
        match read_choice().as_str() {
            "1" => handle_load(),
            "2" => {
                println!();
                handle_generate();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1 or 2.\n"),
        }
    }
}
