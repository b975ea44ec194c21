// ==========================================
// 车队取货容量分配引擎 - 命令行入口
// ==========================================
// 流程: 加载配置与等价表 → 导入数据集 → 登记车辆 → 应用排除 → 运行 → 导出
// ==========================================

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use fleet_pickup_alloc::config::{load_equivalence_table, ConfigManager};
use fleet_pickup_alloc::export::{CsvDirectoryWriter, ExportWriter, JsonExportWriter};
use fleet_pickup_alloc::{logging, PlannerApi, RunOutcome, VehicleRegistration};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info};

const DATASET_ARG_NAME: &str = "dataset";
const VEHICLES_ARG_NAME: &str = "vehicles";
const CONFIG_ARG_NAME: &str = "config";
const EQUIVALENCES_ARG_NAME: &str = "equivalences";
const EXCLUDE_ARG_NAME: &str = "exclude";
const OUTPUT_ARG_NAME: &str = "output";
const FORMAT_ARG_NAME: &str = "format";
const LOG_JSON_ARG_NAME: &str = "log-json";

fn get_app() -> Command {
    Command::new("fleet-pickup-alloc")
        .version(fleet_pickup_alloc::VERSION)
        .about("Plans fleet pickups: address blocks packed per vehicle under weighted capacity")
        .arg(
            Arg::new(DATASET_ARG_NAME)
                .help("Pending-units table (.csv, .xlsx, .xls)")
                .short('d')
                .long(DATASET_ARG_NAME)
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(VEHICLES_ARG_NAME)
                .help("JSON array of vehicle registrations")
                .short('v')
                .long(VEHICLES_ARG_NAME)
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(CONFIG_ARG_NAME)
                .help("Planner config file (JSON)")
                .short('c')
                .long(CONFIG_ARG_NAME)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(EQUIVALENCES_ARG_NAME)
                .help("Equivalence table (JSON or CSV); overrides the config entry")
                .short('e')
                .long(EQUIVALENCES_ARG_NAME)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(EXCLUDE_ARG_NAME)
                .help("Deselect a special reference, as CITY:CODE (repeatable)")
                .short('x')
                .long(EXCLUDE_ARG_NAME)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new(OUTPUT_ARG_NAME)
                .help("Output directory for the export document")
                .short('o')
                .long(OUTPUT_ARG_NAME)
                .default_value(".")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(FORMAT_ARG_NAME)
                .help("Export format")
                .short('f')
                .long(FORMAT_ARG_NAME)
                .default_value("csv")
                .value_parser(["csv", "json"]),
        )
        .arg(
            Arg::new(LOG_JSON_ARG_NAME)
                .help("Emit logs as JSON")
                .long(LOG_JSON_ARG_NAME)
                .action(ArgAction::SetTrue),
        )
}

fn main() {
    let matches = get_app().get_matches();

    if matches.get_flag(LOG_JSON_ARG_NAME) {
        logging::init_json();
    } else {
        logging::init();
    }

    if let Err(err) = run(&matches) {
        error!(error = %format!("{:#}", err), "规划失败");
        eprintln!("error: {:#}", err);
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    // === 配置与等价表（进程内加载一次）===
    let config = ConfigManager::load(matches.get_one::<PathBuf>(CONFIG_ARG_NAME).map(PathBuf::as_path))?;
    let mut api = match matches.get_one::<PathBuf>(EQUIVALENCES_ARG_NAME) {
        Some(path) => PlannerApi::new(config, load_equivalence_table(path)?),
        None => PlannerApi::from_config(config)?,
    };

    // === 数据集 ===
    let dataset_path = required_path(matches, DATASET_ARG_NAME)?;
    let dataset = api
        .load_dataset(dataset_path)
        .with_context(|| format!("cannot load dataset '{}'", dataset_path.display()))?;
    info!(
        active_units = dataset.len(),
        inactive_rows = dataset.inactive_rows,
        "数据集就绪"
    );

    // === 车辆 ===
    let vehicles_path = required_path(matches, VEHICLES_ARG_NAME)?;
    for registration in read_vehicles(vehicles_path)? {
        let plate = registration.plate.clone();
        api.register_vehicle(registration)
            .with_context(|| format!("cannot register vehicle '{}'", plate))?;
    }

    // === 特殊编码排除 ===
    if let Some(exclusions) = matches.get_many::<String>(EXCLUDE_ARG_NAME) {
        for raw in exclusions {
            let (city, code) = parse_exclusion(raw)?;
            api.update_selection(city, code, false);
        }
    }

    // === 运行 ===
    let response = api.run_plan()?;
    match (&response.outcome, &response.document) {
        (_, Some(document)) => {
            let output = required_path(matches, OUTPUT_ARG_NAME)?;
            let files = match matches.get_one::<String>(FORMAT_ARG_NAME).map(String::as_str) {
                Some("json") => JsonExportWriter { pretty: true }.write(document, output)?,
                _ => CsvDirectoryWriter.write(document, output)?,
            };
            println!(
                "{}: {} units assigned, {} sections",
                document.name,
                document.total_units_assigned,
                document.sections.len()
            );
            for file in files {
                println!("  {}", file.display());
            }
        }
        (RunOutcome::NoAssignment(empty), None) => {
            println!("{}", empty.diagnosis());
        }
        (RunOutcome::Assigned(_), None) => bail!("run assigned units but produced no export document"),
    }

    Ok(())
}

fn required_path<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a Path> {
    matches
        .get_one::<PathBuf>(name)
        .map(PathBuf::as_path)
        .with_context(|| format!("missing argument '--{}'", name))
}

fn read_vehicles(path: &Path) -> Result<Vec<VehicleRegistration>> {
    let file = File::open(path).with_context(|| format!("cannot open vehicles file '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("cannot parse vehicles file '{}'", path.display()))
}

/// "CITY:CODE" → (CITY, CODE)
fn parse_exclusion(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once(':') {
        Some((city, code)) if !city.trim().is_empty() && !code.trim().is_empty() => Ok((city, code)),
        _ => bail!("invalid exclusion '{}', expected CITY:CODE", raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exclusion() {
        assert_eq!(parse_exclusion("Cali:MOTO 4").unwrap(), ("Cali", "MOTO 4"));
        assert!(parse_exclusion("Cali").is_err());
        assert!(parse_exclusion(":X").is_err());
    }

    #[test]
    fn test_app_definition_is_consistent() {
        get_app().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let matches = get_app()
            .try_get_matches_from(["fleet-pickup-alloc", "-d", "units.csv", "-v", "fleet.json", "-x", "A:B", "-x", "C:D"])
            .unwrap();
        assert_eq!(matches.get_one::<String>(FORMAT_ARG_NAME).map(String::as_str), Some("csv"));
        assert_eq!(matches.get_many::<String>(EXCLUDE_ARG_NAME).unwrap().count(), 2);
    }
}
