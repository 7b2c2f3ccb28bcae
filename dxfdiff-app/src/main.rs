use std::path::PathBuf;

use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use dxfdiff_config::{AppConfig, ConfigError};
use dxfdiff_engine::diff::diff_documents;
use dxfdiff_engine::tolerance::Tolerance;
use dxfdiff_io::{DocumentLoader, DocumentSaver, DxfFacade};

const USAGE: &str = "用法：dxfdiff <基准.dxf> <候选.dxf> <输出.dxf> [--tolerance <值>] [--config <路径>]";

struct CliArgs {
    baseline: PathBuf,
    candidate: PathBuf,
    output: PathBuf,
    tolerance_override: Option<f64>,
    config_override: Option<PathBuf>,
}

fn main() {
    let cli = parse_args();
    let config = load_configuration(cli.config_override.clone());
    init_logging(&config);

    let tolerance_value = cli.tolerance_override.unwrap_or(config.compare.tolerance);
    let tolerance = match Tolerance::new(tolerance_value) {
        Ok(tolerance) => tolerance,
        Err(err) => {
            eprintln!("公差无效：{err}");
            std::process::exit(1);
        }
    };
    if !(1e-10..=1e-2).contains(&tolerance.get()) {
        warn!(tolerance = tolerance.get(), "公差超出推荐范围 1e-10 ..= 1e-2");
    }

    info!(
        baseline = %cli.baseline.display(),
        candidate = %cli.candidate.display(),
        tolerance = tolerance.get(),
        "开始图形差分"
    );

    let facade = DxfFacade::new();
    let baseline = match facade.load(&cli.baseline) {
        Ok(document) => document,
        Err(err) => {
            error!(path = %cli.baseline.display(), error = %err, "读取基准图失败");
            std::process::exit(1);
        }
    };
    let candidate = match facade.load(&cli.candidate) {
        Ok(document) => document,
        Err(err) => {
            error!(path = %cli.candidate.display(), error = %err, "读取候选图失败");
            std::process::exit(1);
        }
    };

    let result = diff_documents(&baseline, &candidate, tolerance);
    let summary = result.summary;

    if let Err(err) = facade.save(&result.document, &cli.output) {
        error!(path = %cli.output.display(), error = %err, "写出结果图失败");
        std::process::exit(1);
    }

    info!(output = %cli.output.display(), "差分结果已写出");
    println!("新增: {}", summary.added);
    println!("删除: {}", summary.removed);
    println!("修改: {}", summary.modified);
    println!("未变: {}", summary.unchanged);
    println!("合计: {}", summary.total());
}

fn parse_args() -> CliArgs {
    let mut args = std::env::args().skip(1);
    let mut positional: Vec<PathBuf> = Vec::new();
    let mut tolerance_override: Option<f64> = None;
    let mut config_override: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--tolerance" => {
                let Some(raw) = args.next() else {
                    eprintln!("`--tolerance` 需要提供数值");
                    std::process::exit(1);
                };
                match raw.parse::<f64>() {
                    Ok(value) => tolerance_override = Some(value),
                    Err(_) => {
                        eprintln!("无法解析公差值：{raw}");
                        std::process::exit(1);
                    }
                }
            }
            "--config" => {
                let Some(path) = args.next() else {
                    eprintln!("`--config` 需要提供配置文件路径");
                    std::process::exit(1);
                };
                config_override = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other if other.starts_with("--") => {
                eprintln!("未知参数：{other}");
                eprintln!("{USAGE}");
                std::process::exit(1);
            }
            path => positional.push(PathBuf::from(path)),
        }
    }

    if positional.len() != 3 {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }

    let mut positional = positional.into_iter();
    CliArgs {
        baseline: positional.next().unwrap_or_default(),
        candidate: positional.next().unwrap_or_default(),
        output: positional.next().unwrap_or_default(),
        tolerance_override,
        config_override,
    }
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
