use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use registry_core::{
    case_rows, parse_calendar_date, Disposition, Patient, RegistryConfig, RegistryOverview,
    RegistryQuery,
};
use registry_sheets::{
    patients_from_str, FileCacheStore, HttpRemoteStore, RegistryCache, SystemClock,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "registry-cli",
    about = "Tổng hợp sổ đăng ký ca lao phổi từ kho dữ liệu bảng tính."
)]
struct Cli {
    /// Đọc phản hồi JSON đã xuất thay vì gọi kho dữ liệu.
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// URL web app của kho dữ liệu.
    #[arg(long, global = true, env = "REGISTRY_API_URL")]
    api_url: Option<String>,

    /// Thư mục chứa file cache.
    #[arg(long, global = true, env = "REGISTRY_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Ngày đánh giá (YYYY-MM-DD), mặc định là hôm nay theo giờ bệnh viện.
    #[arg(long, global = true)]
    today: Option<String>,

    /// Độ lệch giờ của bệnh viện so với UTC (phút), mặc định +480.
    #[arg(long, global = true, env = "REGISTRY_UTC_OFFSET_MINUTES", allow_hyphen_values = true)]
    utc_offset_minutes: Option<i32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Thẻ tổng quan và số liệu biểu đồ.
    Summary {
        /// In toàn bộ tổng quan dạng JSON.
        #[arg(long)]
        json: bool,
    },
    /// Danh sách ca theo bộ lọc.
    List(ListArgs),
    /// Cập nhật kết cục cuối của một ca.
    SetDisposition {
        #[arg(long)]
        id: String,
        /// Ví dụ: "Discharged", "Expired", "Transferred out". Bỏ trống để xóa.
        #[arg(long, default_value = "")]
        outcome: String,
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long, default_value = "")]
    search: String,
    #[arg(long, default_value = "All")]
    ward: String,
    #[arg(long, default_value = "Active Cases")]
    outcome: String,
    #[arg(long, default_value = "All")]
    classification: String,
    /// totalActive | admitted | erLevel | pendingLabs | inactiveMissing
    #[arg(long)]
    card: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("registry=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = RegistryConfig::default();
    if let Some(minutes) = cli.utc_offset_minutes {
        config.utc_offset_minutes = minutes;
    }
    let today = match cli.today.as_deref() {
        Some(raw) => parse_calendar_date(raw, config.utc_offset())
            .with_context(|| format!("Ngày đánh giá không hợp lệ: {raw}"))?,
        None => config.today(),
    };

    match &cli.command {
        Command::Summary { json } => {
            let patients = load_patients(&cli, &config).await?;
            let overview = RegistryOverview::build(&patients, today, &config);
            if *json {
                println!("{}", serde_json::to_string_pretty(&overview)?);
            } else {
                print_summary(&overview, today);
            }
        }
        Command::List(args) => {
            let patients = load_patients(&cli, &config).await?;
            let query = RegistryQuery::from_selectors(
                &args.search,
                &args.ward,
                &args.outcome,
                &args.classification,
                args.card.as_deref(),
            )?;
            for row in case_rows(&patients, &query) {
                let missing = if row.missing.is_empty() {
                    "Complete".to_string()
                } else {
                    row.missing
                        .iter()
                        .map(|field| field.label())
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                println!(
                    "{:<12} {:<28} {:<22} Xpert: {:<13} Smear: {:<13} {}",
                    row.patient.id,
                    format!("{}, {}", row.patient.last_name, row.patient.first_name),
                    row.patient
                        .final_disposition
                        .map(Disposition::label)
                        .unwrap_or("Pending"),
                    row.latest_xpert.result.label(),
                    row.latest_smear.result.label(),
                    missing
                );
            }
        }
        Command::SetDisposition { id, outcome, date } => {
            let disposition = match outcome.trim() {
                "" => None,
                label => Some(
                    Disposition::from_label(label)
                        .with_context(|| format!("Kết cục không hợp lệ: {label}"))?,
                ),
            };
            let registry = remote_registry(&cli, &config)?;
            registry
                .update_final_disposition(id, disposition, date.clone())
                .await
                .with_context(|| format!("Không cập nhật được kết cục cho ca {id}"))?;
            println!("Đã cập nhật kết cục cho ca {id}");
        }
    }

    Ok(())
}

async fn load_patients(cli: &Cli, config: &RegistryConfig) -> anyhow::Result<Vec<Patient>> {
    if let Some(path) = &cli.input {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Không đọc được file {path:?}"))?;
        let patients = patients_from_str(&data)?;
        tracing::info!("Loaded {} patients from {:?}", patients.len(), path);
        return Ok(patients);
    }

    let patients = remote_registry(cli, config)?.fetch().await;
    tracing::info!("Loaded {} patients from registry", patients.len());
    Ok(patients)
}

fn remote_registry(cli: &Cli, config: &RegistryConfig) -> anyhow::Result<RegistryCache> {
    let Some(url) = cli.api_url.as_deref() else {
        bail!("Cần --input hoặc --api-url (REGISTRY_API_URL)");
    };
    let cache_dir = cli
        .cache_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("ptb-registry"));

    Ok(RegistryCache::new(
        Arc::new(HttpRemoteStore::new(url)),
        Arc::new(FileCacheStore::new(cache_dir)),
        Arc::new(SystemClock),
        config,
    ))
}

fn print_summary(overview: &RegistryOverview, today: NaiveDate) {
    let stats = &overview.stats;
    println!("Registry as of {today} ({} records)", overview.total_records);
    println!("  Total active:           {}", stats.total_active);
    println!("  Admitted:               {}", stats.admitted);
    println!("  ER pending:             {}", stats.er_level);
    println!("  Pending labs:           {}", stats.pending_labs);
    println!("  Inactive (missing):     {}", stats.inactive_missing);
    println!("  Discharged this month:  {}", stats.discharged_this_month);
    println!("  Expired this month:     {}", stats.expired_this_month);

    println!("Outcomes:");
    for slice in &overview.outcomes {
        println!("  {:<20} {}", slice.name, slice.value);
    }
    println!("Top wards:");
    for slice in &overview.wards {
        println!("  {:<28} {}", slice.name, slice.value);
    }
}
