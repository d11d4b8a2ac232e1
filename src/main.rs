// Entry point and interactive text dashboard.
//
// - Loads the extract once (through the dataset cache) and stops with an
//   error if it is structurally unusable.
// - A menu loop edits the filter selection and redraws the dashboard by
//   re-running the pipeline on every change.
use clap::Parser;
use district_sales::aggregate::{default_category_selection, DEFAULT_TOP_N};
use district_sales::cache::DatasetCache;
use district_sales::config::SchemaConfig;
use district_sales::filter::{distinct_values, period_options, split_list, FilterSelection, PeriodSelection};
use district_sales::loader::Normalizer;
use district_sales::output;
use district_sales::pipeline::evaluate;
use district_sales::types::{Dataset, Field, SummaryExport};
use district_sales::util::format_int;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use tracing::error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "district_sales")]
#[command(about = "Quarterly commercial-district sales dashboard", long_about = None)]
struct Cli {
    /// Sales extract (CSV, cp949 by default)
    #[arg(short, long, default_value = "서울시_상권분석서비스_샘플.csv")]
    data: PathBuf,

    /// JSON schema file overriding the built-in rename map
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Require the district-type column
    #[arg(long, default_value_t = false)]
    extended: bool,

    /// Number of categories in the ranking
    #[arg(short, long, default_value_t = DEFAULT_TOP_N)]
    top: usize,

    /// Directory for exported CSV/JSON files
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,
}

struct Session<'a, R> {
    dataset: &'a Dataset,
    normalizer: &'a Normalizer,
    selection: FilterSelection,
    top_n: usize,
    export_dir: PathBuf,
    input: R,
}

impl<'a, R: BufRead> Session<'a, R> {
    /// Print `label` and read one trimmed line. `None` once input is
    /// exhausted or unreadable.
    fn prompt(&mut self, label: &str) -> Option<String> {
        print!("{}", label);
        let _ = io::stdout().flush();
        let mut buf = String::new();
        match self.input.read_line(&mut buf) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(buf.trim().to_string()),
        }
    }
}

fn print_options(title: &str, options: &[String]) {
    println!("{}: {}", title, options.join(", "));
}

fn handle_period<R: BufRead>(s: &mut Session<R>) -> Option<()> {
    print_options("🗓️ 분기 선택", &period_options(&s.dataset.records));
    let input = s.prompt("분기 (쉼표로 구분, 전체 = 모든 분기): ")?;
    s.selection.periods = PeriodSelection::parse(&input);
    Some(())
}

fn handle_district_types<R: BufRead>(s: &mut Session<R>) -> Option<()> {
    let opts = distinct_values(&s.dataset.records, Field::DistrictType);
    if opts.is_empty() {
        println!("상권유형 컬럼이 없어요.\n");
        return Some(());
    }
    print_options("상권유형", &opts);
    s.selection.district_types = split_list(&s.prompt("상권유형 (빈 값 = 전체): ")?);
    Some(())
}

fn handle_categories<R: BufRead>(s: &mut Session<R>) -> Option<()> {
    print_options("업종", &distinct_values(&s.dataset.records, Field::Category));
    let input = s.prompt("업종 (빈 값 = 전체, top = 매출 상위 5개): ")?;
    s.selection.categories = if input.eq_ignore_ascii_case("top") {
        // Suggest from the rows the other filters already allow.
        let base = FilterSelection {
            categories: Default::default(),
            ..s.selection.clone()
        };
        let view = evaluate(s.dataset, &base, s.top_n);
        default_category_selection(&view.filtered).into_iter().collect()
    } else {
        split_list(&input)
    };
    Some(())
}

fn handle_show<R>(s: &Session<R>) {
    let view = evaluate(s.dataset, &s.selection, s.top_n);
    output::print_dashboard(&view, &s.selection.to_string());
}

fn handle_export<R>(s: &Session<R>) {
    let view = evaluate(s.dataset, &s.selection, s.top_n);
    let path = output::timestamped_path(&s.export_dir, "filtered", "csv");
    match output::export_records(&path, s.dataset, &view.filtered, s.normalizer.encoding()) {
        Ok(()) => println!(
            "{} rows exported to {}\n",
            format_int(view.filtered.len()),
            path.display()
        ),
        Err(e) => eprintln!("Write error: {}\n", e),
    }
}

fn handle_summary<R>(s: &Session<R>) {
    let view = evaluate(s.dataset, &s.selection, s.top_n);
    let Some(metrics) = view.metrics() else {
        println!("선택한 조건에 해당하는 데이터가 없어 요약을 만들 수 없어요.\n");
        return;
    };
    let export = SummaryExport {
        selection: s.selection.to_string(),
        row_count: view.filtered.len(),
        summary: &metrics.summary,
        ranking: &metrics.ranking,
        demographics: &metrics.demographics,
    };
    let path = output::timestamped_path(&s.export_dir, "summary", "json");
    match output::write_json(&path, &export) {
        Ok(()) => println!("Summary written to {}\n", path.display()),
        Err(e) => eprintln!("Write error: {}\n", e),
    }
}

/// Menu loop. Ends on `0` or when input runs out; returns the selection
/// that was active at exit.
fn run_menu<R: BufRead>(mut s: Session<R>) -> FilterSelection {
    handle_show(&s);
    loop {
        println!("[1] 분기 선택  [2] 상권유형 선택  [3] 업종 선택");
        println!("[4] 대시보드 보기  [5] 필터 결과 CSV 저장  [6] 요약 JSON 저장  [0] 종료\n");
        let Some(choice) = s.prompt("Enter choice: ") else {
            println!("\nInput closed. Exiting the program.");
            break;
        };
        let edited = match choice.as_str() {
            "1" => handle_period(&mut s),
            "2" => handle_district_types(&mut s),
            "3" => handle_categories(&mut s),
            "4" => {
                handle_show(&s);
                continue;
            }
            "5" => {
                handle_export(&s);
                continue;
            }
            "6" => {
                handle_summary(&s);
                continue;
            }
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => {
                println!("Invalid choice. Please enter 0-6.\n");
                continue;
            }
        };
        if edited.is_none() {
            println!("\nInput closed. Exiting the program.");
            break;
        }
        handle_show(&s);
    }
    s.selection
}

fn init_logging() {
    let stderr_layer = fmt::layer().with_target(false).with_writer(io::stderr);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let config = match &cli.schema {
        Some(path) => SchemaConfig::from_json_file(path),
        None if cli.extended => Ok(SchemaConfig::extended()),
        None => Ok(SchemaConfig::seoul_district_sales()),
    };
    let normalizer = match config.and_then(Normalizer::new) {
        Ok(n) => n,
        Err(e) => {
            error!(error = %e, "Invalid schema configuration");
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let mut cache = DatasetCache::new(normalizer);
    let loaded = match cache.load(&cli.data) {
        Ok(l) => l,
        Err(e) => {
            error!(error = %e, "Dataset could not be loaded");
            eprintln!("Error: {}", e);
            eprintln!("파일 이름과 위치, 원본 헤더(rename map)를 확인해 주세요.");
            process::exit(1);
        }
    };

    println!(
        "Processing dataset... ({} rows loaded, {} columns)",
        format_int(loaded.report.total_rows),
        format_int(loaded.dataset.headers.len())
    );
    if loaded.report.coerced_cells > 0 {
        println!(
            "Note: {} numeric cells could not be parsed and are treated as missing.",
            format_int(loaded.report.coerced_cells)
        );
    }
    if loaded.report.short_rows > 0 {
        println!(
            "Note: {} rows had fewer cells than the header.",
            format_int(loaded.report.short_rows)
        );
    }

    let session = Session {
        dataset: &loaded.dataset,
        normalizer: cache.normalizer(),
        selection: FilterSelection::all(),
        top_n: cli.top,
        export_dir: cli.export_dir,
        input: io::stdin().lock(),
    };
    run_menu(session);
}
