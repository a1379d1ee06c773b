use anyhow::Result;
use interval_demux::core::EdgePolicy;
use interval_demux::utils::error::ErrorSeverity;
use interval_demux::{CliConfig, DemuxEngine, DemuxError, DemuxPipeline, LocalStorage, RunSummary};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const HEADER: &str = "\"Time\",\"Frequency\",\"Power\"";
const INTERVAL_A: &str = "A,01-01-2024 10:00:00,01-01-2024 10:05:00";
const FILE_A: &str = "(A) 01-01-2024 10.00-10.05.txt";

fn data_line(timestamp: &str, frequency: &str, power: &str) -> String {
    format!("\"{}\",{:>9},{}", timestamp, frequency, power)
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(intervals: &str, data_lines: &[String]) -> Result<Self> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("intervals.txt"), intervals)?;
        let mut data = String::from(HEADER);
        data.push('\n');
        for line in data_lines {
            data.push_str(line);
            data.push('\n');
        }
        std::fs::write(dir.path().join("src.txt"), data)?;
        std::fs::create_dir_all(dir.path().join("out"))?;
        Ok(Self { dir })
    }

    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_str().unwrap().to_string()
    }

    fn out(&self, name: &str) -> PathBuf {
        self.dir.path().join("out").join(name)
    }

    fn config(&self) -> CliConfig {
        CliConfig {
            filein: self.path("src.txt"),
            intervals: self.path("intervals.txt"),
            output_path: self.path("out"),
            debug_file: "test-data.txt".to_string(),
            sample_lines: 20,
            tolerance_ms: 150,
            edge_policy: EdgePolicy::Exact,
            test: false,
            verbose: false,
            monitor: false,
            config: None,
            summary_json: None,
            log_json: false,
        }
    }

    fn run_with(&self, config: CliConfig) -> interval_demux::Result<RunSummary> {
        let storage = LocalStorage::new(config.output_path.clone());
        let pipeline = DemuxPipeline::new(storage, config);
        DemuxEngine::new(pipeline).run()
    }

    fn run(&self) -> interval_demux::Result<RunSummary> {
        self.run_with(self.config())
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

/// Collects formatted log output so a test can check what was reported.
#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn with_captured_log<T>(run: impl FnOnce() -> T) -> (T, String) {
    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, run);
    (result, log.contents())
}

#[test]
fn test_record_on_interval_start_is_written_at_start() -> Result<()> {
    let fixture = Fixture::new(
        &format!("{}\n", INTERVAL_A),
        &[data_line("01/01/2024 10:00:00.00", "100.1234", "5.123")],
    )?;

    let summary = fixture.run()?;

    assert_eq!(
        read(&fixture.out(FILE_A)),
        "2024-01-01 10:00:00.00,100.1234,5.123\n"
    );
    let a = summary.interval("A").unwrap();
    assert_eq!(a.counters.start_edge, 1);
    assert_eq!(a.counters.interior, 0);
    assert_eq!(a.counters.end_edge, 0);
    assert_eq!(a.file_name, FILE_A);
    Ok(())
}

#[test]
fn test_interior_record_keeps_its_own_timestamp() -> Result<()> {
    let fixture = Fixture::new(
        &format!("{}\n", INTERVAL_A),
        &[data_line("01/01/2024 10:02:30.00", "49.9876", "3.2")],
    )?;

    let summary = fixture.run()?;

    assert_eq!(
        read(&fixture.out(FILE_A)),
        "2024-01-01 10:02:30.00,49.9876,3.200\n"
    );
    assert_eq!(summary.interval("A").unwrap().counters.interior, 1);
    Ok(())
}

#[test]
fn test_malformed_interval_is_skipped_and_run_continues() -> Result<()> {
    let fixture = Fixture::new(
        &format!("BROKEN,01-01-2024 25:99,01-01-2024 10:05:00\n{}\n", INTERVAL_A),
        &[data_line("01/01/2024 10:01:00.00", "50.0000", "1.000")],
    )?;

    let (summary, log) = with_captured_log(|| fixture.run());
    let summary = summary?;

    assert!(log.contains("Skipping interval"), "log was: {log}");
    assert!(log.contains("Interval line 1"), "log was: {log}");
    let outputs: Vec<String> = std::fs::read_dir(fixture.dir.path().join("out"))?
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name != "test-data.txt")
        .collect();
    assert_eq!(outputs, vec![FILE_A.to_string()]);
    assert_eq!(summary.intervals.len(), 1);
    assert_eq!(summary.skipped_intervals.len(), 1);
    assert_eq!(summary.skipped_intervals[0].line, 1);
    assert_eq!(summary.interval("A").unwrap().total, 1);
    Ok(())
}

#[test]
fn test_non_numeric_frequency_stops_the_run() -> Result<()> {
    let fixture = Fixture::new(
        &format!("{}\n", INTERVAL_A),
        &[
            data_line("01/01/2024 10:01:00.00", "50.0000", "1.000"),
            data_line("01/01/2024 10:01:01.00", "fifty", "1.000"),
            data_line("01/01/2024 10:01:02.00", "50.0000", "1.000"),
        ],
    )?;

    let err = fixture.run().unwrap_err();

    match &err {
        DemuxError::RecordParseError { line, field, .. } => {
            assert_eq!(*line, Some(3));
            assert_eq!(field, "frequency");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_fatal());
    assert_eq!(err.severity(), ErrorSeverity::High);

    // what was routed before the bad line stays on disk
    assert_eq!(
        read(&fixture.out(FILE_A)),
        "2024-01-01 10:01:00.00,50.0000,1.000\n"
    );
    Ok(())
}

#[test]
fn test_counters_match_lines_written_per_interval() -> Result<()> {
    let intervals = "\
A,01-01-2024 10:00:00,01-01-2024 10:05:00
B,01-01-2024 10:05:00,01-01-2024 10:10:00
C,01-01-2024 10:03,01-01-2024 10:08
";
    let fixture = Fixture::new(
        intervals,
        &[
            data_line("01/01/2024 09:59:59.80", "50.0001", "1.0"),
            data_line("01/01/2024 10:00:00.00", "50.0002", "1.1"),
            data_line("01/01/2024 10:04:00.00", "50.0003", "1.2"),
            data_line("01/01/2024 10:05:00.00", "50.0004", "1.3"),
            data_line("01/01/2024 10:05:00.10", "50.0005", "1.4"),
            data_line("01/01/2024 10:10:00.00", "50.0006", "1.5"),
            data_line("01/01/2024 11:00:00.00", "50.0007", "1.6"),
        ],
    )?;

    let summary = fixture.run()?;

    let ids: Vec<_> = summary.intervals.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B", "C"]);
    for report in &summary.intervals {
        let written = read(&fixture.out(&report.file_name)).lines().count() as u64;
        assert_eq!(written, report.total, "interval {}", report.id);
    }

    let a = summary.interval("A").unwrap().counters;
    assert_eq!((a.start_edge, a.interior, a.end_edge), (1, 1, 1));
    let b = summary.interval("B").unwrap().counters;
    assert_eq!((b.start_edge, b.interior, b.end_edge), (1, 1, 1));
    let c = summary.interval("C").unwrap().counters;
    assert_eq!((c.start_edge, c.interior, c.end_edge), (0, 3, 0));

    assert_eq!(
        read(&fixture.out("(A) 01-01-2024 10.00-10.05.txt")),
        "2024-01-01 10:00:00.00,50.0002,1.100\n\
         2024-01-01 10:04:00.00,50.0003,1.200\n\
         2024-01-01 10:05:00.00,50.0004,1.300\n"
    );

    assert_eq!(summary.input.total_lines, 8);
    assert_eq!(
        summary.input.first_entry.as_deref(),
        Some(data_line("01/01/2024 09:59:59.80", "50.0001", "1.0").as_str())
    );
    assert_eq!(
        summary.input.last_entry.as_deref(),
        Some(data_line("01/01/2024 11:00:00.00", "50.0007", "1.6").as_str())
    );
    Ok(())
}

#[test]
fn test_band_policy_snaps_near_records_onto_edges() -> Result<()> {
    let fixture = Fixture::new(
        &format!("{}\n", INTERVAL_A),
        &[
            data_line("01/01/2024 09:59:59.90", "50.1000", "2.0"),
            data_line("01/01/2024 10:05:00.10", "50.2000", "2.0"),
        ],
    )?;

    let mut config = fixture.config();
    config.edge_policy = EdgePolicy::Band;
    let summary = fixture.run_with(config)?;

    assert_eq!(
        read(&fixture.out(FILE_A)),
        "2024-01-01 10:00:00.00,50.1000,2.000\n\
         2024-01-01 10:05:00.00,50.2000,2.000\n"
    );
    let a = summary.interval("A").unwrap().counters;
    assert_eq!((a.start_edge, a.interior, a.end_edge), (1, 0, 1));
    Ok(())
}

#[test]
fn test_debug_file_holds_header_and_sampled_lines() -> Result<()> {
    let lines: Vec<String> = (0..4)
        .map(|i| data_line(&format!("01/01/2024 10:01:0{}.00", i), "50.0000", "1.0"))
        .collect();
    let fixture = Fixture::new(&format!("{}\n", INTERVAL_A), &lines)?;

    let mut config = fixture.config();
    config.sample_lines = 3;
    fixture.run_with(config)?;

    let debug = read(&fixture.out("test-data.txt"));
    let expected = format!(
        "{}\n{}\n2024-01-01 10:01:00.00,50.0000,1.000\n{}\n2024-01-01 10:01:01.00,50.0000,1.000\n",
        HEADER, lines[0], lines[1]
    );
    assert_eq!(debug, expected);
    Ok(())
}

#[test]
fn test_test_mode_inspects_without_routing() -> Result<()> {
    let lines: Vec<String> = (0..20)
        .map(|i| data_line(&format!("01/01/2024 10:01:{:02}.00", i), "50.0000", "1.0"))
        .collect();
    let fixture = Fixture::new(&format!("{}\n", INTERVAL_A), &lines)?;

    let mut config = fixture.config();
    config.test = true;
    let summary = fixture.run_with(config)?;

    assert_eq!(summary.input.total_lines, 11);
    assert_eq!(summary.total_events(), 0);
    assert_eq!(read(&fixture.out(FILE_A)), "");
    Ok(())
}

#[test]
fn test_missing_intervals_file_is_fatal() -> Result<()> {
    let fixture = Fixture::new("", &[])?;
    let mut config = fixture.config();
    config.intervals = fixture.path("nope.txt");

    let err = fixture.run_with(config).unwrap_err();

    assert!(matches!(err, DemuxError::OpenInputError { ref role, .. } if role == "intervals file"));
    assert_eq!(err.severity(), ErrorSeverity::Critical);
    Ok(())
}

#[test]
fn test_missing_input_file_is_fatal_after_load() -> Result<()> {
    let fixture = Fixture::new(&format!("{}\n", INTERVAL_A), &[])?;
    let mut config = fixture.config();
    config.filein = fixture.path("absent.txt");

    let err = fixture.run_with(config).unwrap_err();

    assert!(matches!(err, DemuxError::OpenInputError { ref role, .. } if role == "input data file"));
    // destinations were created during load and released on the error path
    assert!(fixture.out(FILE_A).exists());
    Ok(())
}

#[test]
fn test_interval_id_with_separator_fails_destination_creation() -> Result<()> {
    let fixture = Fixture::new(
        "a/b,01-01-2024 10:00:00,01-01-2024 10:05:00\n",
        &[data_line("01/01/2024 10:01:00.00", "50.0000", "1.000")],
    )?;

    let err = fixture.run().unwrap_err();

    assert!(matches!(err, DemuxError::DestinationError { .. }));
    assert_eq!(err.severity(), ErrorSeverity::Critical);
    assert!(!fixture.out("(a").exists());
    Ok(())
}
