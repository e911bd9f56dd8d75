#![allow(dead_code)]

use engine_config::{job::JobKind, settings::JobSettings};
use engine_runtime::{
    error::JobError,
    execution::{executor::run, report::JobReport},
};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tokio_util::sync::CancellationToken;

/// The three visits every aggregation job is checked against.
pub const SCENARIO: [&str; 3] = [
    "A|u1|d1|10.5|Mozilla|US|en|kw|3",
    "B|u2|d2|5.0|Mozilla|DE|de|kw|1",
    "A|u3|d3|2.5|Opera|US|en|kw|7",
];

/// Deterministic `UserVisits` lines. Revenues are multiples of 0.25 so sums
/// are exact whatever order they are added in.
pub fn visit_lines(count: usize, distinct_ips: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let ip = format!("10.{}.{}.{}", i % 3, (i * 7) % distinct_ips.max(1), i % 2);
            let revenue = ((i * 13) % 40) as f64 * 0.25;
            format!("{ip}|http://site/{i}|2024-01-{:02}|{revenue}|agent|US|en|kw|{}", i % 28 + 1, i % 10)
        })
        .collect()
}

/// Expected totals computed directly from the lines.
pub fn expected_totals(lines: &[String]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for line in lines {
        let fields: Vec<&str> = line.split('|').collect();
        *totals.entry(fields[0].to_string()).or_insert(0.0) += fields[3].parse::<f64>().unwrap();
    }
    totals
}

/// Write `lines` across `files` text files under `dir`, round-robin.
pub fn write_input(dir: &Path, lines: &[String], files: usize) -> PathBuf {
    let input = dir.join("input");
    fs::create_dir_all(&input).unwrap();

    let files = files.max(1);
    let mut contents = vec![String::new(); files];
    for (i, line) in lines.iter().enumerate() {
        let content = &mut contents[i % files];
        content.push_str(line);
        content.push('\n');
    }
    for (i, content) in contents.iter().enumerate() {
        fs::write(input.join(format!("visits-{i:03}.txt")), content).unwrap();
    }
    input
}

/// Part files of a committed output, sorted by name.
pub fn part_files(root: &Path) -> Vec<PathBuf> {
    let mut parts: Vec<PathBuf> = fs::read_dir(root)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("part-"))
        })
        .collect();
    parts.sort();
    parts
}

/// Every output line, sorted.
pub fn read_output(root: &Path) -> Vec<String> {
    let mut lines: Vec<String> = part_files(root)
        .iter()
        .flat_map(|p| {
            fs::read_to_string(p)
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();
    lines.sort();
    lines
}

/// Output parsed back into totals per key.
pub fn read_totals(root: &Path) -> BTreeMap<String, f64> {
    read_output(root)
        .iter()
        .map(|line| {
            let sum = model::records::sum::parse_line(line).unwrap();
            (sum.key, sum.sum)
        })
        .collect()
}

/// Raw bytes of every part file, for byte-identical comparisons.
pub fn output_bytes(root: &Path) -> Vec<(String, Vec<u8>)> {
    part_files(root)
        .into_iter()
        .map(|p| {
            let name = p.file_name().unwrap().to_string_lossy().to_string();
            (name, fs::read(&p).unwrap())
        })
        .collect()
}

pub async fn run_hdfs(
    input: &Path,
    output: &Path,
    settings: &JobSettings,
) -> Result<JobReport, JobError> {
    let args = [
        input.to_string_lossy().to_string(),
        output.to_string_lossy().to_string(),
    ];
    run(JobKind::Hdfs, &args, settings, CancellationToken::new()).await
}

pub async fn run_db(output: &Path, settings: &JobSettings) -> Result<JobReport, JobError> {
    let args = [output.to_string_lossy().to_string()];
    run(JobKind::Db, &args, settings, CancellationToken::new()).await
}

pub fn settings_with(
    parallelism: usize,
    reducers: usize,
    split_size: Option<u64>,
    combine: Option<bool>,
) -> JobSettings {
    let mut settings = JobSettings::default();
    settings.execution.parallelism = parallelism;
    settings.execution.reducers = reducers;
    settings.execution.combine = combine;
    settings.text.split_size = split_size;
    settings
}
