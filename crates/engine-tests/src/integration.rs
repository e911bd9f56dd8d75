#[cfg(test)]
mod tests {
    use crate::{
        TEST_MYSQL_URL, TEST_PG_URL, seed_mysql, seed_postgres,
        utils::{
            SCENARIO, expected_totals, output_bytes, part_files, read_output, read_totals,
            run_db, run_hdfs, settings_with, visit_lines, write_input,
        },
    };
    use connectors::error::SourceError;
    use engine_config::{job::JobKind, settings::JobSettings};
    use engine_core::{error::DecodeError, lifecycle::JobState};
    use engine_runtime::{error::JobError, execution::executor::run};
    use engine_processing::error::ProcessingError;
    use tokio_util::sync::CancellationToken;
    use tracing_test::traced_test;

    // Scenario: the three benchmark visits in a single file.
    // Expected Outcome: one line per source IP with the summed revenue.
    #[traced_test]
    #[tokio::test]
    async fn sums_revenue_per_source_ip() {
        let dir = tempfile::tempdir().unwrap();
        let lines: Vec<String> = SCENARIO.iter().map(|l| l.to_string()).collect();
        let input = write_input(dir.path(), &lines, 1);
        let output = dir.path().join("out");

        let report = run_hdfs(&input, &output, &JobSettings::default())
            .await
            .unwrap();

        assert_eq!(read_output(&output), vec!["A\t13.0", "B\t5.0"]);
        assert!(output.join("_SUCCESS").exists());
        assert_eq!(report.keys, 2);
        assert_eq!(
            report.states.last().map(|s| s.state),
            Some(JobState::Done)
        );
        assert!(logs_contain("Aggregation job completed"));
    }

    // Scenario: the same input aggregated with different partitionings,
    // parallelism, reducer counts and with the combiner switched off.
    // Expected Outcome: identical totals every time, matching a direct sum.
    #[traced_test]
    #[tokio::test]
    async fn totals_do_not_depend_on_partitioning() {
        let dir = tempfile::tempdir().unwrap();
        let lines = visit_lines(600, 37);
        let expected = expected_totals(&lines);
        let input = write_input(dir.path(), &lines, 3);

        let runs = [
            settings_with(1, 1, None, None),
            settings_with(8, 1, Some(257), None),
            settings_with(8, 4, Some(64), None),
            settings_with(3, 2, Some(1000), Some(false)),
        ];

        let mut outputs = Vec::new();
        for (i, settings) in runs.iter().enumerate() {
            let output = dir.path().join(format!("out-{i}"));
            run_hdfs(&input, &output, settings).await.unwrap();
            assert_eq!(read_totals(&output), expected, "run {i}");
            outputs.push(read_output(&output));
        }
        assert!(outputs.windows(2).all(|w| w[0] == w[1]));
    }

    // Scenario: split sizes from tiny to whole-file.
    // Expected Outcome: every line is counted exactly once.
    #[traced_test]
    #[tokio::test]
    async fn every_line_counted_once_across_splits() {
        let dir = tempfile::tempdir().unwrap();
        let lines = visit_lines(120, 11);
        let input = write_input(dir.path(), &lines, 2);

        for split_size in [1, 7, 50, 4096] {
            let output = dir.path().join(format!("out-{split_size}"));
            let report = run_hdfs(&input, &output, &settings_with(4, 1, Some(split_size), None))
                .await
                .unwrap();
            assert_eq!(report.metrics.units_decoded, 120, "split size {split_size}");
        }
    }

    // Scenario: the job is run twice into the same output directory.
    // Expected Outcome: the second run replaces the first with identical bytes.
    #[traced_test]
    #[tokio::test]
    async fn rerun_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), &visit_lines(300, 23), 4);
        let output = dir.path().join("out");
        let settings = settings_with(4, 3, Some(512), None);

        run_hdfs(&input, &output, &settings).await.unwrap();
        let first = output_bytes(&output);
        run_hdfs(&input, &output, &settings).await.unwrap();
        let second = output_bytes(&output);

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    // Scenario: one line in the middle of the input has a non-numeric revenue.
    // Expected Outcome: the job fails naming the unit and commits nothing.
    #[traced_test]
    #[tokio::test]
    async fn bad_line_fails_the_job_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut lines = visit_lines(50, 5);
        lines.insert(20, "C|u9|d9|not-a-number".to_string());
        let input = write_input(dir.path(), &lines, 1);
        let output = dir.path().join("out");

        let err = run_hdfs(&input, &output, &JobSettings::default())
            .await
            .unwrap_err();

        match err {
            JobError::Processing(ProcessingError::Decode {
                position, source, ..
            }) => {
                assert_eq!(position, 21);
                assert!(matches!(source, DecodeError::TypeMismatch { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(part_files(&output).is_empty());
        assert!(!output.join("_SUCCESS").exists());
        assert!(logs_contain("Aggregation job failed"));
    }

    // Scenario: a line with too few fields.
    // Expected Outcome: MalformedLine, no output.
    #[traced_test]
    #[tokio::test]
    async fn short_line_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let lines = vec!["A|u1|d1|10.5".to_string(), "B|u2".to_string()];
        let input = write_input(dir.path(), &lines, 1);
        let output = dir.path().join("out");

        let err = run_hdfs(&input, &output, &JobSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            JobError::Processing(ProcessingError::Decode {
                source: DecodeError::MalformedLine {
                    required: 4,
                    found: 2
                },
                ..
            })
        ));
        assert!(part_files(&output).is_empty());
    }

    // Scenario: an input directory that does not exist.
    // Expected Outcome: a source error.
    #[traced_test]
    #[tokio::test]
    async fn missing_input_is_a_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_hdfs(
            &dir.path().join("nope"),
            &dir.path().join("out"),
            &JobSettings::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, JobError::Source(SourceError::File(_))));
    }

    // Scenario: wrong number of positional arguments.
    // Expected Outcome: a usage error before anything is touched.
    #[traced_test]
    #[tokio::test]
    async fn wrong_arguments_are_usage_errors() {
        let settings = JobSettings::default();
        for (kind, args) in [
            (JobKind::Db, vec![]),
            (JobKind::Db, vec!["a".to_string(), "b".to_string()]),
            (JobKind::Hdfs, vec!["only-one".to_string()]),
        ] {
            let err = run(kind, args.as_slice(), &settings, CancellationToken::new())
                .await
                .unwrap_err();
            match err {
                JobError::Usage(usage) => assert_eq!(usage.usage(), kind.usage()),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    // Scenario: the database job without any configured shard.
    // Expected Outcome: a settings error.
    #[traced_test]
    #[tokio::test]
    async fn db_job_needs_shards() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_db(&dir.path().join("out"), &JobSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::Settings(_)));
    }

    // Scenario: report serialization.
    // Expected Outcome: JSON carrying the run id, states and metrics.
    #[traced_test]
    #[tokio::test]
    async fn report_serializes_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let lines: Vec<String> = SCENARIO.iter().map(|l| l.to_string()).collect();
        let input = write_input(dir.path(), &lines, 1);
        let report = run_hdfs(&input, &dir.path().join("out"), &JobSettings::default())
            .await
            .unwrap();

        let path = dir.path().join("report.json");
        report.write_to(&path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(json["run_id"], report.run_id.to_string());
        assert_eq!(json["job"], "hdfs");
        assert_eq!(json["keys"], 2);
        assert_eq!(json["metrics"]["lines_written"], 2);
        assert_eq!(json["states"].as_array().unwrap().len(), 7);
    }

    // Scenario: `UserVisits` split over a MySQL and a Postgres shard, with
    // key A present on both.
    // Expected Outcome: A merged across shards, B passed through.
    #[ignore = "needs MySQL and Postgres shards on localhost"]
    #[traced_test]
    #[tokio::test]
    async fn db_job_merges_across_shards() {
        let pool = seed_mysql(&[("A", "4.0"), ("A", "3.0"), ("B", "5.0")]).await;
        pool.disconnect().await.unwrap();
        seed_postgres(&[("A", "6.0")]).await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        let mut settings = JobSettings::default();
        settings.structured.urls = vec![TEST_MYSQL_URL.to_string(), TEST_PG_URL.to_string()];

        let report = run_db(&output, &settings).await.unwrap();
        assert_eq!(report.partitions, 2);
        assert_eq!(read_output(&output), vec!["A\t13.0", "B\t5.0"]);
    }
}
