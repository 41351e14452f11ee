use fluvial_glacial::config::{CrossSectionConfig, GridRunConfig, MonthSchedule, Quantity};
use fluvial_glacial::cross_section::{CrossSectionAccumulator, CrossSectionRun, SUMMARY_HEADER};
use fluvial_glacial::errors::Result;
use fluvial_glacial::grid::AsciiGrid;
use fluvial_glacial::grid_statistics::{
    GridStatisticsReducer, GridStatisticsRun, StatisticsRecord, HEADER,
};
use fluvial_glacial::output::CsvTable;
use fluvial_glacial::statistics::IntervalBinner;
use fluvial_glacial::timeseries::CrossSectionSeries;
use ndarray::array;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.unwrap_or(f64::NAN);
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

const NDV: f64 = -9999.0;

fn sample_grid() -> AsciiGrid {
    AsciiGrid::from_array(
        array![[0.0, 1.0, 1.0], [NDV, 0.3, 0.3], [0.6, 1.2, 2.0]],
        NDV,
    )
}

fn reducer() -> Result<GridStatisticsReducer> {
    Ok(GridStatisticsReducer::new(IntervalBinner::new(0.25, 0.0)?))
}

#[test]
fn test_grid_reducer_excludes_zero_and_one() -> Result<()> {
    let record = reducer()?.reduce(&sample_grid())?;

    // All data cells, zeros and ones included
    assert_eq!(record.min, Some(0.0));
    assert_eq!(record.max, Some(2.0));
    assert_close(Some(record.sum), 6.4);
    assert_close(record.mean, 0.8);

    assert_eq!(record.n, 5);
    assert_eq!(record.one_count, 2);
    assert_eq!(record.zero_count, 1);
    assert_eq!(record.min_ignoring_zero_and_one, Some(0.3));
    assert_eq!(record.max_ignoring_zero_and_one, Some(2.0));
    assert_close(record.range_ignoring_zero_and_one, 1.7);
    assert_close(record.mean_ignoring_zero_and_one, 0.88);

    assert_eq!(record.variety, 4);
    assert_eq!(record.lower_quartile, Some(0.3));
    assert_eq!(record.median, Some(0.6));
    assert_eq!(record.upper_quartile, Some(1.2));
    assert_eq!(record.mode, Some(0.3));

    // Intervals 1, 1, 2, 4, 8 over a range spanning 7 intervals
    assert_eq!(record.interval_variety, 4);
    let diversity = -(0.4f64 * 0.4f64.ln() + 3.0 * (0.2f64 * 0.2f64.ln()));
    assert_close(record.diversity, diversity);
    assert_close(
        record.dominance_over_intervals_with_values,
        record.maximum_diversity_over_intervals_with_values.unwrap_or(f64::NAN) + diversity,
    );
    let evenness = -100.0 * (0.16f64 + 3.0 * 0.04).log10() / 4.0f64.log10();
    assert_close(record.interval_variety_evenness, evenness);
    let evenness_in_range = -100.0 * (0.16f64 + 3.0 * 0.04).log10() / 7.0f64.log10();
    assert_close(record.number_of_intervals_in_range_evenness, evenness_in_range);

    assert!(record.skewness.is_some());
    assert!(record.kurtosis.is_some());
    // Distinct values 0.3 and 0.6 below the mean of 0.88, 1.2 and 2.0 above
    assert_close(record.skewness_cyhelsky, 0.0);
    Ok(())
}

#[test]
fn test_grid_with_only_zero_and_one() -> Result<()> {
    let grid = AsciiGrid::from_array(array![[0.0, 1.0], [1.0, NDV]], NDV);
    let record = reducer()?.reduce(&grid)?;

    assert_eq!(record.n, 0);
    assert_eq!(record.one_count, 2);
    assert_eq!(record.zero_count, 1);
    assert_close(record.mean, 2.0 / 3.0);
    assert_eq!(record.median, None);
    assert_eq!(record.mode, None);
    assert_eq!(record.diversity, None);
    assert_eq!(record.kurtosis, None);

    let row = record.to_csv_row("26t0000");
    assert!(row.contains("undefined"));
    assert!(!row.contains("NaN"));
    assert!(!row.contains("inf"));
    Ok(())
}

#[test]
fn test_constant_grid_shape_is_undefined() -> Result<()> {
    let grid = AsciiGrid::from_array(array![[2.5, 2.5], [2.5, 2.5]], NDV);
    let record = reducer()?.reduce(&grid)?;

    assert_eq!(record.n, 4);
    assert_eq!(record.skewness, None);
    assert_eq!(record.kurtosis, None);
    assert_eq!(record.interval_variety, 1);
    assert_eq!(record.interval_variety_evenness, None);
    assert_eq!(record.number_of_intervals_in_range_evenness, None);
    assert_eq!(record.mode, Some(2.5));
    Ok(())
}

#[test]
fn test_statistics_record_round_trip() -> Result<()> {
    let record = reducer()?.reduce(&sample_grid())?;
    let row = record.to_csv_row("26t0300");
    assert_eq!(row.split(',').count(), HEADER.split(',').count());

    let (label, parsed) = StatisticsRecord::parse_csv_row(&row)?;
    assert_eq!(label, "26t0300");
    assert_eq!(parsed, record);

    let empty = reducer()?.reduce(&AsciiGrid::from_array(array![[1.0]], NDV))?;
    let (_, parsed) = StatisticsRecord::parse_csv_row(&empty.to_csv_row("31t0000"))?;
    assert_eq!(parsed, empty);

    assert!(StatisticsRecord::parse_csv_row("26t0000,1,2,3").is_err());
    Ok(())
}

fn write_grid(path: &Path, rows: &[&str]) -> Result<()> {
    let mut text = format!("ncols 3\nnrows {}\nNODATA_value -9999\n", rows.len());
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    fs::write(path, text)?;
    Ok(())
}

#[test]
fn test_grid_run_month() -> Result<()> {
    let temp_dir = tempdir()?;
    let root = temp_dir.path();
    let month = MonthSchedule::new("July", 26, 27);
    let config = GridRunConfig::new(0.25, 0.0).with_months(vec![month.clone()]);

    let input_dir = config.input_dir(root, &month);
    fs::create_dir_all(&input_dir)?;
    write_grid(&input_dir.join("26t0000.txt"), &["0 1 0.5", "0.75 -9999 3"])?;
    write_grid(&input_dir.join("27t0000.txt"), &["1 1 1"])?;
    // Corrupt header: reported and skipped
    fs::write(input_dir.join("26t0100.txt"), "ncols x\n")?;

    let reports = GridStatisticsRun::new(config, root)?.run()?;
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.skipped.len(), month.expected_file_count() - 2);
    assert!(report.skipped.contains(&"26t0100".to_string()));
    assert!(report.rows[0].starts_with("26t0000,"));
    assert!(report.rows[1].starts_with("27t0000,"));

    let expected_output = root.join("output").join("0.25_0.0").join("July").join("July.csv");
    assert_eq!(report.output, expected_output);
    let written = fs::read_to_string(&expected_output)?;
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], HEADER);
    assert_eq!(lines[1], report.rows[0]);
    Ok(())
}

#[test]
fn test_grid_run_rejects_bad_width() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let config = GridRunConfig::new(0.0, 0.0);
    assert!(GridStatisticsRun::new(config, temp_dir.path()).is_err());
}

const SERIES: &str = "Time,c0,c1,c2,c3\n\
2012-01-01 01:00,0,0,-999,0\n\
2012-01-01 01:15,5,0,0,0\n\
2012-01-01 01:30,5,7,0,-999\n\
2012-01-01 01:45,3,11,2,\n\
2012-01-01 02:00,2,11,4,1\n";

#[test]
fn test_cross_section_accumulator() -> Result<()> {
    let series = CrossSectionSeries::parse(SERIES, Path::new("depth 5.csv"));
    let accumulator = CrossSectionAccumulator::reduce(5, Quantity::Depth, &series);

    // Row pass
    assert_eq!(accumulator.rows.len(), 4);
    assert_eq!(accumulator.rows[1].n, 2);
    assert_eq!(accumulator.rows[1].sum, 12.0);
    assert_eq!(accumulator.rows[1].max, 7.0);
    assert_eq!(accumulator.total_n, 10);
    assert_eq!(accumulator.total_sum, 51.0);
    assert_eq!(accumulator.total_max, Some(11.0));
    assert_eq!(accumulator.tier_counts, [4, 3, 2, 2]);

    // Column pass
    assert_eq!(accumulator.columns.len(), 4);
    let c1 = &accumulator.columns[1];
    assert_eq!(c1.inundation.as_ref().map(|t| t.clock()), Some("01:30"));
    assert_eq!(c1.max_time.as_ref().map(|t| t.clock()), Some("01:45"));
    assert_eq!(c1.max_value, Some(11.0));
    assert_eq!(c1.time_to_max().transpose()?, Some(15));
    let c3 = &accumulator.columns[3];
    assert_eq!(c3.time_to_max().transpose()?, Some(0));
    assert!(accumulator.columns.iter().all(|c| c.is_inundated()));

    assert_eq!(accumulator.max_count, 2);
    assert_eq!(
        accumulator.inundation_time_max_column.as_ref().map(|t| t.clock()),
        Some("01:30")
    );
    assert_eq!(accumulator.max_time.as_ref().map(|t| t.clock()), Some("01:45"));
    assert_eq!(accumulator.time_to_max().transpose()?, Some(15));

    assert_eq!(
        accumulator.summary_fields()?.join(","),
        "5,10,51,5.1,11,2,01:30,01:45,15,4,3,2,2"
    );
    Ok(())
}

#[test]
fn test_tiers_require_nested_values() {
    let text = "Time,a,b,c,d\n2012-01-01 01:00,5,7,0,-999\n";
    let series = CrossSectionSeries::parse(text, Path::new("depth 5.csv"));
    let accumulator = CrossSectionAccumulator::reduce(5, Quantity::Depth, &series);
    assert_eq!(accumulator.tier_counts, [1, 1, 0, 0]);
    assert_eq!(accumulator.total_n, 2);
    assert!(!accumulator.columns[2].is_inundated());
}

#[test]
fn test_empty_cross_section_summary() -> Result<()> {
    let text = "Time,a\n2012-01-01 01:00,0\n";
    let series = CrossSectionSeries::parse(text, Path::new("froude 5.csv"));
    let accumulator = CrossSectionAccumulator::reduce(5, Quantity::Froude, &series);

    assert_eq!(accumulator.total_max, None);
    assert_eq!(
        accumulator.summary_fields()?.join(","),
        "5,0,0,undefined,,0,,,,0,0,0,0"
    );
    Ok(())
}

#[test]
fn test_cross_section_run() -> Result<()> {
    let temp_dir = tempdir()?;
    let root = temp_dir.path();
    let config = CrossSectionConfig::new(5, 10, 5).with_quantities(vec![Quantity::Depth]);

    let input_dir = config.input_dir(root, Quantity::Depth);
    fs::create_dir_all(&input_dir)?;
    // The last four rows are dropped before processing
    let mut text = SERIES.to_string();
    for minute in ["02:15", "02:30", "02:45", "03:00"] {
        text.push_str(&format!("2012-01-01 {},99,99,99,99\n", minute));
    }
    fs::write(input_dir.join("depth 5.csv"), text)?;

    let report = CrossSectionRun::new(config.clone(), root)?.run()?;
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.skipped, vec![(Quantity::Depth, 10)]);
    assert_eq!(report.rows[0].1, "5,10,51,5.1,11,2,01:30,01:45,15,4,3,2,2");

    let output_dir = config.output_dir(root, Quantity::Depth);
    let summary = fs::read_to_string(
        output_dir.join("rowAndColGeneralisation").join("depth.csv"),
    )?;
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0],
        format!("{}{}", SUMMARY_HEADER, Quantity::Depth.threshold_header())
    );

    let rows = fs::read_to_string(output_dir.join("rowGeneralisation").join("depth 5.csv"))?;
    assert_eq!(rows.lines().count(), 5);
    assert_eq!(rows.lines().nth(1), Some("1,5,5,5"));

    let columns = fs::read_to_string(output_dir.join("colGeneralisation").join("depth 5.csv"))?;
    let columns: Vec<&str> = columns.lines().collect();
    assert_eq!(columns.len(), 5);
    assert_eq!(columns[2], "1,01:30,01:45,15,11");
    Ok(())
}

#[test]
fn test_cross_section_run_with_footer_lines() -> Result<()> {
    let temp_dir = tempdir()?;
    let root = temp_dir.path();
    let config = CrossSectionConfig::new(5, 5, 5).with_quantities(vec![Quantity::Depth]);

    let input_dir = config.input_dir(root, Quantity::Depth);
    fs::create_dir_all(&input_dir)?;
    // Summary footer lines take the place of the four dropped rows
    let mut text = SERIES.to_string();
    for label in ["Maximum", "Minimum", "Mean", "Total"] {
        text.push_str(&format!("{},99,99,99,99\n", label));
    }
    fs::write(input_dir.join("depth 5.csv"), text)?;

    let report = CrossSectionRun::new(config.clone(), root)?.run()?;
    assert!(report.skipped.is_empty());
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].1, "5,10,51,5.1,11,2,01:30,01:45,15,4,3,2,2");

    let output_dir = config.output_dir(root, Quantity::Depth);
    let rows = fs::read_to_string(output_dir.join("rowGeneralisation").join("depth 5.csv"))?;
    assert_eq!(rows.lines().count(), 5);
    Ok(())
}

#[test]
fn test_csv_table_flushes_on_drop() -> Result<()> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("nested").join("table.csv");
    {
        let mut table = CsvTable::create(&path, "a,b")?;
        table.write_row(&["1", "2"])?;
        table.write_line("3,4")?;
        assert_eq!(table.rows(), 2);
    }

    let text = fs::read_to_string(&path)?;
    assert_eq!(text, "a,b\n1,2\n3,4\n");
    Ok(())
}

#[test]
fn test_cross_section_run_rejects_bad_range() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let config = CrossSectionConfig::new(10, 5, 5);
    assert!(CrossSectionRun::new(config, temp_dir.path()).is_err());
}
